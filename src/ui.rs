use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, Sender, UploadStatus};
use crate::format::format_message;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let status_height = match app.upload_status {
        UploadStatus::Idle => 0,
        _ => 1,
    };

    let [header_area, chat_area, status_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(status_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if status_height > 0 {
        render_upload_status(app, frame, status_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_upload_prompt {
        render_upload_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ragchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.backend.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let inner_width = area.width.saturating_sub(2);
    app.chat_height = area.height.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();

    if app.show_welcome && app.messages.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Welcome! I'm your AI & ML research assistant.",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(
            "Ask about recent papers, news, and tools, or upload a document (Ctrl+U) to chat about it.",
        ));
    }

    for msg in &app.messages {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Sender::Bot => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
        }
        lines.extend(format_message(&msg.text));
        lines.push(Line::default());
    }

    // Typing indicator occupies the list slot a reply will replace it in
    if app.is_sending() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    app.total_chat_lines = wrapped_line_count(&lines, inner_width);
    if app.auto_follow {
        app.scroll = app.max_scroll();
    } else {
        app.scroll = app.scroll.min(app.max_scroll());
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

/// How many terminal rows the lines take once wrapped to `width` columns.
fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = width as usize;
    lines
        .iter()
        .map(|line| {
            let cols = line.width();
            if cols == 0 {
                1u16
            } else {
                ((cols + width - 1) / width) as u16
            }
        })
        .sum()
}

fn render_upload_status(app: &App, frame: &mut Frame, area: Rect) {
    let (text, style) = match &app.upload_status {
        UploadStatus::Idle => return,
        UploadStatus::Uploading { file_name } => (
            format!(" Uploading {}...", file_name),
            Style::default().fg(Color::Yellow),
        ),
        UploadStatus::Success { text, .. } => (
            format!(" {}", text),
            Style::default().fg(Color::Green),
        ),
        UploadStatus::Error { text, .. } => (
            format!(" {}", text),
            Style::default().fg(Color::Red),
        ),
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.is_sending() { Color::DarkGray } else { Color::Yellow };
    let title = if app.is_sending() {
        " Waiting for reply... "
    } else {
        " Message (Enter to send) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Horizontal scroll keeps the cursor in view
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(app.placeholder())
            .style(Style::default().fg(Color::Gray))
            .block(block)
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text)
            .style(Style::default().fg(Color::Cyan))
            .block(block)
    };

    frame.render_widget(input, area);

    if !app.show_upload_prompt {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" Ctrl+U ", key_style),
        Span::styled(" upload ", label_style),
        Span::styled(" Up/Dn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" Ctrl+C ", key_style),
        Span::styled(" quit ", label_style),
    ];

    if app.is_sending() {
        hints.push(Span::styled(
            "  sending...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_upload_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 3, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Upload document (pdf, txt, docx, md) ");

    let inner_width = popup.width.saturating_sub(2) as usize;
    let cursor_pos = app.upload_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .upload_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let prompt = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(prompt, popup);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((popup.x + cursor_x + 1, popup.y + 1));
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(height),
        Constraint::Min(0),
    ])
    .areas(area);

    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);

    horizontal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_line_count_accounts_for_wrapping_and_blanks() {
        let lines = vec![
            Line::from("1234567890"), // exactly one row at width 10
            Line::from("12345678901"), // wraps to two
            Line::default(),           // blank still takes a row
        ];
        assert_eq!(wrapped_line_count(&lines, 10), 4);
        assert_eq!(wrapped_line_count(&lines, 0), 0);
    }
}
