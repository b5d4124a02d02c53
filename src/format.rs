use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("url pattern compiles"))
}

fn list_marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(\d+)\.\s+").expect("list marker pattern compiles"))
}

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
}

fn marker_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

/// Convert backend or user text into styled lines.
///
/// Only an explicit subset is ever interpreted: `**bold**`, `*italic*`,
/// newlines, leading numbered-list markers, and bare http(s) URLs.
/// Everything else renders as the literal characters received, so backend
/// text cannot smuggle styling in.
pub fn format_message(text: &str) -> Vec<Line<'static>> {
    if text.is_empty() {
        return vec![Line::default()];
    }
    text.lines().flat_map(format_line).collect()
}

/// Break one physical line into rendered lines. Each "1. " style marker,
/// at the start or after whitespace mid-line, begins a fresh line with the
/// marker highlighted; decimals like "3.5" are left alone.
fn format_line(line: &str) -> Vec<Line<'static>> {
    let markers: Vec<(usize, usize)> = list_marker_regex()
        .find_iter(line)
        .filter(|m| {
            m.start() == 0
                || line[..m.start()]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_whitespace())
        })
        .map(|m| (m.start(), m.end()))
        .collect();

    if markers.is_empty() {
        return vec![styled_line(None, line)];
    }

    let mut lines = Vec::new();

    let (first_start, _) = markers[0];
    if first_start > 0 {
        let prefix = line[..first_start].trim_end();
        if !prefix.is_empty() {
            lines.push(styled_line(None, prefix));
        }
    }

    for (i, &(start, end)) in markers.iter().enumerate() {
        let item_end = markers.get(i + 1).map_or(line.len(), |&(next, _)| next);
        let rest = line[end..item_end].trim_end();
        lines.push(styled_line(Some(&line[start..end]), rest));
    }

    lines
}

fn styled_line(marker: Option<&str>, rest: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    if let Some(marker) = marker {
        spans.push(Span::styled(marker.to_string(), marker_style()));
    }

    parse_inline(rest, &mut spans);

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Scan for `**bold**` and `*italic*` runs; unterminated markers stay
/// literal. Plain stretches go through URL detection before being emitted.
fn parse_inline(text: &str, spans: &mut Vec<Span<'static>>) {
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' {
            current_text.push(c);
            continue;
        }

        if chars.peek() == Some(&'*') {
            // Bold: consume the second * then look for the closing pair
            chars.next();

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                push_plain(std::mem::take(&mut current_text), spans);
                spans.push(Span::styled(bold_text, bold_style()));
            } else {
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            // Italic: single * up to the next single *
            let mut italic_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' {
                    found_close = true;
                    break;
                }
                italic_text.push(c);
            }

            if found_close && !italic_text.is_empty() {
                push_plain(std::mem::take(&mut current_text), spans);
                spans.push(Span::styled(italic_text, italic_style()));
            } else {
                current_text.push('*');
                current_text.push_str(&italic_text);
            }
        }
    }

    push_plain(current_text, spans);
}

/// Emit plain text, carving out bare URLs as link spans.
fn push_plain(text: String, spans: &mut Vec<Span<'static>>) {
    if text.is_empty() {
        return;
    }

    let mut last_end = 0;
    for url in url_regex().find_iter(&text) {
        if url.start() > last_end {
            spans.push(Span::raw(text[last_end..url.start()].to_string()));
        }
        spans.push(Span::styled(url.as_str().to_string(), link_style()));
        last_end = url.end();
    }

    if last_end == 0 {
        spans.push(Span::raw(text));
    } else if last_end < text.len() {
        spans.push(Span::raw(text[last_end..].to_string()));
    }
}
