use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Quit works from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_upload_prompt {
        handle_upload_prompt_key(app, key);
    } else {
        handle_chat_key(app, key);
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            // No-op while a request is outstanding or the input is blank
            if let Some(message) = app.begin_send() {
                let client = app.backend.clone();
                app.chat_task = Some(tokio::spawn(async move {
                    client.send_chat(&message).await
                }));
            }
        }

        // Upload prompt stands in for the hidden file picker
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.open_upload_prompt();
        }

        KeyCode::Esc => {
            app.input.clear();
            app.cursor = 0;
        }

        // Chat viewport scrolling
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_up();
            }
        }
        KeyCode::PageDown => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_down();
            }
        }

        // Input editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn handle_upload_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.close_upload_prompt();
        }
        KeyCode::Enter => {
            if let Some(path) = app.begin_upload() {
                let client = app.backend.clone();
                app.upload_task = Some(tokio::spawn(async move {
                    client.upload_file(&path).await
                }));
            }
        }
        KeyCode::Backspace => {
            if app.upload_cursor > 0 {
                app.upload_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.upload_input, app.upload_cursor);
                app.upload_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.upload_cursor = app.upload_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.upload_input.chars().count();
            app.upload_cursor = (app.upload_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.upload_cursor = 0;
        }
        KeyCode::End => {
            app.upload_cursor = app.upload_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.upload_input, app.upload_cursor);
            app.upload_input.insert(byte_pos, c);
            app.upload_cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_app() -> App {
        App::new(&Config::default()).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn char_to_byte_index_is_utf8_safe() {
        let s = "día";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3); // 'í' is two bytes
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn typed_characters_land_at_the_cursor() {
        let mut app = test_app();
        for c in "hola".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Left));
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.input, "holla");
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn backspace_removes_the_char_before_the_cursor() {
        let mut app = test_app();
        app.input = "día".to_string();
        app.cursor = 2;
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.input, "da");
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn esc_clears_the_input() {
        let mut app = test_app();
        app.input = "half-typed".to_string();
        app.cursor = 4;
        handle_key(&mut app, press(KeyCode::Esc));
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn ctrl_c_quits_even_inside_the_upload_prompt() {
        let mut app = test_app();
        app.open_upload_prompt();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_u_opens_and_esc_closes_the_upload_prompt() {
        let mut app = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        assert!(app.show_upload_prompt);

        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.upload_input, "x");
        assert!(app.input.is_empty());

        handle_key(&mut app, press(KeyCode::Esc));
        assert!(!app.show_upload_prompt);
        assert!(app.upload_input.is_empty());
    }
}
