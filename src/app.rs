use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::backend::{BackendClient, UploadReceipt};
use crate::config::Config;

/// Fixed user-visible message for any failed chat request. Diagnostic
/// detail goes to the log, never the chat.
pub const APOLOGY: &str =
    "I apologize, but I encountered an error processing your AI/ML query. \
     Please check your connection and try again.";

pub const PLACEHOLDER_DEFAULT: &str = "Ask a question about AI & ML...";

/// Example queries rotated through the placeholder once the user has been
/// idle for a moment, as a gentle prompt.
pub const EXAMPLE_QUERIES: [&str; 3] = [
    "Try: 'What are the latest AI news today?'",
    "Try: 'Tell me about recent ML research'",
    "Try: 'What are trending AI tools?'",
];

// Tick cadence is 300ms; wait ~3s before rotating examples in, then hold
// each one for ~4.5s.
const PLACEHOLDER_DELAY_TICKS: u64 = 10;
const PLACEHOLDER_HOLD_TICKS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
}

/// Upload flow status line. Terminal states carry a deadline after which
/// the tick handler clears them back to Idle.
#[derive(Debug, Clone)]
pub enum UploadStatus {
    Idle,
    Uploading { file_name: String },
    Success { text: String, expires: Instant },
    Error { text: String, expires: Instant },
}

pub struct App {
    pub should_quit: bool,

    // Message list
    pub messages: Vec<ChatMessage>,
    pub show_welcome: bool,

    // Input box
    pub input: String,
    pub cursor: usize, // position in chars, not bytes

    // Send flow: at most one chat request outstanding
    sending: bool,
    pub chat_task: Option<tokio::task::JoinHandle<anyhow::Result<String>>>,

    // Upload flow, independent of the send flow
    pub upload_status: UploadStatus,
    pub upload_task: Option<tokio::task::JoinHandle<anyhow::Result<UploadReceipt>>>,
    pub show_upload_prompt: bool,
    pub upload_input: String,
    pub upload_cursor: usize,
    upload_clear: Duration,

    // Chat viewport (dimensions fed back from the renderer)
    pub scroll: u16,
    pub auto_follow: bool,
    pub chat_height: u16,
    pub total_chat_lines: u16,

    // Animation
    pub animation_frame: u8,
    tick_count: u64,

    pub backend: BackendClient,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let backend = BackendClient::new(
            &config.backend_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            should_quit: false,
            messages: Vec::new(),
            show_welcome: true,
            input: String::new(),
            cursor: 0,
            sending: false,
            chat_task: None,
            upload_status: UploadStatus::Idle,
            upload_task: None,
            show_upload_prompt: false,
            upload_input: String::new(),
            upload_cursor: 0,
            upload_clear: Duration::from_secs(config.upload_clear_secs),
            scroll: 0,
            auto_follow: true,
            chat_height: 0,
            total_chat_lines: 0,
            animation_frame: 0,
            tick_count: 0,
            backend,
        })
    }

    /// Whether a chat request is outstanding. The typing indicator is shown
    /// and the submit action disabled exactly while this holds.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.upload_status, UploadStatus::Uploading { .. })
    }

    /// Start the send flow. Returns the message to post, or None when the
    /// submit is a no-op (blank input, or a request already outstanding).
    pub fn begin_send(&mut self) -> Option<String> {
        if self.sending {
            return None;
        }
        let message = self.input.trim().to_string();
        if message.is_empty() {
            // Silent: the action simply does not happen
            return None;
        }

        self.show_welcome = false;
        self.messages.push(ChatMessage {
            text: message.clone(),
            sender: Sender::User,
        });
        self.input.clear();
        self.cursor = 0;
        self.sending = true;
        self.auto_follow = true;

        Some(message)
    }

    /// Finish the send flow with either outcome; always returns the UI to
    /// an interactive state.
    pub fn finish_send(&mut self, outcome: anyhow::Result<String>) {
        self.sending = false;
        self.animation_frame = 0;
        match outcome {
            Ok(response) => {
                self.messages.push(ChatMessage {
                    text: response,
                    sender: Sender::Bot,
                });
            }
            Err(error) => {
                tracing::error!("chat request failed: {error:#}");
                self.messages.push(ChatMessage {
                    text: APOLOGY.to_string(),
                    sender: Sender::Bot,
                });
            }
        }
        self.auto_follow = true;
    }

    /// Start the upload flow from the path typed into the prompt. Returns
    /// the path to upload, or None when the prompt is blank or an upload is
    /// already in flight.
    pub fn begin_upload(&mut self) -> Option<PathBuf> {
        if self.is_uploading() {
            return None;
        }
        let raw = self.upload_input.trim().to_string();
        if raw.is_empty() {
            return None;
        }

        let path = PathBuf::from(raw);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.show_welcome = false;
        self.show_upload_prompt = false;
        self.upload_input.clear();
        self.upload_cursor = 0;
        self.upload_status = UploadStatus::Uploading { file_name };

        Some(path)
    }

    pub fn finish_upload(&mut self, outcome: anyhow::Result<UploadReceipt>) {
        let expires = Instant::now() + self.upload_clear;
        match outcome {
            Ok(receipt) => {
                let file_name = receipt.filename.unwrap_or_else(|| "document".to_string());
                let text = receipt
                    .message
                    .unwrap_or_else(|| format!("Uploaded {}", file_name));
                self.upload_status = UploadStatus::Success { text, expires };
                self.messages.push(ChatMessage {
                    text: format!(
                        "I've received **{}**. You can now ask questions about it.",
                        file_name
                    ),
                    sender: Sender::Bot,
                });
                self.auto_follow = true;
            }
            Err(error) => {
                tracing::error!("upload failed: {error:#}");
                self.upload_status = UploadStatus::Error {
                    text: format!("Upload failed: {}", error),
                    expires,
                };
            }
        }
    }

    pub fn open_upload_prompt(&mut self) {
        if !self.is_uploading() {
            self.show_upload_prompt = true;
        }
    }

    pub fn close_upload_prompt(&mut self) {
        self.show_upload_prompt = false;
        self.upload_input.clear();
        self.upload_cursor = 0;
    }

    /// Advance animations and expire the upload status line.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if self.sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        let expired = match &self.upload_status {
            UploadStatus::Success { expires, .. } | UploadStatus::Error { expires, .. } => {
                Instant::now() >= *expires
            }
            _ => false,
        };
        if expired {
            self.upload_status = UploadStatus::Idle;
        }
    }

    /// Placeholder for the empty input box: the default prompt at first,
    /// rotating example queries once the user has idled.
    pub fn placeholder(&self) -> &'static str {
        if self.tick_count < PLACEHOLDER_DELAY_TICKS {
            return PLACEHOLDER_DEFAULT;
        }
        let idx = ((self.tick_count - PLACEHOLDER_DELAY_TICKS) / PLACEHOLDER_HOLD_TICKS) as usize;
        EXAMPLE_QUERIES[idx % EXAMPLE_QUERIES.len()]
    }

    // Chat viewport scrolling
    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
        self.auto_follow = false;
    }

    pub fn scroll_down(&mut self) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(1).min(max);
        if self.scroll == max {
            self.auto_follow = true;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let mut config = Config::default();
        config.upload_clear_secs = 0;
        App::new(&config).unwrap()
    }

    #[test]
    fn submit_pushes_exactly_one_user_message() {
        let mut app = test_app();
        app.input = "what is a transformer?".to_string();

        let sent = app.begin_send();

        assert_eq!(sent.as_deref(), Some("what is a transformer?"));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);
        assert_eq!(app.messages[0].text, "what is a transformer?");
        assert!(app.input.is_empty());
        assert!(app.is_sending());
    }

    #[test]
    fn blank_submit_is_a_silent_no_op() {
        let mut app = test_app();
        for input in ["", "   ", "\t \t"] {
            app.input = input.to_string();
            assert!(app.begin_send().is_none());
            assert!(app.messages.is_empty());
            assert!(!app.is_sending());
        }
    }

    #[test]
    fn submit_trims_surrounding_whitespace() {
        let mut app = test_app();
        app.input = "  hello  ".to_string();
        assert_eq!(app.begin_send().as_deref(), Some("hello"));
        assert_eq!(app.messages[0].text, "hello");
    }

    #[test]
    fn double_submit_while_sending_is_a_no_op() {
        let mut app = test_app();
        app.input = "first".to_string();
        assert!(app.begin_send().is_some());

        app.input = "second".to_string();
        assert!(app.begin_send().is_none());
        // The second attempt changed nothing: one message, input untouched
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.input, "second");
    }

    #[test]
    fn indicator_tracks_outstanding_request_exactly() {
        let mut app = test_app();
        assert!(!app.is_sending());

        app.input = "hi".to_string();
        app.begin_send();
        assert!(app.is_sending());

        app.finish_send(Ok("hello!".to_string()));
        assert!(!app.is_sending());
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Bot);
        assert_eq!(app.messages[1].text, "hello!");
    }

    #[test]
    fn failed_request_renders_the_fixed_apology_and_reenables_send() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.begin_send();

        app.finish_send(Err(anyhow::anyhow!("chat request failed with status 500")));

        assert!(!app.is_sending());
        assert_eq!(app.messages[1].text, APOLOGY);
        assert_eq!(app.messages[1].sender, Sender::Bot);

        // The flow is back to Idle and accepts the next submit
        app.input = "again".to_string();
        assert!(app.begin_send().is_some());
    }

    #[test]
    fn first_submit_dismisses_the_welcome_banner() {
        let mut app = test_app();
        assert!(app.show_welcome);
        app.input = "hi".to_string();
        app.begin_send();
        assert!(!app.show_welcome);
    }

    #[test]
    fn upload_success_sets_status_and_appends_confirmation() {
        let mut app = test_app();
        app.upload_input = "/tmp/paper.pdf".to_string();

        let path = app.begin_upload().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/paper.pdf"));
        assert!(app.is_uploading());

        app.finish_upload(Ok(UploadReceipt {
            message: Some("File uploaded successfully".to_string()),
            filename: Some("paper.pdf".to_string()),
        }));

        assert!(matches!(app.upload_status, UploadStatus::Success { .. }));
        let last = app.messages.last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert!(last.text.contains("paper.pdf"));
    }

    #[test]
    fn upload_status_clears_after_the_configured_delay() {
        let mut app = test_app(); // upload_clear_secs = 0
        app.upload_input = "/tmp/notes.md".to_string();
        app.begin_upload();
        app.finish_upload(Err(anyhow::anyhow!("upload failed with status 500")));

        assert!(matches!(app.upload_status, UploadStatus::Error { .. }));
        app.tick();
        assert!(matches!(app.upload_status, UploadStatus::Idle));
    }

    #[test]
    fn concurrent_upload_is_refused() {
        let mut app = test_app();
        app.upload_input = "/tmp/a.txt".to_string();
        assert!(app.begin_upload().is_some());

        app.upload_input = "/tmp/b.txt".to_string();
        assert!(app.begin_upload().is_none());
    }

    #[test]
    fn upload_and_send_flows_are_independent() {
        let mut app = test_app();
        app.upload_input = "/tmp/a.txt".to_string();
        app.begin_upload();

        app.input = "hello".to_string();
        assert!(app.begin_send().is_some());
    }

    #[test]
    fn placeholder_rotates_to_examples_after_idle_delay() {
        let mut app = test_app();
        assert_eq!(app.placeholder(), PLACEHOLDER_DEFAULT);
        for _ in 0..PLACEHOLDER_DELAY_TICKS {
            app.tick();
        }
        assert!(EXAMPLE_QUERIES.contains(&app.placeholder()));
    }

    #[test]
    fn animation_only_advances_while_sending() {
        let mut app = test_app();
        app.tick();
        assert_eq!(app.animation_frame, 0);

        app.input = "hi".to_string();
        app.begin_send();
        app.tick();
        assert_eq!(app.animation_frame, 1);
    }
}
