use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{error, info};

use lucosms_core::{Assistant, ChatMessage, Config, GeminiSession, Settled, Transcript};

use crate::page::{Page, SharedPage};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Page state
    pub page: SharedPage,
    pub page_area: Option<Rect>,

    // Chat widget state
    pub chat_open: bool,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript area
    pub chat_width: u16,  // Inner width, for wrap calculations
    pub chat_area: Option<Rect>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Assistant
    pub config: Config,
    pub model_name: String,
    pub assistant: Option<Assistant<GeminiSession>>,
    pub exchange_task: Option<JoinHandle<Settled<GeminiSession>>>,
    offline_transcript: Transcript, // Shown when there is no assistant
}

impl App {
    pub fn new(config: Config) -> Self {
        let assistant = config.gemini_session().map(Assistant::new);
        if assistant.is_none() {
            info!("no Gemini API key configured, assistant disabled");
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            page: SharedPage::new(Page::site()),
            page_area: None,

            chat_open: false,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,

            model_name: config.model().to_string(),
            config,
            assistant,
            exchange_task: None,
            offline_transcript: Transcript::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.assistant.as_ref().map(|a| a.is_busy()).unwrap_or(false)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.assistant
            .as_ref()
            .map(|a| a.transcript())
            .unwrap_or(&self.offline_transcript)
            .messages()
    }

    pub fn open_chat(&mut self) {
        self.chat_open = true;
        self.input_mode = InputMode::Editing;
        self.scroll_chat_to_bottom();
    }

    pub fn close_chat(&mut self) {
        self.chat_open = false;
        self.input_mode = InputMode::Normal;
    }

    /// Hand the current input to the assistant.
    ///
    /// The input is only consumed when an exchange actually starts; blank
    /// input, a pending exchange, or a missing API key leave it in place.
    pub fn submit_chat(&mut self) {
        let Some(assistant) = self.assistant.as_mut() else {
            return;
        };
        let Some(exchange) = assistant.begin(&self.chat_input) else {
            return;
        };

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.animation_frame = 0;

        let mut page = self.page.clone();
        self.exchange_task = Some(tokio::spawn(async move { exchange.run(&mut page).await }));

        self.scroll_chat_to_bottom();
    }

    /// Fold a finished exchange back into the assistant.
    pub async fn poll_exchange(&mut self) {
        let finished = self
            .exchange_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        let Some(task) = self.exchange_task.take() else {
            return;
        };
        match task.await {
            Ok(settled) => {
                if let Some(assistant) = self.assistant.as_mut() {
                    assistant.settle(settled);
                }
            }
            Err(err) => {
                error!(error = %err, "exchange task failed");
                match self.config.gemini_session() {
                    Some(session) => {
                        if let Some(assistant) = self.assistant.as_mut() {
                            assistant.recover(session);
                        }
                    }
                    None => self.assistant = None,
                }
            }
        }

        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame and smooth scrolling (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.page.lock().tick();
    }

    pub fn scroll_page(&mut self, delta: i32) {
        self.page.lock().scroll_by(delta);
    }

    pub fn page_down(&mut self) {
        let mut page = self.page.lock();
        let step = page.viewport_height().max(1) as i32;
        page.scroll_by(step);
    }

    pub fn page_up(&mut self) {
        let mut page = self.page.lock();
        let step = page.viewport_height().max(1) as i32;
        page.scroll_by(-step);
    }

    pub fn scroll_chat(&mut self, delta: i32) {
        let max = self.chat_content_lines().saturating_sub(self.chat_height);
        let next = self.chat_scroll as i32 + delta;
        self.chat_scroll = next.clamp(0, max as i32) as u16;
    }

    /// Scroll the transcript so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.chat_content_lines().saturating_sub(self.chat_height);
    }

    /// Rendered line count of the transcript at the current chat width.
    pub fn chat_content_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 40 };
        ui::wrapped_height(ui::chat_text(self), wrap_width)
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
        self.chat_input.insert(byte_pos, c);
        self.chat_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.chat_cursor > 0 {
            self.chat_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.chat_cursor < self.chat_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.chat_cursor = (self.chat_cursor + 1).min(self.chat_input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.chat_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.chat_cursor = self.chat_input.chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucosms_core::knowledge::FALLBACK_REPLY;
    use lucosms_core::SectionId;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_reply(text: &str) -> serde_json::Value {
        json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
    }

    fn online_app(server: &MockServer) -> App {
        let mut app = App::new(Config {
            gemini_api_key: Some("test-key".to_string()),
            base_url: Some(server.uri()),
            ..Config::default()
        });
        app.chat_width = 40;
        app.page.lock().set_viewport_height(10);
        app
    }

    async fn wait_for_exchange(app: &App) {
        for _ in 0..500 {
            if app.exchange_task.as_ref().map(|t| t.is_finished()).unwrap_or(true) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("exchange did not finish");
    }

    fn offline_app() -> App {
        App::new(Config::default())
    }

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_input_editing_is_char_aware() {
        let mut app = offline_app();
        for c in "prix".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.insert_char('é');
        assert_eq!(app.chat_input, "priéx");

        app.cursor_home();
        app.delete();
        app.cursor_end();
        app.backspace();
        assert_eq!(app.chat_input, "rié");
        assert_eq!(app.chat_cursor, 3);
    }

    #[test]
    fn test_submit_without_assistant_keeps_input() {
        let mut app = offline_app();
        app.assistant = None;
        app.chat_input = "show me pricing".to_string();

        app.submit_chat();

        assert_eq!(app.chat_input, "show me pricing");
        assert!(app.exchange_task.is_none());
        assert!(!app.is_busy());
        assert_eq!(app.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_exchange_scrolls_page_and_settles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [{
                    "functionCall": { "name": "navigate_to_section", "args": { "sectionId": "pricing" } }
                }] } }]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Here is our pricing.")))
            .mount(&server)
            .await;

        let mut app = online_app(&server);
        let idle_lines = app.chat_content_lines();

        app.chat_input = "show me pricing".to_string();
        app.submit_chat();

        assert!(app.is_busy());
        assert!(app.chat_input.is_empty());
        assert_eq!(app.messages().len(), 2);
        // "You:", the message, a blank, then "AI:" and "Thinking."
        assert_eq!(app.chat_content_lines(), idle_lines + 5);

        wait_for_exchange(&app).await;
        app.poll_exchange().await;

        assert!(!app.is_busy());
        assert!(app.exchange_task.is_none());
        let messages = app.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, "Here is our pricing.");
        assert!(messages[2].tool_invocation);

        assert!(app.page.lock().is_animating());
        for _ in 0..100 {
            app.tick();
        }
        assert_eq!(app.page.lock().current_section(), Some(SectionId::Pricing));
    }

    #[tokio::test]
    async fn test_lost_exchange_recovers_with_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let mut app = online_app(&server);
        app.chat_input = "hello".to_string();
        app.submit_chat();
        assert!(app.is_busy());

        // Still pending: polling leaves it alone
        app.poll_exchange().await;
        assert!(app.is_busy());

        if let Some(task) = app.exchange_task.as_ref() {
            task.abort();
        }
        wait_for_exchange(&app).await;
        app.poll_exchange().await;

        assert!(!app.is_busy());
        assert!(app.assistant.is_some());
        let messages = app.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, FALLBACK_REPLY);
    }
}
