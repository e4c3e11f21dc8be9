use anyhow::Result;
use ragchat_core::{ChatClient, ChatView, Language, ScrollAnchor, Settings};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub chat: ChatView,
    pub client: ChatClient,
    pub pending: Option<JoinHandle<Result<String>>>,

    // Presentation
    pub language: Language,
    pub assistant_name: String,

    // Draft editing
    pub cursor: usize, // char index into the draft

    // Chat panel scroll state
    pub chat_scroll: u16,
    pub chat_max_scroll: u16, // updated during render
    pub chat_height: u16,     // inner height, updated during render
    pub follow_bottom: bool,
    pub scroll_anchor: ScrollAnchor,

    // Animation state
    pub animation_frame: u8, // 0-2 for typing indicator dots

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            should_quit: false,

            chat: ChatView::new(settings.language.strings().fallback),
            client: ChatClient::new(&settings.endpoint),
            pending: None,

            language: settings.language,
            assistant_name: settings.assistant_name.clone(),

            cursor: 0,

            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_height: 0,
            follow_bottom: false,
            scroll_anchor: ScrollAnchor::new(),

            animation_frame: 0,

            chat_area: None,
            send_area: None,
        }
    }

    /// The send control is only interactive while no request is outstanding.
    pub fn can_send(&self) -> bool {
        !self.chat.is_busy()
    }

    /// Submit the draft and start the backend request in the background.
    pub fn submit(&mut self) {
        let Some(query) = self.chat.begin_submit() else {
            return;
        };
        self.cursor = 0;
        self.animation_frame = 0;

        let client = self.client.clone();
        self.pending = Some(tokio::spawn(async move { client.ask(&query).await }));
    }

    pub fn finish_turn(&mut self, outcome: Result<String>) {
        self.pending = None;
        self.chat.complete(outcome);
    }

    /// Called after every state change. Re-pins the chat panel to the newest
    /// message when the conversation grew or the request state flipped.
    pub fn on_state_committed(&mut self) {
        if self.scroll_anchor.changed(&self.chat) {
            self.follow_bottom = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }
}

/// Resolves when the outstanding request finishes. Pends forever while
/// nothing is in flight, so it can sit in a `select!` next to the event
/// stream.
pub async fn wait_for_answer(pending: &mut Option<JoinHandle<Result<String>>>) -> Result<String> {
    let Some(handle) = pending.as_mut() else {
        return std::future::pending().await;
    };

    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(e) => Err(anyhow::Error::new(e).context("answer task failed")),
    };
    *pending = None;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::{ChatRole, RequestState};

    fn settings(endpoint: String) -> Settings {
        Settings {
            endpoint,
            language: Language::English,
            assistant_name: "Gemini".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_runs_one_turn() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"answer": "Paris is the capital of France."}"#)
            .create_async()
            .await;
        let mut app = App::new(&settings(format!("{}/api/chat", server.url())));

        app.chat.set_draft("What is the capital of France?");
        app.cursor = 30;
        app.submit();

        assert_eq!(app.chat.draft(), "");
        assert_eq!(app.cursor, 0);
        assert!(!app.can_send());
        assert!(app.pending.is_some());

        let outcome = wait_for_answer(&mut app.pending).await;
        app.finish_turn(outcome);

        assert!(app.pending.is_none());
        assert_eq!(app.chat.request_state(), RequestState::Idle);
        let last = app.chat.conversation().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.text, "Paris is the capital of France.");
    }

    #[tokio::test]
    async fn test_failed_turn_shows_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(500)
            .create_async()
            .await;
        let mut app = App::new(&settings(format!("{}/api/chat", server.url())));

        app.chat.set_draft("anything");
        app.submit();
        let outcome = wait_for_answer(&mut app.pending).await;
        app.finish_turn(outcome);

        assert_eq!(app.chat.conversation().len(), 2);
        assert_eq!(
            app.chat.conversation().last().unwrap().text,
            Language::English.strings().fallback
        );
        assert!(app.can_send());
    }

    #[tokio::test]
    async fn test_panicking_request_task_falls_back() {
        let mut app = App::new(&settings("http://127.0.0.1:9/api/chat".to_string()));
        app.chat.set_draft("q");
        app.chat.begin_submit().unwrap();
        app.pending = Some(tokio::spawn(async {
            if true {
                panic!("request task blew up");
            }
            Ok(String::new())
        }));

        let outcome = wait_for_answer(&mut app.pending).await;
        assert!(outcome.is_err());
        app.finish_turn(outcome);

        assert!(app.can_send());
        assert_eq!(
            app.chat.conversation().last().unwrap().text,
            Language::English.strings().fallback
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_ignored() {
        let mut app = App::new(&settings("http://127.0.0.1:9/api/chat".to_string()));

        app.chat.set_draft("one");
        app.submit();
        app.chat.set_draft("two");
        app.submit();

        assert_eq!(app.chat.conversation().len(), 1);
        assert_eq!(app.chat.draft(), "two");
    }

    #[test]
    fn test_state_commit_follows_bottom_only_on_change() {
        let mut app = App::new(&settings("http://localhost:5001/api/chat".to_string()));
        app.on_state_committed();
        assert!(app.follow_bottom);

        app.follow_bottom = false;
        app.chat.draft_mut().push('x');
        app.on_state_committed();
        assert!(!app.follow_bottom);
    }

    #[test]
    fn test_manual_scroll_is_clamped() {
        let mut app = App::new(&settings("http://localhost:5001/api/chat".to_string()));
        app.chat_max_scroll = 4;
        app.follow_bottom = true;

        app.scroll_down(10);
        assert_eq!(app.chat_scroll, 4);
        assert!(!app.follow_bottom);

        app.scroll_up(10);
        assert_eq!(app.chat_scroll, 0);
    }
}
