//! The chat view: draft text, conversation and the single in-flight request.
//!
//! A submission is split in two so a front end can keep drawing while the
//! request runs:
//!
//! - [`ChatView::begin_submit`] takes the draft, clears it, marks the view
//!   busy and appends the user message.
//! - [`ChatView::complete`] appends the assistant message (answer or the
//!   fixed fallback) and marks the view idle again.
//!
//! [`ChatView::submit`] runs both halves around one [`ChatClient::ask`].

use anyhow::Result;

use crate::client::ChatClient;
use crate::state::{ChatMessage, Conversation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Busy,
}

#[derive(Debug, Clone)]
pub struct ChatView {
    draft: String,
    conversation: Conversation,
    request_state: RequestState,
    fallback: String,
}

impl ChatView {
    /// `fallback` is the assistant text appended whenever a request fails.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            draft: String::new(),
            conversation: Conversation::new(),
            request_state: RequestState::Idle,
            fallback: fallback.into(),
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_busy(&self) -> bool {
        self.request_state == RequestState::Busy
    }

    /// Accept the current draft as a new turn.
    ///
    /// Returns the trimmed query to send, or `None` without touching any
    /// state when the draft is blank or a request is already outstanding.
    pub fn begin_submit(&mut self) -> Option<String> {
        let query = self.draft.trim();
        if query.is_empty() || self.is_busy() {
            return None;
        }
        let query = query.to_string();

        self.draft.clear();
        self.request_state = RequestState::Busy;
        self.conversation.push(ChatMessage::user(query.clone()));

        Some(query)
    }

    /// Finish the outstanding turn with the backend's outcome.
    ///
    /// Every kind of failure looks the same to the user: one assistant
    /// message carrying the fallback text.
    pub fn complete(&mut self, outcome: Result<String>) {
        if !self.is_busy() {
            tracing::warn!("completion arrived with no outstanding request, ignoring");
            return;
        }

        let text = match outcome {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "could not fetch answer");
                self.fallback.clone()
            }
        };
        self.conversation.push(ChatMessage::assistant(text));
        self.request_state = RequestState::Idle;
    }

    /// Run a whole turn against `client`. Returns `false` if the draft was not
    /// accepted.
    pub async fn submit(&mut self, client: &ChatClient) -> bool {
        let Some(query) = self.begin_submit() else {
            return false;
        };
        let outcome = client.ask(&query).await;
        self.complete(outcome);
        true
    }
}

/// Post-commit hook keyed on conversation length and request state.
///
/// [`ScrollAnchor::changed`] reports `true` once for every new key, so the
/// caller scrolls to the newest message after appends and busy/idle flips
/// but not after draft edits.
#[derive(Debug, Default)]
pub struct ScrollAnchor {
    last: Option<(usize, RequestState)>,
}

impl ScrollAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&mut self, view: &ChatView) -> bool {
        let key = (view.conversation().len(), view.request_state());
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);
        true
    }
}
