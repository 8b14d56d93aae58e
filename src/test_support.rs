//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, ChatBackend, ChatReply, ChatRequest};
use crate::core::clipboard::{ClipboardError, ClipboardSink};
use crate::core::action::{Action, Effect, update};
use crate::core::controller::TurnOptions;
use crate::core::state::App;

/// A backend that replays canned results in order and records what it was asked.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    cleared: Mutex<Vec<String>>,
    delay: Option<Duration>,
    fail_clear: bool,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<ChatReply, ApiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            delay: None,
            fail_clear: false,
        }
    }

    /// Sleep this long before answering each `send`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every `clear_history` call fail.
    pub fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn endpoint(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ApiError::Network("no scripted reply".to_string())))
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), ApiError> {
        if self.fail_clear {
            return Err(ApiError::Status {
                status: 500,
                message: "history store down".to_string(),
            });
        }
        self.cleared.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

/// In-memory clipboard. Clones share the same contents so a test can keep a
/// handle after boxing one into an `App`.
#[derive(Clone, Default)]
pub struct FakeClipboard {
    contents: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Vec<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl ClipboardSink for FakeClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.contents.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Creates a test App backed by `backend`, with a fake clipboard.
pub fn test_app_with(backend: Arc<ScriptedBackend>, clipboard: FakeClipboard) -> App {
    App::new(backend, Box::new(clipboard), TurnOptions::default())
}

/// Creates a test App with an empty script.
pub fn test_app() -> App {
    test_app_with(Arc::new(ScriptedBackend::new(vec![])), FakeClipboard::new())
}

/// Shorthand for a successful backend reply.
pub fn reply(text: &str, session: Option<&str>) -> Result<ChatReply, ApiError> {
    Ok(ChatReply {
        text: text.to_string(),
        session_id: session.map(str::to_string),
    })
}

/// Feed `result` to the app as the reply to the turn awaiting one.
pub fn deliver_reply(app: &mut App, result: Result<ChatReply, ApiError>) -> Effect {
    let turn = app
        .controller
        .pending_turn()
        .expect("deliver_reply needs a pending turn");
    update(app, Action::ReplyReady(turn, result))
}
