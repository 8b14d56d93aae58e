//! # Turn Controller
//!
//! Runs one request/response cycle per submission and owns the
//! [`ConversationState`]. Everything that can go wrong with the backend ends
//! here as a fallback bot message; callers never see an `ApiError`.
//!
//! ```text
//! begin_turn(raw) ──► user message appended, pending = true ──► (TurnId, ChatRequest)
//!                                                                  │
//!                         backend.send() under a timeout ◄─────────┘
//!                                                                  │
//! complete_turn(turn, result) ◄────────────────────────────────────┘
//!   stale turn → dropped
//!   Ok  → store session id, append reply
//!   Err → log, append fallback
//!   pending = false
//! ```
//!
//! The TUI drives `begin_turn`/`complete_turn` separately so the network
//! call runs on a background task; `submit` does the whole cycle inline.
//! Every turn gets a fresh [`TurnId`]. A result only lands if its id is the
//! turn still awaiting a reply, so a reply that outlives a `reset` can never
//! fill a later turn or bring back the old session.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::api::{ApiError, ChatBackend, ChatReply, ChatRequest, send_with_timeout};
use crate::core::conversation::ConversationState;

pub const DEFAULT_GREETING: &str =
    "Hello! I'm Leet, your coding assistant. Share a LeetCode link, and I'll guide you through it.";
pub const DEFAULT_RESET_GREETING: &str =
    "I'm ready to help with a new problem! What would you like to work on now?";
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, I couldn't process your request at the moment. Please try again.";
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed texts and limits for a conversation.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    pub greeting: String,
    pub reset_greeting: String,
    pub fallback_reply: String,
    pub timeout: Duration,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            reset_greeting: DEFAULT_RESET_GREETING.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

/// Identifies one turn from `begin_turn` to `complete_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnId(u64);

pub struct TurnController {
    state: ConversationState,
    backend: Arc<dyn ChatBackend>,
    options: TurnOptions,
    /// The turn awaiting a reply, if any.
    current_turn: Option<TurnId>,
    next_turn: u64,
}

impl TurnController {
    pub fn new(backend: Arc<dyn ChatBackend>, options: TurnOptions) -> Self {
        Self {
            state: ConversationState::with_greeting(&options.greeting),
            backend,
            options,
            current_turn: None,
            next_turn: 0,
        }
    }

    /// Read-only view of the conversation.
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn backend(&self) -> Arc<dyn ChatBackend> {
        self.backend.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }

    /// The turn whose reply is still outstanding.
    pub fn pending_turn(&self) -> Option<TurnId> {
        self.current_turn
    }

    /// Start a turn: append the user message and mark a reply as pending.
    ///
    /// Returns `None` without touching state when the input is blank or a
    /// reply is already pending. The returned id must be handed back to
    /// `complete_turn` with the result.
    pub fn begin_turn(&mut self, raw: &str) -> Option<(TurnId, ChatRequest)> {
        if raw.trim().is_empty() {
            debug!("Ignoring blank submission");
            return None;
        }
        if self.state.is_pending() {
            warn!("Submission ignored: a reply is still pending");
            return None;
        }

        let id = self.state.push_user(raw.to_string()).id;
        self.state.set_pending(true);
        let turn = TurnId(self.next_turn);
        self.next_turn += 1;
        self.current_turn = Some(turn);
        info!("Turn {} started (message id={}, len={})", turn.0, id, raw.len());

        let request = ChatRequest {
            message: raw.to_string(),
            session_id: self.state.session_token().map(str::to_string),
        };
        Some((turn, request))
    }

    /// Finish `turn` with the backend's outcome.
    ///
    /// Returns `false` and leaves state alone when `turn` is not the one
    /// awaiting a reply (the conversation was reset after it started).
    pub fn complete_turn(&mut self, turn: TurnId, result: Result<ChatReply, ApiError>) -> bool {
        if self.current_turn != Some(turn) {
            debug!("Dropping reply for stale turn {}", turn.0);
            return false;
        }
        self.current_turn = None;
        match result {
            Ok(reply) => {
                if let Some(session_id) = reply.session_id {
                    self.state.set_session_token(session_id);
                }
                let id = self.state.push_bot(reply.text).id;
                info!("Turn complete (reply id={})", id);
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                self.state.push_bot(self.options.fallback_reply.clone());
            }
        }
        self.state.set_pending(false);
        true
    }

    /// Run a whole turn inline. Returns `false` if the input was rejected.
    pub async fn submit(&mut self, raw: &str) -> bool {
        let Some((turn, request)) = self.begin_turn(raw) else {
            return false;
        };
        let result = send_with_timeout(self.backend.as_ref(), &request, self.options.timeout).await;
        self.complete_turn(turn, result)
    }

    /// Start over: ask the backend to forget the session (without waiting),
    /// then clear local state down to the reset greeting.
    pub fn reset(&mut self) {
        if let Some(session_id) = self.state.take_session_token() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let backend = self.backend.clone();
                    handle.spawn(async move {
                        if let Err(e) = backend.clear_history(&session_id).await {
                            warn!("Failed to clear history for session {}: {}", session_id, e);
                        }
                    });
                }
                Err(_) => warn!(
                    "No async runtime; server history for session {} not cleared",
                    session_id
                ),
            }
        }
        if let Some(turn) = self.current_turn.take() {
            info!("Reset abandons turn {}", turn.0);
        }
        self.state.reset_with_greeting(&self.options.reset_greeting);
        info!("Conversation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Sender;
    use crate::test_support::ScriptedBackend;

    fn reply(text: &str, session: Option<&str>) -> Result<ChatReply, ApiError> {
        Ok(ChatReply {
            text: text.to_string(),
            session_id: session.map(str::to_string),
        })
    }

    fn controller(backend: &Arc<ScriptedBackend>) -> TurnController {
        TurnController::new(backend.clone(), TurnOptions::default())
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_bot() {
        let backend = Arc::new(ScriptedBackend::new(vec![reply("Try two pointers.", None)]));
        let mut ctl = controller(&backend);

        assert!(ctl.submit("How do I solve 3sum?").await);

        let msgs = ctl.state().messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].sender, Sender::User);
        assert_eq!(msgs[1].text, "How do I solve 3sum?");
        assert_eq!(msgs[2].sender, Sender::Bot);
        assert_eq!(msgs[2].text, "Try two pointers.");
        assert!(!ctl.state().is_pending());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);

        assert!(!ctl.submit("   \n\t ").await);
        assert!(!ctl.submit("").await);

        assert_eq!(ctl.state().messages().len(), 1);
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(ApiError::Network(
            "connection refused".to_string(),
        ))]));
        let mut ctl = controller(&backend);

        assert!(ctl.submit("hello").await);

        let last = ctl.state().messages().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, DEFAULT_FALLBACK_REPLY);
        assert!(!ctl.state().is_pending());
    }

    #[tokio::test]
    async fn test_application_error_becomes_fallback() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(ApiError::Application(
            "Message field is required".to_string(),
        ))]));
        let mut ctl = controller(&backend);

        ctl.submit("hello").await;

        assert_eq!(ctl.state().messages().last().unwrap().text, DEFAULT_FALLBACK_REPLY);
        assert!(ctl.state().session_token().is_none());
    }

    #[tokio::test]
    async fn test_session_is_echoed_on_next_request() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            reply("first", Some("abc")),
            reply("second", None),
        ]));
        let mut ctl = controller(&backend);

        ctl.submit("one").await;
        ctl.submit("two").await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].session_id, None);
        assert_eq!(requests[1].session_id.as_deref(), Some("abc"));
        assert_eq!(ctl.state().session_token(), Some("abc"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_to_fallback() {
        let backend = Arc::new(ScriptedBackend::new(vec![reply("late", None)]).with_delay(Duration::from_secs(5)));
        let options = TurnOptions {
            timeout: Duration::from_millis(50),
            ..TurnOptions::default()
        };
        let mut ctl = TurnController::new(backend.clone(), options);

        ctl.submit("anyone there?").await;

        assert_eq!(ctl.state().messages().last().unwrap().text, DEFAULT_FALLBACK_REPLY);
        assert!(!ctl.state().is_pending());
    }

    #[test]
    fn test_begin_turn_guards_pending() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);

        let (turn, _) = ctl.begin_turn("first").unwrap();
        assert!(ctl.state().is_pending());
        assert_eq!(ctl.pending_turn(), Some(turn));

        assert!(ctl.begin_turn("second").is_none());
        assert_eq!(ctl.state().messages().len(), 2);

        assert!(ctl.complete_turn(turn, reply("done", None)));
        assert!(!ctl.state().is_pending());
        assert_eq!(ctl.pending_turn(), None);
        assert!(ctl.begin_turn("third").is_some());
    }

    #[test]
    fn test_late_reply_after_reset_is_dropped() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);
        let (old_turn, _) = ctl.begin_turn("slow question").unwrap();

        ctl.reset();
        assert!(!ctl.complete_turn(old_turn, reply("stale answer", Some("old"))));

        assert_eq!(ctl.state().messages().len(), 1);
        assert_eq!(ctl.state().messages()[0].text, DEFAULT_RESET_GREETING);
        assert!(ctl.state().session_token().is_none());
    }

    #[test]
    fn test_late_reply_does_not_fill_the_next_turn() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);
        let (old_turn, _) = ctl.begin_turn("old question").unwrap();
        ctl.reset();
        let (new_turn, request) = ctl.begin_turn("new question").unwrap();
        assert_ne!(old_turn, new_turn);
        assert_eq!(request.session_id, None);

        // The reply to the abandoned turn arrives while the new one is pending
        assert!(!ctl.complete_turn(
            old_turn,
            reply("answer to old question", Some("old-session"))
        ));
        assert!(ctl.state().is_pending());
        assert!(ctl.state().session_token().is_none());
        assert_eq!(ctl.state().messages().len(), 2);

        // The real reply still lands
        assert!(ctl.complete_turn(new_turn, reply("answer to new question", Some("new-session"))));
        let texts: Vec<&str> = ctl.state().messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![DEFAULT_RESET_GREETING, "new question", "answer to new question"]
        );
        assert_eq!(ctl.state().session_token(), Some("new-session"));
        assert!(!ctl.state().is_pending());
    }

    #[test]
    fn test_begin_turn_keeps_raw_text() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);

        let (_, request) = ctl.begin_turn("  padded  ").unwrap();
        assert_eq!(request.message, "  padded  ");
        assert_eq!(ctl.state().messages()[1].text, "  padded  ");
    }

    #[tokio::test]
    async fn test_reset_clears_and_deletes_session() {
        let backend = Arc::new(ScriptedBackend::new(vec![reply("hi", Some("abc"))]));
        let mut ctl = controller(&backend);
        ctl.submit("hello").await;

        ctl.reset();

        assert_eq!(ctl.state().messages().len(), 1);
        assert_eq!(ctl.state().messages()[0].text, DEFAULT_RESET_GREETING);
        assert!(ctl.state().session_token().is_none());

        // The delete runs detached; give it a moment to land
        for _ in 0..50 {
            if !backend.cleared().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(backend.cleared(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_reset_survives_failed_delete() {
        let backend = Arc::new(ScriptedBackend::new(vec![reply("hi", Some("abc"))]).failing_clear());
        let mut ctl = controller(&backend);
        ctl.submit("hello").await;

        ctl.reset();

        assert_eq!(ctl.state().messages().len(), 1);
        assert!(ctl.state().session_token().is_none());
    }

    #[test]
    fn test_reset_without_session_skips_delete() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);

        ctl.reset();

        assert_eq!(ctl.state().messages().len(), 1);
        assert!(backend.cleared().is_empty());
    }

    #[test]
    fn test_reset_outside_runtime_still_clears() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut ctl = controller(&backend);
        let (turn, _) = ctl.begin_turn("question").unwrap();
        ctl.complete_turn(turn, reply("answer", Some("abc")));

        ctl.reset();

        assert_eq!(ctl.state().messages().len(), 1);
        assert!(ctl.state().session_token().is_none());
        assert!(backend.cleared().is_empty());
    }
}
