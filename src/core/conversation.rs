//! # Conversation State
//!
//! The ordered message log plus the two pieces of turn state that go with it:
//! whether a reply is pending and the backend's session token.
//!
//! ```text
//! ConversationState
//! ├── messages: Vec<Message>        // append-only, insertion order = display order
//! ├── pending_reply: bool           // a request is in flight
//! ├── session_token: Option<String> // assigned by the backend, echoed back
//! └── next_id: u64                  // never rewinds, even across resets
//! ```
//!
//! Fields are private. Readers get slices and accessors; only the turn
//! controller (same crate) can append or reset.

use chrono::{DateTime, Local};
use log::debug;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A single entry in the log. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Local>,
}

#[derive(Debug)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending_reply: bool,
    session_token: Option<String>,
    next_id: u64,
}

impl ConversationState {
    /// A fresh conversation holding a single bot greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut state = Self {
            messages: Vec::new(),
            pending_reply: false,
            session_token: None,
            next_id: 1,
        };
        state.push(Sender::Bot, greeting.to_string());
        state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending_reply
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn find(&self, id: u64) -> Option<&Message> {
        // Ids are strictly increasing, so the log is sorted by id
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|idx| &self.messages[idx])
    }

    pub(crate) fn push_user(&mut self, text: String) -> &Message {
        self.push(Sender::User, text)
    }

    pub(crate) fn push_bot(&mut self, text: String) -> &Message {
        self.push(Sender::Bot, text)
    }

    fn push(&mut self, sender: Sender, text: String) -> &Message {
        let message = Message {
            id: self.next_id,
            text,
            sender,
            sent_at: Local::now(),
        };
        self.next_id += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending_reply = pending;
    }

    /// Store the token the backend assigned. A repeated token is a no-op.
    pub(crate) fn set_session_token(&mut self, token: String) {
        if self.session_token.as_deref() != Some(token.as_str()) {
            debug!("Session token set: {}", token);
            self.session_token = Some(token);
        }
    }

    pub(crate) fn take_session_token(&mut self) -> Option<String> {
        self.session_token.take()
    }

    /// Drop the whole log and the token, leaving only `greeting`.
    pub(crate) fn reset_with_greeting(&mut self, greeting: &str) {
        self.messages.clear();
        self.session_token = None;
        self.pending_reply = false;
        self.push(Sender::Bot, greeting.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_greeting() {
        let state = ConversationState::with_greeting("hi there");
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].sender, Sender::Bot);
        assert_eq!(state.messages()[0].text, "hi there");
        assert!(!state.is_pending());
        assert!(state.session_token().is_none());
    }

    #[test]
    fn test_append_preserves_order_and_ids() {
        let mut state = ConversationState::with_greeting("hello");
        state.push_user("one".to_string());
        state.push_bot("two".to_string());

        let texts: Vec<&str> = state.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "one", "two"]);

        let ids: Vec<u64> = state.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_keep_increasing_after_reset() {
        let mut state = ConversationState::with_greeting("hello");
        let before = state.push_user("question".to_string()).id;
        state.reset_with_greeting("fresh start");

        assert_eq!(state.messages().len(), 1);
        assert!(state.messages()[0].id > before);
    }

    #[test]
    fn test_reset_clears_token_and_pending() {
        let mut state = ConversationState::with_greeting("hello");
        state.set_session_token("abc".to_string());
        state.set_pending(true);

        state.reset_with_greeting("again");

        assert!(state.session_token().is_none());
        assert!(!state.is_pending());
        assert_eq!(state.messages()[0].text, "again");
    }

    #[test]
    fn test_take_session_token() {
        let mut state = ConversationState::with_greeting("hello");
        state.set_session_token("abc".to_string());
        assert_eq!(state.take_session_token().as_deref(), Some("abc"));
        assert!(state.session_token().is_none());
    }

    #[test]
    fn test_find_by_id() {
        let mut state = ConversationState::with_greeting("hello");
        let id = state.push_user("find me".to_string()).id;
        state.push_bot("other".to_string());

        assert_eq!(state.find(id).map(|m| m.text.as_str()), Some("find me"));
        assert!(state.find(999).is_none());
    }
}
