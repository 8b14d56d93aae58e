//! Wire types for the chat endpoint.
//!
//! ```text
//! POST /chat   { "message": "...", "session_id"?: "..." }
//!          ←   { "assistant_response"?: "...", "session_id"?: "...", "error"?: "..." }
//! ```

use serde::{Deserialize, Serialize};

use super::backend::ApiError;

/// Request body for `POST /chat`. `session_id` is omitted until the backend assigns one.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response body for `POST /chat`. Unknown fields (`status`, `user_input`) are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResponse {
    #[serde(default)]
    pub assistant_response: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A successful turn: the assistant's text and the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub session_id: Option<String>,
}

impl ChatResponse {
    /// Validate the body. A non-empty `error` wins over everything else;
    /// empty strings count as absent.
    pub fn into_reply(self) -> Result<ChatReply, ApiError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(ApiError::Application(error));
        }
        let text = self
            .assistant_response
            .ok_or_else(|| ApiError::Parse("response has no assistant_response".to_string()))?;
        Ok(ChatReply {
            text,
            session_id: self.session_id.filter(|s| !s.is_empty()),
        })
    }
}
