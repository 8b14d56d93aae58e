use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{ChatReply, ChatRequest};

/// Errors from a chat backend call.
/// None of these reach the user directly; the turn controller turns them
/// into a fallback reply.
#[derive(Debug)]
pub enum ApiError {
    /// Client misconfigured (bad base URL, TLS setup).
    Config(String),
    /// Connection-level failure (DNS, refused, reset).
    Network(String),
    /// No reply within the allowed time.
    Timeout(Duration),
    /// Backend answered with a non-success HTTP status.
    Status { status: u16, message: String },
    /// Backend answered 2xx but put an `error` in the body.
    Application(String),
    /// Body could not be decoded, or had no reply text.
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "config error: {msg}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Timeout(after) => write!(f, "no reply after {}s", after.as_secs_f32()),
            ApiError::Status { status, message } => {
                write!(f, "backend error (HTTP {status}): {message}")
            }
            ApiError::Application(msg) => write!(f, "backend reported: {msg}"),
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// The remote conversational endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Human-readable location of the backend, for the title bar and logs.
    fn endpoint(&self) -> &str;

    /// Send one user message and wait for the assistant's reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// Drop the server-side history for a session.
    async fn clear_history(&self, session_id: &str) -> Result<(), ApiError>;
}

/// Run `backend.send` under a deadline.
pub async fn send_with_timeout(
    backend: &dyn ChatBackend,
    request: &ChatRequest,
    timeout: Duration,
) -> Result<ChatReply, ApiError> {
    match tokio::time::timeout(timeout, backend.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout(timeout)),
    }
}
