pub mod backend;
pub mod client;
pub mod types;

pub use backend::{ApiError, ChatBackend, send_with_timeout};
pub use client::HttpChatBackend;
pub use types::{ChatReply, ChatRequest, ChatResponse};
