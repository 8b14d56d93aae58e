//! # Code Block Copy
//!
//! Copies one code block to the system clipboard and keeps a short-lived
//! label ("Copied!" / "Error") for that block's header. After
//! [`COPY_FEEDBACK_DURATION`] the label falls back to "Copy".
//!
//! A failed copy is never an error for the caller: it is logged and shown as
//! the "Error" label.

use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};

pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(1500);
pub const COPY_LABEL: &str = "Copy";

#[derive(Debug)]
pub enum ClipboardError {
    /// No clipboard could be opened (headless session, no display server).
    Unavailable(String),
    /// The clipboard refused the write.
    Write(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable(msg) => write!(f, "clipboard unavailable: {msg}"),
            ClipboardError::Write(msg) => write!(f, "clipboard write failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Anything that can take text for pasting elsewhere.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard via `arboard`. Opened on first use so a missing display
/// server only matters when someone actually copies.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Err(ClipboardError::Unavailable("not initialised".to_string()));
        };
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Addresses one code block: the `block`-th fence inside message `message_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeBlockRef {
    pub message_id: u64,
    pub block: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied,
    Failed,
}

impl CopyStatus {
    pub fn label(self) -> &'static str {
        match self {
            CopyStatus::Copied => "Copied!",
            CopyStatus::Failed => "Error",
        }
    }
}

/// Result of the most recent copy, shown on that block until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFeedback {
    pub target: CodeBlockRef,
    pub status: CopyStatus,
    pub at: Instant,
}

impl CopyFeedback {
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.at) < COPY_FEEDBACK_DURATION
    }

    /// Header label for `target` at time `now`.
    pub fn label_for(&self, target: CodeBlockRef, now: Instant) -> &'static str {
        if self.target == target && self.is_live(now) {
            self.status.label()
        } else {
            COPY_LABEL
        }
    }
}

/// Copy `code` and report how it went.
pub fn copy_code(sink: &mut dyn ClipboardSink, target: CodeBlockRef, code: &str) -> CopyFeedback {
    let status = match sink.set_text(code) {
        Ok(()) => {
            info!(
                "Copied code block {} of message {} ({} bytes)",
                target.block,
                target.message_id,
                code.len()
            );
            CopyStatus::Copied
        }
        Err(e) => {
            warn!("Failed to copy code: {}", e);
            CopyStatus::Failed
        }
    };
    CopyFeedback {
        target,
        status,
        at: Instant::now(),
    }
}
