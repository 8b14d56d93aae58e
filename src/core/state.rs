//! # Application State
//!
//! Core business state for Leetbot. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── controller: TurnController       // conversation + backend
//! ├── status_message: String           // status bar text
//! ├── assistant_name: String           // label on bot messages
//! ├── endpoint: String                 // backend base URL, for the title bar
//! ├── formatter: Formatter             // raw text → segments
//! ├── copy_feedback: Option<CopyFeedback>
//! └── clipboard: Box<dyn ClipboardSink>
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::api::ChatBackend;
use crate::core::clipboard::{ClipboardSink, CodeBlockRef, CopyFeedback};
use crate::core::config::{DEFAULT_ASSISTANT_NAME, ResolvedConfig};
use crate::core::controller::{TurnController, TurnOptions};
use crate::core::conversation::{ConversationState, Sender};
use crate::core::format::{Formatter, code_blocks};

pub const USER_LABEL: &str = "You";

pub struct App {
    pub controller: TurnController,
    pub status_message: String,
    pub assistant_name: String,
    pub endpoint: String,
    pub formatter: Formatter,
    pub copy_feedback: Option<CopyFeedback>,
    pub clipboard: Box<dyn ClipboardSink>,
}

impl App {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        clipboard: Box<dyn ClipboardSink>,
        options: TurnOptions,
    ) -> Self {
        let endpoint = backend.endpoint().to_string();
        Self {
            controller: TurnController::new(backend, options),
            status_message: String::from("Ready"),
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            endpoint,
            formatter: Formatter::default(),
            copy_feedback: None,
            clipboard,
        }
    }

    pub fn from_config(
        backend: Arc<dyn ChatBackend>,
        clipboard: Box<dyn ClipboardSink>,
        config: &ResolvedConfig,
    ) -> Self {
        let mut app = Self::new(backend, clipboard, config.turn_options());
        app.assistant_name = config.assistant_name.clone();
        app.formatter = Formatter::new(config.code_language.clone());
        app
    }

    pub fn conversation(&self) -> &ConversationState {
        self.controller.state()
    }

    pub fn is_waiting(&self) -> bool {
        self.conversation().is_pending()
    }

    pub fn sender_label(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => USER_LABEL,
            Sender::Bot => &self.assistant_name,
        }
    }

    /// Code of the referenced block, if the message and block still exist.
    pub fn code_block(&self, target: CodeBlockRef) -> Option<String> {
        let message = self.conversation().find(target.message_id)?;
        let segments = self.formatter.format(&message.text);
        code_blocks(&segments)
            .nth(target.block)
            .map(|(_, code)| code.to_string())
    }

    /// Last code block of the newest bot message that has one.
    pub fn latest_code_block(&self) -> Option<CodeBlockRef> {
        self.conversation()
            .messages()
            .iter()
            .rev()
            .filter(|m| m.sender == Sender::Bot)
            .find_map(|m| {
                let segments = self.formatter.format(&m.text);
                let count = code_blocks(&segments).count();
                (count > 0).then(|| CodeBlockRef {
                    message_id: m.id,
                    block: count - 1,
                })
            })
    }
}
