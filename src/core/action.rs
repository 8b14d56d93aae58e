//! # Actions
//!
//! Everything that can happen in Leetbot becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ReplyReady(turn, result)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state and returns an `Effect` describing the I/O the adapter should
//! perform. No network calls happen here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info};

use crate::api::{ApiError, ChatReply, ChatRequest};
use crate::core::clipboard::{CodeBlockRef, CopyStatus, copy_code};
use crate::core::controller::TurnId;
use crate::core::state::App;

#[derive(Debug)]
pub enum Action {
    Submit(String),
    /// The backend's outcome for the turn `begin_turn` handed out.
    ReplyReady(TurnId, Result<ChatReply, ApiError>),
    NewChat,
    CopyCode(CodeBlockRef),
    Quit,
}

/// Side effects for the adapter to run after `update`.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Send the request; its result comes back as `ReplyReady` with the same id.
    SpawnRequest(TurnId, ChatRequest),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => match app.controller.begin_turn(&text) {
            Some((turn, request)) => {
                app.status_message = format!("Waiting for {}...", app.assistant_name);
                Effect::SpawnRequest(turn, request)
            }
            None => Effect::None,
        },
        Action::ReplyReady(turn, result) => {
            let failed = result.is_err();
            if app.controller.complete_turn(turn, result) {
                app.status_message = if failed { "Reply failed" } else { "Ready" }.to_string();
            }
            Effect::None
        }
        Action::NewChat => {
            app.controller.reset();
            app.copy_feedback = None;
            app.status_message = "New chat".to_string();
            Effect::None
        }
        Action::CopyCode(target) => {
            let Some(code) = app.code_block(target) else {
                debug!("No code block at {:?}", target);
                return Effect::None;
            };
            let feedback = copy_code(app.clipboard.as_mut(), target, &code);
            app.status_message = match feedback.status {
                CopyStatus::Copied => "Copied code block".to_string(),
                CopyStatus::Failed => "Copy failed".to_string(),
            };
            app.copy_feedback = Some(feedback);
            Effect::None
        }
        Action::Quit => {
            info!("Quit requested");
            Effect::Quit
        }
    }
}
