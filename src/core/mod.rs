//! # Core Application Logic
//!
//! This module contains Leetbot's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Conversation (log)   │
//!                    │  • TurnController       │
//!                    │  • format() (renderer)  │
//!                    │  • Action / update()    │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │    API     │
//!     │  Adapter   │                          │  (reqwest) │
//!     │ (ratatui)  │                          │            │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`conversation`]: ordered message log, pending flag, session token
//! - [`controller`]: one request/response cycle per submission, reset
//! - [`format`]: raw text → `FormattedSegment`s
//! - [`clipboard`]: copying code blocks, with transient feedback
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and `update()` reducer
//! - [`config`]: layered settings

pub mod action;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod format;
pub mod state;
