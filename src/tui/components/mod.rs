//! # TUI Components
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: endpoint, status and the "↓ New" hint
//! - `MessageBubble`: one message with its formatted body
//! - `TypingIndicator`: animated dots while a reply is pending
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: multi-line editor that emits `Submit`
//! - `MessageList`: scrollable conversation view with layout caching
//!
//! Each component file holds its state, events, rendering and tests.
//!
//! ```text
//! components/
//! ├── mod.rs               (this file)
//! ├── title_bar.rs         (Top status bar)
//! ├── message.rs           (Single message bubble)
//! ├── message_list.rs      (Scrollable message container)
//! ├── typing_indicator.rs  (Pending-reply dots)
//! └── input_box/           (Text input and its editor)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod typing_indicator;
