//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (reply pending, or a "Copied!" label on screen): draws
//!   every ~80ms so the typing dots move and the label reverts on time.
//! - **Idle**: sleeps up to 500ms, only redraws on events or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod rich_text;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::layout::Rect;

use crate::api::{ChatBackend, ChatRequest, HttpChatBackend, send_with_timeout};
use crate::core::action::{Action, Effect, update};
use crate::core::clipboard::{CodeBlockRef, SystemClipboard};
use crate::core::config::ResolvedConfig;
use crate::core::controller::TurnId;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_TICK: Duration = Duration::from_millis(80);
const IDLE_TICK: Duration = Duration::from_millis(500);

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate messages with arrow keys. Typing auto-switches to Input.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub input_mode: InputMode,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            input_mode: InputMode::Input, // User expects to type immediately
        }
    }

    fn enter_input_mode(&mut self) {
        self.input_mode = InputMode::Input;
        self.message_list.selected_index = None;
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter be told apart from Enter;
        // terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend = HttpChatBackend::new(&config.base_url, config.timeout)
        .map_err(std::io::Error::other)?;
    info!("Chat backend: {}", config.base_url);
    let mut app = App::from_config(
        Arc::new(backend),
        Box::new(SystemClipboard::new()),
        &config,
    );
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let terminal_mode_guard = TerminalModeGuard::new()
        .inspect_err(|e| warn!("Failed to enable terminal modes: {}", e))
        .ok();

    let result = event_loop(&mut terminal, &mut app, &mut tui);

    drop(terminal_mode_guard);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    tui: &mut TuiState,
) -> std::io::Result<()> {
    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame
    let mut was_animating = false;

    loop {
        // Sync InputBox props with App/TUI state
        tui.input_box.waiting = app.is_waiting();
        tui.input_box.dimmed = matches!(tui.input_mode, InputMode::Cursor);

        let feedback_live = app
            .copy_feedback
            .as_ref()
            .is_some_and(|f| f.is_live(Instant::now()));
        let animating = app.is_waiting() || feedback_live;

        // One extra frame after animation stops so "Copied!" reverts
        if animating || was_animating {
            needs_redraw = true;
        }
        was_animating = animating;

        if needs_redraw {
            let spinner_frame =
                (start_time.elapsed().as_millis() / ANIMATION_TICK.as_millis()) as usize;
            terminal.draw(|f| ui::draw_ui(f, app, tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATION_TICK } else { IDLE_TICK };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let frame_area = terminal.get_frame().area();
            let effect = match handle_event(event, frame_area, app, tui) {
                Some(action) => update(app, action),
                None => Effect::None,
            };
            if run_effect(effect, app, &tx) {
                should_quit = true;
            }
        }

        if should_quit {
            break;
        }

        // Replies from background requests
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(app, action);
            if run_effect(effect, app, &tx) {
                should_quit = true;
            }
        }

        if should_quit {
            break;
        }
    }

    info!("Leaving event loop");
    Ok(())
}

/// Route one terminal event. Returns the core action it maps to, if any.
fn handle_event(
    event: TuiEvent,
    frame_area: Rect,
    app: &App,
    tui: &mut TuiState,
) -> Option<Action> {
    match event {
        // Resize just needs a redraw (already flagged by the caller)
        TuiEvent::Resize => return None,
        TuiEvent::ForceQuit => return Some(Action::Quit),
        TuiEvent::NewChat => {
            tui.message_list.reset();
            tui.enter_input_mode();
            return Some(Action::NewChat);
        }
        TuiEvent::CopyLatestCode => {
            let target = app.latest_code_block();
            if target.is_none() {
                debug!("Ctrl+Y: no code block to copy");
            }
            return target.map(Action::CopyCode);
        }
        TuiEvent::MouseMove(_col, row) => {
            tui.message_list.selected_index = message_at_row(row, frame_area, tui);
            return None;
        }
        TuiEvent::MouseClick(_col, row) => {
            if let Some(idx) = message_at_row(row, frame_area, tui) {
                tui.input_mode = InputMode::Cursor;
                tui.message_list.selected_index = Some(idx);
            }
            return None;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            return None;
        }
        _ => {}
    }

    match tui.input_mode {
        InputMode::Input => {
            if matches!(event, TuiEvent::Escape) {
                // Esc selects the newest message
                tui.input_mode = InputMode::Cursor;
                let count = app.conversation().messages().len();
                tui.message_list.selected_index = count.checked_sub(1);
                return None;
            }
            match tui.input_box.handle_event(&event) {
                Some(InputEvent::Submit(text)) => {
                    tui.message_list.scroll_to_bottom();
                    Some(Action::Submit(text))
                }
                Some(InputEvent::ContentChanged) | None => None,
            }
        }
        InputMode::Cursor => handle_cursor_event(event, app, tui),
    }
}

fn handle_cursor_event(event: TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    let messages = app.conversation().messages();
    match event {
        TuiEvent::CursorUp => {
            if !messages.is_empty() {
                let idx = tui
                    .message_list
                    .selected_index
                    .map(|i| i.saturating_sub(1))
                    .unwrap_or(messages.len() - 1);
                tui.message_list.selected_index = Some(idx);
                tui.message_list.scroll_to_selected();
            }
            None
        }
        TuiEvent::CursorDown => {
            if let Some(idx) = tui.message_list.selected_index
                && idx + 1 < messages.len()
            {
                tui.message_list.selected_index = Some(idx + 1);
                tui.message_list.scroll_to_selected();
            }
            None
        }
        // `y` copies the first block, digits pick one by its [n] label
        TuiEvent::InputChar(c @ ('y' | '1'..='9')) => {
            let block = c.to_digit(10).map_or(0, |n| n as usize - 1);
            let message = tui
                .message_list
                .selected_index
                .and_then(|idx| messages.get(idx))?;
            Some(Action::CopyCode(CodeBlockRef {
                message_id: message.id,
                block,
            }))
        }
        TuiEvent::CursorEnd => {
            tui.message_list.scroll_to_bottom();
            None
        }
        TuiEvent::Submit => {
            tui.enter_input_mode();
            None
        }
        // Typing auto-switches to Input mode and forwards the event
        TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
            tui.enter_input_mode();
            tui.input_box.handle_event(&event);
            None
        }
        _ => None,
    }
}

fn message_at_row(row: u16, frame_area: Rect, tui: &TuiState) -> Option<usize> {
    ui::hit_test_message(
        row,
        frame_area,
        tui.message_list.scroll_state.offset().y,
        &tui.message_list.layout.prefix_heights,
        tui.input_box.calculate_height(frame_area.width),
    )
}

/// Carry out an effect. Returns `true` when the app should exit.
fn run_effect(effect: Effect, app: &App, tx: &mpsc::Sender<Action>) -> bool {
    match effect {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SpawnRequest(turn, request) => {
            spawn_request(
                app.controller.backend(),
                turn,
                request,
                app.controller.timeout(),
                tx.clone(),
            );
            false
        }
    }
}

fn spawn_request(
    backend: Arc<dyn ChatBackend>,
    turn: TurnId,
    request: ChatRequest,
    timeout: Duration,
    tx: mpsc::Sender<Action>,
) {
    info!(
        "Spawning chat request to {} ({:?}, session={:?})",
        backend.endpoint(),
        turn,
        request.session_id
    );
    tokio::spawn(async move {
        let result = send_with_timeout(backend.as_ref(), &request, timeout).await;
        if tx.send(Action::ReplyReady(turn, result)).is_err() {
            debug!("Event loop gone; dropping reply");
        }
    });
}
