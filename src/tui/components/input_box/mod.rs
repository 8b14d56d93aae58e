//! # InputBox Component
//!
//! Multi-line message editor at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input (typing, paste, Ctrl+J for newlines)
//! - Handle editing (backspace, delete, cursor movement)
//! - Handle submission (Enter), refusing it while a reply is pending
//!
//! ## State Management
//!
//! The buffer and cursor are internal state (see `Editor`). `waiting` and
//! `dimmed` are props set by the parent each frame.

mod editor;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use editor::{
    CONTENT_OFFSET_X, CONTENT_OFFSET_Y, Editor, MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width,
};

const DEFAULT_WIDTH: u16 = 80;
const IDLE_TITLE: &str = " Message (Enter to send, Ctrl+J for newline) ";
const WAITING_TITLE: &str = " Waiting for reply... ";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Text or cursor changed
    ContentChanged,
}

/// Text input component.
///
/// # Props
///
/// - `waiting`: a reply is pending; Enter keeps the text instead of sending
/// - `dimmed`: focus is on the message list (Cursor mode)
pub struct InputBox {
    editor: Editor,
    pub waiting: bool,
    pub dimmed: bool,
    /// Content width from last render (used for vertical cursor movement)
    last_area_width: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            editor: Editor::default(),
            waiting: false,
            dimmed: false,
            last_area_width: DEFAULT_WIDTH,
        }
    }

    pub fn text(&self) -> &str {
        self.editor.text()
    }

    /// Calculate required height for current buffer content, clamped to viewport limits.
    /// Returns value in range [1 + VERTICAL_OVERHEAD, MAX_VISIBLE_LINES + VERTICAL_OVERHEAD].
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let rows = self.editor.row_count(inner_width(area_width));
        rows.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Render scrollbar when content exceeds visible area
    fn render_scrollbar(&self, frame: &mut Frame, area: Rect) {
        let total_lines = self.editor.row_count(inner_width(area.width));
        if total_lines <= MAX_VISIBLE_LINES {
            return;
        }

        // ScrollbarState content_length is max scrollable position, not total items
        let max_scroll = total_lines.saturating_sub(MAX_VISIBLE_LINES);
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(usize::from(max_scroll))
            .position(usize::from(self.editor.scroll_offset()));

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_area_width = area.width;
        let width = inner_width(area.width);
        self.editor.update_scroll_offset(width);

        let (title, border_color) = if self.waiting {
            (WAITING_TITLE, Color::DarkGray)
        } else {
            (IDLE_TITLE, Color::Green)
        };
        let mut style = Style::default().fg(Color::Green);
        let mut border_style = Style::default().fg(border_color);
        if self.dimmed {
            style = style.add_modifier(Modifier::DIM);
            border_style = border_style.add_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title)
            .padding(Padding::horizontal(1));

        let lines: Vec<Line<'_>> = self
            .editor
            .visible_rows(width)
            .into_iter()
            .map(Line::raw)
            .collect();

        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(block).style(style),
            area,
        );
        self.render_scrollbar(frame, area);

        if !self.dimmed && width > 0 {
            let (row, col) = self.editor.cursor_row_col(width);
            let row = u16::try_from(row)
                .unwrap_or(u16::MAX)
                .saturating_sub(self.editor.scroll_offset());
            let col = u16::try_from(col).unwrap_or(u16::MAX).min(width);
            frame.set_cursor_position((
                area.x + CONTENT_OFFSET_X + col,
                area.y + CONTENT_OFFSET_Y + row,
            ));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let width = inner_width(self.last_area_width);
        let changed = match event {
            TuiEvent::InputChar(c) => {
                self.editor.insert_char(*c);
                true
            }
            TuiEvent::Paste(text) => {
                self.editor.insert_str(text);
                true
            }
            TuiEvent::Backspace => self.editor.backspace(),
            TuiEvent::Delete => self.editor.delete(),
            TuiEvent::CursorLeft => self.editor.move_left(),
            TuiEvent::CursorRight => self.editor.move_right(),
            TuiEvent::CursorHome => self.editor.move_home(),
            TuiEvent::CursorEnd => self.editor.move_end(),
            TuiEvent::CursorUp => self.editor.move_vertically(-1, width),
            TuiEvent::CursorDown => self.editor.move_vertically(1, width),
            TuiEvent::Submit => {
                if self.waiting || self.editor.text().trim().is_empty() {
                    return None;
                }
                return Some(InputEvent::Submit(self.editor.take()));
            }
            _ => false,
        };
        changed.then_some(InputEvent::ContentChanged)
    }
}
