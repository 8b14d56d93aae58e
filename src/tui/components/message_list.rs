//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Display the message log as bubbles, plus the typing indicator
//! - Manage scrolling (stick-to-bottom, page up/down, clamping)
//! - Cache message heights so long conversations stay cheap to lay out
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the conversation (props).
//! Messages never change once appended, so a cached height stays valid until
//! the width changes, the log is reset, or a copy label on that message flips.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::text::Text;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::clipboard::CopyFeedback;
use crate::core::conversation::{ConversationState, Message, Sender};
use crate::core::format::Formatter;
use crate::core::state::USER_LABEL;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{MessageBubble, message_body};
use crate::tui::components::typing_indicator::{TYPING_INDICATOR_HEIGHT, TypingIndicator};
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Currently selected message index (hover or keyboard navigation)
    pub selected_index: Option<usize>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true, // Start attached to bottom
            selected_index: None,
            viewport_height: 0,
        }
    }

    fn total_height(&self) -> u16 {
        self.layout.heights.iter().sum()
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// True when content exists below the viewport (drives the "↓ New" hint).
    pub fn has_content_below(&self) -> bool {
        if self.stick_to_bottom {
            return false;
        }
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        self.scroll_state.offset().y < max_y
    }

    /// Scroll the viewport so the selected message is fully visible.
    /// If the message is taller than the viewport, align its top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected_index else {
            return;
        };
        if idx >= self.layout.prefix_heights.len() {
            return;
        }

        let item_top = if idx == 0 {
            0
        } else {
            self.layout.prefix_heights[idx - 1]
        };
        let item_bottom = self.layout.prefix_heights[idx];
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y || item_bottom - item_top > self.viewport_height {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            let max_y = self.total_height().saturating_sub(self.viewport_height);
            self.stick_to_bottom = new_y >= max_y;
        }
    }

    /// Jump to the newest content and follow it again.
    pub fn scroll_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.scroll_state.scroll_to_bottom();
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Forget layout and selection (after "New Chat").
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub conversation: &'a ConversationState,
    pub assistant_name: &'a str,
    pub formatter: &'a Formatter,
    pub copy_feedback: Option<&'a CopyFeedback>,
    pub spinner_frame: usize,
    pub now: Instant,
}

impl<'a> MessageList<'a> {
    fn label(&self, message: &Message) -> &'a str {
        match message.sender {
            Sender::User => USER_LABEL,
            Sender::Bot => self.assistant_name,
        }
    }

    fn body(&self, message: &Message) -> Text<'static> {
        message_body(message, self.formatter, self.copy_feedback, self.now)
    }

    /// Id of the message currently showing a non-default copy label.
    fn labelled_message(&self) -> Option<u64> {
        self.copy_feedback
            .filter(|f| f.is_live(self.now))
            .map(|f| f.target.message_id)
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let messages = self.conversation.messages();
        let labelled = self.labelled_message();

        // 1. Update Layout Cache
        let reusable = self
            .state
            .layout
            .reusable_count(messages, content_width, labelled);
        self.state.layout.heights.truncate(reusable);
        for message in messages.iter().skip(reusable) {
            let height = MessageBubble::calculate_height(&self.body(message), content_width);
            self.state.layout.heights.push(height);
        }
        self.state.layout.rebuild_prefix_heights();
        self.state
            .layout
            .update_metadata(messages, content_width, labelled);

        let total_height = self.state.total_height();
        let pending = self.conversation.is_pending();
        let indicator_height = if pending { TYPING_INDICATOR_HEIGHT } else { 0 };
        let canvas_height = total_height.saturating_add(indicator_height);

        // 2. Clamp scroll offset to prevent overscrolling past content.
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible messages into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let message = &messages[i];
            let height = self.state.layout.heights[i];
            let body = self.body(message);
            let bubble = MessageBubble::new(
                message,
                self.label(message),
                &body,
                self.state.selected_index == Some(i),
            );
            scroll_view.render_widget(bubble, Rect::new(0, y_offset, content_width, height));
            y_offset = y_offset.saturating_add(height);
        }

        if pending {
            scroll_view.render_widget(
                TypingIndicator::new(self.assistant_name, self.spinner_frame),
                Rect::new(0, total_height, content_width, indicator_height),
            );
        }

        // Auto-scroll logic
        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler is implemented on `MessageListState` rather than `MessageList`
/// because scrolling needs state that outlives the per-frame component.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => self.scroll_to_bottom(),
            _ => {}
        }
        None
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_ids: Vec<u64>,
    content_width: u16,
    /// Message whose copy label was showing when heights were measured.
    labelled_message: Option<u64>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_ids: Vec::new(),
            content_width: 0,
            labelled_message: None,
        }
    }

    /// How many leading cached heights are still valid for `messages`.
    pub fn reusable_count(
        &self,
        messages: &[Message],
        content_width: u16,
        labelled_message: Option<u64>,
    ) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }

        // Ids are never reused, so a reset log shares no prefix with the cache
        let mut reusable = self
            .message_ids
            .iter()
            .zip(messages)
            .take_while(|(id, m)| **id == m.id)
            .count()
            .min(self.heights.len());

        // A copy label changed length: re-measure from the affected message
        if labelled_message != self.labelled_message {
            for id in [labelled_message, self.labelled_message].into_iter().flatten() {
                if let Some(pos) = messages.iter().position(|m| m.id == id) {
                    reusable = reusable.min(pos);
                }
            }
        }

        reusable
    }

    pub fn update_metadata(
        &mut self,
        messages: &[Message],
        content_width: u16,
        labelled_message: Option<u64>,
    ) {
        self.message_ids = messages.iter().map(|m| m.id).collect();
        self.content_width = content_width;
        self.labelled_message = labelled_message;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::controller::DEFAULT_GREETING;
    use chrono::Local;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn messages(ids: &[u64]) -> Vec<Message> {
        ids.iter()
            .map(|&id| Message {
                id,
                text: format!("message {id}"),
                sender: if id % 2 == 0 { Sender::Bot } else { Sender::User },
                sent_at: Local::now(),
            })
            .collect()
    }

    fn cache_for(msgs: &[Message], width: u16, labelled: Option<u64>) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3; msgs.len()];
        cache.rebuild_prefix_heights();
        cache.update_metadata(msgs, width, labelled);
        cache
    }

    #[test]
    fn test_layout_cache_reusable() {
        let msgs = messages(&[0, 1, 2]);
        let cache = cache_for(&msgs, 80, None);

        // Same everything -> all reusable
        assert_eq!(cache.reusable_count(&msgs, 80, None), 3);

        // New message appended -> the cached three stay valid
        let grown = messages(&[0, 1, 2, 3]);
        assert_eq!(cache.reusable_count(&grown, 80, None), 3);

        // Width changed -> nothing reusable
        assert_eq!(cache.reusable_count(&msgs, 40, None), 0);
    }

    #[test]
    fn test_reset_log_invalidates_cache() {
        let msgs = messages(&[0, 1, 2]);
        let cache = cache_for(&msgs, 80, None);

        // After a reset the log restarts with a fresh id
        let after_reset = messages(&[3]);
        assert_eq!(cache.reusable_count(&after_reset, 80, None), 0);
    }

    #[test]
    fn test_copy_label_change_invalidates_from_message() {
        let msgs = messages(&[0, 1, 2, 3]);
        let cache = cache_for(&msgs, 80, None);
        assert_eq!(cache.reusable_count(&msgs, 80, Some(2)), 2);

        // Label expiring re-measures the message it was on
        let cache = cache_for(&msgs, 80, Some(2));
        assert_eq!(cache.reusable_count(&msgs, 80, None), 2);
    }

    #[test]
    fn test_visible_range() {
        let msgs = messages(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let cache = cache_for(&msgs, 80, None);
        // 10 messages x 3 rows; viewport 6 rows at offset 15 plus 3 rows buffer each side
        let range = cache.visible_range(15, 6);
        assert_eq!(range, 4..8);
        assert_eq!(cache.visible_range(0, 6), 0..3);
    }

    #[test]
    fn test_render_shows_messages_and_typing_indicator() {
        let mut conversation = ConversationState::with_greeting(DEFAULT_GREETING);
        conversation.push_user("hi".to_string());
        conversation.set_pending(true);

        let mut state = MessageListState::new();
        let formatter = Formatter::default();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|f| {
                let mut list = MessageList {
                    state: &mut state,
                    conversation: &conversation,
                    assistant_name: "Leet",
                    formatter: &formatter,
                    copy_feedback: None,
                    spinner_frame: 0,
                    now: Instant::now(),
                };
                list.render(f, f.area());
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Leet ·"));
        assert!(text.contains("You ·"));
        assert!(text.contains('●'));
        assert_eq!(state.layout.heights.len(), 2);
    }

    #[test]
    fn test_scroll_up_unpins_and_bottom_repins() {
        let mut state = MessageListState::new();
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        state.handle_event(&TuiEvent::ScrollToBottom);
        assert!(state.stick_to_bottom);
        assert!(!state.has_content_below());
    }
}
