use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::clipboard::{COPY_LABEL, CodeBlockRef, CopyFeedback};
use crate::core::conversation::{Message, Sender};
use crate::core::format::Formatter;
use crate::tui::component::Component;
use crate::tui::rich_text;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
pub(crate) const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
pub(crate) const VERTICAL_OVERHEAD: u16 = 2;

/// Foreground colour for a sender's text and border.
pub fn sender_color(sender: Sender) -> Color {
    match sender {
        Sender::User => Color::Green,
        Sender::Bot => Color::Blue,
    }
}

/// Styled body of a message, with copy labels resolved against `feedback`.
pub fn message_body(
    message: &Message,
    formatter: &Formatter,
    feedback: Option<&CopyFeedback>,
    now: Instant,
) -> Text<'static> {
    let segments = formatter.format(&message.text);
    rich_text::render(&segments, sender_color(message.sender), |block| {
        let target = CodeBlockRef {
            message_id: message.id,
            block,
        };
        feedback.map_or(COPY_LABEL, |f| f.label_for(target, now))
    })
}

/// A stateless component that renders one chat message as a rounded bubble
/// titled with the sender and time.
///
/// `MessageBubble` is created fresh each frame; the parent `MessageList`
/// renders the body once and passes it in so height and drawing agree.
#[derive(Clone, Copy)]
pub struct MessageBubble<'a> {
    pub message: &'a Message,
    /// "You" or the assistant's name
    pub label: &'a str,
    pub body: &'a Text<'static>,
    /// Whether this message is selected in Cursor mode
    pub is_selected: bool,
}

impl<'a> MessageBubble<'a> {
    pub fn new(message: &'a Message, label: &'a str, body: &'a Text<'static>, is_selected: bool) -> Self {
        Self {
            message,
            label,
            body,
            is_selected,
        }
    }

    /// Rows this message occupies at `width`, borders included.
    ///
    /// Uses the same `Paragraph` wrapping as `render`, so the prediction is
    /// exact rather than an estimate.
    pub fn calculate_height(body: &Text<'_>, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Degenerate case: terminal too narrow for borders + padding.
            return 1;
        }
        if body.lines.is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let lines = Paragraph::new(body.clone())
            .wrap(Wrap { trim: false })
            .line_count(content_width);
        let lines = u16::try_from(lines).unwrap_or(u16::MAX - VERTICAL_OVERHEAD);
        lines.max(1) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> String {
        format!(" {} · {} ", self.label, self.message.sent_at.format("%H:%M"))
    }
}

impl<'a> Widget for MessageBubble<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = Style::default().fg(sender_color(self.message.sender));

        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(self.title())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.body.clone())
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl<'a> Component for MessageBubble<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::CopyStatus;
    use chrono::Local;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn make_message(sender: Sender, text: &str) -> Message {
        Message {
            id: 7,
            text: text.to_string(),
            sender,
            sent_at: Local::now(),
        }
    }

    fn body(message: &Message) -> Text<'static> {
        message_body(message, &Formatter::default(), None, Instant::now())
    }

    fn rendered(message: &Message, width: u16) -> String {
        let text = body(message);
        let height = MessageBubble::calculate_height(&text, width);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                let mut bubble = MessageBubble::new(message, "You", &text, false);
                // Widget::render takes self by value; go through Component
                Component::render(&mut bubble, f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn calculate_height_empty_content_returns_border_height() {
        let message = make_message(Sender::User, "");
        assert_eq!(MessageBubble::calculate_height(&body(&message), 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        let message = make_message(Sender::User, "Hello world");
        assert_eq!(MessageBubble::calculate_height(&body(&message), 0), 1);
        assert_eq!(
            MessageBubble::calculate_height(&body(&message), HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn calculate_height_single_line_fits() {
        let message = make_message(Sender::User, "Hello");
        assert_eq!(
            MessageBubble::calculate_height(&body(&message), 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_breaks_long_words() {
        let message = make_message(Sender::User, "abcdefghij");
        // content width 4: "abcd" | "efgh" | "ij"
        assert_eq!(
            MessageBubble::calculate_height(&body(&message), 8),
            3 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_counts_code_block_frame() {
        let message = make_message(Sender::Bot, "Try:\n```\nx = 1\n```");
        // "Try:", header, one code line, footer
        assert_eq!(
            MessageBubble::calculate_height(&body(&message), 80),
            4 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn render_shows_label_and_text() {
        let message = make_message(Sender::User, "How do I reverse a list?");
        let screen = rendered(&message, 40);
        assert!(screen.contains("You ·"));
        assert!(screen.contains("reverse a list?"));
    }

    #[test]
    fn body_uses_copy_feedback_for_matching_block() {
        let message = make_message(Sender::Bot, "```\na\n```\n```\nb\n```");
        let now = Instant::now();
        let feedback = CopyFeedback {
            target: CodeBlockRef {
                message_id: 7,
                block: 1,
            },
            status: CopyStatus::Copied,
            at: now,
        };
        let text = message_body(&message, &Formatter::default(), Some(&feedback), now);
        let headers: Vec<String> = text
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .filter(|l| l.starts_with('╭'))
            .collect();
        assert!(headers[0].ends_with("Copy"));
        assert!(headers[1].ends_with("Copied!"));
    }

    #[test]
    fn sender_colors_differ() {
        assert_eq!(sender_color(Sender::User), Color::Green);
        assert_eq!(sender_color(Sender::Bot), Color::Blue);
    }
}
