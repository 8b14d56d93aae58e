//! Three animated dots shown under the last message while a reply is pending.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget};

/// Rows the indicator takes: one line of dots plus borders.
pub const TYPING_INDICATOR_HEIGHT: u16 = 3;
/// Columns the indicator takes, so it stays a small bubble on wide terminals.
const TYPING_INDICATOR_WIDTH: u16 = 16;

#[derive(Clone, Copy)]
pub struct TypingIndicator<'a> {
    /// Name of who is typing
    pub label: &'a str,
    /// Animation frame counter; one dot is lit per frame
    pub frame: usize,
}

impl<'a> TypingIndicator<'a> {
    pub fn new(label: &'a str, frame: usize) -> Self {
        Self { label, frame }
    }

    fn dots(&self) -> Line<'static> {
        let lit = self.frame % 3;
        let spans: Vec<Span<'static>> = (0..3)
            .map(|i| {
                let style = if i == lit {
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Span::styled(if i < 2 { "● " } else { "●" }, style)
            })
            .collect();
        Line::from(spans)
    }
}

impl<'a> Widget for TypingIndicator<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area
            .width
            .min(TYPING_INDICATOR_WIDTH.max(self.label.chars().count() as u16 + 4));
        let area = Rect { width, ..area };
        let block = Block::bordered()
            .title(format!(" {} ", self.label))
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Blue).add_modifier(Modifier::DIM))
            .padding(Padding::horizontal(1));
        Paragraph::new(self.dots()).block(block).render(area, buf);
    }
}
