//! # TitleBar Component
//!
//! Top status bar: which backend we talk to, the current status, and a
//! "↓ New" hint when there is unseen content below the scroll position.
//!
//! TitleBar is purely presentational. It receives all data as props:
//! - `endpoint`: Core App state (configuration)
//! - `status_message`: Core App state (set by `update`)
//! - `has_unseen_content`: TUI state (scroll position indicator)
//!
//! ## Conditional Formatting
//!
//! 1. **Unseen content**: `"LEETBOT (endpoint: …) | Ready | ↓ New"`
//! 2. **Status message**: `"LEETBOT (endpoint: …) | Ready"`
//! 3. **Default**: `"LEETBOT (endpoint: …)"`
//!
//! On narrow terminals the endpoint is shortened first so the status and the
//! hint stay readable.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const APP_NAME: &str = "LEETBOT";
const NEW_HINT: &str = " | ↓ New";
const ELLIPSIS: char = '…';

/// Top status bar component showing endpoint, status, and notifications.
pub struct TitleBar {
    pub endpoint: String,
    pub status_message: String,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(endpoint: String, status_message: String, has_unseen_content: bool) -> Self {
        Self {
            endpoint,
            status_message,
            has_unseen_content,
        }
    }

    /// Build the bar text to fit in `width` columns.
    fn title_text(&self, width: usize) -> String {
        let mut tail = String::new();
        if !self.status_message.is_empty() {
            tail.push_str(" | ");
            tail.push_str(&self.status_message);
        }
        if self.has_unseen_content {
            tail.push_str(NEW_HINT);
        }

        let fixed = format!("{APP_NAME} (endpoint: )").width() + tail.width();
        let endpoint_room = width.saturating_sub(fixed);
        let endpoint = truncate_to_width(&self.endpoint, endpoint_room);
        let full = format!("{APP_NAME} (endpoint: {endpoint}){tail}");
        truncate_to_width(&full, width)
    }
}

/// Cut `text` to at most `max` display columns, ending with "…" when cut.
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let text = self.title_text(area.width as usize);
        let line = match text.split_once(APP_NAME) {
            Some(("", rest)) => Line::from(vec![
                Span::styled(
                    APP_NAME,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(rest.to_string()),
            ]),
            _ => Line::from(text),
        };
        frame.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(title_bar: &mut TitleBar, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_title_bar_with_unseen_content() {
        let mut title_bar = TitleBar::new(
            "http://localhost:8000".to_string(),
            "Waiting for Leet...".to_string(),
            true,
        );
        let text = rendered(&mut title_bar, 80);

        assert!(text.contains("LEETBOT"));
        assert!(text.contains("http://localhost:8000"));
        assert!(text.contains("Waiting for Leet..."));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let mut title_bar = TitleBar::new("http://x".to_string(), "".to_string(), false);
        let text = rendered(&mut title_bar, 80);

        assert!(text.contains("LEETBOT (endpoint: http://x)"));
        assert!(!text.contains('|'));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_narrow_bar_shortens_endpoint_first() {
        let title_bar = TitleBar::new(
            "https://leetbot-b7uw.onrender.com".to_string(),
            "Ready".to_string(),
            true,
        );
        let text = title_bar.title_text(45);

        assert!(text.width() <= 45);
        assert!(text.contains('…'));
        assert!(text.ends_with("| Ready | ↓ New"));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("abcdef", 10), "abcdef");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abcdef", 0), "");
        // Wide characters count as two columns
        assert_eq!(truncate_to_width("日本語です", 5), "日本…");
    }
}
