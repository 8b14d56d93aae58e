use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar};

/// Split the screen into title bar, message list and input box.
fn screen_areas(frame_area: Rect, input_height: u16) -> [Rect; 3] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame_area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let [title_area, main_area, input_area] = screen_areas(frame.area(), input_height);

    MessageList {
        state: &mut tui.message_list,
        conversation: app.conversation(),
        assistant_name: &app.assistant_name,
        formatter: &app.formatter,
        copy_feedback: app.copy_feedback.as_ref(),
        spinner_frame,
        now: Instant::now(),
    }
    .render(frame, main_area);

    // Title bar after the list so the "↓ New" hint sees this frame's scroll
    TitleBar::new(
        app.endpoint.clone(),
        app.status_message.clone(),
        tui.message_list.has_content_below(),
    )
    .render(frame, title_area);

    tui.input_box.render(frame, input_area);
}

/// Hit test: given a screen Y coordinate, find which message index (if any) is at that position
pub fn hit_test_message(
    screen_y: u16,
    frame_area: Rect,
    scroll_offset_y: u16,
    prefix_heights: &[u16],
    input_height: u16,
) -> Option<usize> {
    let [_title_area, main_area, _input_area] = screen_areas(frame_area, input_height);

    // Check if mouse is within the main content area
    if screen_y < main_area.y || screen_y >= main_area.y + main_area.height {
        return None;
    }

    // Convert screen Y to content Y (accounting for scroll)
    let content_y = (screen_y - main_area.y).saturating_add(scroll_offset_y);

    // prefix_heights[i] is the bottom edge of message i
    let index = prefix_heights.partition_point(|&bottom| bottom <= content_y);
    (index < prefix_heights.len()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::test_support::{deliver_reply, reply, test_app};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(app: &App, tui: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_draw_ui_shows_greeting_title_and_input() {
        let app = test_app();
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui);

        assert!(text.contains("LEETBOT (endpoint: scripted)"));
        assert!(text.contains("Share a LeetCode link"));
        assert!(text.contains("Enter to send"));
    }

    #[test]
    fn test_draw_ui_shows_code_block_header() {
        let mut app = test_app();
        update(&mut app, Action::Submit("sort it".to_string()));
        deliver_reply(&mut app, reply("Use:\n```python\nnums.sort()\n```", None));
        let mut tui = TuiState::new();
        let text = screen(&app, &mut tui);

        assert!(text.contains("[1] python ── Copy"));
        assert!(text.contains("nums.sort()"));
    }

    #[test]
    fn test_hit_test_message() {
        let area = Rect::new(0, 0, 80, 24);
        // Title takes row 0; messages of height 3 and 4 start at row 1
        let prefix = [3, 7];
        assert_eq!(hit_test_message(0, area, 0, &prefix, 3), None);
        assert_eq!(hit_test_message(1, area, 0, &prefix, 3), Some(0));
        assert_eq!(hit_test_message(3, area, 0, &prefix, 3), Some(0));
        assert_eq!(hit_test_message(4, area, 0, &prefix, 3), Some(1));
        assert_eq!(hit_test_message(8, area, 0, &prefix, 3), None);
        // Scrolled down by 3 rows: the first visible row is message 1
        assert_eq!(hit_test_message(1, area, 3, &prefix, 3), Some(1));
        // Input box rows are never messages
        assert_eq!(hit_test_message(22, area, 0, &prefix, 3), None);
    }
}
