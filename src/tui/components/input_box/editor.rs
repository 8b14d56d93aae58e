//! Text buffer, cursor and wrapped layout for the InputBox.
//!
//! Layout comes from `textwrap`, one logical line at a time, so a trailing
//! newline still gets its own empty row. Each wrapped row is mapped back to
//! a byte range of the buffer; the whitespace textwrap trims at a soft break
//! stays with the row it ends, so the cursor can sit on it.

use std::ops::Range;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub(super) const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from area edge to content (border + padding)
pub(super) const CONTENT_OFFSET_X: u16 = 2;
pub(super) const CONTENT_OFFSET_Y: u16 = 1;

const TAB: &str = "    ";

/// Build textwrap options configured for the input box inner width.
pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(usize::from(inner_width.max(1)))
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Calculate the inner content width after subtracting border/padding overhead.
pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// One visual row. `text` is what gets drawn; `span` runs on to where the
/// next row starts. `soft` rows end because the width ran out, the others
/// at a newline or the end of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Row {
    pub text: Range<usize>,
    pub span: Range<usize>,
    pub soft: bool,
}

/// Split `text` into visual rows at most `width` columns wide.
pub(super) fn wrap_rows(text: &str, width: u16) -> Vec<Row> {
    let options = wrap_options(width);
    let mut rows = Vec::new();
    let mut line_start = 0;

    for line in text.split('\n') {
        let mut drawn_rows: Vec<Range<usize>> = Vec::new();
        let mut pos = 0;
        for wrapped in textwrap::wrap(line, &options) {
            // Rows are in order and only trimmed whitespace sits between them
            let drawn = match line[pos..].find(&*wrapped) {
                Some(i) => pos + i..pos + i + wrapped.len(),
                None => pos..pos,
            };
            pos = drawn.end;
            drawn_rows.push(drawn);
        }
        if drawn_rows.is_empty() {
            drawn_rows.push(0..0);
        }

        let count = drawn_rows.len();
        for (idx, drawn) in drawn_rows.iter().enumerate() {
            let span_end = drawn_rows.get(idx + 1).map_or(line.len(), |next| next.start);
            let span_start = if idx == 0 { 0 } else { drawn.start };
            rows.push(Row {
                text: line_start + drawn.start..line_start + drawn.end,
                span: line_start + span_start..line_start + span_end,
                soft: idx + 1 < count,
            });
        }
        line_start += line.len() + 1;
    }
    rows
}

/// Find the byte offset of the previous character boundary before `pos` in `text`.
fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Find the byte offset of the next character boundary after `pos` in `text`.
fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

/// Editable text with a byte-offset cursor and a vertical scroll offset.
#[derive(Debug, Default)]
pub(super) struct Editor {
    buffer: String,
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    cursor: usize,
    /// First visible row (0 when content fits in the viewport)
    scroll_offset: u16,
}

impl Editor {
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    /// Empty the buffer and hand back what it held.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.scroll_offset = 0;
        std::mem::take(&mut self.buffer)
    }

    pub fn insert_char(&mut self, c: char) {
        match c {
            '\t' => self.insert_str(TAB),
            '\r' => {}
            _ => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
        }
    }

    /// Insert pasted text; CRLF becomes LF and tabs become spaces.
    pub fn insert_str(&mut self, text: &str) {
        let clean = text.replace("\r\n", "\n").replace('\r', "\n").replace('\t', TAB);
        self.buffer.insert_str(self.cursor, &clean);
        self.cursor += clean.len();
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_char_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_char_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_char_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_char_boundary(&self.buffer, self.cursor);
        true
    }

    /// Move to the start of the current logical line.
    pub fn move_home(&mut self) -> bool {
        let line_start = self.buffer[..self.cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let moved = self.cursor != line_start;
        self.cursor = line_start;
        moved
    }

    /// Move to the end of the current logical line.
    pub fn move_end(&mut self) -> bool {
        let line_end = self.buffer[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.buffer.len());
        let moved = self.cursor != line_end;
        self.cursor = line_end;
        moved
    }

    /// Visual row and display column of the cursor.
    pub fn cursor_row_col(&self, width: u16) -> (usize, usize) {
        let rows = wrap_rows(&self.buffer, width);
        for (idx, row) in rows.iter().enumerate() {
            let on_row = self.cursor >= row.span.start
                && (self.cursor < row.span.end || (self.cursor == row.span.end && !row.soft));
            if on_row {
                let col = self.buffer[row.span.start..self.cursor].width();
                return (idx, col);
            }
        }
        // Unreachable for a consistent buffer; park at the end
        let last = rows.len() - 1;
        (last, self.buffer[rows[last].span.clone()].width())
    }

    /// Move one visual row up (`-1`) or down (`1`), keeping the column.
    ///
    /// Returns `false` if already on the first/last row.
    pub fn move_vertically(&mut self, direction: i8, width: u16) -> bool {
        let rows = wrap_rows(&self.buffer, width);
        let (row, col) = self.cursor_row_col(width);
        let target = match direction {
            d if d < 0 && row > 0 => row - 1,
            d if d > 0 && row + 1 < rows.len() => row + 1,
            _ => return false,
        };

        let target_row = &rows[target];
        let mut pos = target_row.span.start;
        let mut used = 0;
        for (i, c) in self.buffer[target_row.span.clone()].char_indices() {
            let w = c.width().unwrap_or(0);
            if used + w > col {
                break;
            }
            used += w;
            pos = target_row.span.start + i + c.len_utf8();
        }
        // The end of a soft row is drawn at the start of the next one
        if target_row.soft && pos == target_row.span.end {
            pos = prev_char_boundary(&self.buffer, pos);
        }
        self.cursor = pos;
        true
    }

    /// Number of visual rows the buffer needs.
    pub fn row_count(&self, width: u16) -> u16 {
        u16::try_from(wrap_rows(&self.buffer, width).len()).unwrap_or(u16::MAX)
    }

    /// Update scroll offset to keep the cursor visible within the viewport.
    pub fn update_scroll_offset(&mut self, width: u16) {
        if self.row_count(width) <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }
        let (row, _) = self.cursor_row_col(width);
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    /// The rows currently in view, as text.
    pub fn visible_rows(&self, width: u16) -> Vec<&str> {
        wrap_rows(&self.buffer, width)
            .into_iter()
            .skip(usize::from(self.scroll_offset))
            .take(usize::from(MAX_VISIBLE_LINES))
            .map(|row| &self.buffer[row.text])
            .collect()
    }
}
