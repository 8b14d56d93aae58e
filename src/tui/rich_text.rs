//! `FormattedSegment` → ratatui `Text` renderer.
//!
//! Bold and inline code become styled spans on the current line. Code blocks
//! are boxed with a numbered header carrying the copy label, and highlighted
//! with syntect when the language is known.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

use crate::core::format::FormattedSegment;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";
const TAB: &str = "    ";

/// Render one message's segments.
///
/// `copy_label(i)` gives the header label for the `i`-th code block (0-based);
/// headers show the block as `[i + 1]`, matching the copy keys.
pub fn render(
    segments: &[FormattedSegment],
    base_fg: Color,
    copy_label: impl Fn(usize) -> &'static str,
) -> Text<'static> {
    let mut w = Writer::new(base_fg);
    let mut block = 0;
    for segment in segments {
        match segment {
            FormattedSegment::PlainText(t) => w.inline(t, Style::default().fg(base_fg)),
            FormattedSegment::BoldText(t) => w.inline(
                t,
                Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
            ),
            FormattedSegment::InlineCode(t) => {
                w.inline(t, Style::default().fg(Color::White).bg(Color::DarkGray))
            }
            FormattedSegment::CodeBlock { language, code } => {
                w.code_block(block, language, code, copy_label(block));
                block += 1;
            }
        }
    }
    w.text
}

/// Header line of a code block: `╭── [n] lang ── label`.
pub fn code_block_header(index: usize, language: &str, label: &str) -> Line<'static> {
    let bs = Style::default().fg(Color::DarkGray);
    let label_style = match label {
        "Copied!" => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        "Error" => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Cyan),
    };
    Line::from(vec![
        Span::styled(format!("╭── [{}] ", index + 1), bs),
        Span::styled(language.to_owned(), bs.add_modifier(Modifier::BOLD)),
        Span::styled(" ── ", bs),
        Span::styled(label.to_owned(), label_style),
    ])
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// The last thing written was a code block; the next inline run starts a
    /// fresh line and drops the newline that followed the closing fence.
    after_block: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            after_block: false,
        }
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.text.lines.push(Line::from(vec![span]));
        }
    }

    fn inline(&mut self, content: &str, style: Style) {
        let mut content = content;
        if self.after_block {
            content = content.strip_prefix('\n').unwrap_or(content);
            self.text.lines.push(Line::default());
            self.after_block = false;
        }

        for (i, piece) in content.split('\n').enumerate() {
            if i > 0 {
                self.text.lines.push(Line::default());
            }
            if !piece.is_empty() {
                self.push_span(Span::styled(piece.replace('\t', TAB), style));
            }
        }
    }

    fn code_block(&mut self, index: usize, language: &str, code: &str, label: &str) {
        let bs = Style::default().fg(Color::DarkGray);
        let current_is_empty = self
            .text
            .lines
            .last()
            .is_none_or(|l| l.spans.iter().all(|s| s.content.is_empty()));
        if current_is_empty {
            self.text.lines.pop();
        }

        self.text
            .lines
            .push(code_block_header(index, language, label));

        let highlighter = SYNTAX_SET
            .find_syntax_by_token(language)
            .zip(THEME_SET.themes.get(THEME))
            .map(|(syntax, theme)| HighlightLines::new(syntax, theme));

        match highlighter {
            Some(mut hl) => {
                for line in code.split('\n') {
                    let with_newline = format!("{line}\n");
                    let spans = match hl.highlight_line(&with_newline, &SYNTAX_SET) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .filter_map(|(hl_style, frag)| {
                                let content = frag.trim_end_matches('\n').replace('\t', TAB);
                                if content.is_empty() {
                                    return None;
                                }
                                let fg = Color::Rgb(
                                    hl_style.foreground.r,
                                    hl_style.foreground.g,
                                    hl_style.foreground.b,
                                );
                                Some(Span::styled(content, Style::default().fg(fg)))
                            })
                            .collect(),
                        Err(_) => vec![Span::styled(
                            line.replace('\t', TAB),
                            Style::default().fg(Color::White),
                        )],
                    };
                    self.code_line(spans);
                }
            }
            None => {
                let code_style = Style::default().fg(Color::White);
                for line in code.split('\n') {
                    self.code_line(vec![Span::styled(line.replace('\t', TAB), code_style)]);
                }
            }
        }

        self.text.lines.push(Line::from(Span::styled("╰──", bs)));
        self.after_block = true;
    }

    fn code_line(&mut self, spans: Vec<Span<'static>>) {
        let mut line = Line::from(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
        for span in spans {
            line.push_span(span);
        }
        self.text.lines.push(line);
    }
}
