//! # Message Formatting
//!
//! Turns a message's raw text into an ordered list of [`FormattedSegment`]s
//! for display. Three layers, scanned left to right:
//!
//! ```text
//! raw ──► fences (```…```) ──► CodeBlock
//!           │
//!           └─ text ──► inline code (`…`) ──► InlineCode
//!                          │
//!                          └─ text ──► bold (**…**) ──► BoldText
//!                                         │
//!                                         └─ rest ──► PlainText
//! ```
//!
//! Nothing nests: inline code is verbatim, bold never contains bold.
//! A fence with no closing delimiter runs to the end of the message and is
//! still rendered as a code block.

/// Language shown on a code block that doesn't declare one.
pub const DEFAULT_CODE_LANGUAGE: &str = "python";

const FENCE: &str = "```";
const TICK: char = '`';
const BOLD: &str = "**";

/// One displayable piece of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedSegment {
    PlainText(String),
    BoldText(String),
    InlineCode(String),
    CodeBlock { language: String, code: String },
}

impl FormattedSegment {
    /// The visible text of this segment with all markers removed.
    pub fn text(&self) -> &str {
        match self {
            FormattedSegment::PlainText(t)
            | FormattedSegment::BoldText(t)
            | FormattedSegment::InlineCode(t) => t,
            FormattedSegment::CodeBlock { code, .. } => code,
        }
    }
}

/// Formats message text. Holds the fallback language for undeclared fences.
#[derive(Debug, Clone)]
pub struct Formatter {
    fallback_language: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LANGUAGE)
    }
}

impl Formatter {
    pub fn new(fallback_language: impl Into<String>) -> Self {
        Self {
            fallback_language: fallback_language.into(),
        }
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    /// Split `raw` into segments in document order.
    pub fn format(&self, raw: &str) -> Vec<FormattedSegment> {
        let mut out = SegmentBuilder::default();
        let mut rest = raw;

        while let Some(open) = rest.find(FENCE) {
            out.inline(&rest[..open]);
            let body = &rest[open + FENCE.len()..];
            match body.find(FENCE) {
                Some(len) => {
                    out.push(self.code_block(&body[..len]));
                    rest = &body[len + FENCE.len()..];
                }
                None => {
                    // Unterminated: the tail is an open-ended code block
                    out.push(self.code_block(body));
                    rest = "";
                }
            }
        }
        out.inline(rest);

        out.finish()
    }

    /// The first line of a fence body names the language; the rest is code.
    /// A single-line body is only a language line, so its code is empty.
    fn code_block(&self, body: &str) -> FormattedSegment {
        let (language, code) = match body.split_once('\n') {
            Some((first, rest)) => (first.trim(), rest.trim()),
            None => (body.trim(), ""),
        };
        let language = if language.is_empty() {
            self.fallback_language.clone()
        } else {
            language.to_string()
        };
        FormattedSegment::CodeBlock {
            language,
            code: code.to_string(),
        }
    }
}

/// Format with the default fallback language.
pub fn format(raw: &str) -> Vec<FormattedSegment> {
    Formatter::default().format(raw)
}

/// Concatenate the visible text of every segment.
pub fn plain_text(segments: &[FormattedSegment]) -> String {
    segments.iter().map(FormattedSegment::text).collect()
}

/// The `(language, code)` of each code block, in order.
pub fn code_blocks(segments: &[FormattedSegment]) -> impl Iterator<Item = (&str, &str)> {
    segments.iter().filter_map(|seg| match seg {
        FormattedSegment::CodeBlock { language, code } => Some((language.as_str(), code.as_str())),
        _ => None,
    })
}

// ── Scanner ─────────────────────────────────────────────────────────────────

/// Accumulates segments, merging adjacent plain runs and never emitting an
/// empty `PlainText`.
#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<FormattedSegment>,
    plain: String,
}

impl SegmentBuilder {
    fn push(&mut self, segment: FormattedSegment) {
        self.flush_plain();
        self.segments.push(segment);
    }

    fn plain(&mut self, text: &str) {
        self.plain.push_str(text);
    }

    fn flush_plain(&mut self) {
        if !self.plain.is_empty() {
            let text = std::mem::take(&mut self.plain);
            self.segments.push(FormattedSegment::PlainText(text));
        }
    }

    fn finish(mut self) -> Vec<FormattedSegment> {
        self.flush_plain();
        self.segments
    }

    /// Inline code: a backtick pair around non-empty, backtick-free text.
    /// Pairs may span lines. An unmatched backtick stays literal.
    fn inline(&mut self, span: &str) {
        let mut plain_start = 0;
        let mut cursor = 0;

        while let Some(rel) = span[cursor..].find(TICK) {
            let open = cursor + rel;
            let body_start = open + 1;
            match span[body_start..].find(TICK) {
                // "``" has nothing inside; the first tick is literal, retry from the second
                Some(0) => cursor = body_start,
                Some(len) => {
                    self.bold(&span[plain_start..open]);
                    self.push(FormattedSegment::InlineCode(
                        span[body_start..body_start + len].to_string(),
                    ));
                    cursor = body_start + len + 1;
                    plain_start = cursor;
                }
                None => break,
            }
        }

        self.bold(&span[plain_start..]);
    }

    /// Bold: `**` pairs closed on the same line, shortest match first.
    fn bold(&mut self, text: &str) {
        let mut plain_start = 0;
        let mut cursor = 0;

        while let Some(rel) = text[cursor..].find(BOLD) {
            let open = cursor + rel;
            let body_start = open + BOLD.len();
            let line_end = text[body_start..]
                .find('\n')
                .map_or(text.len(), |i| body_start + i);

            match text[body_start..line_end].find(BOLD) {
                Some(len) => {
                    self.plain(&text[plain_start..open]);
                    self.push(FormattedSegment::BoldText(
                        text[body_start..body_start + len].to_string(),
                    ));
                    cursor = body_start + len + BOLD.len();
                    plain_start = cursor;
                }
                // No closer on this line: this `*` is literal, try the next one
                None => cursor = open + 1,
            }
        }

        self.plain(&text[plain_start..]);
    }
}
