//! Textual definition-file front: byte spans, the diagnostics sink, and the
//! two line-oriented definition parsers.

pub mod grammar_def;
pub mod lexer_def;
pub mod log;

/// Line comments in both definition-file formats.
pub const COMMENT_START: &str = "//";

/// Half-open byte range into a source buffer.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct Span(pub usize, pub usize);

impl Span {
    pub fn join(&self, end: Span) -> Span {
        Span(self.0, end.1)
    }
}

/// Iterate lines together with the byte offset of each line start. Line
/// terminators (`\n`, `\r\n`) are stripped from the yielded text.
pub fn lines_with_offsets(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.split_inclusive('\n').scan(0usize, |offset, chunk| {
        let start = *offset;
        *offset += chunk.len();
        let line = chunk.strip_suffix('\n').unwrap_or(chunk);
        Some((start, line.strip_suffix('\r').unwrap_or(line)))
    })
}

/// Span covering one line as yielded by [`lines_with_offsets`].
pub fn line_span(offset: usize, line: &str) -> Span {
    Span(offset, offset + line.len())
}
