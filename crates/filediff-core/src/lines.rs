//! Byte offset <-> line number conversion

use std::ops::Range;

/// Start offsets of every line in a text.
///
/// A text containing `n` newlines has `n + 1` lines; the last one may be
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Line containing byte offset `pos` (clamped to the end of the text)
    pub fn line_at(&self, pos: usize) -> usize {
        let pos = pos.min(self.len);
        self.starts.partition_point(|&start| start <= pos) - 1
    }

    /// Byte offset where `line` starts; lines past the end map to the text length
    pub fn pos_at(&self, line: usize) -> usize {
        self.starts.get(line).copied().unwrap_or(self.len)
    }

    /// Byte offset where `line` ends, before its newline
    pub fn content_end(&self, line: usize) -> usize {
        self.starts.get(line + 1).map_or(self.len, |next| next - 1)
    }

    /// Byte range covered by a half-open range of lines
    pub fn span(&self, lines: Range<usize>) -> Range<usize> {
        self.pos_at(lines.start)..self.pos_at(lines.end)
    }

    pub fn is_line_start(&self, pos: usize) -> bool {
        self.starts.binary_search(&pos).is_ok()
    }

    /// A line ends right before a line start, or at the end of the text even
    /// when the final line has no newline.
    pub fn is_line_end(&self, pos: usize) -> bool {
        pos == self.len || self.is_line_start(pos)
    }
}
