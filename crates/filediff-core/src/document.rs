//! Host-facing document and viewport abstractions

use crate::change::ChangeKind;
use crate::correspondence::Padding;
use crate::lines::LineIndex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Text storage the comparison reads from and merges into
pub trait Document {
    fn text(&self) -> String;

    /// Replace the bytes in `range` with `text`
    fn set_range(&mut self, range: Range<usize>, text: &str);

    fn line_at(&self, pos: usize) -> usize {
        LineIndex::new(&self.text()).line_at(pos)
    }

    /// Start of `line`; a line past the end maps to the text length
    fn pos_at(&self, line: usize) -> usize {
        LineIndex::new(&self.text()).pos_at(line)
    }
}

/// A scrollable view onto a document.
///
/// The presentation hooks default to no-ops so headless hosts only need the
/// scroll and caret accessors.
pub trait Viewport {
    fn scroll_to(&mut self, line: usize);
    fn current_scroll(&self) -> usize;
    fn caret_line(&self) -> usize;
    fn set_caret_line(&mut self, line: usize);

    fn clear_markers(&mut self) {}
    fn mark_line(&mut self, _line: usize, _kind: ChangeKind) {}
    fn add_padding(&mut self, _padding: Padding) {}
    fn highlight(&mut self, _range: Range<usize>, _kind: ChangeKind) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    Insert,
    Delete,
}

/// An edit reported by the host after it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEvent {
    pub position: usize,
    pub kind: EditKind,
    pub text: String,
    pub length: usize,
}

impl EditEvent {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            position,
            kind: EditKind::Insert,
            length: text.len(),
            text,
        }
    }

    pub fn delete(position: usize, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            ..Self::insert(position, text)
        }
    }
}

/// In-memory document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl Document for TextBuffer {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_range(&mut self, range: Range<usize>, text: &str) {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        self.text.replace_range(start..end, text);
    }

    fn line_at(&self, pos: usize) -> usize {
        LineIndex::new(&self.text).line_at(pos)
    }

    fn pos_at(&self, line: usize) -> usize {
        LineIndex::new(&self.text).pos_at(line)
    }
}

/// Headless viewport recording what the comparison asked it to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub scroll: usize,
    pub caret: usize,
    /// Number of `scroll_to` calls received
    pub scroll_calls: usize,
    pub markers: Vec<(usize, ChangeKind)>,
    pub padding: Vec<Padding>,
    pub highlights: Vec<(Range<usize>, ChangeKind)>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Viewport for ViewState {
    fn scroll_to(&mut self, line: usize) {
        self.scroll = line;
        self.scroll_calls += 1;
    }

    fn current_scroll(&self) -> usize {
        self.scroll
    }

    fn caret_line(&self) -> usize {
        self.caret
    }

    fn set_caret_line(&mut self, line: usize) {
        self.caret = line;
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.padding.clear();
        self.highlights.clear();
    }

    fn mark_line(&mut self, line: usize, kind: ChangeKind) {
        self.markers.push((line, kind));
    }

    fn add_padding(&mut self, padding: Padding) {
        self.padding.push(padding);
    }

    fn highlight(&mut self, range: Range<usize>, kind: ChangeKind) {
        self.highlights.push((range, kind));
    }
}
