//! Edit-script and change-block representation

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The kind of a single edit-script operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    /// Text present only in source A
    Delete,
    /// Text present only in source B
    Insert,
    /// Text shared by both sources
    Equal,
}

/// One operation of an edit script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: OpKind,
    pub text: String,
}

impl DiffOp {
    pub fn new(kind: OpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(OpKind::Insert, text)
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(OpKind::Equal, text)
    }

    /// Length of the text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if this is an actual change (not shared text)
    pub fn is_change(&self) -> bool {
        self.kind != OpKind::Equal
    }
}

/// Rebuild source A from an edit script
pub fn source_text(ops: &[DiffOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != OpKind::Insert)
        .map(|op| op.text.as_str())
        .collect()
}

/// Rebuild source B from an edit script
pub fn target_text(ops: &[DiffOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != OpKind::Delete)
        .map(|op| op.text.as_str())
        .collect()
}

/// Invert an edit script so it transforms B into A
pub fn invert(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    ops.into_iter()
        .map(|op| {
            let kind = match op.kind {
                OpKind::Delete => OpKind::Insert,
                OpKind::Insert => OpKind::Delete,
                OpKind::Equal => OpKind::Equal,
            };
            DiffOp::new(kind, op.text)
        })
        .collect()
}

/// One of the two compared sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// The kind of a line-aligned change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Lines exist only in source B
    Addition,
    /// Lines exist only in source A
    Deletion,
    /// Lines exist on both sides with differing content
    Modification,
}

impl ChangeKind {
    /// Derive the kind from which sides of a block carry lines
    pub fn from_extents(a_empty: bool, b_empty: bool) -> Self {
        match (a_empty, b_empty) {
            (true, _) => ChangeKind::Addition,
            (_, true) => ChangeKind::Deletion,
            _ => ChangeKind::Modification,
        }
    }
}

/// A line-aligned unit of difference between the two sources.
///
/// Line numbers are 0-based and ranges are half-open. An empty range on one
/// side marks the point where the other side's lines would go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBlock {
    pub kind: ChangeKind,
    pub a_line_start: usize,
    pub a_line_end: usize,
    pub b_line_start: usize,
    pub b_line_end: usize,
    /// Changed byte ranges in source A (modifications only)
    pub intraline_a: Vec<Range<usize>>,
    /// Changed byte ranges in source B (modifications only)
    pub intraline_b: Vec<Range<usize>>,
}

impl ChangeBlock {
    pub fn new(a_lines: Range<usize>, b_lines: Range<usize>) -> Self {
        Self {
            kind: ChangeKind::from_extents(a_lines.is_empty(), b_lines.is_empty()),
            a_line_start: a_lines.start,
            a_line_end: a_lines.end,
            b_line_start: b_lines.start,
            b_line_end: b_lines.end,
            intraline_a: Vec::new(),
            intraline_b: Vec::new(),
        }
    }

    pub fn lines(&self, side: Side) -> Range<usize> {
        match side {
            Side::A => self.a_line_start..self.a_line_end,
            Side::B => self.b_line_start..self.b_line_end,
        }
    }

    pub fn start(&self, side: Side) -> usize {
        self.lines(side).start
    }

    pub fn end(&self, side: Side) -> usize {
        self.lines(side).end
    }

    /// Number of lines the block covers on `side`
    pub fn line_count(&self, side: Side) -> usize {
        self.lines(side).len()
    }

    pub fn is_empty_on(&self, side: Side) -> bool {
        self.lines(side).is_empty()
    }

    pub fn contains_line(&self, side: Side, line: usize) -> bool {
        self.lines(side).contains(&line)
    }

    pub fn intraline(&self, side: Side) -> &[Range<usize>] {
        match side {
            Side::A => &self.intraline_a,
            Side::B => &self.intraline_b,
        }
    }
}

/// Direction in which a change block is merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeDirection {
    /// Make B match A for the block
    LeftToRight,
    /// Make A match B for the block
    RightToLeft,
}

impl MergeDirection {
    /// The side whose text is copied
    pub fn source(self) -> Side {
        match self {
            MergeDirection::LeftToRight => Side::A,
            MergeDirection::RightToLeft => Side::B,
        }
    }

    /// The side that is edited
    pub fn target(self) -> Side {
        self.source().other()
    }
}
