//! Line correspondence and padding between the two sources

use crate::change::{ChangeBlock, Side};
use serde::Serialize;
use std::ops::Range;

/// `count` virtual blank lines shown directly above `line` on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub line: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    a: Range<usize>,
    b: Range<usize>,
}

impl Span {
    fn lines(&self, side: Side) -> &Range<usize> {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

/// Monotonic mapping between lines of source A and source B.
///
/// Exact at block boundaries, shifted identity between blocks. Inside a
/// block every line maps to the first line of the block on the other side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCorrespondence {
    spans: Vec<Span>,
    padding_a: Vec<Padding>,
    padding_b: Vec<Padding>,
}

impl LineCorrespondence {
    pub fn new(blocks: &[ChangeBlock]) -> Self {
        let mut correspondence = Self::default();
        correspondence.rebuild(blocks);
        correspondence
    }

    /// Replace the mapping with one derived from `blocks`
    pub fn rebuild(&mut self, blocks: &[ChangeBlock]) {
        self.spans.clear();
        self.padding_a.clear();
        self.padding_b.clear();

        for block in blocks {
            let (a_count, b_count) = (block.line_count(Side::A), block.line_count(Side::B));
            if a_count < b_count {
                self.padding_a.push(Padding {
                    line: block.a_line_end,
                    count: b_count - a_count,
                });
            } else if b_count < a_count {
                self.padding_b.push(Padding {
                    line: block.b_line_end,
                    count: a_count - b_count,
                });
            }
            self.spans.push(Span {
                a: block.lines(Side::A),
                b: block.lines(Side::B),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Line on the other side corresponding to `line` on `side`
    pub fn lookup(&self, side: Side, line: usize) -> usize {
        let other = side.other();
        // an empty range at `line` counts as preceding it
        let index = self.spans.partition_point(|span| span.lines(side).end <= line);

        if let Some(span) = self.spans.get(index) {
            if span.lines(side).contains(&line) {
                return span.lines(other).start;
            }
        }

        match index.checked_sub(1).map(|i| &self.spans[i]) {
            Some(prev) => line - prev.lines(side).end + prev.lines(other).end,
            None => line,
        }
    }

    pub fn padding(&self, side: Side) -> &[Padding] {
        match side {
            Side::A => &self.padding_a,
            Side::B => &self.padding_b,
        }
    }

    /// Visual row of `line`, counting the padding shown above it
    pub fn to_visual(&self, side: Side, line: usize) -> usize {
        let padded: usize = self
            .padding(side)
            .iter()
            .take_while(|p| p.line <= line)
            .map(|p| p.count)
            .sum();
        line + padded
    }

    /// Visual row where `line` begins, counting the padding above it as part
    /// of the line. Scroll synchronization maps through this row.
    pub fn top_row(&self, side: Side, line: usize) -> usize {
        let padded: usize = self
            .padding(side)
            .iter()
            .take_while(|p| p.line < line)
            .map(|p| p.count)
            .sum();
        line + padded
    }

    /// Document line displayed at visual `row`.
    ///
    /// Rows that fall on padding resolve to the line below it.
    pub fn from_visual(&self, side: Side, row: usize) -> usize {
        let mut shift = 0;
        for padding in self.padding(side) {
            let first_row = padding.line + shift;
            if row < first_row {
                break;
            }
            if row < first_row + padding.count {
                return padding.line;
            }
            shift += padding.count;
        }
        row - shift
    }

    /// Total visual rows for a side holding `line_count` lines
    pub fn visual_len(&self, side: Side, line_count: usize) -> usize {
        line_count + self.padding(side).iter().map(|p| p.count).sum::<usize>()
    }
}
