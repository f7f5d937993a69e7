//! Next / previous change navigation

use crate::change::{ChangeBlock, Side};
use crate::correspondence::LineCorrespondence;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Direction to search for a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Where navigation landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeTarget {
    /// Index of the block in document order
    pub index: usize,
    pub a_line: usize,
    pub b_line: usize,
    /// The search ran off the end and restarted from the other end
    pub wrapped: bool,
}

impl ChangeTarget {
    fn new(index: usize, block: &ChangeBlock, wrapped: bool) -> Self {
        Self {
            index,
            a_line: block.a_line_start,
            b_line: block.b_line_start,
            wrapped,
        }
    }

    pub fn line(&self, side: Side) -> usize {
        match side {
            Side::A => self.a_line,
            Side::B => self.b_line,
        }
    }
}

/// Finds the next or previous change block relative to a caret line
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    blocks: &'a [ChangeBlock],
    correspondence: &'a LineCorrespondence,
    wrap: bool,
}

impl<'a> Navigator<'a> {
    pub fn new(blocks: &'a [ChangeBlock], correspondence: &'a LineCorrespondence) -> Self {
        Self {
            blocks,
            correspondence,
            wrap: true,
        }
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Find the change after (or before) `line` on `side`.
    ///
    /// Blocks are searched on both sides: by their own start on `side`, and
    /// by their start on the other side relative to the line corresponding to
    /// `line`. The candidate nearest in document order wins, so blocks empty
    /// on `side` are still reachable. Returns `None` when there are no blocks
    /// or nothing was found and wrapping is off.
    pub fn next_change(&self, side: Side, line: usize, direction: Direction) -> Option<ChangeTarget> {
        if self.blocks.is_empty() {
            trace!("no differences to navigate");
            return None;
        }

        let other = side.other();
        let across_line = self.correspondence.lookup(side, line);
        let found = match direction {
            Direction::Forward => {
                let own = self
                    .blocks
                    .iter()
                    .position(|b| !b.is_empty_on(side) && b.start(side) > line);
                let across = self
                    .blocks
                    .iter()
                    .position(|b| !b.is_empty_on(other) && b.start(other) > across_line);
                nearest(own, across, usize::min)
            }
            Direction::Backward => {
                let own = self
                    .blocks
                    .iter()
                    .rposition(|b| !b.is_empty_on(side) && b.start(side) < line);
                let across = self
                    .blocks
                    .iter()
                    .rposition(|b| !b.is_empty_on(other) && b.start(other) < across_line);
                nearest(own, across, usize::max)
            }
        };

        let (index, wrapped) = match found {
            Some(index) => (index, false),
            None if self.wrap => match direction {
                Direction::Forward => (0, true),
                Direction::Backward => (self.blocks.len() - 1, true),
            },
            None => return None,
        };

        trace!(?side, line, ?direction, index, wrapped, "navigated to change");
        Some(ChangeTarget::new(index, &self.blocks[index], wrapped))
    }

    /// Move one block from `index`, the block last navigated to.
    ///
    /// A caret parked on a block that is empty on its side sits both at and
    /// after that block, so repeated navigation resumes from the index.
    pub fn step(&self, index: usize, direction: Direction) -> Option<ChangeTarget> {
        let len = self.blocks.len();
        if len == 0 {
            return None;
        }

        let (next, wrapped) = match direction {
            Direction::Forward if index + 1 < len => (index + 1, false),
            Direction::Backward if index > 0 && index <= len => (index - 1, false),
            _ if !self.wrap => return None,
            Direction::Forward => (0, true),
            Direction::Backward => (len - 1, true),
        };

        trace!(from = index, to = next, ?direction, wrapped, "stepped to change");
        Some(ChangeTarget::new(next, &self.blocks[next], wrapped))
    }
}

// Both candidates may name the same block; either pick is then the own one.
fn nearest(own: Option<usize>, across: Option<usize>, pick: fn(usize, usize) -> usize) -> Option<usize> {
    match (own, across) {
        (Some(own), Some(across)) => Some(pick(own, across)),
        (own, across) => own.or(across),
    }
}
