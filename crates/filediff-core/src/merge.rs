//! Applying a change block from one side to the other

use crate::change::{ChangeBlock, ChangeKind, MergeDirection, Side};
use crate::document::Document;
use crate::lines::LineIndex;
use serde::Serialize;
use std::ops::Range;

/// A planned text replacement on one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeEdit {
    pub target: Side,
    /// Byte range replaced in the target text
    pub range: Range<usize>,
    pub text: String,
}

impl MergeEdit {
    pub fn apply_to<D: Document + ?Sized>(&self, document: &mut D) {
        document.set_range(self.range.clone(), &self.text);
    }

    /// Apply to the target text held as a plain string
    pub fn apply_to_text(&self, text: &mut String) {
        text.replace_range(self.range.clone(), &self.text);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Remove the target's lines of the block
    Delete,
    /// Insert the source's lines at the target's insertion point
    Insert,
    /// Replace the target's lines with the source's
    Replace,
}

/// Plan the edit that makes the target side of `block` match its source side.
///
/// Texts are lines joined by newlines, so the target's lines of the block are
/// swapped for the source's and every other line keeps its content.
pub fn plan_merge(block: &ChangeBlock, direction: MergeDirection, text_a: &str, text_b: &str) -> MergeEdit {
    let action = match (block.kind, direction) {
        (ChangeKind::Addition, MergeDirection::LeftToRight) => Action::Delete,
        (ChangeKind::Addition, MergeDirection::RightToLeft) => Action::Insert,
        (ChangeKind::Deletion, MergeDirection::LeftToRight) => Action::Insert,
        (ChangeKind::Deletion, MergeDirection::RightToLeft) => Action::Delete,
        (ChangeKind::Modification, MergeDirection::LeftToRight) => Action::Replace,
        (ChangeKind::Modification, MergeDirection::RightToLeft) => Action::Replace,
    };

    let (source, target) = (direction.source(), direction.target());
    let (source_text, target_text) = match source {
        Side::A => (text_a, text_b),
        Side::B => (text_b, text_a),
    };
    let (source_index, target_index) = (LineIndex::new(source_text), LineIndex::new(target_text));
    let (source_lines, target_lines) = (block.lines(source), block.lines(target));

    // source lines joined by their newlines, without the one after the last
    let copied = || {
        let end = source_index.content_end(source_lines.end.saturating_sub(1));
        &source_text[source_index.pos_at(source_lines.start)..end]
    };
    let target_len = target_text.len();
    let last_line = target_lines.end >= target_index.line_count();

    let (range, text) = match action {
        Action::Replace => {
            let end = target_index.content_end(target_lines.end - 1);
            (target_index.pos_at(target_lines.start)..end, copied().to_string())
        }
        Action::Insert if target_lines.start < target_index.line_count() => {
            let at = target_index.pos_at(target_lines.start);
            (at..at, format!("{}\n", copied()))
        }
        Action::Insert => (target_len..target_len, format!("\n{}", copied())),
        Action::Delete if !last_line => (target_index.span(target_lines), String::new()),
        // the final lines leave together with the newline in front of them
        Action::Delete => {
            let start = target_index.pos_at(target_lines.start).saturating_sub(1);
            (start..target_len, String::new())
        }
    };

    MergeEdit { target, range, text }
}

/// Index of the block the caret on `side` is considered to be at.
///
/// A block covering the caret line wins. Otherwise a block empty on `side`
/// whose padding hangs directly below the caret line, and finally one whose
/// insertion point is the caret line itself.
pub fn block_at(blocks: &[ChangeBlock], side: Side, caret_line: usize) -> Option<usize> {
    blocks
        .iter()
        .position(|b| b.contains_line(side, caret_line))
        .or_else(|| {
            blocks
                .iter()
                .position(|b| b.is_empty_on(side) && b.start(side) == caret_line + 1)
        })
        .or_else(|| {
            blocks
                .iter()
                .position(|b| b.is_empty_on(side) && b.start(side) == caret_line)
        })
}
