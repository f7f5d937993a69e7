//! Line-aligned change blocks from an edit script

use crate::change::{ChangeBlock, ChangeKind, DiffOp, OpKind, Side};
use crate::lines::LineIndex;
use similar::{Algorithm, DiffTag};
use std::ops::Range;
use std::time::Instant;

/// Byte ranges covered by one maximal run of non-equal ops
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hunk {
    a: Range<usize>,
    b: Range<usize>,
}

impl Hunk {
    fn at(pos_a: usize, pos_b: usize) -> Self {
        Self {
            a: pos_a..pos_a,
            b: pos_b..pos_b,
        }
    }

    fn range(&self, side: Side) -> &Range<usize> {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

/// Lines between two stretches of equal lines
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    a: Range<usize>,
    b: Range<usize>,
}

/// Group an edit script into line-aligned change blocks.
///
/// Lines are aligned on their content (a text with `n` newlines has `n + 1`
/// lines), so blocks come out in document order, never share a line, and
/// cover the fewest lines any alignment allows. The edit script supplies
/// the intraline ranges of modifications.
pub fn classify(ops: &[DiffOp], old: &str, new: &str) -> Vec<ChangeBlock> {
    classify_with_deadline(ops, old, new, None)
}

/// [`classify`] with a wall-clock limit on the line alignment.
///
/// Past the deadline the alignment gets coarser but stays valid.
pub fn classify_with_deadline(ops: &[DiffOp], old: &str, new: &str, deadline: Option<Instant>) -> Vec<ChangeBlock> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let mut blocks: Vec<ChangeBlock> = line_runs(&old_lines, &new_lines, deadline)
        .into_iter()
        .flat_map(|run| blocks_for_run(run, &old_lines, &new_lines))
        .collect();

    let hunks = hunks(ops);
    let (a_index, b_index) = (LineIndex::new(old), LineIndex::new(new));
    for block in blocks.iter_mut().filter(|b| b.kind == ChangeKind::Modification) {
        block.intraline_a = clip(&hunks, Side::A, a_index.span(block.lines(Side::A)));
        block.intraline_b = clip(&hunks, Side::B, b_index.span(block.lines(Side::B)));
    }

    blocks
}

fn line_runs(old: &[&str], new: &[&str], deadline: Option<Instant>) -> Vec<Run> {
    let mut current: Option<Run> = None;
    let mut runs = Vec::new();

    for op in similar::capture_diff_slices_deadline(Algorithm::Myers, old, new, deadline) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            runs.extend(current.take());
            continue;
        }
        let run = current.get_or_insert_with(|| Run {
            a: old_range.start..old_range.start,
            b: new_range.start..new_range.start,
        });
        run.a.end = old_range.end;
        run.b.end = new_range.end;
    }
    runs.extend(current);

    runs
}

/// Split a run on its partial head and tail lines.
///
/// A first (last) line sharing its leading (trailing) text with the facing
/// line is paired with it as a modification. Lines left over on one side
/// only become an addition or deletion; when both sides keep lines in
/// between, the run stays one modification.
fn blocks_for_run(run: Run, old: &[&str], new: &[&str]) -> Vec<ChangeBlock> {
    let Run { a, b } = run;
    if a.is_empty() || b.is_empty() {
        return vec![ChangeBlock::new(a, b)];
    }

    let head = shares_head(old[a.start], new[b.start]);
    // a single line pairs with the head or the tail, not both
    let tail = shares_tail(old[a.end - 1], new[b.end - 1]) && !(head && (a.len() == 1 || b.len() == 1));

    let middle_a = a.start + usize::from(head)..a.end - usize::from(tail);
    let middle_b = b.start + usize::from(head)..b.end - usize::from(tail);
    if !middle_a.is_empty() && !middle_b.is_empty() {
        return vec![ChangeBlock::new(a, b)];
    }

    let mut blocks = Vec::with_capacity(3);
    if head {
        blocks.push(ChangeBlock::new(a.start..a.start + 1, b.start..b.start + 1));
    }
    if !middle_a.is_empty() || !middle_b.is_empty() {
        blocks.push(ChangeBlock::new(middle_a, middle_b));
    }
    if tail {
        blocks.push(ChangeBlock::new(a.end - 1..a.end, b.end - 1..b.end));
    }
    blocks
}

fn shares_head(old: &str, new: &str) -> bool {
    old.chars().next().is_some_and(|c| new.starts_with(c))
}

fn shares_tail(old: &str, new: &str) -> bool {
    let (old, new) = (old.trim_end_matches('\r'), new.trim_end_matches('\r'));
    old.chars().next_back().is_some_and(|c| new.ends_with(c))
}

fn hunks(ops: &[DiffOp]) -> Vec<Hunk> {
    let (mut pos_a, mut pos_b) = (0, 0);
    let mut current: Option<Hunk> = None;
    let mut hunks = Vec::new();

    for op in ops {
        match op.kind {
            OpKind::Equal => {
                hunks.extend(current.take());
                pos_a += op.len();
                pos_b += op.len();
            }
            OpKind::Delete => {
                let hunk = current.get_or_insert_with(|| Hunk::at(pos_a, pos_b));
                pos_a += op.len();
                hunk.a.end = pos_a;
            }
            OpKind::Insert => {
                let hunk = current.get_or_insert_with(|| Hunk::at(pos_a, pos_b));
                pos_b += op.len();
                hunk.b.end = pos_b;
            }
        }
    }
    hunks.extend(current);

    hunks
}

/// Parts of the hunks on `side` that fall inside `span`
fn clip(hunks: &[Hunk], side: Side, span: Range<usize>) -> Vec<Range<usize>> {
    let first = hunks.partition_point(|h| h.range(side).end <= span.start);
    hunks[first..]
        .iter()
        .map(|h| h.range(side))
        .take_while(|range| range.start < span.end)
        .filter_map(|range| {
            let start = range.start.max(span.start);
            let end = range.end.min(span.end);
            (start < end).then_some(start..end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use pretty_assertions::assert_eq;

    fn blocks(old: &str, new: &str) -> Vec<ChangeBlock> {
        classify(&diff(old, new), old, new)
    }

    fn spans(blocks: &[ChangeBlock]) -> Vec<(ChangeKind, Range<usize>, Range<usize>)> {
        blocks
            .iter()
            .map(|b| (b.kind, b.lines(Side::A), b.lines(Side::B)))
            .collect()
    }

    #[test]
    fn test_identical_texts_have_no_blocks() {
        assert!(blocks("a\nb\n", "a\nb\n").is_empty());
        assert!(blocks("", "").is_empty());
    }

    #[test]
    fn test_empty_old_is_addition() {
        assert_eq!(
            spans(&blocks("", "hello\n")),
            vec![(ChangeKind::Addition, 0..0, 0..1)]
        );
    }

    #[test]
    fn test_empty_new_is_deletion() {
        assert_eq!(
            spans(&blocks("hello\n", "")),
            vec![(ChangeKind::Deletion, 0..1, 0..0)]
        );
    }

    #[test]
    fn test_inserted_line() {
        assert_eq!(
            spans(&blocks("1\n2\n3\n", "1\n2\nX\n3\n")),
            vec![(ChangeKind::Addition, 2..2, 2..3)]
        );
    }

    #[test]
    fn test_changed_line_has_intraline_ranges() {
        let result = blocks("foo\nbar\n", "foo\nbaz\n");

        assert_eq!(spans(&result), vec![(ChangeKind::Modification, 1..2, 1..2)]);
        assert_eq!(result[0].intraline_a, vec![6..7]);
        assert_eq!(result[0].intraline_b, vec![6..7]);
    }

    #[test]
    fn test_edits_on_one_line_fold_together() {
        let result = blocks("a b c\n", "x b y\n");

        assert_eq!(spans(&result), vec![(ChangeKind::Modification, 0..1, 0..1)]);
        assert_eq!(result[0].intraline_a, vec![0..1, 4..5]);
        assert_eq!(result[0].intraline_b, vec![0..1, 4..5]);
    }

    #[test]
    fn test_split_line_is_modification_then_addition() {
        assert_eq!(
            spans(&blocks("a\nb\n", "a\nbX\nc\nd\n")),
            vec![
                (ChangeKind::Modification, 1..2, 1..2),
                (ChangeKind::Addition, 2..2, 2..4),
            ]
        );
    }

    #[test]
    fn test_joined_lines_is_deletion_then_modification() {
        assert_eq!(
            spans(&blocks("a\nc\n", "bc\n")),
            vec![
                (ChangeKind::Deletion, 0..1, 0..0),
                (ChangeKind::Modification, 1..2, 0..1),
            ]
        );
    }

    #[test]
    fn test_final_line_without_newline() {
        assert_eq!(
            spans(&blocks("x\ny", "x\nz")),
            vec![(ChangeKind::Modification, 1..2, 1..2)]
        );
        assert_eq!(
            spans(&blocks("x", "x\ny")),
            vec![(ChangeKind::Addition, 1..1, 1..2)]
        );
        // the empty line after a trailing newline is a line like any other
        assert_eq!(
            spans(&blocks("x\n", "x\ny")),
            vec![(ChangeKind::Modification, 1..2, 1..2)]
        );
    }

    #[test]
    fn test_line_added_before_blank_line() {
        let old = "use a;\n\nfn main() {}\n";
        let new = "use a;\nuse b;\n\nfn main() {}\n";

        assert_eq!(spans(&blocks(old, new)), vec![(ChangeKind::Addition, 1..1, 1..2)]);
    }

    #[test]
    fn test_line_deleted_between_blank_lines() {
        assert_eq!(
            spans(&blocks("\nb\n\n", "\n\n")),
            vec![(ChangeKind::Deletion, 1..2, 1..1)]
        );
    }

    #[test]
    fn test_unchanged_lines_never_form_blocks() {
        let old = "a\nshared\nb\n";
        let new = "x\nshared\ny\n";

        assert_eq!(
            spans(&blocks(old, new)),
            vec![
                (ChangeKind::Modification, 0..1, 0..1),
                (ChangeKind::Modification, 2..3, 2..3),
            ]
        );
    }

    #[test]
    fn test_whole_run_folds_when_both_sides_keep_lines() {
        assert_eq!(
            spans(&blocks("k\nab\ncd\nz\n", "k\npq\nrs\ntu\nz\n")),
            vec![(ChangeKind::Modification, 1..3, 1..4)]
        );
    }

    #[test]
    fn test_deadline_in_the_past_still_covers_every_change() {
        let old = "1\n2\n3\n";
        let new = "1\nX\n3\n";
        let ops = diff(old, new);

        let blocks = classify_with_deadline(&ops, old, new, Some(Instant::now()));

        assert!(blocks
            .iter()
            .any(|b| b.contains_line(Side::A, 1) && b.contains_line(Side::B, 1)));
    }

    #[test]
    fn test_non_modification_blocks_drop_intraline() {
        let result = blocks("1\n2\n3\n", "1\n2\nX\n3\n");

        assert!(result[0].intraline_a.is_empty());
        assert!(result[0].intraline_b.is_empty());
    }

    #[test]
    fn test_hunks_track_positions() {
        let ops = vec![
            DiffOp::equal("ab"),
            DiffOp::delete("c"),
            DiffOp::insert("XY"),
            DiffOp::equal("d"),
            DiffOp::insert("e"),
        ];

        assert_eq!(
            hunks(&ops),
            vec![
                Hunk { a: 2..3, b: 2..4 },
                Hunk { a: 4..4, b: 5..6 },
            ]
        );
    }
}
