use filediff_core::{
    classify, diff, invert, plan_merge, source_text, target_text, ChangeBlock, DiffEngine, LineCorrespondence,
    LineIndex, MergeDirection, OpKind, Side,
};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    "[ab é.\n]{0,48}"
}

fn multiline_text() -> impl Strategy<Value = String> {
    prop::collection::vec("(foo|bar|baz|qux)( x)?", 0..12).prop_map(|lines| {
        lines.into_iter().map(|line| line + "\n").collect::<String>()
    })
}

/// Lines that may be blank and a last line without a newline
fn ragged_text() -> impl Strategy<Value = String> {
    prop::collection::vec("((foo|bar|qux)( x)?)?", 0..8).prop_map(|lines| lines.join("\n"))
}

fn changed_lines(blocks: &[ChangeBlock]) -> usize {
    blocks.iter().map(|b| b.line_count(Side::A) + b.line_count(Side::B)).sum()
}

/// Merge every block of `old`/`new` in both directions and check the result.
///
/// The merged side holds the source's lines of the block in place of its own,
/// and comparing again finds exactly the block's lines fewer changed.
fn assert_merges_remove_their_lines(engine: &DiffEngine, old: &str, new: &str) -> Result<(), TestCaseError> {
    let before = engine.compare(old, new).blocks;

    for block in &before {
        for direction in [MergeDirection::LeftToRight, MergeDirection::RightToLeft] {
            let edit = plan_merge(block, direction, old, new);
            let (source, target) = match direction.source() {
                Side::A => (old, new),
                Side::B => (new, old),
            };
            let mut merged = target.to_string();
            edit.apply_to_text(&mut merged);

            let source_lines: Vec<&str> = source.split('\n').collect();
            let target_lines: Vec<&str> = target.split('\n').collect();
            let (from, to) = (block.lines(direction.source()), block.lines(direction.target()));
            let expected: Vec<&str> = target_lines[..to.start]
                .iter()
                .chain(&source_lines[from])
                .chain(&target_lines[to.end..])
                .copied()
                .collect();
            prop_assert_eq!(merged.split('\n').collect::<Vec<_>>(), expected);

            let after = match direction {
                MergeDirection::LeftToRight => engine.compare(old, &merged).blocks,
                MergeDirection::RightToLeft => engine.compare(&merged, new).blocks,
            };
            prop_assert_eq!(
                changed_lines(&after),
                changed_lines(&before) - changed_lines(std::slice::from_ref(block))
            );
        }
    }
    Ok(())
}

#[test]
fn merges_around_repeated_lines_remove_their_lines() {
    let cases = [
        ("foo\nfoo\nqux x\nfoo\nqux\nqux\nbar x\n", "bar\nqux\nqux x\nbar x\nfoo\n"),
        ("foo\nfoo\nfoo\nqux\nbar x\n", "qux\nqux x\nbar x\nfoo\n"),
        ("\nb\n\n", "\n\n"),
        ("a\n\n", "a\nb\n\n"),
    ];
    for engine in [DiffEngine::new(), DiffEngine::new().with_line_mode_threshold(0)] {
        for (old, new) in cases {
            assert_merges_remove_their_lines(&engine, old, new).unwrap();
            assert_merges_remove_their_lines(&engine, new, old).unwrap();
        }
    }
}

fn assert_blocks_well_formed(blocks: &[ChangeBlock], old: &str, new: &str) -> Result<(), TestCaseError> {
    let a_lines = LineIndex::new(old).line_count();
    let b_lines = LineIndex::new(new).line_count();

    for block in blocks {
        prop_assert!(block.a_line_start <= block.a_line_end);
        prop_assert!(block.b_line_start <= block.b_line_end);
        prop_assert!(block.a_line_end <= a_lines);
        prop_assert!(block.b_line_end <= b_lines);
        prop_assert!(!(block.is_empty_on(Side::A) && block.is_empty_on(Side::B)));
    }
    for pair in blocks.windows(2) {
        prop_assert!(pair[0].a_line_end <= pair[1].a_line_start);
        prop_assert!(pair[0].b_line_end <= pair[1].b_line_start);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_edit_script_reconstructs_both_sources(old in text(), new in text()) {
        let ops = diff(&old, &new);
        prop_assert_eq!(source_text(&ops), old);
        prop_assert_eq!(target_text(&ops), new);
    }

    #[test]
    fn prop_edit_script_is_normalized(old in text(), new in text()) {
        let ops = diff(&old, &new);
        prop_assert!(ops.iter().all(|op| !op.is_empty()));
        for pair in ops.windows(2) {
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    #[test]
    fn prop_inverted_script_reconstructs_swapped_sources(old in text(), new in text()) {
        let inverted = invert(diff(&old, &new));
        prop_assert_eq!(source_text(&inverted), new);
        prop_assert_eq!(target_text(&inverted), old);
    }

    #[test]
    fn prop_identical_inputs_have_no_changes(text in text()) {
        let ops = diff(&text, &text);
        prop_assert!(ops.len() <= 1);
        prop_assert!(ops.iter().all(|op| op.kind == OpKind::Equal));
        prop_assert!(classify(&ops, &text, &text).is_empty());
    }

    #[test]
    fn prop_line_mode_reconstructs_both_sources(old in multiline_text(), new in multiline_text()) {
        let engine = DiffEngine::new().with_line_mode_threshold(0);
        let ops = engine.diff(&old, &new);
        prop_assert_eq!(source_text(&ops), old);
        prop_assert_eq!(target_text(&ops), new);
    }

    #[test]
    fn prop_blocks_are_ordered_and_disjoint(old in text(), new in text()) {
        let blocks = classify(&diff(&old, &new), &old, &new);
        assert_blocks_well_formed(&blocks, &old, &new)?;
    }

    #[test]
    fn prop_line_blocks_are_ordered_and_disjoint(old in multiline_text(), new in multiline_text()) {
        let blocks = classify(&diff(&old, &new), &old, &new);
        assert_blocks_well_formed(&blocks, &old, &new)?;
    }

    #[test]
    fn prop_corresponding_lines_share_a_visual_row(old in multiline_text(), new in multiline_text()) {
        let blocks = classify(&diff(&old, &new), &old, &new);
        let correspondence = LineCorrespondence::new(&blocks);
        let a_lines = LineIndex::new(&old).line_count();

        for line in 0..a_lines {
            if blocks.iter().any(|b| b.contains_line(Side::A, line)) {
                continue;
            }
            let other = correspondence.lookup(Side::A, line);
            prop_assert_eq!(
                correspondence.to_visual(Side::A, line),
                correspondence.to_visual(Side::B, other)
            );
        }
    }

    #[test]
    fn prop_lookup_is_monotonic(old in text(), new in text()) {
        let blocks = classify(&diff(&old, &new), &old, &new);
        let correspondence = LineCorrespondence::new(&blocks);
        let a_lines = LineIndex::new(&old).line_count();

        for line in 1..a_lines {
            prop_assert!(
                correspondence.lookup(Side::A, line - 1) <= correspondence.lookup(Side::A, line)
            );
        }
    }

    #[test]
    fn prop_merging_a_block_removes_exactly_its_lines(old in ragged_text(), new in ragged_text()) {
        assert_merges_remove_their_lines(&DiffEngine::new(), &old, &new)?;
    }

    #[test]
    fn prop_line_mode_merges_remove_exactly_their_lines(old in multiline_text(), new in multiline_text()) {
        let engine = DiffEngine::new().with_line_mode_threshold(0);
        assert_merges_remove_their_lines(&engine, &old, &new)?;
    }
}
