use filediff_core::{
    ChangeKind, Comparator, Direction, DiffEngine, Document, EditEvent, MergeDirection, Pane, SessionOptions, Side,
    SourceId, TextBuffer, ViewState, Viewport,
};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::rc::Rc;

const LEFT: SourceId = SourceId(1);
const RIGHT: SourceId = SourceId(2);

struct Host {
    comparator: Comparator<TextBuffer, ViewState>,
    left: Pane<TextBuffer, ViewState>,
    right: Pane<TextBuffer, ViewState>,
}

impl Host {
    fn new(left: &str, right: &str) -> Self {
        let pane = |id, text: &str| {
            Pane::new(
                id,
                Rc::new(RefCell::new(TextBuffer::new(text))),
                Rc::new(RefCell::new(ViewState::new())),
            )
        };
        let mut host = Self {
            comparator: Comparator::new(DiffEngine::new(), SessionOptions::default()),
            left: pane(LEFT, left),
            right: pane(RIGHT, right),
        };
        host.comparator.start(host.left.clone(), host.right.clone());
        host
    }

    fn left_text(&self) -> String {
        self.left.document.borrow().text()
    }

    fn right_text(&self) -> String {
        self.right.document.borrow().text()
    }

    fn block_count(&self) -> usize {
        self.comparator.session().map_or(0, |s| s.blocks().len())
    }

    /// Type at the start of the left document and tell the comparator
    fn type_left(&mut self, text: &str) {
        self.left.document.borrow_mut().set_range(0..0, text);
        self.comparator.on_edit(LEFT, &EditEvent::insert(0, text));
    }
}

#[fixture]
fn three_changes() -> Host {
    // line 1 modified, "WV" added before "tail section", "zq" deleted after it
    Host::new(
        "header line\nold\nmiddle section\ntail section\nzq\nfooter line\n",
        "header line\nnew\nmiddle section\nWV\ntail section\nfooter line\n",
    )
}

#[rstest]
fn identical_documents_have_no_changes() {
    let mut host = Host::new("same\n", "same\n");

    assert_eq!(host.block_count(), 0);
    assert_eq!(host.comparator.goto_change(LEFT, Direction::Forward), None);
    assert_eq!(host.comparator.merge(LEFT, MergeDirection::LeftToRight), None);
}

#[rstest]
fn goto_change_walks_every_block_and_wraps(mut three_changes: Host) {
    let host = &mut three_changes;
    let mut seen = Vec::new();

    for _ in 0..4 {
        let target = host
            .comparator
            .goto_change(LEFT, Direction::Forward)
            .expect("there are changes");
        seen.push((target.index, target.wrapped));
    }

    assert_eq!(seen, vec![(0, false), (1, false), (2, false), (0, true)]);
}

#[rstest]
fn goto_change_backward_from_the_end(mut three_changes: Host) {
    let host = &mut three_changes;
    host.left.viewport.borrow_mut().set_caret_line(6);

    let indices: Vec<usize> = (0..3)
        .filter_map(|_| host.comparator.goto_change(LEFT, Direction::Backward))
        .map(|target| target.index)
        .collect();

    assert_eq!(indices, vec![2, 1, 0]);
}

#[rstest]
fn goto_change_moves_both_carets(mut three_changes: Host) {
    let host = &mut three_changes;
    host.left.viewport.borrow_mut().set_caret_line(2);

    let target = host.comparator.goto_change(LEFT, Direction::Forward);

    assert_eq!(target.map(|t| (t.index, t.a_line, t.b_line)), Some((1, 3, 3)));
    assert_eq!(host.left.viewport.borrow().caret_line(), 3);
    assert_eq!(host.right.viewport.borrow().caret_line(), 3);
    assert_eq!(host.right.viewport.borrow().current_scroll(), 3);
}

#[rstest]
#[case(MergeDirection::LeftToRight)]
#[case(MergeDirection::RightToLeft)]
fn merging_every_block_makes_documents_equal(mut three_changes: Host, #[case] direction: MergeDirection) {
    let host = &mut three_changes;

    while host.block_count() > 0 {
        let before = host.block_count();
        host.comparator.goto_change(LEFT, Direction::Forward);
        assert!(host.comparator.merge(LEFT, direction).is_some());
        assert_eq!(host.block_count(), before - 1);
    }

    assert_eq!(host.left_text(), host.right_text());
}

#[rstest]
#[case(MergeDirection::LeftToRight, "1\n2\n3\n")]
#[case(MergeDirection::RightToLeft, "1\n2\nX\n3\n")]
fn merging_an_added_line(#[case] direction: MergeDirection, #[case] expected: &str) {
    let mut host = Host::new("1\n2\n3\n", "1\n2\nX\n3\n");
    host.right.viewport.borrow_mut().set_caret_line(2);

    let edit = host.comparator.merge(RIGHT, direction);

    assert!(edit.is_some());
    assert_eq!(host.left_text(), expected);
    assert_eq!(host.right_text(), expected);
    assert_eq!(host.block_count(), 0);
}

#[rstest]
fn merge_without_block_at_caret_is_noop(mut three_changes: Host) {
    let host = &mut three_changes;
    host.left.viewport.borrow_mut().set_caret_line(0);

    assert_eq!(host.comparator.merge(LEFT, MergeDirection::LeftToRight), None);
    assert_eq!(host.block_count(), 3);
}

#[rstest]
fn edits_recompute_the_comparison() {
    let mut host = Host::new("a\n", "a\n");
    assert_eq!(host.block_count(), 0);

    host.type_left("typed\n");

    let session = host.comparator.session().expect("comparison is running");
    assert_eq!(session.blocks().len(), 1);
    assert_eq!(session.blocks()[0].kind, ChangeKind::Deletion);
}

#[rstest]
fn scroll_sync_follows_and_ignores_its_own_echo(mut three_changes: Host) {
    let host = &mut three_changes;

    host.left.viewport.borrow_mut().scroll_to(5);
    assert!(host.comparator.on_scroll(LEFT));
    let right_scroll = host.right.viewport.borrow().current_scroll();
    assert_eq!(right_scroll, 5);

    // the editor reports the programmatic scroll of the right view
    assert!(!host.comparator.on_scroll(RIGHT));
    assert_eq!(host.left.viewport.borrow().scroll_calls, 1);

    // a real scroll of the right view is followed again
    host.right.viewport.borrow_mut().scroll_to(1);
    assert!(host.comparator.on_scroll(RIGHT));
    assert_eq!(host.left.viewport.borrow().current_scroll(), 1);
}

#[rstest]
fn scroll_echo_survives_an_intervening_report(mut three_changes: Host) {
    let host = &mut three_changes;

    host.left.viewport.borrow_mut().scroll_to(5);
    assert!(host.comparator.on_scroll(LEFT));
    // a second report from the left lands before the right view's echo
    assert!(host.comparator.on_scroll(LEFT));

    assert!(!host.comparator.on_scroll(RIGHT));
    assert_eq!(host.right.viewport.borrow().current_scroll(), 5);
    assert_eq!(host.left.viewport.borrow().scroll_calls, 1);
}

#[rstest]
fn goto_change_keeps_added_lines_in_view_after_scroll_reports() {
    let mut host = Host::new("1\n2\n3\n4\n5\n6\n7\n8\n", "1\n2\n3\n4\nX\nY\n5\n6\n7\n8\n");

    let target = host
        .comparator
        .goto_change(LEFT, Direction::Forward)
        .expect("there is a change");
    assert_eq!((target.a_line, target.b_line), (4, 4));

    // the editor reports both programmatic scrolls back
    assert!(!host.comparator.on_scroll(LEFT));
    assert!(!host.comparator.on_scroll(RIGHT));

    assert_eq!(host.left.viewport.borrow().current_scroll(), 4);
    assert_eq!(host.right.viewport.borrow().current_scroll(), 4);
}

#[rstest]
fn scrolling_onto_padded_line_shows_added_lines() {
    let mut host = Host::new("1\n2\n3\n4\n5\n6\n7\n8\n", "1\n2\n3\n4\nX\nY\n5\n6\n7\n8\n");

    host.left.viewport.borrow_mut().scroll_to(4);
    assert!(host.comparator.on_scroll(LEFT));
    assert_eq!(host.right.viewport.borrow().current_scroll(), 4);

    host.right.viewport.borrow_mut().scroll_to(6);
    assert!(host.comparator.on_scroll(RIGHT));
    assert_eq!(host.left.viewport.borrow().current_scroll(), 4);
}

#[rstest]
#[case::close(true)]
#[case::switch(false)]
fn leaving_a_compared_source_tears_down(mut three_changes: Host, #[case] close: bool) {
    let host = &mut three_changes;

    // unrelated sources leave the comparison alone
    assert!(!host.comparator.on_close(SourceId(99)));
    assert!(host.comparator.is_active());

    let torn_down = if close {
        host.comparator.on_close(RIGHT)
    } else {
        host.comparator.on_switch(LEFT)
    };

    assert!(torn_down);
    assert!(!host.comparator.is_active());
    assert!(!host.comparator.on_scroll(LEFT));
    assert_eq!(host.comparator.goto_change(LEFT, Direction::Forward), None);
    assert!(!host.comparator.on_save(RIGHT));
}

#[rstest]
fn padding_is_placed_on_the_shorter_side(three_changes: Host) {
    let left = three_changes.left.viewport.borrow();
    let right = three_changes.right.viewport.borrow();

    let left_padding: Vec<(usize, usize)> = left.padding.iter().map(|p| (p.line, p.count)).collect();
    let right_padding: Vec<(usize, usize)> = right.padding.iter().map(|p| (p.line, p.count)).collect();
    assert_eq!(left_padding, vec![(3, 1)]);
    assert_eq!(right_padding, vec![(5, 1)]);
}

#[rstest]
fn stop_and_restart() {
    let mut host = Host::new("x\n", "y\n");
    assert!(host.comparator.stop());
    assert!(!host.comparator.stop());

    let session = host.comparator.start(host.left.clone(), host.right.clone());
    assert_eq!(session.side_of(RIGHT), Some(Side::B));
    assert_eq!(session.blocks().len(), 1);
}
