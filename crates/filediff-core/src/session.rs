//! Live comparison of two open documents

use crate::change::{ChangeBlock, MergeDirection, Side};
use crate::correspondence::LineCorrespondence;
use crate::diff::DiffEngine;
use crate::document::{Document, EditEvent, Viewport};
use crate::merge::{block_at, plan_merge, MergeEdit};
use crate::navigate::{ChangeTarget, Direction, Navigator};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, trace};

/// Handle shared between the host and a comparison session
pub type Shared<T> = Rc<RefCell<T>>;

/// Host-assigned identity of an open document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub u64);

/// A document and the viewport showing it
pub struct Pane<D, V> {
    pub id: SourceId,
    pub document: Shared<D>,
    pub viewport: Shared<V>,
}

impl<D, V> Pane<D, V> {
    pub fn new(id: SourceId, document: Shared<D>, viewport: Shared<V>) -> Self {
        Self {
            id,
            document,
            viewport,
        }
    }
}

impl<D, V> Clone for Pane<D, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            document: Rc::clone(&self.document),
            viewport: Rc::clone(&self.viewport),
        }
    }
}

/// Behaviour switches for a comparison session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Navigation restarts from the other end when it runs out of changes
    pub wrap: bool,
    /// Recompute after every edit, not only on save
    pub recompute_on_edit: bool,
    /// Keep both viewports scrolled to corresponding lines
    pub sync_scroll: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            wrap: true,
            recompute_on_edit: true,
            sync_scroll: true,
        }
    }
}

/// Scrolls a session issued itself, one per side, until the host reports
/// them back
#[derive(Debug, Clone, Copy, Default)]
struct PendingEcho {
    a: Option<usize>,
    b: Option<usize>,
}

impl PendingEcho {
    fn slot(&mut self, side: Side) -> &mut Option<usize> {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    fn arm(&mut self, side: Side, line: usize) {
        *self.slot(side) = Some(line);
    }

    /// Consume the slot if `line` is the scroll it was armed with
    fn take_match(&mut self, side: Side, line: usize) -> bool {
        let slot = self.slot(side);
        if *slot == Some(line) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Two documents under comparison, with the blocks and padding between them
pub struct ComparisonSession<D: Document, V: Viewport> {
    a: Pane<D, V>,
    b: Pane<D, V>,
    engine: DiffEngine,
    options: SessionOptions,
    blocks: Vec<ChangeBlock>,
    correspondence: LineCorrespondence,
    pending_echo: PendingEcho,
    last_target: Option<ChangeTarget>,
}

impl<D: Document, V: Viewport> ComparisonSession<D, V> {
    pub fn new(a: Pane<D, V>, b: Pane<D, V>, engine: DiffEngine, options: SessionOptions) -> Self {
        let mut session = Self {
            a,
            b,
            engine,
            options,
            blocks: Vec::new(),
            correspondence: LineCorrespondence::default(),
            pending_echo: PendingEcho::default(),
            last_target: None,
        };
        session.recompute();
        session
    }

    pub fn pane(&self, side: Side) -> &Pane<D, V> {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// Which side `id` is shown on, if it takes part in this session
    pub fn side_of(&self, id: SourceId) -> Option<Side> {
        if self.a.id == id {
            Some(Side::A)
        } else if self.b.id == id {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn involves(&self, id: SourceId) -> bool {
        self.side_of(id).is_some()
    }

    pub fn blocks(&self) -> &[ChangeBlock] {
        &self.blocks
    }

    pub fn correspondence(&self) -> &LineCorrespondence {
        &self.correspondence
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Diff the current texts again and refresh both viewports
    pub fn recompute(&mut self) {
        let text_a = self.a.document.borrow().text();
        let text_b = self.b.document.borrow().text();

        let result = self.engine.compare(&text_a, &text_b);
        self.blocks = result.blocks;
        self.correspondence.rebuild(&self.blocks);
        self.last_target = None;

        debug!(
            blocks = self.blocks.len(),
            additions = result.additions,
            deletions = result.deletions,
            modifications = result.modifications,
            "recomputed comparison"
        );
        self.refresh();
    }

    fn refresh(&self) {
        for side in [Side::A, Side::B] {
            let mut view = self.pane(side).viewport.borrow_mut();
            view.clear_markers();
            for block in &self.blocks {
                for line in block.lines(side) {
                    view.mark_line(line, block.kind);
                }
                for range in block.intraline(side) {
                    view.highlight(range.clone(), block.kind);
                }
            }
            for padding in self.correspondence.padding(side) {
                view.add_padding(*padding);
            }
        }
    }

    /// Returns whether the edit triggered a recompute
    pub fn on_edit(&mut self, side: Side, event: &EditEvent) -> bool {
        trace!(?side, position = event.position, kind = ?event.kind, length = event.length, "document edited");
        if self.options.recompute_on_edit {
            self.recompute();
            true
        } else {
            false
        }
    }

    pub fn on_save(&mut self, _side: Side) {
        self.recompute();
    }

    /// Follow a scroll of `side` on the other viewport.
    ///
    /// Returns false when syncing is off or the scroll is the echo of one
    /// this session performed.
    pub fn on_scroll(&mut self, side: Side) -> bool {
        if !self.options.sync_scroll {
            return false;
        }

        let line = self.pane(side).viewport.borrow().current_scroll();
        if self.pending_echo.take_match(side, line) {
            trace!(?side, line, "suppressed scroll echo");
            return false;
        }

        self.sync_from(side, line);
        true
    }

    fn sync_from(&mut self, side: Side, line: usize) {
        let other = side.other();
        let row = self.correspondence.top_row(side, line);
        let target = self.correspondence.from_visual(other, row);
        self.scroll(other, target);
    }

    /// Scroll `side` programmatically, expecting the host to echo it
    fn scroll(&mut self, side: Side, line: usize) {
        let viewport = Rc::clone(&self.pane(side).viewport);
        let mut view = viewport.borrow_mut();
        if view.current_scroll() != line {
            self.pending_echo.arm(side, line);
            view.scroll_to(line);
        }
    }

    /// Move both carets to the next or previous change from the caret on `focus`
    pub fn goto_change(&mut self, focus: Side, direction: Direction) -> Option<ChangeTarget> {
        let caret = self.pane(focus).viewport.borrow().caret_line();
        let navigator = Navigator::new(&self.blocks, &self.correspondence).with_wrap(self.options.wrap);

        let target = match self.last_target {
            Some(last) if last.line(focus) == caret => navigator.step(last.index, direction),
            _ => navigator.next_change(focus, caret, direction),
        }?;

        for side in [Side::A, Side::B] {
            self.pane(side).viewport.borrow_mut().set_caret_line(target.line(side));
        }
        let line = target.line(focus);
        self.scroll(focus, line);
        self.sync_from(focus, line);
        self.last_target = Some(target);

        Some(target)
    }

    /// Index of the block at the caret on `focus`
    pub fn current_block(&self, focus: Side) -> Option<usize> {
        let caret = self.pane(focus).viewport.borrow().caret_line();
        match self.last_target {
            Some(last) if last.line(focus) == caret => Some(last.index),
            _ => block_at(&self.blocks, focus, caret),
        }
    }

    /// Merge the block at the caret on `focus`
    pub fn merge_current(&mut self, focus: Side, direction: MergeDirection) -> Option<MergeEdit> {
        let index = self.current_block(focus)?;
        self.merge_block(index, direction)
    }

    pub fn merge_block(&mut self, index: usize, direction: MergeDirection) -> Option<MergeEdit> {
        let block = self.blocks.get(index)?;
        let text_a = self.a.document.borrow().text();
        let text_b = self.b.document.borrow().text();
        let edit = plan_merge(block, direction, &text_a, &text_b);

        info!(
            index,
            kind = ?block.kind,
            ?direction,
            start = edit.range.start,
            end = edit.range.end,
            "merging change"
        );
        edit.apply_to(&mut *self.pane(edit.target).document.borrow_mut());

        self.recompute();
        let source = direction.source();
        let line = self.pane(source).viewport.borrow().current_scroll();
        self.sync_from(source, line);

        Some(edit)
    }
}

/// Host-side entry point owning at most one comparison session.
///
/// Every action is a no-op while no comparison is active.
pub struct Comparator<D: Document, V: Viewport> {
    engine: DiffEngine,
    options: SessionOptions,
    session: Option<ComparisonSession<D, V>>,
}

impl<D: Document, V: Viewport> Default for Comparator<D, V> {
    fn default() -> Self {
        Self::new(DiffEngine::default(), SessionOptions::default())
    }
}

impl<D: Document, V: Viewport> Comparator<D, V> {
    pub fn new(engine: DiffEngine, options: SessionOptions) -> Self {
        Self {
            engine,
            options,
            session: None,
        }
    }

    /// Start comparing two panes, replacing any running comparison
    pub fn start(&mut self, a: Pane<D, V>, b: Pane<D, V>) -> &mut ComparisonSession<D, V> {
        info!(a = a.id.0, b = b.id.0, "starting comparison");
        self.session
            .insert(ComparisonSession::new(a, b, self.engine.clone(), self.options.clone()))
    }

    /// Returns whether a comparison was running
    pub fn stop(&mut self) -> bool {
        let stopped = self.session.take().is_some();
        if stopped {
            info!("stopped comparison");
        }
        stopped
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ComparisonSession<D, V>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ComparisonSession<D, V>> {
        self.session.as_mut()
    }

    fn participant(&mut self, id: SourceId) -> Option<(&mut ComparisonSession<D, V>, Side)> {
        let session = self.session.as_mut()?;
        let side = session.side_of(id)?;
        Some((session, side))
    }

    pub fn on_edit(&mut self, id: SourceId, event: &EditEvent) -> bool {
        self.participant(id)
            .map(|(session, side)| session.on_edit(side, event))
            .unwrap_or(false)
    }

    pub fn on_save(&mut self, id: SourceId) -> bool {
        match self.participant(id) {
            Some((session, side)) => {
                session.on_save(side);
                true
            }
            None => false,
        }
    }

    pub fn on_scroll(&mut self, id: SourceId) -> bool {
        self.participant(id)
            .map(|(session, side)| session.on_scroll(side))
            .unwrap_or(false)
    }

    /// A compared document was closed
    pub fn on_close(&mut self, id: SourceId) -> bool {
        self.teardown_if_involved(id, "closed")
    }

    /// A compared document was switched out of its view
    pub fn on_switch(&mut self, id: SourceId) -> bool {
        self.teardown_if_involved(id, "switched out")
    }

    fn teardown_if_involved(&mut self, id: SourceId, reason: &str) -> bool {
        if !self.session.as_ref().is_some_and(|s| s.involves(id)) {
            return false;
        }
        debug!(source = id.0, reason, "source left comparison");
        self.stop()
    }

    pub fn goto_change(&mut self, focus: SourceId, direction: Direction) -> Option<ChangeTarget> {
        let (session, side) = self.participant(focus)?;
        session.goto_change(side, direction)
    }

    pub fn merge(&mut self, focus: SourceId, direction: MergeDirection) -> Option<MergeEdit> {
        let (session, side) = self.participant(focus)?;
        session.merge_current(side, direction)
    }
}
