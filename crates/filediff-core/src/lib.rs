//! Filediff Core - two-way text comparison and merge engine
//!
//! This library diffs two texts, groups the edit script into line-aligned
//! change blocks, and keeps two views of the texts aligned while the user
//! navigates between changes and merges them across.

pub mod change;
pub mod classify;
pub mod cleanup;
pub mod correspondence;
pub mod diff;
pub mod document;
pub mod lines;
pub mod merge;
pub mod navigate;
pub mod session;

pub use change::{
    invert, source_text, target_text, ChangeBlock, ChangeKind, DiffOp, MergeDirection, OpKind, Side,
};
pub use classify::classify;
pub use correspondence::{LineCorrespondence, Padding};
pub use diff::{diff, DiffEngine, DiffError, DiffOptions, DiffResult, FileDiff};
pub use document::{Document, EditEvent, EditKind, TextBuffer, ViewState, Viewport};
pub use lines::LineIndex;
pub use merge::{block_at, plan_merge, MergeEdit};
pub use navigate::{ChangeTarget, Direction, Navigator};
pub use session::{Comparator, ComparisonSession, Pane, SessionOptions, Shared, SourceId};
