//! Diff computation engine

use crate::change::{ChangeBlock, ChangeKind, DiffOp};
use crate::classify::classify_with_deadline;
use crate::cleanup::{self, common_prefix, common_suffix};
use crate::lines::LineIndex;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
}

/// Tuning knobs for the differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Combined size of both inputs in bytes above which the differ reports a
    /// whole-text replacement instead of searching for an edit script
    pub max_input_bytes: usize,
    /// Wall-clock budget for one diff in milliseconds (0 = unbounded)
    pub timeout_ms: u64,
    /// Both inputs must be longer than this many bytes before lines are
    /// matched first and only mismatched runs are diffed by character
    pub line_mode_threshold: usize,
    /// Shift and merge edits onto word and line boundaries
    pub semantic_cleanup: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: 4 * 1024 * 1024,
            timeout_ms: 1000,
            line_mode_threshold: 100,
            semantic_cleanup: true,
        }
    }
}

/// Result of comparing two texts
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    /// Character-level edit script
    pub ops: Vec<DiffOp>,
    /// Line-aligned change blocks in document order
    pub blocks: Vec<ChangeBlock>,
    pub additions: usize,
    pub deletions: usize,
    pub modifications: usize,
}

impl DiffResult {
    fn new(ops: Vec<DiffOp>, blocks: Vec<ChangeBlock>) -> Self {
        let count = |kind| blocks.iter().filter(|b| b.kind == kind).count();
        let additions = count(ChangeKind::Addition);
        let deletions = count(ChangeKind::Deletion);
        let modifications = count(ChangeKind::Modification);
        Self {
            ops,
            blocks,
            additions,
            deletions,
            modifications,
        }
    }

    /// Check if the two texts were identical
    pub fn is_identical(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A comparison of two files on disk
#[derive(Debug, Clone, Serialize)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub old_text: String,
    pub new_text: String,
    pub result: DiffResult,
}

/// The main diff engine
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn with_max_input_bytes(mut self, bytes: usize) -> Self {
        self.options.max_input_bytes = bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_line_mode_threshold(mut self, bytes: usize) -> Self {
        self.options.line_mode_threshold = bytes;
        self
    }

    pub fn with_semantic_cleanup(mut self, enabled: bool) -> Self {
        self.options.semantic_cleanup = enabled;
        self
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compute the edit script turning `old` into `new`
    pub fn diff(&self, old: &str, new: &str) -> Vec<DiffOp> {
        if old == new {
            return if old.is_empty() {
                Vec::new()
            } else {
                vec![DiffOp::equal(old)]
            };
        }

        if self.exceeds_ceiling(old, new) {
            warn!(
                old_len = old.len(),
                new_len = new.len(),
                limit = self.options.max_input_bytes,
                "input exceeds diff size ceiling, reporting whole-text replacement"
            );
            return replace_all(old, new);
        }

        let mut ops = self.diff_main(old, new, self.deadline());
        if self.options.semantic_cleanup {
            cleanup::cleanup_semantic(&mut ops);
        }
        ops
    }

    /// Diff two texts and classify the result into change blocks
    pub fn compare(&self, old: &str, new: &str) -> DiffResult {
        let ops = self.diff(old, new);
        let blocks = if old != new && self.exceeds_ceiling(old, new) {
            vec![whole_text_block(old, new)]
        } else {
            classify_with_deadline(&ops, old, new, self.deadline())
        };
        debug!(ops = ops.len(), blocks = blocks.len(), "compared texts");
        DiffResult::new(ops, blocks)
    }

    /// Compare two files
    pub fn compare_files(&self, old_path: &Path, new_path: &Path) -> Result<FileDiff, DiffError> {
        let old_text = std::fs::read_to_string(old_path)?;
        let new_text = std::fs::read_to_string(new_path)?;

        let result = self.compare(&old_text, &new_text);

        Ok(FileDiff {
            old_path: old_path.to_string_lossy().to_string(),
            new_path: new_path.to_string_lossy().to_string(),
            old_text,
            new_text,
            result,
        })
    }

    fn exceeds_ceiling(&self, old: &str, new: &str) -> bool {
        old.len().saturating_add(new.len()) > self.options.max_input_bytes
    }

    fn deadline(&self) -> Option<Instant> {
        (self.options.timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(self.options.timeout_ms))
    }

    fn diff_main(&self, old: &str, new: &str, deadline: Option<Instant>) -> Vec<DiffOp> {
        let prefix = common_prefix(old, new);
        let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);
        let suffix = common_suffix(old_rest, new_rest);
        let old_mid = &old_rest[..old_rest.len() - suffix];
        let new_mid = &new_rest[..new_rest.len() - suffix];

        let mut ops = Vec::new();
        if prefix > 0 {
            ops.push(DiffOp::equal(&old[..prefix]));
        }
        ops.extend(self.diff_middle(old_mid, new_mid, deadline));
        if suffix > 0 {
            ops.push(DiffOp::equal(&old_rest[old_rest.len() - suffix..]));
        }

        cleanup::cleanup_merge(&mut ops);
        ops
    }

    fn diff_middle(&self, old: &str, new: &str, deadline: Option<Instant>) -> Vec<DiffOp> {
        if old.is_empty() || new.is_empty() {
            return replace_all(old, new);
        }

        let threshold = self.options.line_mode_threshold;
        if old.len() > threshold && new.len() > threshold {
            diff_lines(old, new, deadline)
        } else {
            diff_chars(old, new, deadline)
        }
    }
}

/// Compute the edit script with default options
pub fn diff(old: &str, new: &str) -> Vec<DiffOp> {
    DiffEngine::default().diff(old, new)
}

fn replace_all(old: &str, new: &str) -> Vec<DiffOp> {
    let mut ops = Vec::with_capacity(2);
    if !old.is_empty() {
        ops.push(DiffOp::delete(old));
    }
    if !new.is_empty() {
        ops.push(DiffOp::insert(new));
    }
    ops
}

/// Every line of both texts in one modification
fn whole_text_block(old: &str, new: &str) -> ChangeBlock {
    let a_lines = LineIndex::new(old).line_count();
    let b_lines = LineIndex::new(new).line_count();
    ChangeBlock::new(0..a_lines, 0..b_lines)
}

/// Myers over whole lines, then over characters inside each mismatched run
fn diff_lines(old: &str, new: &str, deadline: Option<Instant>) -> Vec<DiffOp> {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();

    let mut ops = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    for op in similar::capture_diff_slices_deadline(Algorithm::Myers, &old_lines, &new_lines, deadline) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                flush_run(&mut ops, &mut deleted, &mut inserted, deadline);
                ops.push(DiffOp::equal(old_lines[old_range].concat()));
            }
            DiffTag::Delete => deleted.extend(old_lines[old_range].iter().copied()),
            DiffTag::Insert => inserted.extend(new_lines[new_range].iter().copied()),
            DiffTag::Replace => {
                deleted.extend(old_lines[old_range].iter().copied());
                inserted.extend(new_lines[new_range].iter().copied());
            }
        }
    }
    flush_run(&mut ops, &mut deleted, &mut inserted, deadline);

    ops
}

fn flush_run(ops: &mut Vec<DiffOp>, deleted: &mut String, inserted: &mut String, deadline: Option<Instant>) {
    if !deleted.is_empty() && !inserted.is_empty() {
        ops.extend(diff_chars(deleted, inserted, deadline));
    } else {
        ops.extend(replace_all(deleted, inserted));
    }
    deleted.clear();
    inserted.clear();
}

fn diff_chars(old: &str, new: &str, deadline: Option<Instant>) -> Vec<DiffOp> {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut ops = Vec::new();
    for op in similar::capture_diff_slices_deadline(Algorithm::Myers, &old_chars, &new_chars, deadline) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old_text: String = old_chars[old_range].iter().collect();
        let new_text: String = new_chars[new_range].iter().collect();
        match tag {
            DiffTag::Equal => ops.push(DiffOp::equal(old_text)),
            DiffTag::Delete => ops.push(DiffOp::delete(old_text)),
            DiffTag::Insert => ops.push(DiffOp::insert(new_text)),
            DiffTag::Replace => {
                ops.push(DiffOp::delete(old_text));
                ops.push(DiffOp::insert(new_text));
            }
        }
    }
    ops
}
