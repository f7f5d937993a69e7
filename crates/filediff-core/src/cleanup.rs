//! Edit-script cleanup passes
//!
//! Raw shortest-edit scripts are correct but often split changes at
//! arbitrary points ("ab" -> "ba" becomes three tiny edits, an added line is
//! reported as "\nfoo" instead of "foo\n"). These passes rewrite a script
//! into an equivalent one whose boundaries a person would pick. Every pass
//! is a pure function of its input.

use crate::change::{DiffOp, OpKind};
use regex::Regex;
use std::sync::LazyLock;

static BLANK_LINE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\r?\n$").expect("blank line end pattern"));
static BLANK_LINE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\r?\n\r?\n").expect("blank line start pattern"));

/// Byte length of the common prefix, backed off to a char boundary
pub(crate) fn common_prefix(a: &str, b: &str) -> usize {
    let mut n = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(n) {
        n -= 1;
    }
    n
}

/// Byte length of the common suffix, backed off to a char boundary
pub(crate) fn common_suffix(a: &str, b: &str) -> usize {
    let mut n = a
        .bytes()
        .rev()
        .zip(b.bytes().rev())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(a.len() - n) {
        n -= 1;
    }
    n
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
///
/// Only whole matches are accepted, so the result always lands on a char
/// boundary in both strings.
pub(crate) fn common_overlap(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let len = a.len().min(b.len());
    let a = &a[a.len() - len..];
    let b = &b[..len];
    if a == b {
        return len;
    }

    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &a[len - length..];
        let Some(found) = find_bytes(b, pattern) else {
            return best;
        };
        length += found;
        if found == 0 || a[len - length..] == b[..length] {
            best = length;
            length += 1;
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Merge same-kind neighbours, drop empty ops, factor shared prefixes and
/// suffixes out of delete/insert pairs and slide single edits over adjacent
/// equalities when that removes an equality.
pub fn cleanup_merge(ops: &mut Vec<DiffOp>) {
    let mut merged: Vec<DiffOp> = Vec::with_capacity(ops.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    for op in ops.drain(..) {
        match op.kind {
            OpKind::Delete => deleted.push_str(&op.text),
            OpKind::Insert => inserted.push_str(&op.text),
            OpKind::Equal if op.text.is_empty() => {}
            OpKind::Equal => flush_edits(&mut merged, &mut deleted, &mut inserted, op.text),
        }
    }
    flush_edits(&mut merged, &mut deleted, &mut inserted, String::new());
    *ops = merged;

    if shift_single_edits(ops) {
        cleanup_merge(ops);
    }
}

fn flush_edits(out: &mut Vec<DiffOp>, deleted: &mut String, inserted: &mut String, mut equal: String) {
    if !deleted.is_empty() && !inserted.is_empty() {
        let prefix = common_prefix(deleted.as_str(), inserted.as_str());
        if prefix > 0 {
            let shared: String = inserted.drain(..prefix).collect();
            deleted.drain(..prefix);
            push_equal(out, &shared);
        }
        let suffix = common_suffix(deleted.as_str(), inserted.as_str());
        if suffix > 0 {
            let shared = inserted.split_off(inserted.len() - suffix);
            deleted.truncate(deleted.len() - suffix);
            equal.insert_str(0, &shared);
        }
    }

    if !deleted.is_empty() {
        out.push(DiffOp::delete(std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        out.push(DiffOp::insert(std::mem::take(inserted)));
    }
    if !equal.is_empty() {
        push_equal(out, &equal);
    }
}

fn push_equal(out: &mut Vec<DiffOp>, text: &str) {
    match out.last_mut() {
        Some(last) if last.kind == OpKind::Equal => last.text.push_str(text),
        _ => out.push(DiffOp::equal(text)),
    }
}

/// `A<ba>C` -> `<ab>aC` and `A<ba>C` -> `Ab<ac>`: a single edit wedged
/// between two equalities is slid over one of them when it ends (or starts)
/// with that equality's full text.
fn shift_single_edits(ops: &mut Vec<DiffOp>) -> bool {
    let mut changed = false;
    let mut pointer = 1;
    while pointer + 1 < ops.len() {
        if ops[pointer - 1].kind == OpKind::Equal && ops[pointer + 1].kind == OpKind::Equal {
            let before = ops[pointer - 1].text.clone();
            let edit = ops[pointer].text.clone();
            let after = ops[pointer + 1].text.clone();

            if edit.ends_with(before.as_str()) {
                ops[pointer].text = format!("{}{}", before, &edit[..edit.len() - before.len()]);
                ops[pointer + 1].text = format!("{}{}", before, after);
                ops.remove(pointer - 1);
                changed = true;
            } else if edit.starts_with(after.as_str()) {
                ops[pointer - 1].text.push_str(&after);
                ops[pointer].text = format!("{}{}", &edit[after.len()..], after);
                ops.remove(pointer + 1);
                changed = true;
            }
        }
        pointer += 1;
    }
    changed
}

/// Remove equalities that are no longer than the edits around them, then
/// align edit boundaries and split overlapping delete/insert pairs.
pub fn cleanup_semantic(ops: &mut Vec<DiffOp>) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut tracking = false;
    let (mut inserted_before, mut deleted_before) = (0usize, 0usize);
    let (mut inserted_after, mut deleted_after) = (0usize, 0usize);

    let mut pointer = 0;
    while pointer < ops.len() {
        match ops[pointer].kind {
            OpKind::Equal => {
                equalities.push(pointer);
                inserted_before = inserted_after;
                deleted_before = deleted_after;
                inserted_after = 0;
                deleted_after = 0;
                tracking = true;
            }
            kind => {
                if kind == OpKind::Insert {
                    inserted_after += ops[pointer].len();
                } else {
                    deleted_after += ops[pointer].len();
                }

                if let Some(&equality) = equalities.last().filter(|_| tracking) {
                    let len = ops[equality].len();
                    if len <= inserted_before.max(deleted_before)
                        && len <= inserted_after.max(deleted_after)
                    {
                        // Replace the equality with a delete/insert of the same text
                        let text = ops[equality].text.clone();
                        ops.insert(equality, DiffOp::delete(text));
                        ops[equality + 1].kind = OpKind::Insert;

                        // The equality before it has to be evaluated again
                        equalities.pop();
                        equalities.pop();
                        inserted_before = 0;
                        deleted_before = 0;
                        inserted_after = 0;
                        deleted_after = 0;
                        tracking = false;
                        changed = true;

                        pointer = equalities.last().map_or(0, |&prev| prev + 1);
                        continue;
                    }
                }
            }
        }
        pointer += 1;
    }

    if changed {
        cleanup_merge(ops);
    }
    cleanup_semantic_lossless(ops);
    eliminate_overlaps(ops);
    normalize(ops);
}

/// Slide single edits surrounded by equalities to the split point with the
/// best boundary score (blank line > line break > sentence end > whitespace >
/// punctuation). The reconstructed texts do not change.
pub fn cleanup_semantic_lossless(ops: &mut Vec<DiffOp>) {
    let mut pointer = 1;
    while pointer + 1 < ops.len() {
        if ops[pointer - 1].kind == OpKind::Equal && ops[pointer + 1].kind == OpKind::Equal {
            let mut before = ops[pointer - 1].text.clone();
            let mut edit = ops[pointer].text.clone();
            let mut after = ops[pointer + 1].text.clone();

            let offset = common_suffix(&before, &edit);
            if offset > 0 {
                let shared = edit[edit.len() - offset..].to_string();
                before.truncate(before.len() - offset);
                edit = format!("{}{}", shared, &edit[..edit.len() - offset]);
                after.insert_str(0, &shared);
            }

            let mut best_score = semantic_score(&before, &edit) + semantic_score(&edit, &after);
            let mut best = (before.clone(), edit.clone(), after.clone());
            while let (Some(head), Some(next)) = (edit.chars().next(), after.chars().next()) {
                if head != next {
                    break;
                }
                let width = head.len_utf8();
                before.push(head);
                edit = format!("{}{}", &edit[width..], head);
                after.drain(..width);

                let score = semantic_score(&before, &edit) + semantic_score(&edit, &after);
                if score >= best_score {
                    best_score = score;
                    best = (before.clone(), edit.clone(), after.clone());
                }
            }

            if ops[pointer - 1].text != best.0 {
                let (best_before, best_edit, best_after) = best;
                ops[pointer].text = best_edit;
                if best_after.is_empty() {
                    ops.remove(pointer + 1);
                } else {
                    ops[pointer + 1].text = best_after;
                }
                if best_before.is_empty() {
                    ops.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    ops[pointer - 1].text = best_before;
                }
            }
        }
        pointer += 1;
    }
}

/// How good a split between `one` and `two` is, from 6 (edge of text) to 0
/// (inside a word).
fn semantic_score(one: &str, two: &str) -> u8 {
    let (Some(last), Some(first)) = (one.chars().next_back(), two.chars().next()) else {
        return 6;
    };

    let non_alnum_last = !last.is_alphanumeric();
    let non_alnum_first = !first.is_alphanumeric();
    let space_last = non_alnum_last && last.is_whitespace();
    let space_first = non_alnum_first && first.is_whitespace();
    let break_last = space_last && matches!(last, '\r' | '\n');
    let break_first = space_first && matches!(first, '\r' | '\n');
    let blank_last = break_last && BLANK_LINE_END.is_match(one);
    let blank_first = break_first && BLANK_LINE_START.is_match(two);

    if blank_last || blank_first {
        5
    } else if break_last || break_first {
        4
    } else if non_alnum_last && !space_last && space_first {
        3
    } else if space_last || space_first {
        2
    } else if non_alnum_last || non_alnum_first {
        1
    } else {
        0
    }
}

/// `<abcxxx><xxxdef>` -> `<abc>xxx<def>` when the overlap is at least half of
/// either edit.
fn eliminate_overlaps(ops: &mut Vec<DiffOp>) {
    let mut pointer = 1;
    while pointer < ops.len() {
        if ops[pointer - 1].kind == OpKind::Delete && ops[pointer].kind == OpKind::Insert {
            let deletion = ops[pointer - 1].text.clone();
            let insertion = ops[pointer].text.clone();
            let forward = common_overlap(&deletion, &insertion);
            let backward = common_overlap(&insertion, &deletion);

            if forward >= backward {
                if forward * 2 >= deletion.len() || forward * 2 >= insertion.len() {
                    ops.insert(pointer, DiffOp::equal(&insertion[..forward]));
                    ops[pointer - 1].text = deletion[..deletion.len() - forward].to_string();
                    ops[pointer + 1].text = insertion[forward..].to_string();
                    pointer += 1;
                }
            } else if backward * 2 >= deletion.len() || backward * 2 >= insertion.len() {
                ops.insert(pointer, DiffOp::equal(&deletion[..backward]));
                ops[pointer - 1] = DiffOp::insert(&insertion[..insertion.len() - backward]);
                ops[pointer + 1] = DiffOp::delete(&deletion[backward..]);
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Drop empty ops and join same-kind neighbours
fn normalize(ops: &mut Vec<DiffOp>) {
    let mut out: Vec<DiffOp> = Vec::with_capacity(ops.len());
    for op in ops.drain(..) {
        if op.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.kind == op.kind => last.text.push_str(&op.text),
            _ => out.push(op),
        }
    }
    *ops = out;
}
