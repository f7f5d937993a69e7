//! Output formats for a comparison

use filediff_core::{ChangeBlock, ChangeKind, DiffResult, FileDiff, LineCorrespondence, Padding, Side};
use serde::Serialize;
use std::io::{self, Write};
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// Line number plus text, or `None` for a padding row
type Row<'a> = Option<(usize, &'a str)>;

const GUTTER_WIDTH: usize = 7;

fn kind_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Addition => "addition",
        ChangeKind::Deletion => "deletion",
        ChangeKind::Modification => "modification",
    }
}

fn kind_marker(kind: ChangeKind) -> char {
    match kind {
        ChangeKind::Addition => '+',
        ChangeKind::Deletion => '-',
        ChangeKind::Modification => '~',
    }
}

/// 1-based, inclusive line range for display
fn range_label(lines: Range<usize>) -> String {
    match lines.len() {
        0 => format!("after {}", lines.start),
        1 => format!("{}", lines.start + 1),
        _ => format!("{}-{}", lines.start + 1, lines.end),
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("1 {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn summary(result: &DiffResult) -> String {
    format!(
        "{}: {}, {}, {}",
        plural(result.blocks.len(), "change"),
        plural(result.additions, "addition"),
        plural(result.deletions, "deletion"),
        plural(result.modifications, "modification"),
    )
}

fn slice<'a, 'b>(lines: &'b [&'a str], range: Range<usize>) -> &'b [&'a str] {
    let end = range.end.min(lines.len());
    let start = range.start.min(end);
    &lines[start..end]
}

/// Every change block with the lines it covers on each side
pub fn write_text(out: &mut impl Write, diff: &FileDiff) -> io::Result<()> {
    let result = &diff.result;
    if result.is_identical() {
        return writeln!(out, "Files {} and {} are identical", diff.old_path, diff.new_path);
    }

    writeln!(out, "--- {}", diff.old_path)?;
    writeln!(out, "+++ {}", diff.new_path)?;

    let old_lines: Vec<&str> = diff.old_text.lines().collect();
    let new_lines: Vec<&str> = diff.new_text.lines().collect();
    for (i, block) in result.blocks.iter().enumerate() {
        writeln!(
            out,
            "@@ {} {}: A {} B {} @@",
            i + 1,
            kind_label(block.kind),
            range_label(block.lines(Side::A)),
            range_label(block.lines(Side::B)),
        )?;
        for line in slice(&old_lines, block.lines(Side::A)) {
            writeln!(out, "-{line}")?;
        }
        for line in slice(&new_lines, block.lines(Side::B)) {
            writeln!(out, "+{line}")?;
        }
    }

    writeln!(out, "{}", summary(result))
}

/// Both files in aligned columns, with blank rows standing in for padding
pub fn write_side_by_side(out: &mut impl Write, diff: &FileDiff, width: usize) -> io::Result<()> {
    let blocks = &diff.result.blocks;
    let correspondence = LineCorrespondence::new(blocks);
    let left = visual_rows(&diff.old_text, correspondence.padding(Side::A));
    let right = visual_rows(&diff.new_text, correspondence.padding(Side::B));

    for row in 0..left.len().max(right.len()) {
        let l = cell(left.get(row).copied().flatten(), Side::A, blocks, width);
        let r = cell(right.get(row).copied().flatten(), Side::B, blocks, width);
        writeln!(out, "{l} | {}", r.trim_end())?;
    }
    Ok(())
}

fn visual_rows<'a>(text: &'a str, padding: &[Padding]) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    let mut pending = padding.iter().peekable();

    for (line, content) in text.lines().enumerate() {
        while let Some(p) = pending.next_if(|p| p.line <= line) {
            rows.extend(std::iter::repeat(None).take(p.count));
        }
        rows.push(Some((line, content)));
    }
    // padding below the last displayed line
    for p in pending {
        rows.extend(std::iter::repeat(None).take(p.count));
    }

    rows
}

fn cell(row: Row, side: Side, blocks: &[ChangeBlock], width: usize) -> String {
    match row {
        None => " ".repeat(width + GUTTER_WIDTH),
        Some((line, text)) => {
            let marker = blocks
                .iter()
                .find(|b| b.contains_line(side, line))
                .map_or(' ', |b| kind_marker(b.kind));
            format!("{:>4} {} {}", line + 1, marker, fit(text, width))
        }
    }
}

/// Truncate or pad `text` to exactly `width` display columns
fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let ch = if ch == '\t' { ' ' } else { ch };
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    left: &'a str,
    right: &'a str,
    identical: bool,
    additions: usize,
    deletions: usize,
    modifications: usize,
    blocks: &'a [ChangeBlock],
}

pub fn write_json(out: &mut impl Write, diff: &FileDiff) -> io::Result<()> {
    let result = &diff.result;
    let report = JsonReport {
        left: &diff.old_path,
        right: &diff.new_path,
        identical: result.is_identical(),
        additions: result.additions,
        deletions: result.deletions,
        modifications: result.modifications,
        blocks: &result.blocks,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
