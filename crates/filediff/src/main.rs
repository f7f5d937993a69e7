//! filediff - compare two files and merge changes between them

mod config;
mod report;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use config::Config;
use filediff_core::{
    Comparator, DiffEngine, DiffOptions, FileDiff, MergeDirection, Pane, SourceId, TextBuffer, ViewState,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Changed lines grouped by change
    Text,
    /// Both files in aligned columns
    SideBySide,
    /// Machine-readable change list
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Copy the left file's version into the right file
    LeftToRight,
    /// Copy the right file's version into the left file
    RightToLeft,
}

impl From<Direction> for MergeDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::LeftToRight => MergeDirection::LeftToRight,
            Direction::RightToLeft => MergeDirection::RightToLeft,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "filediff")]
#[command(version, about = "Compare two files and merge changes between them")]
#[command(after_help = "Exit status is 0 if the files are identical, 1 if they differ, 2 on error.")]
struct Args {
    /// Left (A) file
    left: PathBuf,

    /// Right (B) file
    right: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Column width per side for side-by-side output
    #[arg(short, long)]
    width: Option<usize>,

    /// Merge the Nth change (numbered from 1, as listed by the text format)
    #[arg(short, long, value_name = "N")]
    merge: Option<usize>,

    /// Which way to merge
    #[arg(short, long, value_enum, default_value_t = Direction::LeftToRight)]
    direction: Direction,

    /// Write the merged file back instead of printing it
    #[arg(long, requires = "merge")]
    write: bool,

    /// Give up on inputs whose combined size exceeds this many bytes
    #[arg(long, value_name = "BYTES")]
    max_input_bytes: Option<usize>,

    /// Time budget for the diff in milliseconds (0 = unbounded)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Keep raw edit boundaries instead of aligning them to words and lines
    #[arg(long)]
    no_semantic: bool,

    /// Config file (default: ~/.config/filediff/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Command-line flags override config file values
    fn diff_options(&self, mut options: DiffOptions) -> DiffOptions {
        if let Some(bytes) = self.max_input_bytes {
            options.max_input_bytes = bytes;
        }
        if let Some(ms) = self.timeout_ms {
            options.timeout_ms = ms;
        }
        if self.no_semantic {
            options.semantic_cleanup = false;
        }
        options
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            eprintln!("filediff: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the files differ (after merging, if asked to merge)
fn run(args: &Args) -> Result<bool> {
    let config = Config::load(args.config.as_deref())?;
    let engine = DiffEngine::with_options(args.diff_options(config.diff.clone()));
    debug!(options = ?engine.options(), "diff options");

    let diff = engine
        .compare_files(&args.left, &args.right)
        .with_context(|| format!("Failed to compare {} and {}", args.left.display(), args.right.display()))?;

    if let Some(number) = args.merge {
        return merge(args, engine, &config, diff, number);
    }

    let mut out = std::io::stdout().lock();
    match args.format {
        Format::Text => report::write_text(&mut out, &diff)?,
        Format::SideBySide => {
            let width = args.width.unwrap_or(config.output.width);
            report::write_side_by_side(&mut out, &diff, width)?
        }
        Format::Json => report::write_json(&mut out, &diff)?,
    }

    Ok(!diff.result.is_identical())
}

fn merge(args: &Args, engine: DiffEngine, config: &Config, diff: FileDiff, number: usize) -> Result<bool> {
    if number == 0 {
        bail!("changes are numbered from 1");
    }
    let count = diff.result.blocks.len();
    let direction = MergeDirection::from(args.direction);

    let pane = |id, text: String| {
        Pane::new(
            SourceId(id),
            Rc::new(RefCell::new(TextBuffer::new(text))),
            Rc::new(RefCell::new(ViewState::new())),
        )
    };
    let left = pane(0, diff.old_text);
    let right = pane(1, diff.new_text);

    let mut comparator = Comparator::new(engine, config.session.clone());
    let session = comparator.start(left.clone(), right.clone());
    session
        .merge_block(number - 1, direction)
        .ok_or_else(|| anyhow!("change {number} does not exist ({} found)", plural_changes(count)))?;
    let remaining = session.blocks().len();

    let (target, path): (&Pane<_, _>, &Path) = match direction {
        MergeDirection::LeftToRight => (&right, &args.right),
        MergeDirection::RightToLeft => (&left, &args.left),
    };
    let merged = target.document.borrow().as_str().to_string();

    if args.write {
        std::fs::write(path, &merged).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), remaining, "wrote merged file");
    } else {
        print!("{merged}");
    }

    Ok(remaining > 0)
}

fn plural_changes(count: usize) -> String {
    if count == 1 {
        "1 change".to_string()
    } else {
        format!("{count} changes")
    }
}
