use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::compare::{self, CmpMode};
use crate::meta;
use crate::place::{OutputMode, PlaceError, PlacementAction, Placer};
use crate::plan;
use crate::resolve;
use crate::scan;
use crate::timezone::TimezonePolicy;

/// Everything one run needs, collected from the CLI.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_mode: OutputMode,
    pub cmp_mode: CmpMode,
    pub timezone: TimezonePolicy,
    pub skip_dirs: Vec<String>,
    pub mtime_fallback: bool,
    pub max_suffix: u32,
}

/// Per-outcome counters for the whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub candidates: u64,
    pub created: u64,
    pub linked: u64,
    pub skipped_duplicates: u64,
    pub unsupported: u64,
    pub unresolved: u64,
    pub conflicts: u64,
    pub write_failures: u64,
    pub interrupted: bool,
}

impl RunSummary {
    /// Failures that flip the exit status. Unsupported files are reported
    /// but a stray text file in a photo tree is not a failed run.
    pub fn failure_count(&self) -> u64 {
        self.unresolved + self.conflicts + self.write_failures
    }

    /// What the final `Finished with N error(s)` line reports.
    pub fn reported_errors(&self) -> u64 {
        self.failure_count() + self.unsupported
    }
}

/// Process every candidate file under the source root, one at a time.
/// Only unusable roots are fatal; per-item failures are counted and the
/// run continues.
pub fn run(opts: &SortOptions, interrupt: &AtomicBool) -> anyhow::Result<RunSummary> {
    let source_root = opts
        .source_dir
        .canonicalize()
        .with_context(|| format!("cannot read source directory {}", opts.source_dir.display()))?;
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("cannot create output directory {}", opts.output_dir.display()))?;
    let output_root = opts
        .output_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve output directory {}", opts.output_dir.display()))?;

    let scanned = scan::scan(&source_root, &opts.skip_dirs);
    let mut summary = RunSummary {
        candidates: scanned.items.len() as u64,
        unsupported: scanned.unsupported,
        ..Default::default()
    };

    let mut placer = Placer::new(
        output_root,
        opts.output_mode,
        compare::comparator(opts.cmp_mode),
        opts.max_suffix,
    );

    let pb = ProgressBar::new(scanned.items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} sorting files")
            .unwrap(),
    );

    for item in &scanned.items {
        // an interrupt stops between files, never mid-file
        if interrupt.load(Ordering::SeqCst) {
            summary.interrupted = true;
            break;
        }
        pb.inc(1);

        let raw = meta::read(&item.source_path, item.kind, opts.mtime_fallback);
        let resolved = match resolve::resolve(&raw, opts.timezone) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::error!("Failed to extract timestamp for {}: {}", item.source_path.display(), e);
                summary.unresolved += 1;
                continue;
            }
        };
        log::debug!(
            "resolved {} ({} bytes) -> {} via {} [{}]",
            item.source_path.display(),
            item.size,
            resolved.instant,
            resolved.method.as_str(),
            resolved.source_zone
        );

        let plan = plan::plan(&resolved, item.kind, &item.source_path);
        match placer.place(&item.source_path, &plan, resolved.instant) {
            Ok(outcome) => {
                match outcome.action {
                    PlacementAction::Created => summary.created += 1,
                    PlacementAction::Linked => summary.linked += 1,
                    PlacementAction::SkippedDuplicate => summary.skipped_duplicates += 1,
                }
                log::info!(
                    "{} -> {} ({:?})",
                    item.source_path.display(),
                    outcome.path.display(),
                    outcome.action
                );
            }
            Err(e @ PlaceError::SuffixesExhausted { .. }) => {
                log::error!("Placement conflict for {}: {}", item.source_path.display(), e);
                summary.conflicts += 1;
            }
            Err(PlaceError::Io(e)) => {
                log::error!("File operation failed: {} -> {}", item.source_path.display(), e);
                summary.write_failures += 1;
            }
        }
    }
    pb.finish_and_clear();

    Ok(summary)
}
