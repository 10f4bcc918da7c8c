use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::compare::ContentCompare;
use crate::plan::DestinationPlan;

/// How a placed file is materialized at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Relative symbolic link back to the source (falls back to copy)
    Link,
    /// Copy, stamped with the capture instant as mtime
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementAction {
    Created,
    Linked,
    SkippedDuplicate,
}

/// What happened to one file, and where.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    pub action: PlacementAction,
    pub path: PathBuf,
    /// Disambiguation suffix that ended up used; 0 means none
    pub suffix: u32,
}

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("no free name for stem {stem:?} within {max} suffixes")]
    SuffixesExhausted { stem: String, max: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Places files under the output root without ever overwriting distinct
/// content. Owns the claimed-path index for the whole run, so it must see
/// every file the run processes, in order.
pub struct Placer {
    output_root: PathBuf,
    mode: OutputMode,
    cmp: Box<dyn ContentCompare>,
    max_suffix: u32,
    claimed: HashSet<PathBuf>,
    created_dirs: HashSet<PathBuf>,
}

impl Placer {
    pub fn new(output_root: PathBuf, mode: OutputMode, cmp: Box<dyn ContentCompare>, max_suffix: u32) -> Self {
        Placer {
            output_root,
            mode,
            cmp,
            max_suffix,
            claimed: HashSet::new(),
            created_dirs: HashSet::new(),
        }
    }

    /// Walk suffixes from the bare stem upward until the source either
    /// matches an occupant (duplicate) or a free name appears.
    pub fn place(
        &mut self,
        source: &Path,
        plan: &DestinationPlan,
        instant: DateTime<FixedOffset>,
    ) -> Result<PlacementOutcome, PlaceError> {
        for suffix in 0..=self.max_suffix {
            let dest = self.output_root.join(plan.candidate(suffix));
            // symlink_metadata so a broken link still occupies its name
            let occupied = self.claimed.contains(&dest) || fs::symlink_metadata(&dest).is_ok();
            if occupied {
                // a broken link has no content to compare; treat as distinct
                let same = fs::metadata(&dest).is_ok() && self.cmp.same(source, &dest)?;
                if same {
                    log::debug!("{} already placed as {}", source.display(), dest.display());
                    return Ok(PlacementOutcome {
                        action: PlacementAction::SkippedDuplicate,
                        path: dest,
                        suffix,
                    });
                }
                continue;
            }
            let parent = dest.parent().unwrap_or(&self.output_root).to_path_buf();
            self.ensure_dir(&parent)?;
            let action = self.materialize(source, &dest, instant)?;
            self.claimed.insert(dest.clone());
            return Ok(PlacementOutcome { action, path: dest, suffix });
        }
        Err(PlaceError::SuffixesExhausted {
            stem: plan.stem.clone(),
            max: self.max_suffix,
        })
    }

    fn ensure_dir(&mut self, dir: &Path) -> io::Result<()> {
        if !self.created_dirs.contains(dir) {
            fs::create_dir_all(dir)?;
            self.created_dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn materialize(
        &self,
        source: &Path,
        dest: &Path,
        instant: DateTime<FixedOffset>,
    ) -> io::Result<PlacementAction> {
        match self.mode {
            OutputMode::Copy => {
                copy_with_mtime(source, dest, instant)?;
                Ok(PlacementAction::Created)
            }
            OutputMode::Link => {
                let parent = dest.parent().unwrap_or(Path::new(""));
                let rel = pathdiff::diff_paths(source, parent).unwrap_or_else(|| source.to_path_buf());
                match make_symlink(&rel, dest) {
                    Ok(()) => Ok(PlacementAction::Linked),
                    Err(e) => {
                        log::warn!("symlink failed for {}, falling back to copy: {}", dest.display(), e);
                        copy_with_mtime(source, dest, instant)?;
                        Ok(PlacementAction::Created)
                    }
                }
            }
        }
    }
}

fn copy_with_mtime(source: &Path, dest: &Path, instant: DateTime<FixedOffset>) -> io::Result<()> {
    fs::copy(source, dest)?;
    let ft = filetime::FileTime::from_unix_time(instant.timestamp(), 0);
    filetime::set_file_mtime(dest, ft).ok();
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn make_symlink(target: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, dest)
}
