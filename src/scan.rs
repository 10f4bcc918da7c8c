use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::media::{self, MediaItem};

pub struct ScanResult {
    /// Candidate files in sorted source-path order
    pub items: Vec<MediaItem>,
    /// Files whose extension maps to no known media kind
    pub unsupported: u64,
}

fn matches_skip_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    skip_dirs.iter().any(|skip| skip.eq_ignore_ascii_case(&name))
}

/// Collect candidate media files under `root`, pruning skip-listed
/// directories. Items come back sorted by path so later disambiguation
/// never depends on directory-iteration order.
pub fn scan(root: &Path, skip_dirs: &[String]) -> ScanResult {
    let mut items = Vec::new();
    let mut unsupported = 0u64;

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if matches_skip_dir(entry, skip_dirs) {
            log::warn!(
                "Skipped '{}' because its name matches a skip directory (timestamps there may be altered or missing)",
                entry.path().display()
            );
            false
        } else {
            true
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        // symlinks are not candidates; only regular files
        if !entry.file_type().is_file() {
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::debug!("cannot stat {}: {}", entry.path().display(), e);
                continue;
            }
        };
        // sidecar stubs
        if size <= 1 {
            log::debug!("ignoring tiny file {}", entry.path().display());
            continue;
        }
        match media::classify(entry.path()) {
            Some(kind) => items.push(MediaItem {
                source_path: entry.into_path(),
                kind,
                size,
            }),
            None => {
                log::error!("Unsupported file type skipped: {}", entry.path().display());
                unsupported += 1;
            }
        }
    }

    items.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    ScanResult { items, unsupported }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use std::fs;

    fn touch(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_collects_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("z/later.jpg"), b"zz");
        touch(&dir.path().join("a/early.mp4"), b"aa");
        touch(&dir.path().join("mid.cr2"), b"mm");

        let result = scan(dir.path(), &[]);
        let names: Vec<_> = result
            .items
            .iter()
            .map(|i| i.source_path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                Path::new("a/early.mp4").to_path_buf(),
                Path::new("mid.cr2").to_path_buf(),
                Path::new("z/later.jpg").to_path_buf(),
            ]
        );
        assert_eq!(result.items[0].kind, MediaKind::Video);
        assert_eq!(result.items[1].kind, MediaKind::RawImage);
        assert_eq!(result.unsupported, 0);
    }

    #[test]
    fn test_skip_dirs_prune_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("keep/a.jpg"), b"aa");
        touch(&dir.path().join("LINE/b.jpg"), b"bb");
        touch(&dir.path().join("LINE/nested/c.jpg"), b"cc");

        let result = scan(dir.path(), &["line".to_string()]);
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0].source_path.ends_with("keep/a.jpg"));
    }

    #[test]
    fn test_tiny_and_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("stub.jpg"), b"x");
        touch(&dir.path().join("notes.txt"), b"hello");
        touch(&dir.path().join("real.jpg"), b"real bytes");

        let result = scan(dir.path(), &[]);
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0].source_path.ends_with("real.jpg"));
        assert_eq!(result.unsupported, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_not_candidates() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("real.jpg"), b"real bytes");
        std::os::unix::fs::symlink(dir.path().join("real.jpg"), dir.path().join("alias.jpg")).unwrap();

        let result = scan(dir.path(), &[]);
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0].source_path.ends_with("real.jpg"));
    }
}
