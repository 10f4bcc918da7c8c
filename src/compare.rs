use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Which duplicate-check strategy the run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CmpMode {
    /// Size precheck plus raw byte comparison (fast)
    Filecmp,
    /// SHA-256 digest comparison (accurate)
    Hash,
}

/// Decides whether two files hold the same content. The placement engine
/// only sees this seam, never the strategy behind it.
pub trait ContentCompare {
    fn same(&self, a: &Path, b: &Path) -> io::Result<bool>;
}

pub fn comparator(mode: CmpMode) -> Box<dyn ContentCompare> {
    match mode {
        CmpMode::Filecmp => Box::new(ByteCompare),
        CmpMode::Hash => Box::new(HashCompare),
    }
}

/// Size precheck, then a buffered byte-for-byte read of both files.
pub struct ByteCompare;

impl ContentCompare for ByteCompare {
    fn same(&self, a: &Path, b: &Path) -> io::Result<bool> {
        if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
            log::debug!("Compared (filecmp): {} vs {} -> DIFFERENT (size)", a.display(), b.display());
            return Ok(false);
        }
        let mut ra = BufReader::new(File::open(a)?);
        let mut rb = BufReader::new(File::open(b)?);
        let mut buf_a = [0u8; 8192];
        let mut buf_b = [0u8; 8192];
        loop {
            let n = ra.read(&mut buf_a)?;
            if n == 0 {
                let same = rb.read(&mut buf_b)? == 0;
                log::debug!(
                    "Compared (filecmp): {} vs {} -> {}",
                    a.display(),
                    b.display(),
                    if same { "SAME" } else { "DIFFERENT" }
                );
                return Ok(same);
            }
            rb.read_exact(&mut buf_b[..n])?;
            if buf_a[..n] != buf_b[..n] {
                log::debug!("Compared (filecmp): {} vs {} -> DIFFERENT", a.display(), b.display());
                return Ok(false);
            }
        }
    }
}

/// Streaming SHA-256 of both files, compared as hex digests.
pub struct HashCompare;

impl ContentCompare for HashCompare {
    fn same(&self, a: &Path, b: &Path) -> io::Result<bool> {
        let hash_a = digest(a)?;
        let hash_b = digest(b)?;
        log::debug!(
            "Compared (hash): {} [{}] vs {} [{}] -> {}",
            a.display(),
            hash_a,
            b.display(),
            hash_b,
            if hash_a == hash_b { "SAME" } else { "DIFFERENT" }
        );
        Ok(hash_a == hash_b)
    }
}

fn digest(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut reader = BufReader::new(File::open(path)?);
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
