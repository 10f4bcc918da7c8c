use std::path::{Path, PathBuf};

/// Broad media categories; raw-format files land in a `raw/` subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    RawImage,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::RawImage => "raw",
        }
    }
}

/// One candidate file found under the source root.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Absolute path of the source file
    pub source_path: PathBuf,
    pub kind: MediaKind,
    /// File size in bytes
    pub size: u64,
}

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif"];

const VIDEO_EXTS: &[&str] = &[
    "mp4", "mov", "m4v", "3gp", "3g2", "avi", "mts", "mkv", "flv", "m2ts", "mpg", "vob", "wmv",
];

/// Camera raw formats plus the AVCHD/DVD sidecar files that travel with them.
const RAW_EXTS: &[&str] = &[
    "arw", "mrw", "cr2", "cr3", "dng", "nef", "raf", "orf", "rw2", "pef", "srw", "x3f",
    "cpi", "thm", "clpi", "mpls", "bdmv", "spi", "spd", "bup", "ifo", "xml", "xmz", "trl", "mht",
];

/// Classify a file by extension, falling back to a MIME guess for
/// extensions outside the known sets (HEIC, WebM and friends).
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
    let ext = ext.as_str();
    if RAW_EXTS.contains(&ext) {
        return Some(MediaKind::RawImage);
    }
    if VIDEO_EXTS.contains(&ext) {
        return Some(MediaKind::Video);
    }
    if IMAGE_EXTS.contains(&ext) {
        return Some(MediaKind::Image);
    }
    match mime_guess::from_ext(ext).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => Some(MediaKind::Image),
        Some(mime) if mime.type_() == mime_guess::mime::VIDEO => Some(MediaKind::Video),
        _ => None,
    }
}
