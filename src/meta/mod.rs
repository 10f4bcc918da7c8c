pub mod exif;
pub mod video;

use std::path::Path;

use chrono::{DateTime, FixedOffset, Local};

use crate::media::MediaKind;

/// Where the raw capture timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Exif,
    VideoTrack,
    FileMtime,
}

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoord {
    pub lat: f64,
    pub lon: f64,
}

impl GpsCoord {
    /// Accept only coordinates inside the valid ranges.
    pub fn validated(lat: f64, lon: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(GpsCoord { lat, lon })
        } else {
            None
        }
    }
}

/// Raw, unresolved facts pulled out of one media file. Absent fields mean
/// "could not extract"; extraction itself never fails.
#[derive(Debug, Clone, Default)]
pub struct RawMetadata {
    /// Capture timestamp as the file reported it, unparsed
    pub raw_timestamp: Option<String>,
    /// Explicit UTC offset if the metadata itself carries one
    pub embedded_offset: Option<FixedOffset>,
    pub gps: Option<GpsCoord>,
    pub source: Option<TimestampSource>,
}

/// Read metadata for one file, synthesizing a timestamp from the file's
/// mtime when the metadata has none and the fallback is enabled.
pub fn read(path: &Path, kind: MediaKind, mtime_fallback: bool) -> RawMetadata {
    let mut meta = match kind {
        MediaKind::Image | MediaKind::RawImage => exif::read_image(path),
        MediaKind::Video => video::read_video(path),
    };
    if meta.raw_timestamp.is_none() && mtime_fallback {
        if let Some((raw, offset)) = mtime_stamp(path) {
            log::info!("Used mtime fallback for {}: {} {}", path.display(), raw, offset);
            meta.raw_timestamp = Some(raw);
            meta.embedded_offset = Some(offset);
            meta.source = Some(TimestampSource::FileMtime);
        }
    }
    meta
}

/// The file's modification time as local wall clock plus that instant's
/// UTC offset, so the true instant survives resolution.
fn mtime_stamp(path: &Path) -> Option<(String, FixedOffset)> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let local: DateTime<Local> = modified.into();
    Some((local.format("%Y:%m:%d %H:%M:%S").to_string(), *local.offset()))
}
