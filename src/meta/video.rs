use std::path::Path;

use chrono::{DateTime, FixedOffset};
use nom_exif::{EntryValue, LatLng, MediaParser, MediaSource, TrackInfo, TrackInfoTag};

use super::{GpsCoord, RawMetadata, TimestampSource};

/// Pull creation time and GPS out of a video container's track metadata.
/// Containers the parser does not understand degrade to absent fields.
pub fn read_video(path: &Path) -> RawMetadata {
    let mut meta = RawMetadata::default();
    let ms = match MediaSource::file_path(path) {
        Ok(ms) => ms,
        Err(e) => {
            log::debug!("cannot open {} for track metadata: {}", path.display(), e);
            return meta;
        }
    };
    if !ms.has_track() {
        log::debug!("no track metadata in {}", path.display());
        return meta;
    }
    let mut parser = MediaParser::new();
    let info: TrackInfo = match parser.parse(ms) {
        Ok(info) => info,
        Err(e) => {
            log::debug!("track metadata parse failed for {}: {}", path.display(), e);
            return meta;
        }
    };

    if let Some(dt) = info.get(TrackInfoTag::CreateDate).and_then(entry_time) {
        // Report the wall clock in the container's own offset (usually UTC)
        meta.raw_timestamp = Some(dt.format("%Y:%m:%d %H:%M:%S").to_string());
        meta.embedded_offset = Some(*dt.offset());
        meta.source = Some(TimestampSource::VideoTrack);
    }
    if let Some(gps) = info.get_gps_info() {
        let lat = latlng_to_decimal(&gps.latitude, gps.latitude_ref);
        let lon = latlng_to_decimal(&gps.longitude, gps.longitude_ref);
        meta.gps = GpsCoord::validated(lat, lon);
    }
    meta
}

fn entry_time(value: &EntryValue) -> Option<DateTime<FixedOffset>> {
    match value {
        EntryValue::Time(t) => Some(*t),
        other => DateTime::parse_from_rfc3339(other.to_string().trim().trim_matches('"')).ok(),
    }
}

/// Convert a LatLng (3 rationals: deg, min, sec) to signed decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0 .0 as f64 / latlng.0 .1 as f64;
    let minutes = latlng.1 .0 as f64 / latlng.1 .1 as f64;
    let seconds = latlng.2 .0 as f64 / latlng.2 .1 as f64;
    let mut coord = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == 'S' || reference == 'W' {
        coord = -coord;
    }
    coord
}
