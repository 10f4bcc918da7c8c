use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag, Value};

use super::{GpsCoord, RawMetadata, TimestampSource};
use crate::timezone;

/// Datetime tags in priority order, each paired with the offset tag that
/// annotates it.
const DATETIME_TAGS: [(Tag, Tag); 3] = [
    (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
    (Tag::DateTimeDigitized, Tag::OffsetTimeDigitized),
    (Tag::DateTime, Tag::OffsetTime),
];

/// Extract timestamp, offset and GPS tags from an image or TIFF-based raw
/// file. Anything unreadable degrades to absent fields.
pub fn read_image(path: &Path) -> RawMetadata {
    let mut meta = RawMetadata::default();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::debug!("cannot open {}: {}", path.display(), e);
            return meta;
        }
    };
    let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("no EXIF in {}: {}", path.display(), e);
            return meta;
        }
    };

    for (datetime_tag, offset_tag) in DATETIME_TAGS {
        if let Some(field) = exif.get_field(datetime_tag, In::PRIMARY) {
            let raw = field.display_value().to_string();
            if raw.trim().is_empty() {
                continue;
            }
            meta.raw_timestamp = Some(raw);
            meta.source = Some(TimestampSource::Exif);
            meta.embedded_offset = exif
                .get_field(offset_tag, In::PRIMARY)
                .and_then(ascii_value)
                .and_then(|s| timezone::parse_offset(&s));
            break;
        }
    }

    meta.gps = read_gps(&exif);
    meta
}

fn read_gps(exif: &exif::Exif) -> Option<GpsCoord> {
    let lat = dms_value(exif, Tag::GPSLatitude)?;
    let lat_ref = ascii_value(exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY)?)?;
    let lon = dms_value(exif, Tag::GPSLongitude)?;
    let lon_ref = ascii_value(exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY)?)?;
    let lat = if lat_ref.eq_ignore_ascii_case("S") { -lat } else { lat };
    let lon = if lon_ref.eq_ignore_ascii_case("W") { -lon } else { lon };
    GpsCoord::validated(lat, lon)
}

/// Degrees/minutes/seconds rationals to decimal degrees. Some phones store
/// a single decimal-degrees rational instead of the triplet.
fn dms_value(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            Some(rational(&parts[0])? + rational(&parts[1])? / 60.0 + rational(&parts[2])? / 3600.0)
        }
        Value::Rational(parts) if parts.len() == 1 => rational(&parts[0]),
        _ => None,
    }
}

fn rational(r: &exif::Rational) -> Option<f64> {
    if r.denom == 0 {
        return None;
    }
    Some(r.num as f64 / r.denom as f64)
}

fn ascii_value(field: &exif::Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::tiff_with_exif;
    use super::*;
    use crate::resolve::parse_naive;
    use chrono::{FixedOffset, NaiveDate};

    fn write_tiff(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_datetime_and_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiff(
            &dir,
            "a.tif",
            &tiff_with_exif("2023:07:25 10:20:15", Some("+09:00"), None),
        );
        let meta = read_image(&path);
        assert_eq!(meta.source, Some(TimestampSource::Exif));
        let naive = parse_naive(meta.raw_timestamp.as_deref().unwrap()).unwrap();
        assert_eq!(
            naive,
            NaiveDate::from_ymd_opt(2023, 7, 25).unwrap().and_hms_opt(10, 20, 15).unwrap()
        );
        assert_eq!(meta.embedded_offset, FixedOffset::east_opt(9 * 3600));
        assert!(meta.gps.is_none());
    }

    #[test]
    fn test_datetime_without_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiff(&dir, "b.tif", &tiff_with_exif("2023:07:25 10:20:15", None, None));
        let meta = read_image(&path);
        assert!(meta.raw_timestamp.is_some());
        assert!(meta.embedded_offset.is_none());
    }

    #[test]
    fn test_gps_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tiff(
            &dir,
            "tokyo.tif",
            &tiff_with_exif("2023:07:25 10:20:15", None, Some((35.6895, 139.6917))),
        );
        let gps = read_image(&path).gps.unwrap();
        assert!((gps.lat - 35.6895).abs() < 1e-4);
        assert!((gps.lon - 139.6917).abs() < 1e-4);

        let path = write_tiff(
            &dir,
            "sydney.tif",
            &tiff_with_exif("2023:07:25 10:20:15", None, Some((-33.8688, 151.2093))),
        );
        let gps = read_image(&path).gps.unwrap();
        assert!((gps.lat + 33.8688).abs() < 1e-4);
        assert!((gps.lon - 151.2093).abs() < 1e-4);
    }

    #[test]
    fn test_garbage_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let meta = read_image(&path);
        assert!(meta.raw_timestamp.is_none());
        assert!(meta.embedded_offset.is_none());
        assert!(meta.gps.is_none());
        assert!(meta.source.is_none());
    }
}
