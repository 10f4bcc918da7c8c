use std::path::{Path, PathBuf};

use crate::media::MediaKind;
use crate::resolve::ResolvedTimestamp;

/// Where one file belongs under the output root, before collision handling.
#[derive(Debug, Clone)]
pub struct DestinationPlan {
    /// Year/month bucket, `<year>/<year>_<month>`
    pub bucket: PathBuf,
    /// Raw-format files live under an extra `raw/` level
    pub raw_subfolder: bool,
    /// Canonical name without extension, `YYYYMMDD-HHMMSS`
    pub stem: String,
    /// Extension carried from the source file, lowercased
    pub extension: String,
}

impl DestinationPlan {
    /// Directory the file lands in, relative to the output root.
    pub fn dir(&self) -> PathBuf {
        if self.raw_subfolder {
            self.bucket.join("raw")
        } else {
            self.bucket.clone()
        }
    }

    /// Relative candidate path for a disambiguation suffix; 0 means none.
    pub fn candidate(&self, suffix: u32) -> PathBuf {
        let name = if suffix == 0 {
            format!("{}.{}", self.stem, self.extension)
        } else {
            format!("{}-{:02}.{}", self.stem, suffix, self.extension)
        };
        self.dir().join(name)
    }
}

/// Map a resolved capture instant to its destination. Pure; the instant's
/// own wall clock names the file.
pub fn plan(resolved: &ResolvedTimestamp, kind: MediaKind, source_path: &Path) -> DestinationPlan {
    let wall = &resolved.instant;
    let bucket = PathBuf::from(wall.format("%Y").to_string()).join(wall.format("%Y_%m").to_string());
    let extension = source_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    DestinationPlan {
        bucket,
        raw_subfolder: kind == MediaKind::RawImage,
        stem: wall.format("%Y%m%d-%H%M%S").to_string(),
        extension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ResolutionMethod;
    use chrono::DateTime;

    fn resolved(rfc3339: &str) -> ResolvedTimestamp {
        ResolvedTimestamp {
            instant: DateTime::parse_from_rfc3339(rfc3339).unwrap(),
            source_zone: "test".to_string(),
            method: ResolutionMethod::EmbeddedOffset,
        }
    }

    #[test]
    fn test_image_plan() {
        let p = plan(&resolved("2023-07-25T10:20:15+09:00"), MediaKind::Image, Path::new("a/IMG.JPG"));
        assert_eq!(p.bucket, Path::new("2023/2023_07"));
        assert_eq!(p.stem, "20230725-102015");
        assert_eq!(p.extension, "jpg");
        assert!(!p.raw_subfolder);
        assert_eq!(p.candidate(0), Path::new("2023/2023_07/20230725-102015.jpg"));
        assert_eq!(p.candidate(1), Path::new("2023/2023_07/20230725-102015-01.jpg"));
    }

    #[test]
    fn test_raw_plan_gets_subfolder() {
        let p = plan(&resolved("2023-07-25T10:20:17+09:00"), MediaKind::RawImage, Path::new("shot.cr2"));
        assert_eq!(p.candidate(0), Path::new("2023/2023_07/raw/20230725-102017.cr2"));
    }

    #[test]
    fn test_stem_uses_own_wall_clock() {
        // same instant, different offsets, different names
        let tokyo = plan(&resolved("2023-07-25T10:20:15+09:00"), MediaKind::Image, Path::new("a.jpg"));
        let utc = plan(&resolved("2023-07-25T01:20:15+00:00"), MediaKind::Image, Path::new("a.jpg"));
        assert_eq!(tokyo.stem, "20230725-102015");
        assert_eq!(utc.stem, "20230725-012015");
    }

    #[test]
    fn test_month_zero_padded() {
        let p = plan(&resolved("2024-01-05T00:00:00+00:00"), MediaKind::Video, Path::new("v.mp4"));
        assert_eq!(p.bucket, Path::new("2024/2024_01"));
        assert_eq!(p.stem, "20240105-000000");
    }
}
