use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use tzf_rs::DefaultFinder;

use crate::meta::GpsCoord;

/// How wall-clock timestamps without an embedded offset get their zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimezonePolicy {
    /// Derive the zone from GPS coordinates when present.
    Auto,
    /// Use the host's local zone.
    Local,
    /// Always apply one fixed zone or offset.
    Fixed(ZoneSpec),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSpec {
    Named(Tz),
    Offset(FixedOffset),
}

impl ZoneSpec {
    pub fn label(&self) -> String {
        match self {
            ZoneSpec::Named(tz) => tz.name().to_string(),
            ZoneSpec::Offset(off) => off.to_string(),
        }
    }
}

impl FromStr for TimezonePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(TimezonePolicy::Auto);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(TimezonePolicy::Local);
        }
        if let Some(off) = parse_offset(trimmed) {
            return Ok(TimezonePolicy::Fixed(ZoneSpec::Offset(off)));
        }
        match Tz::from_str(trimmed) {
            Ok(tz) => Ok(TimezonePolicy::Fixed(ZoneSpec::Named(tz))),
            Err(_) => Err(format!(
                "invalid timezone '{trimmed}': use 'auto', 'local', an IANA name like 'Asia/Tokyo', or a UTC offset like '+09:00'"
            )),
        }
    }
}

static OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").unwrap());

/// Parse a UTC offset string like "+09:00", "-0530" or "Z".
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let caps = OFFSET_RE.captures(trimmed)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    // Real offsets top out at 14 hours; anything beyond is garbage metadata
    if hours > 14 || minutes > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    match &caps[1] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

static FINDER: LazyLock<DefaultFinder> = LazyLock::new(DefaultFinder::new);

/// IANA zone covering the given coordinates, if the lookup yields one.
pub fn zone_for(coord: GpsCoord) -> Option<Tz> {
    let name = FINDER.get_tz_name(coord.lon, coord.lat);
    if name.is_empty() {
        return None;
    }
    Tz::from_str(name).ok()
}

/// Pin a naive wall-clock time to a zone. Ambiguous times (DST overlap)
/// take the earlier mapping; nonexistent times (DST gap) yield None.
pub fn localize<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.fixed_offset()),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("auto".parse::<TimezonePolicy>().unwrap(), TimezonePolicy::Auto);
        assert_eq!("LOCAL".parse::<TimezonePolicy>().unwrap(), TimezonePolicy::Local);
        assert_eq!(
            "Asia/Tokyo".parse::<TimezonePolicy>().unwrap(),
            TimezonePolicy::Fixed(ZoneSpec::Named(Tz::Asia__Tokyo))
        );
        assert_eq!(
            "+09:00".parse::<TimezonePolicy>().unwrap(),
            TimezonePolicy::Fixed(ZoneSpec::Offset(FixedOffset::east_opt(9 * 3600).unwrap()))
        );
        assert!("Atlantis/Lost".parse::<TimezonePolicy>().is_err());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+09:00"), FixedOffset::east_opt(9 * 3600));
        assert_eq!(parse_offset("+0900"), FixedOffset::east_opt(9 * 3600));
        assert_eq!(parse_offset("-05:30"), FixedOffset::west_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset("+15:00"), None);
        assert_eq!(parse_offset("+09:60"), None);
        assert_eq!(parse_offset("9:00"), None);
        assert_eq!(parse_offset("pacific"), None);
    }

    #[test]
    fn test_zone_for_known_points() {
        let tokyo = GpsCoord { lat: 35.6895, lon: 139.6917 };
        assert_eq!(zone_for(tokyo), Some(Tz::Asia__Tokyo));
        let nyc = GpsCoord { lat: 40.7128, lon: -74.0060 };
        assert_eq!(zone_for(nyc), Some(Tz::America__New_York));
    }

    #[test]
    fn test_localize_plain() {
        let dt = localize(&Tz::Asia__Tokyo, naive(2023, 7, 25, 10, 20, 15)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(dt.naive_utc(), naive(2023, 7, 25, 1, 20, 15));
    }

    #[test]
    fn test_localize_dst_overlap_prefers_earlier() {
        // 02:30 happens twice in Berlin on 2023-10-29; the CEST (+02:00) one comes first
        let dt = localize(&Tz::Europe__Berlin, naive(2023, 10, 29, 2, 30, 0)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_localize_dst_gap() {
        // 02:30 never happens in Berlin on 2023-03-26
        assert_eq!(localize(&Tz::Europe__Berlin, naive(2023, 3, 26, 2, 30, 0)), None);
    }

    #[test]
    fn test_localize_fixed_offset() {
        let off = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let dt = localize(&off, naive(2023, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }
}
