use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

use crate::meta::{GpsCoord, RawMetadata};
use crate::timezone::{self, TimezonePolicy, ZoneSpec};

/// Which rung of the resolution ladder produced the instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    EmbeddedOffset,
    GpsAuto,
    ConfiguredZone,
    LocalFallback,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::EmbeddedOffset => "embedded-offset",
            ResolutionMethod::GpsAuto => "gps-auto",
            ResolutionMethod::ConfiguredZone => "configured-zone",
            ResolutionMethod::LocalFallback => "local-fallback",
        }
    }
}

/// A capture time pinned to a concrete UTC offset.
#[derive(Debug, Clone)]
pub struct ResolvedTimestamp {
    pub instant: DateTime<FixedOffset>,
    /// Zone identifier or offset that was actually applied
    pub source_zone: String,
    pub method: ResolutionMethod,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no usable timestamp in metadata")]
    MetadataUnavailable,
    #[error("unparsable timestamp {0:?}")]
    Unparsable(String),
    #[error("implausible timestamp {0} (year before 1971)")]
    Implausible(NaiveDateTime),
    #[error("wall clock {0} has no valid local mapping")]
    Unlocalizable(NaiveDateTime),
}

const MIN_PLAUSIBLE_YEAR: i32 = 1971;

/// Resolve one file's raw metadata to an absolute capture instant.
pub fn resolve(meta: &RawMetadata, policy: TimezonePolicy) -> Result<ResolvedTimestamp, ResolveError> {
    resolve_with(meta, policy, timezone::zone_for)
}

/// The ladder itself, with the GPS lookup injected so each rung is
/// testable without real zone geometry.
pub(crate) fn resolve_with(
    meta: &RawMetadata,
    policy: TimezonePolicy,
    lookup: impl Fn(GpsCoord) -> Option<Tz>,
) -> Result<ResolvedTimestamp, ResolveError> {
    let raw = meta.raw_timestamp.as_deref().ok_or(ResolveError::MetadataUnavailable)?;
    let naive = parse_naive(raw).ok_or_else(|| ResolveError::Unparsable(raw.to_string()))?;
    if naive.year() < MIN_PLAUSIBLE_YEAR {
        return Err(ResolveError::Implausible(naive));
    }

    if let Some(resolved) = embedded_rung(meta, naive) {
        return Ok(resolved);
    }
    if let Some(resolved) = gps_rung(meta, policy, naive, &lookup) {
        return Ok(resolved);
    }
    if let Some(resolved) = configured_rung(policy, naive) {
        return Ok(resolved);
    }
    local_rung(naive).ok_or(ResolveError::Unlocalizable(naive))
}

fn embedded_rung(meta: &RawMetadata, naive: NaiveDateTime) -> Option<ResolvedTimestamp> {
    let offset = meta.embedded_offset?;
    let instant = timezone::localize(&offset, naive)?;
    Some(ResolvedTimestamp {
        instant,
        source_zone: offset.to_string(),
        method: ResolutionMethod::EmbeddedOffset,
    })
}

fn gps_rung(
    meta: &RawMetadata,
    policy: TimezonePolicy,
    naive: NaiveDateTime,
    lookup: &impl Fn(GpsCoord) -> Option<Tz>,
) -> Option<ResolvedTimestamp> {
    if policy != TimezonePolicy::Auto {
        return None;
    }
    let coord = meta.gps?;
    let tz = match lookup(coord) {
        Some(tz) => tz,
        None => {
            log::debug!("no zone found for ({:.4}, {:.4}), falling through", coord.lat, coord.lon);
            return None;
        }
    };
    let instant = timezone::localize(&tz, naive)?;
    Some(ResolvedTimestamp {
        instant,
        source_zone: tz.name().to_string(),
        method: ResolutionMethod::GpsAuto,
    })
}

fn configured_rung(policy: TimezonePolicy, naive: NaiveDateTime) -> Option<ResolvedTimestamp> {
    let spec = match policy {
        TimezonePolicy::Fixed(spec) => spec,
        _ => return None,
    };
    let instant = match spec {
        ZoneSpec::Named(tz) => timezone::localize(&tz, naive)?,
        ZoneSpec::Offset(off) => timezone::localize(&off, naive)?,
    };
    Some(ResolvedTimestamp {
        instant,
        source_zone: spec.label(),
        method: ResolutionMethod::ConfiguredZone,
    })
}

fn local_rung(naive: NaiveDateTime) -> Option<ResolvedTimestamp> {
    let instant = timezone::localize(&chrono::Local, naive)?;
    Some(ResolvedTimestamp {
        instant,
        source_zone: format!("local ({})", instant.offset()),
        method: ResolutionMethod::LocalFallback,
    })
}

const NAIVE_FORMATS: [&str; 3] =
    ["%Y:%m:%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse the timestamp shapes metadata actually contains; fractional
/// seconds are dropped since destination naming is second-granular.
pub(crate) fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = raw.trim();
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return dt.with_nanosecond(0);
        }
    }
    for fmt in ["%Y:%m:%d", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
