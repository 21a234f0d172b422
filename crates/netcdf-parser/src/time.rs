//! CF-convention time axis decoding.
//!
//! Time coordinates are stored as offsets from a reference instant, e.g.
//! `hours since 1800-01-01 00:00:0.0` in the NCEP reanalysis files.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{NetCdfError, NetCdfResult};

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// Parsed `<unit> since <reference>` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

/// Calendars decoded with the proleptic Gregorian rules.
const GREGORIAN_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

impl CfTimeUnits {
    /// Whether a `units` attribute looks like a CF time axis.
    pub fn is_time_units(units: &str) -> bool {
        units.to_ascii_lowercase().contains(" since ")
    }

    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let invalid = || NetCdfError::InvalidTime(format!("unsupported time units '{}'", units));
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower.split_once(" since ").ok_or_else(invalid)?;
        let unit = TimeUnit::parse(unit.trim()).ok_or_else(invalid)?;
        let reference = parse_reference(reference.trim()).ok_or_else(invalid)?;
        Ok(Self { unit, reference })
    }

    /// Decode raw offsets into timestamps, rounded to the second.
    pub fn decode(&self, values: &[f64]) -> NetCdfResult<Vec<NaiveDateTime>> {
        values
            .iter()
            .map(|&v| {
                let secs = v * self.unit.seconds();
                if !secs.is_finite() {
                    return Err(NetCdfError::InvalidTime(format!("non-finite time offset {}", v)));
                }
                Ok(self.reference + Duration::seconds(secs.round() as i64))
            })
            .collect()
    }
}

/// Check a `calendar` attribute; only Gregorian-compatible calendars decode.
pub fn check_calendar(calendar: Option<&str>) -> NetCdfResult<()> {
    match calendar {
        None => Ok(()),
        Some(c) if GREGORIAN_CALENDARS.contains(&c.to_ascii_lowercase().as_str()) => Ok(()),
        Some(c) => Err(NetCdfError::InvalidTime(format!("unsupported calendar '{}'", c))),
    }
}

/// Reference instant: `YYYY-M-D`, optionally followed by `H:M[:S[.f]]` and
/// a UTC marker.
fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches(" utc").trim_end_matches('z');
    let (date, time) = match s.split_once(|c| c == ' ' || c == 't') {
        Some((d, t)) => (d, Some(t.trim())),
        None => (s, None),
    };

    let mut parts = date.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time {
        None | Some("") => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) => {
            let mut fields = t.split(':');
            let hour: u32 = fields.next()?.parse().ok()?;
            let minute: u32 = fields.next().map(str::parse).transpose().ok()?.unwrap_or(0);
            let second: f64 = fields.next().map(str::parse).transpose().ok()?.unwrap_or(0.0);
            NaiveTime::from_hms_opt(hour, minute, second.floor() as u32)?
        }
    };
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymdh(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_reanalysis_units() {
        let units = CfTimeUnits::parse("hours since 1800-01-01 00:00:0.0").unwrap();
        assert_eq!(units.unit, TimeUnit::Hours);
        assert_eq!(units.reference, ymdh(1800, 1, 1, 0));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            CfTimeUnits::parse("days since 1980-1-1").unwrap().reference,
            ymdh(1980, 1, 1, 0)
        );
        assert_eq!(
            CfTimeUnits::parse("seconds since 1970-01-01T00:00:00Z").unwrap().unit,
            TimeUnit::Seconds
        );
        assert!(CfTimeUnits::parse("fortnights since 1980-01-01").is_err());
        assert!(CfTimeUnits::parse("hours").is_err());
        assert!(CfTimeUnits::parse("hours since yesterday").is_err());
    }

    #[test]
    fn test_decode_hours() {
        let units = CfTimeUnits::parse("hours since 1980-01-01 00:00:00").unwrap();
        let times = units.decode(&[0.0, 24.0, 762.0]).unwrap();
        assert_eq!(times[1], ymdh(1980, 1, 2, 0));
        assert_eq!(times[2], ymdh(1980, 2, 1, 18));
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        let units = CfTimeUnits::parse("days since 1980-01-01").unwrap();
        assert!(units.decode(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_calendar_check() {
        assert!(check_calendar(None).is_ok());
        assert!(check_calendar(Some("Gregorian")).is_ok());
        assert!(check_calendar(Some("360_day")).is_err());
    }
}
