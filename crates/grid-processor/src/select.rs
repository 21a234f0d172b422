//! Label-based selection.
//!
//! Selection follows labelled-array conventions: time labels are matched by
//! the period they name (`"1980-02"` is all of February), numeric slices are
//! inclusive at both ends and follow the axis' own ordering.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use grid_common::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::GriddedField;

/// A half-open time interval named by a partial ISO 8601 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimePeriod {
    /// Parse `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYY-MM-DDTHH`,
    /// `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS` (a space may replace `T`).
    pub fn parse(label: &str) -> GridResult<Self> {
        let invalid = || GridError::InvalidTime(format!("cannot parse time label '{}'", label));
        let label = label.trim();
        let (date_part, time_part) = match label.split_once(|c| c == 'T' || c == ' ') {
            Some((d, t)) => (d, Some(t)),
            None => (label, None),
        };

        let date_fields: Vec<&str> = date_part.split('-').collect();
        let parse_u32 = |s: &str, width: usize| -> GridResult<u32> {
            if s.len() != width || !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse::<u32>().map_err(|_| invalid())
        };

        let year = parse_u32(date_fields[0], 4)? as i32;
        match (date_fields.len(), time_part) {
            (1, None) => {
                let start = ymd(year, 1, 1).ok_or_else(invalid)?;
                let end = ymd(year + 1, 1, 1).ok_or_else(invalid)?;
                Ok(Self::new(start, end))
            }
            (2, None) => {
                let month = parse_u32(date_fields[1], 2)?;
                let start = ymd(year, month, 1).ok_or_else(invalid)?;
                let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                let end = ymd(ny, nm, 1).ok_or_else(invalid)?;
                Ok(Self::new(start, end))
            }
            (3, None) => {
                let month = parse_u32(date_fields[1], 2)?;
                let day = parse_u32(date_fields[2], 2)?;
                let start = ymd(year, month, day).ok_or_else(invalid)?;
                Ok(Self::new(start, start + Duration::days(1)))
            }
            (3, Some(time)) => {
                let month = parse_u32(date_fields[1], 2)?;
                let day = parse_u32(date_fields[2], 2)?;
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                let time_fields: Vec<&str> = time.split(':').collect();
                let hour = parse_u32(time_fields[0], 2)?;
                let (minute, second, span) = match time_fields.len() {
                    1 => (0, 0, Duration::hours(1)),
                    2 => (parse_u32(time_fields[1], 2)?, 0, Duration::minutes(1)),
                    3 => (
                        parse_u32(time_fields[1], 2)?,
                        parse_u32(time_fields[2], 2)?,
                        Duration::seconds(1),
                    ),
                    _ => return Err(invalid()),
                };
                let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
                let start = date.and_time(time);
                Ok(Self::new(start, start + span))
            }
            _ => Err(invalid()),
        }
    }

    fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.start <= *t && *t < self.end
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Inclusive label slice. `start` and `stop` are taken in the order of the
/// axis they apply to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSlice {
    pub start: f64,
    pub stop: f64,
}

impl LabelSlice {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// The same bounds ordered to match an ascending or descending axis.
    pub fn oriented(&self, descending: bool) -> Self {
        let (lo, hi) = (self.start.min(self.stop), self.start.max(self.stop));
        if descending {
            Self::new(hi, lo)
        } else {
            Self::new(lo, hi)
        }
    }
}

/// A time label plus latitude/longitude ranges.
///
/// Unlike [`GriddedField::sel_slice`], ranges here may be given in either
/// order and an empty result is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetRequest {
    pub time: Option<String>,
    pub lat: Option<(f64, f64)>,
    pub lon: Option<(f64, f64)>,
    #[serde(default = "default_time_dim")]
    pub time_dim: String,
    #[serde(default = "default_lat_dim")]
    pub lat_dim: String,
    #[serde(default = "default_lon_dim")]
    pub lon_dim: String,
}

fn default_time_dim() -> String {
    "time".to_string()
}

fn default_lat_dim() -> String {
    "lat".to_string()
}

fn default_lon_dim() -> String {
    "lon".to_string()
}

impl Default for SubsetRequest {
    fn default() -> Self {
        Self {
            time: None,
            lat: None,
            lon: None,
            time_dim: default_time_dim(),
            lat_dim: default_lat_dim(),
            lon_dim: default_lon_dim(),
        }
    }
}

impl SubsetRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(mut self, label: impl Into<String>) -> Self {
        self.time = Some(label.into());
        self
    }

    pub fn lat(mut self, a: f64, b: f64) -> Self {
        self.lat = Some((a, b));
        self
    }

    pub fn lon(mut self, a: f64, b: f64) -> Self {
        self.lon = Some((a, b));
        self
    }
}

impl GriddedField {
    /// Select every time step inside the period named by `label`.
    pub fn sel_time(&self, label: &str) -> GridResult<Self> {
        self.sel_time_on("time", label)
    }

    /// [`sel_time`](Self::sel_time) on a differently named time dimension.
    pub fn sel_time_on(&self, dim: &str, label: &str) -> GridResult<Self> {
        let period = TimePeriod::parse(label)?;
        let times = self.coord(dim)?.as_time()?;
        let indices: Vec<usize> = times
            .iter()
            .enumerate()
            .filter(|(_, t)| period.contains(t))
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            return Err(GridError::LabelNotFound {
                dim: dim.to_string(),
                label: label.to_string(),
            });
        }
        debug!(dim = dim, label = label, steps = indices.len(), "Selected time period");
        self.isel(dim, &indices)
    }

    /// Inclusive label slice along a numeric dimension.
    ///
    /// The slice follows the axis ordering: on a descending axis `start` is
    /// the larger label. A slice running against the axis selects nothing.
    pub fn sel_slice(&self, dim: &str, slice: LabelSlice) -> GridResult<Self> {
        let coord = self.coord(dim)?;
        let labels = coord.as_numeric()?;
        let descending = coord.is_descending();

        let indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &v)| {
                if descending {
                    v <= slice.start && v >= slice.stop
                } else {
                    v >= slice.start && v <= slice.stop
                }
            })
            .map(|(i, _)| i)
            .collect();

        self.isel(dim, &indices)
    }

    /// Time label plus lat/lon bounds, oriented to each axis.
    pub fn subset(&self, request: &SubsetRequest) -> GridResult<Self> {
        let mut out = match &request.time {
            Some(label) => self.sel_time_on(&request.time_dim, label)?,
            None => self.clone(),
        };

        for (dim, range) in [(&request.lat_dim, request.lat), (&request.lon_dim, request.lon)] {
            let Some((a, b)) = range else { continue };
            let coord = out.coord(dim)?;
            let (a, b) = if dim == &request.lon_dim {
                normalize_lon_range(coord.as_numeric()?, a, b)
            } else {
                (a, b)
            };
            let slice = LabelSlice::new(a, b).oriented(coord.is_descending());
            out = out.sel_slice(dim, slice)?;
            if out.coord(dim)?.is_empty() {
                return Err(GridError::EmptySelection(format!("{} in [{}, {}]", dim, a.min(b), a.max(b))));
            }
        }

        debug!(shape = ?out.shape(), "Subset selected");
        Ok(out)
    }
}

/// Shift a western-hemisphere range onto a 0-360 longitude axis.
fn normalize_lon_range(labels: &[f64], a: f64, b: f64) -> (f64, f64) {
    let axis_max = labels.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if axis_max > 180.0 && a < 0.0 && b < 0.0 {
        (a + 360.0, b + 360.0)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Coordinate;
    use ndarray::{Array, IxDyn};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn global_field() -> GriddedField {
        let times = vec![at(1980, 2, 1, 0), at(1980, 2, 2, 0), at(1980, 2, 2, 6), at(1980, 3, 1, 0)];
        // 90 -> -90 by 1.5 degrees
        let lat: Vec<f64> = (0..121).map(|i| 90.0 - 1.5 * i as f64).collect();
        let lon: Vec<f64> = (0..240).map(|i| 1.5 * i as f64).collect();
        let shape = [times.len(), lat.len(), lon.len()];
        let data = Array::from_elem(IxDyn(&shape), 280.0f32);
        GriddedField::new(
            "air",
            vec![
                Coordinate::time("time", times),
                Coordinate::numeric("lat", lat),
                Coordinate::numeric("lon", lon),
            ],
            data,
        )
        .unwrap()
    }

    #[test]
    fn test_time_period_resolutions() {
        let p = TimePeriod::parse("1980").unwrap();
        assert_eq!(p.start, at(1980, 1, 1, 0));
        assert_eq!(p.end, at(1981, 1, 1, 0));

        let p = TimePeriod::parse("1980-12").unwrap();
        assert_eq!(p.end, at(1981, 1, 1, 0));

        let p = TimePeriod::parse("1980-02-02").unwrap();
        assert!(p.contains(&at(1980, 2, 2, 18)));
        assert!(!p.contains(&at(1980, 2, 3, 0)));

        let p = TimePeriod::parse("1980-02-02T06").unwrap();
        assert!(p.contains(&at(1980, 2, 2, 6)));
        assert!(!p.contains(&at(1980, 2, 2, 7)));

        assert!(TimePeriod::parse("1980-02-02 06:30:00").is_ok());
    }

    #[test]
    fn test_time_period_rejects_garbage() {
        for label in ["", "80-02-02", "1980-13", "1980-02-30", "1980/02/02", "1980-02-02T25"] {
            assert!(
                matches!(TimePeriod::parse(label), Err(GridError::InvalidTime(_))),
                "accepted {:?}",
                label
            );
        }
    }

    #[test]
    fn test_sel_time_day_and_month() {
        let field = global_field();
        assert_eq!(field.sel_time("1980-02-02").unwrap().shape()[0], 2);
        assert_eq!(field.sel_time("1980-02").unwrap().shape()[0], 3);
        assert_eq!(field.sel_time("1980-03-01").unwrap().shape()[0], 1);
    }

    #[test]
    fn test_sel_time_missing_label() {
        let err = global_field().sel_time("1981-01-01").unwrap_err();
        assert!(matches!(err, GridError::LabelNotFound { ref dim, .. } if dim == "time"));
    }

    #[test]
    fn test_sel_slice_descending_latitude() {
        let field = global_field();
        let sub = field.sel_slice("lat", LabelSlice::new(39.0, 6.2)).unwrap();
        let lat = sub.coord("lat").unwrap().as_numeric().unwrap().to_vec();

        assert!(!lat.is_empty());
        assert!(lat.iter().all(|&v| (6.2..=39.0).contains(&v)));
        // Both extremes present: 39.0 and 7.5
        assert_eq!(lat.first(), Some(&39.0));
        assert_eq!(lat.last(), Some(&7.5));
        assert_eq!(lat.len(), 22);
    }

    #[test]
    fn test_sel_slice_inverted_is_empty() {
        let field = global_field();
        let sub = field.sel_slice("lat", LabelSlice::new(6.2, 39.0)).unwrap();
        assert_eq!(sub.shape()[1], 0);
    }

    #[test]
    fn test_subset_orients_bounds() {
        let field = global_field();
        let a = field
            .subset(&SubsetRequest::new().time("1980-02-02").lat(39.0, 6.2).lon(67.0, 97.5))
            .unwrap();
        let b = field
            .subset(&SubsetRequest::new().time("1980-02-02").lat(6.2, 39.0).lon(97.5, 67.0))
            .unwrap();
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.shape(), &[2, 22, 21]);
    }

    #[test]
    fn test_subset_empty_is_error() {
        let field = global_field();
        let err = field.subset(&SubsetRequest::new().lat(1.0, 1.2)).unwrap_err();
        assert!(matches!(err, GridError::EmptySelection(_)));
    }

    #[test]
    fn test_subset_western_lon_on_360_axis() {
        let field = global_field();
        let sub = field.subset(&SubsetRequest::new().lon(-10.0, -5.0)).unwrap();
        let lon = sub.coord("lon").unwrap().as_numeric().unwrap();
        assert!(lon.iter().all(|&v| (350.0..=355.0).contains(&v)));
    }
}
