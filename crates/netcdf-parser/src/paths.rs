//! Locating reanalysis files by date.

use std::path::{Path, PathBuf};

use crate::error::{NetCdfError, NetCdfResult};

/// File name pattern of the NCEP 2 m air temperature reanalysis.
pub const DEFAULT_FILE_PATTERN: &str = "air.2m.gauss.{year}.nc";

/// Four-digit year at the start of a date label.
pub fn year_of(date_label: &str) -> NetCdfResult<&str> {
    let year = date_label.get(..4).unwrap_or(date_label);
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        Ok(year)
    } else {
        Err(NetCdfError::InvalidTime(format!(
            "date '{}' does not start with a four-digit year",
            date_label
        )))
    }
}

/// `base/pattern` with `{year}` replaced by the label's year.
pub fn dataset_path(base: impl AsRef<Path>, pattern: &str, date_label: &str) -> NetCdfResult<PathBuf> {
    let year = year_of(date_label)?;
    Ok(base.as_ref().join(pattern.replace("{year}", year)))
}

/// `base/air.2m.gauss.<year>.nc` for a date label.
pub fn reanalysis_path(base: impl AsRef<Path>, date_label: &str) -> NetCdfResult<PathBuf> {
    dataset_path(base, DEFAULT_FILE_PATTERN, date_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reanalysis_path() {
        let path = reanalysis_path("/data/ncep", "1980-02-02").unwrap();
        assert_eq!(path, PathBuf::from("/data/ncep/air.2m.gauss.1980.nc"));
    }

    #[test]
    fn test_custom_pattern() {
        let path = dataset_path("data", "t2m_{year}_daily.nc", "2001").unwrap();
        assert_eq!(path, PathBuf::from("data/t2m_2001_daily.nc"));
    }

    #[test]
    fn test_year_must_be_digits() {
        assert!(year_of("80-02-02").is_err());
        assert!(year_of("abc").is_err());
        assert!(matches!(year_of("19x0-01-01"), Err(NetCdfError::InvalidTime(_))));
    }
}
