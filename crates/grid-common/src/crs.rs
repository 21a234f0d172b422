//! Coordinate Reference System types and utilities.
//!
//! CRS values reach this workspace in several shapes: authority strings from
//! configuration (`EPSG:4326`), `init` style definitions (`+init=epsg:4326`),
//! WKT from shapefile `.prj` sidecars or NetCDF grid-mapping attributes. The
//! [`CrsLike`] trait lets callers ask a value whether it exposes an authority
//! code directly before falling back to parsing its definition string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes with projection support in the `projection` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
    /// GDA94 Australian Albers (meters)
    Epsg3577,
    /// NAD83 CONUS Albers Equal Area (meters)
    Epsg5070,
}

impl CrsCode {
    /// Parse an authority string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:4326"
    /// - "CRS:84" / "OGC:CRS84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "urn:ogc:def:crs:EPSG::4326"
    pub fn from_authority_str(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "OGC:CRS84" {
            return Ok(CrsCode::Epsg4326);
        }
        if normalized == "EPSG:900913" {
            return Ok(CrsCode::Epsg3857);
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .or_else(|| normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        code.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::from_epsg)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Parse a free-form CRS definition string.
    ///
    /// Besides everything `from_authority_str` accepts, this understands the
    /// `init` forms (`+init=epsg:4326`, `init=epsg:4326`,
    /// `{'init': 'epsg:4326'}`), a WGS84 `longlat` proj string, and WKT.
    pub fn from_definition(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();

        if trimmed.starts_with("GEOGCS")
            || trimmed.starts_with("PROJCS")
            || trimmed.starts_with("GEOGCRS")
            || trimmed.starts_with("PROJCRS")
        {
            return Self::from_wkt(trimmed)
                .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()));
        }

        let lowered = trimmed.to_lowercase();
        if let Some(pos) = lowered.find("init") {
            let rest = &lowered[pos + 4..];
            let value: String = rest
                .trim_start_matches(|c: char| c == '=' || c == ':' || c == '\'' || c == '"' || c.is_whitespace())
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == ':')
                .collect();
            return Self::from_authority_str(&value);
        }

        if lowered.contains("+proj=longlat")
            && (lowered.contains("+datum=wgs84") || lowered.contains("+ellps=wgs84"))
        {
            return Ok(CrsCode::Epsg4326);
        }

        Self::from_authority_str(trimmed)
    }

    /// Extract a supported code from WKT1 or WKT2 text.
    ///
    /// The outermost authority is the last one in the string. ESRI-flavoured
    /// WKT without authorities is matched on well-known names.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let upper = wkt.to_uppercase();

        let last_code = ["AUTHORITY[\"EPSG\",\"", "ID[\"EPSG\","]
            .iter()
            .filter_map(|marker| upper.rfind(marker).map(|pos| (pos, marker.len())))
            .max_by_key(|(pos, _)| *pos)
            .and_then(|(pos, len)| {
                let digits: String = upper[pos + len..]
                    .chars()
                    .skip_while(|c| *c == '"')
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse::<u32>().ok()
            });

        if let Some(code) = last_code {
            return Self::from_epsg(code);
        }

        if upper.starts_with("PROJCS") || upper.starts_with("PROJCRS") {
            if upper.contains("PSEUDO_MERCATOR") || upper.contains("PSEUDO-MERCATOR") || upper.contains("WEB_MERCATOR") {
                return Some(CrsCode::Epsg3857);
            }
            if upper.contains("ALBERS") && upper.contains("GDA") {
                return Some(CrsCode::Epsg3577);
            }
            if upper.contains("ALBERS") && (upper.contains("CONUS") || upper.contains("CONTIGUOUS")) {
                return Some(CrsCode::Epsg5070);
            }
            return None;
        }

        if upper.contains("WGS_1984") || upper.contains("WGS 84") || upper.contains("WGS84") {
            return Some(CrsCode::Epsg4326);
        }
        if upper.contains("NORTH_AMERICAN_1983") || upper.contains("NAD83") {
            return Some(CrsCode::Epsg4269);
        }
        None
    }

    /// Map a numeric EPSG code to a supported CRS.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(CrsCode::Epsg4326),
            4269 => Some(CrsCode::Epsg4269),
            3857 | 900913 => Some(CrsCode::Epsg3857),
            3577 => Some(CrsCode::Epsg3577),
            5070 => Some(CrsCode::Epsg5070),
            _ => None,
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg3577 => 3577,
            CrsCode::Epsg5070 => 5070,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// A value that can describe a coordinate reference system.
///
/// `authority_code` is the direct capability; implementors that only know a
/// textual definition return `None` there and rely on `Display`.
pub trait CrsLike: fmt::Display {
    /// The CRS as a supported authority code, when the value exposes one.
    fn authority_code(&self) -> Option<CrsCode>;
}

impl CrsLike for CrsCode {
    fn authority_code(&self) -> Option<CrsCode> {
        Some(*self)
    }
}

/// How a [`CrsLike`] value was turned into a [`CrsCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsResolution {
    /// The value exposed an authority code.
    Authority,
    /// The value's definition string had to be parsed.
    Definition,
}

/// Resolve any CRS-like value into a supported code.
///
/// Tries the authority capability first and falls back to parsing the
/// definition string, reporting which path succeeded.
pub fn resolve_crs(crs: &dyn CrsLike) -> Result<(CrsCode, CrsResolution), CrsParseError> {
    if let Some(code) = crs.authority_code() {
        return Ok((code, CrsResolution::Authority));
    }
    let definition = crs.to_string();
    CrsCode::from_definition(&definition)
        .map(|code| (code, CrsResolution::Definition))
}

/// A CRS as written by a user or a file: kept verbatim, parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrsDefinition(pub String);

impl CrsDefinition {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CrsCode> for CrsDefinition {
    fn from(code: CrsCode) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for CrsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl CrsLike for CrsDefinition {
    fn authority_code(&self) -> Option<CrsCode> {
        CrsCode::from_authority_str(&self.0).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InitOnly(&'static str);

    impl fmt::Display for InitOnly {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl CrsLike for InitOnly {
        fn authority_code(&self) -> Option<CrsCode> {
            None
        }
    }

    #[test]
    fn test_parse_authority() {
        assert_eq!(
            CrsCode::from_authority_str("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_authority_str("epsg:3577").unwrap(),
            CrsCode::Epsg3577
        );
        assert_eq!(
            CrsCode::from_authority_str("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_authority_str("urn:ogc:def:crs:EPSG::3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert!(CrsCode::from_authority_str("EPSG:99999").is_err());
        assert!(CrsCode::from_authority_str("+init=epsg:4326").is_err());
    }

    #[test]
    fn test_parse_init_forms() {
        assert_eq!(
            CrsCode::from_definition("+init=epsg:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_definition("{'init': 'epsg:3577'}").unwrap(),
            CrsCode::Epsg3577
        );
        assert_eq!(
            CrsCode::from_definition("+proj=longlat +datum=WGS84 +no_defs").unwrap(),
            CrsCode::Epsg4326
        );
    }

    #[test]
    fn test_wkt_outermost_authority() {
        let wkt = r#"PROJCS["GDA94 / Australian Albers",GEOGCS["GDA94",AUTHORITY["EPSG","4283"]],PROJECTION["Albers_Conic_Equal_Area"],AUTHORITY["EPSG","3577"]]"#;
        assert_eq!(CrsCode::from_wkt(wkt), Some(CrsCode::Epsg3577));

        let esri = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        assert_eq!(CrsCode::from_wkt(esri), Some(CrsCode::Epsg4326));
    }

    #[test]
    fn test_resolve_prefers_authority() {
        let (code, path) = resolve_crs(&CrsCode::Epsg3857).unwrap();
        assert_eq!(code, CrsCode::Epsg3857);
        assert_eq!(path, CrsResolution::Authority);
    }

    #[test]
    fn test_resolve_falls_back_to_definition() {
        let (code, path) = resolve_crs(&InitOnly("+init=epsg:4326")).unwrap();
        assert_eq!(code, CrsCode::Epsg4326);
        assert_eq!(path, CrsResolution::Definition);

        assert!(resolve_crs(&InitOnly("not a crs")).is_err());
    }

    #[test]
    fn test_display_and_geographic() {
        assert!(CrsCode::Epsg4326.is_geographic());
        assert!(!CrsCode::Epsg3857.is_geographic());
        assert_eq!(CrsCode::Epsg5070.to_string(), "EPSG:5070");
    }
}
