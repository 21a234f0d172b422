//! CRS sniffing for `.prj` sidecars.

use grid_common::{CrsCode, CrsDefinition};
use tracing::debug;

/// CRS of a `.prj` WKT string.
///
/// The outermost `AUTHORITY["EPSG", ...]` wins; a bare `GEOGCS` without one
/// is taken as WGS84. Anything else is kept verbatim so it can still be
/// resolved later or overridden by configuration.
pub fn crs_from_prj(wkt: &str) -> Option<CrsDefinition> {
    let wkt = wkt.trim();
    if wkt.is_empty() {
        return None;
    }

    if let Some(code) = CrsCode::from_wkt(wkt) {
        debug!(code = %code, "Recognised .prj CRS");
        return Some(code.into());
    }

    let upper = wkt.to_ascii_uppercase();
    if upper.starts_with("GEOGCS[") && !upper.contains("PROJCS[") {
        debug!("Bare GEOGCS in .prj, assuming EPSG:4326");
        return Some(CrsCode::Epsg4326.into());
    }

    debug!("Unrecognised .prj CRS kept as a definition string");
    Some(CrsDefinition::new(wkt))
}
