//! Common test fixtures for airmap tests.
//!
//! Regions and dates mirror the two workflows the CLI runs (`plot` and
//! `mask`), so tests exercise the same numbers production does.

/// Latitude/longitude regions, each given as (start, stop) in the order the
/// reanalysis axis runs.
pub mod region {
    /// Daily forecast map over India
    pub const PLOT_LAT: (f64, f64) = (39.0, 6.2);
    pub const PLOT_LON: (f64, f64) = (67.0, 97.5);

    /// Masked subset around the Indian subcontinent
    pub const MASK_LAT: (f64, f64) = (40.5, 7.5);
    pub const MASK_LON: (f64, f64) = (68.0, 90.5);
}

/// Common grid layouts.
pub mod grid {
    /// Regular global grid with descending latitudes.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        /// First (northernmost) latitude label
        pub lat0: f64,
        pub dlat: f64,
        pub lon0: f64,
        pub dlon: f64,
    }

    impl GridSpec {
        pub fn lats(&self) -> Vec<f64> {
            (0..self.height).map(|i| self.lat0 + self.dlat * i as f64).collect()
        }

        pub fn lons(&self) -> Vec<f64> {
            (0..self.width).map(|i| self.lon0 + self.dlon * i as f64).collect()
        }
    }

    /// 1.5 degree global grid, 90 → -90, 0 → 358.5
    pub const GLOBAL_1P5: GridSpec = GridSpec {
        width: 240,
        height: 121,
        lat0: 90.0,
        dlat: -1.5,
        lon0: 0.0,
        dlon: 1.5,
    };

    /// Small 1 degree grid over the mask region
    pub const INDIA_1DEG: GridSpec = GridSpec {
        width: 23,
        height: 34,
        lat0: 40.0,
        dlat: -1.0,
        lon0: 68.0,
        dlon: 1.0,
    };
}

/// Common time labels.
pub mod time {
    /// Date used by the masking workflow
    pub const MASK_DATE: &str = "1980-02-02";

    /// Year of the sample reanalysis file
    pub const YEAR: i32 = 1980;

    /// Reanalysis file name for [`YEAR`]
    pub const REANALYSIS_FILE: &str = "air.2m.gauss.1980.nc";
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// GDA94 / Australian Albers
    pub const EPSG_3577: &str = "EPSG:3577";

    /// Legacy PROJ init form
    pub const INIT_4326: &str = "+init=epsg:4326";
}
