//! Labelled gridded fields and the operations the map pipeline runs on them.
//!
//! A [`GriddedField`] is an N-dimensional `f32` array with one coordinate per
//! dimension. Every operation borrows the field and returns a new one, so a
//! loaded cube can be subset several times without re-reading the file.
//!
//! # Architecture
//!
//! ```text
//! GriddedField (time × lat × lon, Kelvin)
//!      │
//!      ├─► subset(SubsetRequest)
//!      │         ├─► sel_time("1980-02-02")   period match on the time axis
//!      │         └─► sel_slice(lat / lon)     inclusive, axis-ordered
//!      │
//!      ├─► UnitConversion::apply              validated K → °C
//!      │
//!      ├─► where_presence(mask)               outside cells become NaN
//!      │
//!      └─► squeeze / spatial_2d               plot-ready 2-D grid
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{SubsetRequest, UnitConversion};
//!
//! let request = SubsetRequest::new().time("1980-02-02").lat(39.0, 6.2).lon(67.0, 97.5);
//! let subset = field.subset(&request)?;
//! let celsius = UnitConversion::default().apply(&subset)?;
//! let grid = celsius.spatial_2d("lat", "lon")?;
//! ```

pub mod field;
pub mod select;
pub mod units;

// Re-export commonly used types at crate root
pub use field::{AttrValue, Attributes, CoordValues, Coordinate, GriddedField};
pub use select::{LabelSlice, SubsetRequest, TimePeriod};
pub use units::{UnitConversion, Units, DEFAULT_KELVIN_OFFSET, KELVIN_OFFSET_EXACT};
