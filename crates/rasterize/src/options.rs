//! Rasterization options.

use grid_common::{CrsDefinition, GeoTransform};
use serde::{Deserialize, Serialize};

/// How overlapping features combine in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAlg {
    /// Later features overwrite earlier ones.
    #[default]
    Replace,
    /// Values accumulate onto the background.
    Add,
}

/// Element type of the burned raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterDtype {
    Bool,
    U8,
    I32,
    F32,
    F64,
}

impl RasterDtype {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, RasterDtype::Bool)
    }

    /// Cast a burned value into the range of this type.
    ///
    /// Integer types round and saturate; NaN stays NaN so that "no data"
    /// survives the cast.
    pub fn cast(&self, value: f64) -> f64 {
        if value.is_nan() {
            return value;
        }
        match self {
            RasterDtype::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            RasterDtype::U8 => value.round().clamp(0.0, u8::MAX as f64),
            RasterDtype::I32 => value.round().clamp(i32::MIN as f64, i32::MAX as f64),
            RasterDtype::F32 => value as f32 as f64,
            RasterDtype::F64 => value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RasterDtype::Bool => "bool",
            RasterDtype::U8 => "uint8",
            RasterDtype::I32 => "int32",
            RasterDtype::F32 => "float32",
            RasterDtype::F64 => "float64",
        }
    }
}

/// Options for [`crate::rasterize_like`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizeOptions {
    /// Burn this numeric attribute instead of presence.
    pub attribute_column: Option<String>,
    /// CRS to assume when the template field has none.
    pub crs: Option<CrsDefinition>,
    /// Transform to use instead of the one derived from the template.
    pub transform: Option<GeoTransform>,
    pub x_dim: String,
    pub y_dim: String,
    /// Burn every cell the polygon touches rather than cells whose centre
    /// falls inside it.
    pub all_touched: bool,
    pub merge: MergeAlg,
    /// Output type. `None` gives booleans for presence masks and `f64` for
    /// attribute burns.
    pub dtype: Option<RasterDtype>,
    /// Background value for numeric output.
    pub fill: f64,
    /// Mask name, `"data"` when unset.
    pub name: Option<String>,
}

impl Default for RasterizeOptions {
    fn default() -> Self {
        Self {
            attribute_column: None,
            crs: None,
            transform: None,
            x_dim: "lon".to_string(),
            y_dim: "lat".to_string(),
            all_touched: false,
            merge: MergeAlg::Replace,
            dtype: None,
            fill: 0.0,
            name: None,
        }
    }
}

impl RasterizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, column: impl Into<String>) -> Self {
        self.attribute_column = Some(column.into());
        self
    }

    pub fn crs(mut self, crs: impl Into<CrsDefinition>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn dims(mut self, y_dim: impl Into<String>, x_dim: impl Into<String>) -> Self {
        self.y_dim = y_dim.into();
        self.x_dim = x_dim.into();
        self
    }

    pub fn all_touched(mut self, all_touched: bool) -> Self {
        self.all_touched = all_touched;
        self
    }

    pub fn merge(mut self, merge: MergeAlg) -> Self {
        self.merge = merge;
        self
    }

    pub fn dtype(mut self, dtype: RasterDtype) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn fill(mut self, fill: f64) -> Self {
        self.fill = fill;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Output type after applying the defaults.
    pub fn effective_dtype(&self) -> RasterDtype {
        match (self.dtype, &self.attribute_column) {
            (Some(dtype), _) => dtype,
            (None, Some(_)) => RasterDtype::F64,
            (None, None) => RasterDtype::Bool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RasterizeOptions::default();
        assert_eq!(opts.x_dim, "lon");
        assert_eq!(opts.y_dim, "lat");
        assert!(!opts.all_touched);
        assert_eq!(opts.merge, MergeAlg::Replace);
        assert_eq!(opts.effective_dtype(), RasterDtype::Bool);
        assert_eq!(opts.clone().attribute("id").effective_dtype(), RasterDtype::F64);
        assert_eq!(opts.dtype(RasterDtype::U8).effective_dtype(), RasterDtype::U8);
    }

    #[test]
    fn test_integer_cast_rounds_and_saturates() {
        assert_eq!(RasterDtype::U8.cast(300.0), 255.0);
        assert_eq!(RasterDtype::U8.cast(-4.0), 0.0);
        assert_eq!(RasterDtype::U8.cast(2.6), 3.0);
        assert_eq!(RasterDtype::I32.cast(1e12), i32::MAX as f64);
        assert!(RasterDtype::I32.cast(f64::NAN).is_nan());
        assert_eq!(RasterDtype::Bool.cast(7.0), 1.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: RasterizeOptions =
            serde_json::from_str(r#"{"all_touched": true, "merge": "add", "dtype": "i32"}"#).unwrap();
        assert!(opts.all_touched);
        assert_eq!(opts.merge, MergeAlg::Add);
        assert_eq!(opts.dtype, Some(RasterDtype::I32));
        assert_eq!(opts.x_dim, "lon");
    }
}
