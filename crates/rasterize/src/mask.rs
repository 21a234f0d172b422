//! Masks produced by rasterizing a boundary layer.

use grid_common::{CrsCode, GeoTransform, GridResult};
use grid_processor::{Attributes, Coordinate, GriddedField};
use ndarray::Array2;

use crate::options::RasterDtype;

/// Cell values of a mask, shaped (y, x).
#[derive(Debug, Clone, PartialEq)]
pub enum MaskData {
    /// Inside / outside any feature.
    Presence(Array2<bool>),
    /// Burned attribute values (or presence as 1.0) over the fill value.
    Values(Array2<f64>),
}

/// A 2-D raster aligned with the spatial grid of the field it was built from.
#[derive(Debug, Clone)]
pub struct Mask {
    pub(crate) name: String,
    pub(crate) data: MaskData,
    pub(crate) y: Coordinate,
    pub(crate) x: Coordinate,
    pub(crate) crs: CrsCode,
    pub(crate) transform: GeoTransform,
    pub(crate) dtype: RasterDtype,
    pub(crate) attrs: Attributes,
}

impl Mask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &MaskData {
        &self.data
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        match &self.data {
            MaskData::Presence(a) => a.dim(),
            MaskData::Values(a) => a.dim(),
        }
    }

    pub fn y(&self) -> &Coordinate {
        &self.y
    }

    pub fn x(&self) -> &Coordinate {
        &self.x
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn dtype(&self) -> RasterDtype {
        self.dtype
    }

    /// Attributes copied from the template field.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Boolean view: non-zero, non-NaN values count as inside.
    pub fn as_presence(&self) -> Array2<bool> {
        match &self.data {
            MaskData::Presence(a) => a.clone(),
            MaskData::Values(a) => a.mapv(|v| !v.is_nan() && v != 0.0),
        }
    }

    /// Numeric view: presence becomes 1.0 / 0.0.
    pub fn as_values(&self) -> Array2<f64> {
        match &self.data {
            MaskData::Presence(a) => a.mapv(|inside| if inside { 1.0 } else { 0.0 }),
            MaskData::Values(a) => a.clone(),
        }
    }

    /// Number of cells inside the mask.
    pub fn count(&self) -> usize {
        self.as_presence().iter().filter(|&&inside| inside).count()
    }
}

/// `where` with a rasterized mask.
pub trait WhereMask {
    /// Cells where the mask is false, zero or NaN become NaN.
    fn where_mask(&self, mask: &Mask) -> GridResult<GriddedField>;
}

impl WhereMask for GriddedField {
    fn where_mask(&self, mask: &Mask) -> GridResult<GriddedField> {
        self.where_presence(&mask.as_presence(), &mask.y.name, &mask.x.name)
    }
}
