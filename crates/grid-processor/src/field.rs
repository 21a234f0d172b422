//! Labelled gridded fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use grid_common::{CrsCode, GeoBox, GeoTransform, GridError, GridResult};
use ndarray::{Array2, ArrayD, Axis, Ix2};
use serde::{Deserialize, Serialize};

/// Attribute map attached to fields and coordinates.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A scalar or vector attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Numbers(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Number(v) => write!(f, "{}", v),
            AttrValue::Numbers(v) => write!(f, "{:?}", v),
        }
    }
}

/// Labels along one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordValues {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
}

impl CoordValues {
    pub fn len(&self) -> usize {
        match self {
            CoordValues::Numeric(v) => v.len(),
            CoordValues::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the labels at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> CoordValues {
        match self {
            CoordValues::Numeric(v) => CoordValues::Numeric(indices.iter().map(|&i| v[i]).collect()),
            CoordValues::Time(v) => CoordValues::Time(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Label at `index` formatted for display.
    pub fn label(&self, index: usize) -> Option<String> {
        match self {
            CoordValues::Numeric(v) => v.get(index).map(|x| x.to_string()),
            CoordValues::Time(v) => v.get(index).map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Whether labels are strictly increasing or strictly decreasing.
    fn is_monotonic(&self) -> bool {
        fn strictly<T: PartialOrd>(v: &[T]) -> bool {
            v.windows(2).all(|w| w[0] < w[1]) || v.windows(2).all(|w| w[0] > w[1])
        }
        match self {
            CoordValues::Numeric(v) => strictly(v),
            CoordValues::Time(v) => strictly(v),
        }
    }
}

/// A named coordinate (one per dimension).
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub name: String,
    pub values: CoordValues,
    pub attrs: Attributes,
}

impl Coordinate {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: CoordValues::Numeric(values),
            attrs: Attributes::new(),
        }
    }

    pub fn time(name: impl Into<String>, values: Vec<NaiveDateTime>) -> Self {
        Self {
            name: name.into(),
            values: CoordValues::Time(values),
            attrs: Attributes::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric labels, or an error for time coordinates.
    pub fn as_numeric(&self) -> GridResult<&[f64]> {
        match &self.values {
            CoordValues::Numeric(v) => Ok(v),
            CoordValues::Time(_) => Err(GridError::Configuration(format!(
                "coordinate '{}' holds time labels, expected numbers",
                self.name
            ))),
        }
    }

    /// Time labels, or an error for numeric coordinates.
    pub fn as_time(&self) -> GridResult<&[NaiveDateTime]> {
        match &self.values {
            CoordValues::Time(v) => Ok(v),
            CoordValues::Numeric(_) => Err(GridError::InvalidTime(format!(
                "coordinate '{}' does not hold time labels",
                self.name
            ))),
        }
    }

    /// True when labels decrease along the axis.
    pub fn is_descending(&self) -> bool {
        match &self.values {
            CoordValues::Numeric(v) => v.len() > 1 && v[0] > v[v.len() - 1],
            CoordValues::Time(v) => v.len() > 1 && v[0] > v[v.len() - 1],
        }
    }

    fn select(&self, indices: &[usize]) -> Coordinate {
        Coordinate {
            name: self.name.clone(),
            values: self.values.select(indices),
            attrs: self.attrs.clone(),
        }
    }
}

/// A labelled N-dimensional array of a physical quantity.
///
/// Every operation returns a new field; the receiver is never modified.
#[derive(Debug, Clone)]
pub struct GriddedField {
    name: String,
    coords: Vec<Coordinate>,
    /// Coordinates of dimensions dropped by `squeeze`
    scalar_coords: Vec<Coordinate>,
    data: ArrayD<f32>,
    attrs: Attributes,
    crs: Option<CrsCode>,
    transform: Option<GeoTransform>,
}

impl GriddedField {
    /// Build a field, checking the data shape against the coordinates and
    /// that every coordinate is monotonic.
    pub fn new(name: impl Into<String>, coords: Vec<Coordinate>, data: ArrayD<f32>) -> GridResult<Self> {
        let expected: Vec<usize> = coords.iter().map(Coordinate::len).collect();
        if data.shape() != expected.as_slice() {
            return Err(GridError::ShapeMismatch {
                expected,
                found: data.shape().to_vec(),
            });
        }
        for coord in &coords {
            if !coord.values.is_monotonic() {
                return Err(GridError::NonMonotonicCoordinate(coord.name.clone()));
            }
        }

        Ok(Self {
            name: name.into(),
            coords,
            scalar_coords: Vec::new(),
            data,
            attrs: Attributes::new(),
            crs: None,
            transform: None,
        })
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> Vec<&str> {
        self.coords.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn scalar_coords(&self) -> &[Coordinate] {
        &self.scalar_coords
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// String attribute by name.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(AttrValue::as_str)
    }

    /// The CRS recorded on the field, if any.
    pub fn crs(&self) -> Option<CrsCode> {
        self.crs
    }

    /// The affine transform recorded in the field's metadata, if any.
    pub fn transform(&self) -> Option<GeoTransform> {
        self.transform
    }

    /// Position of a dimension.
    pub fn axis_of(&self, dim: &str) -> GridResult<usize> {
        self.coords
            .iter()
            .position(|c| c.name == dim)
            .ok_or_else(|| GridError::DimensionNotFound(dim.to_string()))
    }

    /// Coordinate of a dimension, including dimensions squeezed away.
    pub fn coord(&self, dim: &str) -> GridResult<&Coordinate> {
        self.coords
            .iter()
            .chain(self.scalar_coords.iter())
            .find(|c| c.name == dim)
            .ok_or_else(|| GridError::DimensionNotFound(dim.to_string()))
    }

    /// Positional selection along one dimension.
    pub fn isel(&self, dim: &str, indices: &[usize]) -> GridResult<Self> {
        let axis = self.axis_of(dim)?;
        let len = self.data.len_of(Axis(axis));
        if let Some(bad) = indices.iter().find(|&&i| i >= len) {
            return Err(GridError::Configuration(format!(
                "index {} out of range for '{}' (length {})",
                bad, dim, len
            )));
        }

        let mut out = self.clone();
        out.data = self.data.select(Axis(axis), indices);
        out.coords[axis] = self.coords[axis].select(indices);
        Ok(out)
    }

    /// Drop every dimension of length one.
    ///
    /// Dropped coordinates are kept as scalar coordinates so their label (the
    /// selected date, for instance) stays available.
    pub fn squeeze(&self) -> Self {
        let mut out = self.clone();
        for axis in (0..self.coords.len()).rev() {
            if self.data.len_of(Axis(axis)) == 1 {
                out.data = out.data.index_axis(Axis(axis), 0).to_owned();
                let coord = out.coords.remove(axis);
                out.scalar_coords.insert(0, coord);
            }
        }
        out
    }

    /// The 2-D (rows = y, cols = x) view of a field after squeezing.
    ///
    /// Fails when more than two dimensions remain or the remaining ones are
    /// not `y_dim` and `x_dim`.
    pub fn spatial_2d(&self, y_dim: &str, x_dim: &str) -> GridResult<Array2<f32>> {
        let squeezed = self.squeeze_except(&[y_dim, x_dim]);
        let found = squeezed.ndim();
        if found != 2 {
            return Err(GridError::InvalidDimensions { expected: 2, found });
        }

        let y_axis = squeezed.axis_of(y_dim)?;
        let x_axis = squeezed.axis_of(x_dim)?;
        let array = squeezed
            .data
            .into_dimensionality::<Ix2>()
            .map_err(|_| GridError::InvalidDimensions { expected: 2, found })?;

        Ok(if y_axis < x_axis {
            array
        } else {
            array.reversed_axes()
        })
    }

    /// Squeeze singleton dimensions except the named ones.
    fn squeeze_except(&self, keep: &[&str]) -> Self {
        let mut out = self.clone();
        for axis in (0..self.coords.len()).rev() {
            if self.data.len_of(Axis(axis)) == 1 && !keep.contains(&self.coords[axis].name.as_str()) {
                out.data = out.data.index_axis(Axis(axis), 0).to_owned();
                let coord = out.coords.remove(axis);
                out.scalar_coords.insert(0, coord);
            }
        }
        out
    }

    /// Apply a function to every value.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        let mut out = self.clone();
        out.data.mapv_inplace(f);
        out
    }

    /// Replace values outside `keep` with NaN.
    ///
    /// `keep` is shaped (y, x) and is broadcast over every other dimension.
    pub fn where_presence(&self, keep: &Array2<bool>, y_dim: &str, x_dim: &str) -> GridResult<Self> {
        let y_axis = self.axis_of(y_dim)?;
        let x_axis = self.axis_of(x_dim)?;
        let expected = vec![self.shape()[y_axis], self.shape()[x_axis]];
        if keep.shape() != expected.as_slice() {
            return Err(GridError::ShapeMismatch {
                expected,
                found: keep.shape().to_vec(),
            });
        }

        let mut out = self.clone();
        for (index, value) in out.data.indexed_iter_mut() {
            if !keep[[index[y_axis], index[x_axis]]] {
                *value = f32::NAN;
            }
        }
        Ok(out)
    }

    /// Geobox derived from regularly spaced x/y labels.
    pub fn geobox(&self, y_dim: &str, x_dim: &str, rel_tol: f64) -> Option<GeoBox> {
        let x = self.coord(x_dim).ok()?.as_numeric().ok()?;
        let y = self.coord(y_dim).ok()?.as_numeric().ok()?;
        GeoBox::from_coords(x, y, rel_tol)
    }

    /// Minimum and maximum over non-NaN values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub(crate) fn replace_data(&self, data: ArrayD<f32>) -> Self {
        let mut out = self.clone();
        out.data = data;
        out
    }

    pub(crate) fn set_attr(&mut self, key: &str, value: AttrValue) {
        self.attrs.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::{Array, IxDyn};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1980, 2, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_field() -> GriddedField {
        let data = Array::from_shape_fn(IxDyn(&[2, 3, 4]), |ix| (ix[0] * 100 + ix[1] * 10 + ix[2]) as f32);
        GriddedField::new(
            "air",
            vec![
                Coordinate::time("time", vec![day(1), day(2)]),
                Coordinate::numeric("lat", vec![20.0, 10.0, 0.0]),
                Coordinate::numeric("lon", vec![70.0, 71.0, 72.0, 73.0]),
            ],
            data,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 2]));
        let err = GriddedField::new(
            "x",
            vec![
                Coordinate::numeric("lat", vec![0.0, 1.0, 2.0]),
                Coordinate::numeric("lon", vec![0.0, 1.0]),
            ],
            data,
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_non_monotonic() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[3]));
        let err = GriddedField::new("x", vec![Coordinate::numeric("lat", vec![0.0, 2.0, 1.0])], data)
            .unwrap_err();
        assert!(matches!(err, GridError::NonMonotonicCoordinate(_)));
    }

    #[test]
    fn test_isel_and_squeeze() {
        let field = sample_field();
        let one_day = field.isel("time", &[1]).unwrap();
        assert_eq!(one_day.shape(), &[1, 3, 4]);

        let squeezed = one_day.squeeze();
        assert_eq!(squeezed.dims(), vec!["lat", "lon"]);
        assert_eq!(squeezed.data()[IxDyn(&[2, 3])], 123.0);
        // Squeezed coordinate is still reachable
        assert!(squeezed.coord("time").is_ok());
        // Source untouched
        assert_eq!(field.shape(), &[2, 3, 4]);
    }

    #[test]
    fn test_spatial_2d_requires_two_dims() {
        let field = sample_field();
        assert!(matches!(
            field.spatial_2d("lat", "lon"),
            Err(GridError::InvalidDimensions { expected: 2, .. })
        ));

        let grid = field.isel("time", &[0]).unwrap().spatial_2d("lat", "lon").unwrap();
        assert_eq!(grid.dim(), (3, 4));
        assert_eq!(grid[[1, 2]], 12.0);
    }

    #[test]
    fn test_where_presence_broadcasts() {
        let field = sample_field();
        let mut keep = Array2::from_elem((3, 4), true);
        keep[[0, 0]] = false;

        let masked = field.where_presence(&keep, "lat", "lon").unwrap();
        assert!(masked.data()[IxDyn(&[0, 0, 0])].is_nan());
        assert!(masked.data()[IxDyn(&[1, 0, 0])].is_nan());
        assert_eq!(masked.data()[IxDyn(&[1, 0, 1])], 101.0);

        let wrong = Array2::from_elem((4, 3), true);
        assert!(matches!(
            field.where_presence(&wrong, "lat", "lon"),
            Err(GridError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_value_range_skips_nan() {
        let field = sample_field().map(|v| if v == 0.0 { f32::NAN } else { v });
        assert_eq!(field.value_range(), Some((1.0, 123.0)));
    }

    #[test]
    fn test_geobox_from_labels() {
        let geobox = sample_field().geobox("lat", "lon", 1e-3).unwrap();
        assert_eq!(geobox.width, 4);
        assert_eq!(geobox.height, 3);
        assert_eq!(geobox.transform.e, -10.0);
    }
}
