//! Native NetCDF reading using the netcdf library.
//!
//! Reanalysis files are opened by path, the requested variable is unpacked
//! to `f32` and every dimension is paired with its coordinate variable. The
//! file handle lives only as long as the read, so it is closed on every
//! return path.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::Once;

use chrono::NaiveDateTime;
use grid_common::{CrsCode, GeoTransform, GridError, GridResult};
use grid_processor::{AttrValue, Attributes, CoordValues, Coordinate, GriddedField, TimePeriod};
use ndarray::{ArrayD, IxDyn};
use netcdf::Extent;
use tracing::{debug, info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::time::{check_calendar, CfTimeUnits};

/// Attributes consumed while unpacking; they describe the stored bytes, not
/// the decoded values.
const PACKING_ATTRS: [&str; 4] = ["scale_factor", "add_offset", "_FillValue", "missing_value"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Only the first call has any effect.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open `variable` from a NetCDF file as a labelled field.
///
/// Packed values are unpacked with `scale_factor`/`add_offset`, fill and
/// missing values become NaN, CF time axes are decoded, and a CRS plus
/// affine transform are taken from the variable's `grid_mapping` when it
/// declares one.
pub fn open_gridded_field(path: impl AsRef<Path>, variable: &str) -> GridResult<GriddedField> {
    read_field(path.as_ref(), variable, None)
}

/// Like [`open_gridded_field`], but only the time steps inside the period
/// named by `time_label` (e.g. `"1980-02-02"`) are read from disk.
///
/// Fails with [`GridError::LabelNotFound`] when no step falls inside the
/// period. Variables without a time axis are read whole.
pub fn open_gridded_field_at(path: impl AsRef<Path>, variable: &str, time_label: &str) -> GridResult<GriddedField> {
    let period = TimePeriod::parse(time_label)?;
    read_field(path.as_ref(), variable, Some((time_label, &period)))
}

fn read_field(path: &Path, variable: &str, window: Option<(&str, &TimePeriod)>) -> GridResult<GriddedField> {
    if !path.exists() {
        return Err(GridError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    silence_hdf5_errors();
    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e)))?;

    let var = file
        .variable(variable)
        .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}' in {}", variable, path.display())))?;

    let mut coords = Vec::new();
    let mut extents: Vec<Extent> = Vec::new();
    for dim in var.dimensions() {
        let mut coord = read_coordinate(&file, &dim.name(), dim.len())?;
        let steps = match (window, &coord.values) {
            (Some((label, period)), CoordValues::Time(times)) => {
                Some(time_steps(times, period).ok_or_else(|| GridError::LabelNotFound {
                    dim: coord.name.clone(),
                    label: label.to_string(),
                })?)
            }
            _ => None,
        };
        let extent = match steps {
            Some(steps) => {
                debug!(dim = %coord.name, start = steps.start, end = steps.end, "Reading time window");
                coord.values = coord.values.select(&steps.clone().collect::<Vec<_>>());
                Extent::from(steps)
            }
            None => Extent::from(..),
        };
        coords.push(coord);
        extents.push(extent);
    }
    if window.is_some() && !coords.iter().any(|c| matches!(c.values, CoordValues::Time(_))) {
        warn!(variable = variable, "Variable has no time axis, reading it whole");
    }

    let raw: Vec<f64> = var.get_values(extents).map_err(NetCdfError::from)?;
    let packing = Packing::from_variable(&var);
    let values: Vec<f32> = raw.iter().map(|&v| packing.unpack(v)).collect();

    let shape: Vec<usize> = coords.iter().map(Coordinate::len).collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| NetCdfError::InvalidFormat(format!("variable '{}': {}", variable, e)))?;

    let mut field = GriddedField::new(variable, coords, data)?.with_attrs(read_attributes(&var));
    let (crs, transform) = read_grid_mapping(&file, &var);
    if let Some(crs) = crs {
        field = field.with_crs(crs);
    }
    if let Some(transform) = transform {
        field = field.with_transform(transform);
    }

    info!(
        path = %path.display(),
        variable = variable,
        shape = ?field.shape(),
        units = field.attr_str("units").unwrap_or("none"),
        "Loaded NetCDF variable"
    );
    Ok(field)
}

/// Contiguous index range of the steps inside `period`. Time axes are
/// monotonic, so the matching steps are adjacent.
fn time_steps(times: &[NaiveDateTime], period: &TimePeriod) -> Option<Range<usize>> {
    let first = times.iter().position(|t| period.contains(t))?;
    let last = times.iter().rposition(|t| period.contains(t))?;
    Some(first..last + 1)
}

/// Dimension and variable summary of a NetCDF file.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub path: String,
    pub dimensions: Vec<DimensionSummary>,
    pub variables: Vec<VariableSummary>,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSummary {
    pub name: String,
    pub len: usize,
    pub unlimited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    pub name: String,
    pub dims: Vec<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// Summarize a NetCDF file's structure.
pub fn describe(path: impl AsRef<Path>) -> GridResult<DatasetSummary> {
    let path = path.as_ref();
    silence_hdf5_errors();
    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e)))?;

    let dimensions = file
        .dimensions()
        .map(|d| DimensionSummary {
            name: d.name(),
            len: d.len(),
            unlimited: d.is_unlimited(),
        })
        .collect();

    let variables = file
        .variables()
        .map(|v| VariableSummary {
            name: v.name(),
            dims: v.dimensions().iter().map(|d| d.name()).collect(),
            units: get_str_attr(&v, "units"),
            long_name: get_str_attr(&v, "long_name"),
        })
        .collect();

    let attributes = file
        .attributes()
        .filter_map(|a| {
            let value = to_attr_value(a.value().ok()?)?;
            Some((a.name().to_string(), value.to_string()))
        })
        .collect();

    Ok(DatasetSummary {
        path: path.display().to_string(),
        dimensions,
        variables,
        attributes,
    })
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        writeln!(f, "dimensions:")?;
        for d in &self.dimensions {
            let unlimited = if d.unlimited { " (unlimited)" } else { "" };
            writeln!(f, "    {} = {}{}", d.name, d.len, unlimited)?;
        }
        writeln!(f, "variables:")?;
        for v in &self.variables {
            write!(f, "    {}({})", v.name, v.dims.join(", "))?;
            if let Some(units) = &v.units {
                write!(f, " [{}]", units)?;
            }
            if let Some(long_name) = &v.long_name {
                write!(f, " {}", long_name)?;
            }
            writeln!(f)?;
        }
        if !self.attributes.is_empty() {
            writeln!(f, "attributes:")?;
            for (k, v) in &self.attributes {
                writeln!(f, "    {} = {}", k, v)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Linear packing and missing-value markers of a variable.
#[derive(Debug, Clone, PartialEq)]
struct Packing {
    scale: f64,
    offset: f64,
    missing: Vec<f64>,
}

impl Packing {
    fn from_variable(var: &netcdf::Variable) -> Self {
        let mut missing = Vec::new();
        for name in ["_FillValue", "missing_value"] {
            match get_attr(var, name) {
                Some(AttrValue::Number(v)) => missing.push(v),
                Some(AttrValue::Numbers(v)) => missing.extend(v),
                _ => {}
            }
        }
        Self {
            scale: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            missing,
        }
    }

    fn unpack(&self, raw: f64) -> f32 {
        if raw.is_nan() || self.missing.iter().any(|&m| m == raw) {
            f32::NAN
        } else {
            (raw * self.scale + self.offset) as f32
        }
    }
}

fn read_coordinate(file: &netcdf::File, name: &str, len: usize) -> NetCdfResult<Coordinate> {
    let Some(var) = file.variable(name) else {
        debug!(dim = name, "No coordinate variable, using positional labels");
        return Ok(Coordinate::numeric(name, (0..len).map(|i| i as f64).collect()));
    };

    let values: Vec<f64> = var.get_values(..)?;
    if values.len() != len {
        return Err(NetCdfError::InvalidFormat(format!(
            "coordinate '{}' has {} values for a dimension of length {}",
            name,
            values.len(),
            len
        )));
    }

    let attrs = read_attributes(&var);
    let mut coord = match get_str_attr(&var, "units") {
        Some(units) if CfTimeUnits::is_time_units(&units) => {
            check_calendar(get_str_attr(&var, "calendar").as_deref())?;
            let times = CfTimeUnits::parse(&units)?.decode(&values)?;
            Coordinate::time(name, times)
        }
        _ => Coordinate::numeric(name, values),
    };
    coord.attrs = attrs;
    Ok(coord)
}

/// CRS and transform from the variable's `grid_mapping`, if declared.
fn read_grid_mapping(file: &netcdf::File, var: &netcdf::Variable) -> (Option<CrsCode>, Option<GeoTransform>) {
    let Some(mapping_name) = get_str_attr(var, "grid_mapping") else {
        return (None, None);
    };
    let Some(mapping) = file.variable(&mapping_name) else {
        warn!(grid_mapping = %mapping_name, "grid_mapping variable not found");
        return (None, None);
    };

    let crs = ["crs_wkt", "spatial_ref"]
        .iter()
        .filter_map(|name| get_str_attr(&mapping, name))
        .find_map(|wkt| CrsCode::from_wkt(&wkt))
        .or_else(|| match get_attr(&mapping, "epsg_code") {
            Some(AttrValue::Text(s)) => CrsCode::from_authority_str(&s).ok(),
            Some(AttrValue::Number(n)) => CrsCode::from_epsg(n as u32),
            _ => None,
        });
    if crs.is_none() {
        warn!(grid_mapping = %mapping_name, "grid_mapping has no supported CRS");
    }

    let transform = get_str_attr(&mapping, "GeoTransform").and_then(|s| GeoTransform::from_gdal_str(&s));
    debug!(grid_mapping = %mapping_name, crs = ?crs, transform = ?transform, "Read grid mapping");
    (crs, transform)
}

fn read_attributes(var: &netcdf::Variable) -> Attributes {
    var.attributes()
        .filter(|a| !PACKING_ATTRS.contains(&a.name()))
        .filter_map(|a| {
            let value = to_attr_value(a.value().ok()?)?;
            Some((a.name().to_string(), value))
        })
        .collect()
}

fn to_attr_value(value: netcdf::AttributeValue) -> Option<AttrValue> {
    use netcdf::AttributeValue as V;

    fn many<T: Into<f64>>(v: Vec<T>) -> AttrValue {
        AttrValue::Numbers(v.into_iter().map(Into::into).collect())
    }

    Some(match value {
        V::Str(s) => AttrValue::Text(s),
        V::Strs(v) => AttrValue::Text(v.join(", ")),
        V::Uchar(x) => AttrValue::Number(x.into()),
        V::Schar(x) => AttrValue::Number(x.into()),
        V::Ushort(x) => AttrValue::Number(x.into()),
        V::Short(x) => AttrValue::Number(x.into()),
        V::Uint(x) => AttrValue::Number(x.into()),
        V::Int(x) => AttrValue::Number(x.into()),
        V::Ulonglong(x) => AttrValue::Number(x as f64),
        V::Longlong(x) => AttrValue::Number(x as f64),
        V::Float(x) => AttrValue::Number(x.into()),
        V::Double(x) => AttrValue::Number(x),
        V::Uchars(v) => many(v),
        V::Schars(v) => many(v),
        V::Ushorts(v) => many(v),
        V::Shorts(v) => many(v),
        V::Uints(v) => many(v),
        V::Ints(v) => many(v),
        V::Floats(v) => many(v),
        V::Doubles(v) => AttrValue::Numbers(v),
        V::Ulonglongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        V::Longlongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        #[allow(unreachable_patterns)]
        _ => return None,
    })
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_attr(var: &netcdf::Variable, name: &str) -> Option<AttrValue> {
    if !has_attr(var, name) {
        return None;
    }
    to_attr_value(var.attribute_value(name)?.ok()?)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    get_attr(var, name)?.as_f64()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    match get_attr(var, name)? {
        AttrValue::Text(s) => Some(s),
        _ => None,
    }
}
