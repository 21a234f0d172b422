//! ESRI shapefile reading.
//!
//! Polygon shapes (plain, M and Z) become features; other shape types are
//! skipped with a warning. Attributes come from the `.dbf` sidecar when it
//! exists and the CRS from the `.prj` sidecar.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use grid_common::CrsDefinition;
use shapefile::dbase::FieldValue;
use shapefile::{PolygonRing, Shape};
use tracing::{debug, warn};

use crate::error::BoundaryResult;
use crate::layer::{AttributeValue, BoundaryLayer, Feature};
use crate::prj::crs_from_prj;

/// Read a `.shp` file and its sidecars.
pub fn read_shapefile(path: &Path) -> BoundaryResult<BoundaryLayer> {
    let crs = read_prj(path)?;
    let dbf = path.with_extension("dbf");

    let mut features = Vec::new();
    let mut skipped = 0usize;
    if dbf.exists() {
        let mut reader = shapefile::Reader::from_path(path)?;
        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result?;
            match shape_to_multipolygon(shape) {
                Some(geometry) => {
                    let fields: HashMap<String, FieldValue> = record.into();
                    features.push(Feature {
                        geometry,
                        attributes: convert_record(fields),
                    });
                }
                None => skipped += 1,
            }
        }
    } else {
        debug!(path = %path.display(), "No .dbf sidecar, reading shapes without attributes");
        let mut reader = shapefile::ShapeReader::from_path(path)?;
        for shape in reader.iter_shapes() {
            match shape_to_multipolygon(shape?) {
                Some(geometry) => features.push(Feature::new(geometry)),
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped = skipped, "Skipped non-polygon shapes");
    }
    debug!(path = %path.display(), features = features.len(), crs = ?crs, "Read shapefile");
    Ok(BoundaryLayer::new(features, crs))
}

/// CRS from the `.prj` sidecar, if there is one.
fn read_prj(path: &Path) -> BoundaryResult<Option<CrsDefinition>> {
    let prj = path.with_extension("prj");
    if !prj.exists() {
        debug!(path = %path.display(), "No .prj sidecar");
        return Ok(None);
    }
    let wkt = std::fs::read_to_string(&prj)?;
    Ok(crs_from_prj(&wkt))
}

fn shape_to_multipolygon(shape: Shape) -> Option<MultiPolygon<f64>> {
    let rings: Vec<(bool, Vec<Coord<f64>>)> = match shape {
        Shape::Polygon(p) => p
            .rings()
            .iter()
            .map(|r| ring_coords(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonM(p) => p
            .rings()
            .iter()
            .map(|r| ring_coords(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        Shape::PolygonZ(p) => p
            .rings()
            .iter()
            .map(|r| ring_coords(r, |pt| Coord { x: pt.x, y: pt.y }))
            .collect(),
        _ => return None,
    };
    Some(assemble_polygons(rings))
}

fn ring_coords<P, F>(ring: &PolygonRing<P>, to_coord: F) -> (bool, Vec<Coord<f64>>)
where
    F: Fn(&P) -> Coord<f64>,
{
    let outer = matches!(ring, PolygonRing::Outer(_));
    (outer, ring.points().iter().map(to_coord).collect())
}

/// Group rings into polygons: each outer ring starts a polygon and the inner
/// rings that follow it are its holes.
fn assemble_polygons(rings: Vec<(bool, Vec<Coord<f64>>)>) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for (outer, coords) in rings {
        let ring = LineString(coords);
        match (outer, polygons.last_mut()) {
            (false, Some((_, holes))) => holes.push(ring),
            _ => polygons.push((ring, Vec::new())),
        }
    }
    MultiPolygon(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

fn convert_record(fields: HashMap<String, FieldValue>) -> BTreeMap<String, AttributeValue> {
    fields
        .into_iter()
        .map(|(name, value)| (name, convert_field(value)))
        .collect()
}

fn convert_field(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::Text(s.trim().to_string()),
        FieldValue::Numeric(Some(v)) => AttributeValue::Number(v),
        FieldValue::Float(Some(v)) => AttributeValue::Number(v as f64),
        FieldValue::Integer(v) => AttributeValue::Number(v as f64),
        FieldValue::Double(v) => AttributeValue::Number(v),
        FieldValue::Currency(v) => AttributeValue::Number(v),
        FieldValue::Logical(Some(v)) => AttributeValue::Text(v.to_string()),
        FieldValue::Memo(s) => AttributeValue::Text(s),
        FieldValue::Date(Some(d)) => AttributeValue::Text(d.to_string()),
        _ => AttributeValue::Null,
    }
}
