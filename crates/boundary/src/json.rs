//! GeoJSON reading.
//!
//! Polygon and MultiPolygon geometries become features; GeometryCollections
//! are flattened and other geometry types are skipped. Properties become
//! attributes. RFC 7946 fixes the CRS to WGS84, but files written against
//! the 2008 draft may carry a `crs` member, which is honoured when present.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Geometry, JsonObject, PolygonType, Value};
use grid_common::{CrsCode, CrsDefinition};
use serde_json::Value as JsonValue;
use tracing::{debug, trace, warn};

use crate::error::{BoundaryError, BoundaryResult};
use crate::layer::{AttributeValue, BoundaryLayer, Feature};

/// Read a GeoJSON file into a boundary layer.
pub fn read_geojson(path: &Path) -> BoundaryResult<BoundaryLayer> {
    debug!(path = %path.display(), "Reading GeoJSON");
    let reader = BufReader::new(File::open(path)?);
    let geojson = GeoJson::from_reader(reader)?;
    let layer = layer_from_geojson(geojson)?;
    debug!(path = %path.display(), features = layer.len(), crs = ?layer.crs(), "Read GeoJSON");
    Ok(layer)
}

/// Parse GeoJSON text into a boundary layer.
pub fn parse_geojson(text: &str) -> BoundaryResult<BoundaryLayer> {
    let geojson: GeoJson = text.parse()?;
    layer_from_geojson(geojson)
}

fn layer_from_geojson(geojson: GeoJson) -> BoundaryResult<BoundaryLayer> {
    let (crs, raw) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = legacy_crs(fc.foreign_members.as_ref());
            let raw = fc
                .features
                .into_iter()
                .map(|f| (f.geometry, f.properties))
                .collect::<Vec<_>>();
            (crs, raw)
        }
        GeoJson::Feature(f) => {
            let crs = legacy_crs(f.foreign_members.as_ref());
            (crs, vec![(f.geometry, f.properties)])
        }
        GeoJson::Geometry(g) => {
            let crs = legacy_crs(g.foreign_members.as_ref());
            (crs, vec![(Some(g), None)])
        }
    };

    let mut features = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for (geometry, properties) in raw {
        let polygons = geometry.map(only_polys).unwrap_or_default();
        if polygons.is_empty() {
            skipped += 1;
            continue;
        }
        let polygons = polygons
            .into_iter()
            .map(polygon)
            .collect::<BoundaryResult<Vec<_>>>()?;
        features.push(Feature {
            geometry: MultiPolygon(polygons),
            attributes: properties.map(convert_properties).unwrap_or_default(),
        });
    }

    if skipped > 0 {
        warn!(skipped = skipped, "Skipped GeoJSON features without polygon geometry");
    }

    let crs = crs.unwrap_or_else(|| CrsCode::Epsg4326.into());
    Ok(BoundaryLayer::new(features, Some(crs)))
}

fn only_polys(geometry: Geometry) -> Vec<PolygonType> {
    match geometry.value {
        Value::Polygon(p) => vec![p],
        Value::MultiPolygon(mp) => mp,
        Value::GeometryCollection(gc) => gc.into_iter().flat_map(only_polys).collect(),
        _ => Vec::new(),
    }
}

fn polygon(mut rings: PolygonType) -> BoundaryResult<Polygon<f64>> {
    if rings.is_empty() {
        return Err(BoundaryError::InvalidGeometry("polygon without rings".into()));
    }
    let exterior = line_string(rings.remove(0))?;
    let interiors = rings
        .into_iter()
        .map(line_string)
        .collect::<BoundaryResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(positions: Vec<Vec<f64>>) -> BoundaryResult<LineString<f64>> {
    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(BoundaryError::InvalidGeometry(format!(
                "position with {} ordinates",
                p.len()
            ))),
        })
        .collect::<BoundaryResult<Vec<_>>>()?;
    let ls = LineString(coords);
    if !ls.is_closed() {
        return Err(BoundaryError::InvalidGeometry("ring is not closed".into()));
    }
    Ok(ls)
}

/// `{"crs": {"type": "name", "properties": {"name": "EPSG:4326"}}}`
fn legacy_crs(members: Option<&JsonObject>) -> Option<CrsDefinition> {
    let name = members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    trace!(crs = name, "GeoJSON declares a crs member");
    Some(CrsDefinition::new(normalize_ogc_urn(name)))
}

/// `urn:ogc:def:crs:EPSG::3577` → `EPSG:3577`, `urn:ogc:def:crs:OGC:1.3:CRS84` → `EPSG:4326`.
fn normalize_ogc_urn(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    if !lowered.starts_with("urn:ogc:def:crs:") {
        return name.to_string();
    }
    if lowered.ends_with("crs84") {
        return CrsCode::Epsg4326.to_string();
    }
    match name.rsplit(':').next() {
        Some(code) if lowered.contains(":epsg:") && code.chars().all(|c| c.is_ascii_digit()) => {
            format!("EPSG:{}", code)
        }
        _ => name.to_string(),
    }
}

fn convert_properties(properties: JsonObject) -> BTreeMap<String, AttributeValue> {
    properties
        .into_iter()
        .map(|(k, v)| (k, convert_json(v)))
        .collect()
}

fn convert_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Number(n) => n.as_f64().map(AttributeValue::Number).unwrap_or(AttributeValue::Null),
        JsonValue::String(s) => AttributeValue::Text(s),
        JsonValue::Bool(b) => AttributeValue::Text(b.to_string()),
        other => AttributeValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Goa", "code": 30, "note": null},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[73.5, 14.8], [74.3, 14.8], [74.3, 15.8], [73.5, 15.8], [73.5, 14.8]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"name": "road"},
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let layer = parse_geojson(SQUARE).unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.crs(), Some(&CrsDefinition::new("EPSG:4326")));

        let feature = &layer.features()[0];
        assert_eq!(feature.attribute("name"), Some(&AttributeValue::Text("Goa".into())));
        assert_eq!(feature.attribute("code"), Some(&AttributeValue::Number(30.0)));
        assert_eq!(feature.attribute("note"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_legacy_crs_member() {
        let text = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3577"}},
            "features": []
        }"#;
        let layer = parse_geojson(text).unwrap();
        assert_eq!(layer.crs(), Some(&CrsDefinition::new("EPSG:3577")));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_unclosed_ring_rejected() {
        let text = r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]}"#;
        let err = parse_geojson(text).unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidGeometry(_)));
    }

    #[test]
    fn test_normalize_ogc_urn() {
        assert_eq!(normalize_ogc_urn("urn:ogc:def:crs:OGC:1.3:CRS84"), "EPSG:4326");
        assert_eq!(normalize_ogc_urn("urn:ogc:def:crs:EPSG::4326"), "EPSG:4326");
        assert_eq!(normalize_ogc_urn("EPSG:3857"), "EPSG:3857");
    }
}
