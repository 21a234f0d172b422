//! Integration tests for reading boundary layers from disk.

use std::convert::TryInto;
use std::path::Path;

use boundary::{read_boundary, AttributeValue};
use grid_common::{CrsCode, CrsDefinition, GridError};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use test_utils::temp_test_dir;

const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

fn square(x0: f64, y0: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x0, y0 + size),
        Point::new(x0 + size, y0 + size),
        Point::new(x0 + size, y0),
        Point::new(x0, y0),
    ]
}

/// Two states, the first with a hole.
fn write_states(path: &Path, prj: Option<&str>) {
    let table = TableWriterBuilder::new()
        .add_character_field("NAME".try_into().unwrap(), 32)
        .add_numeric_field("CODE".try_into().unwrap(), 10, 0);
    let mut writer = shapefile::Writer::from_path(path, table).expect("create shapefile");

    let shapes = [
        (
            Polygon::with_rings(vec![
                PolygonRing::Outer(square(70.0, 10.0, 10.0)),
                PolygonRing::Inner(square(73.0, 13.0, 2.0)),
            ]),
            "Alpha",
            1.0,
        ),
        (
            Polygon::with_rings(vec![PolygonRing::Outer(square(85.0, 20.0, 5.0))]),
            "Beta",
            2.0,
        ),
    ];
    for (polygon, name, code) in shapes.iter() {
        let mut record = Record::default();
        record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
        record.insert("CODE".to_string(), FieldValue::Numeric(Some(*code)));
        writer
            .write_shape_and_record(polygon, &record)
            .expect("write shape");
    }
    drop(writer);

    if let Some(prj) = prj {
        std::fs::write(path.with_extension("prj"), prj).expect("write prj");
    }
}

// =============================================================================
// Shapefile
// =============================================================================

#[test]
fn test_read_shapefile_with_attributes_and_prj() {
    let dir = temp_test_dir();
    let path = dir.path().join("states.shp");
    write_states(&path, Some(WGS84_PRJ));

    let layer = read_boundary(&path).unwrap();
    assert_eq!(layer.len(), 2);
    assert_eq!(layer.crs(), Some(&CrsDefinition::new("EPSG:4326")));
    assert_eq!(layer.crs_code().unwrap(), CrsCode::Epsg4326);

    let names: Vec<String> = layer
        .attribute("NAME")
        .into_iter()
        .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert_eq!(
        layer.features()[1].attribute("CODE"),
        Some(&AttributeValue::Number(2.0))
    );

    let alpha = &layer.features()[0].geometry;
    assert_eq!(alpha.0.len(), 1);
    assert_eq!(alpha.0[0].interiors().len(), 1);

    let bounds = layer.bounds().unwrap();
    assert_eq!(bounds.min_x, 70.0);
    assert_eq!(bounds.max_y, 25.0);
}

#[test]
fn test_shapefile_without_prj_has_no_crs() {
    let dir = temp_test_dir();
    let path = dir.path().join("states.shp");
    write_states(&path, None);

    let layer = read_boundary(&path).unwrap();
    assert!(layer.crs().is_none());
    let err = layer.crs_code().unwrap_err();
    assert!(matches!(err, GridError::Configuration(_)));
}

#[test]
fn test_shapefile_without_dbf_reads_geometry() {
    let dir = temp_test_dir();
    let path = dir.path().join("states.shp");
    write_states(&path, Some(WGS84_PRJ));
    std::fs::remove_file(path.with_extension("dbf")).unwrap();

    let layer = read_boundary(&path).unwrap();
    assert_eq!(layer.len(), 2);
    assert!(!layer.has_attribute("NAME"));
}

// =============================================================================
// GeoJSON
// =============================================================================

#[test]
fn test_read_geojson_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("districts.geojson");
    std::fs::write(
        &path,
        r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"district": "North", "id": 7},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[70, 10], [72, 10], [72, 12], [70, 12], [70, 10]]],
                        [[[75, 10], [76, 10], [76, 11], [75, 10]]]
                    ]
                }
            }]
        }"#,
    )
    .unwrap();

    let layer = read_boundary(&path).unwrap();
    assert_eq!(layer.len(), 1);
    assert_eq!(layer.features()[0].geometry.0.len(), 2);
    assert_eq!(layer.crs_code().unwrap(), CrsCode::Epsg4326);
    assert_eq!(
        layer.features()[0].attribute("id").and_then(|v| v.as_f64()),
        Some(7.0)
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unsupported_extension() {
    let dir = temp_test_dir();
    let path = dir.path().join("states.kml");
    std::fs::write(&path, "<kml/>").unwrap();

    let err = read_boundary(&path).unwrap_err();
    assert!(matches!(err, GridError::Configuration(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = temp_test_dir();
    let err = read_boundary(dir.path().join("absent.geojson")).unwrap_err();
    assert!(matches!(err, GridError::Io(_)));
}

#[test]
fn test_malformed_geojson_file_is_vector_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("broken.geojson");
    std::fs::write(&path, r#"{"type": "FeatureCollection", "features": ["#).unwrap();

    let err = read_boundary(&path).unwrap_err();
    assert!(matches!(err, GridError::VectorError(_)));
    assert_eq!(err.exit_code(), 4);
}
