//! Integration tests for burning boundary layers onto reanalysis-shaped
//! fields.

use std::fs::File;

use boundary::{AttributeValue, BoundaryLayer, Feature};
use grid_common::{CrsCode, CrsDefinition, GeoTransform, GridError};
use grid_processor::{Coordinate, GriddedField};
use ndarray::{Array, IxDyn};
use rasterize::{rasterize_like, MaskData, MergeAlg, RasterDtype, RasterizeOptions, WhereMask};
use test_utils::fixtures::grid::INDIA_1DEG;
use test_utils::{
    constant_field, expected_rectangle_mask, multi, reanalysis_field, rectangle, temp_test_dir, triangle,
};

const BOX: (f64, f64, f64, f64) = (72.3, 20.3, 80.7, 30.7);

fn layer(features: Vec<Feature>) -> BoundaryLayer {
    BoundaryLayer::new(features, Some(CrsCode::Epsg4326.into()))
}

fn box_layer() -> BoundaryLayer {
    let (x0, y0, x1, y1) = BOX;
    layer(vec![Feature::new(multi(rectangle(x0, y0, x1, y1)))])
}

// =============================================================================
// Cell membership
// =============================================================================

#[test]
fn test_centre_rule_matches_reference() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let mask = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap();

    assert_eq!(mask.shape(), (34, 23));
    assert_eq!(mask.name(), "data");
    assert_eq!(mask.crs(), CrsCode::Epsg4326);
    assert!(matches!(mask.data(), MaskData::Presence(_)));

    let expected = expected_rectangle_mask(&INDIA_1DEG.lats(), &INDIA_1DEG.lons(), BOX);
    assert_eq!(mask.as_presence(), expected);
    // lat 21..=30, lon 73..=80
    assert_eq!(mask.count(), 10 * 8);
}

#[test]
fn test_all_touched_is_superset() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let tri = layer(vec![Feature::new(multi(triangle(70.2, 15.2, 9.5)))]);

    let centre = rasterize_like(&tri, &field, &RasterizeOptions::default()).unwrap();
    let touched = rasterize_like(&tri, &field, &RasterizeOptions::default().all_touched(true)).unwrap();

    let centre = centre.as_presence();
    let touched = touched.as_presence();
    assert!(centre.iter().zip(touched.iter()).all(|(&c, &t)| !c || t));
    let (nc, nt) = (
        centre.iter().filter(|&&v| v).count(),
        touched.iter().filter(|&&v| v).count(),
    );
    assert!(nc > 0);
    assert!(nt > nc);
}

#[test]
fn test_layer_in_projected_crs_is_reprojected() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let projected = box_layer().to_crs(&CrsCode::Epsg3577).unwrap();
    assert_eq!(projected.crs_code().unwrap(), CrsCode::Epsg3577);

    let mask = rasterize_like(&projected, &field, &RasterizeOptions::default()).unwrap();
    let expected = expected_rectangle_mask(&INDIA_1DEG.lats(), &INDIA_1DEG.lons(), BOX);
    assert_eq!(mask.as_presence(), expected);
}

// =============================================================================
// Attribute burning
// =============================================================================

#[test]
fn test_attribute_values_later_features_win() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let states = layer(vec![
        Feature::new(multi(rectangle(69.5, 29.5, 74.5, 35.5))).with_attribute("code", AttributeValue::Number(1.0)),
        Feature::new(multi(rectangle(72.5, 29.5, 76.5, 32.5))).with_attribute("code", AttributeValue::Text("2".into())),
        Feature::new(multi(rectangle(80.5, 10.5, 85.5, 15.5))).with_attribute("code", AttributeValue::Text("n/a".into())),
    ]);
    let options = RasterizeOptions::default().attribute("code").fill(f64::NAN);

    let mask = rasterize_like(&states, &field, &options).unwrap();
    assert_eq!(mask.dtype(), RasterDtype::F64);
    let values = mask.as_values();

    // Rows are lat 40 - row, cols are lon 68 + col
    assert_eq!(values[[10, 2]], 1.0); // 30N 70E
    assert_eq!(values[[10, 5]], 2.0); // 30N 73E: overwritten
    assert!(values[[28, 14]].is_nan()); // 12N 82E: text value skipped
    assert!(values[[0, 0]].is_nan());
}

#[test]
fn test_attribute_add_merge_and_integer_dtype() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let states = layer(vec![
        Feature::new(multi(rectangle(69.5, 29.5, 74.5, 35.5))).with_attribute("w", AttributeValue::Number(1.4)),
        Feature::new(multi(rectangle(72.5, 29.5, 76.5, 32.5))).with_attribute("w", AttributeValue::Number(1.4)),
    ]);
    let options = RasterizeOptions::default()
        .attribute("w")
        .merge(MergeAlg::Add)
        .dtype(RasterDtype::U8);

    let values = rasterize_like(&states, &field, &options).unwrap().as_values();
    assert_eq!(values[[10, 2]], 1.0);
    assert_eq!(values[[10, 5]], 3.0); // round(2.8)
    assert_eq!(values[[0, 0]], 0.0);
}

#[test]
fn test_presence_with_numeric_dtype_burns_ones() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let options = RasterizeOptions::default().dtype(RasterDtype::F32).fill(-1.0);

    let mask = rasterize_like(&box_layer(), &field, &options).unwrap();
    let MaskData::Values(values) = mask.data() else {
        panic!("expected a value grid");
    };
    assert_eq!(values[[15, 10]], 1.0); // 25N 78E
    assert_eq!(values[[0, 0]], -1.0);
}

#[test]
fn test_missing_attribute_column() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let err = rasterize_like(&box_layer(), &field, &RasterizeOptions::default().attribute("code")).unwrap_err();
    assert!(matches!(err, GridError::Configuration(_)));
}

// =============================================================================
// CRS and transform resolution
// =============================================================================

#[test]
fn test_missing_crs_is_configuration_error() {
    let field = constant_field(INDIA_1DEG, 1.0);
    let err = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap_err();
    assert!(matches!(err, GridError::Configuration(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_explicit_crs_through_definition_fallback() {
    let field = constant_field(INDIA_1DEG, 1.0);
    let options = RasterizeOptions::default().crs(CrsDefinition::new("+init=epsg:4326"));

    let mask = rasterize_like(&box_layer(), &field, &options).unwrap();
    assert_eq!(mask.crs(), CrsCode::Epsg4326);
    assert_eq!(mask.count(), 80);
}

#[test]
fn test_missing_transform_is_configuration_error() {
    let lons = vec![68.0, 69.0, 71.0, 74.0];
    let lats = vec![30.0, 29.0, 28.0];
    let field = GriddedField::new(
        "air",
        vec![Coordinate::numeric("lat", lats), Coordinate::numeric("lon", lons)],
        Array::zeros(IxDyn(&[3, 4])),
    )
    .unwrap()
    .with_crs(CrsCode::Epsg4326);

    let err = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap_err();
    assert!(matches!(err, GridError::Configuration(_)));

    // The field's transform metadata is the last resort
    let with_meta = field.with_transform(GeoTransform::from_origin(67.5, 30.5, 1.0, 1.0));
    assert!(rasterize_like(&box_layer(), &with_meta, &RasterizeOptions::default()).is_ok());
}

#[test]
fn test_field_with_two_times_is_rejected() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 2);
    let err = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap_err();
    assert!(matches!(err, GridError::InvalidDimensions { expected: 2, found: 3 }));
}

// =============================================================================
// Applying and exporting
// =============================================================================

#[test]
fn test_where_mask() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1).squeeze();
    let mask = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap();

    let masked = field.where_mask(&mask).unwrap();
    let grid = masked.spatial_2d("lat", "lon").unwrap();
    assert!(grid[[0, 0]].is_nan());
    assert_eq!(grid[[15, 10]], field.spatial_2d("lat", "lon").unwrap()[[15, 10]]);
    assert_eq!(grid.iter().filter(|v| !v.is_nan()).count(), 80);

    // The source field keeps its values
    assert!(!field.data().iter().any(|v| v.is_nan()));
}

#[test]
fn test_where_mask_shape_mismatch() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let mask = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap();
    let smaller = field
        .sel_slice("lat", grid_processor::LabelSlice::new(40.0, 30.0))
        .unwrap();

    let err = smaller.where_mask(&mask).unwrap_err();
    assert!(matches!(err, GridError::ShapeMismatch { .. }));
}

#[test]
fn test_export_geotiff() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let mask = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap();

    let dir = temp_test_dir();
    let path = dir.path().join("mask.tif");
    mask.export_geotiff(&path).unwrap();

    let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (23, 34));

    let scale = decoder.get_tag_f64_vec(tiff::tags::Tag::Unknown(33550)).unwrap();
    assert_eq!(scale, vec![1.0, 1.0, 0.0]);
    let tiepoint = decoder.get_tag_f64_vec(tiff::tags::Tag::Unknown(33922)).unwrap();
    assert_eq!(tiepoint, vec![0.0, 0.0, 0.0, 67.5, 40.5, 0.0]);

    match decoder.read_image().unwrap() {
        tiff::decoder::DecodingResult::F32(pixels) => {
            assert_eq!(pixels.len(), 23 * 34);
            assert_eq!(pixels.iter().filter(|&&v| v == 1.0).count(), 80);
        }
        _ => panic!("expected float32 pixels"),
    }
}

#[test]
fn test_export_geotiff_missing_directory() {
    let field = reanalysis_field(INDIA_1DEG, "1980-02-01", 1);
    let mask = rasterize_like(&box_layer(), &field, &RasterizeOptions::default()).unwrap();
    let dir = temp_test_dir();

    let err = mask.export_geotiff(dir.path().join("absent/mask.tif")).unwrap_err();
    assert!(matches!(err, GridError::Io(_)));
}
