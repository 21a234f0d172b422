//! Single-band float32 GeoTIFF export.
//!
//! Georeferencing uses ModelPixelScale + ModelTiepoint for axis-aligned
//! grids and ModelTransformation otherwise, with a minimal GeoKey directory
//! naming the EPSG code.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use grid_common::{GeoTransform, GridError, GridResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::TiffError;
use tracing::info;

use crate::mask::Mask;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

impl Mask {
    /// Write the mask as a float32 GeoTIFF. Presence masks are written as
    /// 1.0 / 0.0; an existing file is overwritten.
    pub fn export_geotiff(&self, path: impl AsRef<Path>) -> GridResult<()> {
        let path = path.as_ref();
        let (rows, cols) = self.shape();
        let (pixels, transform) = north_up(self.as_values(), self.transform);

        let file = File::create(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(tiff_error)?;
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(cols as u32, rows as u32)
            .map_err(tiff_error)?;

        let dir = image.encoder();
        if transform.is_rectilinear() {
            dir.write_tag(
                Tag::Unknown(MODEL_PIXEL_SCALE),
                &[transform.a, -transform.e, 0.0][..],
            )
            .map_err(tiff_error)?;
            dir.write_tag(
                Tag::Unknown(MODEL_TIEPOINT),
                &[0.0, 0.0, 0.0, transform.c, transform.f, 0.0][..],
            )
            .map_err(tiff_error)?;
        } else {
            let t = transform;
            dir.write_tag(
                Tag::Unknown(MODEL_TRANSFORMATION),
                &[
                    t.a, t.b, 0.0, t.c, //
                    t.d, t.e, 0.0, t.f, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ][..],
            )
            .map_err(tiff_error)?;
        }
        dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geo_keys(self)[..])
            .map_err(tiff_error)?;
        dir.write_tag(Tag::Unknown(GDAL_NODATA), "nan").map_err(tiff_error)?;

        let data: Vec<f32> = pixels.iter().map(|&v| v as f32).collect();
        image.write_data(&data).map_err(tiff_error)?;

        info!(
            path = %path.display(),
            rows = rows,
            cols = cols,
            crs = %self.crs,
            "Exported mask as GeoTIFF"
        );
        Ok(())
    }
}

/// Flip south-up grids so the first row is the northernmost.
fn north_up(mut pixels: ndarray::Array2<f64>, transform: GeoTransform) -> (ndarray::Array2<f64>, GeoTransform) {
    if !transform.is_rectilinear() || transform.e <= 0.0 {
        return (pixels, transform);
    }
    let rows = pixels.nrows() as f64;
    pixels.invert_axis(ndarray::Axis(0));
    let flipped = GeoTransform::new(
        transform.a,
        0.0,
        transform.c,
        0.0,
        -transform.e,
        transform.f + transform.e * rows,
    );
    (pixels, flipped)
}

fn geo_keys(mask: &Mask) -> Vec<u16> {
    let epsg = mask.crs.epsg() as u16;
    let (model, crs_key) = if mask.crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE)
    };
    vec![
        1, 1, 0, 3, // version, revision, minor, key count
        GT_MODEL_TYPE, 0, 1, model,
        GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key, 0, 1, epsg,
    ]
}

fn tiff_error(err: TiffError) -> GridError {
    match err {
        TiffError::IoError(e) => GridError::Io(e),
        other => GridError::RenderError(format!("GeoTIFF encoding failed: {}", other)),
    }
}
