//! Full map figure: colour-binned cells, boundary outlines, title band and
//! legend strip.

use std::path::{Path, PathBuf};

use boundary::BoundaryLayer;
use grid_common::{Color, ColorScale, CrsCode, GridResult};
use grid_processor::GriddedField;
use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotate::{draw_title, load_font, title_band_height};
use crate::overlay::{draw_boundaries, MapFrame};
use crate::png::encode_png;
use crate::raster::{orient_north_up, render_cells, render_legend};

/// Layout and decoration settings for a map figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pixels per grid cell along each axis
    pub cell_size: u32,
    pub line_color: Color,
    pub text_color: Color,
    pub background: Color,
    /// TrueType font for the title; no title is drawn without one
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    /// Height of the legend strip below the map, 0 to disable
    pub legend_height: u32,
    pub y_dim: String,
    pub x_dim: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_size: 16,
            line_color: Color::Rgba { r: 0, g: 0, b: 0, a: 200 },
            text_color: Color::rgb(0, 0, 0),
            background: Color::rgb(255, 255, 255),
            font_path: None,
            font_size: 16.0,
            legend_height: 12,
            y_dim: "lat".to_string(),
            x_dim: "lon".to_string(),
        }
    }
}

/// Gap between the map and the legend strip
const LEGEND_GAP: u32 = 4;

/// A rendered figure.
#[derive(Debug, Clone)]
pub struct MapImage {
    pub image: RgbaImage,
    /// Where the grid cells were placed
    pub frame: MapFrame,
    /// Number of boundary segments drawn
    pub segments: usize,
    /// Whether the title text was drawn
    pub annotated: bool,
}

impl MapImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> GridResult<Vec<u8>> {
        encode_png(self.image.as_raw(), self.width() as usize, self.height() as usize)
    }

    /// Encode and write, overwriting an existing file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> GridResult<()> {
        let path = path.as_ref();
        let bytes = self.to_png()?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), width = self.width(), height = self.height(), "Wrote map");
        Ok(())
    }
}

/// Render a plot-ready field.
///
/// The field must squeeze to 2-D over `y_dim` × `x_dim` with numeric labels.
/// `overlay` is reprojected to geographic coordinates when it declares
/// another CRS. `title` is drawn in a band above the map when a font is
/// configured and loads.
pub fn render_map(
    field: &GriddedField,
    scale: &ColorScale,
    overlay: Option<&BoundaryLayer>,
    title: Option<&str>,
    options: &RenderOptions,
) -> GridResult<MapImage> {
    scale.validate()?;
    let grid = field.spatial_2d(&options.y_dim, &options.x_dim)?;
    let lat = field.coord(&options.y_dim)?;
    let lon = field.coord(&options.x_dim)?;
    let (west, east) = cell_extent(lon.as_numeric()?);
    let (south, north) = cell_extent(lat.as_numeric()?);

    let grid = orient_north_up(grid, lat.is_descending(), lon.is_descending());
    let cells = render_cells(&grid, scale, options.cell_size);

    let font = title.and(options.font_path.as_deref()).and_then(load_font);
    if title.is_some() && options.font_path.is_none() {
        warn!("No font configured, skipping annotation");
    }
    let band = match (&font, title) {
        (Some(_), Some(_)) => title_band_height(options.font_size),
        _ => 0,
    };
    let legend = if options.legend_height > 0 {
        options.legend_height + LEGEND_GAP
    } else {
        0
    };

    let width = cells.width();
    let height = band + cells.height() + legend;
    let (r, g, b, a) = options.background.to_rgba();
    let mut image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, a]));
    imageops::overlay(&mut image, &cells, 0, band as i64);

    if options.legend_height > 0 {
        let strip = render_legend(scale, width, options.legend_height);
        imageops::replace(&mut image, &strip, 0, (band + cells.height() + LEGEND_GAP) as i64);
    }

    let frame = MapFrame {
        west,
        east,
        south,
        north,
        x0: 0.0,
        y0: band as f64,
        width: cells.width() as f64,
        height: cells.height() as f64,
    };

    let segments = match overlay {
        Some(layer) => {
            let geographic = to_geographic(layer)?;
            let (r, g, b, a) = options.line_color.to_rgba();
            draw_boundaries(&mut image, &geographic, &frame, Rgba([r, g, b, a]))
        }
        None => 0,
    };

    let annotated = match (&font, title) {
        (Some(font), Some(text)) => {
            let (r, g, b, a) = options.text_color.to_rgba();
            draw_title(&mut image, font, text, options.font_size, Rgba([r, g, b, a]), band);
            true
        }
        _ => false,
    };

    debug!(
        width = width,
        height = height,
        segments = segments,
        annotated = annotated,
        "Rendered map"
    );
    Ok(MapImage {
        image,
        frame,
        segments,
        annotated,
    })
}

/// Outer edges of the cells whose centres are `labels`.
fn cell_extent(labels: &[f64]) -> (f64, f64) {
    let lo = labels.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = labels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let half = if labels.len() > 1 {
        (hi - lo) / (labels.len() - 1) as f64 / 2.0
    } else {
        0.5
    };
    (lo - half, hi + half)
}

fn to_geographic(layer: &BoundaryLayer) -> GridResult<BoundaryLayer> {
    match layer.crs() {
        None => {
            warn!("Boundary layer has no CRS, drawing it as longitude/latitude");
            Ok(layer.clone())
        }
        Some(_) => {
            let code = layer.crs_code()?;
            if code.is_geographic() {
                Ok(layer.clone())
            } else {
                layer.to_crs(&CrsCode::Epsg4326)
            }
        }
    }
}

/// Render and write in one step.
pub fn render_to_file(
    field: &GriddedField,
    scale: &ColorScale,
    overlay: Option<&BoundaryLayer>,
    title: Option<&str>,
    options: &RenderOptions,
    path: impl AsRef<Path>,
) -> GridResult<MapImage> {
    let map = render_map(field, scale, overlay, title, options)?;
    map.save_png(path)?;
    Ok(map)
}
