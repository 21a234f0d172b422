//! Boundary outlines drawn over a rendered map.

use boundary::BoundaryLayer;
use geo::LineString;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_antialiased_line_segment_mut;

/// Geographic extent of the map area inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
    /// Pixel offset of the map's top-left corner
    pub x0: f64,
    pub y0: f64,
    /// Map size in pixels
    pub width: f64,
    pub height: f64,
}

impl MapFrame {
    /// lon/lat to canvas pixel coordinates.
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = self.x0 + (lon - self.west) / (self.east - self.west) * self.width;
        let y = self.y0 + (self.north - lat) / (self.north - self.south) * self.height;
        (x, y)
    }
}

/// Draw every ring of every feature as line segments.
///
/// The layer must already be in geographic coordinates. Segments outside
/// the canvas are clipped by the line drawer.
pub fn draw_boundaries(img: &mut RgbaImage, layer: &BoundaryLayer, frame: &MapFrame, color: Rgba<u8>) -> usize {
    let mut segments = 0;
    for feature in layer.features() {
        for polygon in &feature.geometry.0 {
            segments += draw_ring(img, polygon.exterior(), frame, color);
            for interior in polygon.interiors() {
                segments += draw_ring(img, interior, frame, color);
            }
        }
    }
    segments
}

fn draw_ring(img: &mut RgbaImage, ring: &LineString<f64>, frame: &MapFrame, color: Rgba<u8>) -> usize {
    let mut count = 0;
    for line in ring.lines() {
        let (x1, y1) = frame.to_pixel(line.start.x, line.start.y);
        let (x2, y2) = frame.to_pixel(line.end.x, line.end.y);
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            continue;
        }
        draw_antialiased_line_segment_mut(
            img,
            (x1.round() as i32, y1.round() as i32),
            (x2.round() as i32, y2.round() as i32),
            color,
            blend,
        );
        count += 1;
    }
    count
}

/// Source-over blend of the line colour, weighted by the anti-aliasing
/// coverage and the colour's own alpha.
fn blend(line: Rgba<u8>, under: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let alpha = coverage.clamp(0.0, 1.0) * line.0[3] as f32 / 255.0;
    let mix = |a: u8, b: u8| (a as f32 * alpha + b as f32 * (1.0 - alpha)).round() as u8;
    let out_alpha = (alpha * 255.0 + under.0[3] as f32 * (1.0 - alpha)).round() as u8;
    Rgba([
        mix(line.0[0], under.0[0]),
        mix(line.0[1], under.0[1]),
        mix(line.0[2], under.0[2]),
        out_alpha,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> MapFrame {
        MapFrame {
            west: 70.0,
            east: 80.0,
            south: 10.0,
            north: 20.0,
            x0: 0.0,
            y0: 5.0,
            width: 100.0,
            height: 100.0,
        }
    }

    #[test]
    fn test_to_pixel() {
        let f = frame();
        assert_eq!(f.to_pixel(70.0, 20.0), (0.0, 5.0));
        assert_eq!(f.to_pixel(80.0, 10.0), (100.0, 105.0));
        assert_eq!(f.to_pixel(75.0, 15.0), (50.0, 55.0));
    }

    #[test]
    fn test_blend_respects_alpha() {
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(blend(Rgba([0, 0, 0, 255]), white, 1.0), Rgba([0, 0, 0, 255]));
        assert_eq!(blend(Rgba([0, 0, 0, 0]), white, 1.0), white);
        assert_eq!(blend(Rgba([0, 0, 0, 255]), white, 0.5).0[0], 128);
    }
}
