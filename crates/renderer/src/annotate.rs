//! Text annotation with a TrueType font loaded at runtime.

use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

/// Load a TrueType font, logging and returning `None` when it is missing or
/// unreadable so the map can still be drawn without text.
pub fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read font, skipping annotation");
            return None;
        }
    };
    match Font::try_from_vec(bytes) {
        Some(font) => {
            debug!(path = %path.display(), "Loaded annotation font");
            Some(font)
        }
        None => {
            warn!(path = %path.display(), "Font file is not a valid TrueType font, skipping annotation");
            None
        }
    }
}

/// Draw `text` centred horizontally, vertically centred in the top `band`
/// pixels of the image. Returns the drawn text's (width, height).
pub fn draw_title(
    img: &mut RgbaImage,
    font: &Font<'_>,
    text: &str,
    font_size: f32,
    color: Rgba<u8>,
    band: u32,
) -> (i32, i32) {
    let scale = Scale::uniform(font_size);
    let (w, h) = text_size(scale, font, text);
    let x = (img.width() as i32 - w) / 2;
    let y = (band as i32 - h) / 2;
    draw_text_mut(img, color, x.max(0), y.max(0), scale, font, text);
    (w, h)
}

/// Height of a title band for `font_size` text.
pub fn title_band_height(font_size: f32) -> u32 {
    (font_size * 1.8).ceil() as u32
}
