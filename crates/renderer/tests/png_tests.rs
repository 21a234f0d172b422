//! Tests for PNG encoding of rendered maps.

use renderer::png::{encode_png, encode_rgba, PNG_SIGNATURE};

// ============================================================================
// Helper functions
// ============================================================================

/// Pixels binned into `bins` colours along x, like a temperature map.
fn binned_pixels(width: usize, height: usize, bins: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for _ in 0..height {
        for x in 0..width {
            let bin = (x * bins / width) as u8;
            pixels.extend_from_slice(&[bin.wrapping_mul(7), 128, 255 - bin, 255]);
        }
    }
    pixels
}

/// Colour type byte from the IHDR chunk.
fn color_type(png: &[u8]) -> u8 {
    png[8 + 8 + 9]
}

// ============================================================================
// Format selection
// ============================================================================

#[test]
fn test_few_colours_encode_indexed() {
    let pixels = binned_pixels(64, 16, 30);
    let png = encode_png(&pixels, 64, 16).unwrap();
    assert_eq!(&png[..8], &PNG_SIGNATURE);
    assert_eq!(color_type(&png), 3);
}

#[test]
fn test_many_colours_fall_back_to_rgba() {
    let pixels: Vec<u8> = (0..400u32)
        .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 7, 255])
        .collect();
    let png = encode_png(&pixels, 20, 20).unwrap();
    assert_eq!(color_type(&png), 6);
}

#[test]
fn test_indexed_is_smaller_than_rgba() {
    let pixels = binned_pixels(256, 256, 30);
    let indexed = encode_png(&pixels, 256, 256).unwrap();
    let rgba = encode_rgba(&pixels, 256, 256).unwrap();
    assert!(indexed.len() < rgba.len());
}

// ============================================================================
// Round trip through a decoder
// ============================================================================

#[test]
fn test_indexed_decodes_to_same_pixels() {
    let mut pixels = binned_pixels(80, 80, 12);
    // One transparent pixel forces a tRNS chunk
    pixels[0..4].copy_from_slice(&[0, 0, 0, 0]);

    let png = encode_png(&pixels, 80, 80).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (80, 80));
    assert_eq!(decoded.as_raw(), &pixels);
}

#[test]
fn test_rgba_decodes_to_same_pixels() {
    let pixels = binned_pixels(10, 3, 10);
    let png = encode_rgba(&pixels, 10, 3).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw(), &pixels);
}
