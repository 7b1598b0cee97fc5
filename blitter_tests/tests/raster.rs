// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use blitter::{
    Font, FontLoadError, GlyphStatus, OutlineSource, PixelSize, RasterError, Rasterize, Rasterizer,
};
use blitter_dev::SyntheticFont;

use crate::util::{CELL, covered_area};

fn sample_codepoints() -> impl Iterator<Item = u32> {
    (0x20..=0x7E).chain(0x80..=0x190).chain([SyntheticFont::TRIANGLE])
}

#[test]
fn raster_bitmap_fits_cell() {
    let font = SyntheticFont::sample();
    let rasterizer = Rasterizer::default();
    let sizes = [
        PixelSize::square(8),
        PixelSize::square(17),
        CELL,
        PixelSize::new(20, 40),
        PixelSize::new(40, 20),
    ];
    for size in sizes {
        for codepoint in sample_codepoints() {
            let glyph = rasterizer.rasterize(&font, codepoint, size).unwrap();
            let metrics = glyph.metrics();
            assert!(
                metrics.min_width <= size.width && metrics.min_height <= size.height,
                "U+{codepoint:04X} at {size:?} is {}x{}",
                metrics.min_width,
                metrics.min_height
            );
            assert_eq!(
                glyph.bitmap().data().len(),
                (metrics.min_width * metrics.min_height) as usize,
                "bitmap holds exactly min_width x min_height texels"
            );
        }
    }
}

#[test]
fn raster_is_deterministic() {
    let font = SyntheticFont::sample();
    let rasterizer = Rasterizer::default();
    for codepoint in [0x41, 0x82, SyntheticFont::TRIANGLE] {
        let first = rasterizer.rasterize(&font, codepoint, CELL).unwrap();
        let second = rasterizer.rasterize(&font, codepoint, CELL).unwrap();
        assert_eq!(first, second, "U+{codepoint:04X} differs between runs");
    }
}

#[test]
fn raster_box_metrics() {
    let font = SyntheticFont::sample();
    // 500 units tall, 100..500 units wide: 3.2..16 by 0..16 pixels.
    let glyph = Rasterizer::default().rasterize(&font, 128, CELL).unwrap();
    let metrics = glyph.metrics();
    assert_eq!(glyph.status(), GlyphStatus::Rendered);
    assert_eq!((metrics.min_width, metrics.min_height), (13, 16));
    assert_eq!((metrics.x_offset, metrics.y_offset), (3, -16));
    assert!((metrics.advance_width - 19.2).abs() < 1e-4, "advance is 600 units");
    assert!((metrics.left_side_bearing - 3.2).abs() < 1e-4, "bearing is 100 units");

    let bitmap = glyph.bitmap();
    let edge = bitmap.coverage(0, 0).unwrap();
    assert!((203..=205).contains(&edge), "left column is 80% covered, got {edge}");
    assert_eq!(bitmap.coverage(1, 0), Some(255));
    assert_eq!(bitmap.coverage(12, 15), Some(255));
}

#[test]
fn raster_descender_extends_below_baseline() {
    let font = SyntheticFont::sample();
    // 130 is a multiple of five: -200..700 units.
    let metrics = *Rasterizer::default()
        .rasterize(&font, 130, CELL)
        .unwrap()
        .metrics();
    assert_eq!(metrics.y_offset, -23);
    assert_eq!(metrics.min_height, 30);
    assert!(
        metrics.y_offset + metrics.min_height as i32 > 0,
        "bitmap reaches below the baseline"
    );
}

#[test]
fn raster_tall_glyph_is_clamped() {
    let font = SyntheticFont::sample();
    // '7' spans -200..900 units, 35.2 pixels at this size.
    let metrics = *Rasterizer::default()
        .rasterize(&font, '7'.into(), CELL)
        .unwrap()
        .metrics();
    assert_eq!(metrics.min_height, CELL.height);
    assert_eq!(metrics.y_offset, -29, "clamping keeps the top edge");
}

#[test]
fn raster_triangle_area() {
    let font = SyntheticFont::sample();
    let glyph = Rasterizer::default()
        .rasterize(&font, SyntheticFont::TRIANGLE, CELL)
        .unwrap();
    assert_eq!(
        (glyph.metrics().min_width, glyph.metrics().min_height),
        (32, 32)
    );
    let area = covered_area(glyph.bitmap());
    assert!((area - 512.0).abs() < 2.0, "triangle covers ~512 pixels, got {area}");
}

#[test]
fn raster_space_has_advance_only() {
    let font = SyntheticFont::sample();
    let glyph = Rasterizer::default().rasterize(&font, 0x20, CELL).unwrap();
    assert_eq!(glyph.status(), GlyphStatus::Rendered);
    assert_eq!(glyph.metrics().min_width, 0);
    assert_eq!(glyph.metrics().min_height, 0);
    assert!(glyph.metrics().advance_width > 0.0, "space still advances");
}

#[test]
fn raster_missing_glyph_is_distinct_from_failure() {
    let font = SyntheticFont::sample();
    let rasterizer = Rasterizer::default();
    assert_eq!(
        rasterizer.rasterize(&font, 0x1F600, CELL),
        Err(RasterError::MissingGlyph { codepoint: 0x1F600 })
    );
    let err = rasterizer
        .rasterize(&font, SyntheticFont::CORRUPT, CELL)
        .unwrap_err();
    assert!(
        matches!(err, RasterError::RasterizationFailure { .. }),
        "corrupt outline is a failure, got {err:?}"
    );
    assert!(
        err.to_string().contains("truncated glyf entry"),
        "message carries the reason: {err}"
    );
}

#[test]
fn raster_placeholder_advances_by_notdef() {
    let font = SyntheticFont::sample();
    let glyph = Rasterizer::default().placeholder(&font, 0x1F600, CELL);
    assert!(glyph.is_missing(), "placeholder has missing status");
    assert!(glyph.bitmap().is_empty(), "placeholder is 0x0");
    let expected = SyntheticFont::NOTDEF_ADVANCE * 32.0 / f32::from(font.units_per_em());
    assert!((glyph.metrics().advance_width - expected).abs() < 1e-4, "notdef advance");
}

#[test]
fn font_load_rejects_non_fonts() {
    let err = Font::from_bytes(b"definitely not a font".to_vec(), 0).unwrap_err();
    assert!(matches!(err, FontLoadError::Parse(_)), "got {err:?}");

    let err = Font::from_path("no/such/font.ttf").unwrap_err();
    assert!(matches!(err, FontLoadError::Io { .. }), "got {err:?}");
    assert!(
        core::error::Error::source(&err).is_some(),
        "I/O errors expose their cause"
    );
}
