// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Helpers shared across tests.

use blitter::{CacheOptions, Canvas, GlyphBitmap, GlyphCache, PixelSize, Rgba8};
use blitter_dev::CountingRasterizer;

/// The nominal cell used throughout the usage script.
pub(crate) const CELL: PixelSize = PixelSize::square(32);

/// A cache whose rasterizer counts its calls.
pub(crate) fn counting_cache(options: CacheOptions) -> GlyphCache<CountingRasterizer> {
    GlyphCache::with_rasterizer(CountingRasterizer::new(), options)
}

/// Sum of coverage, in units of fully covered pixels.
pub(crate) fn covered_area(bitmap: &GlyphBitmap) -> f32 {
    bitmap.data().iter().map(|&c| f32::from(c) / 255.0).sum()
}

/// Number of canvas pixels that differ from `background`.
pub(crate) fn painted_pixels(canvas: &Canvas, background: Rgba8) -> usize {
    canvas.pixels().iter().filter(|&&p| p != background).count()
}

/// Bounding box of the painted pixels as `(left, top, right, bottom)`, exclusive.
pub(crate) fn painted_bounds(canvas: &Canvas, background: Rgba8) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            if canvas.pixel(x, y) == Some(background) {
                continue;
            }
            bounds = Some(match bounds {
                Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x + 1), b.max(y + 1)),
                None => (x, y, x + 1, y + 1),
            });
        }
    }
    bounds
}
