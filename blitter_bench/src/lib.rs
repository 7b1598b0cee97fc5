// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Blitter Bench
//!
//! This crate provides benchmarks for the Blitter library. Glyphs come from
//! the in-memory fonts of `blitter_dev`, so results do not depend on font files.

use std::hint::black_box;

use blitter::{
    BlitOptions, Canvas, GlyphCache, IntRect, PixelSize, Rasterize, Rasterizer, Rgba8, SizedFont,
    blit,
};
use blitter_dev::SyntheticFont;
use tango_bench::{Benchmark, benchmark_fn};

/// Cell sizes exercised by the benchmarks.
const SIZES: [u32; 3] = [16, 32, 96];

/// Benchmarks for uncached rasterization.
pub fn rasterize() -> Vec<Benchmark> {
    SIZES
        .into_iter()
        .flat_map(|size| {
            [("box", 0x41), ("triangle", SyntheticFont::TRIANGLE)].map(|(name, codepoint)| {
                benchmark_fn(format!("Rasterize - {name} {size}px"), move |b| {
                    let font = SyntheticFont::sample();
                    let rasterizer = Rasterizer::default();
                    b.iter(move || {
                        black_box(rasterizer.rasterize(&font, codepoint, PixelSize::square(size)))
                    })
                })
            })
        })
        .collect()
}

/// Benchmarks for glyph cache lookups.
pub fn cache() -> Vec<Benchmark> {
    vec![
        benchmark_fn("Cache - hit", |b| {
            let font = SyntheticFont::sample();
            let cache = GlyphCache::new();
            let size = PixelSize::square(32);
            let _ = cache.get_or_rasterize(&font, 0x41, size);
            b.iter(move || black_box(cache.get_or_rasterize(&font, 0x41, size)))
        }),
        benchmark_fn("Cache - glyph grid frame", |b| {
            let font = SyntheticFont::sample();
            let cache = GlyphCache::new();
            b.iter(move || {
                let sized = SizedFont::new(&font, PixelSize::square(32), &cache);
                let mut canvas = Canvas::new(640, 480);
                for row in 0..8 {
                    let codepoints = (0..30).map(|column| 128 + row * 30 + column);
                    let baseline = 40 + row as i32 * 40;
                    sized.draw_codepoints(&mut canvas, codepoints, 10.0, baseline, Rgba8::WHITE);
                }
                black_box(canvas)
            })
        }),
    ]
}

/// Benchmarks for compositing.
pub fn blits() -> Vec<Benchmark> {
    let scales = [("1x", 1), ("2x", 2), ("4x", 4)];
    scales
        .into_iter()
        .map(|(name, scale)| {
            benchmark_fn(format!("Blit - glyph {name}"), move |b| {
                let font = SyntheticFont::sample();
                let glyph = Rasterizer::default()
                    .rasterize(&font, SyntheticFont::TRIANGLE, PixelSize::square(32))
                    .unwrap_or_else(|err| panic!("benchmark glyph failed: {err}"));
                let mut canvas = Canvas::filled(256, 256, Rgba8::BLACK);
                b.iter(move || {
                    let bitmap = glyph.bitmap();
                    let src = IntRect::from_size(bitmap.width(), bitmap.height());
                    let dest = IntRect::new(3, 5, bitmap.width() * scale, bitmap.height() * scale);
                    black_box(blit(
                        bitmap,
                        src,
                        &mut canvas,
                        dest,
                        BlitOptions::tinted(Rgba8::rgb(241, 66, 244)),
                    ))
                })
            })
        })
        .collect()
}
