// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blitter rasterizes glyphs of outline fonts into coverage bitmaps, caches them,
//! and composites them onto RGBA canvases.
//!
//! The pieces, leaf first:
//!
//! - [`Font`] loads a TrueType/OpenType file with [skrifa] and exposes the
//!   [`OutlineSource`] capability the rest of the crate consumes.
//! - [`Rasterizer`] scales one glyph outline into a pixel cell and scan-converts
//!   it into a [`GlyphBitmap`] sized to the outline's tight bounding box, along
//!   with its [`GlyphMetrics`].
//! - [`GlyphCache`] memoizes rasterization per font, codepoint and [`PixelSize`],
//!   running at most one rasterization per key even under concurrent access.
//! - [`blit`] copies a source rectangle into a destination rectangle of a
//!   [`Canvas`], scaling with nearest-neighbor sampling and applying a tint.
//! - [`SizedFont`] ties the above together for drawing runs of codepoints.
//!
//! ```no_run
//! use blitter::{Canvas, Font, GlyphCache, PixelSize, Rgba8, SizedFont};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let font = Font::from_path("FiraGO-Regular.ttf")?;
//! let cache = GlyphCache::new();
//! let mut canvas = Canvas::new(320, 64);
//!
//! let sized = SizedFont::new(&font, PixelSize::square(32), &cache);
//! sized.draw_str(&mut canvas, "Hello", 4.0, 40, Rgba8::WHITE);
//! # Ok(())
//! # }
//! ```
//!
//! [skrifa]: https://docs.rs/skrifa

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod canvas;
mod compositor;
mod font;
mod outline;
mod raster;
mod text;

pub use cache::{CacheOptions, CacheStats, GlyphCache, GlyphKey};
pub use canvas::{Canvas, Rgba8};
pub use compositor::{BlendMode, BlitOptions, BlitSource, IntRect, blit, draw_glyph};
pub use font::{Font, FontId, FontLoadError, LineMetrics, OutlineError, OutlineSource};
pub use outline::OutlinePath;
pub use raster::{
    GlyphBitmap, GlyphMetrics, GlyphStatus, PixelSize, RasterError, RasterGlyph, RasterOptions,
    Rasterize, Rasterizer,
};
pub use text::{DrawReport, SizedFont};

/// Re-exported so that outline sources outside this crate can drive an [`OutlinePath`].
pub use skrifa::outline::OutlinePen;
