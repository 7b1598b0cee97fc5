// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing runs of codepoints with a font at a fixed size.

use core::fmt;
use std::sync::Arc;

use crate::cache::GlyphCache;
use crate::canvas::{Canvas, Rgba8};
use crate::compositor::draw_glyph;
use crate::font::OutlineSource;
use crate::raster::{GlyphMetrics, PixelSize, RasterError, RasterGlyph, Rasterize, Rasterizer};

/// Outcome of drawing a run of codepoints.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct DrawReport {
    /// Glyphs rendered from the font.
    pub drawn: usize,
    /// Codepoints the font has no glyph for.
    pub missing: usize,
    /// Glyphs that could not be rasterized and were skipped.
    pub failed: usize,
    /// Total horizontal pen movement, in pixels.
    pub advance: f32,
}

/// A font at one pixel size, drawing through a shared [`GlyphCache`].
///
/// Glyphs are placed one after the other on a baseline by their advance
/// widths. There is no shaping: no kerning, ligatures or bidirectional
/// reordering.
pub struct SizedFont<'a, R = Rasterizer> {
    font: &'a dyn OutlineSource,
    size: PixelSize,
    cache: &'a GlyphCache<R>,
}

impl<R> Clone for SizedFont<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for SizedFont<'_, R> {}

impl<R> fmt::Debug for SizedFont<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizedFont")
            .field("font", &self.font.id())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Rasterize> SizedFont<'a, R> {
    /// Creates a sized font.
    pub fn new(font: &'a dyn OutlineSource, size: PixelSize, cache: &'a GlyphCache<R>) -> Self {
        Self { font, size, cache }
    }

    /// The underlying font.
    pub fn font(&self) -> &'a dyn OutlineSource {
        self.font
    }

    /// The cell size glyphs are rasterized at.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// The cache glyphs are drawn through.
    pub fn cache(&self) -> &'a GlyphCache<R> {
        self.cache
    }

    /// Distance from the top of a line to its baseline, in pixels.
    pub fn ascent(&self) -> f32 {
        self.font.line_metrics().ascent * self.y_scale()
    }

    /// Baseline-to-baseline distance, in pixels.
    pub fn line_height(&self) -> f32 {
        self.font.line_metrics().line_height() * self.y_scale()
    }

    /// The rasterized glyph for `codepoint`.
    pub fn glyph(&self, codepoint: u32) -> Result<Arc<RasterGlyph>, RasterError> {
        self.cache.get_or_rasterize(self.font, codepoint, self.size)
    }

    /// The metrics of the glyph for `codepoint`.
    pub fn metrics(&self, codepoint: u32) -> Result<GlyphMetrics, RasterError> {
        self.glyph(codepoint).map(|glyph| *glyph.metrics())
    }

    /// Draws the glyph for `codepoint` with its bitmap's top-left corner at `(x, y)`.
    pub fn render_glyph(
        &self,
        dest: &mut Canvas,
        x: i32,
        y: i32,
        codepoint: u32,
        tint: Rgba8,
    ) -> Result<GlyphMetrics, RasterError> {
        let glyph = self.glyph(codepoint)?;
        draw_glyph(dest, &glyph, x, y, tint);
        Ok(*glyph.metrics())
    }

    /// Draws `codepoints` left to right starting at pen position `x` on `baseline`.
    ///
    /// Missing glyphs advance by their placeholder width. Glyphs that fail to
    /// rasterize are skipped with the same advance, so one bad glyph does not
    /// stop the rest of the run.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pen positions are rounded to whole pixels within the canvas range"
    )]
    pub fn draw_codepoints(
        &self,
        dest: &mut Canvas,
        codepoints: impl IntoIterator<Item = u32>,
        x: f32,
        baseline: i32,
        tint: Rgba8,
    ) -> DrawReport {
        let mut report = DrawReport::default();
        let mut pen = x;
        for codepoint in codepoints {
            let advance = match self.glyph(codepoint) {
                Ok(glyph) => {
                    let metrics = glyph.metrics();
                    if glyph.is_missing() {
                        report.missing += 1;
                    } else {
                        let left = (pen.round() as i32).saturating_add(metrics.x_offset);
                        let top = baseline.saturating_add(metrics.y_offset);
                        draw_glyph(dest, &glyph, left, top, tint);
                        report.drawn += 1;
                    }
                    metrics.advance_width
                }
                Err(err) => {
                    log::debug!("skipping U+{codepoint:04X}: {err}");
                    report.failed += 1;
                    self.cache
                        .rasterizer()
                        .placeholder(self.font, codepoint, self.size)
                        .metrics()
                        .advance_width
                }
            };
            pen += advance;
        }
        report.advance = pen - x;
        report
    }

    /// Draws the characters of `text`; see [`draw_codepoints`](Self::draw_codepoints).
    pub fn draw_str(
        &self,
        dest: &mut Canvas,
        text: &str,
        x: f32,
        baseline: i32,
        tint: Rgba8,
    ) -> DrawReport {
        self.draw_codepoints(dest, text.chars().map(u32::from), x, baseline, tint)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the scale is a small ratio of two integers"
    )]
    fn y_scale(&self) -> f32 {
        (f64::from(self.size.height) / f64::from(self.font.units_per_em().max(1))) as f32
    }
}
