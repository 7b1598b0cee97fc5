// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scaled, tinted rectangle copies onto a [`Canvas`].
//!
//! Blits use integer arithmetic only, so identical inputs always produce
//! bit-identical output.

use crate::canvas::{Canvas, Rgba8, mul_div255};
use crate::raster::{GlyphBitmap, RasterGlyph};

/// An axis-aligned pixel rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct IntRect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl IntRect {
    /// Creates a rectangle from its top-left corner and size.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the right column.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// The overlap of two rectangles, or `None` if they do not overlap.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the overlap lies within both rectangles"
    )]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
            return None;
        }
        Some(Self::new(
            x0,
            y0,
            (x1 - i64::from(x0)) as u32,
            (y1 - i64::from(y0)) as u32,
        ))
    }
}

/// Pixel data that can be blitted onto a [`Canvas`].
pub trait BlitSource {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// The color at `(x, y)`, which lies within the source bounds.
    fn texel(&self, x: u32, y: u32) -> Rgba8;
}

/// Coverage is read as white with alpha equal to the coverage, so that the
/// tint alone decides the glyph color.
impl BlitSource for GlyphBitmap {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn height(&self) -> u32 {
        Self::height(self)
    }

    fn texel(&self, x: u32, y: u32) -> Rgba8 {
        Rgba8::new(255, 255, 255, self.coverage(x, y).unwrap_or(0))
    }
}

impl BlitSource for Canvas {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn height(&self) -> u32 {
        Self::height(self)
    }

    fn texel(&self, x: u32, y: u32) -> Rgba8 {
        self.pixel(x, y).unwrap_or(Rgba8::TRANSPARENT)
    }
}

/// How tinted source texels are combined with the destination.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
pub enum BlendMode {
    /// Straight-alpha "source over destination".
    ///
    /// Opaque texels replace the destination; fully transparent ones leave it unchanged.
    #[default]
    SourceOver,
    /// Texels replace the destination, alpha included.
    Copy,
}

/// Parameters of a [`blit`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BlitOptions {
    /// Color multiplied channel-wise into every source texel.
    ///
    /// The default, opaque white, leaves texels unchanged.
    pub tint: Rgba8,
    /// How texels are combined with the destination.
    pub mode: BlendMode,
}

impl Default for BlitOptions {
    fn default() -> Self {
        Self {
            tint: Rgba8::WHITE,
            mode: BlendMode::SourceOver,
        }
    }
}

impl BlitOptions {
    /// Source-over blending with the given tint.
    pub fn tinted(tint: Rgba8) -> Self {
        Self {
            tint,
            ..Self::default()
        }
    }

    /// Replaces the blend mode.
    #[must_use]
    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Copies `src_rect` of `src` into `dest_rect` of `dest`, scaling when the sizes differ.
///
/// Scaling samples the source pixel nearest to the center of each destination
/// pixel: destination column `i` of the rectangle reads source column
/// `src_rect.x + (2 * i + 1) * src_rect.width / (2 * dest_rect.width)`, and
/// likewise for rows.
///
/// Destination pixels outside `dest` are clipped, and samples falling outside
/// `src` are skipped, so neither buffer is ever accessed out of bounds.
///
/// Returns the number of destination pixels that received a source sample.
#[expect(
    clippy::cast_possible_truncation,
    reason = "sample coordinates are checked against the source bounds before conversion"
)]
pub fn blit<S: BlitSource + ?Sized>(
    src: &S,
    src_rect: IntRect,
    dest: &mut Canvas,
    dest_rect: IntRect,
    options: BlitOptions,
) -> usize {
    if src_rect.is_empty() || dest_rect.is_empty() {
        return 0;
    }
    let Some(visible) = dest_rect.intersect(&dest.bounds()) else {
        log::trace!(
            "blit to {dest_rect:?} lies outside the {}x{} canvas",
            dest.width(),
            dest.height()
        );
        return 0;
    };
    if visible != dest_rect {
        log::trace!("blit to {dest_rect:?} clipped to {visible:?}");
    }

    let (src_width, src_height) = (i64::from(src.width()), i64::from(src.height()));
    let stride = dest.width() as usize;
    let pixels = dest.pixels_mut();

    let mut written = 0;
    for y in i64::from(visible.y)..visible.bottom() {
        let j = y - i64::from(dest_rect.y);
        let sy = sample(src_rect.y, j, src_rect.height, dest_rect.height);
        if !(0..src_height).contains(&sy) {
            continue;
        }
        let row = y as usize * stride;
        for x in i64::from(visible.x)..visible.right() {
            let i = x - i64::from(dest_rect.x);
            let sx = sample(src_rect.x, i, src_rect.width, dest_rect.width);
            if !(0..src_width).contains(&sx) {
                continue;
            }
            let texel = src.texel(sx as u32, sy as u32).tinted(options.tint);
            let pixel = &mut pixels[row + x as usize];
            *pixel = match options.mode {
                BlendMode::SourceOver => source_over(texel, *pixel),
                BlendMode::Copy => texel,
            };
            written += 1;
        }
    }
    written
}

/// Source coordinate read for destination offset `i` along one axis.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the offset is below `src_len`, which fits in i64"
)]
fn sample(start: i32, i: i64, src_len: u32, dest_len: u32) -> i64 {
    let offset = (2 * i128::from(i) + 1) * i128::from(src_len) / (2 * i128::from(dest_len));
    i64::from(start) + offset as i64
}

/// Draws a glyph unscaled with its bitmap's top-left corner at `(x, y)`.
///
/// To place a glyph on a baseline, pass the pen position offset by the glyph's
/// [`x_offset`](crate::GlyphMetrics::x_offset) and
/// [`y_offset`](crate::GlyphMetrics::y_offset).
pub fn draw_glyph(dest: &mut Canvas, glyph: &RasterGlyph, x: i32, y: i32, tint: Rgba8) -> usize {
    let bitmap = glyph.bitmap();
    let rect = IntRect::from_size(bitmap.width(), bitmap.height());
    blit(
        bitmap,
        rect,
        dest,
        IntRect { x, y, ..rect },
        BlitOptions::tinted(tint),
    )
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "blended channels never exceed the output alpha, which is at most 255"
)]
fn source_over(src: Rgba8, dst: Rgba8) -> Rgba8 {
    match src.a {
        255 => src,
        0 => dst,
        sa => {
            let da = mul_div255(dst.a, 255 - sa);
            let out_a = u32::from(sa) + u32::from(da);
            let blend = |s: u8, d: u8| {
                ((u32::from(s) * u32::from(sa) + u32::from(d) * u32::from(da) + out_a / 2) / out_a)
                    as u8
            };
            Rgba8::new(
                blend(src.r, dst.r),
                blend(src.g, dst.g),
                blend(src.b, dst.b),
                out_a as u8,
            )
        }
    }
}
