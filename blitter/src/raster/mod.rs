// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph rasterization: outline scaling, flattening and scan conversion.

mod accumulate;

use core::fmt::{self, Debug, Formatter};

use kurbo::{Affine, BezPath, Line, PathEl, Point, Rect};

use crate::font::{OutlineError, OutlineSource};
use crate::outline::OutlinePath;
use accumulate::Accumulator;

/// Scaled outlines reaching further than this many pixels from the origin are
/// treated as corrupt rather than flattened.
const MAX_COORDINATE: f64 = 1_000_000.0;

/// Requested size of the nominal glyph cell, in pixels.
///
/// The horizontal and vertical scales are independent: the outline is scaled by
/// `width / units_per_em` along x and `height / units_per_em` along y.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PixelSize {
    /// Cell width in pixels.
    pub width: u32,
    /// Cell height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Creates a size from a cell width and height.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a square cell.
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    fn scales(self, units_per_em: u16) -> (f64, f64) {
        let upem = f64::from(units_per_em.max(1));
        (f64::from(self.width) / upem, f64::from(self.height) / upem)
    }
}

/// Placement metrics of a rasterized glyph.
///
/// All fields are in pixels. `min_width` and `min_height` describe the bitmap,
/// never the full cell, and never exceed the requested cell.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct GlyphMetrics {
    /// Width of the bitmap.
    pub min_width: u32,
    /// Height of the bitmap.
    pub min_height: u32,
    /// Offset from the pen position to the bitmap's left column.
    pub x_offset: i32,
    /// Offset from the baseline to the bitmap's top row, y down.
    ///
    /// Negative when the glyph rises above the baseline.
    pub y_offset: i32,
    /// Horizontal distance to move the pen after this glyph.
    pub advance_width: f32,
    /// Left side bearing from the font's metrics.
    pub left_side_bearing: f32,
}

/// An immutable 8-bit coverage bitmap, row-major.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct GlyphBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GlyphBitmap {
    /// A bitmap with no pixels.
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Wraps coverage data, or returns `None` if its length is not `width * height`.
    pub fn from_coverage(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coverage values, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coverage at `(x, y)`, or `None` outside the bitmap.
    pub fn coverage(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterates over the rows of the bitmap.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks_exact(self.width.max(1) as usize)
    }
}

impl Debug for GlyphBitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Whether a glyph was rendered from the font or stands in for a missing one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum GlyphStatus {
    /// The font defines the glyph; the bitmap is its rendering.
    Rendered,
    /// The font has no glyph for the codepoint; the bitmap is an empty placeholder.
    Missing,
}

/// Metrics and coverage of one glyph at one size.
#[derive(Clone, PartialEq, Debug)]
pub struct RasterGlyph {
    metrics: GlyphMetrics,
    bitmap: GlyphBitmap,
    status: GlyphStatus,
}

impl RasterGlyph {
    /// Assembles a rendered glyph; the metrics' dimensions are taken from the bitmap.
    pub fn new(mut metrics: GlyphMetrics, bitmap: GlyphBitmap) -> Self {
        metrics.min_width = bitmap.width();
        metrics.min_height = bitmap.height();
        Self {
            metrics,
            bitmap,
            status: GlyphStatus::Rendered,
        }
    }

    /// A zero-sized stand-in for a missing glyph that still advances the pen.
    pub fn placeholder(advance_width: f32) -> Self {
        Self {
            metrics: GlyphMetrics {
                advance_width,
                ..GlyphMetrics::default()
            },
            bitmap: GlyphBitmap::empty(),
            status: GlyphStatus::Missing,
        }
    }

    /// Placement metrics.
    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    /// Coverage bitmap.
    pub fn bitmap(&self) -> &GlyphBitmap {
        &self.bitmap
    }

    /// Whether the glyph was rendered or is a placeholder.
    pub fn status(&self) -> GlyphStatus {
        self.status
    }

    /// Shorthand for `status() == GlyphStatus::Missing`.
    pub fn is_missing(&self) -> bool {
        self.status == GlyphStatus::Missing
    }
}

/// Error returned by [`Rasterize::rasterize`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RasterError {
    /// The font does not map the codepoint to a glyph.
    MissingGlyph {
        /// The requested codepoint.
        codepoint: u32,
    },
    /// The glyph exists but its outline could not be rasterized.
    RasterizationFailure {
        /// The requested codepoint.
        codepoint: u32,
        /// What went wrong with the outline.
        reason: OutlineError,
    },
}

impl RasterError {
    /// The codepoint the failed request was for.
    pub fn codepoint(&self) -> u32 {
        match self {
            Self::MissingGlyph { codepoint } | Self::RasterizationFailure { codepoint, .. } => {
                *codepoint
            }
        }
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGlyph { codepoint } => write!(f, "no glyph found: U+{codepoint:04X}"),
            Self::RasterizationFailure { codepoint, reason } => {
                write!(f, "could not render U+{codepoint:04X}: {reason}")
            }
        }
    }
}

impl core::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::RasterizationFailure { reason, .. } => Some(reason),
            Self::MissingGlyph { .. } => None,
        }
    }
}

/// Options for [`Rasterizer`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RasterOptions {
    /// Maximum distance, in pixels, between a curve and the line segments
    /// approximating it.
    ///
    /// The default value is 0.1.
    pub tolerance: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { tolerance: 0.1 }
    }
}

/// Turns one codepoint of a font into a [`RasterGlyph`].
///
/// Implementations must be deterministic: identical inputs give identical output.
pub trait Rasterize {
    /// Rasterizes `codepoint` scaled to the `size` cell.
    fn rasterize(
        &self,
        font: &dyn OutlineSource,
        codepoint: u32,
        size: PixelSize,
    ) -> Result<RasterGlyph, RasterError>;

    /// Builds the stand-in used when `codepoint` is missing from `font`.
    ///
    /// The default advances by the `.notdef` glyph's width, or half an em if
    /// the font has no advance for it.
    #[expect(clippy::cast_possible_truncation, reason = "advances are far below f32::MAX")]
    fn placeholder(
        &self,
        font: &dyn OutlineSource,
        _codepoint: u32,
        size: PixelSize,
    ) -> RasterGlyph {
        let (x_scale, _) = size.scales(font.units_per_em());
        let advance = font
            .advance_width(0)
            .map_or(0.5 * f64::from(font.units_per_em()), f64::from);
        RasterGlyph::placeholder((advance * x_scale) as f32)
    }
}

/// The scan-converting [`Rasterize`] implementation.
///
/// The outline is scaled into the cell with y flipped to point down, curves
/// are flattened, and the result is scan-converted with signed-area
/// accumulation into a bitmap covering the outline's pixel bounds. Bounds are
/// rounded outwards (`floor` for the top-left corner, `ceil` for the
/// bottom-right one) and then clamped to the cell size, keeping the top-left
/// corner. Coverage is rounded half up to 8 bits.
#[derive(Clone, Default, Debug)]
pub struct Rasterizer {
    options: RasterOptions,
}

impl Rasterizer {
    /// Creates a rasterizer with the given options.
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &RasterOptions {
        &self.options
    }
}

impl Rasterize for Rasterizer {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pixel bounds are checked against MAX_COORDINATE before conversion"
    )]
    fn rasterize(
        &self,
        font: &dyn OutlineSource,
        codepoint: u32,
        size: PixelSize,
    ) -> Result<RasterGlyph, RasterError> {
        let glyph_id = font
            .glyph_id(codepoint)
            .filter(|&id| id != 0)
            .ok_or(RasterError::MissingGlyph { codepoint })?;
        let failure = |reason| RasterError::RasterizationFailure { codepoint, reason };

        let (x_scale, y_scale) = size.scales(font.units_per_em());
        let scaled = |units: Option<f32>| (f64::from(units.unwrap_or(0.0)) * x_scale) as f32;
        let mut metrics = GlyphMetrics {
            advance_width: scaled(font.advance_width(glyph_id)),
            left_side_bearing: scaled(font.left_side_bearing(glyph_id)),
            ..GlyphMetrics::default()
        };

        let mut outline = OutlinePath::new();
        font.draw_outline(glyph_id, &mut outline).map_err(failure)?;
        if !outline.is_finite() {
            return Err(failure(OutlineError::Malformed(
                "non-finite outline coordinates".into(),
            )));
        }

        let mut path = outline.path().clone();
        path.apply_affine(Affine::scale_non_uniform(x_scale, -y_scale));
        let Some(bounds) = control_bounds(&path) else {
            log::trace!("U+{codepoint:04X} has an empty outline");
            return Ok(RasterGlyph::new(metrics, GlyphBitmap::empty()));
        };
        if bounds.x0.abs().max(bounds.x1.abs()).max(bounds.y0.abs()).max(bounds.y1.abs())
            > MAX_COORDINATE
        {
            return Err(failure(OutlineError::Malformed(
                "outline coordinates out of range".into(),
            )));
        }

        let lines = flatten(&path, self.options.tolerance);
        let Some(bounds) = line_bounds(&lines) else {
            return Ok(RasterGlyph::new(metrics, GlyphBitmap::empty()));
        };
        let left = bounds.x0.floor();
        let top = bounds.y0.floor();
        let width = clamp_extent(bounds.x1.ceil() - left, size.width);
        let height = clamp_extent(bounds.y1.ceil() - top, size.height);
        if width == 0 || height == 0 {
            return Ok(RasterGlyph::new(metrics, GlyphBitmap::empty()));
        }

        let mut accumulator = Accumulator::new(width, height);
        let origin = Point::new(left, top).to_vec2();
        for line in &lines {
            accumulator.add_line(line.p0 - origin, line.p1 - origin);
        }

        metrics.x_offset = left as i32;
        metrics.y_offset = top as i32;
        let bitmap = GlyphBitmap {
            width,
            height,
            data: accumulator.into_coverage(),
        };
        Ok(RasterGlyph::new(metrics, bitmap))
    }
}

/// Flattens `path` into closed polylines.
fn flatten(path: &BezPath, tolerance: f64) -> Vec<Line> {
    let mut flattener = Flattener::default();
    kurbo::flatten(path.elements().iter().copied(), tolerance, |el| {
        flattener.push(el);
    });
    flattener.finish()
}

/// Collects flattened path elements as lines, closing every subpath.
#[derive(Default)]
struct Flattener {
    lines: Vec<Line>,
    start: Option<Point>,
    current: Point,
}

impl Flattener {
    fn push(&mut self, el: PathEl) {
        match el {
            PathEl::MoveTo(p) => {
                self.close();
                self.start = Some(p);
                self.current = p;
            }
            PathEl::LineTo(p) => {
                if self.start.is_none() {
                    self.start = Some(self.current);
                }
                self.lines.push(Line::new(self.current, p));
                self.current = p;
            }
            PathEl::ClosePath => self.close(),
            // `kurbo::flatten` only emits the elements above.
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        }
    }

    fn close(&mut self) {
        if let Some(start) = self.start {
            if self.current != start {
                self.lines.push(Line::new(self.current, start));
            }
            self.current = start;
        }
    }

    fn finish(mut self) -> Vec<Line> {
        self.close();
        self.lines
    }
}

/// Bounding box of all points of `path`, control points included.
fn control_bounds(path: &BezPath) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    let mut add = |p: Point| {
        bounds = Some(match bounds {
            Some(rect) => rect.union_pt(p),
            None => Rect::from_points(p, p),
        });
    };
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => add(p),
            PathEl::QuadTo(c, p) => {
                add(c);
                add(p);
            }
            PathEl::CurveTo(c0, c1, p) => {
                add(c0);
                add(c1);
                add(p);
            }
            PathEl::ClosePath => {}
        }
    }
    bounds
}

fn line_bounds(lines: &[Line]) -> Option<Rect> {
    lines
        .iter()
        .map(|line| Rect::from_points(line.p0, line.p1))
        .reduce(|a, b| a.union(b))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the extent is clamped to the cell, which fits in u32"
)]
fn clamp_extent(extent: f64, cell: u32) -> u32 {
    if extent > 0.0 {
        extent.min(f64::from(cell)) as u32
    } else {
        0
    }
}
