// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Blitter Dev
//!
//! This crate provides utilities for developing Blitter: a real font file,
//! in-memory outline fonts with predictable glyphs, and a rasterizer wrapper
//! that counts calls.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use blitter::{
    Font, FontId, FontLoadError, LineMetrics, OutlineError, OutlinePath, OutlinePen,
    OutlineSource, PixelSize, RasterError, RasterGlyph, Rasterize, Rasterizer,
};
use hashbrown::HashMap;

/// The directory that contains the font files.
pub fn font_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/dejavu_fonts")
}

/// Loads DejaVu Sans, a TrueType font with quadratic outlines and 2048 units per em.
pub fn dejavu_sans() -> Result<Font, FontLoadError> {
    Font::from_path(font_dir().join("DejaVuSans.ttf"))
}

/// The outline of a [`SyntheticGlyph`], in font units with y up.
#[derive(Clone, Debug, PartialEq)]
pub enum SyntheticOutline {
    /// No contours, like a space.
    Empty,
    /// An axis-aligned rectangle.
    Rect {
        /// Left edge.
        x0: f32,
        /// Bottom edge.
        y0: f32,
        /// Right edge.
        x1: f32,
        /// Top edge.
        y1: f32,
    },
    /// A single closed polygon.
    Polygon(Vec<(f32, f32)>),
    /// Outline data that fails to decode with the given reason.
    Corrupt(&'static str),
}

/// A glyph of a [`SyntheticFont`].
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticGlyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    /// Left side bearing in font units.
    pub left_side_bearing: f32,
    /// The glyph's outline.
    pub outline: SyntheticOutline,
}

impl SyntheticGlyph {
    /// A glyph with no contours.
    pub fn empty(advance: f32) -> Self {
        Self {
            advance,
            left_side_bearing: 0.0,
            outline: SyntheticOutline::Empty,
        }
    }

    /// A rectangular glyph.
    pub fn rect(advance: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            advance,
            left_side_bearing: x0,
            outline: SyntheticOutline::Rect { x0, y0, x1, y1 },
        }
    }

    /// A polygonal glyph.
    pub fn polygon(advance: f32, points: Vec<(f32, f32)>) -> Self {
        let left_side_bearing = points
            .iter()
            .map(|&(x, _)| x)
            .reduce(f32::min)
            .unwrap_or(0.0);
        Self {
            advance,
            left_side_bearing,
            outline: SyntheticOutline::Polygon(points),
        }
    }

    /// A glyph whose outline cannot be read.
    pub fn corrupt(advance: f32, reason: &'static str) -> Self {
        Self {
            advance,
            left_side_bearing: 0.0,
            outline: SyntheticOutline::Corrupt(reason),
        }
    }

    fn draw(&self, path: &mut OutlinePath) -> Result<(), OutlineError> {
        match &self.outline {
            SyntheticOutline::Empty => {}
            &SyntheticOutline::Rect { x0, y0, x1, y1 } => {
                path.move_to(x0, y0);
                path.line_to(x1, y0);
                path.line_to(x1, y1);
                path.line_to(x0, y1);
                path.close();
            }
            SyntheticOutline::Polygon(points) => {
                let mut points = points.iter();
                if let Some(&(x, y)) = points.next() {
                    path.move_to(x, y);
                    for &(x, y) in points {
                        path.line_to(x, y);
                    }
                    path.close();
                }
            }
            SyntheticOutline::Corrupt(reason) => {
                return Err(OutlineError::Malformed((*reason).to_owned()));
            }
        }
        Ok(())
    }
}

/// An in-memory [`OutlineSource`] with hand-built glyphs.
///
/// Glyph 0 is `.notdef`; other glyph ids are assigned in insertion order.
#[derive(Clone, Debug)]
pub struct SyntheticFont {
    id: FontId,
    units_per_em: u16,
    line_metrics: LineMetrics,
    cmap: HashMap<u32, u32>,
    glyphs: Vec<SyntheticGlyph>,
}

impl SyntheticFont {
    /// Codepoint of the glyph with a corrupt outline in [`sample`](Self::sample).
    pub const CORRUPT: u32 = 0xE000;

    /// Codepoint of the triangle glyph in [`sample`](Self::sample).
    pub const TRIANGLE: u32 = 0xE001;

    /// Advance of the `.notdef` glyph in [`sample`](Self::sample).
    pub const NOTDEF_ADVANCE: f32 = 500.0;

    /// Creates a font with only a `.notdef` glyph.
    pub fn new(units_per_em: u16, line_metrics: LineMetrics, notdef: SyntheticGlyph) -> Self {
        Self {
            id: FontId::next(),
            units_per_em,
            line_metrics,
            cmap: HashMap::new(),
            glyphs: vec![notdef],
        }
    }

    /// Maps `codepoint` to a new glyph.
    #[must_use]
    pub fn with_glyph(mut self, codepoint: u32, glyph: SyntheticGlyph) -> Self {
        self.insert(codepoint, glyph);
        self
    }

    /// Maps `codepoint` to a new glyph, returning its glyph id.
    pub fn insert(&mut self, codepoint: u32, glyph: SyntheticGlyph) -> u32 {
        let glyph_id = u32::try_from(self.glyphs.len()).unwrap_or(u32::MAX);
        self.glyphs.push(glyph);
        self.cmap.insert(codepoint, glyph_id);
        glyph_id
    }

    /// A 1000 units per em font covering printable ASCII and U+0080..=U+0190.
    ///
    /// - Space (U+0020) is empty with an advance of 250.
    /// - Other covered codepoints are rectangles 400 units wide, 100 units
    ///   from the left edge, with an advance of 600. Heights cycle through
    ///   300..=900 units; every fifth codepoint also descends 200 units
    ///   below the baseline.
    /// - [`CORRUPT`](Self::CORRUPT) fails to decode.
    /// - [`TRIANGLE`](Self::TRIANGLE) is a triangle over the full em.
    pub fn sample() -> Self {
        let mut font = Self::new(
            1000,
            LineMetrics {
                ascent: 900.0,
                descent: -250.0,
                line_gap: 50.0,
            },
            SyntheticGlyph::rect(Self::NOTDEF_ADVANCE, 50.0, 0.0, 450.0, 700.0),
        );
        font.insert(0x20, SyntheticGlyph::empty(250.0));
        for codepoint in (0x21..=0x7E).chain(0x80..=0x190) {
            font.insert(codepoint, sample_box(codepoint));
        }
        font.insert(Self::CORRUPT, SyntheticGlyph::corrupt(600.0, "truncated glyf entry"));
        font.insert(
            Self::TRIANGLE,
            SyntheticGlyph::polygon(1000.0, vec![(0.0, 0.0), (1000.0, 0.0), (500.0, 1000.0)]),
        );
        font
    }

    /// The glyph mapped to `codepoint`, if any.
    pub fn glyph(&self, codepoint: u32) -> Option<&SyntheticGlyph> {
        let glyph_id = self.cmap.get(&codepoint)?;
        self.glyphs.get(*glyph_id as usize)
    }
}

fn sample_box(codepoint: u32) -> SyntheticGlyph {
    let height = 300.0 + (codepoint % 7) as f32 * 100.0;
    let bottom = if codepoint % 5 == 0 { -200.0 } else { 0.0 };
    SyntheticGlyph::rect(600.0, 100.0, bottom, 500.0, height)
}

impl OutlineSource for SyntheticFont {
    fn id(&self) -> FontId {
        self.id
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn line_metrics(&self) -> LineMetrics {
        self.line_metrics
    }

    fn glyph_id(&self, codepoint: u32) -> Option<u32> {
        self.cmap.get(&codepoint).copied()
    }

    fn advance_width(&self, glyph_id: u32) -> Option<f32> {
        self.glyphs.get(glyph_id as usize).map(|glyph| glyph.advance)
    }

    fn left_side_bearing(&self, glyph_id: u32) -> Option<f32> {
        self.glyphs
            .get(glyph_id as usize)
            .map(|glyph| glyph.left_side_bearing)
    }

    fn draw_outline(&self, glyph_id: u32, path: &mut OutlinePath) -> Result<(), OutlineError> {
        self.glyphs
            .get(glyph_id as usize)
            .ok_or(OutlineError::NotFound)?
            .draw(path)
    }
}

/// A [`Rasterize`] wrapper counting how often it is called.
///
/// An optional delay widens the window in which concurrent callers can race,
/// and the wrapper records how many calls ever overlapped.
#[derive(Debug, Default)]
pub struct CountingRasterizer<R = Rasterizer> {
    inner: R,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failures: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingRasterizer {
    /// Wraps the default [`Rasterizer`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> CountingRasterizer<R> {
    /// Wraps `inner`.
    pub fn wrap(inner: R) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleeps for `delay` before every rasterization.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails the next `count` calls with [`RasterError::RasterizationFailure`].
    #[must_use]
    pub fn with_failures(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// Number of [`Rasterize::rasterize`] calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The largest number of calls that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl<R: Rasterize> Rasterize for CountingRasterizer<R> {
    fn rasterize(
        &self,
        font: &dyn OutlineSource,
        codepoint: u32,
        size: PixelSize,
    ) -> Result<RasterGlyph, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let result = if fail {
            Err(RasterError::RasterizationFailure {
                codepoint,
                reason: OutlineError::Malformed("injected failure".into()),
            })
        } else {
            self.inner.rasterize(font, codepoint, size)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn placeholder(
        &self,
        font: &dyn OutlineSource,
        codepoint: u32,
        size: PixelSize,
    ) -> RasterGlyph {
        self.inner.placeholder(font, codepoint, size)
    }
}
