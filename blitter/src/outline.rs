// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capture of glyph outlines drawn by an [`OutlineSource`](crate::OutlineSource).

use kurbo::{BezPath, PathEl, Point};
use skrifa::outline::OutlinePen;

/// A glyph outline in font units, y pointing up.
#[derive(Clone, Default, Debug)]
pub struct OutlinePath {
    path: BezPath,
}

impl OutlinePath {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded path.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Returns `true` if nothing was drawn, as for a space.
    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    /// Returns `true` if every recorded point, control points included, is finite.
    pub fn is_finite(&self) -> bool {
        self.path.elements().iter().all(|el| match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => p.is_finite(),
            PathEl::QuadTo(c, p) => c.is_finite() && p.is_finite(),
            PathEl::CurveTo(c0, c1, p) => c0.is_finite() && c1.is_finite() && p.is_finite(),
            PathEl::ClosePath => true,
        })
    }
}

impl OutlinePen for OutlinePath {
    #[inline]
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(point(x, y));
    }

    #[inline]
    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(point(x, y));
    }

    #[inline]
    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.path.quad_to(point(cx, cy), point(x, y));
    }

    #[inline]
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(point(cx0, cy0), point(cx1, cy1), point(x, y));
    }

    #[inline]
    fn close(&mut self) {
        self.path.close_path();
    }
}

#[inline]
fn point(x: f32, y: f32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}
