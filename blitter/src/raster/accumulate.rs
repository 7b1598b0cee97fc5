// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signed-area accumulation scan converter.
//!
//! Every line segment deposits, into the cells it crosses, the change in
//! winding it causes weighted by how much of each pixel lies to its right.
//! A running sum over the cells then yields the signed covered area per
//! pixel. Cells are laid out row-major with one spill cell per row boundary,
//! so a delta landing just past the right edge of a row is absorbed at the
//! start of the next one without disturbing it.

#![allow(
    clippy::cast_possible_truncation,
    reason = "cell indices are derived from coordinates clamped to the window"
)]

use kurbo::Point;

pub(crate) struct Accumulator {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

impl Accumulator {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            width,
            height,
            // Two spill cells past the end for deltas at `x == width` on the last row.
            cells: vec![0.0; width * height + 2],
        }
    }

    /// Adds a line segment given in window coordinates (pixels, y down).
    ///
    /// Parts above or below the window are dropped; parts left or right of it
    /// are projected onto the nearest vertical border.
    pub(crate) fn add_line(&mut self, from: Point, to: Point) {
        let (x0, y0, x1, y1) = (from.x as f32, from.y as f32, to.x as f32, to.y as f32);
        if (y0 - y1).abs() <= f32::EPSILON || self.width == 0 {
            return;
        }
        let (dir, (top_x, top_y), (bottom_x, bottom_y)) = if y0 < y1 {
            (1.0, (x0, y0), (x1, y1))
        } else {
            (-1.0, (x1, y1), (x0, y0))
        };
        let dxdy = (bottom_x - top_x) / (bottom_y - top_y);

        let y_start = top_y.max(0.0);
        let y_end = bottom_y.min(self.height as f32);
        if y_start >= y_end {
            return;
        }

        let mut x = top_x + (y_start - top_y) * dxdy;
        let first_row = y_start.floor() as usize;
        let end_row = (y_end.ceil() as usize).min(self.height);
        for row in first_row..end_row {
            let row_top = (row as f32).max(y_start);
            let row_bottom = ((row + 1) as f32).min(y_end);
            let dy = row_bottom - row_top;
            if dy <= 0.0 {
                continue;
            }
            let x_next = x + dxdy * dy;
            self.add_span(row, x, x_next, dy * dir);
            x = x_next;
        }
    }

    /// Deposits winding `delta` for the part of an edge between `xa` and `xb` in `row`.
    fn add_span(&mut self, row: usize, xa: f32, xb: f32, delta: f32) {
        let right = self.width as f32;
        let xa = xa.clamp(0.0, right);
        let xb = xb.clamp(0.0, right);
        let (x0, x1) = if xa < xb { (xa, xb) } else { (xb, xa) };
        let base = row * self.width;

        let x0_floor = x0.floor();
        let x0i = x0_floor as usize;
        let x1_ceil = x1.ceil();
        let x1i = x1_ceil as usize;

        if x1i <= x0i + 1 {
            // The span stays within one pixel column.
            let mid = 0.5 * (x0 + x1) - x0_floor;
            self.cells[base + x0i] += delta - delta * mid;
            self.cells[base + x0i + 1] += delta * mid;
            return;
        }

        let inv_width = (x1 - x0).recip();
        let x0_frac = x0 - x0_floor;
        let first_area = 0.5 * inv_width * (1.0 - x0_frac) * (1.0 - x0_frac);
        let x1_frac = x1 - x1_ceil + 1.0;
        let last_area = 0.5 * inv_width * x1_frac * x1_frac;

        self.cells[base + x0i] += delta * first_area;
        if x1i == x0i + 2 {
            self.cells[base + x0i + 1] += delta * (1.0 - first_area - last_area);
        } else {
            let second_area = inv_width * (1.5 - x0_frac);
            self.cells[base + x0i + 1] += delta * (second_area - first_area);
            for xi in x0i + 2..x1i - 1 {
                self.cells[base + xi] += delta * inv_width;
            }
            let before_last = second_area + (x1i - x0i - 3) as f32 * inv_width;
            self.cells[base + x1i - 1] += delta * (1.0 - before_last - last_area);
        }
        self.cells[base + x1i] += delta * last_area;
    }

    /// Integrates the cells into 8-bit coverage, row-major.
    ///
    /// Coverage is the absolute accumulated area clamped to one, so overlapping
    /// contours of the same direction fill like the non-zero rule.
    pub(crate) fn into_coverage(self) -> Vec<u8> {
        let len = self.width * self.height;
        let mut sum = 0.0_f32;
        self.cells[..len]
            .iter()
            .map(|cell| {
                sum += cell;
                (sum.abs().min(1.0) * 255.0 + 0.5) as u8
            })
            .collect()
    }
}
