// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal frame loop without a window.

use std::error::Error;
use std::time::Instant;

use blitter::Canvas;

/// An application driven frame by frame.
pub(crate) trait Sketch {
    /// Called once before the first frame.
    fn setup(&mut self, canvas: &mut Canvas) -> Result<(), Box<dyn Error>>;

    /// Called for every frame.
    fn draw(&mut self, canvas: &mut Canvas, frame: u32);
}

/// Runs a [`Sketch`] for a fixed number of frames on an off-screen canvas.
#[derive(Debug)]
pub(crate) struct HeadlessDriver {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) frames: u32,
}

impl HeadlessDriver {
    /// Runs `sketch` and returns the canvas as left by the last frame.
    pub(crate) fn run(&self, sketch: &mut impl Sketch) -> Result<Canvas, Box<dyn Error>> {
        let mut canvas = Canvas::new(self.width, self.height);
        sketch.setup(&mut canvas)?;

        let start = Instant::now();
        for frame in 0..self.frames {
            let frame_start = Instant::now();
            sketch.draw(&mut canvas, frame);
            log::debug!("frame {frame} took {:?}", frame_start.elapsed());
        }
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            log::info!(
                "rate={:.1} frames/s over {} frames",
                f64::from(self.frames) / elapsed,
                self.frames
            );
        }
        Ok(canvas)
    }
}
