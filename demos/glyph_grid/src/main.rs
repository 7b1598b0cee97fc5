// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draws a grid of consecutive glyphs every frame, the way a sketch would
//! render a font specimen, and saves the last frame as a PNG.
//!
//! Every glyph is first rendered into a small scratch bitmap and then blitted
//! onto the screen, optionally scaled. All glyphs go through one
//! [`GlyphCache`], so only the first frame rasterizes.
//!
//! ```text
//! RUST_LOG=info cargo run -p glyph_grid -- --font FiraGO-Regular.ttf --frames 60
//! ```

mod driver;

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use blitter::{
    BlitOptions, Canvas, Font, GlyphCache, IntRect, OutlineSource, PixelSize, Rgba8, SizedFont,
    blit,
};
use blitter_dev::SyntheticFont;
use clap::Parser;

use driver::{HeadlessDriver, Sketch};

#[derive(Parser, Debug)]
#[command(about = "Render a grid of glyphs and save the last frame as PNG")]
struct Args {
    /// Font file to load. Uses a built-in synthetic font when absent.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Index of the font within a collection file.
    #[arg(long, default_value_t = 0)]
    index: u32,
    /// Nominal glyph cell size in pixels.
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..=512))]
    size: u32,
    /// First codepoint of the grid.
    #[arg(long, default_value_t = 128, value_parser = clap::value_parser!(u32).range(0..=0x10FFFF))]
    first: u32,
    /// Number of grid rows.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=1024))]
    rows: u32,
    /// Number of glyphs per row.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=1024))]
    columns: u32,
    /// Scale factor applied when blitting glyphs to the screen.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=64))]
    scale: u32,
    /// Glyph tint as hexadecimal AARRGGBB.
    #[arg(long, default_value = "fff142f4", value_parser = parse_argb)]
    tint: Rgba8,
    /// Number of frames to draw.
    #[arg(long, default_value_t = 3)]
    frames: u32,
    /// Screen width in pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,
    /// Screen height in pixels.
    #[arg(long, default_value_t = 400)]
    height: u32,
    /// Where to write the last frame.
    #[arg(long, default_value = "glyph_grid.png")]
    output: PathBuf,
}

fn parse_argb(value: &str) -> Result<Rgba8, ParseIntError> {
    let digits = value.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map(Rgba8::from_argb)
}

/// Application state shared between setup and frames.
struct GlyphGrid {
    font: Box<dyn OutlineSource>,
    cache: GlyphCache,
    size: PixelSize,
    first: u32,
    rows: u32,
    columns: u32,
    scale: u32,
    tint: Rgba8,
    /// Off-screen bitmap each glyph is rendered into before it is blitted.
    scratch: Canvas,
}

impl GlyphGrid {
    fn new(font: Box<dyn OutlineSource>, args: &Args) -> Self {
        Self {
            font,
            cache: GlyphCache::new(),
            size: PixelSize::square(args.size),
            first: args.first,
            rows: args.rows,
            columns: args.columns,
            scale: args.scale,
            tint: args.tint,
            scratch: Canvas::new(args.size, args.size),
        }
    }

    /// The last codepoint the grid draws, or `None` if it runs past the Unicode range.
    fn last_codepoint(&self) -> Option<u32> {
        let count = self.rows.checked_mul(self.columns)?;
        let last = self.first.checked_add(count.checked_sub(1)?)?;
        (last <= 0x10FFFF).then_some(last)
    }
}

impl Sketch for GlyphGrid {
    fn setup(&mut self, canvas: &mut Canvas) -> Result<(), Box<dyn Error>> {
        let Some(last) = self.last_codepoint() else {
            return Err(format!(
                "{} rows of {} glyphs from U+{:04X} run past the last codepoint",
                self.rows, self.columns, self.first
            )
            .into());
        };
        log::debug!("drawing U+{:04X} to U+{last:04X}", self.first);
        let needed = u64::from(self.size.width) * u64::from(self.columns) * u64::from(self.scale);
        if needed > u64::from(canvas.width()) {
            log::warn!(
                "rows may be clipped: up to {needed} pixels wide on a {} pixel screen",
                canvas.width()
            );
        }
        Ok(())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "screen coordinates are bounded by the canvas size"
    )]
    fn draw(&mut self, canvas: &mut Canvas, _frame: u32) {
        canvas.fill(Rgba8::BLACK);
        let sized = SizedFont::new(&*self.font, self.size, &self.cache);
        let ascent = sized.ascent().round() as i32;
        let scale = self.scale as i32;

        let mut y: i32 = 10;
        for row in 0..self.rows {
            let mut x = 10;
            let mut row_height = 0;
            for column in 0..self.columns {
                let codepoint = self.first + row * self.columns + column;
                self.scratch.fill(Rgba8::TRANSPARENT);
                let metrics =
                    match sized.render_glyph(&mut self.scratch, 0, 0, codepoint, Rgba8::WHITE) {
                        Ok(metrics) => metrics,
                        Err(err) => {
                            log::warn!("skipping U+{codepoint:04X}: {err}");
                            continue;
                        }
                    };
                let top = ascent.saturating_add(metrics.y_offset).saturating_mul(scale);
                blit(
                    &self.scratch,
                    IntRect::from_size(metrics.min_width, metrics.min_height),
                    canvas,
                    IntRect::new(
                        x,
                        y.saturating_add(top),
                        metrics.min_width.saturating_mul(self.scale),
                        metrics.min_height.saturating_mul(self.scale),
                    ),
                    BlitOptions::tinted(self.tint),
                );
                let width = (metrics.min_width as i32).saturating_mul(scale);
                let height = (metrics.min_height as i32).saturating_mul(scale);
                x = x.saturating_add(width);
                row_height = row_height.max(top.saturating_add(height));
            }
            y = y.saturating_add(row_height);
        }
    }
}

fn load_font(args: &Args) -> Result<Box<dyn OutlineSource>, Box<dyn Error>> {
    match &args.font {
        Some(path) => {
            let font = Font::from_path_index(path, args.index)?;
            log::info!("loaded {}", path.display());
            Ok(Box::new(font))
        }
        None => {
            log::info!("no font given, using the built-in synthetic font");
            Ok(Box::new(SyntheticFont::sample()))
        }
    }
}

fn write_png(path: &Path, canvas: &Canvas) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(canvas.as_bytes())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let font = load_font(&args)?;
    let mut grid = GlyphGrid::new(font, &args);
    let driver = HeadlessDriver {
        width: args.width,
        height: args.height,
        frames: args.frames,
    };
    let canvas = driver.run(&mut grid)?;

    let stats = grid.cache.stats();
    log::info!(
        "{} glyphs cached, {} rasterizations, {:.1}% hits",
        stats.entries,
        stats.rasterizations,
        stats.hit_rate() * 100.0
    );

    write_png(&args.output, &canvas)?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}
