// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font handles and the outline capability consumed by the rasterizer.

use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::raw::{ReadError, TableProvider};
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::outline::OutlinePath;

/// Smallest and largest `unitsPerEm` values permitted by the OpenType `head` table.
const UNITS_PER_EM_RANGE: core::ops::RangeInclusive<u16> = 16..=16384;

/// Process-unique identity of a loaded font.
///
/// Two handles compare equal only if one was cloned from the other, so the
/// identifier is suitable as part of a cache key.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FontId(u64);

impl FontId {
    /// Allocates an identifier distinct from every other one in this process.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value of the identifier.
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

/// Recommended line metrics, in font units.
///
/// `descent` follows the OpenType convention and is usually negative.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct LineMetrics {
    /// Distance from the baseline to the top of the line.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line.
    pub descent: f32,
    /// Extra spacing between consecutive lines.
    pub line_gap: f32,
}

impl LineMetrics {
    /// Baseline-to-baseline distance.
    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent + self.line_gap
    }
}

/// The capability a font must provide to be rasterized.
///
/// Glyph identifiers are font-specific indices; `0` is `.notdef`.
pub trait OutlineSource: Send + Sync {
    /// Identity used to key cached glyphs.
    fn id(&self) -> FontId;

    /// Design units per em square.
    fn units_per_em(&self) -> u16;

    /// Recommended line metrics in font units.
    fn line_metrics(&self) -> LineMetrics;

    /// Maps a codepoint to a glyph, or `None` if the font has no mapping for it.
    fn glyph_id(&self, codepoint: u32) -> Option<u32>;

    /// Horizontal advance of a glyph in font units.
    fn advance_width(&self, glyph_id: u32) -> Option<f32>;

    /// Left side bearing of a glyph in font units.
    fn left_side_bearing(&self, glyph_id: u32) -> Option<f32>;

    /// Appends the unscaled outline of a glyph to `path`, in font units with y up.
    fn draw_outline(&self, glyph_id: u32, path: &mut OutlinePath) -> Result<(), OutlineError>;
}

/// Reasons an outline could not be produced for a glyph the font claims to have.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutlineError {
    /// The font has no outline data for the glyph.
    NotFound,
    /// The outline data is corrupt or could not be interpreted.
    Malformed(String),
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("no outline data for glyph"),
            Self::Malformed(reason) => write!(f, "malformed outline: {reason}"),
        }
    }
}

impl core::error::Error for OutlineError {}

/// Error returned when a font cannot be loaded.
#[derive(Debug)]
#[non_exhaustive]
pub enum FontLoadError {
    /// The font file could not be read.
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The data is not a font, or the requested collection index does not exist.
    Parse(ReadError),
    /// A table required for rasterization is absent.
    MissingTable(&'static str),
    /// The `head` table declares an out-of-range `unitsPerEm`.
    InvalidUnitsPerEm(u16),
    /// The font has neither `glyf` nor `CFF`/`CFF2` outlines.
    NoOutlines,
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "can't load font file '{}': {source}", path.display())
            }
            Self::Parse(err) => write!(f, "unsupported or corrupt font data: {err}"),
            Self::MissingTable(tag) => write!(f, "font is missing the '{tag}' table"),
            Self::InvalidUnitsPerEm(upem) => write!(f, "invalid unitsPerEm value {upem}"),
            Self::NoOutlines => f.write_str("font has no glyph outlines"),
        }
    }
}

impl core::error::Error for FontLoadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An immutable handle to a parsed outline font.
///
/// Cloning is cheap and the clone keeps the same [`FontId`].
#[derive(Clone)]
pub struct Font {
    id: FontId,
    data: Arc<[u8]>,
    index: u32,
    units_per_em: u16,
    line_metrics: LineMetrics,
}

impl Font {
    /// Loads the first font of the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontLoadError> {
        Self::from_path_index(path, 0)
    }

    /// Loads the font at `index` of the (possibly collection) file at `path`.
    pub fn from_path_index(path: impl AsRef<Path>, index: u32) -> Result<Self, FontLoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Self::from_bytes(data, index)?;
        log::debug!("loaded font {:?} from '{}'", font.id, path.display());
        Ok(font)
    }

    /// Parses a font from memory.
    ///
    /// The data is validated once here: it must contain a `head` table with a
    /// sane `unitsPerEm` and some form of outlines.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>, index: u32) -> Result<Self, FontLoadError> {
        let data: Arc<[u8]> = data.into();
        let font = FontRef::from_index(&data, index).map_err(FontLoadError::Parse)?;
        let units_per_em = font
            .head()
            .map_err(|_| FontLoadError::MissingTable("head"))?
            .units_per_em();
        if !UNITS_PER_EM_RANGE.contains(&units_per_em) {
            return Err(FontLoadError::InvalidUnitsPerEm(units_per_em));
        }
        if font.outline_glyphs().format().is_none() {
            return Err(FontLoadError::NoOutlines);
        }
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let line_metrics = LineMetrics {
            ascent: metrics.ascent,
            descent: metrics.descent,
            line_gap: metrics.leading,
        };
        Ok(Self {
            id: FontId::next(),
            data,
            index,
            units_per_em,
            line_metrics,
        })
    }

    /// The raw font file data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Index of this font within its collection.
    pub fn index(&self) -> u32 {
        self.index
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        // Already validated in `from_bytes`, so this only fails if the data was swapped.
        FontRef::from_index(&self.data, self.index).ok()
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl OutlineSource for Font {
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
        let font = self.font_ref()?;
        font.charmap().map(codepoint).map(GlyphId::to_u32)
    }

    fn advance_width(&self, glyph_id: u32) -> Option<f32> {
        let font = self.font_ref()?;
        font.glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(GlyphId::new(glyph_id))
    }

    fn left_side_bearing(&self, glyph_id: u32) -> Option<f32> {
        let font = self.font_ref()?;
        font.glyph_metrics(Size::unscaled(), LocationRef::default())
            .left_side_bearing(GlyphId::new(glyph_id))
    }

    fn draw_outline(&self, glyph_id: u32, path: &mut OutlinePath) -> Result<(), OutlineError> {
        let font = self
            .font_ref()
            .ok_or_else(|| OutlineError::Malformed("font data no longer parses".into()))?;
        let outline = font
            .outline_glyphs()
            .get(GlyphId::new(glyph_id))
            .ok_or(OutlineError::NotFound)?;
        outline
            .draw(
                DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                path,
            )
            .map_err(|err| OutlineError::Malformed(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_ids_are_unique() {
        let a = FontId::next();
        let b = FontId::next();
        assert_ne!(a, b, "consecutive ids must differ");
        assert!(b.to_u64() > a.to_u64(), "ids are allocated in increasing order");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Font::from_bytes(vec![0_u8; 64], 0).unwrap_err();
        assert!(
            matches!(err, FontLoadError::Parse(_)),
            "expected a parse error, got {err:?}"
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Font::from_path("definitely/not/here.ttf").unwrap_err();
        match &err {
            FontLoadError::Io { path, .. } => {
                assert_eq!(path, Path::new("definitely/not/here.ttf"));
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
        assert!(
            err.to_string().contains("definitely/not/here.ttf"),
            "message should name the file"
        );
    }

    #[test]
    fn line_height_accounts_for_negative_descent() {
        let metrics = LineMetrics {
            ascent: 800.0,
            descent: -200.0,
            line_gap: 90.0,
        };
        assert_eq!(metrics.line_height(), 1090.0);
    }
}
