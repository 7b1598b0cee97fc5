// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoization of rasterized glyphs.
//!
//! Every key owns a slot with its own lock. The map lock is only held to find,
//! create or remove slots, and rasterization runs under the slot lock, so
//! requests for different glyphs proceed in parallel while concurrent requests
//! for the same glyph wait for a single rasterization and share its result.
//!
//! A slot lock may be held while taking the map lock, never the reverse:
//! eviction only ever try-locks slots.

use core::fmt::{self, Debug, Formatter};
use core::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use hashbrown::HashMap;

use crate::font::{FontId, OutlineSource};
use crate::raster::{PixelSize, RasterError, RasterGlyph, Rasterize, Rasterizer};

/// Identifies one cached glyph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct GlyphKey {
    /// Font the glyph belongs to.
    pub font: FontId,
    /// Requested codepoint.
    pub codepoint: u32,
    /// Requested cell size.
    pub size: PixelSize,
}

impl GlyphKey {
    /// Creates a key.
    pub fn new(font: FontId, codepoint: u32, size: PixelSize) -> Self {
        Self {
            font,
            codepoint,
            size,
        }
    }
}

/// Options for [`GlyphCache`].
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct CacheOptions {
    /// Maximum number of entries, or `None` to keep every glyph until it is
    /// released explicitly.
    ///
    /// When the bound is exceeded, the least recently used entry is evicted.
    /// Entries being rasterized are never evicted, so the bound can be exceeded
    /// briefly under concurrent use.
    pub capacity: Option<NonZeroUsize>,
    /// Whether rasterization failures are remembered.
    ///
    /// When `false` (the default), a failed glyph is rasterized again on the
    /// next request. When `true`, the failure is returned for later requests
    /// until the entry is released.
    pub cache_failures: bool,
}

impl CacheOptions {
    /// Options for a cache holding at most `capacity` entries.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }
}

/// A snapshot of cache counters.
///
/// Counters accumulate from the creation of the cache or the last
/// [`GlyphCache::clear_stats`] call.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct CacheStats {
    /// Requests answered from the cache, remembered failures included.
    pub hits: u64,
    /// Requests that had to rasterize.
    pub misses: u64,
    /// Calls made to the rasterizer.
    pub rasterizations: u64,
    /// Entries removed to respect the capacity.
    pub evictions: u64,
    /// Number of entries currently held, including those being rasterized.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of requests answered from the cache, or zero if there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

enum SlotState {
    /// Not rasterized yet.
    Vacant,
    Ready(Arc<RasterGlyph>),
    Failed(RasterError),
    /// Removed from the map after a failure that is not remembered.
    ///
    /// Callers that were waiting on the slot look the key up again instead of
    /// rasterizing into a slot nobody else can see.
    Retired,
}

struct Slot {
    state: Mutex<SlotState>,
    /// Map serial of the most recent request, for LRU eviction.
    last_used: AtomicU64,
}

impl Slot {
    fn new(serial: u64) -> Self {
        Self {
            state: Mutex::new(SlotState::Vacant),
            last_used: AtomicU64::new(serial),
        }
    }

    /// Returns `true` if the slot holds a result and nobody is working on it.
    fn is_settled(&self) -> bool {
        match self.state.try_lock() {
            Ok(state) => !matches!(*state, SlotState::Vacant),
            Err(TryLockError::Poisoned(state)) => {
                !matches!(*state.into_inner(), SlotState::Vacant)
            }
            Err(TryLockError::WouldBlock) => false,
        }
    }
}

#[derive(Default)]
struct SlotMap {
    slots: HashMap<GlyphKey, Arc<Slot>>,
    serial: u64,
}

/// A thread-safe, memoizing wrapper around a [`Rasterize`] implementation.
///
/// For a given [`GlyphKey`], the cache rasterizes at most once and hands out
/// the same [`Arc`] to every caller until the entry is released or evicted.
/// Codepoints missing from the font are cached as placeholders with
/// [`GlyphStatus::Missing`](crate::GlyphStatus::Missing).
///
/// Entries are keyed by [`FontId`] and are not dropped with the font; call
/// [`release_font`](Self::release_font) when a font is unloaded.
pub struct GlyphCache<R = Rasterizer> {
    rasterizer: R,
    options: CacheOptions,
    map: Mutex<SlotMap>,
    hits: AtomicU64,
    misses: AtomicU64,
    rasterizations: AtomicU64,
    evictions: AtomicU64,
}

impl GlyphCache {
    /// Creates an unbounded cache using the default [`Rasterizer`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache using the default [`Rasterizer`] and the given options.
    pub fn with_options(options: CacheOptions) -> Self {
        Self::with_rasterizer(Rasterizer::default(), options)
    }
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::with_options(CacheOptions::default())
    }
}

impl<R: Rasterize> GlyphCache<R> {
    /// Creates a cache around a custom rasterizer.
    pub fn with_rasterizer(rasterizer: R, options: CacheOptions) -> Self {
        Self {
            rasterizer,
            options,
            map: Mutex::new(SlotMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            rasterizations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// The wrapped rasterizer.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// The options the cache was created with.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Returns the glyph for `codepoint` at `size`, rasterizing it on first use.
    ///
    /// Missing glyphs produce a cached placeholder rather than an error. A
    /// [`RasterError::RasterizationFailure`] is logged and returned.
    pub fn get_or_rasterize(
        &self,
        font: &dyn OutlineSource,
        codepoint: u32,
        size: PixelSize,
    ) -> Result<Arc<RasterGlyph>, RasterError> {
        let key = GlyphKey::new(font.id(), codepoint, size);
        loop {
            let slot = self.slot(key);
            if let Some(result) = self.resolve(font, key, &slot) {
                return result;
            }
            log::trace!("retrying {key:?} after a failed attempt");
        }
    }

    /// Answers a request from `slot`, rasterizing under its lock if needed.
    ///
    /// Returns `None` if the slot was retired while waiting for the lock.
    fn resolve(
        &self,
        font: &dyn OutlineSource,
        key: GlyphKey,
        slot: &Arc<Slot>,
    ) -> Option<Result<Arc<RasterGlyph>, RasterError>> {
        let GlyphKey { codepoint, size, .. } = key;
        let mut state = lock(&slot.state);
        match &*state {
            SlotState::Ready(glyph) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Ok(glyph.clone()));
            }
            SlotState::Failed(err) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Err(err.clone()));
            }
            SlotState::Retired => return None,
            SlotState::Vacant => {}
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        self.rasterizations.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "rasterizing U+{codepoint:04X} at {}x{} from {:?}",
            size.width,
            size.height,
            key.font
        );
        let result = match self.rasterizer.rasterize(font, codepoint, size) {
            Err(RasterError::MissingGlyph { .. }) => {
                log::debug!("U+{codepoint:04X} is missing from {:?}", key.font);
                Ok(self.rasterizer.placeholder(font, codepoint, size))
            }
            result => result,
        };
        Some(match result {
            Ok(glyph) => {
                let glyph = Arc::new(glyph);
                *state = SlotState::Ready(glyph.clone());
                Ok(glyph)
            }
            Err(err) => {
                log::warn!("{err}");
                if self.options.cache_failures {
                    *state = SlotState::Failed(err.clone());
                } else {
                    // Unmapped while still locked, so that later callers
                    // either wait here and retry or find a fresh slot.
                    self.forget(&key, slot);
                    *state = SlotState::Retired;
                }
                Err(err)
            }
        })
    }

    /// Returns the cached glyph for `key` without rasterizing.
    ///
    /// Waits if the glyph is being rasterized. Does not affect statistics or
    /// eviction order.
    pub fn get(&self, key: &GlyphKey) -> Option<Arc<RasterGlyph>> {
        let slot = lock(&self.map).slots.get(key).cloned()?;
        let state = lock(&slot.state);
        match &*state {
            SlotState::Ready(glyph) => Some(glyph.clone()),
            SlotState::Vacant | SlotState::Failed(_) | SlotState::Retired => None,
        }
    }

    /// Returns `true` if the cache holds an entry for `key`.
    pub fn contains(&self, key: &GlyphKey) -> bool {
        lock(&self.map).slots.contains_key(key)
    }

    /// Removes every entry of `font`, returning how many were removed.
    ///
    /// Glyphs already handed out stay valid.
    pub fn release_font(&self, font: FontId) -> usize {
        let mut map = lock(&self.map);
        let before = map.slots.len();
        map.slots.retain(|key, _| key.font != font);
        let removed = before - map.slots.len();
        log::debug!("released {removed} glyphs of {font:?}");
        removed
    }

    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        lock(&self.map).slots.clear();
    }

    /// Number of entries, including those being rasterized.
    pub fn len(&self) -> usize {
        lock(&self.map).slots.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rasterizations: self.rasterizations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Resets the counters without touching the entries.
    pub fn clear_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.rasterizations.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Finds or creates the slot for `key` and marks it as most recently used.
    fn slot(&self, key: GlyphKey) -> Arc<Slot> {
        let mut map = lock(&self.map);
        map.serial += 1;
        let serial = map.serial;
        if let Some(slot) = map.slots.get(&key) {
            slot.last_used.store(serial, Ordering::Relaxed);
            return slot.clone();
        }

        let slot = Arc::new(Slot::new(serial));
        map.slots.insert(key, slot.clone());
        if let Some(capacity) = self.options.capacity {
            let evicted = evict(&mut map.slots, capacity.get(), &key);
            if evicted > 0 {
                self.evictions.fetch_add(evicted, Ordering::Relaxed);
            }
        }
        slot
    }

    /// Removes `key` if it still refers to `slot`.
    fn forget(&self, key: &GlyphKey, slot: &Arc<Slot>) {
        let mut map = lock(&self.map);
        if map
            .slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            map.slots.remove(key);
        }
    }
}

impl<R> Debug for GlyphCache<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphCache")
            .field("options", &self.options)
            .field("entries", &lock(&self.map).slots.len())
            .finish_non_exhaustive()
    }
}

/// Evicts least recently used settled slots other than `keep` until at most
/// `capacity` remain or nothing more can be evicted.
fn evict(slots: &mut HashMap<GlyphKey, Arc<Slot>>, capacity: usize, keep: &GlyphKey) -> u64 {
    let mut evicted = 0;
    while slots.len() > capacity {
        let victim = slots
            .iter()
            .filter(|(key, slot)| *key != keep && slot.is_settled())
            .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
            .map(|(key, _)| *key);
        let Some(victim) = victim else {
            break;
        };
        log::trace!("evicting {victim:?}");
        slots.remove(&victim);
        evicted += 1;
    }
    evicted
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{LineMetrics, OutlineError};
    use crate::outline::OutlinePath;
    use crate::raster::{GlyphBitmap, GlyphMetrics, GlyphStatus};
    use std::sync::atomic::AtomicUsize;

    const MISSING: u32 = 0xFFFF;
    const BROKEN: u32 = 0xDEAD;

    struct StubFont(FontId);

    impl OutlineSource for StubFont {
        fn id(&self) -> FontId {
            self.0
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn line_metrics(&self) -> LineMetrics {
            LineMetrics::default()
        }

        fn glyph_id(&self, codepoint: u32) -> Option<u32> {
            (codepoint != MISSING).then_some(codepoint)
        }

        fn advance_width(&self, _glyph_id: u32) -> Option<f32> {
            Some(500.0)
        }

        fn left_side_bearing(&self, _glyph_id: u32) -> Option<f32> {
            Some(0.0)
        }

        fn draw_outline(
            &self,
            _glyph_id: u32,
            _path: &mut OutlinePath,
        ) -> Result<(), OutlineError> {
            Ok(())
        }
    }

    /// Produces a 1xN glyph for codepoint N without looking at outlines.
    #[derive(Default)]
    struct ScriptedRasterizer {
        calls: AtomicUsize,
    }

    impl ScriptedRasterizer {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Rasterize for ScriptedRasterizer {
        fn rasterize(
            &self,
            _font: &dyn OutlineSource,
            codepoint: u32,
            _size: PixelSize,
        ) -> Result<RasterGlyph, RasterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match codepoint {
                MISSING => Err(RasterError::MissingGlyph { codepoint }),
                BROKEN => Err(RasterError::RasterizationFailure {
                    codepoint,
                    reason: OutlineError::Malformed("scripted".into()),
                }),
                _ => {
                    let height = codepoint % 16;
                    let bitmap = GlyphBitmap::from_coverage(1, height, vec![255; height as usize])
                        .unwrap_or_default();
                    Ok(RasterGlyph::new(GlyphMetrics::default(), bitmap))
                }
            }
        }
    }

    fn scripted(options: CacheOptions) -> GlyphCache<ScriptedRasterizer> {
        GlyphCache::with_rasterizer(ScriptedRasterizer::default(), options)
    }

    const SIZE: PixelSize = PixelSize::square(32);

    #[test]
    fn repeated_requests_hit() {
        let cache = scripted(CacheOptions::default());
        let font = StubFont(FontId::next());

        let first = cache.get_or_rasterize(&font, 5, SIZE).unwrap();
        let second = cache.get_or_rasterize(&font, 5, SIZE).unwrap();
        assert!(Arc::ptr_eq(&first, &second), "same entry is shared");
        assert_eq!(cache.rasterizer().calls(), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 0.5);

        cache.clear_stats();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn sizes_and_fonts_are_distinct_keys() {
        let cache = scripted(CacheOptions::default());
        let a = StubFont(FontId::next());
        let b = StubFont(FontId::next());
        cache.get_or_rasterize(&a, 5, SIZE).unwrap();
        cache.get_or_rasterize(&a, 5, PixelSize::new(32, 16)).unwrap();
        cache.get_or_rasterize(&b, 5, SIZE).unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.rasterizer().calls(), 3);
    }

    #[test]
    fn missing_glyphs_are_cached_placeholders() {
        let cache = scripted(CacheOptions::default());
        let font = StubFont(FontId::next());
        let glyph = cache.get_or_rasterize(&font, MISSING, SIZE).unwrap();
        assert_eq!(glyph.status(), GlyphStatus::Missing);
        assert_eq!(glyph.metrics().advance_width, 16.0);

        cache.get_or_rasterize(&font, MISSING, SIZE).unwrap();
        assert_eq!(cache.rasterizer().calls(), 1);
    }

    #[test]
    fn failures_are_retried_by_default() {
        let cache = scripted(CacheOptions::default());
        let font = StubFont(FontId::next());
        for _ in 0..2 {
            let err = cache.get_or_rasterize(&font, BROKEN, SIZE).unwrap_err();
            assert_eq!(err.codepoint(), BROKEN);
        }
        assert_eq!(cache.rasterizer().calls(), 2);
        assert!(cache.is_empty(), "failures leave no entry behind");
    }

    #[test]
    fn failures_can_be_remembered() {
        let cache = scripted(CacheOptions {
            cache_failures: true,
            ..CacheOptions::default()
        });
        let font = StubFont(FontId::next());
        let first = cache.get_or_rasterize(&font, BROKEN, SIZE).unwrap_err();
        let second = cache.get_or_rasterize(&font, BROKEN, SIZE).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(cache.rasterizer().calls(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert!(
            cache.get(&GlyphKey::new(font.id(), BROKEN, SIZE)).is_none(),
            "a remembered failure is not a glyph"
        );
    }

    #[test]
    fn release_font_keeps_other_fonts() {
        let cache = scripted(CacheOptions::default());
        let a = StubFont(FontId::next());
        let b = StubFont(FontId::next());
        let kept = cache.get_or_rasterize(&a, 3, SIZE).unwrap();
        cache.get_or_rasterize(&a, 4, SIZE).unwrap();
        cache.get_or_rasterize(&b, 3, SIZE).unwrap();

        assert_eq!(cache.release_font(a.id()), 2);
        assert_eq!(cache.len(), 1);
        assert!(
            cache.contains(&GlyphKey::new(b.id(), 3, SIZE)),
            "other font survives"
        );
        assert_eq!(kept.bitmap().height(), 3, "handed out glyphs stay valid");

        cache.clear();
        assert!(cache.is_empty(), "clear removes everything");
    }

    #[test]
    fn bounded_cache_evicts_least_recently_used() {
        let cache = scripted(CacheOptions::bounded(NonZeroUsize::new(2).unwrap()));
        let font = StubFont(FontId::next());
        cache.get_or_rasterize(&font, 1, SIZE).unwrap();
        cache.get_or_rasterize(&font, 2, SIZE).unwrap();
        // Touch 1 so that 2 becomes the oldest.
        cache.get_or_rasterize(&font, 1, SIZE).unwrap();
        cache.get_or_rasterize(&font, 3, SIZE).unwrap();

        assert_eq!(cache.len(), 2);
        let key = |codepoint| GlyphKey::new(font.id(), codepoint, SIZE);
        assert!(cache.contains(&key(1)), "recently used entry stays");
        assert!(!cache.contains(&key(2)), "oldest entry is evicted");
        assert_eq!(cache.stats().evictions, 1);

        cache.get_or_rasterize(&font, 2, SIZE).unwrap();
        assert_eq!(cache.rasterizer().calls(), 4, "evicted glyph is rasterized again");
    }
}
