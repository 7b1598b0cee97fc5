// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use blitter::{CacheOptions, GlyphCache, GlyphKey, OutlineSource, Rasterizer};
use blitter_dev::{CountingRasterizer, SyntheticFont};

use crate::util::CELL;

const THREADS: usize = 8;

fn slow_cache(options: CacheOptions) -> GlyphCache<CountingRasterizer> {
    let rasterizer = CountingRasterizer::wrap(Rasterizer::default())
        .with_delay(Duration::from_millis(20));
    GlyphCache::with_rasterizer(rasterizer, options)
}

#[test]
fn concurrency_cache_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GlyphCache>();
    assert_send_sync::<GlyphCache<CountingRasterizer>>();
}

#[test]
fn concurrency_same_key_rasterizes_once() {
    let font = SyntheticFont::sample();
    let cache = slow_cache(CacheOptions::default());
    let barrier = Barrier::new(THREADS);

    let glyphs: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_or_rasterize(&font, 128, CELL).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.rasterizer().calls(), 1, "one rasterization for all callers");
    assert_eq!(cache.rasterizer().max_in_flight(), 1);
    assert!(
        glyphs.iter().all(|glyph| Arc::ptr_eq(glyph, &glyphs[0])),
        "every caller observes the same glyph"
    );
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, THREADS as u64 - 1);
}

#[test]
fn concurrency_distinct_keys_each_rasterize_once() {
    let font = SyntheticFont::sample();
    let cache = GlyphCache::with_rasterizer(CountingRasterizer::new(), CacheOptions::default());
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for offset in 0..THREADS as u32 {
            let (cache, font, barrier) = (&cache, &font, &barrier);
            scope.spawn(move || {
                barrier.wait();
                // Every thread walks the same range from a different start.
                for i in 0..64 {
                    let codepoint = 128 + (offset * 8 + i) % 64;
                    cache.get_or_rasterize(font, codepoint, CELL).unwrap();
                }
            });
        }
    });

    assert_eq!(cache.rasterizer().calls(), 64);
    assert_eq!(cache.len(), 64);
}

#[test]
fn concurrency_failures_are_shared_when_remembered() {
    let font = SyntheticFont::sample();
    let cache = slow_cache(CacheOptions {
        cache_failures: true,
        ..CacheOptions::default()
    });
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                barrier.wait();
                let result = cache.get_or_rasterize(&font, SyntheticFont::CORRUPT, CELL);
                assert!(result.is_err(), "corrupt glyph fails for every caller");
            });
        }
    });

    assert_eq!(cache.rasterizer().calls(), 1);
}

#[test]
fn concurrency_waiters_retry_after_a_failure() {
    let font = SyntheticFont::sample();
    let rasterizer = CountingRasterizer::wrap(Rasterizer::default())
        .with_delay(Duration::from_millis(20))
        .with_failures(1);
    let cache = GlyphCache::with_rasterizer(rasterizer, CacheOptions::default());
    let barrier = Barrier::new(THREADS);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_or_rasterize(&font, 128, CELL)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        cache.rasterizer().max_in_flight(),
        1,
        "the key is never rasterized twice at the same time"
    );
    assert_eq!(cache.rasterizer().calls(), 2, "the failed attempt and one retry");
    let glyphs: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
    assert_eq!(glyphs.len(), THREADS - 1, "only the failed attempt reports an error");

    let cached = cache.get(&GlyphKey::new(font.id(), 128, CELL)).unwrap();
    assert!(
        glyphs.iter().all(|glyph| Arc::ptr_eq(glyph, &cached)),
        "every caller holds the glyph the cache keeps"
    );
    assert_eq!(cache.len(), 1);
}
