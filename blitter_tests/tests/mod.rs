// Copyright 2026 the Blitter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `blitter`.
//!
//! - The `util` module contains helpers shared by the test modules.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so that the helpers are compiled once.
//! - Fonts come from `blitter_dev`: most tests use its in-memory fonts, and the `font` module
//!   uses the DejaVu Sans file from its assets directory.
//! - For test naming, put the "topic" of the test at the start of the name, for example
//!   `cache_release_font` rather than `release_font_cache`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod concurrency;
mod raster;
mod util;
