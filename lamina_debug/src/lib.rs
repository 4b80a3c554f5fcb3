// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, tree dumps, and Chrome trace export for lamina
//! diagnostics.
//!
//! This crate provides [`TraceSink`](lamina_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`tree::dump_tree`]: an indented text view of a node tree.

use lamina_core::time::Timebase;

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod tree;

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
