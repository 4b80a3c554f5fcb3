// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the raster pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! Preroll, Paint, and scene-update traversals call as they run. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`CacheEvent`] and the
//!   corresponding `TraceSink` method.

use crate::id::NodeId;
use crate::time::HostTime;

/// Which traversal of the frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Bounds and compositing requirements.
    Preroll,
    /// Draw commands against the canvas.
    Paint,
    /// Translation of system-composited subtrees into native nodes.
    UpdateScene,
}

impl PhaseKind {
    /// Short lowercase name, used by exporters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preroll => "preroll",
            Self::Paint => "paint",
            Self::UpdateScene => "update_scene",
        }
    }
}

/// Why a node contributed nothing to a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The node's clip does not intersect the cull rect.
    Culled,
    /// A texture node refers to an id missing from the registry.
    MissingTexture,
    /// A platform view was encountered without a view embedder.
    NoEmbedder,
    /// Frame geometry was not finite.
    InvalidGeometry,
}

/// Which cache a [`CacheEvent`] refers to.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Rasterized pictures.
    Raster,
    /// Retained native scene nodes.
    Retained,
}

/// Outcome of a cache lookup.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
    /// An entry was found and reused.
    Hit,
    /// No usable entry existed.
    Miss,
}

/// Marks the beginning of a traversal.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a traversal.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when a node is skipped during a traversal.
#[derive(Clone, Copy, Debug)]
pub struct SkipEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The skipped node.
    pub node: NodeId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// A cache lookup performed during a traversal.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct CacheEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which cache was consulted.
    pub cache: CacheKind,
    /// Raw id of the cached content (picture or node id).
    pub id: u64,
    /// Hit or miss.
    pub outcome: CacheOutcome,
}

/// Per-frame timing summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time when the frame began.
    pub started_at: HostTime,
    /// Preroll duration in ticks (0 if not measured).
    pub preroll_ticks: u64,
    /// Paint duration in ticks (0 if not measured).
    pub paint_ticks: u64,
    /// Scene-update duration in ticks (0 if not measured).
    pub update_scene_ticks: u64,
    /// Number of nodes skipped during the frame.
    pub skipped_nodes: u32,
    /// Whether the frame had to be resubmitted.
    pub resubmitted: bool,
}

/// Receives trace events from the raster pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a traversal.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a traversal.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a node is skipped.
    fn on_skip(&mut self, e: &SkipEvent) {
        _ = e;
    }

    /// Called with a per-frame timing summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called for each cache lookup (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_cache(&mut self, e: &CacheEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Borrows this tracer for a shorter lifetime, e.g. to hand it to one
    /// traversal while keeping it for the next.
    #[inline]
    #[must_use]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            let sink = match &mut self.sink {
                Some(s) => {
                    let s: &mut dyn TraceSink = &mut **s;
                    Some(s)
                }
                None => None,
            };
            Tracer { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            Tracer {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SkipEvent`].
    #[inline]
    pub fn skip(&mut self, e: &SkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_skip(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`CacheEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn cache(&mut self, e: &CacheEvent) {
        if let Some(s) = &mut self.sink {
            s.on_cache(e);
        }
    }
}

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    started_at: HostTime,
    phase_starts: [Option<HostTime>; 3],
    phase_ends: [Option<HostTime>; 3],
    skipped_nodes: u32,
    resubmitted: bool,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for a frame that began at `started_at`.
    #[must_use]
    pub fn new(frame_index: u64, started_at: HostTime) -> Self {
        Self {
            frame_index,
            started_at,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            skipped_nodes: 0,
            resubmitted: false,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Counts one skipped node.
    pub fn note_skip(&mut self) {
        self.add_skipped(1);
    }

    /// Counts `count` skipped nodes.
    pub fn add_skipped(&mut self, count: u32) {
        self.skipped_nodes = self.skipped_nodes.saturating_add(count);
    }

    /// Sets whether the frame was resubmitted.
    pub fn set_resubmitted(&mut self, resubmitted: bool) {
        self.resubmitted = resubmitted;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            started_at: self.started_at,
            preroll_ticks: self.phase_duration(PhaseKind::Preroll),
            paint_ticks: self.phase_duration(PhaseKind::Paint),
            update_scene_ticks: self.phase_duration(PhaseKind::UpdateScene),
            skipped_nodes: self.skipped_nodes,
            resubmitted: self.resubmitted,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Preroll => 0,
        PhaseKind::Paint => 1,
        PhaseKind::UpdateScene => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Preroll,
            timestamp: HostTime(0),
        });
        sink.on_skip(&SkipEvent {
            frame_index: 0,
            node: NodeId::next(),
            reason: SkipReason::Culled,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_end(&PhaseEndEvent {
            frame_index: 1,
            phase: PhaseKind::Paint,
            timestamp: HostTime(10),
        });
        tracer.reborrow().skip(&SkipEvent {
            frame_index: 1,
            node: NodeId::next(),
            reason: SkipReason::MissingTexture,
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = FrameSummaryBuilder::new(42, HostTime(1_000_000));
        builder.phase_begin(PhaseKind::Preroll, HostTime(1_000_000));
        builder.phase_end(PhaseKind::Preroll, HostTime(1_000_100));
        builder.phase_begin(PhaseKind::Paint, HostTime(1_000_100));
        builder.phase_end(PhaseKind::Paint, HostTime(1_000_500));
        builder.note_skip();
        builder.note_skip();

        let summary = builder.finish();
        assert_eq!(summary.preroll_ticks, 100);
        assert_eq!(summary.paint_ticks, 400);
        assert_eq!(summary.update_scene_ticks, 0, "phase never began");
        assert_eq!(summary.skipped_nodes, 2);
        assert!(!summary.resubmitted);
        assert_eq!(summary.frame_index, 42);
    }

    #[test]
    fn phase_names_are_distinct() {
        assert_eq!(PhaseKind::Preroll.name(), "preroll");
        assert_ne!(PhaseKind::Paint.name(), PhaseKind::UpdateScene.name());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_through_reborrow() {
        struct CountingSink {
            skips: Vec<SkipReason>,
        }
        impl TraceSink for CountingSink {
            fn on_skip(&mut self, e: &SkipEvent) {
                self.skips.push(e.reason);
            }
        }

        let mut sink = CountingSink { skips: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        let node = NodeId::next();
        tracer.reborrow().skip(&SkipEvent {
            frame_index: 3,
            node,
            reason: SkipReason::NoEmbedder,
        });
        tracer.skip(&SkipEvent {
            frame_index: 3,
            node,
            reason: SkipReason::Culled,
        });
        drop(tracer);
        assert_eq!(sink.skips, &[SkipReason::NoEmbedder, SkipReason::Culled]);
    }
}
