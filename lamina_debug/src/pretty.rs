// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use lamina_core::time::{HostTime, Timebase};
use lamina_core::trace::{
    CacheEvent, CacheOutcome, FrameSummary, PhaseBeginEvent, PhaseEndEvent, SkipEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        crate::ticks_to_us(ticks, self.timebase)
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} node={} reason={:?}",
            e.frame_index,
            e.node.get(),
            e.reason,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let resubmitted = if s.resubmitted { " RESUBMIT" } else { "" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} preroll={:.1}µs paint={:.1}µs update_scene={:.1}µs \
             skipped={}{resubmitted}",
            s.frame_index,
            self.ticks_to_us(s.preroll_ticks),
            self.ticks_to_us(s.paint_ticks),
            self.ticks_to_us(s.update_scene_ticks),
            s.skipped_nodes,
        );
    }

    fn on_cache(&mut self, e: &CacheEvent) {
        let outcome = match e.outcome {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        };
        let _ = writeln!(
            self.writer,
            "[cache] frame={} {:?} id={} {outcome}",
            e.frame_index, e.cache, e.id,
        );
    }
}

#[cfg(test)]
mod tests {
    use lamina_core::trace::{CacheKind, PhaseKind};

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn phase_lines_use_short_names() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: PhaseKind::UpdateScene,
            timestamp: HostTime(1_500),
        });
        let output = output(sink);
        assert_eq!(output, "[phase:begin] frame=1 update_scene at 1.5µs\n");
    }

    #[test]
    fn summary_flags_resubmits() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_frame_summary(&FrameSummary {
            frame_index: 4,
            started_at: HostTime(0),
            preroll_ticks: 2_000,
            paint_ticks: 3_000,
            update_scene_ticks: 0,
            skipped_nodes: 1,
            resubmitted: true,
        });
        let output = output(sink);
        assert!(output.contains("preroll=2.0µs"), "got: {output}");
        assert!(output.contains("skipped=1 RESUBMIT"), "got: {output}");
    }

    #[test]
    fn cache_lines_name_the_outcome() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_cache(&CacheEvent {
            frame_index: 2,
            cache: CacheKind::Raster,
            id: 9,
            outcome: CacheOutcome::Miss,
        });
        assert_eq!(output(sink), "[cache] frame=2 Raster id=9 miss\n");
    }
}
