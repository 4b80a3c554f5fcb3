// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use lamina_core::time::Timebase;
use lamina_core::trace::CacheOutcome;
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};
use crate::ticks_to_us;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Skip and cache events carry no timestamp of their own and are placed at
/// the most recent phase boundary.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Frame",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Skip {
                frame_index,
                node,
                reason,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Skip",
                    "cat": "Node",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "node": node,
                        "reason": format!("{reason:?}"),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": ticks_to_us(s.started_at.ticks(), timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "preroll_us": ticks_to_us(s.preroll_ticks, timebase),
                        "paint_us": ticks_to_us(s.paint_ticks, timebase),
                        "update_scene_us": ticks_to_us(s.update_scene_ticks, timebase),
                        "skipped_nodes": s.skipped_nodes,
                        "resubmitted": s.resubmitted,
                    }
                }));
            }
            RecordedEvent::Cache(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}Cache", e.cache),
                    "cat": "Rich",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "id": e.id,
                        "hit": e.outcome == CacheOutcome::Hit,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
