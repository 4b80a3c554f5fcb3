// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use lamina_core::time::HostTime;
use lamina_core::trace::{
    CacheEvent, CacheKind, CacheOutcome, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    SkipEvent, SkipReason, TraceSink,
};

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_SKIP: u8 = 3;
const TAG_FRAME_SUMMARY: u8 = 4;
const TAG_CACHE: u8 = 5;

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Preroll => 0,
            PhaseKind::Paint => 1,
            PhaseKind::UpdateScene => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        self.write_u8(TAG_SKIP);
        self.write_u64(e.frame_index);
        self.write_u64(e.node.get());
        self.write_u8(match e.reason {
            SkipReason::Culled => 0,
            SkipReason::MissingTexture => 1,
            SkipReason::NoEmbedder => 2,
            SkipReason::InvalidGeometry => 3,
        });
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u64(s.started_at.ticks());
        self.write_u64(s.preroll_ticks);
        self.write_u64(s.paint_ticks);
        self.write_u64(s.update_scene_ticks);
        self.write_u32(s.skipped_nodes);
        self.write_u8(u8::from(s.resubmitted));
    }

    fn on_cache(&mut self, e: &CacheEvent) {
        self.write_u8(TAG_CACHE);
        self.write_u64(e.frame_index);
        self.write_u8(match e.cache {
            CacheKind::Raster => 0,
            CacheKind::Retained => 1,
        });
        self.write_u64(e.id);
        self.write_u8(match e.outcome {
            CacheOutcome::Hit => 1,
            CacheOutcome::Miss => 0,
        });
    }
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A skipped node.
    Skip {
        /// Frame counter.
        frame_index: u64,
        /// Raw id of the skipped node.
        node: u64,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// A [`CacheEvent`].
    Cache(CacheEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter { data: bytes, pos: 0 }
}

/// Iterator over decoded events.
///
/// Iteration stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Preroll,
            1 => PhaseKind::Paint,
            _ => PhaseKind::UpdateScene,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_skip(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let node = self.read_u64()?;
        let reason = match self.read_u8()? {
            0 => SkipReason::Culled,
            1 => SkipReason::MissingTexture,
            2 => SkipReason::NoEmbedder,
            _ => SkipReason::InvalidGeometry,
        };
        Some(RecordedEvent::Skip {
            frame_index,
            node,
            reason,
        })
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            started_at: HostTime(self.read_u64()?),
            preroll_ticks: self.read_u64()?,
            paint_ticks: self.read_u64()?,
            update_scene_ticks: self.read_u64()?,
            skipped_nodes: self.read_u32()?,
            resubmitted: self.read_u8()? != 0,
        }))
    }

    fn decode_cache(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Cache(CacheEvent {
            frame_index: self.read_u64()?,
            cache: match self.read_u8()? {
                0 => CacheKind::Raster,
                _ => CacheKind::Retained,
            },
            id: self.read_u64()?,
            outcome: match self.read_u8()? {
                0 => CacheOutcome::Miss,
                _ => CacheOutcome::Hit,
            },
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_SKIP => self.decode_skip(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_CACHE => self.decode_cache(),
            _ => None,
        }
    }
}
