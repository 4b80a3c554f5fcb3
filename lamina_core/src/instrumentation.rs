// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-time stopwatches and their on-screen graph.

use kurbo::{BezPath, Rect};

use crate::canvas::Canvas;
use crate::paint::{Color, Paint, PaintStyle};
use crate::shape::Shape;
use crate::time::{Duration, HostTime, Timebase};

/// Number of laps kept by a [`Stopwatch`].
pub const MAX_SAMPLES: usize = 120;

/// Graphs are scaled to show laps up to this many frame budgets.
const GRAPH_BUDGET_MULTIPLE: f64 = 3.0;

const BACKGROUND_COLOR: Color = Color(0x99ff_ffff);
const BAR_COLOR: Color = Color(0xaa00_00ff);
const MARKER_COLOR: Color = Color(0xcc00_0000);
const ON_BUDGET_COLOR: Color = Color(0xff00_ff00);
const OVER_BUDGET_COLOR: Color = Color(0xffff_0000);

/// A ring buffer of lap times measured against a frame budget.
///
/// The raster thread times each frame with [`start`](Self::start) and
/// [`stop`](Self::stop); UI build times arrive precomputed through
/// [`set_lap_time`](Self::set_lap_time).
#[derive(Clone, Debug)]
pub struct Stopwatch {
    laps: Vec<Duration>,
    current: usize,
    start: HostTime,
    frame_budget: Duration,
    timebase: Timebase,
}

impl Stopwatch {
    /// Creates a stopwatch for the given frame budget.
    #[must_use]
    pub fn new(frame_budget: Duration, timebase: Timebase) -> Self {
        Self {
            laps: vec![Duration::ZERO; MAX_SAMPLES],
            current: 0,
            start: HostTime::default(),
            frame_budget,
            timebase,
        }
    }

    /// Begins a new lap at `now`.
    pub fn start(&mut self, now: HostTime) {
        self.start = now;
        self.current = (self.current + 1) % MAX_SAMPLES;
    }

    /// Ends the current lap at `now`.
    pub fn stop(&mut self, now: HostTime) {
        self.laps[self.current] = now.saturating_duration_since(self.start);
    }

    /// Records a lap measured elsewhere.
    pub fn set_lap_time(&mut self, lap: Duration) {
        self.current = (self.current + 1) % MAX_SAMPLES;
        self.laps[self.current] = lap;
    }

    /// The most recent lap.
    #[must_use]
    pub fn last_lap(&self) -> Duration {
        self.laps[self.current]
    }

    /// The longest lap in the buffer.
    #[must_use]
    pub fn max_delta(&self) -> Duration {
        self.laps.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Mean over the whole buffer, counting unfilled slots as zero.
    #[must_use]
    pub fn average_delta(&self) -> Duration {
        let sum: u64 = self.laps.iter().map(|d| d.ticks()).sum();
        Duration(sum / MAX_SAMPLES as u64)
    }

    /// The frame budget.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// The timebase of the recorded laps.
    #[must_use]
    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    /// A lap expressed in frame budgets (1.0 = exactly on budget).
    #[must_use]
    pub fn unit_frame_interval(&self, lap: Duration) -> f64 {
        let budget = self.frame_budget.to_millis_f64(self.timebase);
        if budget <= 0.0 {
            return 0.0;
        }
        lap.to_millis_f64(self.timebase) / budget
    }

    fn unit_height(&self, lap: Duration) -> f64 {
        (self.unit_frame_interval(lap) / GRAPH_BUDGET_MULTIPLE).min(1.0)
    }

    /// Draws the lap graph into `rect`.
    ///
    /// One bar per sample, horizontal markers at every whole frame budget,
    /// and a vertical marker over the current sample colored by whether the
    /// last lap fit in the budget.
    pub fn visualize(&self, canvas: &mut dyn Canvas, rect: Rect) {
        canvas.draw_shape(&Shape::Rect(rect), &Paint::from_color(BACKGROUND_COLOR));

        let sample_width = rect.width() / MAX_SAMPLES as f64;
        let mut bars = BezPath::new();
        for (i, lap) in self.laps.iter().enumerate() {
            let height = rect.height() * self.unit_height(*lap);
            if height <= 0.0 {
                continue;
            }
            let x0 = rect.x0 + sample_width * i as f64;
            let bar = Rect::new(x0, rect.y1 - height, x0 + sample_width, rect.y1);
            bars.extend(kurbo::Shape::path_elements(&bar, 0.1));
        }
        canvas.draw_shape(&Shape::Path(bars), &Paint::from_color(BAR_COLOR));

        let marker = Paint {
            style: PaintStyle::Stroke(1.0),
            ..Paint::from_color(MARKER_COLOR)
        };
        let mut budget_multiple = 1.0;
        while budget_multiple < GRAPH_BUDGET_MULTIPLE {
            let y = rect.y1 - rect.height() * budget_multiple / GRAPH_BUDGET_MULTIPLE;
            canvas.draw_shape(&Shape::Rect(Rect::new(rect.x0, y, rect.x1, y)), &marker);
            budget_multiple += 1.0;
        }

        let color = if self.unit_frame_interval(self.last_lap()) > 1.0 {
            OVER_BUDGET_COLOR
        } else {
            ON_BUDGET_COLOR
        };
        let x0 = rect.x0 + sample_width * self.current as f64;
        canvas.draw_shape(
            &Shape::Rect(Rect::new(x0, rect.y0, x0 + sample_width, rect.y1)),
            &Paint::from_color(color),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasOp, RecordingCanvas};

    fn budget() -> Duration {
        Duration::frame_budget(60, Timebase::NANOS)
    }

    #[test]
    fn laps_and_statistics() {
        let mut sw = Stopwatch::new(budget(), Timebase::NANOS);
        sw.start(HostTime(1_000));
        sw.stop(HostTime(5_000));
        assert_eq!(sw.last_lap(), Duration(4_000));
        sw.set_lap_time(Duration(8_000));
        assert_eq!(sw.last_lap(), Duration(8_000));
        assert_eq!(sw.max_delta(), Duration(8_000));
        assert_eq!(sw.average_delta(), Duration(12_000 / MAX_SAMPLES as u64));
    }

    #[test]
    fn ring_buffer_wraps() {
        let mut sw = Stopwatch::new(budget(), Timebase::NANOS);
        sw.set_lap_time(Duration(99));
        for _ in 0..MAX_SAMPLES {
            sw.set_lap_time(Duration(1));
        }
        assert_eq!(sw.max_delta(), Duration(1), "old lap overwritten after a full cycle");
    }

    #[test]
    fn unit_frame_interval_is_relative_to_budget() {
        let sw = Stopwatch::new(Duration(10_000_000), Timebase::NANOS);
        assert!((sw.unit_frame_interval(Duration(5_000_000)) - 0.5).abs() < 1e-9);
        assert!((sw.unit_frame_interval(Duration(20_000_000)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn visualize_marks_over_budget_frames_red() {
        let mut sw = Stopwatch::new(Duration(10_000_000), Timebase::NANOS);
        sw.set_lap_time(Duration(25_000_000));
        let mut canvas = RecordingCanvas::new();
        sw.visualize(&mut canvas, Rect::new(0.0, 0.0, 120.0, 30.0));
        let last = canvas.ops().last().cloned();
        match last {
            Some(CanvasOp::DrawShape { paint, .. }) => assert_eq!(paint.color, OVER_BUDGET_COLOR),
            other => panic!("expected a marker draw, got {other:?}"),
        }
        assert_eq!(canvas.save_count(), 1);
    }
}
