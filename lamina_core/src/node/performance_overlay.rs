// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! On-screen frame timing graphs and statistics.

use kurbo::{Affine, Point, Rect};

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{AutoCanvasRestore, PaintContext, PrerollContext};
use crate::instrumentation::Stopwatch;
use crate::paint::{Color, Paint};

const PADDING: f64 = 8.0;
const LABEL_X: f64 = 8.0;
const LABEL_Y: f64 = -10.0;
const LABEL_COLOR: Color = Color(0xff88_8888);

/// Which parts of the overlay are shown.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PerformanceOverlayOptions(u32);

impl PerformanceOverlayOptions {
    /// Nothing is shown.
    pub const NONE: Self = Self(0);
    /// Statistics text for the raster thread.
    pub const DISPLAY_RASTERIZER: Self = Self(1 << 0);
    /// Lap graph for the raster thread.
    pub const VISUALIZE_RASTERIZER: Self = Self(1 << 1);
    /// Statistics text for the UI thread.
    pub const DISPLAY_ENGINE: Self = Self(1 << 2);
    /// Lap graph for the UI thread.
    pub const VISUALIZE_ENGINE: Self = Self(1 << 3);
    /// Everything.
    pub const ALL: Self = Self(0b1111);

    /// Creates options from raw bits, dropping unknown ones.
    #[inline]
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no option is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for PerformanceOverlayOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::fmt::Debug for PerformanceOverlayOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PerformanceOverlayOptions({:#06b})", self.0)
    }
}

/// Shows raster and UI frame times in `rect`.
///
/// The top half belongs to the raster thread, the bottom half to the UI
/// thread.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceOverlayNode {
    /// What to show.
    pub options: PerformanceOverlayOptions,
    /// Where to show it.
    pub rect: Rect,
}

impl PerformanceOverlayNode {
    /// Creates a performance overlay node.
    #[must_use]
    pub fn new(options: PerformanceOverlayOptions, rect: Rect) -> Self {
        Self { options, rect }
    }
}

impl NodeBehavior for PerformanceOverlayNode {
    fn preroll(&self, node: &Node, _context: &mut PrerollContext<'_>, _matrix: Affine) {
        node.set_paint_bounds(self.rect);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        if self.options.is_empty() {
            return;
        }
        let bounds = node.paint_bounds();
        let x = bounds.x0 + PADDING;
        let y = bounds.y0 + PADDING;
        let width = bounds.width() - PADDING * 2.0;
        let height = bounds.height() / 2.0;

        let (raster_time, ui_time) = (context.raster_time, context.ui_time);
        let mut restore = AutoCanvasRestore::leaf(context, true);
        let canvas = restore.leaf_nodes_canvas();
        visualize_stopwatch(
            canvas,
            raster_time,
            Rect::new(x, y, x + width, y + height - PADDING),
            self.options.contains(PerformanceOverlayOptions::VISUALIZE_RASTERIZER),
            self.options.contains(PerformanceOverlayOptions::DISPLAY_RASTERIZER),
            "GPU",
        );
        visualize_stopwatch(
            canvas,
            ui_time,
            Rect::new(x, y + height, x + width, y + 2.0 * height - PADDING),
            self.options.contains(PerformanceOverlayOptions::VISUALIZE_ENGINE),
            self.options.contains(PerformanceOverlayOptions::DISPLAY_ENGINE),
            "UI",
        );
    }
}

fn visualize_stopwatch(
    canvas: &mut dyn Canvas,
    stopwatch: &Stopwatch,
    rect: Rect,
    show_graph: bool,
    show_labels: bool,
    label_prefix: &str,
) {
    if show_graph {
        stopwatch.visualize(canvas, rect);
    }
    if show_labels {
        let text = make_statistics_text(stopwatch, label_prefix);
        let origin = Point::new(rect.x0 + LABEL_X, rect.y1 + LABEL_Y);
        canvas.draw_text(&text, origin, &Paint::from_color(LABEL_COLOR));
    }
}

/// Formats the max and average lap of `stopwatch` in milliseconds.
#[must_use]
pub fn make_statistics_text(stopwatch: &Stopwatch, label_prefix: &str) -> String {
    let timebase = stopwatch.timebase();
    let max = stopwatch.max_delta().to_millis_f64(timebase);
    let average = stopwatch.average_delta().to_millis_f64(timebase);
    format!("{label_prefix}  max {max:.1} ms/frame, avg {average:.1} ms/frame")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::CanvasOp;
    use crate::time::{Duration, Timebase};

    fn overlay(options: PerformanceOverlayOptions) -> std::sync::Arc<Node> {
        Node::new(NodeKind::PerformanceOverlay(PerformanceOverlayNode::new(
            options,
            Rect::new(0.0, 0.0, 64.0, 64.0),
        )))
    }

    #[test]
    fn no_options_draws_nothing() {
        let fixture = Fixture::new();
        let node = overlay(PerformanceOverlayOptions::NONE);
        fixture.preroll(&node);
        assert_eq!(node.paint_bounds(), Rect::new(0.0, 0.0, 64.0, 64.0));
        assert!(fixture.paint(&node).is_empty());
    }

    #[test]
    fn rasterizer_statistics_text_position() {
        let fixture = Fixture::new();
        let node = overlay(PerformanceOverlayOptions::DISPLAY_RASTERIZER);
        fixture.preroll(&node);
        let ops = fixture.paint(&node);
        let expected = make_statistics_text(&fixture.raster_time, "GPU");
        assert_eq!(
            ops,
            vec![
                CanvasOp::Save,
                CanvasOp::DrawText {
                    text: expected,
                    origin: Point::new(16.0, 22.0),
                },
                CanvasOp::Restore,
            ]
        );
    }

    #[test]
    fn statistics_text_format() {
        let mut stopwatch = Stopwatch::new(Duration::frame_budget(60, Timebase::NANOS), Timebase::NANOS);
        stopwatch.set_lap_time(Duration(12_000_000));
        let text = make_statistics_text(&stopwatch, "UI");
        assert_eq!(text, "UI  max 12.0 ms/frame, avg 0.1 ms/frame");
    }

    #[test]
    fn options_combine() {
        let all = PerformanceOverlayOptions::DISPLAY_RASTERIZER
            | PerformanceOverlayOptions::VISUALIZE_RASTERIZER
            | PerformanceOverlayOptions::DISPLAY_ENGINE
            | PerformanceOverlayOptions::VISUALIZE_ENGINE;
        assert_eq!(all, PerformanceOverlayOptions::ALL);
        assert!(all.contains(PerformanceOverlayOptions::DISPLAY_ENGINE));
        assert_eq!(PerformanceOverlayOptions::from_bits_truncate(0xff).bits(), 0b1111);
    }
}
