// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface contract.
//!
//! The node tree never rasterizes anything itself. During Paint it issues
//! operations against a [`Canvas`], which a platform or 2-D library
//! implements. Two implementations live here:
//!
//! - [`NWayCanvas`] fans every operation out to several canvases, and is
//!   used for container nodes when platform views split the frame into
//!   multiple overlay surfaces.
//! - [`RecordingCanvas`] records operations as [`CanvasOp`] values, for
//!   tests and for inspecting what a tree paints.

use kurbo::{Affine, Point};

use crate::paint::{BlendMode, Color, Paint, SaveLayerRec, ShadowRec};
use crate::picture::Picture;
use crate::raster_cache::RasterImage;
use crate::shape::Shape;

mod nway;
mod recording;

pub use nway::NWayCanvas;
pub use recording::{CanvasOp, RecordingCanvas};

/// A stateful drawing surface.
///
/// The save stack starts with a count of 1. Every [`save`](Self::save) or
/// [`save_layer`](Self::save_layer) pushes the current transform and clip and
/// returns the count *before* the push; [`restore`](Self::restore) pops one
/// entry and is ignored when only the base entry remains.
pub trait Canvas {
    /// Pushes the current transform and clip. Returns the previous count.
    fn save(&mut self) -> usize;

    /// Pushes state and redirects drawing into an offscreen layer that is
    /// composited back on the matching restore. Returns the previous count.
    fn save_layer(&mut self, rec: &SaveLayerRec) -> usize;

    /// Pops the most recent save or layer.
    fn restore(&mut self);

    /// Current depth of the save stack (1 when nothing is saved).
    fn save_count(&self) -> usize;

    /// Restores until [`save_count`](Self::save_count) equals `count`.
    fn restore_to_count(&mut self, count: usize) {
        let count = count.max(1);
        while self.save_count() > count {
            self.restore();
        }
    }

    /// Pre-multiplies the current transform by `transform`.
    fn concat(&mut self, transform: Affine);

    /// Translates the current transform.
    fn translate(&mut self, dx: f64, dy: f64) {
        self.concat(Affine::translate((dx, dy)));
    }

    /// Replaces the current transform.
    fn set_matrix(&mut self, transform: Affine);

    /// The current transform from local to device space.
    fn total_matrix(&self) -> Affine;

    /// Intersects the clip with `shape`.
    fn clip_shape(&mut self, shape: &Shape, anti_alias: bool);

    /// Fills or strokes `shape`.
    fn draw_shape(&mut self, shape: &Shape, paint: &Paint);

    /// Fills the entire clip with `paint`.
    fn draw_paint(&mut self, paint: &Paint);

    /// Replaces the clip's contents with `color`.
    fn clear(&mut self, color: Color) {
        self.draw_paint(&Paint {
            color,
            blend_mode: BlendMode::Src,
            ..Paint::default()
        });
    }

    /// Draws the shadow cast by `shape`.
    fn draw_shadow(&mut self, shape: &Shape, shadow: &ShadowRec);

    /// Draws recorded content.
    fn draw_picture(&mut self, picture: &Picture);

    /// Draws a previously rasterized image with its top-left corner at
    /// `(left, top)` in the current coordinate space.
    fn draw_image(&mut self, image: &RasterImage, left: f64, top: f64);

    /// Draws text with its baseline origin at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, paint: &Paint);
}
