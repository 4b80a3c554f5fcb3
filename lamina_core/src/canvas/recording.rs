// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Point, Rect};

use super::Canvas;
use crate::id::PictureId;
use crate::paint::{ImageFilter, Paint, SaveLayerRec, ShadowRec};
use crate::picture::Picture;
use crate::raster_cache::RasterImage;
use crate::shape::Shape;

/// One operation captured by a [`RecordingCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasOp {
    /// `save()`.
    Save,
    /// `save_layer(..)`.
    SaveLayer {
        /// Layer bounds.
        bounds: Option<Rect>,
        /// Layer paint.
        paint: Option<Paint>,
        /// Backdrop filter.
        backdrop: Option<ImageFilter>,
    },
    /// `restore()`.
    Restore,
    /// `concat(..)`.
    Concat(Affine),
    /// `set_matrix(..)`.
    SetMatrix(Affine),
    /// `clip_shape(..)`.
    ClipShape {
        /// Clip shape.
        shape: Shape,
        /// Whether the clip is anti-aliased.
        anti_alias: bool,
    },
    /// `draw_shape(..)`.
    DrawShape {
        /// The shape.
        shape: Shape,
        /// The paint.
        paint: Paint,
    },
    /// `draw_paint(..)`.
    DrawPaint(Paint),
    /// `draw_shadow(..)`.
    DrawShadow {
        /// Occluding shape.
        shape: Shape,
        /// Shadow parameters.
        shadow: ShadowRec,
    },
    /// `draw_picture(..)`.
    DrawPicture(PictureId),
    /// `draw_image(..)`.
    DrawImage {
        /// Image identity.
        id: u64,
        /// Left edge of the destination.
        left: f64,
        /// Top edge of the destination.
        top: f64,
    },
    /// `draw_text(..)`.
    DrawText {
        /// The text.
        text: String,
        /// Baseline origin.
        origin: Point,
    },
}

/// A [`Canvas`] that records every operation.
///
/// Transforms are tracked so [`total_matrix`](Canvas::total_matrix) behaves
/// like a real canvas. A `restore` with nothing saved is ignored and not
/// recorded.
#[derive(Debug)]
pub struct RecordingCanvas {
    ops: Vec<CanvasOp>,
    matrices: Vec<Affine>,
    layer_depth: usize,
    max_layer_depth: usize,
    layer_stack: Vec<bool>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCanvas {
    /// Creates an empty recording canvas.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            matrices: vec![Affine::IDENTITY],
            layer_depth: 0,
            max_layer_depth: 0,
            layer_stack: Vec::new(),
        }
    }

    /// The operations recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Consumes the canvas and returns the recorded operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<CanvasOp> {
        self.ops
    }

    /// Deepest nesting of offscreen layers seen so far.
    #[must_use]
    pub fn max_layer_depth(&self) -> usize {
        self.max_layer_depth
    }

    /// Clears the recording, keeping the current state stack.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn current(&self) -> Affine {
        self.matrices.last().copied().unwrap_or(Affine::IDENTITY)
    }

    fn set_current(&mut self, transform: Affine) {
        if let Some(top) = self.matrices.last_mut() {
            *top = transform;
        }
    }

    fn push(&mut self, is_layer: bool) -> usize {
        let count = self.matrices.len();
        self.matrices.push(self.current());
        self.layer_stack.push(is_layer);
        if is_layer {
            self.layer_depth += 1;
            self.max_layer_depth = self.max_layer_depth.max(self.layer_depth);
        }
        count
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) -> usize {
        self.ops.push(CanvasOp::Save);
        self.push(false)
    }

    fn save_layer(&mut self, rec: &SaveLayerRec) -> usize {
        self.ops.push(CanvasOp::SaveLayer {
            bounds: rec.bounds,
            paint: rec.paint.clone(),
            backdrop: rec.backdrop.clone(),
        });
        self.push(true)
    }

    fn restore(&mut self) {
        if self.matrices.len() <= 1 {
            return;
        }
        self.matrices.pop();
        if self.layer_stack.pop() == Some(true) {
            self.layer_depth -= 1;
        }
        self.ops.push(CanvasOp::Restore);
    }

    fn save_count(&self) -> usize {
        self.matrices.len()
    }

    fn concat(&mut self, transform: Affine) {
        self.ops.push(CanvasOp::Concat(transform));
        let next = self.current() * transform;
        self.set_current(next);
    }

    fn set_matrix(&mut self, transform: Affine) {
        self.ops.push(CanvasOp::SetMatrix(transform));
        self.set_current(transform);
    }

    fn total_matrix(&self) -> Affine {
        self.current()
    }

    fn clip_shape(&mut self, shape: &Shape, anti_alias: bool) {
        self.ops.push(CanvasOp::ClipShape {
            shape: shape.clone(),
            anti_alias,
        });
    }

    fn draw_shape(&mut self, shape: &Shape, paint: &Paint) {
        self.ops.push(CanvasOp::DrawShape {
            shape: shape.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_paint(&mut self, paint: &Paint) {
        self.ops.push(CanvasOp::DrawPaint(paint.clone()));
    }

    fn draw_shadow(&mut self, shape: &Shape, shadow: &ShadowRec) {
        self.ops.push(CanvasOp::DrawShadow {
            shape: shape.clone(),
            shadow: *shadow,
        });
    }

    fn draw_picture(&mut self, picture: &Picture) {
        self.ops.push(CanvasOp::DrawPicture(picture.id()));
    }

    fn draw_image(&mut self, image: &RasterImage, left: f64, top: f64) {
        self.ops.push(CanvasOp::DrawImage {
            id: image.id(),
            left,
            top,
        });
    }

    fn draw_text(&mut self, text: &str, origin: Point, _paint: &Paint) {
        self.ops.push(CanvasOp::DrawText {
            text: text.to_owned(),
            origin,
        });
    }
}
