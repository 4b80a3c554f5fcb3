// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable recorded drawing content.
//!
//! A [`Picture`] is the leaf payload of the tree: a list of drawing
//! operations recorded ahead of time, with a cull rect bounding everything
//! it draws. Pictures are cheap to clone and share their operation list.

use std::sync::Arc;

use kurbo::{Point, Rect};

use crate::canvas::Canvas;
use crate::geometry;
use crate::id::PictureId;
use crate::paint::Paint;
use crate::shape::Shape;

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PictureOp {
    /// Fill or stroke a shape.
    DrawShape {
        /// The shape.
        shape: Shape,
        /// The paint.
        paint: Paint,
    },
    /// Fill the clip with a paint.
    DrawPaint(Paint),
    /// Draw a run of text with its baseline origin at `origin`.
    DrawText {
        /// The text.
        text: String,
        /// Baseline origin.
        origin: Point,
        /// The paint.
        paint: Paint,
    },
}

#[derive(Debug)]
struct PictureData {
    id: PictureId,
    cull_rect: Rect,
    ops: Vec<PictureOp>,
}

/// Recorded drawing content with a stable identity.
#[derive(Clone, Debug)]
pub struct Picture {
    data: Arc<PictureData>,
}

impl Picture {
    /// Creates a picture from recorded operations.
    #[must_use]
    pub fn new(cull_rect: Rect, ops: Vec<PictureOp>) -> Self {
        Self {
            data: Arc::new(PictureData {
                id: PictureId::next(),
                cull_rect,
                ops,
            }),
        }
    }

    /// Returns the picture's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PictureId {
        self.data.id
    }

    /// Bounds of everything the picture draws.
    #[inline]
    #[must_use]
    pub fn cull_rect(&self) -> Rect {
        self.data.cull_rect
    }

    /// Number of recorded operations.
    #[inline]
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.data.ops.len()
    }

    /// The recorded operations in order.
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[PictureOp] {
        &self.data.ops
    }

    /// Replays the recorded operations onto `canvas`.
    pub fn playback(&self, canvas: &mut dyn Canvas) {
        for op in &self.data.ops {
            match op {
                PictureOp::DrawShape { shape, paint } => canvas.draw_shape(shape, paint),
                PictureOp::DrawPaint(paint) => canvas.draw_paint(paint),
                PictureOp::DrawText {
                    text,
                    origin,
                    paint,
                } => canvas.draw_text(text, *origin, paint),
            }
        }
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.data.id == other.data.id
    }
}

/// Accumulates operations into a [`Picture`].
///
/// The cull rect is the union of the recorded shapes' bounds unless one is
/// given explicitly.
#[derive(Debug, Default)]
pub struct PictureRecorder {
    ops: Vec<PictureOp>,
    bounds: Rect,
}

impl PictureRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a shape.
    pub fn draw_shape(&mut self, shape: Shape, paint: Paint) -> &mut Self {
        geometry::join(&mut self.bounds, &shape.bounds());
        self.ops.push(PictureOp::DrawShape { shape, paint });
        self
    }

    /// Records a text run occupying `bounds`.
    pub fn draw_text(
        &mut self,
        text: impl Into<String>,
        origin: Point,
        bounds: Rect,
        paint: Paint,
    ) -> &mut Self {
        geometry::join(&mut self.bounds, &bounds);
        self.ops.push(PictureOp::DrawText {
            text: text.into(),
            origin,
            paint,
        });
        self
    }

    /// Finishes recording, using the accumulated bounds as the cull rect.
    #[must_use]
    pub fn finish(self) -> Picture {
        Picture::new(self.bounds, self.ops)
    }

    /// Finishes recording with an explicit cull rect.
    #[must_use]
    pub fn finish_with_cull_rect(self, cull_rect: Rect) -> Picture {
        Picture::new(cull_rect, self.ops)
    }
}
