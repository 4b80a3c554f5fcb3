// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedding of platform-native views between layers of drawn content.
//!
//! A platform view is rendered by the host platform, not by the canvas. The
//! tree marks where it goes; the [`ExternalViewEmbedder`] positions the
//! native view and hands out an overlay canvas for anything the tree draws
//! on top of it.

use kurbo::{Affine, Size};

use crate::id::ViewId;
use crate::mutators::MutatorsStack;

/// Geometry of one platform view, captured during Preroll.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedViewParams {
    /// Transform from the view's local space to the surface.
    pub matrix: Affine,
    /// Size of the view in its local space.
    pub size: Size,
    /// Ancestor clips, transforms, and opacities, outermost first.
    pub mutators: MutatorsStack,
}

/// What the rasterizer should do after Preroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PostPrerollResult {
    /// Continue with Paint.
    #[default]
    Success,
    /// Drop this frame and rasterize the same tree again, e.g. after the
    /// embedder moved to a different thread configuration.
    ResubmitFrame,
}

/// Host-side compositor for platform views.
///
/// Overlay indices returned by [`composite_embedded_view`] refer to the
/// overlay canvases the frame was acquired with, in order.
///
/// [`composite_embedded_view`]: Self::composite_embedded_view
pub trait ExternalViewEmbedder {
    /// A frame of `frame_size` is about to be rasterized.
    fn begin_frame(&mut self, frame_size: Size) {
        _ = frame_size;
    }

    /// Records a platform view encountered during Preroll.
    fn preroll_composite_embedded_view(&mut self, view_id: ViewId, params: EmbeddedViewParams);

    /// Called once Preroll has finished.
    fn post_preroll_action(&mut self) -> PostPrerollResult {
        PostPrerollResult::Success
    }

    /// Places the view in paint order and returns the overlay canvas that
    /// content drawn after it should go to.
    ///
    /// `None` keeps drawing on the current canvas.
    fn composite_embedded_view(&mut self, view_id: ViewId) -> Option<usize>;

    /// The frame has been painted.
    fn submit_frame(&mut self) {}
}
