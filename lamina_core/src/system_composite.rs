// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off of subtrees to a platform-native compositor.
//!
//! Some platforms composite elevated surfaces themselves, drawing shadows and
//! clipping in the system compositor rather than on the canvas. During
//! Preroll such nodes set their system-composite flag instead of computing
//! shadow margins; the Paint traversal then skips them, and
//! [`Node::update_scene`](crate::node::Node::update_scene) describes them to
//! a [`SystemCompositor`].

use std::sync::Arc;

use kurbo::{Affine, Rect, RoundedRect};

use crate::id::NodeId;
use crate::node::Node;
use crate::paint::Color;
use crate::raster_cache::NodeCacheKey;

/// A framed surface pushed by a physical-shape node.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSpec {
    /// Outline of the frame; children are clipped to its bounds.
    pub rrect: RoundedRect,
    /// Fill color, also the background of any painted content.
    pub color: Color,
    /// Height above the parent frame.
    pub elevation: f64,
    /// Node the frame represents, used to retain it across frames.
    pub node: Option<NodeId>,
}

/// Receiver of a scene-update traversal.
///
/// Every `push_*` opens a scope that the matching [`pop`](Self::pop) closes.
/// Retained nodes are identified by [`NodeCacheKey`]s built from a node id
/// and the accumulated [`transform`](Self::transform).
pub trait SystemCompositor {
    /// Whether nodes should defer to this compositor at all.
    fn can_system_composite(&self) -> bool {
        true
    }

    /// Transform accumulated from every open transform scope.
    fn transform(&self) -> Affine;

    /// Returns `true` if the subtree for `key` was built in an earlier frame
    /// and is still cached.
    fn has_retained_node(&self, key: &NodeCacheKey) -> bool;

    /// Re-attaches a cached subtree under the current scope.
    fn attach_retained_node(&mut self, key: &NodeCacheKey);

    /// Opens a transform scope.
    fn push_transform(&mut self, transform: Affine);

    /// Opens an opacity scope.
    fn push_opacity(&mut self, alpha: u8);

    /// Opens a rectangular clip scope.
    fn push_clip(&mut self, rect: Rect);

    /// Opens a frame scope.
    fn push_frame(&mut self, frame: FrameSpec);

    /// Queues `node` to be painted into the innermost frame.
    fn add_paint_node(&mut self, node: &Arc<Node>);

    /// Closes the innermost scope.
    fn pop(&mut self);
}
