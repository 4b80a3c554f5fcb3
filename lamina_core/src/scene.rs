// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building a node tree with a push/pop stack machine.
//!
//! A [`SceneBuilder`] starts with an implicit root container. Each `push_*`
//! call creates a container node, adds it to the node on top of the stack,
//! and makes it the new top; [`pop`](SceneBuilder::pop) returns to its
//! parent. Each `add_*` call adds a leaf to the top. [`build`] hands the
//! finished tree over as a [`Scene`].
//!
//! ```rust
//! use kurbo::{Affine, Rect, Size};
//! use lamina_core::paint::{Color, Paint};
//! use lamina_core::picture::PictureRecorder;
//! use lamina_core::scene::SceneBuilder;
//! use lamina_core::shape::{Clip, Shape};
//!
//! let mut recorder = PictureRecorder::new();
//! recorder.draw_shape(
//!     Shape::Rect(Rect::new(10.0, 10.0, 50.0, 50.0)),
//!     Paint::from_color(Color::WHITE),
//! );
//!
//! let mut builder = SceneBuilder::new();
//! builder.push_clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0), Clip::AntiAlias);
//! builder.push_opacity(128, kurbo::Vec2::ZERO);
//! builder.add_picture(kurbo::Vec2::ZERO, recorder.finish(), false, false);
//! builder.pop();
//! builder.pop();
//!
//! let tree = builder.build().into_layer_tree(Size::new(100.0, 100.0), 1.0);
//! assert_eq!(tree.root().child_count(), 1);
//! ```
//!
//! [`build`]: SceneBuilder::build

use core::fmt;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect, RoundedRect, Size, Vec2};

use crate::id::{NodeId, TextureId, ViewId};
use crate::layer_tree::{LayerTree, LayerTreeSettings};
use crate::node::{
    BackdropFilterNode, ClipShapeNode, ColorFilterNode, ImageFilterNode, Node, NodeKind,
    OpacityNode, PerformanceOverlayNode, PerformanceOverlayOptions, PhysicalShapeNode, PictureNode,
    PlatformViewNode, ShaderMaskNode, TextureNode, TransformNode,
};
use crate::paint::{BlendMode, Color, ColorFilter, ImageFilter, Shader};
use crate::picture::Picture;
use crate::shape::{Clip, Shape};

/// A reference to a container node created by a [`SceneBuilder`].
///
/// Handles outlive the builder. Passing one to
/// [`add_retained`](SceneBuilder::add_retained) of a later builder reuses
/// the subtree, node ids included.
#[derive(Clone)]
pub struct NodeHandle(Arc<Node>);

impl NodeHandle {
    /// The node's id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0.id()
    }

    /// The node itself.
    #[must_use]
    pub fn node(&self) -> &Arc<Node> {
        &self.0
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHandle")
            .field(&self.0.id())
            .field(&self.0.kind().name())
            .finish()
    }
}

/// Stack machine that builds a node tree.
#[derive(Debug)]
pub struct SceneBuilder {
    /// Open containers, root first. Never empty.
    stack: Vec<Arc<Node>>,
    settings: LayerTreeSettings,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    /// Creates a builder holding only the root container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: vec![Node::container()],
            settings: LayerTreeSettings::default(),
        }
    }

    /// Number of open containers above the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn top(&self) -> &Arc<Node> {
        // The root is pushed in `new` and never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn push(&mut self, kind: NodeKind) -> NodeHandle {
        let node = Node::new(kind);
        self.top().add(node.clone());
        self.stack.push(node.clone());
        NodeHandle(node)
    }

    fn add(&mut self, kind: NodeKind) {
        self.top().add(Node::new(kind));
    }

    /// Opens a transform scope.
    pub fn push_transform(&mut self, transform: Affine) -> NodeHandle {
        self.push(NodeKind::Transform(TransformNode::new(transform)))
    }

    /// Opens a translation scope.
    pub fn push_offset(&mut self, offset: Vec2) -> NodeHandle {
        self.push_transform(Affine::translate(offset))
    }

    /// Opens a rectangular clip scope.
    pub fn push_clip_rect(&mut self, rect: Rect, clip: Clip) -> NodeHandle {
        self.push_clip(Shape::Rect(rect), clip)
    }

    /// Opens a rounded-rectangle clip scope.
    pub fn push_clip_rounded_rect(&mut self, rrect: RoundedRect, clip: Clip) -> NodeHandle {
        self.push_clip(Shape::RoundedRect(rrect), clip)
    }

    /// Opens a path clip scope.
    pub fn push_clip_path(&mut self, path: BezPath, clip: Clip) -> NodeHandle {
        self.push_clip(Shape::Path(path), clip)
    }

    fn push_clip(&mut self, shape: Shape, clip: Clip) -> NodeHandle {
        self.push(NodeKind::ClipShape(ClipShapeNode::new(shape, clip)))
    }

    /// Opens an opacity scope; `offset` translates the children.
    pub fn push_opacity(&mut self, alpha: u8, offset: Vec2) -> NodeHandle {
        self.push(NodeKind::Opacity(OpacityNode::new(alpha, offset)))
    }

    /// Opens a color filter scope.
    pub fn push_color_filter(&mut self, filter: ColorFilter) -> NodeHandle {
        self.push(NodeKind::ColorFilter(ColorFilterNode::new(filter)))
    }

    /// Opens an image filter scope.
    pub fn push_image_filter(&mut self, filter: ImageFilter) -> NodeHandle {
        self.push(NodeKind::ImageFilter(ImageFilterNode::new(filter)))
    }

    /// Opens a scope that filters what is already drawn behind it.
    pub fn push_backdrop_filter(&mut self, filter: ImageFilter) -> NodeHandle {
        self.push(NodeKind::BackdropFilter(BackdropFilterNode::new(filter)))
    }

    /// Opens a shader mask scope.
    pub fn push_shader_mask(&mut self, shader: Shader, mask_rect: Rect, blend_mode: BlendMode) -> NodeHandle {
        self.push(NodeKind::ShaderMask(ShaderMaskNode::new(
            shader, mask_rect, blend_mode,
        )))
    }

    /// Opens an elevated, filled, and clipped surface.
    pub fn push_physical_shape(
        &mut self,
        shape: Shape,
        elevation: f64,
        color: Color,
        shadow_color: Color,
        clip: Clip,
    ) -> NodeHandle {
        self.push(NodeKind::PhysicalShape(PhysicalShapeNode::new(
            color,
            shadow_color,
            elevation,
            shape,
            clip,
        )))
    }

    /// Closes the innermost open scope.
    ///
    /// Popping with no open scope does nothing; the root stays.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            log::debug!("pop with no open scope ignored");
        }
    }

    /// Adds recorded content.
    pub fn add_picture(&mut self, offset: Vec2, picture: Picture, is_complex: bool, will_change: bool) {
        self.add(NodeKind::Picture(PictureNode::new(
            offset,
            picture,
            is_complex,
            will_change,
        )));
    }

    /// Adds a registered texture.
    pub fn add_texture(&mut self, offset: Vec2, size: Size, texture_id: TextureId, freeze: bool) {
        self.add(NodeKind::Texture(TextureNode::new(
            offset, size, texture_id, freeze,
        )));
    }

    /// Adds a platform-native view.
    pub fn add_platform_view(&mut self, offset: Vec2, size: Size, view_id: ViewId) {
        self.add(NodeKind::PlatformView(PlatformViewNode::new(
            offset, size, view_id,
        )));
    }

    /// Adds frame timing graphs in `rect`.
    pub fn add_performance_overlay(&mut self, options: PerformanceOverlayOptions, rect: Rect) {
        self.add(NodeKind::PerformanceOverlay(PerformanceOverlayNode::new(
            options, rect,
        )));
    }

    /// Adds a subtree built by an earlier builder, by reference.
    pub fn add_retained(&mut self, handle: &NodeHandle) {
        self.top().add(handle.0.clone());
    }

    /// Sets the threshold above which the rasterizer traces frames.
    pub fn set_rasterizer_tracing_threshold(&mut self, frame_interval: u32) {
        self.settings.rasterizer_tracing_threshold = frame_interval;
    }

    /// Draws cached raster images with a checkerboard.
    pub fn set_checkerboard_raster_cache_images(&mut self, checkerboard: bool) {
        self.settings.checkerboard_raster_cache_images = checkerboard;
    }

    /// Draws offscreen layers with a checkerboard.
    pub fn set_checkerboard_offscreen_layers(&mut self, checkerboard: bool) {
        self.settings.checkerboard_offscreen_layers = checkerboard;
    }

    /// Finishes building. Open scopes are closed implicitly.
    #[must_use]
    pub fn build(mut self) -> Scene {
        if self.stack.len() > 1 {
            log::debug!("build with {} open scopes", self.stack.len() - 1);
        }
        self.stack.truncate(1);
        let root = self.stack.swap_remove(0);
        Scene {
            root,
            settings: self.settings,
        }
    }
}

/// A finished tree, ready to become a [`LayerTree`].
#[derive(Debug)]
pub struct Scene {
    root: Arc<Node>,
    settings: LayerTreeSettings,
}

impl Scene {
    /// The root container.
    #[must_use]
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Turns the scene into a tree for a frame of `frame_size` physical
    /// pixels.
    #[must_use]
    pub fn into_layer_tree(self, frame_size: Size, device_pixel_ratio: f64) -> LayerTree {
        let settings = LayerTreeSettings {
            device_pixel_ratio,
            ..self.settings
        };
        LayerTree::new(self.root, frame_size, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::PictureRecorder;

    fn picture() -> Picture {
        PictureRecorder::new().finish_with_cull_rect(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn push_nests_and_pop_returns_to_parent() {
        let mut builder = SceneBuilder::new();
        let outer = builder.push_offset(Vec2::new(5.0, 5.0));
        let inner = builder.push_opacity(100, Vec2::ZERO);
        builder.add_picture(Vec2::ZERO, picture(), false, false);
        builder.pop();
        builder.add_picture(Vec2::ZERO, picture(), false, false);
        builder.pop();
        assert_eq!(builder.depth(), 0);

        let scene = builder.build();
        let root_children = scene.root().children();
        assert_eq!(root_children.len(), 1);
        assert_eq!(root_children[0].id(), outer.id());

        let outer_children = outer.node().children();
        assert_eq!(outer_children.len(), 2, "opacity then picture");
        assert_eq!(outer_children[0].id(), inner.id());
        assert_eq!(inner.node().child_count(), 1);
    }

    #[test]
    fn pop_never_removes_the_root() {
        let mut builder = SceneBuilder::new();
        builder.pop();
        builder.pop();
        builder.add_picture(Vec2::ZERO, picture(), false, false);
        let scene = builder.build();
        assert_eq!(scene.root().child_count(), 1);
    }

    #[test]
    fn offset_is_a_translation() {
        let mut builder = SceneBuilder::new();
        let handle = builder.push_offset(Vec2::new(3.0, 4.0));
        match handle.node().kind() {
            NodeKind::Transform(node) => {
                assert_eq!(node.transform, Affine::translate((3.0, 4.0)));
            }
            other => panic!("expected a transform, got {}", other.name()),
        }
    }

    #[test]
    fn retained_subtree_keeps_its_identity() {
        let mut first = SceneBuilder::new();
        let retained = first.push_clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Clip::HardEdge);
        first.add_picture(Vec2::ZERO, picture(), false, false);
        first.pop();
        let first = first.build();

        let mut second = SceneBuilder::new();
        second.add_retained(&retained);
        let second = second.build();

        assert_eq!(first.root().children()[0].id(), second.root().children()[0].id());
        assert!(Arc::ptr_eq(&second.root().children()[0], retained.node()));
    }

    #[test]
    fn settings_reach_the_layer_tree() {
        let mut builder = SceneBuilder::new();
        builder.set_checkerboard_offscreen_layers(true);
        builder.set_rasterizer_tracing_threshold(2);
        let tree = builder.build().into_layer_tree(Size::new(20.0, 10.0), 2.0);
        assert!(tree.settings().checkerboard_offscreen_layers);
        assert!(!tree.settings().checkerboard_raster_cache_images);
        assert_eq!(tree.settings().rasterizer_tracing_threshold, 2);
        assert_eq!(tree.settings().device_pixel_ratio, 2.0);
        assert_eq!(tree.frame_size(), Size::new(20.0, 10.0));
    }

    #[test]
    fn build_closes_open_scopes() {
        let mut builder = SceneBuilder::new();
        builder.push_transform(Affine::scale(2.0));
        builder.push_clip_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Clip::AntiAlias);
        let scene = builder.build();
        assert_eq!(scene.root().child_count(), 1);
    }
}
