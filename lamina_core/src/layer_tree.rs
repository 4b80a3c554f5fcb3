// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A built scene bound to a frame size, ready for rasterization.

use std::sync::Arc;

use kurbo::{Affine, Point, Rect, RoundedRect, Size};

use crate::compositor::ScopedFrame;
use crate::node::Node;
use crate::paint::Color;
use crate::system_composite::{FrameSpec, SystemCompositor};
use crate::time::Duration;
use crate::trace::PhaseKind;

/// Per-tree rasterization settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTreeSettings {
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f64,
    /// Maximum elevation the frame can show.
    pub frame_physical_depth: f64,
    /// Draw cached raster images with a checkerboard.
    pub checkerboard_raster_cache_images: bool,
    /// Draw offscreen layers with a checkerboard.
    pub checkerboard_offscreen_layers: bool,
    /// Raster times longer than this many frame intervals are reported.
    /// Zero disables reporting.
    pub rasterizer_tracing_threshold: u32,
}

impl Default for LayerTreeSettings {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            frame_physical_depth: f64::MAX,
            checkerboard_raster_cache_images: false,
            checkerboard_offscreen_layers: false,
            rasterizer_tracing_threshold: 0,
        }
    }
}

/// A root node plus everything needed to rasterize it into one frame.
#[derive(Debug)]
pub struct LayerTree {
    root: Arc<Node>,
    frame_size: Size,
    build_time: Duration,
    settings: LayerTreeSettings,
}

impl LayerTree {
    /// Creates a tree for a frame of `frame_size` physical pixels.
    #[must_use]
    pub fn new(root: Arc<Node>, frame_size: Size, settings: LayerTreeSettings) -> Self {
        Self {
            root,
            frame_size,
            build_time: Duration::ZERO,
            settings,
        }
    }

    /// The root container.
    #[must_use]
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Size of the frame in physical pixels.
    #[must_use]
    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    /// Time the UI thread spent building the tree.
    #[must_use]
    pub fn build_time(&self) -> Duration {
        self.build_time
    }

    /// Records the time the UI thread spent building the tree.
    pub fn set_build_time(&mut self, build_time: Duration) {
        self.build_time = build_time;
    }

    /// Rasterization settings.
    #[must_use]
    pub fn settings(&self) -> &LayerTreeSettings {
        &self.settings
    }

    /// Runs the Preroll traversal for `frame`.
    ///
    /// Returns `true` if the root reads back from the surface outside any
    /// save layer. An empty tree is reported and returns `false`.
    pub fn preroll(&self, frame: &mut ScopedFrame<'_>, ignore_raster_cache: bool) -> bool {
        if self.root.child_count() == 0 {
            log::error!("The scene did not specify any layers");
            return false;
        }
        frame.set_checkerboard_raster_cache_images(self.settings.checkerboard_raster_cache_images);
        let matrix = frame.root_surface_transformation();

        frame.phase_begin(PhaseKind::Preroll);
        let (needs_readback, skipped) = {
            let mut context = frame.preroll_context(ignore_raster_cache, &self.settings);
            self.root.preroll(&mut context, matrix);
            debug_assert!(
                context.mutators_stack.is_empty(),
                "mutators left on the stack after preroll"
            );
            (context.surface_needs_readback, context.skipped_nodes())
        };
        frame.phase_end(PhaseKind::Preroll, skipped);
        needs_readback
    }

    /// Runs the Paint traversal for `frame`, using the bounds of the most
    /// recent Preroll.
    pub fn paint(&self, frame: &mut ScopedFrame<'_>, ignore_raster_cache: bool) {
        frame.phase_begin(PhaseKind::Paint);
        let skipped = {
            let mut context = frame.paint_context(ignore_raster_cache, &self.settings);
            if self.root.needs_painting() {
                self.root.paint(&mut context);
            }
            context.skipped_nodes()
        };
        frame.phase_end(PhaseKind::Paint, skipped);
    }

    /// Describes the tree to a native compositor.
    ///
    /// The whole frame becomes one transparent frame scope, scaled back to
    /// logical pixels. System-composited subtrees are translated node by
    /// node; whatever remains is painted into the frame.
    pub fn update_scene(&self, compositor: &mut dyn SystemCompositor) {
        let scale = 1.0 / self.settings.device_pixel_ratio;
        compositor.push_transform(Affine::scale(scale));
        compositor.push_frame(FrameSpec {
            rrect: RoundedRect::from_rect(Rect::from_origin_size(Point::ZERO, self.frame_size), 0.0),
            color: Color::TRANSPARENT,
            elevation: 0.0,
            node: None,
        });
        if self.root.needs_system_composite() {
            self.root.update_scene(compositor);
        }
        if self.root.needs_painting() {
            compositor.add_paint_node(&self.root);
        }
        compositor.pop();
        compositor.pop();
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;
    use crate::canvas::{Canvas, CanvasOp, RecordingCanvas};
    use crate::compositor::CompositorContext;
    use crate::id::NodeId;
    use crate::raster_cache::NodeCacheKey;
    use crate::scene::SceneBuilder;
    use crate::shape::{Clip, Shape};
    use crate::time::{HostTime, Timebase};

    fn clock() -> HostTime {
        HostTime(0)
    }

    fn compositor_context() -> CompositorContext {
        CompositorContext::with_clock(Duration::frame_budget(60, Timebase::NANOS), Timebase::NANOS, clock)
    }

    fn picture(rect: Rect) -> crate::picture::Picture {
        crate::picture::PictureRecorder::new().finish_with_cull_rect(rect)
    }

    #[derive(Default)]
    struct RecordingCompositor {
        transforms: Vec<Affine>,
        retained: Vec<NodeCacheKey>,
        hits: Vec<NodeId>,
        frames: Vec<FrameSpec>,
        painted: Vec<NodeId>,
        depth: usize,
    }

    impl SystemCompositor for RecordingCompositor {
        fn transform(&self) -> Affine {
            self.transforms.iter().fold(Affine::IDENTITY, |acc, t| acc * *t)
        }

        fn has_retained_node(&self, key: &NodeCacheKey) -> bool {
            self.retained.contains(key)
        }

        fn attach_retained_node(&mut self, key: &NodeCacheKey) {
            self.hits.push(key.id());
        }

        fn push_transform(&mut self, transform: Affine) {
            self.transforms.push(transform);
            self.depth += 1;
        }

        fn push_opacity(&mut self, _alpha: u8) {
            self.transforms.push(Affine::IDENTITY);
            self.depth += 1;
        }

        fn push_clip(&mut self, _rect: Rect) {
            self.transforms.push(Affine::IDENTITY);
            self.depth += 1;
        }

        fn push_frame(&mut self, frame: FrameSpec) {
            if let Some(id) = frame.node {
                let key = NodeCacheKey::new(id, self.transform());
                self.retained.push(key);
            }
            self.frames.push(frame);
            self.transforms.push(Affine::IDENTITY);
            self.depth += 1;
        }

        fn add_paint_node(&mut self, node: &Arc<Node>) {
            self.painted.push(node.id());
        }

        fn pop(&mut self) {
            self.transforms.pop();
            self.depth -= 1;
        }
    }

    #[test]
    fn empty_scene_prerolls_to_nothing() {
        let tree = SceneBuilder::new().build().into_layer_tree(Size::new(10.0, 10.0), 1.0);
        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        let mut frame = context.acquire_frame(&mut canvas, Affine::IDENTITY, false);
        assert!(!tree.preroll(&mut frame, false));
        tree.paint(&mut frame, false);
        drop(frame);
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn preroll_applies_root_surface_transformation() {
        let mut builder = SceneBuilder::new();
        let handle = builder.push_clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Clip::HardEdge);
        builder.add_picture(Vec2::ZERO, picture(Rect::new(0.0, 0.0, 4.0, 4.0)), false, false);
        let tree = builder.build().into_layer_tree(Size::new(10.0, 10.0), 1.0);

        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        let mut frame = context.acquire_frame(&mut canvas, Affine::scale(2.0), false);
        assert!(!tree.preroll(&mut frame, false));
        drop(frame);
        assert_eq!(handle.node().paint_bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(tree.root().paint_bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn paint_draws_the_prerolled_tree() {
        let mut builder = SceneBuilder::new();
        builder.push_offset(Vec2::new(1.0, 2.0));
        builder.add_picture(Vec2::ZERO, picture(Rect::new(0.0, 0.0, 4.0, 4.0)), false, false);
        let tree = builder.build().into_layer_tree(Size::new(10.0, 10.0), 1.0);

        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        let mut frame = context.acquire_frame(&mut canvas, Affine::IDENTITY, false);
        tree.preroll(&mut frame, false);
        tree.paint(&mut frame, false);
        drop(frame);
        assert_eq!(
            canvas.ops()[..2],
            [CanvasOp::Save, CanvasOp::Concat(Affine::translate((1.0, 2.0)))]
        );
        assert!(matches!(canvas.ops()[2], CanvasOp::DrawPicture(_)));
        assert_eq!(canvas.save_count(), 1);
    }

    fn elevated_scene(retained: Option<&crate::scene::NodeHandle>) -> (LayerTree, crate::scene::NodeHandle) {
        let mut builder = SceneBuilder::new();
        let handle = match retained {
            Some(handle) => {
                builder.add_retained(handle);
                handle.clone()
            }
            None => {
                let handle = builder.push_physical_shape(
                    Shape::Rect(Rect::new(0.0, 0.0, 20.0, 20.0)),
                    4.0,
                    Color::WHITE,
                    Color::BLACK,
                    Clip::HardEdge,
                );
                builder.add_picture(Vec2::ZERO, picture(Rect::new(0.0, 0.0, 5.0, 5.0)), false, false);
                builder.pop();
                handle
            }
        };
        builder.add_picture(Vec2::ZERO, picture(Rect::new(0.0, 0.0, 8.0, 8.0)), false, false);
        (builder.build().into_layer_tree(Size::new(40.0, 40.0), 2.0), handle)
    }

    fn system_composite(tree: &LayerTree, compositor: &mut RecordingCompositor) {
        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        let mut frame = context
            .acquire_frame(&mut canvas, Affine::IDENTITY, false)
            .with_system_compositor(compositor);
        tree.preroll(&mut frame, false);
        assert!(frame.update_scene(tree), "system compositor attached");
    }

    #[test]
    fn retained_subtree_hits_on_second_frame() {
        let mut compositor = RecordingCompositor::default();

        let (first, handle) = elevated_scene(None);
        system_composite(&first, &mut compositor);
        assert!(handle.node().needs_system_composite());
        assert!(first.root().needs_system_composite(), "flag propagates");
        assert!(compositor.hits.is_empty());
        assert_eq!(compositor.frames.len(), 2, "root frame and the shape");
        assert_eq!(compositor.frames[1].node, Some(handle.id()));
        assert_eq!(compositor.frames[0].rrect.rect(), Rect::new(0.0, 0.0, 40.0, 40.0));
        assert_eq!(compositor.painted.len(), 2, "shape content and the root");
        assert_eq!(compositor.depth, 0);

        let (second, same) = elevated_scene(Some(&handle));
        assert_eq!(same.id(), handle.id());
        system_composite(&second, &mut compositor);
        assert_eq!(compositor.hits, vec![handle.id()]);
        assert_eq!(compositor.frames.len(), 3, "only the root frame is new");
        assert_eq!(compositor.depth, 0);
    }

    #[test]
    fn system_composited_subtree_is_not_painted() {
        let (tree, _) = elevated_scene(None);
        let mut compositor = RecordingCompositor::default();
        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        {
            let mut frame = context
                .acquire_frame(&mut canvas, Affine::IDENTITY, false)
                .with_system_compositor(&mut compositor);
            tree.preroll(&mut frame, false);
            tree.paint(&mut frame, false);
        }
        let pictures = canvas
            .ops()
            .iter()
            .filter(|op| matches!(op, CanvasOp::DrawPicture(_)))
            .count();
        assert_eq!(pictures, 1, "only the flat sibling is drawn");
        assert!(!canvas.ops().iter().any(|op| matches!(op, CanvasOp::DrawShadow { .. })));
    }

    #[test]
    fn flat_sibling_of_elevated_shape_inside_a_clip_is_painted() {
        let mut builder = SceneBuilder::new();
        let clip = builder.push_clip_rect(Rect::new(0.0, 0.0, 40.0, 40.0), Clip::HardEdge);
        builder.push_physical_shape(
            Shape::Rect(Rect::new(0.0, 0.0, 20.0, 20.0)),
            4.0,
            Color::WHITE,
            Color::BLACK,
            Clip::HardEdge,
        );
        builder.pop();
        builder.add_picture(Vec2::ZERO, picture(Rect::new(0.0, 0.0, 8.0, 8.0)), false, false);
        let tree = builder.build().into_layer_tree(Size::new(40.0, 40.0), 1.0);

        let mut compositor = RecordingCompositor::default();
        let mut context = compositor_context();
        let mut canvas = RecordingCanvas::new();
        {
            let mut frame = context
                .acquire_frame(&mut canvas, Affine::IDENTITY, false)
                .with_system_compositor(&mut compositor);
            tree.preroll(&mut frame, false);
            tree.paint(&mut frame, false);
        }
        assert!(clip.node().needs_system_composite(), "flag propagates to the clip");
        assert_eq!(clip.node().paint_bounds(), Rect::new(0.0, 0.0, 8.0, 8.0));
        let pictures = canvas
            .ops()
            .iter()
            .filter(|op| matches!(op, CanvasOp::DrawPicture(_)))
            .count();
        assert_eq!(pictures, 1, "the picture next to the elevated shape is drawn");
        assert_eq!(canvas.save_count(), 1);
    }
}
