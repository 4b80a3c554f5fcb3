// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene nodes and their two-phase contract.
//!
//! A *node* is an element of the tree a frame is drawn from. Every node has:
//!
//! - An identity ([`NodeId`]) assigned at construction. It stays the same
//!   for as long as the node lives, including when the node is retained into
//!   later scenes, so caches key on it.
//! - A [`NodeKind`], one of a closed set of clip, transform, effect, and leaf
//!   variants. Container kinds hold an ordered list of children, painted
//!   back to front.
//! - **Per-frame state** computed by [`preroll`](Node::preroll): the paint
//!   bounds in the parent's coordinate space and whether a native compositor
//!   takes over the subtree.
//!
//! # Phases
//!
//! **Preroll** walks the tree top-down once per frame. Each node resets its
//! state, pushes whatever it changes for its subtree (cull rect, mutators,
//! opacity) through scope guards, visits its children, and records its
//! bounds.
//!
//! **Paint** walks the tree again and issues canvas operations. It relies on
//! the bounds from the most recent Preroll; a node with empty bounds is never
//! painted.
//!
//! Nodes are shared by `Arc` and may appear in successive trees. They are
//! `Send + Sync`, but a single node must not be traversed by two frames at
//! once.

use core::fmt;
use std::sync::Arc;

use kurbo::{Affine, Rect};
use parking_lot::{Mutex, RwLock};

use crate::context::{PaintContext, PrerollContext};
use crate::geometry::{self, EMPTY_RECT};
use crate::id::NodeId;
use crate::system_composite::SystemCompositor;

mod clip;
mod container;
mod filter;
mod opacity;
mod performance_overlay;
mod physical_shape;
mod picture;
mod platform_view;
mod shader_mask;
mod texture;
mod transform;

pub use clip::ClipShapeNode;
pub use filter::{BackdropFilterNode, ColorFilterNode, ImageFilterNode};
pub use opacity::OpacityNode;
pub use performance_overlay::{
    PerformanceOverlayNode, PerformanceOverlayOptions, make_statistics_text,
};
pub use physical_shape::{
    LIGHT_HEIGHT, LIGHT_RADIUS, PhysicalShapeNode, compute_tonal_colors, draw_shadow,
    shadow_bounds,
};
pub use picture::PictureNode;
pub use platform_view::PlatformViewNode;
pub use shader_mask::ShaderMaskNode;
pub use texture::TextureNode;
pub use transform::TransformNode;

/// The closed set of node variants.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Groups children without changing them.
    Container,
    /// Clips children to a shape.
    ClipShape(ClipShapeNode),
    /// Transforms children.
    Transform(TransformNode),
    /// Composites children with uniform alpha.
    Opacity(OpacityNode),
    /// Composites children through a color filter.
    ColorFilter(ColorFilterNode),
    /// Composites children through an image filter.
    ImageFilter(ImageFilterNode),
    /// Filters the content behind the children.
    BackdropFilter(BackdropFilterNode),
    /// Masks children with a shader.
    ShaderMask(ShaderMaskNode),
    /// An elevated, filled, clipping shape that casts a shadow.
    PhysicalShape(PhysicalShapeNode),
    /// Recorded drawing content.
    Picture(PictureNode),
    /// A frame of an external texture.
    Texture(TextureNode),
    /// A platform-native view.
    PlatformView(PlatformViewNode),
    /// Frame timing graphs.
    PerformanceOverlay(PerformanceOverlayNode),
}

impl NodeKind {
    /// Short name of the variant.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Container => "Container",
            Self::ClipShape(_) => "ClipShape",
            Self::Transform(_) => "Transform",
            Self::Opacity(_) => "Opacity",
            Self::ColorFilter(_) => "ColorFilter",
            Self::ImageFilter(_) => "ImageFilter",
            Self::BackdropFilter(_) => "BackdropFilter",
            Self::ShaderMask(_) => "ShaderMask",
            Self::PhysicalShape(_) => "PhysicalShape",
            Self::Picture(_) => "Picture",
            Self::Texture(_) => "Texture",
            Self::PlatformView(_) => "PlatformView",
            Self::PerformanceOverlay(_) => "PerformanceOverlay",
        }
    }

    /// Returns `true` if the variant can have children.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        !matches!(
            self,
            Self::Picture(_) | Self::Texture(_) | Self::PlatformView(_) | Self::PerformanceOverlay(_)
        )
    }

    fn behavior(&self) -> &dyn NodeBehavior {
        match self {
            Self::Container => &container::Container,
            Self::ClipShape(n) => n,
            Self::Transform(n) => n,
            Self::Opacity(n) => n,
            Self::ColorFilter(n) => n,
            Self::ImageFilter(n) => n,
            Self::BackdropFilter(n) => n,
            Self::ShaderMask(n) => n,
            Self::PhysicalShape(n) => n,
            Self::Picture(n) => n,
            Self::Texture(n) => n,
            Self::PlatformView(n) => n,
            Self::PerformanceOverlay(n) => n,
        }
    }
}

/// Per-variant phase implementations.
trait NodeBehavior {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine);

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>);

    fn update_scene(&self, node: &Node, compositor: &mut dyn SystemCompositor) {
        node.update_scene_children(compositor);
    }
}

#[derive(Clone, Copy, Debug)]
struct NodeState {
    paint_bounds: Rect,
    needs_system_composite: bool,
    children_inside_clip: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            paint_bounds: EMPTY_RECT,
            needs_system_composite: false,
            children_inside_clip: false,
        }
    }
}

/// An element of a scene tree.
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    children: RwLock<Vec<Arc<Self>>>,
    state: Mutex<NodeState>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.state.lock();
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind.name())
            .field("children", &self.children.read().len())
            .field("paint_bounds", &state.paint_bounds)
            .field("needs_system_composite", &state.needs_system_composite)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Creates a node with a fresh id and no children.
    #[must_use]
    pub fn new(kind: NodeKind) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::next(),
            kind,
            children: RwLock::new(Vec::new()),
            state: Mutex::new(NodeState::default()),
        })
    }

    /// Creates an empty container node.
    #[must_use]
    pub fn container() -> Arc<Self> {
        Self::new(NodeKind::Container)
    }

    /// The node's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's variant and its parameters.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Appends `child` as the last (topmost) child.
    ///
    /// Children must be added before the tree is handed to the rasterizer.
    /// The caller is responsible for keeping the tree acyclic.
    ///
    /// # Panics
    ///
    /// Panics if this node is a leaf variant.
    pub fn add(&self, child: Arc<Self>) {
        assert!(
            self.kind.is_container(),
            "cannot add children to a {} node",
            self.kind.name()
        );
        self.children.write().push(child);
    }

    /// Snapshot of the children in paint order.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        self.children.read().clone()
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Bounds computed by the most recent Preroll, in the parent's space.
    #[must_use]
    pub fn paint_bounds(&self) -> Rect {
        self.state.lock().paint_bounds
    }

    /// Returns `true` if the most recent Preroll produced non-empty bounds.
    #[must_use]
    pub fn needs_painting(&self) -> bool {
        !geometry::is_empty(&self.paint_bounds())
    }

    /// Returns `true` if a native compositor renders this subtree.
    #[must_use]
    pub fn needs_system_composite(&self) -> bool {
        self.state.lock().needs_system_composite
    }

    /// Computes this node's bounds and compositing requirements.
    ///
    /// `matrix` maps the node's parent space to the surface. The context is
    /// left as it was found.
    pub fn preroll(&self, context: &mut PrerollContext<'_>, matrix: Affine) {
        *self.state.lock() = NodeState::default();
        self.kind.behavior().preroll(self, context, matrix);
    }

    /// Issues this node's drawing operations.
    ///
    /// Every save made on a canvas is restored before this returns.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the node has nothing to paint.
    pub fn paint(&self, context: &mut PaintContext<'_>) {
        debug_assert!(self.needs_painting(), "needs_painting()");
        self.kind.behavior().paint(self, context);
    }

    /// Describes this system-composited subtree to `compositor`.
    pub fn update_scene(&self, compositor: &mut dyn SystemCompositor) {
        debug_assert!(
            self.needs_system_composite(),
            "update_scene on a node that is not system-composited"
        );
        self.kind.behavior().update_scene(self, compositor);
    }

    pub(crate) fn set_paint_bounds(&self, bounds: Rect) {
        self.state.lock().paint_bounds = bounds;
    }

    pub(crate) fn set_needs_system_composite(&self, value: bool) {
        self.state.lock().needs_system_composite = value;
    }

    pub(crate) fn children_inside_clip(&self) -> bool {
        self.state.lock().children_inside_clip
    }

    pub(crate) fn set_children_inside_clip(&self, value: bool) {
        self.state.lock().children_inside_clip = value;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the node tests.

    use std::sync::Arc;

    use kurbo::{Affine, Rect};

    use crate::canvas::{Canvas, CanvasOp, NWayCanvas, RecordingCanvas};
    use crate::context::{PaintContext, PrerollContext};
    use crate::instrumentation::Stopwatch;
    use crate::paint::{Color, Paint};
    use crate::picture::{Picture, PictureRecorder};
    use crate::shape::Shape;
    use crate::texture::TextureRegistry;
    use crate::time::{Duration, Timebase};

    use super::Node;

    pub(crate) struct Fixture {
        pub(crate) raster_time: Stopwatch,
        pub(crate) ui_time: Stopwatch,
        pub(crate) textures: TextureRegistry,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let budget = Duration::frame_budget(60, Timebase::NANOS);
            Self {
                raster_time: Stopwatch::new(budget, Timebase::NANOS),
                ui_time: Stopwatch::new(budget, Timebase::NANOS),
                textures: TextureRegistry::new(),
            }
        }

        pub(crate) fn preroll_context(&self) -> PrerollContext<'_> {
            PrerollContext::new(&self.raster_time, &self.ui_time, &self.textures)
        }

        pub(crate) fn preroll(&self, root: &Node) {
            let mut context = self.preroll_context();
            root.preroll(&mut context, Affine::IDENTITY);
            assert_eq!(context.mutators_stack.len(), 0, "mutators left on the stack");
        }

        /// Paints `root` onto a fresh recording canvas and returns the ops.
        pub(crate) fn paint(&self, root: &Node) -> Vec<CanvasOp> {
            let mut canvas = RecordingCanvas::new();
            {
                let mut nway = NWayCanvas::new();
                nway.add_canvas(&mut canvas);
                let mut context = PaintContext::new(nway, &self.textures, &self.raster_time, &self.ui_time);
                root.paint(&mut context);
            }
            assert_eq!(canvas.save_count(), 1, "unbalanced save/restore");
            canvas.into_ops()
        }
    }

    pub(crate) fn picture(rect: Rect) -> Picture {
        let mut recorder = PictureRecorder::new();
        recorder.draw_shape(Shape::Rect(rect), Paint::from_color(Color::WHITE));
        recorder.finish()
    }

    pub(crate) fn picture_node(rect: Rect) -> Arc<Node> {
        Node::new(super::NodeKind::Picture(super::PictureNode::new(
            kurbo::Vec2::ZERO,
            picture(rect),
            false,
            false,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Fixture, picture_node};
    use super::*;
    use crate::canvas::CanvasOp;
    use crate::paint::Paint;
    use crate::shape::{Clip, Shape};
    use kurbo::Vec2;

    #[test]
    fn ids_are_unique_and_stable() {
        let a = Node::container();
        let b = Node::container();
        assert_ne!(a.id(), b.id());
        let retained = Arc::clone(&a);
        assert_eq!(retained.id(), a.id());
    }

    #[test]
    #[should_panic(expected = "cannot add children to a Picture node")]
    fn adding_to_leaf_panics() {
        let leaf = picture_node(Rect::new(0.0, 0.0, 1.0, 1.0));
        leaf.add(Node::container());
    }

    #[test]
    fn preroll_resets_previous_state() {
        let fixture = Fixture::new();
        let root = Node::container();
        root.set_paint_bounds(Rect::new(0.0, 0.0, 5.0, 5.0));
        root.set_needs_system_composite(true);
        fixture.preroll(&root);
        assert!(!root.needs_painting(), "empty container has no bounds");
        assert!(!root.needs_system_composite());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "needs_painting()")]
    fn painting_without_bounds_panics_in_debug() {
        let fixture = Fixture::new();
        let root = Node::container();
        fixture.preroll(&root);
        fixture.paint(&root);
    }

    #[test]
    fn end_to_end_clip_opacity_picture() {
        let fixture = Fixture::new();
        let root = Node::container();
        let clip = Node::new(NodeKind::ClipShape(ClipShapeNode::new(
            Shape::Rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Clip::AntiAlias,
        )));
        let opacity = Node::new(NodeKind::Opacity(OpacityNode::new(128, Vec2::ZERO)));
        let picture = picture_node(Rect::new(10.0, 10.0, 50.0, 50.0));
        opacity.add(Arc::clone(&picture));
        clip.add(Arc::clone(&opacity));
        root.add(Arc::clone(&clip));

        fixture.preroll(&root);
        let expected = Rect::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(clip.paint_bounds(), expected);
        assert_eq!(opacity.paint_bounds(), expected);
        assert_eq!(root.paint_bounds(), expected);

        let ops = fixture.paint(&root);
        let picture_id = match picture.kind() {
            NodeKind::Picture(p) => p.picture.id(),
            _ => unreachable!("constructed as a picture"),
        };
        assert_eq!(
            ops,
            vec![
                CanvasOp::Save,
                CanvasOp::ClipShape {
                    shape: Shape::Rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
                    anti_alias: true,
                },
                CanvasOp::SaveLayer {
                    bounds: Some(expected),
                    paint: Some(Paint::from_alpha(128)),
                    backdrop: None,
                },
                CanvasOp::DrawPicture(picture_id),
                CanvasOp::Restore,
                CanvasOp::Restore,
            ]
        );
    }
}
