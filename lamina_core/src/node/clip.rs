// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{
    AutoCanvasRestore, AutoSaveLayer, PaintContext, PrerollContext, PrerollSaveLayerState,
    PrerollScope,
};
use crate::geometry;
use crate::mutators::Mutator;
use crate::paint::SaveLayerRec;
use crate::shape::{Clip, Shape};
use crate::system_composite::SystemCompositor;
use crate::trace::SkipReason;

/// Clips its children to a rectangle, rounded rectangle, oval, or path.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipShapeNode {
    /// The clip region in local coordinates.
    pub shape: Shape,
    /// How the clip edge is rendered.
    pub clip: Clip,
}

impl ClipShapeNode {
    /// Creates a clip node.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `clip` is [`Clip::None`].
    #[must_use]
    pub fn new(shape: Shape, clip: Clip) -> Self {
        debug_assert!(clip != Clip::None, "clip behavior must not be None");
        Self { shape, clip }
    }
}

impl NodeBehavior for ClipShapeNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let clip_bounds = self.shape.bounds();
        let Some(cull) = geometry::intersect(&context.cull_rect, &clip_bounds) else {
            node.set_children_inside_clip(false);
            context.note_skip(node.id(), SkipReason::Culled);
            return;
        };
        node.set_children_inside_clip(true);

        let mut layer = PrerollSaveLayerState::new(context, self.clip.uses_save_layer(), false);
        let mut scope = PrerollScope::new(&mut layer);
        scope.cull_rect = cull;
        scope.push_mutator(Mutator::from(&self.shape));

        let child_bounds = node.preroll_children(&mut scope, matrix);
        if let Some(bounds) = geometry::intersect(&child_bounds, &clip_bounds) {
            node.set_paint_bounds(bounds);
        }
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        if !node.children_inside_clip() {
            return;
        }

        let mut restore = AutoCanvasRestore::internal(context, true);
        restore
            .internal_nodes_canvas()
            .clip_shape(&self.shape, self.clip.is_anti_aliased());

        if self.clip.uses_save_layer() {
            let rec = SaveLayerRec::new(node.paint_bounds(), None);
            let mut layer = AutoSaveLayer::new(&mut restore, &rec);
            node.paint_children(&mut layer);
        } else {
            node.paint_children(&mut restore);
        }
    }

    fn update_scene(&self, node: &Node, compositor: &mut dyn SystemCompositor) {
        compositor.push_clip(self.shape.bounds());
        node.update_scene_children(compositor);
        compositor.pop();
    }
}
