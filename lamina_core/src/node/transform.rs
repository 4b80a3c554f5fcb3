// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{AutoCanvasRestore, PaintContext, PrerollContext, PrerollScope};
use crate::geometry::{self, GIANT_RECT};
use crate::mutators::Mutator;
use crate::system_composite::SystemCompositor;

/// Applies an affine transform to its children.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformNode {
    /// Maps child space to this node's parent space.
    pub transform: Affine,
}

impl TransformNode {
    /// Creates a transform node.
    #[must_use]
    pub fn new(transform: Affine) -> Self {
        Self { transform }
    }
}

impl NodeBehavior for TransformNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let child_matrix = matrix * self.transform;

        let mut scope = PrerollScope::new(context);
        scope.push_mutator(Mutator::Transform(self.transform));
        // A singular transform collapses its children to a line or point;
        // nothing can be culled in their space.
        let det = self.transform.determinant();
        let cull_rect = if det == 0.0 || !det.is_finite() {
            GIANT_RECT
        } else {
            geometry::map_rect(self.transform.inverse(), &scope.cull_rect)
        };
        scope.cull_rect = cull_rect;

        let child_bounds = node.preroll_children(&mut scope, child_matrix);
        node.set_paint_bounds(geometry::map_rect(self.transform, &child_bounds));
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let mut restore = AutoCanvasRestore::internal(context, true);
        restore.internal_nodes_canvas().concat(self.transform);
        node.paint_children(&mut restore);
    }

    fn update_scene(&self, node: &Node, compositor: &mut dyn SystemCompositor) {
        compositor.push_transform(self.transform);
        node.update_scene_children(compositor);
        compositor.pop();
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::super::test_support::{Fixture, picture_node};
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::CanvasOp;

    #[test]
    fn bounds_are_mapped_to_parent_space() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Transform(TransformNode::new(
            Affine::translate((5.0, 0.0)) * Affine::scale(2.0),
        )));
        node.add(picture_node(Rect::new(0.0, 0.0, 10.0, 10.0)));
        fixture.preroll(&node);
        assert_eq!(node.paint_bounds(), Rect::new(5.0, 0.0, 25.0, 20.0));

        let ops = fixture.paint(&node);
        assert_eq!(ops[0], CanvasOp::Save);
        assert!(matches!(ops[1], CanvasOp::Concat(_)));
        assert_eq!(ops.last(), Some(&CanvasOp::Restore));
    }

    #[test]
    fn cull_rect_is_mapped_into_child_space() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Transform(TransformNode::new(Affine::scale(2.0))));
        let clip = Node::new(NodeKind::ClipShape(super::super::ClipShapeNode::new(
            crate::shape::Shape::Rect(Rect::new(60.0, 60.0, 80.0, 80.0)),
            crate::shape::Clip::HardEdge,
        )));
        clip.add(picture_node(Rect::new(60.0, 60.0, 70.0, 70.0)));
        node.add(clip.clone());

        let mut context = fixture.preroll_context();
        context.cull_rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        node.preroll(&mut context, Affine::IDENTITY);
        assert!(!clip.needs_painting(), "clip lies outside the scaled cull rect");
        assert_eq!(context.cull_rect, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn singular_transform_does_not_cull() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Transform(TransformNode::new(Affine::scale_non_uniform(
            0.0, 1.0,
        ))));
        let clip = Node::new(NodeKind::ClipShape(super::super::ClipShapeNode::new(
            crate::shape::Shape::Rect(Rect::new(500.0, 500.0, 510.0, 510.0)),
            crate::shape::Clip::HardEdge,
        )));
        clip.add(picture_node(Rect::new(500.0, 500.0, 510.0, 510.0)));
        node.add(clip.clone());
        let mut context = fixture.preroll_context();
        context.cull_rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        node.preroll(&mut context, Affine::IDENTITY);
        assert!(clip.needs_painting());
        assert!(!node.needs_painting(), "collapsed to zero width");
    }
}
