// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Vec2};

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{
    AutoCanvasRestore, AutoSaveLayer, PaintContext, PrerollContext, PrerollSaveLayerState,
    PrerollScope,
};
use crate::geometry;
use crate::mutators::Mutator;
use crate::paint::{Paint, SaveLayerRec};
use crate::system_composite::SystemCompositor;

/// Composites its children, shifted by an offset, with uniform alpha.
#[derive(Clone, Debug, PartialEq)]
pub struct OpacityNode {
    /// Alpha applied to the whole subtree; 255 is opaque.
    pub alpha: u8,
    /// Translation of the children.
    pub offset: Vec2,
}

impl OpacityNode {
    /// Creates an opacity node.
    #[must_use]
    pub fn new(alpha: u8, offset: Vec2) -> Self {
        Self { alpha, offset }
    }
}

impl NodeBehavior for OpacityNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let offset = Affine::translate(self.offset);
        let child_matrix = matrix * offset;

        let mut scope = PrerollScope::new(context);
        let cull_rect = scope.cull_rect - self.offset;
        scope.cull_rect = cull_rect;
        scope.push_mutator(Mutator::Transform(offset));
        scope.push_mutator(Mutator::Opacity(self.alpha));
        scope.is_opaque = scope.is_opaque && self.alpha == u8::MAX;

        let mut layer = PrerollSaveLayerState::new(&mut scope, true, false);
        let child_bounds = node.preroll_children(&mut layer, child_matrix);
        node.set_paint_bounds(geometry::map_rect(offset, &child_bounds));
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let has_offset = self.offset != Vec2::ZERO;
        let mut restore = AutoCanvasRestore::internal(context, has_offset);
        if has_offset {
            restore
                .internal_nodes_canvas()
                .translate(self.offset.x, self.offset.y);
        }

        // Bounds are in parent space; the layer is opened after the offset.
        let bounds = node.paint_bounds() - self.offset;
        let rec = SaveLayerRec::new(bounds, Some(Paint::from_alpha(self.alpha)));
        let mut layer = AutoSaveLayer::new(&mut restore, &rec);
        node.paint_children(&mut layer);
    }

    fn update_scene(&self, node: &Node, compositor: &mut dyn SystemCompositor) {
        let has_offset = self.offset != Vec2::ZERO;
        if has_offset {
            compositor.push_transform(Affine::translate(self.offset));
        }
        compositor.push_opacity(self.alpha);
        node.update_scene_children(compositor);
        compositor.pop();
        if has_offset {
            compositor.pop();
        }
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
    fn offset_shifts_bounds_and_layer() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Opacity(OpacityNode::new(64, Vec2::new(10.0, 20.0))));
        node.add(picture_node(Rect::new(0.0, 0.0, 10.0, 10.0)));
        fixture.preroll(&node);
        assert_eq!(node.paint_bounds(), Rect::new(10.0, 20.0, 20.0, 30.0));

        let ops = fixture.paint(&node);
        assert_eq!(ops[0], CanvasOp::Save);
        assert_eq!(ops[1], CanvasOp::Concat(Affine::translate((10.0, 20.0))));
        assert_eq!(
            ops[2],
            CanvasOp::SaveLayer {
                bounds: Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
                paint: Some(Paint::from_alpha(64)),
                backdrop: None,
            }
        );
        assert_eq!(&ops[4..], &[CanvasOp::Restore, CanvasOp::Restore]);
    }

    #[test]
    fn context_is_restored_after_preroll() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Opacity(OpacityNode::new(10, Vec2::new(5.0, 5.0))));
        node.add(picture_node(Rect::new(0.0, 0.0, 1.0, 1.0)));

        let mut context = fixture.preroll_context();
        context.cull_rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        node.preroll(&mut context, Affine::IDENTITY);
        assert!(context.is_opaque);
        assert_eq!(context.cull_rect, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(context.mutators_stack.is_empty());
    }

    #[test]
    fn child_readback_is_isolated() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Opacity(OpacityNode::new(10, Vec2::ZERO)));
        node.add(Node::new(NodeKind::BackdropFilter(super::super::BackdropFilterNode::new(
            crate::paint::ImageFilter::Blur {
                sigma_x: 2.0,
                sigma_y: 2.0,
            },
        ))));
        let mut context = fixture.preroll_context();
        node.preroll(&mut context, Affine::IDENTITY);
        assert!(!context.surface_needs_readback);
    }
}
