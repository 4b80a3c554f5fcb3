// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect};

use super::{Node, NodeBehavior};
use crate::context::{AutoCanvasRestore, AutoSaveLayer, PaintContext, PrerollContext, PrerollSaveLayerState};
use crate::paint::{BlendMode, Paint, SaveLayerRec, Shader};
use crate::shape::Shape;

/// Masks its children with a shader drawn over them.
///
/// The children are drawn into a layer, then the shader is blended over
/// `mask_rect` with `blend_mode` before the layer is composited.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderMaskNode {
    /// Source of the mask.
    pub shader: Shader,
    /// Region the mask covers, in local coordinates.
    pub mask_rect: Rect,
    /// How the mask combines with the children.
    pub blend_mode: BlendMode,
}

impl ShaderMaskNode {
    /// Creates a shader mask node.
    #[must_use]
    pub fn new(shader: Shader, mask_rect: Rect, blend_mode: BlendMode) -> Self {
        Self {
            shader,
            mask_rect,
            blend_mode,
        }
    }
}

impl NodeBehavior for ShaderMaskNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let mut layer = PrerollSaveLayerState::new(context, true, false);
        let bounds = node.preroll_children(&mut layer, matrix);
        node.set_paint_bounds(bounds);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let rec = SaveLayerRec::new(node.paint_bounds(), None);
        let mut layer = AutoSaveLayer::new(context, &rec);
        node.paint_children(&mut layer);

        // The shader is defined relative to the mask's origin.
        let paint = Paint {
            blend_mode: self.blend_mode,
            shader: Some(self.shader.clone()),
            ..Paint::default()
        };
        let mut restore = AutoCanvasRestore::leaf(&mut layer, true);
        let canvas = restore.leaf_nodes_canvas();
        canvas.translate(self.mask_rect.x0, self.mask_rect.y0);
        let mask = Rect::from_origin_size((0.0, 0.0), self.mask_rect.size());
        canvas.draw_shape(&Shape::Rect(mask), &paint);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::super::test_support::{Fixture, picture_node};
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::CanvasOp;
    use crate::paint::Color;

    #[test]
    fn mask_is_drawn_inside_the_layer() {
        let fixture = Fixture::new();
        let shader = Shader::LinearGradient {
            start: Point::ZERO,
            end: Point::new(0.0, 10.0),
            colors: vec![Color::WHITE, Color::TRANSPARENT],
            stops: None,
        };
        let node = Node::new(NodeKind::ShaderMask(ShaderMaskNode::new(
            shader.clone(),
            Rect::new(5.0, 5.0, 25.0, 15.0),
            BlendMode::DstIn,
        )));
        node.add(picture_node(Rect::new(0.0, 0.0, 30.0, 30.0)));
        fixture.preroll(&node);

        let ops = fixture.paint(&node);
        assert!(matches!(ops[0], CanvasOp::SaveLayer { paint: None, .. }));
        assert!(matches!(ops[1], CanvasOp::DrawPicture(_)));
        assert_eq!(ops[2], CanvasOp::Save);
        assert_eq!(ops[3], CanvasOp::Concat(Affine::translate((5.0, 5.0))));
        match &ops[4] {
            CanvasOp::DrawShape { shape, paint } => {
                assert_eq!(*shape, Shape::Rect(Rect::new(0.0, 0.0, 20.0, 10.0)));
                assert_eq!(paint.shader, Some(shader));
                assert_eq!(paint.blend_mode, BlendMode::DstIn);
            }
            other => panic!("expected the mask, got {other:?}"),
        }
        assert_eq!(&ops[5..], &[CanvasOp::Restore, CanvasOp::Restore]);
    }
}
