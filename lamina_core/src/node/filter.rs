// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nodes that composite their children through a filter.

use kurbo::Affine;

use super::{Node, NodeBehavior};
use crate::context::{AutoSaveLayer, PaintContext, PrerollContext, PrerollSaveLayerState};
use crate::paint::{ColorFilter, ImageFilter, Paint, SaveLayerRec};

/// Composites children through a color filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorFilterNode {
    /// The filter applied when the layer is composited.
    pub filter: ColorFilter,
}

impl ColorFilterNode {
    /// Creates a color filter node.
    #[must_use]
    pub fn new(filter: ColorFilter) -> Self {
        Self { filter }
    }
}

impl NodeBehavior for ColorFilterNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let mut layer = PrerollSaveLayerState::new(context, true, false);
        let bounds = node.preroll_children(&mut layer, matrix);
        node.set_paint_bounds(bounds);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let paint = Paint {
            color_filter: Some(self.filter.clone()),
            ..Paint::default()
        };
        let rec = SaveLayerRec::new(node.paint_bounds(), Some(paint));
        let mut layer = AutoSaveLayer::new(context, &rec);
        node.paint_children(&mut layer);
    }
}

/// Composites children through an image filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFilterNode {
    /// The filter applied when the layer is composited.
    pub filter: ImageFilter,
}

impl ImageFilterNode {
    /// Creates an image filter node.
    #[must_use]
    pub fn new(filter: ImageFilter) -> Self {
        Self { filter }
    }
}

impl NodeBehavior for ImageFilterNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let mut layer = PrerollSaveLayerState::new(context, true, false);
        let bounds = node.preroll_children(&mut layer, matrix);
        node.set_paint_bounds(bounds);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let paint = Paint {
            image_filter: Some(self.filter.clone()),
            ..Paint::default()
        };
        let rec = SaveLayerRec::new(node.paint_bounds(), Some(paint));
        let mut layer = AutoSaveLayer::new(context, &rec);
        node.paint_children(&mut layer);
    }
}

/// Filters whatever has already been drawn behind its children.
///
/// The layer reads back from the surface, so a frame containing one must be
/// drawn on a surface that supports readback or protected by a save layer.
#[derive(Clone, Debug, PartialEq)]
pub struct BackdropFilterNode {
    /// The filter applied to the backdrop.
    pub filter: ImageFilter,
}

impl BackdropFilterNode {
    /// Creates a backdrop filter node.
    #[must_use]
    pub fn new(filter: ImageFilter) -> Self {
        Self { filter }
    }
}

impl NodeBehavior for BackdropFilterNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let mut layer = PrerollSaveLayerState::new(context, true, true);
        let bounds = node.preroll_children(&mut layer, matrix);
        node.set_paint_bounds(bounds);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let rec = SaveLayerRec {
            bounds: Some(node.paint_bounds()),
            paint: None,
            backdrop: Some(self.filter.clone()),
        };
        let mut layer = AutoSaveLayer::new(context, &rec);
        node.paint_children(&mut layer);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::super::test_support::{Fixture, picture_node};
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::CanvasOp;
    use crate::paint::{BlendMode, Color};

    #[test]
    fn color_filter_layer_carries_the_filter() {
        let fixture = Fixture::new();
        let filter = ColorFilter::Mode {
            color: Color::WHITE,
            blend_mode: BlendMode::SrcIn,
        };
        let node = Node::new(NodeKind::ColorFilter(ColorFilterNode::new(filter.clone())));
        node.add(picture_node(Rect::new(0.0, 0.0, 8.0, 8.0)));
        fixture.preroll(&node);
        assert_eq!(node.paint_bounds(), Rect::new(0.0, 0.0, 8.0, 8.0));

        let ops = fixture.paint(&node);
        match &ops[0] {
            CanvasOp::SaveLayer {
                bounds,
                paint: Some(paint),
                backdrop: None,
            } => {
                assert_eq!(*bounds, Some(Rect::new(0.0, 0.0, 8.0, 8.0)));
                assert_eq!(paint.color_filter, Some(filter));
            }
            other => panic!("expected a filtered layer, got {other:?}"),
        }
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn image_filter_layer_carries_the_filter() {
        let fixture = Fixture::new();
        let filter = ImageFilter::Blur {
            sigma_x: 3.0,
            sigma_y: 1.0,
        };
        let node = Node::new(NodeKind::ImageFilter(ImageFilterNode::new(filter.clone())));
        node.add(picture_node(Rect::new(0.0, 0.0, 8.0, 8.0)));
        fixture.preroll(&node);
        let ops = fixture.paint(&node);
        assert!(
            matches!(&ops[0], CanvasOp::SaveLayer { paint: Some(p), .. } if p.image_filter == Some(filter.clone())),
            "got {:?}",
            ops[0]
        );
    }

    #[test]
    fn backdrop_filter_reads_back() {
        let fixture = Fixture::new();
        let filter = ImageFilter::Blur {
            sigma_x: 5.0,
            sigma_y: 5.0,
        };
        let node = Node::new(NodeKind::BackdropFilter(BackdropFilterNode::new(filter.clone())));
        node.add(picture_node(Rect::new(0.0, 0.0, 8.0, 8.0)));
        let mut context = fixture.preroll_context();
        node.preroll(&mut context, Affine::IDENTITY);
        assert!(context.surface_needs_readback);

        let ops = fixture.paint(&node);
        assert_eq!(
            ops[0],
            CanvasOp::SaveLayer {
                bounds: Some(Rect::new(0.0, 0.0, 8.0, 8.0)),
                paint: None,
                backdrop: Some(filter),
            }
        );
    }
}
