// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect, Size, Vec2};

use super::{Node, NodeBehavior};
use crate::context::{PaintContext, PrerollContext};
use crate::embedder::EmbeddedViewParams;
use crate::id::ViewId;
use crate::trace::SkipReason;

/// Marks where a platform-native view is composited.
///
/// Content painted after this node goes to the overlay canvas the embedder
/// assigns to the view.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformViewNode {
    /// Top-left corner of the view.
    pub offset: Vec2,
    /// Size of the view.
    pub size: Size,
    /// The embedder's identifier for the view.
    pub view_id: ViewId,
}

impl PlatformViewNode {
    /// Creates a platform view node.
    #[must_use]
    pub fn new(offset: Vec2, size: Size, view_id: ViewId) -> Self {
        Self {
            offset,
            size,
            view_id,
        }
    }
}

impl NodeBehavior for PlatformViewNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        node.set_paint_bounds(Rect::from_origin_size(self.offset.to_point(), self.size));

        let Some(embedder) = context.view_embedder.as_deref_mut() else {
            log::error!(
                "{:?} is in the tree but no view embedder is available",
                self.view_id
            );
            context.note_skip(node.id(), SkipReason::NoEmbedder);
            return;
        };
        let params = EmbeddedViewParams {
            matrix: matrix * Affine::translate(self.offset),
            size: self.size,
            mutators: context.mutators_stack.clone(),
        };
        embedder.preroll_composite_embedded_view(self.view_id, params);
        context.has_platform_view = true;
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let Some(embedder) = context.view_embedder.as_deref_mut() else {
            context.note_skip(node.id(), SkipReason::NoEmbedder);
            return;
        };
        // Overlay canvases follow the root canvas in the fan-out.
        if let Some(overlay) = embedder.composite_embedded_view(self.view_id) {
            context.set_leaf_index(overlay + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Fixture, picture_node};
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::{NWayCanvas, RecordingCanvas};
    use crate::embedder::ExternalViewEmbedder;
    use crate::mutators::Mutator;

    #[derive(Default)]
    struct RecordingEmbedder {
        prerolled: Vec<(ViewId, EmbeddedViewParams)>,
        composited: Vec<ViewId>,
    }

    impl ExternalViewEmbedder for RecordingEmbedder {
        fn preroll_composite_embedded_view(&mut self, view_id: ViewId, params: EmbeddedViewParams) {
            self.prerolled.push((view_id, params));
        }

        fn composite_embedded_view(&mut self, view_id: ViewId) -> Option<usize> {
            self.composited.push(view_id);
            Some(0)
        }
    }

    #[test]
    fn preroll_records_params_with_mutators() {
        let fixture = Fixture::new();
        let root = Node::new(NodeKind::Opacity(super::super::OpacityNode::new(
            128,
            Vec2::new(10.0, 0.0),
        )));
        let view = Node::new(NodeKind::PlatformView(PlatformViewNode::new(
            Vec2::new(1.0, 2.0),
            Size::new(30.0, 40.0),
            ViewId(5),
        )));
        root.add(view.clone());

        let mut embedder = RecordingEmbedder::default();
        let has_platform_view = {
            let mut context = fixture.preroll_context();
            context.view_embedder = Some(&mut embedder);
            root.preroll(&mut context, Affine::IDENTITY);
            context.has_platform_view
        };
        assert!(has_platform_view, "flag propagates to the parent");
        assert_eq!(view.paint_bounds(), Rect::new(1.0, 2.0, 31.0, 42.0));

        let (id, params) = &embedder.prerolled[0];
        assert_eq!(*id, ViewId(5));
        assert_eq!(params.matrix, Affine::translate((11.0, 2.0)));
        assert_eq!(params.size, Size::new(30.0, 40.0));
        let mutators: Vec<_> = params.mutators.iter().cloned().collect();
        assert_eq!(
            mutators,
            vec![
                Mutator::Transform(Affine::translate((10.0, 0.0))),
                Mutator::Opacity(128),
            ]
        );
    }

    #[test]
    fn missing_embedder_does_nothing() {
        let fixture = Fixture::new();
        let view = Node::new(NodeKind::PlatformView(PlatformViewNode::new(
            Vec2::ZERO,
            Size::new(10.0, 10.0),
            ViewId(1),
        )));
        let mut context = fixture.preroll_context();
        view.preroll(&mut context, Affine::IDENTITY);
        assert!(!context.has_platform_view);
        assert!(view.needs_painting());
    }

    #[test]
    fn content_after_view_goes_to_overlay() {
        let fixture = Fixture::new();
        let root = Node::container();
        root.add(Node::new(NodeKind::PlatformView(PlatformViewNode::new(
            Vec2::ZERO,
            Size::new(10.0, 10.0),
            ViewId(2),
        ))));
        root.add(picture_node(Rect::new(0.0, 0.0, 5.0, 5.0)));

        let mut embedder = RecordingEmbedder::default();
        {
            let mut context = fixture.preroll_context();
            context.view_embedder = Some(&mut embedder);
            root.preroll(&mut context, Affine::IDENTITY);
        }

        let mut base = RecordingCanvas::new();
        let mut overlay = RecordingCanvas::new();
        {
            let mut nway = NWayCanvas::new();
            nway.add_canvas(&mut base);
            nway.add_canvas(&mut overlay);
            let mut context =
                PaintContext::new(nway, &fixture.textures, &fixture.raster_time, &fixture.ui_time);
            context.view_embedder = Some(&mut embedder);
            root.paint(&mut context);
            assert_eq!(context.leaf_index(), 1);
        }
        assert!(base.ops().is_empty(), "got {:?}", base.ops());
        assert_eq!(overlay.ops().len(), 1);
        assert_eq!(embedder.composited, vec![ViewId(2)]);
    }
}
