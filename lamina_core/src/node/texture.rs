// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect, Size, Vec2};

use super::{Node, NodeBehavior};
use crate::context::{PaintContext, PrerollContext};
use crate::id::TextureId;
use crate::trace::SkipReason;

/// Draws the current frame of a registered texture.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureNode {
    /// Top-left corner of the destination.
    pub offset: Vec2,
    /// Size of the destination.
    pub size: Size,
    /// Registry key of the texture.
    pub texture_id: TextureId,
    /// Keep showing the last drawn frame.
    pub freeze: bool,
}

impl TextureNode {
    /// Creates a texture node.
    #[must_use]
    pub fn new(offset: Vec2, size: Size, texture_id: TextureId, freeze: bool) -> Self {
        Self {
            offset,
            size,
            texture_id,
            freeze,
        }
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.offset.to_point(), self.size)
    }
}

impl NodeBehavior for TextureNode {
    fn preroll(&self, node: &Node, _context: &mut PrerollContext<'_>, _matrix: Affine) {
        node.set_paint_bounds(self.bounds());
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let registry = context.texture_registry;
        let Some(texture) = registry.get(self.texture_id) else {
            context.note_skip(node.id(), SkipReason::MissingTexture);
            return;
        };
        texture.paint(context.leaf_nodes_canvas(), self.bounds(), self.freeze);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::super::NodeKind;
    use super::*;
    use crate::canvas::{Canvas, NWayCanvas, RecordingCanvas};
    use crate::instrumentation::Stopwatch;
    use crate::texture::{Texture, TextureRegistry};
    use crate::time::{Duration, Timebase};

    struct FrameTexture {
        painted: Mutex<Vec<(Rect, bool)>>,
    }

    impl Texture for FrameTexture {
        fn id(&self) -> TextureId {
            TextureId(3)
        }

        fn paint(&self, _canvas: &mut dyn Canvas, bounds: Rect, freeze: bool) {
            self.painted.lock().push((bounds, freeze));
        }
    }

    fn paint_with(registry: &TextureRegistry, node: &Node) -> RecordingCanvas {
        let stopwatch = Stopwatch::new(Duration::frame_budget(60, Timebase::NANOS), Timebase::NANOS);
        let mut recording = RecordingCanvas::new();
        {
            let mut nway = NWayCanvas::new();
            nway.add_canvas(&mut recording);
            let mut context = PaintContext::new(nway, registry, &stopwatch, &stopwatch);
            node.paint(&mut context);
        }
        recording
    }

    #[test]
    fn paints_registered_texture_into_bounds() {
        let texture = Arc::new(FrameTexture {
            painted: Mutex::new(Vec::new()),
        });
        let mut registry = TextureRegistry::new();
        registry.register(texture.clone());

        let node = Node::new(NodeKind::Texture(TextureNode::new(
            Vec2::new(2.0, 3.0),
            Size::new(40.0, 30.0),
            TextureId(3),
            true,
        )));
        node.set_paint_bounds(Rect::new(2.0, 3.0, 42.0, 33.0));
        paint_with(&registry, &node);
        assert_eq!(
            texture.painted.lock().as_slice(),
            &[(Rect::new(2.0, 3.0, 42.0, 33.0), true)]
        );
    }

    #[test]
    fn missing_texture_is_skipped() {
        let registry = TextureRegistry::new();
        let node = Node::new(NodeKind::Texture(TextureNode::new(
            Vec2::ZERO,
            Size::new(4.0, 4.0),
            TextureId(99),
            false,
        )));
        node.set_paint_bounds(Rect::new(0.0, 0.0, 4.0, 4.0));
        let recording = paint_with(&registry, &node);
        assert!(recording.ops().is_empty());
    }
}
