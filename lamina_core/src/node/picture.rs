// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Vec2};

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{AutoCanvasRestore, PaintContext, PrerollContext};
use crate::picture::Picture;

/// Draws recorded content at an offset.
#[derive(Clone, Debug, PartialEq)]
pub struct PictureNode {
    /// Translation applied to the picture.
    pub offset: Vec2,
    /// The recorded content.
    pub picture: Picture,
    /// Hint that the picture is expensive to draw.
    pub is_complex: bool,
    /// Hint that the picture changes next frame and should not be cached.
    pub will_change: bool,
}

impl PictureNode {
    /// Creates a picture node.
    #[must_use]
    pub fn new(offset: Vec2, picture: Picture, is_complex: bool, will_change: bool) -> Self {
        Self {
            offset,
            picture,
            is_complex,
            will_change,
        }
    }
}

impl NodeBehavior for PictureNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        if let Some(cache) = context.raster_cache.as_deref_mut() {
            let ctm = matrix * Affine::translate(self.offset);
            cache.prepare(&self.picture, ctm, self.is_complex, self.will_change);
        }
        node.set_paint_bounds(self.picture.cull_rect() + self.offset);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let has_offset = self.offset != Vec2::ZERO;
        let mut restore = AutoCanvasRestore::leaf(context, has_offset);
        if has_offset {
            restore
                .leaf_nodes_canvas()
                .translate(self.offset.x, self.offset.y);
        }

        if let Some(cache) = restore.raster_cache {
            let ctm = restore.leaf_nodes_canvas().total_matrix();
            let id = self.picture.id().get();
            if let Some(image) = cache.get(&self.picture, ctm) {
                restore.note_raster_cache(id, true);
                image.draw(restore.leaf_nodes_canvas());
                return;
            }
            restore.note_raster_cache(id, false);
        }
        restore.leaf_nodes_canvas().draw_picture(&self.picture);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::super::test_support::{Fixture, picture};
    use super::super::NodeKind;
    use super::*;
    use crate::canvas::{CanvasOp, NWayCanvas, RecordingCanvas};
    use crate::paint::Paint;
    use crate::picture::PictureOp;
    use crate::raster_cache::{RasterCache, RasterCacheConfig};
    use crate::shape::Shape;

    #[test]
    fn bounds_are_cull_rect_plus_offset() {
        let fixture = Fixture::new();
        let node = Node::new(NodeKind::Picture(PictureNode::new(
            Vec2::new(3.0, 4.0),
            picture(Rect::new(0.0, 0.0, 10.0, 10.0)),
            false,
            false,
        )));
        fixture.preroll(&node);
        assert_eq!(node.paint_bounds(), Rect::new(3.0, 4.0, 13.0, 14.0));

        let ops = fixture.paint(&node);
        assert_eq!(ops[0], CanvasOp::Save);
        assert_eq!(ops[1], CanvasOp::Concat(Affine::translate((3.0, 4.0))));
        assert!(matches!(ops[2], CanvasOp::DrawPicture(_)));
        assert_eq!(ops[3], CanvasOp::Restore);
    }

    #[test]
    fn cached_picture_is_drawn_as_image() {
        let fixture = Fixture::new();
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let ops = (0..8)
            .map(|_| PictureOp::DrawShape {
                shape: Shape::Rect(bounds),
                paint: Paint::default(),
            })
            .collect();
        let node = Node::new(NodeKind::Picture(PictureNode::new(
            Vec2::ZERO,
            Picture::new(bounds, ops),
            false,
            false,
        )));

        let mut cache = RasterCache::new(RasterCacheConfig {
            access_threshold: 1,
            picture_cache_limit_per_frame: 3,
        });
        {
            let mut context = fixture.preroll_context();
            context.raster_cache = Some(&mut cache);
            node.preroll(&mut context, Affine::IDENTITY);
        }
        assert_eq!(cache.image_count(), 1);

        let mut recording = RecordingCanvas::new();
        {
            let mut nway = NWayCanvas::new();
            nway.add_canvas(&mut recording);
            let mut context =
                PaintContext::new(nway, &fixture.textures, &fixture.raster_time, &fixture.ui_time);
            context.raster_cache = Some(&cache);
            node.paint(&mut context);
        }
        assert!(
            recording.ops().iter().any(|op| matches!(op, CanvasOp::DrawImage { .. })),
            "got {:?}",
            recording.ops()
        );
        assert!(
            !recording.ops().iter().any(|op| matches!(op, CanvasOp::DrawPicture(_))),
            "picture not replayed"
        );
        assert_eq!(recording.save_count(), 1);
    }
}
