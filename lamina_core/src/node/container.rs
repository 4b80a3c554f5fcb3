// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Rect};

use super::{Node, NodeBehavior};
use crate::context::{PaintContext, PrerollContext};
use crate::geometry::{self, EMPTY_RECT};
use crate::system_composite::SystemCompositor;

/// A plain grouping node.
pub(super) struct Container;

impl NodeBehavior for Container {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let bounds = node.preroll_children(context, matrix);
        node.set_paint_bounds(bounds);
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        node.paint_children(context);
    }
}

impl Node {
    /// Prerolls every child in order and returns the union of their bounds.
    ///
    /// Also propagates the children's platform-view and system-composite
    /// flags to this node.
    pub(crate) fn preroll_children(&self, context: &mut PrerollContext<'_>, matrix: Affine) -> Rect {
        let mut bounds = EMPTY_RECT;
        let mut child_has_platform_view = false;
        let mut needs_system_composite = false;
        for child in self.children.read().iter() {
            context.has_platform_view = false;
            child.preroll(context, matrix);
            child_has_platform_view |= context.has_platform_view;
            needs_system_composite |= child.needs_system_composite();
            geometry::join(&mut bounds, &child.paint_bounds());
        }
        context.has_platform_view = child_has_platform_view;
        if needs_system_composite {
            self.set_needs_system_composite(true);
        }
        bounds
    }

    /// Paints children back to front, skipping those with nothing to paint.
    ///
    /// Subtrees a native compositor takes over keep empty bounds, so the
    /// bounds check alone leaves them out.
    pub(crate) fn paint_children(&self, context: &mut PaintContext<'_>) {
        debug_assert!(self.needs_painting(), "needs_painting()");
        for child in self.children.read().iter() {
            if child.needs_painting() {
                child.paint(context);
            }
        }
    }

    /// Describes every system-composited child to `compositor`.
    pub(crate) fn update_scene_children(&self, compositor: &mut dyn SystemCompositor) {
        for child in self.children.read().iter() {
            if child.needs_system_composite() {
                child.update_scene(compositor);
            }
        }
    }
}
