// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text dumps of node trees.

use std::fmt::Write as _;
use std::sync::Arc;
use std::vec;

use lamina_core::geometry;
use lamina_core::node::Node;

/// Renders `root` and its descendants, one node per line.
///
/// Each line shows the node kind, its id, and the paint bounds from the last
/// Preroll. Nodes handed to a system compositor are marked `[system]`.
///
/// ```text
/// Container #1 bounds=(0, 0)-(20, 20)
///   PhysicalShape #2 bounds=(0, 0)-(20, 20) [system]
///     Picture #3 bounds=(0, 0)-(5, 5)
/// ```
#[must_use]
pub fn dump_tree(root: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, 0, root);
    // Explicit stack so deep trees cannot overflow.
    let mut stack: Vec<(usize, vec::IntoIter<Arc<Node>>)> = vec![(1, root.children().into_iter())];
    while let Some((depth, children)) = stack.last_mut() {
        let depth = *depth;
        match children.next() {
            Some(child) => {
                write_node(&mut out, depth, &child);
                stack.push((depth + 1, child.children().into_iter()));
            }
            None => {
                stack.pop();
            }
        }
    }
    out
}

fn write_node(out: &mut String, depth: usize, node: &Node) {
    let bounds = node.paint_bounds();
    let _ = write!(
        out,
        "{:indent$}{} #{}",
        "",
        node.kind().name(),
        node.id().get(),
        indent = depth * 2
    );
    if geometry::is_empty(&bounds) {
        out.push_str(" bounds=empty");
    } else {
        let _ = write!(
            out,
            " bounds=({}, {})-({}, {})",
            bounds.x0, bounds.y0, bounds.x1, bounds.y1
        );
    }
    if node.needs_system_composite() {
        out.push_str(" [system]");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use kurbo::{Affine, Rect, Size, Vec2};
    use lamina_core::canvas::RecordingCanvas;
    use lamina_core::compositor::CompositorContext;
    use lamina_core::picture::PictureRecorder;
    use lamina_core::scene::SceneBuilder;
    use lamina_core::time::{Duration, Timebase};

    use super::*;

    #[test]
    fn unprerolled_tree_has_empty_bounds() {
        let mut builder = SceneBuilder::new();
        builder.push_offset(Vec2::new(1.0, 1.0));
        let handle = builder.push_opacity(128, Vec2::ZERO);
        let tree = builder.build();

        let dump = dump_tree(tree.root());
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 3, "{dump}");
        assert!(lines[0].starts_with("Container #"), "{dump}");
        assert!(lines[1].starts_with("  Transform #"), "{dump}");
        assert_eq!(
            lines[2],
            format!("    Opacity #{} bounds=empty", handle.id().get())
        );
    }

    #[test]
    fn prerolled_bounds_are_shown() {
        let mut builder = SceneBuilder::new();
        let picture = PictureRecorder::new().finish_with_cull_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        builder.add_picture(Vec2::new(2.0, 0.0), picture, false, false);
        let tree = builder.build().into_layer_tree(Size::new(10.0, 10.0), 1.0);
        let mut compositor = CompositorContext::new(Duration::frame_budget(60, Timebase::NANOS));
        let mut canvas = RecordingCanvas::new();
        {
            let mut frame = compositor.acquire_frame(&mut canvas, Affine::IDENTITY, false);
            tree.preroll(&mut frame, false);
        }

        let dump = dump_tree(tree.root());
        assert!(dump.contains("  Picture #"), "{dump}");
        assert!(dump.contains("bounds=(2, 0)-(7, 5)"), "{dump}");
        assert!(!dump.contains("[system]"), "{dump}");
    }
}
