// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug checkerboarding of offscreen layers and cached images.

use kurbo::Rect;

use crate::canvas::Canvas;
use crate::paint::{Color, Paint, PaintStyle, Shader};
use crate::shape::Shape;

const CHECKER_SIZE: f64 = 12.0;
const OUTLINE_WIDTH: f64 = 8.0;
const CHECKER_ALPHA: u8 = 64;

/// Fills `rect` with a translucent checkerboard and outlines it.
///
/// The tint is derived from the rectangle so that the same region keeps its
/// color from frame to frame while neighboring layers are told apart.
pub fn draw_checkerboard(canvas: &mut dyn Canvas, rect: Rect) {
    let tint = tint_for(rect);

    let restore_to = canvas.save();
    canvas.clip_shape(&Shape::Rect(rect), false);
    canvas.draw_paint(&Paint {
        shader: Some(Shader::Checkerboard {
            first: tint.with_alpha(CHECKER_ALPHA),
            second: Color::TRANSPARENT,
            size: CHECKER_SIZE,
        }),
        ..Paint::default()
    });
    canvas.restore_to_count(restore_to);

    canvas.draw_shape(
        &Shape::Rect(rect),
        &Paint {
            style: PaintStyle::Stroke(OUTLINE_WIDTH),
            ..Paint::from_color(tint.with_alpha(0xff))
        },
    );
}

fn tint_for(rect: Rect) -> Color {
    // FNV-1a over the edge bits.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for edge in [rect.x0, rect.y0, rect.x1, rect.y1] {
        for byte in edge.to_bits().to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    #[expect(clippy::cast_possible_truncation, reason = "keeping the low 24 bits")]
    let rgb = (hash & 0x00ff_ffff) as u32;
    Color(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasOp, RecordingCanvas};

    #[test]
    fn checkerboard_is_balanced_and_outlined() {
        let mut canvas = RecordingCanvas::new();
        let rect = Rect::new(0.0, 0.0, 40.0, 40.0);
        draw_checkerboard(&mut canvas, rect);
        assert_eq!(canvas.save_count(), 1);
        match canvas.ops().last() {
            Some(CanvasOp::DrawShape { shape, paint }) => {
                assert_eq!(*shape, Shape::Rect(rect));
                assert_eq!(paint.style, PaintStyle::Stroke(OUTLINE_WIDTH));
                assert!(paint.color.is_opaque(), "outline is drawn opaque");
            }
            other => panic!("expected an outline, got {other:?}"),
        }
    }

    #[test]
    fn tint_is_stable_per_rect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(0.0, 0.0, 10.0, 11.0);
        assert_eq!(tint_for(a), tint_for(a));
        assert_ne!(tint_for(a), tint_for(b));
    }
}
