// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers with compositor semantics on top of `kurbo`.
//!
//! `kurbo` treats a zero-area rectangle at the origin as a regular value, so
//! a naive `union` with [`Rect::ZERO`] drags bounds toward `(0, 0)`. Paint
//! bounds instead use "empty" semantics: a rectangle whose left edge is not
//! strictly less than its right edge (or top not less than bottom) covers
//! nothing and is ignored by [`join`].

use kurbo::{Affine, Rect};

/// A rectangle large enough to contain any drawable content.
///
/// Used as the initial cull rect of a frame.
pub const GIANT_RECT: Rect = Rect::new(-1.0e9, -1.0e9, 1.0e9, 1.0e9);

/// The canonical empty rectangle.
pub const EMPTY_RECT: Rect = Rect::ZERO;

/// Returns `true` if `rect` covers no area.
///
/// NaN edges count as empty.
#[inline]
#[must_use]
pub fn is_empty(rect: &Rect) -> bool {
    !(rect.x0 < rect.x1 && rect.y0 < rect.y1)
}

/// Grows `acc` to include `other`.
///
/// An empty `other` leaves `acc` unchanged; an empty `acc` is replaced.
#[inline]
pub fn join(acc: &mut Rect, other: &Rect) {
    if is_empty(other) {
        return;
    }
    if is_empty(acc) {
        *acc = *other;
    } else {
        *acc = acc.union(*other);
    }
}

/// Intersects two rectangles, returning `None` when the result is empty.
#[inline]
#[must_use]
pub fn intersect(a: &Rect, b: &Rect) -> Option<Rect> {
    let r = Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1));
    (!is_empty(&r)).then_some(r)
}

/// Returns `true` if the two rectangles share a non-empty area.
#[inline]
#[must_use]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    intersect(a, b).is_some()
}

/// Maps `rect` through `transform` and returns the axis-aligned bounds.
#[inline]
#[must_use]
pub fn map_rect(transform: Affine, rect: &Rect) -> Rect {
    if is_empty(rect) {
        return EMPTY_RECT;
    }
    transform.transform_rect_bbox(*rect)
}

/// Returns `transform` with its translation removed.
///
/// Cache keys ignore translation so content that only moves keeps its entry.
#[inline]
#[must_use]
pub fn without_translation(transform: Affine) -> Affine {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    Affine::new([a, b, c, d, 0.0, 0.0])
}

/// Horizontal and vertical scale factors of a transform.
#[inline]
#[must_use]
pub fn scale_factors(transform: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    (a.hypot(b), c.hypot(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_detection() {
        assert!(is_empty(&Rect::ZERO));
        assert!(is_empty(&Rect::new(10.0, 0.0, 10.0, 5.0)));
        assert!(is_empty(&Rect::new(0.0, 0.0, f64::NAN, 5.0)));
        assert!(!is_empty(&Rect::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn join_skips_empty_rects() {
        let mut acc = EMPTY_RECT;
        join(&mut acc, &Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(acc, Rect::new(10.0, 10.0, 20.0, 20.0), "empty acc is replaced");
        join(&mut acc, &EMPTY_RECT);
        assert_eq!(acc, Rect::new(10.0, 10.0, 20.0, 20.0), "empty other is ignored");
        join(&mut acc, &Rect::new(30.0, 5.0, 40.0, 15.0));
        assert_eq!(acc, Rect::new(10.0, 5.0, 40.0, 20.0));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(intersect(&a, &b), None, "touching edges share no area");
        assert!(!intersects(&a, &b));
        assert_eq!(
            intersect(&a, &Rect::new(5.0, 5.0, 15.0, 15.0)),
            Some(Rect::new(5.0, 5.0, 10.0, 10.0))
        );
    }

    #[test]
    fn translation_is_stripped() {
        let t = Affine::scale(2.0) * Affine::translate((5.0, 7.0));
        let stripped = without_translation(t);
        assert_eq!(stripped.as_coeffs(), [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn map_rect_of_empty_stays_empty() {
        assert!(is_empty(&map_rect(Affine::translate((50.0, 50.0)), &EMPTY_RECT)));
        let mapped = map_rect(Affine::translate((5.0, 5.0)), &Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(mapped, Rect::new(5.0, 5.0, 15.0, 15.0));
    }
}
