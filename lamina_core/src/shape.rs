// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shapes used for clipping, filling, and casting shadows.

use kurbo::{BezPath, Rect, RoundedRect, Shape as _};

/// A closed region in local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// An axis-aligned ellipse inscribed in the given rectangle.
    Oval(Rect),
    /// An arbitrary path.
    Path(BezPath),
}

impl Shape {
    /// Returns the axis-aligned bounding rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(r) | Self::Oval(r) => *r,
            Self::RoundedRect(rr) => rr.rect(),
            Self::Path(path) => path.bounding_box(),
        }
    }

    /// Returns the rounded rectangle used to frame this shape on a native
    /// compositor.
    ///
    /// Rectangles, rounded rectangles, and ovals map exactly (an oval becomes
    /// a rounded rectangle whose radius is half its shorter side). Arbitrary
    /// paths fall back to their bounding rectangle with square corners.
    #[must_use]
    pub fn frame_rounded_rect(&self) -> RoundedRect {
        match self {
            Self::Rect(r) => RoundedRect::from_rect(*r, 0.0),
            Self::RoundedRect(rr) => *rr,
            Self::Oval(r) => RoundedRect::from_rect(*r, r.width().min(r.height()) / 2.0),
            Self::Path(path) => RoundedRect::from_rect(path.bounding_box(), 0.0),
        }
    }

    /// Returns `true` if the shape is exactly representable as a rounded
    /// rectangle.
    #[must_use]
    pub fn is_rounded_rect_like(&self) -> bool {
        !matches!(self, Self::Path(_))
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<RoundedRect> for Shape {
    fn from(rr: RoundedRect) -> Self {
        Self::RoundedRect(rr)
    }
}

impl From<BezPath> for Shape {
    fn from(path: BezPath) -> Self {
        Self::Path(path)
    }
}

/// How a node's content is clipped to its shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Clip {
    /// No clipping.
    #[default]
    None,
    /// Clip without anti-aliasing.
    HardEdge,
    /// Clip with anti-aliasing.
    AntiAlias,
    /// Clip with anti-aliasing and composite the content in an offscreen
    /// layer, which avoids bleeding at the anti-aliased edges.
    AntiAliasWithSaveLayer,
}

impl Clip {
    /// Returns `true` if the clip edge is anti-aliased.
    #[inline]
    #[must_use]
    pub const fn is_anti_aliased(self) -> bool {
        !matches!(self, Self::HardEdge)
    }

    /// Returns `true` if clipping opens an offscreen layer.
    #[inline]
    #[must_use]
    pub const fn uses_save_layer(self) -> bool {
        matches!(self, Self::AntiAliasWithSaveLayer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_bounds_and_frame_fallback() {
        let mut path = BezPath::new();
        path.move_to((10.0, 20.0));
        path.line_to((40.0, 25.0));
        path.line_to((15.0, 60.0));
        path.close_path();
        let shape = Shape::Path(path);
        assert_eq!(shape.bounds(), Rect::new(10.0, 20.0, 40.0, 60.0));
        let frame = shape.frame_rounded_rect();
        assert_eq!(frame.rect(), Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(frame.radii().top_left, 0.0, "paths frame with square corners");
        assert!(!shape.is_rounded_rect_like());
    }

    #[test]
    fn oval_frames_as_rounded_rect() {
        let shape = Shape::Oval(Rect::new(0.0, 0.0, 40.0, 20.0));
        let frame = shape.frame_rounded_rect();
        assert_eq!(frame.radii().top_left, 10.0);
        assert!(shape.is_rounded_rect_like());
    }

    #[test]
    fn clip_flags() {
        assert!(!Clip::HardEdge.is_anti_aliased());
        assert!(Clip::AntiAlias.is_anti_aliased());
        assert!(Clip::AntiAliasWithSaveLayer.uses_save_layer());
        assert!(!Clip::AntiAlias.uses_save_layer());
    }
}
