// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint state passed to drawing operations.
//!
//! These types describe *what* to draw with; they are interpreted by the
//! [`Canvas`](crate::canvas::Canvas) implementation and never by the node
//! tree itself.

use core::fmt;

use kurbo::{Affine, Point, Rect};

/// A 32-bit ARGB color, non-premultiplied.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xff00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xffff_ffff);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Alpha component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracting one byte")]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracting one byte")]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracting one byte")]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue component.
    #[inline]
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "extracting one byte")]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Returns this color with the alpha component replaced.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00ff_ffff) | (alpha as u32) << 24)
    }

    /// Returns `true` if the alpha component is `0xff`.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0xff
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08x})", self.0)
    }
}

/// Porter-Duff and separable blend modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Destination is cleared.
    Clear,
    /// Source replaces destination.
    Src,
    /// Standard source-over alpha compositing.
    #[default]
    SrcOver,
    /// Source inside destination.
    SrcIn,
    /// Destination inside source.
    DstIn,
    /// Source outside destination.
    SrcOut,
    /// Source atop destination.
    SrcATop,
    /// Component-wise multiply.
    Multiply,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Modulate (component-wise product including alpha).
    Modulate,
}

/// A per-pixel color transformation.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    /// Blends a constant color into the content.
    Mode {
        /// The constant color.
        color: Color,
        /// How the color is blended.
        blend_mode: BlendMode,
    },
    /// A 4×5 row-major color matrix.
    Matrix(Box<[f32; 20]>),
    /// Converts linear values to sRGB gamma.
    LinearToSrgbGamma,
    /// Converts sRGB gamma values to linear.
    SrgbToLinearGamma,
}

/// A filter applied to a rendered image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageFilter {
    /// Gaussian blur.
    Blur {
        /// Horizontal standard deviation.
        sigma_x: f64,
        /// Vertical standard deviation.
        sigma_y: f64,
    },
    /// Resamples the content through a transform.
    Matrix(Affine),
    /// Applies a color filter.
    Color(ColorFilter),
}

/// A source of color that varies over the drawing area.
#[derive(Clone, Debug, PartialEq)]
pub enum Shader {
    /// A linear gradient between two points.
    LinearGradient {
        /// Gradient start.
        start: Point,
        /// Gradient end.
        end: Point,
        /// Color stops.
        colors: Vec<Color>,
        /// Stop positions in `0..=1`, evenly spaced when `None`.
        stops: Option<Vec<f32>>,
    },
    /// A radial gradient.
    RadialGradient {
        /// Gradient center.
        center: Point,
        /// Gradient radius.
        radius: f64,
        /// Color stops.
        colors: Vec<Color>,
        /// Stop positions in `0..=1`, evenly spaced when `None`.
        stops: Option<Vec<f32>>,
    },
    /// Alternating squares, used for debug overlays.
    Checkerboard {
        /// Color of the first square.
        first: Color,
        /// Color of the second square.
        second: Color,
        /// Square edge length in device pixels.
        size: f64,
    },
}

/// Whether shapes are filled or outlined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PaintStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Outline with the given stroke width.
    Stroke(f64),
}

/// The full state used when drawing a primitive or compositing a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    /// Solid color; its alpha also modulates shaders and layers.
    pub color: Color,
    /// Blend mode used to composite onto the destination.
    pub blend_mode: BlendMode,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Optional shader, replacing the solid color.
    pub shader: Option<Shader>,
    /// Optional color filter.
    pub color_filter: Option<ColorFilter>,
    /// Optional image filter.
    pub image_filter: Option<ImageFilter>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            blend_mode: BlendMode::SrcOver,
            anti_alias: false,
            style: PaintStyle::Fill,
            shader: None,
            color_filter: None,
            image_filter: None,
        }
    }
}

impl Paint {
    /// A solid-color fill paint.
    #[must_use]
    pub fn from_color(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// A layer paint that only modulates alpha.
    #[must_use]
    pub fn from_alpha(alpha: u8) -> Self {
        Self::from_color(Color::BLACK.with_alpha(alpha))
    }

    /// Alpha of the paint color.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> u8 {
        self.color.alpha()
    }
}

/// Parameters of an offscreen layer opened with
/// [`Canvas::save_layer`](crate::canvas::Canvas::save_layer).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SaveLayerRec {
    /// Bounds hint for the layer, or `None` for the whole clip.
    pub bounds: Option<Rect>,
    /// Paint applied when the layer is composited back.
    pub paint: Option<Paint>,
    /// Filter applied to the existing destination content under the layer.
    pub backdrop: Option<ImageFilter>,
}

impl SaveLayerRec {
    /// A layer over `bounds` composited with `paint`.
    #[must_use]
    pub fn new(bounds: Rect, paint: Option<Paint>) -> Self {
        Self {
            bounds: Some(bounds),
            paint,
            backdrop: None,
        }
    }
}

/// A 3-D point used for shadow light positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

/// Parameters of a drawn shadow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowRec {
    /// Height of the occluder above the canvas plane.
    pub occluder_height: f64,
    /// Position of the light.
    pub light_position: Point3,
    /// Radius of the light.
    pub light_radius: f64,
    /// Color of the ambient shadow.
    pub ambient_color: Color,
    /// Color of the spot shadow.
    pub spot_color: Color,
    /// Whether the occluding shape is translucent.
    pub transparent_occluder: bool,
}
