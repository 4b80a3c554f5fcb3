// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elevated material: a filled, clipping shape that casts a shadow.
//!
//! Shadows are modelled with a single light source hovering over the top
//! center of the shape. The light's height and radius are calibration
//! constants shared with the platforms' native shadows.

use kurbo::{Affine, Rect};

use super::{Node, NodeBehavior};
use crate::canvas::Canvas;
use crate::context::{
    AutoCanvasRestore, PaintContext, PrerollContext, PrerollSaveLayerState, PrerollScope,
};
use crate::paint::{Color, Paint, Point3, SaveLayerRec, ShadowRec};
use crate::raster_cache::NodeCacheKey;
use crate::shape::{Clip, Shape};
use crate::system_composite::{FrameSpec, SystemCompositor};

/// Height of the shadow light above the canvas, in logical pixels.
pub const LIGHT_HEIGHT: f64 = 600.0;
/// Radius of the shadow light, in logical pixels.
pub const LIGHT_RADIUS: f64 = 800.0;

/// Distance of the light above the top edge of the occluder.
const LIGHT_OFFSET_Y: f64 = 600.0;
const AMBIENT_ALPHA: f64 = 0.039;
const SPOT_ALPHA: f64 = 0.25;

/// A filled shape at an elevation, clipping its children.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalShapeNode {
    /// Fill color.
    pub color: Color,
    /// Color of the cast shadow; its alpha scales the shadow's strength.
    pub shadow_color: Color,
    /// Height above the parent surface.
    pub elevation: f64,
    /// Outline of the material.
    pub shape: Shape,
    /// How children are clipped to the outline.
    pub clip: Clip,
}

impl PhysicalShapeNode {
    /// Creates a physical shape node.
    #[must_use]
    pub fn new(color: Color, shadow_color: Color, elevation: f64, shape: Shape, clip: Clip) -> Self {
        Self {
            color,
            shadow_color,
            elevation,
            shape,
            clip,
        }
    }
}

impl NodeBehavior for PhysicalShapeNode {
    fn preroll(&self, node: &Node, context: &mut PrerollContext<'_>, matrix: Affine) {
        let mut layer = PrerollSaveLayerState::new(context, self.clip.uses_save_layer(), false);
        {
            let mut scope = PrerollScope::new(&mut layer);
            scope.total_elevation += self.elevation;
            // Children are clipped to the shape, so their bounds are not
            // joined into ours.
            let _ = node.preroll_children(&mut scope, matrix);
        }

        let bounds = self.shape.bounds();
        if self.elevation == 0.0 {
            node.set_paint_bounds(bounds);
        } else if layer.is_system_compositing() {
            node.set_needs_system_composite(true);
        } else {
            node.set_paint_bounds(shadow_bounds(
                bounds,
                self.elevation,
                layer.frame_device_pixel_ratio,
            ));
        }
    }

    fn paint(&self, node: &Node, context: &mut PaintContext<'_>) {
        debug_assert!(node.needs_painting(), "needs_painting()");
        let dpr = context.frame_device_pixel_ratio;
        if self.elevation != 0.0 {
            draw_shadow(
                context.leaf_nodes_canvas(),
                &self.shape,
                self.shadow_color,
                self.elevation,
                !self.color.is_opaque(),
                dpr,
            );
        }

        let paint = Paint {
            anti_alias: true,
            ..Paint::from_color(self.color)
        };
        if self.clip != Clip::AntiAliasWithSaveLayer {
            context.leaf_nodes_canvas().draw_shape(&self.shape, &paint);
        }

        let mut restore = AutoCanvasRestore::internal(context, true);
        match self.clip {
            Clip::HardEdge => restore.internal_nodes_canvas().clip_shape(&self.shape, false),
            Clip::AntiAlias => restore.internal_nodes_canvas().clip_shape(&self.shape, true),
            Clip::AntiAliasWithSaveLayer => {
                let canvas = restore.internal_nodes_canvas();
                canvas.clip_shape(&self.shape, true);
                canvas.save_layer(&SaveLayerRec::new(node.paint_bounds(), None));
            }
            Clip::None => {}
        }

        if self.clip.uses_save_layer() {
            // An anti-aliased fill under an anti-aliased clip bleeds at the
            // edge; inside the layer the clip alone shapes the fill.
            restore.leaf_nodes_canvas().draw_paint(&paint);
        }

        node.paint_children(&mut restore);
    }

    fn update_scene(&self, node: &Node, compositor: &mut dyn SystemCompositor) {
        let key = NodeCacheKey::new(node.id(), compositor.transform());
        if compositor.has_retained_node(&key) {
            log::trace!("retained scene node hit for {:?}", node.id());
            compositor.attach_retained_node(&key);
            return;
        }

        compositor.push_frame(FrameSpec {
            rrect: self.shape.frame_rounded_rect(),
            color: self.color,
            elevation: self.elevation,
            node: Some(node.id()),
        });
        for child in node.children.read().iter() {
            if child.needs_painting() {
                compositor.add_paint_node(child);
            }
        }
        node.update_scene_children(compositor);
        compositor.pop();
    }
}

/// Outsets `bounds` by the extent of the shadow cast at `elevation`.
///
/// With the light `LIGHT_HEIGHT` above the canvas and `LIGHT_RADIUS` wide,
/// the shadow extends `elevation * (LIGHT_RADIUS * dpr + w / 2) /
/// LIGHT_HEIGHT` past each vertical edge, and likewise with the height for
/// the horizontal edges.
#[must_use]
pub fn shadow_bounds(bounds: Rect, elevation: f64, device_pixel_ratio: f64) -> Rect {
    let tx = (LIGHT_RADIUS * device_pixel_ratio + bounds.width() * 0.5) / LIGHT_HEIGHT;
    let ty = (LIGHT_RADIUS * device_pixel_ratio + bounds.height() * 0.5) / LIGHT_HEIGHT;
    bounds.inflate(elevation * tx, elevation * ty)
}

/// Draws the tonal shadow cast by `shape` at `elevation`.
pub fn draw_shadow(
    canvas: &mut dyn Canvas,
    shape: &Shape,
    color: Color,
    elevation: f64,
    transparent_occluder: bool,
    device_pixel_ratio: f64,
) {
    let bounds = shape.bounds();
    let alpha = f64::from(color.alpha());
    let (ambient_color, spot_color) = compute_tonal_colors(
        color.with_alpha(scale_alpha(AMBIENT_ALPHA * alpha)),
        color.with_alpha(scale_alpha(SPOT_ALPHA * alpha)),
    );
    let shadow = ShadowRec {
        occluder_height: device_pixel_ratio * elevation,
        light_position: Point3 {
            x: (bounds.x0 + bounds.x1) / 2.0,
            y: bounds.y0 - LIGHT_OFFSET_Y,
            z: device_pixel_ratio * LIGHT_HEIGHT,
        },
        light_radius: device_pixel_ratio * LIGHT_RADIUS,
        ambient_color,
        spot_color,
        transparent_occluder,
    };
    canvas.draw_shadow(shape, &shadow);
}

/// Splits shadow colors into a greyscale ambient color and a tinted spot
/// color whose combined appearance approximates the requested tint.
///
/// Only the alpha of `ambient` is kept. A spot color that ends up fully
/// transparent is returned as transparent black.
#[must_use]
pub fn compute_tonal_colors(ambient: Color, spot: Color) -> (Color, Color) {
    let ambient = Color::from_argb(ambient.alpha(), 0, 0, 0);

    let (r, g, b) = (spot.red(), spot.green(), spot.blue());
    let max = f64::from(r.max(g).max(b));
    let min = f64::from(r.min(g).min(b));
    let luminance = 0.5 * (max + min) / 255.0;
    let orig_alpha = f64::from(spot.alpha()) / 255.0;

    let alpha_adjust = (2.6 + (-2.666_67 + 1.066_67 * orig_alpha) * orig_alpha) * orig_alpha;
    let color_alpha =
        (3.544_762 + (-4.891_428 + 2.3466 * luminance) * luminance) * luminance;
    let color_alpha = (alpha_adjust * color_alpha).clamp(0.0, 1.0);
    let greyscale_alpha = (orig_alpha * (1.0 - 0.4 * luminance)).clamp(0.0, 1.0);

    let color_scale = color_alpha * (1.0 - greyscale_alpha);
    let tonal_alpha = color_scale + greyscale_alpha;
    if tonal_alpha <= 0.0 {
        return (ambient, Color::TRANSPARENT);
    }
    let unpremul = color_scale / tonal_alpha;
    let spot = Color::from_argb(
        scale_alpha(tonal_alpha * 255.999),
        scale_alpha(unpremul * f64::from(r)),
        scale_alpha(unpremul * f64::from(g)),
        scale_alpha(unpremul * f64::from(b)),
    );
    (ambient, spot)
}

#[expect(clippy::cast_possible_truncation, reason = "clamped to the u8 range")]
fn scale_alpha(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
