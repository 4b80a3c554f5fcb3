// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use kurbo::{Affine, Point};

use super::Canvas;
use crate::paint::{Paint, SaveLayerRec, ShadowRec};
use crate::picture::Picture;
use crate::raster_cache::RasterImage;
use crate::shape::Shape;

/// Forwards every operation to a list of canvases.
///
/// Container nodes draw through an `NWayCanvas` so that state changes
/// (transforms, clips, layers) reach every output surface of the frame,
/// including overlay surfaces created for platform views. Leaf content is
/// drawn on exactly one of the member canvases, selected by index.
pub struct NWayCanvas<'a> {
    canvases: Vec<&'a mut dyn Canvas>,
    save_count: usize,
}

impl fmt::Debug for NWayCanvas<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NWayCanvas")
            .field("canvases", &self.canvases.len())
            .field("save_count", &self.save_count)
            .finish()
    }
}

impl Default for NWayCanvas<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> NWayCanvas<'a> {
    /// Creates a fan-out canvas with no members.
    #[must_use]
    pub fn new() -> Self {
        Self {
            canvases: Vec::new(),
            save_count: 1,
        }
    }

    /// Adds a member canvas. Returns its index.
    pub fn add_canvas(&mut self, canvas: &'a mut dyn Canvas) -> usize {
        self.canvases.push(canvas);
        self.canvases.len() - 1
    }

    /// Number of member canvases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    /// Returns `true` if there are no member canvases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    /// Returns the member canvas at `index`.
    pub fn member(&mut self, index: usize) -> Option<&mut dyn Canvas> {
        match self.canvases.get_mut(index) {
            Some(canvas) => Some(&mut **canvas),
            None => None,
        }
    }

    /// Returns the member canvas at `index`, falling back to the first
    /// member when `index` is out of range. With no members, returns the
    /// fan-out canvas itself, which then draws nowhere.
    pub fn member_or_first(&mut self, index: usize) -> &mut dyn Canvas {
        if self.canvases.is_empty() {
            return self;
        }
        let index = if index < self.canvases.len() { index } else { 0 };
        &mut *self.canvases[index]
    }
}

impl Canvas for NWayCanvas<'_> {
    fn save(&mut self) -> usize {
        for c in &mut self.canvases {
            c.save();
        }
        self.save_count += 1;
        self.save_count - 1
    }

    fn save_layer(&mut self, rec: &SaveLayerRec) -> usize {
        for c in &mut self.canvases {
            c.save_layer(rec);
        }
        self.save_count += 1;
        self.save_count - 1
    }

    fn restore(&mut self) {
        if self.save_count <= 1 {
            return;
        }
        for c in &mut self.canvases {
            c.restore();
        }
        self.save_count -= 1;
    }

    fn save_count(&self) -> usize {
        self.save_count
    }

    fn concat(&mut self, transform: Affine) {
        for c in &mut self.canvases {
            c.concat(transform);
        }
    }

    fn set_matrix(&mut self, transform: Affine) {
        for c in &mut self.canvases {
            c.set_matrix(transform);
        }
    }

    fn total_matrix(&self) -> Affine {
        self.canvases
            .first()
            .map_or(Affine::IDENTITY, |c| c.total_matrix())
    }

    fn clip_shape(&mut self, shape: &Shape, anti_alias: bool) {
        for c in &mut self.canvases {
            c.clip_shape(shape, anti_alias);
        }
    }

    fn draw_shape(&mut self, shape: &Shape, paint: &Paint) {
        for c in &mut self.canvases {
            c.draw_shape(shape, paint);
        }
    }

    fn draw_paint(&mut self, paint: &Paint) {
        for c in &mut self.canvases {
            c.draw_paint(paint);
        }
    }

    fn draw_shadow(&mut self, shape: &Shape, shadow: &ShadowRec) {
        for c in &mut self.canvases {
            c.draw_shadow(shape, shadow);
        }
    }

    fn draw_picture(&mut self, picture: &Picture) {
        for c in &mut self.canvases {
            c.draw_picture(picture);
        }
    }

    fn draw_image(&mut self, image: &RasterImage, left: f64, top: f64) {
        for c in &mut self.canvases {
            c.draw_image(image, left, top);
        }
    }

    fn draw_text(&mut self, text: &str, origin: Point, paint: &Paint) {
        for c in &mut self.canvases {
            c.draw_text(text, origin, paint);
        }
    }
}
