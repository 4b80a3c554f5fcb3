// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen caching of picture content.
//!
//! Pictures that stay unchanged for several frames are rasterized once at
//! their device scale and drawn from the cached image afterwards. Entries are
//! keyed by picture identity plus the transform without its translation, so
//! content that only scrolls keeps hitting the cache.
//!
//! Entries are created and touched during Preroll; Paint only reads them.
//! [`RasterCache::sweep_after_frame`] evicts everything not touched in the
//! frame.

use std::collections::HashMap;

use kurbo::{Affine, Rect};

use crate::canvas::Canvas;
use crate::checkerboard;
use crate::geometry;
use crate::id::{NodeId, PictureId};
use crate::picture::Picture;

/// A transform reduced to its scale/skew part, hashable by bit pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct MatrixKey([u64; 4]);

impl MatrixKey {
    fn new(transform: Affine) -> Self {
        let [a, b, c, d, _, _] = geometry::without_translation(transform).as_coeffs();
        // Normalize -0.0 so equal transforms hash equally.
        let bits = |v: f64| (v + 0.0).to_bits();
        Self([bits(a), bits(b), bits(c), bits(d)])
    }
}

/// Cache key pairing a content identity with the transform it is drawn at.
///
/// Translation is ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterCacheKey<I> {
    id: I,
    matrix: MatrixKey,
}

impl<I: Copy> RasterCacheKey<I> {
    /// Creates a key for `id` drawn at `transform`.
    #[must_use]
    pub fn new(id: I, transform: Affine) -> Self {
        Self {
            id,
            matrix: MatrixKey::new(transform),
        }
    }

    /// The content identity.
    #[must_use]
    pub fn id(&self) -> I {
        self.id
    }
}

impl<I: core::fmt::Debug> core::fmt::Debug for RasterCacheKey<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RasterCacheKey")
            .field("id", &self.id)
            .field("matrix", &self.matrix.0.map(f64::from_bits))
            .finish()
    }
}

/// Key for cached pictures.
pub type PictureRasterCacheKey = RasterCacheKey<PictureId>;
/// Key for retained per-node content, such as native scene nodes.
pub type NodeCacheKey = RasterCacheKey<NodeId>;

/// A rasterized copy of a picture.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    id: u64,
    logical_rect: Rect,
    device_rect: Rect,
    picture: Picture,
    checkerboard: bool,
}

impl RasterImage {
    /// Identity of the allocation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bounds in the picture's own coordinates.
    #[must_use]
    pub fn logical_rect(&self) -> Rect {
        self.logical_rect
    }

    /// Pixel bounds at the time of rasterization.
    #[must_use]
    pub fn device_rect(&self) -> Rect {
        self.device_rect
    }

    /// The picture this image was rasterized from.
    #[must_use]
    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    /// Whether the image should be drawn with a debug checkerboard.
    #[must_use]
    pub fn checkerboard(&self) -> bool {
        self.checkerboard
    }

    /// Draws the image pixel-aligned under the canvas's current transform.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let restore_to = canvas.save();
        let device = geometry::map_rect(canvas.total_matrix(), &self.logical_rect).expand();
        canvas.set_matrix(Affine::IDENTITY);
        canvas.draw_image(self, device.x0, device.y0);
        if self.checkerboard {
            checkerboard::draw_checkerboard(canvas, device);
        }
        canvas.restore_to_count(restore_to);
    }
}

/// Tuning for [`RasterCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterCacheConfig {
    /// Number of frames a picture must be seen in before it is cached.
    /// Zero disables caching.
    pub access_threshold: usize,
    /// Maximum number of pictures rasterized in a single frame.
    pub picture_cache_limit_per_frame: usize,
}

impl Default for RasterCacheConfig {
    fn default() -> Self {
        Self {
            access_threshold: 3,
            picture_cache_limit_per_frame: 3,
        }
    }
}

/// Pictures with at most this many operations are cheap to redraw.
const TRIVIAL_OP_COUNT: usize = 5;

#[derive(Debug, Default)]
struct Entry {
    used_this_frame: bool,
    access_count: usize,
    image: Option<RasterImage>,
}

/// Cache of rasterized pictures owned by the rasterizer.
#[derive(Debug, Default)]
pub struct RasterCache {
    config: RasterCacheConfig,
    pictures: HashMap<PictureRasterCacheKey, Entry>,
    cached_this_frame: usize,
    next_image_id: u64,
    checkerboard_images: bool,
}

impl RasterCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The cache configuration.
    #[must_use]
    pub fn config(&self) -> RasterCacheConfig {
        self.config
    }

    /// Marks newly created images for checkerboard debugging.
    pub fn set_checkerboard_images(&mut self, checkerboard: bool) {
        self.checkerboard_images = checkerboard;
    }

    /// Records that `picture` is drawn at `transform` this frame and
    /// rasterizes it once it qualifies.
    ///
    /// Returns `true` if an image is available for the picture afterwards.
    pub fn prepare(
        &mut self,
        picture: &Picture,
        transform: Affine,
        is_complex: bool,
        will_change: bool,
    ) -> bool {
        if self.config.access_threshold == 0 {
            return false;
        }
        if !is_worth_rasterizing(picture, will_change, is_complex) {
            return false;
        }
        if !transform.is_finite() || transform.determinant() == 0.0 {
            return false;
        }

        let key = PictureRasterCacheKey::new(picture.id(), transform);
        let entry = self.pictures.entry(key).or_default();
        if !entry.used_this_frame {
            entry.access_count += 1;
            entry.used_this_frame = true;
        }
        if entry.access_count < self.config.access_threshold {
            return false;
        }
        if entry.image.is_some() {
            return true;
        }
        if self.cached_this_frame >= self.config.picture_cache_limit_per_frame {
            return false;
        }

        let logical_rect = picture.cull_rect();
        let device_rect = geometry::map_rect(transform, &logical_rect).expand();
        if geometry::is_empty(&device_rect) {
            log::debug!("skipping raster cache for {:?}: empty device bounds", picture.id());
            return false;
        }
        self.next_image_id += 1;
        entry.image = Some(RasterImage {
            id: self.next_image_id,
            logical_rect,
            device_rect,
            picture: picture.clone(),
            checkerboard: self.checkerboard_images,
        });
        self.cached_this_frame += 1;
        true
    }

    /// Looks up the image for `picture` at `transform`.
    #[must_use]
    pub fn get(&self, picture: &Picture, transform: Affine) -> Option<&RasterImage> {
        let key = PictureRasterCacheKey::new(picture.id(), transform);
        self.pictures.get(&key).and_then(|e| e.image.as_ref())
    }

    /// Evicts entries that were not used in the frame just finished.
    pub fn sweep_after_frame(&mut self) {
        self.pictures.retain(|_, entry| {
            let keep = entry.used_this_frame;
            entry.used_this_frame = false;
            keep
        });
        self.cached_this_frame = 0;
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.pictures.clear();
        self.cached_this_frame = 0;
    }

    /// Number of tracked picture entries.
    #[must_use]
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Number of entries with a rasterized image.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.pictures.values().filter(|e| e.image.is_some()).count()
    }
}

fn is_worth_rasterizing(picture: &Picture, will_change: bool, is_complex: bool) -> bool {
    if will_change {
        return false;
    }
    let cull = picture.cull_rect();
    if geometry::is_empty(&cull) || !cull.is_finite() {
        return false;
    }
    is_complex || picture.op_count() > TRIVIAL_OP_COUNT
}
