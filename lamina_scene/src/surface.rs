// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen surfaces for frame content.
//!
//! A frame whose children draw on a canvas gets its own surface. The surface
//! is painted after the scene update and then shown as the texture of the
//! frame's shape node.

use lamina_core::canvas::{Canvas, RecordingCanvas};
use lamina_core::raster_cache::NodeCacheKey;

use crate::session::{ImageId, SceneNodeId};

/// Why a surface could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// One side of the requested size is zero.
    #[error("surface size {width}x{height} is empty")]
    EmptySize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The requested size exceeds what the backend supports.
    #[error("surface size {width}x{height} exceeds the maximum of {max}")]
    TooLarge {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Largest supported side.
        max: u32,
    },
    /// There is no drawing backend to allocate from.
    #[error("no drawing backend is available")]
    NoBackend,
    /// The backend failed to allocate.
    #[error("surface allocation failed: {0}")]
    Allocation(String),
}

/// Size of a surface in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhysicalSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PhysicalSize {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A surface handed out by a [`SurfaceProducer`].
pub trait ProducedSurface {
    /// Image the native scene shows for this surface.
    fn image(&self) -> ImageId;

    /// Pixel size.
    fn size(&self) -> PhysicalSize;

    /// Canvas drawing into the surface.
    fn canvas(&mut self) -> &mut dyn Canvas;
}

/// Allocator of offscreen surfaces.
pub trait SurfaceProducer {
    /// The surfaces this producer hands out.
    type Surface: ProducedSurface;

    /// Allocates a surface of `size` for the frame entity `entity`.
    ///
    /// `key` identifies the node the frame represents, so producers may
    /// recycle the surface it had in an earlier frame.
    fn produce_surface(
        &mut self,
        size: PhysicalSize,
        key: Option<NodeCacheKey>,
        entity: SceneNodeId,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// A surface that records drawing operations.
#[derive(Debug)]
pub struct RecordingSurface {
    image: ImageId,
    size: PhysicalSize,
    canvas: RecordingCanvas,
}

impl RecordingSurface {
    /// The recorded canvas.
    #[must_use]
    pub fn recording(&self) -> &RecordingCanvas {
        &self.canvas
    }
}

impl ProducedSurface for RecordingSurface {
    fn image(&self) -> ImageId {
        self.image
    }

    fn size(&self) -> PhysicalSize {
        self.size
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }
}

/// Producer of [`RecordingSurface`]s, for tests and tooling.
#[derive(Debug)]
pub struct RecordingSurfaceProducer {
    max_side: u32,
    next_image: u64,
    produced: Vec<PhysicalSize>,
}

impl Default for RecordingSurfaceProducer {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl RecordingSurfaceProducer {
    /// Creates a producer refusing surfaces with a side above `max_side`.
    #[must_use]
    pub fn new(max_side: u32) -> Self {
        Self {
            max_side,
            next_image: 1,
            produced: Vec::new(),
        }
    }

    /// Sizes of every surface produced so far.
    #[must_use]
    pub fn produced(&self) -> &[PhysicalSize] {
        &self.produced
    }
}

impl SurfaceProducer for RecordingSurfaceProducer {
    type Surface = RecordingSurface;

    fn produce_surface(
        &mut self,
        size: PhysicalSize,
        _key: Option<NodeCacheKey>,
        _entity: SceneNodeId,
    ) -> Result<RecordingSurface, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::EmptySize {
                width: size.width,
                height: size.height,
            });
        }
        if size.width > self.max_side || size.height > self.max_side {
            return Err(SurfaceError::TooLarge {
                width: size.width,
                height: size.height,
                max: self.max_side,
            });
        }
        let image = ImageId(self.next_image);
        self.next_image += 1;
        self.produced.push(size);
        Ok(RecordingSurface {
            image,
            size,
            canvas: RecordingCanvas::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SceneNodeKind, Session};

    #[test]
    fn produces_distinct_images() {
        let mut session = Session::new();
        let entity = session.create(SceneNodeKind::Entity);
        let mut producer = RecordingSurfaceProducer::default();
        let a = producer
            .produce_surface(PhysicalSize::new(10, 20), None, entity)
            .unwrap();
        let b = producer
            .produce_surface(PhysicalSize::new(30, 40), None, entity)
            .unwrap();
        assert_ne!(a.image(), b.image(), "images are unique");
        assert_eq!(b.size(), PhysicalSize::new(30, 40));
        assert_eq!(producer.produced().len(), 2);
    }

    #[test]
    fn rejects_empty_and_oversized() {
        let mut session = Session::new();
        let entity = session.create(SceneNodeKind::Entity);
        let mut producer = RecordingSurfaceProducer::new(100);
        let empty = producer.produce_surface(PhysicalSize::new(0, 5), None, entity);
        assert!(matches!(empty, Err(SurfaceError::EmptySize { width: 0, height: 5 })));
        let large = producer.produce_surface(PhysicalSize::new(101, 5), None, entity);
        assert!(matches!(large, Err(SurfaceError::TooLarge { max: 100, .. })));
        assert!(producer.produced().is_empty(), "failures are not recorded");
    }

    #[test]
    fn error_messages() {
        let err = SurfaceError::TooLarge {
            width: 5000,
            height: 10,
            max: 4096,
        };
        assert_eq!(err.to_string(), "surface size 5000x10 exceeds the maximum of 4096");
        assert_eq!(SurfaceError::NoBackend.to_string(), "no drawing backend is available");
    }
}
