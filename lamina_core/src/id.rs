// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-unique identity types for nodes and pictures.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_PICTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a node in a scene tree.
///
/// Ids are assigned from a process-wide monotonically increasing counter when
/// a node is constructed and never reused. A node keeps its id for its whole
/// lifetime, including when it is retained into later scenes, which makes the
/// id suitable as a cache key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates the next id.
    #[inline]
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value (for diagnostics and cache keys).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identity of a recorded [`Picture`](crate::picture::Picture).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PictureId(u64);

impl PictureId {
    #[inline]
    pub(crate) fn next() -> Self {
        Self(NEXT_PICTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PictureId({})", self.0)
    }
}

/// Identifier of an external texture in a
/// [`TextureRegistry`](crate::texture::TextureRegistry).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub i64);

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

/// Identifier of a platform view hosted by an
/// [`ExternalViewEmbedder`](crate::embedder::ExternalViewEmbedder).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(pub i64);

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_increase_monotonically() {
        let a = NodeId::next();
        let b = NodeId::next();
        let c = NodeId::next();
        assert!(a < b && b < c, "ids must be strictly increasing: {a:?} {b:?} {c:?}");
    }

    #[test]
    fn debug_formats() {
        assert_eq!(format!("{:?}", TextureId(7)), "TextureId(7)");
        assert_eq!(format!("{:?}", ViewId(-1)), "ViewId(-1)");
    }
}
