// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native scene bridge for lamina node trees.
//!
//! Platforms that composite elevated surfaces themselves receive a
//! description of the tree instead of canvas drawing for those surfaces.
//! `lamina_scene` turns that description into a retained tree of native
//! nodes:
//!
//! - **[`session`]**: The native node tree. Entities position and clip,
//!   and shape nodes draw a filled rounded rectangle. Nodes are addressed by
//!   generational [`SceneNodeId`]s.
//! - **[`context`]**: [`SceneUpdateContext`], the
//!   [`SystemCompositor`](lamina_core::system_composite::SystemCompositor)
//!   that builds the session each frame and keeps frames of unchanged
//!   subtrees alive across frames.
//! - **[`surface`]**: Offscreen surfaces for frames whose children draw on a
//!   canvas.
//! - **[`transform`]**: 4×4 transforms and their decomposition into the
//!   translation, scale, and rotation native nodes are positioned by.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables trace events in `lamina_core`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod context;
pub mod session;
pub mod surface;
pub mod transform;

pub use context::SceneUpdateContext;
pub use session::{ImageId, Material, RoundedRectangle, SceneNodeId, SceneNodeKind, Session};
pub use surface::{
    PhysicalSize, ProducedSurface, RecordingSurface, RecordingSurfaceProducer, SurfaceError,
    SurfaceProducer,
};
pub use transform::{Decomposition, Transform3d};
