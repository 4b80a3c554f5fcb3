// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained scene graph and the two traversals that draw it.
//!
//! `lamina_core` turns a tree of clip, transform, effect, and content nodes
//! into drawing operations on an abstract [`Canvas`](canvas::Canvas). The
//! tree is built once per frame, possibly reusing subtrees from earlier
//! frames, and then walked twice: **Preroll** computes bounds and decides
//! what needs an offscreen layer, a raster cache entry, or a native
//! compositor; **Paint** issues the canvas operations.
//!
//! # Architecture
//!
//! ```text
//!   SceneBuilder (push / pop / add)
//!       │
//!       ▼
//!   Scene ──► LayerTree ──► ScopedFrame::raster()
//!                                │
//!                 ┌──────────────┤
//!                 ▼              ▼
//!   Node::preroll()        Node::paint() ──► Canvas (NWayCanvas fan-out)
//!   PrerollContext         PaintContext
//!                 │
//!                 └──► Node::update_scene() ──► SystemCompositor
//! ```
//!
//! **[`scene`]**: The push/pop stack machine that builds a node tree, and
//! [`NodeHandle`](scene::NodeHandle)s for retaining subtrees across frames.
//!
//! **[`node`]**: The closed set of node kinds and their Preroll and Paint
//! behavior. Nodes are shared by `Arc` and keep a stable
//! [`NodeId`](id::NodeId).
//!
//! **[`context`]**: Per-traversal state with scope guards that restore the
//! cull rect, mutators, readback flag, and canvas save depth.
//!
//! **[`layer_tree`]** and **[`compositor`]**: A scene bound to a frame size,
//! and the frame lifecycle around it (stopwatches, raster cache sweep,
//! readback protection, platform view embedder hand-off).
//!
//! **[`canvas`]**: The drawing surface trait, a fan-out canvas, and a
//! recording canvas for tests and tooling.
//!
//! **[`raster_cache`]**: Rasterized pictures keyed by picture id and
//! transform, swept after every frame.
//!
//! **[`system_composite`]** and **[`embedder`]**: Collaborators for
//! platforms that composite elevated surfaces or native views themselves.
//!
//! **[`instrumentation`]**, **[`time`]**, and **[`trace`]**: Frame timing
//! and the [`TraceSink`](trace::TraceSink) hook with its zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates raster cache
//!   and retained node cache events.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod canvas;
pub mod checkerboard;
pub mod compositor;
pub mod context;
pub mod embedder;
pub mod geometry;
pub mod id;
pub mod instrumentation;
pub mod layer_tree;
pub mod mutators;
pub mod node;
pub mod paint;
pub mod picture;
pub mod raster_cache;
pub mod scene;
pub mod shape;
pub mod system_composite;
pub mod texture;
pub mod time;
pub mod trace;
