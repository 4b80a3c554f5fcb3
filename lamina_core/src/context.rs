// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal state for the Preroll and Paint phases.
//!
//! A [`PrerollContext`] or [`PaintContext`] is created once per frame and
//! threaded by `&mut` through the recursive traversal. Nodes change the state
//! for their subtree only through the scope guards in this module, which put
//! everything back when they go out of scope.

use core::fmt;
use core::ops::{Deref, DerefMut};

use kurbo::Rect;

use crate::canvas::{Canvas, NWayCanvas};
use crate::checkerboard;
use crate::embedder::ExternalViewEmbedder;
use crate::geometry::{self, GIANT_RECT};
use crate::id::NodeId;
use crate::instrumentation::Stopwatch;
use crate::mutators::{Mutator, MutatorsStack};
use crate::paint::SaveLayerRec;
use crate::raster_cache::RasterCache;
use crate::system_composite::SystemCompositor;
use crate::texture::TextureRegistry;
use crate::trace::{SkipEvent, SkipReason, Tracer};

/// State of the Preroll traversal.
///
/// Fields marked as accumulators are read and written by nodes as the
/// traversal goes; the rest are fixed for the frame.
pub struct PrerollContext<'a> {
    /// Cache to prepare pictures in, or `None` to bypass caching.
    pub raster_cache: Option<&'a mut RasterCache>,
    /// Receiver of platform views.
    pub view_embedder: Option<&'a mut dyn ExternalViewEmbedder>,
    /// Native compositor that takes over elevated subtrees, if any.
    pub system_compositor: Option<&'a dyn SystemCompositor>,
    /// Ancestor clips, transforms, and opacities.
    pub mutators_stack: MutatorsStack,
    /// Region of the current local space that can still be visible.
    pub cull_rect: Rect,
    /// Accumulator: some node reads back from the surface it draws on.
    pub surface_needs_readback: bool,
    /// Raster thread frame times.
    pub raster_time: &'a Stopwatch,
    /// UI thread frame times.
    pub ui_time: &'a Stopwatch,
    /// Textures available to texture nodes.
    pub texture_registry: &'a TextureRegistry,
    /// Whether offscreen layers are drawn with a debug checkerboard.
    pub checkerboard_offscreen_layers: bool,
    /// Maximum elevation the frame can show.
    pub frame_physical_depth: f64,
    /// Physical pixels per logical pixel.
    pub frame_device_pixel_ratio: f64,
    /// Accumulator: elevation of the enclosing physical shapes.
    pub total_elevation: f64,
    /// Accumulator: the current subtree contains a platform view.
    pub has_platform_view: bool,
    /// Accumulator: everything drawn at this point is fully opaque.
    pub is_opaque: bool,
    /// Frame counter, for trace events.
    pub frame_index: u64,
    /// Trace output.
    pub tracer: Tracer<'a>,
    skipped_nodes: u32,
}

impl fmt::Debug for PrerollContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrerollContext")
            .field("raster_cache", &self.raster_cache.is_some())
            .field("view_embedder", &self.view_embedder.is_some())
            .field("system_compositor", &self.system_compositor.is_some())
            .field("mutators_stack", &self.mutators_stack.len())
            .field("cull_rect", &self.cull_rect)
            .field("surface_needs_readback", &self.surface_needs_readback)
            .field("total_elevation", &self.total_elevation)
            .field("has_platform_view", &self.has_platform_view)
            .field("is_opaque", &self.is_opaque)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<'a> PrerollContext<'a> {
    /// Creates a context with no cache, embedder, or system compositor, an
    /// unbounded cull rect, and a device pixel ratio of 1.
    #[must_use]
    pub fn new(
        raster_time: &'a Stopwatch,
        ui_time: &'a Stopwatch,
        texture_registry: &'a TextureRegistry,
    ) -> Self {
        Self {
            raster_cache: None,
            view_embedder: None,
            system_compositor: None,
            mutators_stack: MutatorsStack::new(),
            cull_rect: GIANT_RECT,
            surface_needs_readback: false,
            raster_time,
            ui_time,
            texture_registry,
            checkerboard_offscreen_layers: false,
            frame_physical_depth: f64::MAX,
            frame_device_pixel_ratio: 1.0,
            total_elevation: 0.0,
            has_platform_view: false,
            is_opaque: true,
            frame_index: 0,
            tracer: Tracer::none(),
            skipped_nodes: 0,
        }
    }

    /// Returns `true` if elevated subtrees are handed to a native
    /// compositor instead of being drawn.
    #[must_use]
    pub fn is_system_compositing(&self) -> bool {
        self.system_compositor
            .is_some_and(|compositor| compositor.can_system_composite())
    }

    /// Number of nodes skipped so far this traversal.
    #[must_use]
    pub fn skipped_nodes(&self) -> u32 {
        self.skipped_nodes
    }

    pub(crate) fn note_skip(&mut self, node: NodeId, reason: SkipReason) {
        log::trace!("preroll skipped {node:?}: {reason:?}");
        self.skipped_nodes = self.skipped_nodes.saturating_add(1);
        self.tracer.skip(&SkipEvent {
            frame_index: self.frame_index,
            node,
            reason,
        });
    }
}

/// Scopes a save layer's effect on surface readback.
///
/// A node that opens an offscreen layer isolates its children from the
/// surface: reads inside the layer hit the layer, not the surface. While the
/// guard is active the readback accumulator starts out cleared for the
/// subtree; on drop it becomes the previous value, or `true` if the node
/// itself reads back.
pub(crate) struct PrerollSaveLayerState<'g, 'a> {
    context: &'g mut PrerollContext<'a>,
    save_layer_is_active: bool,
    layer_itself_performs_readback: bool,
    prev_surface_needs_readback: bool,
}

impl<'g, 'a> PrerollSaveLayerState<'g, 'a> {
    pub(crate) fn new(
        context: &'g mut PrerollContext<'a>,
        save_layer_is_active: bool,
        layer_itself_performs_readback: bool,
    ) -> Self {
        let prev_surface_needs_readback = context.surface_needs_readback;
        if save_layer_is_active {
            context.surface_needs_readback = false;
        }
        Self {
            context,
            save_layer_is_active,
            layer_itself_performs_readback,
            prev_surface_needs_readback,
        }
    }
}

impl<'a> Deref for PrerollSaveLayerState<'_, 'a> {
    type Target = PrerollContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for PrerollSaveLayerState<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for PrerollSaveLayerState<'_, '_> {
    fn drop(&mut self) {
        if self.save_layer_is_active {
            self.context.surface_needs_readback =
                self.prev_surface_needs_readback || self.layer_itself_performs_readback;
        }
    }
}

/// Restores the cull rect, mutator stack, opacity, and elevation
/// accumulators to their values at construction when dropped.
pub(crate) struct PrerollScope<'g, 'a> {
    context: &'g mut PrerollContext<'a>,
    saved_cull_rect: Rect,
    saved_mutators_len: usize,
    saved_is_opaque: bool,
    saved_total_elevation: f64,
}

impl<'g, 'a> PrerollScope<'g, 'a> {
    pub(crate) fn new(context: &'g mut PrerollContext<'a>) -> Self {
        Self {
            saved_cull_rect: context.cull_rect,
            saved_mutators_len: context.mutators_stack.len(),
            saved_is_opaque: context.is_opaque,
            saved_total_elevation: context.total_elevation,
            context,
        }
    }

    pub(crate) fn push_mutator(&mut self, mutator: Mutator) {
        self.context.mutators_stack.push(mutator);
    }
}

impl<'a> Deref for PrerollScope<'_, 'a> {
    type Target = PrerollContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for PrerollScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for PrerollScope<'_, '_> {
    fn drop(&mut self) {
        self.context.cull_rect = self.saved_cull_rect;
        self.context.mutators_stack.truncate(self.saved_mutators_len);
        self.context.is_opaque = self.saved_is_opaque;
        self.context.total_elevation = self.saved_total_elevation;
    }
}

/// State of the Paint traversal.
///
/// Drawing goes to one of two places. Transforms, clips, and layers opened
/// by container nodes go to the [internal nodes canvas], which fans out to
/// every output of the frame. Leaf content goes to the [leaf nodes canvas],
/// a single output that platform views switch to their overlay.
///
/// [internal nodes canvas]: Self::internal_nodes_canvas
/// [leaf nodes canvas]: Self::leaf_nodes_canvas
pub struct PaintContext<'a> {
    canvas: NWayCanvas<'a>,
    leaf_index: usize,
    /// Cache to draw prepared pictures from, or `None` to always draw
    /// directly.
    pub raster_cache: Option<&'a RasterCache>,
    /// Receiver of platform views.
    pub view_embedder: Option<&'a mut dyn ExternalViewEmbedder>,
    /// Textures available to texture nodes.
    pub texture_registry: &'a TextureRegistry,
    /// Raster thread frame times.
    pub raster_time: &'a Stopwatch,
    /// UI thread frame times.
    pub ui_time: &'a Stopwatch,
    /// Whether offscreen layers are drawn with a debug checkerboard.
    pub checkerboard_offscreen_layers: bool,
    /// Maximum elevation the frame can show.
    pub frame_physical_depth: f64,
    /// Physical pixels per logical pixel.
    pub frame_device_pixel_ratio: f64,
    /// Frame counter, for trace events.
    pub frame_index: u64,
    /// Trace output.
    pub tracer: Tracer<'a>,
    skipped_nodes: u32,
}

impl fmt::Debug for PaintContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintContext")
            .field("canvas", &self.canvas)
            .field("leaf_index", &self.leaf_index)
            .field("raster_cache", &self.raster_cache.is_some())
            .field("view_embedder", &self.view_embedder.is_some())
            .field("checkerboard_offscreen_layers", &self.checkerboard_offscreen_layers)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<'a> PaintContext<'a> {
    /// Creates a context drawing to `canvas`, with leaf content going to its
    /// first member.
    #[must_use]
    pub fn new(
        canvas: NWayCanvas<'a>,
        texture_registry: &'a TextureRegistry,
        raster_time: &'a Stopwatch,
        ui_time: &'a Stopwatch,
    ) -> Self {
        Self {
            canvas,
            leaf_index: 0,
            raster_cache: None,
            view_embedder: None,
            texture_registry,
            raster_time,
            ui_time,
            checkerboard_offscreen_layers: false,
            frame_physical_depth: f64::MAX,
            frame_device_pixel_ratio: 1.0,
            frame_index: 0,
            tracer: Tracer::none(),
            skipped_nodes: 0,
        }
    }

    /// The canvas for transforms, clips, and layers.
    pub fn internal_nodes_canvas(&mut self) -> &mut NWayCanvas<'a> {
        &mut self.canvas
    }

    /// The canvas for leaf content.
    pub fn leaf_nodes_canvas(&mut self) -> &mut dyn Canvas {
        self.canvas.member_or_first(self.leaf_index)
    }

    /// Index of the leaf canvas among the internal canvas's members.
    #[must_use]
    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    /// Redirects leaf content to another member canvas.
    pub fn set_leaf_index(&mut self, index: usize) {
        self.leaf_index = index;
    }

    /// Number of nodes skipped so far this traversal.
    #[must_use]
    pub fn skipped_nodes(&self) -> u32 {
        self.skipped_nodes
    }

    pub(crate) fn note_skip(&mut self, node: NodeId, reason: SkipReason) {
        log::trace!("paint skipped {node:?}: {reason:?}");
        self.skipped_nodes = self.skipped_nodes.saturating_add(1);
        self.tracer.skip(&SkipEvent {
            frame_index: self.frame_index,
            node,
            reason,
        });
    }

    #[cfg_attr(
        not(feature = "trace-rich"),
        expect(unused_variables, reason = "only read by rich tracing")
    )]
    pub(crate) fn note_raster_cache(&mut self, id: u64, hit: bool) {
        #[cfg(feature = "trace-rich")]
        {
            use crate::trace::{CacheEvent, CacheKind, CacheOutcome};
            let event = CacheEvent {
                frame_index: self.frame_index,
                cache: CacheKind::Raster,
                id,
                outcome: if hit { CacheOutcome::Hit } else { CacheOutcome::Miss },
            };
            self.tracer.cache(&event);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RestoreTarget {
    Internal,
    Leaf(usize),
}

/// Restores a canvas of the paint context to its save count at
/// construction when dropped.
pub(crate) struct AutoCanvasRestore<'g, 'a> {
    context: &'g mut PaintContext<'a>,
    target: RestoreTarget,
    restore_to: usize,
}

impl<'g, 'a> AutoCanvasRestore<'g, 'a> {
    /// Guards the internal nodes canvas, saving first if `do_save`.
    pub(crate) fn internal(context: &'g mut PaintContext<'a>, do_save: bool) -> Self {
        let canvas = context.internal_nodes_canvas();
        let restore_to = if do_save {
            canvas.save()
        } else {
            canvas.save_count()
        };
        Self {
            context,
            target: RestoreTarget::Internal,
            restore_to,
        }
    }

    /// Guards the current leaf canvas, saving first if `do_save`.
    pub(crate) fn leaf(context: &'g mut PaintContext<'a>, do_save: bool) -> Self {
        let index = context.leaf_index;
        let canvas = context.leaf_nodes_canvas();
        let restore_to = if do_save {
            canvas.save()
        } else {
            canvas.save_count()
        };
        Self {
            context,
            target: RestoreTarget::Leaf(index),
            restore_to,
        }
    }
}

impl<'a> Deref for AutoCanvasRestore<'_, 'a> {
    type Target = PaintContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for AutoCanvasRestore<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for AutoCanvasRestore<'_, '_> {
    fn drop(&mut self) {
        match self.target {
            RestoreTarget::Internal => self.context.canvas.restore_to_count(self.restore_to),
            RestoreTarget::Leaf(index) => self
                .context
                .canvas
                .member_or_first(index)
                .restore_to_count(self.restore_to),
        }
    }
}

/// An offscreen layer on the internal nodes canvas, composited back when
/// dropped.
///
/// With offscreen checkerboarding enabled the layer's bounds are
/// checkerboarded just before it closes.
pub(crate) struct AutoSaveLayer<'g, 'a> {
    context: &'g mut PaintContext<'a>,
    bounds: Rect,
    restore_to: usize,
}

impl<'g, 'a> AutoSaveLayer<'g, 'a> {
    pub(crate) fn new(context: &'g mut PaintContext<'a>, rec: &SaveLayerRec) -> Self {
        let restore_to = context.internal_nodes_canvas().save_layer(rec);
        Self {
            context,
            bounds: rec.bounds.unwrap_or(GIANT_RECT),
            restore_to,
        }
    }
}

impl<'a> Deref for AutoSaveLayer<'_, 'a> {
    type Target = PaintContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.context
    }
}

impl DerefMut for AutoSaveLayer<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.context
    }
}

impl Drop for AutoSaveLayer<'_, '_> {
    fn drop(&mut self) {
        if self.context.checkerboard_offscreen_layers && !geometry::is_empty(&self.bounds) {
            checkerboard::draw_checkerboard(&mut self.context.canvas, self.bounds);
        }
        self.context.canvas.restore_to_count(self.restore_to);
    }
}
