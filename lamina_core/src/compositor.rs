// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame lifecycle on the raster side.
//!
//! A [`CompositorContext`] owns everything that outlives a single frame: the
//! raster and UI stopwatches, the raster cache, and the texture registry.
//! Each frame is drawn through a [`ScopedFrame`] acquired from it, which
//! borrows the frame's output canvas and optional collaborators and ends the
//! frame when dropped.
//!
//! ```rust,ignore
//! let mut frame = compositor
//!     .acquire_frame(&mut surface_canvas, Affine::IDENTITY, true)
//!     .with_view_embedder(&mut embedder)
//!     .with_overlays(overlay_canvases);
//! match frame.raster(&tree, false) {
//!     RasterStatus::Success => {}
//!     RasterStatus::Resubmit => resubmit(tree),
//!     RasterStatus::Failed => log::warn!("frame dropped"),
//! }
//! // Dropping the frame sweeps the raster cache and stops the raster clock.
//! ```

use core::fmt;

use kurbo::{Affine, Point, Rect};

use crate::canvas::{Canvas, NWayCanvas};
use crate::context::{PaintContext, PrerollContext};
use crate::embedder::{ExternalViewEmbedder, PostPrerollResult};
use crate::instrumentation::Stopwatch;
use crate::layer_tree::{LayerTree, LayerTreeSettings};
use crate::paint::{BlendMode, Color, Paint, SaveLayerRec};
use crate::raster_cache::{RasterCache, RasterCacheConfig};
use crate::system_composite::SystemCompositor;
use crate::texture::TextureRegistry;
use crate::time::{self, Duration, HostTime, Timebase};
use crate::trace::{FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, Tracer};
#[cfg(feature = "trace-rich")]
use {
    crate::id::NodeId,
    crate::node::Node,
    crate::raster_cache::NodeCacheKey,
    crate::system_composite::FrameSpec,
    crate::trace::{CacheEvent, CacheKind, CacheOutcome},
    std::sync::Arc,
};

/// Outcome of rasterizing one tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterStatus {
    /// The frame was drawn.
    Success,
    /// The embedder asked for the same tree to be rasterized again.
    Resubmit,
    /// Nothing could be drawn.
    Failed,
}

/// State shared by every frame drawn by one rasterizer.
pub struct CompositorContext {
    raster_time: Stopwatch,
    ui_time: Stopwatch,
    raster_cache: RasterCache,
    texture_registry: TextureRegistry,
    frame_count: u64,
    clock: fn() -> HostTime,
}

impl fmt::Debug for CompositorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorContext")
            .field("raster_time", &self.raster_time.last_lap())
            .field("ui_time", &self.ui_time.last_lap())
            .field("raster_cache", &self.raster_cache)
            .field("texture_registry", &self.texture_registry)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl CompositorContext {
    /// Creates a context timed by the process monotonic clock.
    #[must_use]
    pub fn new(frame_budget: Duration) -> Self {
        Self::with_clock(frame_budget, Timebase::NANOS, time::now)
    }

    /// Creates a context timed by `clock`, whose ticks convert to
    /// nanoseconds with `timebase`.
    #[must_use]
    pub fn with_clock(frame_budget: Duration, timebase: Timebase, clock: fn() -> HostTime) -> Self {
        Self {
            raster_time: Stopwatch::new(frame_budget, timebase),
            ui_time: Stopwatch::new(frame_budget, timebase),
            raster_cache: RasterCache::new(RasterCacheConfig::default()),
            texture_registry: TextureRegistry::new(),
            frame_count: 0,
            clock,
        }
    }

    /// Replaces the raster cache with an empty one using `config`.
    #[must_use]
    pub fn with_raster_cache_config(mut self, config: RasterCacheConfig) -> Self {
        self.raster_cache = RasterCache::new(config);
        self
    }

    /// Raster thread frame times.
    #[must_use]
    pub fn raster_time(&self) -> &Stopwatch {
        &self.raster_time
    }

    /// UI thread frame times.
    #[must_use]
    pub fn ui_time(&self) -> &Stopwatch {
        &self.ui_time
    }

    /// The picture raster cache.
    #[must_use]
    pub fn raster_cache(&self) -> &RasterCache {
        &self.raster_cache
    }

    /// Textures available to texture nodes.
    #[must_use]
    pub fn texture_registry(&self) -> &TextureRegistry {
        &self.texture_registry
    }

    /// Mutable access to the texture registry.
    pub fn texture_registry_mut(&mut self) -> &mut TextureRegistry {
        &mut self.texture_registry
    }

    /// Number of frames acquired so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The drawing backend is available again.
    pub fn on_context_created(&mut self) {
        self.texture_registry.on_context_created();
    }

    /// The drawing backend went away. Cached images are dropped.
    pub fn on_context_destroyed(&mut self) {
        self.texture_registry.on_context_destroyed();
        self.raster_cache.clear();
    }

    /// Starts a frame drawing to `canvas`.
    ///
    /// `root_surface_transformation` maps the tree's root space to the
    /// surface. With `instrumentation_enabled` the frame is timed on the
    /// raster stopwatch.
    pub fn acquire_frame<'a>(
        &'a mut self,
        canvas: &'a mut dyn Canvas,
        root_surface_transformation: Affine,
        instrumentation_enabled: bool,
    ) -> ScopedFrame<'a> {
        self.frame_count += 1;
        let frame_index = self.frame_count;
        let started_at = (self.clock)();
        if instrumentation_enabled {
            self.raster_time.start(started_at);
        }
        log::trace!("begin frame {frame_index}");
        ScopedFrame {
            context: self,
            canvas,
            overlays: Vec::new(),
            view_embedder: None,
            system_compositor: None,
            root_surface_transformation,
            instrumentation_enabled,
            surface_supports_readback: true,
            tracing_threshold: 0,
            frame_index,
            tracer: Tracer::none(),
            summary: FrameSummaryBuilder::new(frame_index, started_at),
        }
    }
}

/// One frame in flight.
///
/// Dropping the frame ends it: unused raster cache entries are swept, the
/// raster stopwatch is stopped, and the frame summary goes to the tracer.
pub struct ScopedFrame<'a> {
    context: &'a mut CompositorContext,
    canvas: &'a mut dyn Canvas,
    overlays: Vec<&'a mut dyn Canvas>,
    view_embedder: Option<&'a mut dyn ExternalViewEmbedder>,
    system_compositor: Option<&'a mut dyn SystemCompositor>,
    root_surface_transformation: Affine,
    instrumentation_enabled: bool,
    surface_supports_readback: bool,
    tracing_threshold: u32,
    frame_index: u64,
    tracer: Tracer<'a>,
    summary: FrameSummaryBuilder,
}

impl fmt::Debug for ScopedFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedFrame")
            .field("frame_index", &self.frame_index)
            .field("overlays", &self.overlays.len())
            .field("view_embedder", &self.view_embedder.is_some())
            .field("system_compositor", &self.system_compositor.is_some())
            .field("root_surface_transformation", &self.root_surface_transformation)
            .field("instrumentation_enabled", &self.instrumentation_enabled)
            .field("surface_supports_readback", &self.surface_supports_readback)
            .finish_non_exhaustive()
    }
}

impl<'a> ScopedFrame<'a> {
    /// Adds overlay canvases for content drawn above platform views.
    ///
    /// Overlay indices returned by the view embedder refer to this list.
    #[must_use]
    pub fn with_overlays(mut self, overlays: Vec<&'a mut dyn Canvas>) -> Self {
        self.overlays = overlays;
        self
    }

    /// Attaches the platform view embedder.
    #[must_use]
    pub fn with_view_embedder(mut self, embedder: &'a mut dyn ExternalViewEmbedder) -> Self {
        self.view_embedder = Some(embedder);
        self
    }

    /// Attaches a native compositor for elevated subtrees.
    #[must_use]
    pub fn with_system_compositor(mut self, compositor: &'a mut dyn SystemCompositor) -> Self {
        self.system_compositor = Some(compositor);
        self
    }

    /// Sends trace events for this frame to `sink`.
    #[must_use]
    pub fn with_tracer(mut self, sink: &'a mut dyn TraceSink) -> Self {
        self.tracer = Tracer::new(sink);
        self
    }

    /// Declares whether the surface can be read back while drawing.
    #[must_use]
    pub fn with_surface_readback(mut self, supported: bool) -> Self {
        self.surface_supports_readback = supported;
        self
    }

    /// Frame counter of this frame.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Transform from the tree's root space to the surface.
    #[must_use]
    pub fn root_surface_transformation(&self) -> Affine {
        self.root_surface_transformation
    }

    /// Whether the surface can be read back while drawing.
    #[must_use]
    pub fn surface_supports_readback(&self) -> bool {
        self.surface_supports_readback
    }

    /// Prerolls and paints `tree`.
    ///
    /// The embedder gets to look at the prerolled frame before anything is
    /// drawn and may ask for a resubmit. When the tree reads back from a
    /// surface that cannot be read, the whole frame is drawn into a layer.
    pub fn raster(&mut self, tree: &LayerTree, ignore_raster_cache: bool) -> RasterStatus {
        let frame_size = tree.frame_size();
        if !(frame_size.width > 0.0 && frame_size.height > 0.0) {
            log::error!("cannot rasterize a frame of size {frame_size:?}");
            return RasterStatus::Failed;
        }
        self.tracing_threshold = tree.settings().rasterizer_tracing_threshold;
        self.context.ui_time.set_lap_time(tree.build_time());

        if let Some(embedder) = self.view_embedder.as_deref_mut() {
            embedder.begin_frame(frame_size);
        }
        let root_needs_readback = tree.preroll(self, ignore_raster_cache);
        let needs_save_layer = root_needs_readback && !self.surface_supports_readback;

        let post_preroll = self
            .view_embedder
            .as_deref_mut()
            .map_or(PostPrerollResult::Success, |embedder| embedder.post_preroll_action());
        if post_preroll == PostPrerollResult::ResubmitFrame {
            log::debug!("frame {} resubmitted", self.frame_index);
            self.summary.set_resubmitted(true);
            return RasterStatus::Resubmit;
        }

        if needs_save_layer {
            log::info!("Using SaveLayer to protect non-readback surface");
            let bounds = Rect::from_origin_size(Point::ZERO, frame_size);
            let paint = Paint {
                blend_mode: BlendMode::Src,
                ..Paint::default()
            };
            self.canvas.save_layer(&SaveLayerRec::new(bounds, Some(paint)));
        }
        self.canvas.clear(Color::TRANSPARENT);
        tree.paint(self, ignore_raster_cache);
        if needs_save_layer {
            self.canvas.restore();
        }

        if let Some(embedder) = self.view_embedder.as_deref_mut() {
            embedder.submit_frame();
        }
        RasterStatus::Success
    }

    /// Paints `tree` again from its last Preroll, without prerolling.
    pub fn redraw(&mut self, tree: &LayerTree) -> RasterStatus {
        if !tree.root().needs_painting() {
            log::debug!("redraw of a tree with nothing to paint");
            return RasterStatus::Failed;
        }
        self.canvas.clear(Color::TRANSPARENT);
        tree.paint(self, false);
        RasterStatus::Success
    }

    /// Describes `tree` to the attached system compositor.
    ///
    /// Returns `false` if no system compositor is attached.
    pub fn update_scene(&mut self, tree: &LayerTree) -> bool {
        if self.system_compositor.is_none() {
            return false;
        }
        self.phase_begin(PhaseKind::UpdateScene);
        if let Some(compositor) = self.system_compositor.as_deref_mut() {
            #[cfg(feature = "trace-rich")]
            {
                let mut tracing = TracingCompositor {
                    inner: compositor,
                    tracer: self.tracer.reborrow(),
                    frame_index: self.frame_index,
                };
                tree.update_scene(&mut tracing);
            }
            #[cfg(not(feature = "trace-rich"))]
            tree.update_scene(compositor);
        }
        self.phase_end(PhaseKind::UpdateScene, 0);
        true
    }

    pub(crate) fn set_checkerboard_raster_cache_images(&mut self, checkerboard: bool) {
        self.context.raster_cache.set_checkerboard_images(checkerboard);
    }

    pub(crate) fn phase_begin(&mut self, phase: PhaseKind) {
        let timestamp = (self.context.clock)();
        self.summary.phase_begin(phase, timestamp);
        let event = PhaseBeginEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        };
        self.tracer.phase_begin(&event);
    }

    pub(crate) fn phase_end(&mut self, phase: PhaseKind, skipped_nodes: u32) {
        let timestamp = (self.context.clock)();
        self.summary.phase_end(phase, timestamp);
        self.summary.add_skipped(skipped_nodes);
        let event = PhaseEndEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        };
        self.tracer.phase_end(&event);
    }

    pub(crate) fn preroll_context(
        &mut self,
        ignore_raster_cache: bool,
        settings: &LayerTreeSettings,
    ) -> PrerollContext<'_> {
        let context = &mut *self.context;
        let mut preroll = PrerollContext::new(&context.raster_time, &context.ui_time, &context.texture_registry);
        if !ignore_raster_cache {
            preroll.raster_cache = Some(&mut context.raster_cache);
        }
        if let Some(embedder) = self.view_embedder.as_deref_mut() {
            let embedder: &mut dyn ExternalViewEmbedder = embedder;
            preroll.view_embedder = Some(embedder);
        }
        if let Some(compositor) = self.system_compositor.as_deref() {
            let compositor: &dyn SystemCompositor = compositor;
            preroll.system_compositor = Some(compositor);
        }
        preroll.checkerboard_offscreen_layers = settings.checkerboard_offscreen_layers;
        preroll.frame_physical_depth = settings.frame_physical_depth;
        preroll.frame_device_pixel_ratio = settings.device_pixel_ratio;
        preroll.frame_index = self.frame_index;
        preroll.tracer = self.tracer.reborrow();
        preroll
    }

    pub(crate) fn paint_context(
        &mut self,
        ignore_raster_cache: bool,
        settings: &LayerTreeSettings,
    ) -> PaintContext<'_> {
        let mut canvas = NWayCanvas::new();
        canvas.add_canvas(&mut *self.canvas);
        for overlay in &mut self.overlays {
            canvas.add_canvas(&mut **overlay);
        }

        let context = &*self.context;
        let mut paint = PaintContext::new(canvas, &context.texture_registry, &context.raster_time, &context.ui_time);
        if !ignore_raster_cache {
            paint.raster_cache = Some(&context.raster_cache);
        }
        if let Some(embedder) = self.view_embedder.as_deref_mut() {
            let embedder: &mut dyn ExternalViewEmbedder = embedder;
            paint.view_embedder = Some(embedder);
        }
        paint.checkerboard_offscreen_layers = settings.checkerboard_offscreen_layers;
        paint.frame_physical_depth = settings.frame_physical_depth;
        paint.frame_device_pixel_ratio = settings.device_pixel_ratio;
        paint.frame_index = self.frame_index;
        paint.tracer = self.tracer.reborrow();
        paint
    }
}

/// Reports retained node hits and misses while forwarding to the real
/// compositor.
#[cfg(feature = "trace-rich")]
struct TracingCompositor<'c, 't> {
    inner: &'c mut dyn SystemCompositor,
    tracer: Tracer<'t>,
    frame_index: u64,
}

#[cfg(feature = "trace-rich")]
impl TracingCompositor<'_, '_> {
    fn note(&mut self, node: NodeId, outcome: CacheOutcome) {
        let event = CacheEvent {
            frame_index: self.frame_index,
            cache: CacheKind::Retained,
            id: node.get(),
            outcome,
        };
        self.tracer.cache(&event);
    }
}

#[cfg(feature = "trace-rich")]
impl SystemCompositor for TracingCompositor<'_, '_> {
    fn can_system_composite(&self) -> bool {
        self.inner.can_system_composite()
    }

    fn transform(&self) -> Affine {
        self.inner.transform()
    }

    fn has_retained_node(&self, key: &NodeCacheKey) -> bool {
        self.inner.has_retained_node(key)
    }

    fn attach_retained_node(&mut self, key: &NodeCacheKey) {
        self.note(key.id(), CacheOutcome::Hit);
        self.inner.attach_retained_node(key);
    }

    fn push_transform(&mut self, transform: Affine) {
        self.inner.push_transform(transform);
    }

    fn push_opacity(&mut self, alpha: u8) {
        self.inner.push_opacity(alpha);
    }

    fn push_clip(&mut self, rect: Rect) {
        self.inner.push_clip(rect);
    }

    fn push_frame(&mut self, frame: FrameSpec) {
        // Frames for a node are only built when no retained one was found.
        if let Some(node) = frame.node {
            self.note(node, CacheOutcome::Miss);
        }
        self.inner.push_frame(frame);
    }

    fn add_paint_node(&mut self, node: &Arc<Node>) {
        self.inner.add_paint_node(node);
    }

    fn pop(&mut self) {
        self.inner.pop();
    }
}

impl Drop for ScopedFrame<'_> {
    fn drop(&mut self) {
        self.context.raster_cache.sweep_after_frame();
        if self.instrumentation_enabled {
            self.context.raster_time.stop((self.context.clock)());
            let lap = self.context.raster_time.last_lap();
            let budget = self.context.raster_time.frame_budget();
            let threshold = u64::from(self.tracing_threshold);
            if threshold != 0 && lap.ticks() > budget.ticks().saturating_mul(threshold) {
                log::warn!(
                    "frame {} took {:.1} ms to rasterize, over {} frame intervals",
                    self.frame_index,
                    lap.to_millis_f64(self.context.raster_time.timebase()),
                    self.tracing_threshold,
                );
            }
        }
        let summary = core::mem::replace(
            &mut self.summary,
            FrameSummaryBuilder::new(self.frame_index, HostTime::default()),
        )
        .finish();
        self.tracer.frame_summary(&summary);
        log::trace!("end frame {}", self.frame_index);
    }
}
