// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`SystemCompositor`] that builds a native scene [`Session`].
//!
//! Every frame the context rebuilds the session under its root entity,
//! except for frames retained from earlier frames, which are moved back into
//! place instead. Frames with canvas content get an offscreen surface from
//! the [`SurfaceProducer`]; the content is painted by
//! [`execute_paint_tasks`](SceneUpdateContext::execute_paint_tasks) once the
//! update is done.
//!
//! ```rust,ignore
//! scene.begin_frame();
//! let mut frame = compositor
//!     .acquire_frame(&mut canvas, Affine::IDENTITY, false)
//!     .with_system_compositor(&mut scene);
//! tree.preroll(&mut frame, false);
//! frame.update_scene(&tree);
//! drop(frame);
//! let surfaces = scene.execute_paint_tasks(&compositor);
//! scene.end_frame();
//! ```

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Affine, Rect};
use lamina_core::canvas::{Canvas, NWayCanvas};
use lamina_core::compositor::CompositorContext;
use lamina_core::context::PaintContext;
use lamina_core::geometry;
use lamina_core::node::Node;
use lamina_core::paint::Color;
use lamina_core::raster_cache::NodeCacheKey;
use lamina_core::system_composite::{FrameSpec, SystemCompositor};

use crate::session::{Material, RoundedRectangle, SceneNodeId, SceneNodeKind, Session};
use crate::surface::{PhysicalSize, ProducedSurface, SurfaceProducer};
use crate::transform::Transform3d;

/// A frame scope waiting for its pop.
#[derive(Debug)]
struct FrameScope {
    shape: SceneNodeId,
    spec: FrameSpec,
    key: Option<NodeCacheKey>,
    scale: (f64, f64),
    opacity: f64,
    paint_bounds: Rect,
    paint_nodes: Vec<Arc<Node>>,
}

#[derive(Debug)]
struct Scope {
    entity: SceneNodeId,
    saved_transform: Affine,
    saved_opacity: f64,
    frame: Option<FrameScope>,
}

#[derive(Clone, Copy, Debug)]
struct RetainedEntry {
    entity: SceneNodeId,
    used_this_frame: bool,
}

/// Canvas content to draw into a frame's surface.
#[derive(Debug)]
struct PaintTask<S> {
    surface: S,
    scale: (f64, f64),
    origin: (f64, f64),
    background: Color,
    nodes: Vec<Arc<Node>>,
}

/// Builds native scene nodes from a layer tree's scene update.
pub struct SceneUpdateContext<P: SurfaceProducer> {
    session: Session,
    surface_producer: P,
    root: SceneNodeId,
    scopes: Vec<Scope>,
    transform: Affine,
    opacity: f64,
    pixel_scale: (f64, f64),
    retained: HashMap<NodeCacheKey, RetainedEntry>,
    paint_tasks: Vec<PaintTask<P::Surface>>,
}

impl<P: SurfaceProducer> fmt::Debug for SceneUpdateContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneUpdateContext")
            .field("session", &self.session)
            .field("root", &self.root)
            .field("scopes", &self.scopes.len())
            .field("transform", &self.transform)
            .field("opacity", &self.opacity)
            .field("pixel_scale", &self.pixel_scale)
            .field("retained", &self.retained.len())
            .field("paint_tasks", &self.paint_tasks.len())
            .finish_non_exhaustive()
    }
}

impl<P: SurfaceProducer> SceneUpdateContext<P> {
    /// Creates a context with an empty session.
    #[must_use]
    pub fn new(surface_producer: P) -> Self {
        let mut session = Session::new();
        let root = session.create(SceneNodeKind::Entity);
        Self {
            session,
            surface_producer,
            root,
            scopes: Vec::new(),
            transform: Affine::IDENTITY,
            opacity: 1.0,
            pixel_scale: (1.0, 1.0),
            retained: HashMap::new(),
            paint_tasks: Vec::new(),
        }
    }

    /// Sets the physical pixels per unit of the root entity.
    ///
    /// Surface sizes are frame sizes times this scale times the scale of the
    /// open transform scopes.
    pub fn set_pixel_scale(&mut self, scale_x: f64, scale_y: f64) {
        self.pixel_scale = (scale_x, scale_y);
    }

    /// The native node tree.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Entity every frame's nodes hang off.
    #[must_use]
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    /// The surface allocator.
    #[must_use]
    pub fn surface_producer(&self) -> &P {
        &self.surface_producer
    }

    /// Number of retained frames.
    #[must_use]
    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }

    /// Number of surfaces waiting to be painted.
    #[must_use]
    pub fn pending_paint_tasks(&self) -> usize {
        self.paint_tasks.len()
    }

    /// Clears the previous frame's nodes, keeping retained frames aside.
    pub fn begin_frame(&mut self) {
        if !self.scopes.is_empty() {
            log::warn!("{} scene scopes were left open", self.scopes.len());
            self.scopes.clear();
        }
        let retained: Vec<SceneNodeId> = self
            .retained
            .values()
            .map(|entry| entry.entity)
            .filter(|&entity| self.session.is_alive(entity))
            .collect();
        for &entity in &retained {
            if !self.has_retained_ancestor(entity, &retained) {
                self.session.detach(entity);
            }
        }
        self.session.release_children(self.root);
        for entry in self.retained.values_mut() {
            entry.used_this_frame = false;
        }
        self.transform = Affine::IDENTITY;
        self.opacity = 1.0;
        self.paint_tasks.clear();
    }

    /// Releases retained frames that were not used this frame.
    ///
    /// Returns the number of frames released.
    pub fn end_frame(&mut self) -> usize {
        let Self {
            session,
            retained,
            root,
            ..
        } = self;
        let mut released = 0;
        retained.retain(|key, entry| {
            if !session.is_alive(entry.entity) {
                return false;
            }
            if entry.used_this_frame || is_attached(session, *root, entry.entity) {
                return true;
            }
            log::trace!("releasing retained frame for {:?}", key.id());
            session.release(entry.entity);
            released += 1;
            false
        });
        released
    }

    /// Paints every queued frame content into its surface.
    ///
    /// Returns the painted surfaces, ready to be presented.
    pub fn execute_paint_tasks(&mut self, compositor: &CompositorContext) -> Vec<P::Surface> {
        let tasks = core::mem::take(&mut self.paint_tasks);
        let mut surfaces = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            {
                let mut canvas = NWayCanvas::new();
                canvas.add_canvas(task.surface.canvas());
                let mut context = PaintContext::new(
                    canvas,
                    compositor.texture_registry(),
                    compositor.raster_time(),
                    compositor.ui_time(),
                );
                context.raster_cache = Some(compositor.raster_cache());
                let canvas = context.internal_nodes_canvas();
                canvas.restore_to_count(1);
                canvas.save();
                canvas.clear(task.background);
                canvas.concat(Affine::scale_non_uniform(task.scale.0, task.scale.1));
                canvas.translate(-task.origin.0, -task.origin.1);
                for node in &task.nodes {
                    node.paint(&mut context);
                }
                context.internal_nodes_canvas().restore_to_count(1);
            }
            surfaces.push(task.surface);
        }
        surfaces
    }

    fn container(&self) -> SceneNodeId {
        self.scopes.last().map_or(self.root, |scope| scope.entity)
    }

    fn has_retained_ancestor(&self, entity: SceneNodeId, retained: &[SceneNodeId]) -> bool {
        let mut current = self.session.parent(entity);
        while let Some(parent) = current {
            if retained.contains(&parent) {
                return true;
            }
            current = self.session.parent(parent);
        }
        false
    }

    fn push_entity(&mut self, kind: SceneNodeKind, frame: Option<FrameScope>) -> SceneNodeId {
        let entity = self.session.create(kind);
        self.session.add_child(self.container(), entity);
        self.scopes.push(Scope {
            entity,
            saved_transform: self.transform,
            saved_opacity: self.opacity,
            frame,
        });
        entity
    }

    fn create_frame(&mut self, entity: SceneNodeId, frame: FrameScope) -> Option<NodeCacheKey> {
        let rect = frame.spec.rrect.rect();
        if !(rect.width().is_finite() && rect.height().is_finite()) {
            log::error!("invalid rounded rectangle for frame: {rect:?}");
            return frame.key;
        }
        if geometry::is_empty(&rect) {
            return frame.key;
        }

        self.session.set_clip(entity, rect);
        self.session.set_shape(
            frame.shape,
            RoundedRectangle {
                width: rect.width(),
                height: rect.height(),
                radii: frame.spec.rrect.radii(),
            },
        );
        let center = rect.center();
        self.session.set_translation(frame.shape, [center.x, center.y, 0.0]);

        let mut paint_nodes = frame.paint_nodes;
        if !geometry::intersects(&frame.paint_bounds, &rect) {
            paint_nodes.clear();
        }
        let color = frame.spec.color;
        if paint_nodes.is_empty() {
            self.set_solid_material(frame.shape, color, frame.opacity);
            return frame.key;
        }

        let scale_x = frame.scale.0 * self.pixel_scale.0;
        let scale_y = frame.scale.1 * self.pixel_scale.1;
        let size = PhysicalSize::new(pixels(rect.width() * scale_x), pixels(rect.height() * scale_y));
        match self.surface_producer.produce_surface(size, frame.key, entity) {
            Ok(surface) => {
                self.session.set_material(
                    frame.shape,
                    Material {
                        color: Color::WHITE.with_alpha(scale_alpha(u8::MAX, frame.opacity)),
                        texture: Some(surface.image()),
                    },
                );
                self.paint_tasks.push(PaintTask {
                    surface,
                    scale: (scale_x, scale_y),
                    origin: (rect.x0, rect.y0),
                    background: color,
                    nodes: paint_nodes,
                });
            }
            Err(err) => {
                log::warn!("frame content dropped: {err}");
                self.set_solid_material(frame.shape, color, frame.opacity);
            }
        }
        frame.key
    }

    fn set_solid_material(&mut self, shape: SceneNodeId, color: Color, opacity: f64) {
        let alpha = scale_alpha(color.alpha(), opacity);
        if alpha == 0 {
            return;
        }
        self.session.set_material(
            shape,
            Material {
                color: color.with_alpha(alpha),
                texture: None,
            },
        );
    }
}

fn is_attached(session: &Session, root: SceneNodeId, entity: SceneNodeId) -> bool {
    let mut current = Some(entity);
    while let Some(node) = current {
        if node == root {
            return true;
        }
        current = session.parent(node);
    }
    false
}

#[expect(clippy::cast_possible_truncation, reason = "clamped to the u8 range")]
fn scale_alpha(alpha: u8, opacity: f64) -> u8 {
    (f64::from(alpha) * opacity).round().clamp(0.0, 255.0) as u8
}

/// Rounds a non-negative pixel extent up to a whole pixel count.
#[expect(clippy::cast_possible_truncation, reason = "clamped to the u32 range")]
fn pixels(extent: f64) -> u32 {
    extent.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

impl<P: SurfaceProducer> SystemCompositor for SceneUpdateContext<P> {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn has_retained_node(&self, key: &NodeCacheKey) -> bool {
        self.retained
            .get(key)
            .is_some_and(|entry| !entry.used_this_frame && self.session.is_alive(entry.entity))
    }

    fn attach_retained_node(&mut self, key: &NodeCacheKey) {
        let container = self.container();
        let Some(entry) = self.retained.get_mut(key) else {
            log::debug!("no retained frame for {:?}", key.id());
            return;
        };
        entry.used_this_frame = true;
        let entity = entry.entity;
        self.session.detach(entity);
        self.session.add_child(container, entity);
    }

    fn push_transform(&mut self, transform: Affine) {
        let entity = self.push_entity(SceneNodeKind::Entity, None);
        if transform != Affine::IDENTITY {
            match Transform3d::from_affine(transform).decompose() {
                Some(parts) => self.session.set_decomposition(entity, &parts),
                None => log::debug!("transform {transform:?} does not decompose"),
            }
        }
        self.transform = self.transform * transform;
    }

    fn push_opacity(&mut self, alpha: u8) {
        self.push_entity(SceneNodeKind::Entity, None);
        self.opacity *= f64::from(alpha) / 255.0;
    }

    fn push_clip(&mut self, rect: Rect) {
        let entity = self.push_entity(SceneNodeKind::Entity, None);
        self.session.set_clip(entity, rect);
    }

    fn push_frame(&mut self, frame: FrameSpec) {
        let key = frame.node.map(|id| NodeCacheKey::new(id, self.transform));
        let shape = self.session.create(SceneNodeKind::Shape);
        let elevation = frame.elevation;
        let scope = FrameScope {
            shape,
            spec: frame,
            key,
            scale: geometry::scale_factors(self.transform),
            opacity: self.opacity,
            paint_bounds: geometry::EMPTY_RECT,
            paint_nodes: Vec::new(),
        };
        let entity = self.push_entity(SceneNodeKind::Entity, Some(scope));
        self.session.set_translation(entity, [0.0, 0.0, -elevation]);
        self.session.add_child(entity, shape);
    }

    fn add_paint_node(&mut self, node: &Arc<Node>) {
        let frame = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.frame.as_mut());
        let Some(frame) = frame else {
            log::warn!("paint node {:?} outside of any frame dropped", node.id());
            return;
        };
        geometry::join(&mut frame.paint_bounds, &node.paint_bounds());
        frame.paint_nodes.push(Arc::clone(node));
    }

    fn pop(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            log::debug!("pop with no open scene scope");
            return;
        };
        self.transform = scope.saved_transform;
        self.opacity = scope.saved_opacity;
        let Some(frame) = scope.frame else {
            return;
        };
        let Some(key) = self.create_frame(scope.entity, frame) else {
            return;
        };
        let entry = RetainedEntry {
            entity: scope.entity,
            used_this_frame: true,
        };
        if let Some(old) = self.retained.insert(key, entry) {
            if old.entity != scope.entity
                && self.session.is_alive(old.entity)
                && !is_attached(&self.session, self.root, old.entity)
            {
                self.session.release(old.entity);
            }
        }
    }
}
