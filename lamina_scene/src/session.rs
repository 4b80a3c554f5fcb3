// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-process model of a native compositor's node tree.
//!
//! A [`Session`] owns every native node created for a scene. Nodes are
//! addressed by generational [`SceneNodeId`] handles: releasing a node bumps
//! its slot's generation, so handles to it stop validating even after the
//! slot is reused.

use core::fmt;

use kurbo::{Rect, RoundedRectRadii};
use lamina_core::paint::Color;

use crate::transform::Decomposition;

/// Handle to a node in a [`Session`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneNodeId {
    idx: u32,
    generation: u32,
}

impl SceneNodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SceneNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneNodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Identity of an image backing a textured material.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u64);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// What a native node does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneNodeKind {
    /// Positions and clips its children.
    Entity,
    /// Draws a filled shape. Has no children.
    Shape,
}

/// A rounded rectangle centered on its node's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundedRectangle {
    /// Full width.
    pub width: f64,
    /// Full height.
    pub height: f64,
    /// Corner radii.
    pub radii: RoundedRectRadii,
}

/// Surface appearance of a shape node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Color, multiplied with the texture when there is one.
    pub color: Color,
    /// Image mapped over the shape.
    pub texture: Option<ImageId>,
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: SceneNodeKind,
    parent: Option<u32>,
    children: Vec<u32>,
    translation: [f64; 3],
    scale: [f64; 3],
    rotation: [f64; 4],
    clip: Option<Rect>,
    shape: Option<RoundedRectangle>,
    material: Option<Material>,
}

impl NodeData {
    fn new(kind: SceneNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            translation: [0.0; 3],
            scale: [1.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            clip: None,
            shape: None,
            material: None,
        }
    }
}

/// Owner of a native node tree.
#[derive(Debug, Default)]
pub struct Session {
    nodes: Vec<NodeData>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Returns `true` if the session has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a node of `kind` with no parent.
    ///
    /// # Panics
    ///
    /// Panics if the session runs out of 32-bit slot indices.
    pub fn create(&mut self, kind: SceneNodeKind) -> SceneNodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.nodes[idx as usize] = NodeData::new(kind);
            idx
        } else {
            let idx = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
            assert!(idx != u32::MAX, "too many scene nodes");
            self.nodes.push(NodeData::new(kind));
            self.generation.push(0);
            idx
        };
        SceneNodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: SceneNodeId) -> bool {
        (id.idx as usize) < self.nodes.len()
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `parent` is a shape, or if
    /// `child` already has a parent.
    pub fn add_child(&mut self, parent: SceneNodeId, child: SceneNodeId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.nodes[parent.idx as usize].kind != SceneNodeKind::Shape,
            "shape nodes cannot have children"
        );
        assert!(
            self.nodes[child.idx as usize].parent.is_none(),
            "child already has a parent"
        );
        self.nodes[child.idx as usize].parent = Some(parent.idx);
        self.nodes[parent.idx as usize].children.push(child.idx);
    }

    /// Removes `id` from its parent, if it has one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach(&mut self, id: SceneNodeId) {
        self.validate(id);
        if let Some(parent) = self.nodes[id.idx as usize].parent.take() {
            self.nodes[parent as usize].children.retain(|&c| c != id.idx);
        }
    }

    /// Detaches and releases `id` and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release(&mut self, id: SceneNodeId) {
        self.detach(id);
        let mut pending = vec![id.idx];
        while let Some(idx) = pending.pop() {
            let node = &mut self.nodes[idx as usize];
            pending.append(&mut node.children);
            node.parent = None;
            self.generation[idx as usize] += 1;
            self.free_list.push(idx);
        }
    }

    /// Releases every child of `id`, keeping `id` itself.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release_children(&mut self, id: SceneNodeId) {
        for child in self.children(id) {
            self.release(child);
        }
    }

    /// The node's kind.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: SceneNodeId) -> SceneNodeKind {
        self.node(id).kind
    }

    /// The node's parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: SceneNodeId) -> Option<SceneNodeId> {
        self.node(id).parent.map(|idx| self.handle(idx))
    }

    /// The node's children, in order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: SceneNodeId) -> Vec<SceneNodeId> {
        self.node(id).children.iter().map(|&idx| self.handle(idx)).collect()
    }

    /// Sets translation, scale, and rotation from `parts`.
    pub fn set_decomposition(&mut self, id: SceneNodeId, parts: &Decomposition) {
        let node = self.node_mut(id);
        node.translation = parts.translation;
        node.scale = parts.scale;
        node.rotation = parts.rotation;
    }

    /// Sets the translation.
    pub fn set_translation(&mut self, id: SceneNodeId, translation: [f64; 3]) {
        self.node_mut(id).translation = translation;
    }

    /// The translation.
    #[must_use]
    pub fn translation(&self, id: SceneNodeId) -> [f64; 3] {
        self.node(id).translation
    }

    /// Sets the scale.
    pub fn set_scale(&mut self, id: SceneNodeId, scale: [f64; 3]) {
        self.node_mut(id).scale = scale;
    }

    /// The scale.
    #[must_use]
    pub fn scale(&self, id: SceneNodeId) -> [f64; 3] {
        self.node(id).scale
    }

    /// The rotation quaternion.
    #[must_use]
    pub fn rotation(&self, id: SceneNodeId) -> [f64; 4] {
        self.node(id).rotation
    }

    /// Clips the node's children to `rect`, in the node's space.
    pub fn set_clip(&mut self, id: SceneNodeId, rect: Rect) {
        self.node_mut(id).clip = Some(rect);
    }

    /// The clip rectangle.
    #[must_use]
    pub fn clip(&self, id: SceneNodeId) -> Option<Rect> {
        self.node(id).clip
    }

    /// Sets the geometry of a shape node.
    pub fn set_shape(&mut self, id: SceneNodeId, shape: RoundedRectangle) {
        self.node_mut(id).shape = Some(shape);
    }

    /// The geometry of a shape node.
    #[must_use]
    pub fn shape(&self, id: SceneNodeId) -> Option<RoundedRectangle> {
        self.node(id).shape
    }

    /// Sets the material of a shape node.
    pub fn set_material(&mut self, id: SceneNodeId, material: Material) {
        self.node_mut(id).material = Some(material);
    }

    /// The material of a shape node.
    #[must_use]
    pub fn material(&self, id: SceneNodeId) -> Option<Material> {
        self.node(id).material
    }

    fn handle(&self, idx: u32) -> SceneNodeId {
        SceneNodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn node(&self, id: SceneNodeId) -> &NodeData {
        self.validate(id);
        &self.nodes[id.idx as usize]
    }

    fn node_mut(&mut self, id: SceneNodeId) -> &mut NodeData {
        self.validate(id);
        &mut self.nodes[id.idx as usize]
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: SceneNodeId) {
        assert!(
            self.is_alive(id),
            "stale SceneNodeId: {id:?} (current gen: {})",
            self.generation.get(id.idx as usize).copied().unwrap_or(u32::MAX)
        );
    }
}
