// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Externally produced image streams (video, camera, platform surfaces).

use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Rect;

use crate::canvas::Canvas;
use crate::id::TextureId;

/// A source of frames drawn by texture nodes.
///
/// Implementations are owned by the platform and shared with the registry.
/// Methods take `&self`; implementations keep any mutable frame state behind
/// their own synchronization.
pub trait Texture: Send + Sync {
    /// Identity under which the texture is registered.
    fn id(&self) -> TextureId;

    /// Draws the current frame scaled into `bounds`.
    ///
    /// When `freeze` is set the texture keeps showing the frame it showed
    /// last, even if a newer one is available.
    fn paint(&self, canvas: &mut dyn Canvas, bounds: Rect, freeze: bool);

    /// The drawing context backing the canvases became available.
    fn on_context_created(&self) {}

    /// The drawing context backing the canvases went away.
    fn on_context_destroyed(&self) {}

    /// A new frame is ready to be drawn.
    fn mark_new_frame_available(&self) {}

    /// The texture was removed from its registry.
    fn on_texture_unregistered(&self) {}
}

/// Textures by id, consulted by texture nodes during Paint.
#[derive(Default)]
pub struct TextureRegistry {
    textures: HashMap<TextureId, Arc<dyn Texture>>,
}

impl core::fmt::Debug for TextureRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut ids: Vec<_> = self.textures.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("TextureRegistry").field("ids", &ids).finish()
    }
}

impl TextureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `texture` under its own id, replacing any previous entry.
    pub fn register(&mut self, texture: Arc<dyn Texture>) {
        self.textures.insert(texture.id(), texture);
    }

    /// Removes the texture with `id` and notifies it.
    pub fn unregister(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.remove(&id) {
            texture.on_texture_unregistered();
        }
    }

    /// Looks up a texture.
    #[must_use]
    pub fn get(&self, id: TextureId) -> Option<&Arc<dyn Texture>> {
        self.textures.get(&id)
    }

    /// Number of registered textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Forwards context creation to every texture.
    pub fn on_context_created(&self) {
        for texture in self.textures.values() {
            texture.on_context_created();
        }
    }

    /// Forwards context loss to every texture.
    pub fn on_context_destroyed(&self) {
        for texture in self.textures.values() {
            texture.on_context_destroyed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTexture {
        id: TextureId,
        unregistered: AtomicUsize,
        contexts: AtomicUsize,
    }

    impl Texture for CountingTexture {
        fn id(&self) -> TextureId {
            self.id
        }

        fn paint(&self, _canvas: &mut dyn Canvas, _bounds: Rect, _freeze: bool) {}

        fn on_context_created(&self) {
            self.contexts.fetch_add(1, Ordering::Relaxed);
        }

        fn on_texture_unregistered(&self) {
            self.unregistered.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn texture(id: i64) -> Arc<CountingTexture> {
        Arc::new(CountingTexture {
            id: TextureId(id),
            unregistered: AtomicUsize::new(0),
            contexts: AtomicUsize::new(0),
        })
    }

    #[test]
    fn register_get_unregister() {
        let mut registry = TextureRegistry::new();
        let t = texture(7);
        registry.register(t.clone());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(TextureId(7)).is_some());
        assert!(registry.get(TextureId(8)).is_none());

        registry.unregister(TextureId(7));
        assert!(registry.is_empty());
        assert_eq!(t.unregistered.load(Ordering::Relaxed), 1);

        registry.unregister(TextureId(7));
        assert_eq!(t.unregistered.load(Ordering::Relaxed), 1, "unknown id is ignored");
    }

    #[test]
    fn context_events_reach_every_texture() {
        let mut registry = TextureRegistry::new();
        let a = texture(1);
        let b = texture(2);
        registry.register(a.clone());
        registry.register(b.clone());
        registry.on_context_created();
        assert_eq!(a.contexts.load(Ordering::Relaxed), 1);
        assert_eq!(b.contexts.load(Ordering::Relaxed), 1);
    }
}
