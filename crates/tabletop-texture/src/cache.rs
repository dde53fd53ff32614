//! Bounded texture cache with FIFO eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tabletop_core::{Direction, MaterialId};

use crate::texture::Texture;

/// Default number of cached textures.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Cache key. Static materials ignore frame and direction so one entry
/// serves every frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Static {
        material: MaterialId,
        size: u32,
    },
    Animated {
        material: MaterialId,
        size: u32,
        frame: u32,
        direction: Option<Direction>,
    },
}

impl TextureKey {
    pub fn material(&self) -> &str {
        match self {
            TextureKey::Static { material, .. } | TextureKey::Animated { material, .. } => material,
        }
    }
}

/// Insertion-ordered map of shared textures. When full, the oldest quarter
/// of the entries is dropped before inserting.
#[derive(Debug)]
pub struct TextureCache {
    capacity: usize,
    entries: HashMap<TextureKey, Arc<Texture>>,
    order: VecDeque<TextureKey>,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TextureCache {
    /// A cache holding at most `capacity` textures (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &TextureKey) -> Option<Arc<Texture>> {
        self.entries.get(key).cloned()
    }

    /// Store a finished texture and return the shared handle.
    pub fn insert(&mut self, key: TextureKey, texture: Texture) -> Arc<Texture> {
        let texture = Arc::new(texture);
        if self.entries.contains_key(&key) {
            self.entries.insert(key, Arc::clone(&texture));
            return texture;
        }
        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, Arc::clone(&texture));
        texture
    }

    fn evict(&mut self) {
        let n = self.capacity.div_ceil(4);
        for _ in 0..n {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&key);
        }
        log::debug!("texture cache full, evicted {n} oldest entries");
    }

    /// Drop every entry belonging to `material`. Returns how many went.
    pub fn invalidate(&mut self, material: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.material() != material);
        self.order.retain(|k| k.material() != material);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(material: &str, frame: u32) -> TextureKey {
        TextureKey::Animated {
            material: material.into(),
            size: 8,
            frame,
            direction: None,
        }
    }

    #[test]
    fn evicts_oldest_quarter() {
        let mut cache = TextureCache::new(8);
        for f in 0..8 {
            cache.insert(key("water", f), Texture::fallback(1));
        }
        assert_eq!(cache.len(), 8);
        cache.insert(key("water", 8), Texture::fallback(1));
        assert_eq!(cache.len(), 7);
        assert!(cache.get(&key("water", 0)).is_none());
        assert!(cache.get(&key("water", 1)).is_none());
        assert!(cache.get(&key("water", 2)).is_some());
        assert!(cache.get(&key("water", 8)).is_some());
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut cache = TextureCache::new(10);
        for f in 0..100 {
            cache.insert(key("fire", f), Texture::fallback(1));
            assert!(cache.len() <= 10);
        }
    }

    #[test]
    fn invalidate_is_per_material() {
        let mut cache = TextureCache::new(16);
        cache.insert(key("water", 0), Texture::fallback(1));
        cache.insert(key("water", 1), Texture::fallback(1));
        cache.insert(
            TextureKey::Static { material: "grass".into(), size: 8 },
            Texture::fallback(1),
        );
        assert_eq!(cache.invalidate("water"), 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_does_not_duplicate() {
        let mut cache = TextureCache::new(2);
        cache.insert(key("a", 0), Texture::fallback(1));
        cache.insert(key("a", 0), Texture::fallback(2));
        cache.insert(key("a", 1), Texture::fallback(1));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key("a", 0)).unwrap().image.width(), 2);
    }
}
