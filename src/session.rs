//! Per-session caches owned by the controller: the layer configs from the
//! last import and the live scenes built for mirrored layers.

use std::collections::BTreeMap;

use crate::document::{LayerConfig, LayerKind};
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedLayer {
    pub kind: LayerKind,
    pub config: LayerConfig,
}

pub type LayerCache = BTreeMap<usize, CachedLayer>;
pub type SceneCache = BTreeMap<usize, Scene>;

#[derive(Debug, Default)]
pub struct Session {
    layers: LayerCache,
    scenes: SceneCache,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything recorded by the previous import.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.scenes.clear();
    }

    pub fn record_layer(&mut self, index: usize, kind: LayerKind, config: LayerConfig) {
        self.layers.insert(index, CachedLayer { kind, config });
    }

    pub fn layer(&self, index: usize) -> Option<&CachedLayer> {
        self.layers.get(&index)
    }

    /// Config to export for layer `index`: the cached one if present,
    /// otherwise an empty config for `kind`.
    pub fn config_for(&self, index: usize, kind: &LayerKind) -> LayerConfig {
        match self.layers.get(&index) {
            Some(cached) => cached.config.clone(),
            None => LayerConfig::empty_for(kind),
        }
    }

    pub fn store_scene(&mut self, index: usize, scene: Scene) {
        self.scenes.insert(index, scene);
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(&index)
    }

    pub fn layers(&self) -> &LayerCache {
        &self.layers
    }

    pub fn scenes(&self) -> &SceneCache {
        &self.scenes
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.scenes.is_empty()
    }
}
