//! Sources the player assets can be fetched from.

use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use crate::error::{Result, SceneError};

/// Something that can hand out asset bytes by page-relative path.
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

fn relative(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// Assets already held in memory, keyed by file name.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.files.insert(relative(name).to_string(), bytes.into());
    }
}

impl AssetSource for MemoryAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(relative(path))
            .cloned()
            .ok_or_else(|| SceneError::asset_fetch(path, "not found"))
    }
}

/// Assets read from a directory, resolving page-relative paths against it.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for DirAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(relative(path));
        tokio::fs::read(&full)
            .await
            .map_err(|e| SceneError::asset_fetch(path, format!("{}: {e}", full.display())))
    }
}
