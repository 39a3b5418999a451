//! Scene providers
//!
//! - `memory`: hand-authored scene descriptions (TOML/JSON)
//! - `gltf_scene`: glTF/GLB documents

pub mod gltf_scene;
mod interpolate;
pub mod memory;

pub use gltf_scene::GltfScene;
pub use memory::{MemoryScene, SceneDescription, SceneError};

use anyhow::{Result, bail};
use std::path::Path;

/// A scene loaded from disk, dispatched on the input's extension
pub enum LoadedScene {
    Memory(MemoryScene),
    Gltf(Box<GltfScene>),
}

impl LoadedScene {
    /// Load `.gltf`/`.glb` through the glTF provider, `.toml`/`.json` as a scene description
    pub fn load(path: &Path, frame_rate: f32) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "gltf" | "glb" => Ok(Self::Gltf(Box::new(GltfScene::load(path, frame_rate)?))),
            "toml" | "json" => Ok(Self::Memory(MemoryScene::load(path)?)),
            _ => bail!(
                "Unsupported input format: {:?} (expected .gltf, .glb, .toml or .json)",
                path
            ),
        }
    }
}
