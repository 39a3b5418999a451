//! som-export library
//!
//! Flattens a scene (meshes, materials, pose bones, NLA animation) into the
//! SOM text format. The host scene is reached only through [`ScenePort`].

pub mod animation;
pub mod bones;
pub mod data;
pub mod export;
pub mod formats;
pub mod inspect;
pub mod manifest;
pub mod materials;
pub mod mesh;
pub mod providers;
pub mod scene;

pub use bones::{BoneList, BoneMatchPolicy};
pub use data::{AnimationRecord, ExportSummary, SceneData};
pub use export::{export_scene, export_scene_with, export_to_file, write_som_file, ExportOptions};
pub use materials::{MaterialOffsetPolicy, MaterialRegistry};
pub use providers::{GltfScene, LoadedScene, MemoryScene};
pub use scene::{RealizeError, ScenePort};
