//! som.toml export manifest parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::bones::BoneMatchPolicy;
use crate::export::ExportOptions;
use crate::materials::MaterialOffsetPolicy;
use crate::providers::gltf_scene::DEFAULT_FRAME_RATE;

/// som.toml manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct SomManifest {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub policies: PoliciesSection,
    #[serde(default)]
    pub gltf: GltfSection,
}

/// Export settings section
#[derive(Debug, Deserialize)]
pub struct ExportSection {
    /// Realize meshes with modifiers applied.
    /// Default: false
    #[serde(default)]
    pub apply_modifiers: bool,

    /// Triangulation always runs; `false` only logs a warning.
    /// Default: true
    #[serde(default = "default_triangulate")]
    pub triangulate: bool,

    /// Replaces the default commons block at the top of the file
    pub header: Option<String>,
}

fn default_triangulate() -> bool {
    true
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            apply_modifiers: false,
            triangulate: true,
            header: None,
        }
    }
}

/// Index resolution policies
#[derive(Debug, Default, Deserialize)]
pub struct PoliciesSection {
    /// "last" or "first"
    #[serde(default)]
    pub bone_match: BoneMatchPolicy,
    /// "slot-count" or "record-count"
    #[serde(default)]
    pub material_offset: MaterialOffsetPolicy,
}

/// glTF input section
#[derive(Debug, Deserialize)]
pub struct GltfSection {
    /// Animation sampling rate in frames per second.
    /// Default: 24
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
}

fn default_frame_rate() -> f32 {
    DEFAULT_FRAME_RATE
}

impl Default for GltfSection {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl SomManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content).context("Failed to parse som.toml")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate manifest fields
    pub fn validate(&self) -> Result<()> {
        let frame_rate = self.gltf.frame_rate;
        anyhow::ensure!(
            frame_rate.is_finite() && frame_rate > 0.0,
            "Invalid frame_rate {} in som.toml (must be positive)",
            frame_rate
        );
        Ok(())
    }

    /// Export options described by this manifest
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            apply_modifiers: self.export.apply_modifiers,
            triangulate: self.export.triangulate,
            bone_match: self.policies.bone_match,
            material_offset: self.policies.material_offset,
            header: self.export.header.clone(),
        }
    }
}
