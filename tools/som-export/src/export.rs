//! Scene export pass (ScenePort -> SceneData -> .som)
//!
//! One sequential walk over the visible objects: the bone list is frozen
//! first, then every object is realized, its strips sampled and its
//! geometry flattened before the next object starts.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::animation;
use crate::bones::{BoneList, BoneMatchPolicy};
use crate::data::{ExportSummary, SceneData};
use crate::formats::{default_commons, write_som};
use crate::materials::{MaterialOffsetPolicy, MaterialRegistry};
use crate::mesh::{FanTriangulator, Triangulate, flatten_mesh};
use crate::scene::{RealizeError, ScenePort};

/// Exporter name written to the commons header
pub const EXPORTER_NAME: &str = "som-export";

/// Settings for one export pass
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Realize meshes with modifiers applied
    pub apply_modifiers: bool,
    /// Accepted for compatibility; triangulation always runs
    pub triangulate: bool,
    pub bone_match: BoneMatchPolicy,
    pub material_offset: MaterialOffsetPolicy,
    /// Replaces the default commons header
    pub header: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            apply_modifiers: false,
            triangulate: true,
            bone_match: BoneMatchPolicy::Last,
            material_offset: MaterialOffsetPolicy::SlotCount,
            header: None,
        }
    }
}

impl ExportOptions {
    /// Commons header text for the output file
    pub fn commons(&self) -> String {
        self.header
            .clone()
            .unwrap_or_else(|| default_commons(EXPORTER_NAME, env!("CARGO_PKG_VERSION")))
    }
}

/// Walk the scene and collect every SOM record (fan triangulation)
pub fn export_scene<S: ScenePort>(scene: &mut S, options: &ExportOptions) -> SceneData {
    export_scene_with(scene, options, &FanTriangulator)
}

/// Walk the scene and collect every SOM record
pub fn export_scene_with<S, T>(
    scene: &mut S,
    options: &ExportOptions,
    triangulator: &T,
) -> SceneData
where
    S: ScenePort,
    T: Triangulate,
{
    if !options.triangulate {
        tracing::warn!("Triangulation is always performed; ignoring triangulate = false");
    }

    let bones = BoneList::collect(&*scene);
    let mut data = SceneData::new(bones.len());
    let mut registry = MaterialRegistry::new(options.material_offset);

    for object in scene.visible_objects() {
        let name = scene.object_name(&object);
        let mesh = scene.realize_mesh(&object, options.apply_modifiers);

        data.animations
            .extend(animation::sample_object(scene, &object, &bones));

        let mesh = match mesh {
            Ok(mesh) => mesh,
            Err(RealizeError::NoGeometry) => {
                tracing::debug!("'{}' has no geometry", name);
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping geometry of '{}': {}", name, e);
                continue;
            }
        };

        let slots = scene.material_slots(&object);
        let triangles = triangulator.triangulate(&mesh);
        let flattened = flatten_mesh(
            &mut data,
            &mut registry,
            &mesh,
            &triangles,
            &slots,
            &bones,
            options.bone_match,
        );
        data.objects += 1;

        tracing::debug!(
            "Flattened '{}': {} vertices from {}, {} faces, material base {}",
            name,
            flattened.vertex_count,
            flattened.vertex_base,
            flattened.face_count,
            flattened.material_base
        );
    }

    data.materials = registry.into_records();
    data
}

/// Render scene data into a .som file
pub fn write_som_file(output: &Path, data: &SceneData, commons: &str) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);

    write_som(&mut writer, data, commons)
        .with_context(|| format!("Failed to write SOM: {:?}", output))?;

    Ok(())
}

/// Export a scene straight to a .som file
pub fn export_to_file<S: ScenePort>(
    scene: &mut S,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let data = export_scene(scene, options);
    write_som_file(output, &data, &options.commons())?;

    let summary = data.summary();
    tracing::info!(
        "Exported {} objects: {} vertices, {} faces, {} materials, {} bones, {} animations",
        summary.objects,
        summary.vertices,
        summary.faces,
        summary.materials,
        summary.bones,
        summary.animations
    );

    Ok(summary)
}
