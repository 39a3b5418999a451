//! Scene listing for the `inspect` command

use crate::animation::frame_range;
use crate::scene::{AnimationStrip, ScenePort};

/// What the exporter would see of one visible object
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectInfo {
    pub name: String,
    pub bones: Vec<String>,
    /// Strips of every NLA track, in track order; `None` without animation data
    pub strips: Option<Vec<AnimationStrip>>,
}

/// Describe every visible object without realizing meshes or moving the clock
pub fn describe_scene<S: ScenePort>(scene: &S) -> Vec<ObjectInfo> {
    scene
        .visible_objects()
        .iter()
        .map(|object| ObjectInfo {
            name: scene.object_name(object),
            bones: scene
                .pose_bones(object)
                .iter()
                .map(|bone| scene.bone_name(bone))
                .collect(),
            strips: scene
                .animation_strips(object)
                .map(|tracks| tracks.into_iter().flatten().collect()),
        })
        .collect()
}

/// Log a scene description at INFO level
pub fn log_scene(objects: &[ObjectInfo]) {
    if objects.is_empty() {
        tracing::info!("No visible objects");
        return;
    }

    let bone_count: usize = objects.iter().map(|o| o.bones.len()).sum();
    tracing::info!("{} visible objects, {} bones:", objects.len(), bone_count);

    for (i, object) in objects.iter().enumerate() {
        tracing::info!("  [{}] '{}': {} bones", i, object.name, object.bones.len());
        if !object.bones.is_empty() {
            tracing::info!("      bones: {}", object.bones.join(", "));
        }
        for strip in object.strips.iter().flatten() {
            tracing::info!(
                "      strip '{}': {} frames ({} .. {})",
                strip.action,
                frame_range(strip).len(),
                strip.frame_start,
                strip.frame_end
            );
        }
    }
}
