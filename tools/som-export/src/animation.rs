//! Animation sampler (NLA strips -> per-frame bone samples)
//!
//! Every strip is sampled at whole frames over its action's frame range.
//! Each frame records the pose of every bone in the global list, not only
//! the bones of the animated object.

use std::ops::Range;

use crate::bones::BoneList;
use crate::data::{AnimationRecord, BoneSample};
use crate::scene::{AnimationStrip, ScenePort};

/// Whole frames sampled for a strip: `floor(start)..floor(end)`
pub fn frame_range(strip: &AnimationStrip) -> Range<i32> {
    (strip.frame_start.floor() as i32)..(strip.frame_end.floor() as i32)
}

/// Move the scene clock to `frame` and sample every bone in the list
///
/// This is the only place the sampler touches the scene clock.
pub fn sample_all_bones_at_frame<S: ScenePort>(
    scene: &mut S,
    frame: i32,
    bones: &BoneList<S::Bone>,
) -> Vec<BoneSample> {
    scene.advance_to(frame);
    bones
        .bones()
        .iter()
        .map(|bone| BoneSample::from_pose(&scene.bone_pose(bone)))
        .collect()
}

/// Sample every strip of every NLA track of `object`, in track order
///
/// Objects without animation data produce no records.
pub fn sample_object<S: ScenePort>(
    scene: &mut S,
    object: &S::Object,
    bones: &BoneList<S::Bone>,
) -> Vec<AnimationRecord> {
    let Some(tracks) = scene.animation_strips(object) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for strip in tracks.into_iter().flatten() {
        scene.bind_action(object, &strip);

        let frames = frame_range(&strip);
        if frames.is_empty() {
            tracing::warn!(
                "Strip '{}' has an empty frame range ({} .. {})",
                strip.action,
                strip.frame_start,
                strip.frame_end
            );
        }

        let mut record = AnimationRecord::new(strip.action.as_str());
        for frame in frames {
            record.push_frame(sample_all_bones_at_frame(scene, frame, bones));
        }

        tracing::debug!(
            "Sampled '{}': {} frames x {} bones",
            record.name,
            record.frame_count,
            bones.len()
        );
        records.push(record);
    }

    records
}
