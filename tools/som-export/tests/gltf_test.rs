//! glTF provider integration tests
//!
//! Writes a small skinned, animated glTF (JSON + external .bin) into a temp
//! directory, loads it through the glTF provider and exports it.

mod common;

use std::path::{Path, PathBuf};

use common::{ParsedSom, parse_som, render};
use serde_json::json;
use som_export::formats::BONE_FIELDS;
use som_export::{ExportOptions, GltfScene, ScenePort, export_scene};
use tempfile::{TempDir, tempdir};

// =============================================================================
// Test asset
// =============================================================================

const POSITIONS: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
const NORMALS: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
const JOINTS: [[u8; 4]; 3] = [[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]];
const WEIGHTS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
    [0.5, 0.5, 0.0, 0.0],
];
const INDICES: [u16; 3] = [0, 1, 2];
const TIMES: [f32; 2] = [0.0, 1.0];
const TRANSLATIONS: [[f32; 3]; 2] = [[0.0, 1.0, 0.0], [0.0, 1.0, 2.0]];
const SCALES: [[f32; 3]; 2] = [[1.0; 3], [3.0; 3]];

fn push_f32s(buffer: &mut Vec<u8>, values: impl IntoIterator<Item = f32>) -> (usize, usize) {
    let offset = buffer.len();
    for v in values {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    (offset, buffer.len() - offset)
}

fn pad4(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

/// Body mesh node skinned to Root -> Arm, with a "Lift" animation moving Arm
///
/// With `second_lift`, a second animation also named "Lift" scales Arm.
fn write_rigged_gltf(dir: &Path, second_lift: bool) -> PathBuf {
    let mut bin = Vec::new();

    let positions = push_f32s(&mut bin, POSITIONS.iter().flatten().copied());
    let normals = push_f32s(&mut bin, NORMALS.iter().flatten().copied());

    let joints_offset = bin.len();
    bin.extend(JOINTS.iter().flatten());
    let joints = (joints_offset, bin.len() - joints_offset);

    let weights = push_f32s(&mut bin, WEIGHTS.iter().flatten().copied());

    let indices_offset = bin.len();
    for i in INDICES {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    let indices = (indices_offset, bin.len() - indices_offset);
    pad4(&mut bin);

    let times = push_f32s(&mut bin, TIMES);
    let translations = push_f32s(&mut bin, TRANSLATIONS.iter().flatten().copied());
    let scales = push_f32s(&mut bin, SCALES.iter().flatten().copied());

    let views: Vec<_> = [
        positions,
        normals,
        joints,
        weights,
        indices,
        times,
        translations,
        scales,
    ]
    .iter()
        .map(|&(offset, length)| json!({ "buffer": 0, "byteOffset": offset, "byteLength": length }))
        .collect();

    let accessors = json!([
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
          "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
        { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5121, "count": 3, "type": "VEC4" },
        { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" },
        { "bufferView": 4, "componentType": 5123, "count": 3, "type": "SCALAR" },
        { "bufferView": 5, "componentType": 5126, "count": 2, "type": "SCALAR",
          "min": [0.0], "max": [1.0] },
        { "bufferView": 6, "componentType": 5126, "count": 2, "type": "VEC3" },
        { "bufferView": 7, "componentType": 5126, "count": 2, "type": "VEC3" }
    ]);

    let mut animations = vec![json!({
        "name": "Lift",
        "channels": [{ "sampler": 0, "target": { "node": 2, "path": "translation" } }],
        "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }]
    })];
    if second_lift {
        animations.push(json!({
            "name": "Lift",
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "scale" } }],
            "samplers": [{ "input": 5, "output": 7, "interpolation": "LINEAR" }]
        }));
    }

    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0, "translation": [0.0, 0.0, 5.0] },
            { "name": "Root", "children": [2] },
            { "name": "Arm", "translation": [0.0, 1.0, 0.0] }
        ],
        "skins": [{ "joints": [1, 2] }],
        "meshes": [{
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1,
                    "JOINTS_0": 2,
                    "WEIGHTS_0": 3
                },
                "indices": 4,
                "material": 0
            }]
        }],
        "materials": [{
            "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }
        }],
        "animations": animations,
        "accessors": accessors,
        "bufferViews": views,
        "buffers": [{ "uri": "rigged.bin", "byteLength": bin.len() }]
    });

    std::fs::write(dir.join("rigged.bin"), &bin).expect("Failed to write buffer");
    let path = dir.join("rigged.gltf");
    let text = serde_json::to_string_pretty(&document).expect("Failed to serialize glTF");
    std::fs::write(&path, text).expect("Failed to write glTF");
    path
}

fn load_rigged(frame_rate: f32) -> (TempDir, GltfScene) {
    load_gltf(frame_rate, false)
}

fn load_gltf(frame_rate: f32, second_lift: bool) -> (TempDir, GltfScene) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_rigged_gltf(dir.path(), second_lift);
    let scene = GltfScene::load(&path, frame_rate).expect("Failed to load glTF");
    (dir, scene)
}

fn export_rigged(frame_rate: f32, options: &ExportOptions) -> ParsedSom {
    let (_dir, mut scene) = load_rigged(frame_rate);
    let data = export_scene(&mut scene, options);
    parse_som(&render(&data, &options.commons()))
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_gltf_objects_and_bones() {
    let (_dir, scene) = load_rigged(2.0);

    let objects = scene.visible_objects();
    assert_eq!(objects, [0]);
    assert_eq!(scene.object_name(&0), "Body");

    let bones = scene.pose_bones(&0);
    let names: Vec<_> = bones.iter().map(|b| scene.bone_name(b)).collect();
    assert_eq!(names, ["Root", "Arm"]);
    assert_eq!(scene.bone_pose(&bones[1]).head, [0.0, 1.0, 0.0]);

    let tracks = scene.animation_strips(&0).expect("skinned node has animation data");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0][0].action, "Lift");
    assert_eq!(tracks[0][0].frame_end, 2.0);
}

#[test]
fn test_gltf_export_geometry() {
    let som = export_rigged(2.0, &ExportOptions::default());

    assert_eq!(som.vertex_count(), 3);
    assert_eq!(som.vertex(1), [1000, 0, 0, 0, 0, 1000, 1, 0]);

    // Vertex bones from non-zero weights, later joints overwriting earlier ones
    let bones: Vec<_> = (0..3).map(|i| som.vertex(i)[6]).collect();
    assert_eq!(bones, [0, 1, 1]);

    assert_eq!(som.faces, [0, 1, 2, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(som.materials, [255, 0, 0, 255]);
}

#[test]
fn test_gltf_apply_modifiers_bakes_node_transform() {
    let options = ExportOptions {
        apply_modifiers: true,
        ..ExportOptions::default()
    };
    let som = export_rigged(2.0, &options);

    assert_eq!(som.vertex(0)[..3], [0, 0, 5000]);
    assert_eq!(som.vertex(2)[..3], [0, 1000, 5000]);
    assert_eq!(som.vertex(2)[3..6], [0, 0, 1000]);
}

#[test]
fn test_gltf_animation_sampled_at_frame_rate() {
    let som = export_rigged(2.0, &ExportOptions::default());

    assert_eq!(som.bones_count, 2);
    assert_eq!(som.animations.len(), 1);

    let lift = &som.animations[0];
    assert_eq!(lift.name, "Lift");
    assert_eq!(lift.bones.len(), 2 * 2 * BONE_FIELDS);

    // Frame 0 -> t = 0.0, frame 1 -> t = 0.5
    let arm_frame_0 = &lift.bones[BONE_FIELDS..BONE_FIELDS * 2];
    let arm_frame_1 = &lift.bones[BONE_FIELDS * 3..BONE_FIELDS * 4];
    assert_eq!(arm_frame_0, [0, 100, 0, 0, 0, 0, 1, 1, 1]);
    assert_eq!(arm_frame_1, [0, 100, 100, 0, 0, 0, 1, 1, 1]);

    let more_frames = export_rigged(10.0, &ExportOptions::default());
    assert_eq!(more_frames.frame_count(&more_frames.animations[0]), 10);
}

#[test]
fn test_gltf_same_named_animations_sample_their_own_channels() {
    let (_dir, mut scene) = load_gltf(2.0, true);

    let tracks = scene.animation_strips(&0).expect("skinned node has animation data");
    let indices: Vec<_> = tracks.iter().map(|t| t[0].action_index).collect();
    assert_eq!(indices, [0, 1]);

    let options = ExportOptions::default();
    let data = export_scene(&mut scene, &options);
    let som = parse_som(&render(&data, &options.commons()));

    assert_eq!(som.animations.len(), 2);
    assert!(som.animations.iter().all(|a| a.name == "Lift"));

    let moved = &som.animations[0].bones[BONE_FIELDS * 3..BONE_FIELDS * 4];
    assert_eq!(moved, [0, 100, 100, 0, 0, 0, 1, 1, 1]);

    // Second clip: translation at rest, scale halfway from 1 to 3
    let scaled = &som.animations[1].bones[BONE_FIELDS * 3..BONE_FIELDS * 4];
    assert_eq!(scaled, [0, 100, 0, 0, 0, 0, 2, 2, 2]);
}

#[test]
fn test_gltf_missing_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = GltfScene::load(&dir.path().join("missing.gltf"), 24.0);
    assert!(result.is_err());
}
