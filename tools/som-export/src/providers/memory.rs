//! Scene description provider (TOML/JSON -> ScenePort)
//!
//! A self-contained scene: objects with pose bones, polygon meshes, material
//! slots, keyframed actions and NLA tracks. Used for authoring small scenes
//! by hand and throughout the tests.
//!
//! ```toml
//! [[objects]]
//! name = "Armature"
//! bones = [{ name = "Root" }]
//!
//! [[objects.actions]]
//! name = "Wave"
//! frame_start = 1.0
//! frame_end = 4.0
//! channels = [{ bone = "Root", property = "location", keyframes = [
//!     { frame = 1.0, value = [0.0, 0.0, 0.0] },
//!     { frame = 3.0, value = [0.0, 0.0, 1.0] },
//! ] }]
//!
//! [[objects.nla_tracks]]
//! strips = ["Wave"]
//! ```

use anyhow::{Context, Result, bail};
use hashbrown::HashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::interpolate::interpolate_vec3;
use crate::scene::{
    AnimationStrip, BonePose, MaterialColor, MeshPolygon, MeshSnapshot, MeshVertex, RealizeError,
    ScenePort,
};

/// Top-level scene description
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Pose bones in skeleton order
    #[serde(default)]
    pub bones: Vec<BoneDesc>,
    #[serde(default)]
    pub mesh: Option<MeshDesc>,
    /// Material slots; a slot without `color` has no bound material
    #[serde(default)]
    pub materials: Vec<SlotDesc>,
    #[serde(default)]
    pub actions: Vec<ActionDesc>,
    /// `None` means the object has no animation data at all
    #[serde(default)]
    pub nla_tracks: Option<Vec<TrackDesc>>,
}

fn default_visible() -> bool {
    true
}

/// Bone rest pose
#[derive(Clone, Debug, Deserialize)]
pub struct BoneDesc {
    pub name: String,
    #[serde(default)]
    pub head: [f32; 3],
    /// XYZ Euler, radians
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

impl BoneDesc {
    fn rest_pose(&self) -> BonePose {
        BonePose {
            head: self.head,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlotDesc {
    #[serde(default)]
    pub color: Option<MaterialColor>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MeshDesc {
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    pub vertices: Vec<VertexDesc>,
    #[serde(default)]
    pub polygons: Vec<PolygonDesc>,
    /// Realizing with modifiers applied fails with this message
    #[serde(default)]
    pub modifier_error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VertexDesc {
    pub position: [f32; 3],
    #[serde(default)]
    pub normal: [f32; 3],
    /// Vertex group names this vertex belongs to
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PolygonDesc {
    pub vertices: Vec<usize>,
    #[serde(default)]
    pub material: usize,
    /// One UV per corner; any polygon with UVs gives the mesh an active UV layer
    #[serde(default)]
    pub uvs: Option<Vec<[f32; 2]>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActionDesc {
    pub name: String,
    pub frame_start: f32,
    pub frame_end: f32,
    #[serde(default)]
    pub channels: Vec<ChannelDesc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelProperty {
    Location,
    Rotation,
    Scale,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelDesc {
    pub bone: String,
    pub property: ChannelProperty,
    pub keyframes: Vec<KeyframeDesc>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct KeyframeDesc {
    pub frame: f32,
    pub value: [f32; 3],
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrackDesc {
    /// Action names, one strip each
    #[serde(default)]
    pub strips: Vec<String>,
}

/// Scene description validation failure
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("object '{object}': strip references unknown action '{action}'")]
    UnknownAction { object: String, action: String },
    #[error("object '{object}': action '{action}' is defined more than once")]
    DuplicateAction { object: String, action: String },
    #[error("object '{object}': action '{action}' animates unknown bone '{bone}'")]
    UnknownBone {
        object: String,
        action: String,
        bone: String,
    },
    #[error("object '{object}': vertex {vertex} is in unknown vertex group '{group}'")]
    UnknownVertexGroup {
        object: String,
        vertex: usize,
        group: String,
    },
    #[error("object '{object}': polygon {polygon} references vertex {vertex} of {count}")]
    VertexOutOfRange {
        object: String,
        polygon: usize,
        vertex: usize,
        count: usize,
    },
    #[error("object '{object}': action '{action}' has keyframes out of order on '{bone}'")]
    UnsortedKeyframes {
        object: String,
        action: String,
        bone: String,
    },
}

/// In-memory scene driven by a [`SceneDescription`]
#[derive(Clone, Debug)]
pub struct MemoryScene {
    desc: SceneDescription,
    frame: i32,
    /// Object index -> index of its active action
    active: HashMap<usize, usize>,
    /// Current pose per object, per bone
    poses: Vec<Vec<BonePose>>,
}

impl MemoryScene {
    pub fn new(desc: SceneDescription) -> Result<Self, SceneError> {
        validate(&desc)?;
        let poses = rest_poses(&desc);
        Ok(Self {
            desc,
            frame: 0,
            active: HashMap::new(),
            poses,
        })
    }

    /// Load a scene description, TOML or JSON by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let desc: SceneDescription = match ext.as_str() {
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse scene: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse scene: {}", path.display()))?,
            _ => bail!("Unsupported scene description: {:?} (use .toml or .json)", path),
        };

        Self::new(desc).with_context(|| format!("Invalid scene: {}", path.display()))
    }

    /// Parse a TOML scene description
    pub fn parse_toml(content: &str) -> Result<Self> {
        let desc: SceneDescription = toml::from_str(content).context("Failed to parse scene")?;
        Ok(Self::new(desc)?)
    }

    pub fn current_frame(&self) -> i32 {
        self.frame
    }

    fn evaluate(&mut self) {
        self.poses = rest_poses(&self.desc);
        let t = self.frame as f32;

        for (&object_index, &action_index) in &self.active {
            let object = &self.desc.objects[object_index];
            let action = &object.actions[action_index];

            for channel in &action.channels {
                let Some(bone_index) = object.bones.iter().position(|b| b.name == channel.bone)
                else {
                    continue;
                };

                let times: Vec<f32> = channel.keyframes.iter().map(|k| k.frame).collect();
                let values: Vec<[f32; 3]> = channel.keyframes.iter().map(|k| k.value).collect();
                let Some(value) = interpolate_vec3(&times, &values, t) else {
                    continue;
                };

                let pose = &mut self.poses[object_index][bone_index];
                match channel.property {
                    ChannelProperty::Location => pose.head = value,
                    ChannelProperty::Rotation => pose.rotation = value,
                    ChannelProperty::Scale => pose.scale = value,
                }
            }
        }
    }
}

fn rest_poses(desc: &SceneDescription) -> Vec<Vec<BonePose>> {
    desc.objects
        .iter()
        .map(|o| o.bones.iter().map(BoneDesc::rest_pose).collect())
        .collect()
}

fn validate(desc: &SceneDescription) -> Result<(), SceneError> {
    for object in &desc.objects {
        for (i, action) in object.actions.iter().enumerate() {
            if object.actions[..i].iter().any(|a| a.name == action.name) {
                return Err(SceneError::DuplicateAction {
                    object: object.name.clone(),
                    action: action.name.clone(),
                });
            }
        }

        for strip in object.nla_tracks.iter().flatten().flat_map(|t| &t.strips) {
            if !object.actions.iter().any(|a| &a.name == strip) {
                return Err(SceneError::UnknownAction {
                    object: object.name.clone(),
                    action: strip.clone(),
                });
            }
        }

        for action in &object.actions {
            for channel in &action.channels {
                if !object.bones.iter().any(|b| b.name == channel.bone) {
                    return Err(SceneError::UnknownBone {
                        object: object.name.clone(),
                        action: action.name.clone(),
                        bone: channel.bone.clone(),
                    });
                }
                if channel.keyframes.windows(2).any(|w| w[1].frame < w[0].frame) {
                    return Err(SceneError::UnsortedKeyframes {
                        object: object.name.clone(),
                        action: action.name.clone(),
                        bone: channel.bone.clone(),
                    });
                }
            }
        }

        let Some(mesh) = &object.mesh else {
            continue;
        };

        for (i, vertex) in mesh.vertices.iter().enumerate() {
            if let Some(group) = vertex.groups.iter().find(|g| !mesh.vertex_groups.contains(g)) {
                return Err(SceneError::UnknownVertexGroup {
                    object: object.name.clone(),
                    vertex: i,
                    group: group.clone(),
                });
            }
        }

        for (i, polygon) in mesh.polygons.iter().enumerate() {
            if let Some(&vertex) = polygon.vertices.iter().find(|&&v| v >= mesh.vertices.len()) {
                return Err(SceneError::VertexOutOfRange {
                    object: object.name.clone(),
                    polygon: i,
                    vertex,
                    count: mesh.vertices.len(),
                });
            }
        }
    }

    Ok(())
}

impl MeshDesc {
    fn snapshot(&self) -> MeshSnapshot {
        let vertices = self
            .vertices
            .iter()
            .map(|v| MeshVertex {
                position: v.position,
                normal: v.normal,
                groups: v
                    .groups
                    .iter()
                    .filter_map(|g| self.vertex_groups.iter().position(|name| name == g))
                    .collect(),
            })
            .collect();

        let mut polygons = Vec::with_capacity(self.polygons.len());
        let mut loop_start = 0;
        for polygon in &self.polygons {
            polygons.push(MeshPolygon {
                vertices: polygon.vertices.clone(),
                material_slot: polygon.material,
                loop_start,
            });
            loop_start += polygon.vertices.len();
        }

        let uv_layer = self.polygons.iter().any(|p| p.uvs.is_some()).then(|| {
            self.polygons
                .iter()
                .flat_map(|p| {
                    (0..p.vertices.len()).map(move |corner| {
                        p.uvs
                            .as_ref()
                            .and_then(|uvs| uvs.get(corner).copied())
                            .unwrap_or([0.0, 0.0])
                    })
                })
                .collect()
        });

        MeshSnapshot {
            vertices,
            polygons,
            vertex_groups: self.vertex_groups.clone(),
            uv_layer,
        }
    }
}

impl ScenePort for MemoryScene {
    type Object = usize;
    /// (object index, bone index)
    type Bone = (usize, usize);

    fn visible_objects(&self) -> Vec<usize> {
        self.desc
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.visible)
            .map(|(i, _)| i)
            .collect()
    }

    fn object_name(&self, object: &usize) -> String {
        self.desc.objects[*object].name.clone()
    }

    fn pose_bones(&self, object: &usize) -> Vec<(usize, usize)> {
        (0..self.desc.objects[*object].bones.len())
            .map(|b| (*object, b))
            .collect()
    }

    fn bone_name(&self, bone: &(usize, usize)) -> String {
        self.desc.objects[bone.0].bones[bone.1].name.clone()
    }

    fn bone_pose(&self, bone: &(usize, usize)) -> BonePose {
        self.poses[bone.0][bone.1]
    }

    fn realize_mesh(
        &mut self,
        object: &usize,
        apply_modifiers: bool,
    ) -> Result<MeshSnapshot, RealizeError> {
        let mesh = self.desc.objects[*object]
            .mesh
            .as_ref()
            .ok_or(RealizeError::NoGeometry)?;

        if apply_modifiers {
            if let Some(message) = &mesh.modifier_error {
                return Err(RealizeError::ModifierFailed(message.clone()));
            }
        }

        Ok(mesh.snapshot())
    }

    fn material_slots(&self, object: &usize) -> Vec<Option<MaterialColor>> {
        self.desc.objects[*object]
            .materials
            .iter()
            .map(|slot| slot.color)
            .collect()
    }

    fn animation_strips(&self, object: &usize) -> Option<Vec<Vec<AnimationStrip>>> {
        let object = &self.desc.objects[*object];
        let tracks = object.nla_tracks.as_ref()?;

        Some(
            tracks
                .iter()
                .map(|track| {
                    track
                        .strips
                        .iter()
                        .filter_map(|name| object.actions.iter().position(|a| &a.name == name))
                        .map(|index| {
                            let action = &object.actions[index];
                            AnimationStrip {
                                action: action.name.clone(),
                                action_index: index,
                                frame_start: action.frame_start,
                                frame_end: action.frame_end,
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    fn bind_action(&mut self, object: &usize, strip: &AnimationStrip) {
        if strip.action_index < self.desc.objects[*object].actions.len() {
            self.active.insert(*object, strip.action_index);
            self.evaluate();
        }
    }

    fn advance_to(&mut self, frame: i32) {
        self.frame = frame;
        self.evaluate();
    }
}
