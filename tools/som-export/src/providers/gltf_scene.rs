//! glTF scene provider (glTF/GLB -> ScenePort)
//!
//! Nodes carrying a mesh or a skin are the exported objects. A node's skin
//! joints are its pose bones and every document animation that drives one
//! of those joints becomes a strip on its own track.

use anyhow::{Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec3};
use hashbrown::HashMap;
use std::path::Path;

use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;

use super::interpolate::{interpolate_quat, interpolate_vec3};
use crate::scene::{
    AnimationStrip, BonePose, MaterialColor, MeshPolygon, MeshSnapshot, MeshVertex, RealizeError,
    ScenePort,
};

/// Default sampling rate for glTF animations (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 24.0;

/// Node transform in translation / rotation (xyzw) / scale form
#[derive(Clone, Copy, Debug, PartialEq)]
struct LocalTransform {
    translation: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
}

impl LocalTransform {
    fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from(self.translation),
        )
    }
}

#[derive(Clone, Debug)]
enum ChannelValues {
    Translation(Vec<[f32; 3]>),
    Rotation(Vec<[f32; 4]>),
    Scale(Vec<[f32; 3]>),
}

/// One animation channel, read out of its accessors once at load time
#[derive(Clone, Debug)]
struct Channel {
    node: usize,
    times: Vec<f32>,
    values: ChannelValues,
    step: bool,
}

impl Channel {
    fn apply(&self, transform: &mut LocalTransform, seconds: f32) {
        let t = if self.step {
            // Snap to the last key at or before t
            self.times
                .iter()
                .rev()
                .find(|&&k| k <= seconds)
                .or(self.times.first())
                .copied()
                .unwrap_or(seconds)
        } else {
            seconds
        };

        match &self.values {
            ChannelValues::Translation(values) => {
                if let Some(v) = interpolate_vec3(&self.times, values, t) {
                    transform.translation = v;
                }
            }
            ChannelValues::Rotation(values) => {
                if let Some(q) = interpolate_quat(&self.times, values, t) {
                    transform.rotation = q;
                }
            }
            ChannelValues::Scale(values) => {
                if let Some(v) = interpolate_vec3(&self.times, values, t) {
                    transform.scale = v;
                }
            }
        }
    }
}

/// A document animation
#[derive(Clone, Debug)]
struct Clip {
    name: String,
    /// Last keyframe time in seconds
    duration: f32,
    channels: Vec<Channel>,
}

impl Clip {
    fn targets_any(&self, nodes: &[usize]) -> bool {
        self.channels.iter().any(|c| nodes.contains(&c.node))
    }
}

/// Scene backed by a loaded glTF document
pub struct GltfScene {
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
    frame_rate: f32,
    frame: i32,
    clips: Vec<Clip>,
    parents: Vec<Option<usize>>,
    rest: Vec<LocalTransform>,
    current: Vec<LocalTransform>,
    /// Object node -> bound clip
    active: HashMap<usize, usize>,
}

impl GltfScene {
    /// Load a .gltf or .glb file
    pub fn load(path: &Path, frame_rate: f32) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;

        Self::from_document(document, buffers, frame_rate)
            .with_context(|| format!("Failed to read animations: {:?}", path))
    }

    pub fn from_document(
        document: gltf::Document,
        buffers: Vec<gltf::buffer::Data>,
        frame_rate: f32,
    ) -> Result<Self> {
        anyhow::ensure!(
            frame_rate > 0.0,
            "Frame rate must be positive, got {}",
            frame_rate
        );

        let node_count = document.nodes().count();
        let mut parents = vec![None; node_count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let rest: Vec<LocalTransform> = document
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                LocalTransform {
                    translation,
                    rotation,
                    scale,
                }
            })
            .collect();

        let clips = document
            .animations()
            .map(|animation| read_clip(&animation, &buffers))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            document,
            buffers,
            frame_rate,
            frame: 0,
            clips,
            parents,
            current: rest.clone(),
            rest,
            active: HashMap::new(),
        })
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    fn node(&self, index: usize) -> Option<gltf::Node<'_>> {
        self.document.nodes().nth(index)
    }

    fn joints(&self, object: usize) -> Vec<usize> {
        self.node(object)
            .and_then(|node| node.skin())
            .map(|skin| skin.joints().map(|j| j.index()).collect())
            .unwrap_or_default()
    }

    fn node_name(&self, index: usize, fallback: &str) -> String {
        self.node(index)
            .and_then(|node| node.name().map(str::to_string))
            .unwrap_or_else(|| format!("{}{}", fallback, index))
    }

    fn world_matrix(&self, index: usize) -> Mat4 {
        let mut matrix = self.current[index].matrix();
        let mut parent = self.parents[index];
        while let Some(p) = parent {
            matrix = self.current[p].matrix() * matrix;
            parent = self.parents[p];
        }
        matrix
    }

    fn evaluate(&mut self) {
        self.current.clone_from(&self.rest);
        let seconds = self.frame as f32 / self.frame_rate;

        let mut bound: Vec<usize> = self.active.values().copied().collect();
        bound.sort_unstable();
        bound.dedup();

        for clip in bound {
            for channel in &self.clips[clip].channels {
                if let Some(transform) = self.current.get_mut(channel.node) {
                    channel.apply(transform, seconds);
                }
            }
        }
    }
}

fn read_clip(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> Result<Clip> {
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Animation{}", animation.index()));

    let mut channels = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .with_context(|| format!("Animation '{}' channel has no input times", name))?
            .collect();

        let interpolation = channel.sampler().interpolation();
        let spline = interpolation == Interpolation::CubicSpline;

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(iter)) => {
                ChannelValues::Translation(spline_values(iter.collect(), spline))
            }
            Some(ReadOutputs::Rotations(iter)) => {
                ChannelValues::Rotation(spline_values(iter.into_f32().collect(), spline))
            }
            Some(ReadOutputs::Scales(iter)) => {
                ChannelValues::Scale(spline_values(iter.collect(), spline))
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => continue,
            None => {
                tracing::warn!("Animation '{}' has a channel without outputs", name);
                continue;
            }
        };

        channels.push(Channel {
            node: channel.target().node().index(),
            times,
            values,
            step: interpolation == Interpolation::Step,
        });
    }

    let duration = channels
        .iter()
        .filter_map(|c| c.times.last().copied())
        .fold(0.0f32, f32::max);

    Ok(Clip {
        name,
        duration,
        channels,
    })
}

/// Cubic spline outputs store (in-tangent, value, out-tangent) per key; keep the values
fn spline_values<T: Copy>(values: Vec<T>, spline: bool) -> Vec<T> {
    if !spline {
        return values;
    }
    values.chunks(3).filter_map(|c| c.get(1).copied()).collect()
}

/// XYZ Euler angles (radians) of a quaternion, applied X first then Y then Z
fn quat_to_euler_xyz(rotation: [f32; 4]) -> [f32; 3] {
    let (z, y, x) = Quat::from_array(rotation)
        .normalize()
        .to_euler(EulerRot::ZYX);
    [x, y, z]
}

impl ScenePort for GltfScene {
    type Object = usize;
    type Bone = usize;

    fn visible_objects(&self) -> Vec<usize> {
        self.document
            .nodes()
            .filter(|node| node.mesh().is_some() || node.skin().is_some())
            .map(|node| node.index())
            .collect()
    }

    fn object_name(&self, object: &usize) -> String {
        self.node_name(*object, "Node")
    }

    fn pose_bones(&self, object: &usize) -> Vec<usize> {
        self.joints(*object)
    }

    fn bone_name(&self, bone: &usize) -> String {
        self.node_name(*bone, "Joint")
    }

    fn bone_pose(&self, bone: &usize) -> BonePose {
        let Some(transform) = self.current.get(*bone) else {
            return BonePose::default();
        };
        BonePose {
            head: transform.translation,
            rotation: quat_to_euler_xyz(transform.rotation),
            scale: transform.scale,
        }
    }

    fn realize_mesh(
        &mut self,
        object: &usize,
        apply_modifiers: bool,
    ) -> Result<MeshSnapshot, RealizeError> {
        let node = self
            .node(*object)
            .ok_or_else(|| RealizeError::InvalidMesh(format!("no node {}", object)))?;
        let mesh = node.mesh().ok_or(RealizeError::NoGeometry)?;

        let joints = self.joints(*object);
        let vertex_groups: Vec<String> = joints
            .iter()
            .map(|&j| self.node_name(j, "Joint"))
            .collect();

        let world = self.world_matrix(*object);
        let normal_matrix = world.inverse().transpose();

        let mut snapshot = MeshSnapshot {
            vertex_groups,
            ..MeshSnapshot::default()
        };
        let mut uv_layer: Vec<[f32; 2]> = Vec::new();
        let mut has_uvs = false;

        for (slot, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != Mode::Triangles {
                return Err(RealizeError::UnsupportedTopology(format!(
                    "primitive {} uses {:?}",
                    slot,
                    primitive.mode()
                )));
            }

            let reader = primitive.reader(|buffer| Some(&self.buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| {
                    RealizeError::InvalidMesh(format!("primitive {} has no positions", slot))
                })?
                .collect();
            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
            let uvs: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect());
            let joint_sets: Option<Vec<[u16; 4]>> =
                reader.read_joints(0).map(|iter| iter.into_u16().collect());
            let weights: Option<Vec<[f32; 4]>> =
                reader.read_weights(0).map(|iter| iter.into_f32().collect());
            let indices: Vec<usize> = match reader.read_indices() {
                Some(iter) => iter.into_u32().map(|i| i as usize).collect(),
                None => (0..positions.len()).collect(),
            };

            let base = snapshot.vertices.len();
            for (i, &position) in positions.iter().enumerate() {
                let mut position = position;
                let mut normal = normals
                    .as_ref()
                    .and_then(|n| n.get(i).copied())
                    .unwrap_or([0.0; 3]);

                if apply_modifiers {
                    position = world.transform_point3(Vec3::from(position)).to_array();
                    normal = normal_matrix
                        .transform_vector3(Vec3::from(normal))
                        .normalize_or_zero()
                        .to_array();
                }

                let mut groups = Vec::new();
                if let (Some(js), Some(ws)) = (&joint_sets, &weights) {
                    if let (Some(j), Some(w)) = (js.get(i), ws.get(i)) {
                        for (&joint, &weight) in j.iter().zip(w) {
                            let joint = joint as usize;
                            if weight > 0.0 && joint < joints.len() && !groups.contains(&joint) {
                                groups.push(joint);
                            }
                        }
                    }
                }

                snapshot.vertices.push(MeshVertex {
                    position,
                    normal,
                    groups,
                });
            }

            has_uvs |= uvs.is_some();
            for corners in indices.chunks_exact(3) {
                snapshot.polygons.push(MeshPolygon {
                    vertices: corners.iter().map(|&c| base + c).collect(),
                    material_slot: slot,
                    loop_start: uv_layer.len(),
                });
                for &c in corners {
                    let uv = uvs
                        .as_ref()
                        .and_then(|u| u.get(c).copied())
                        .unwrap_or([0.0, 0.0]);
                    uv_layer.push(uv);
                }
            }
        }

        if snapshot.vertices.is_empty() {
            return Err(RealizeError::NoGeometry);
        }

        snapshot.uv_layer = has_uvs.then_some(uv_layer);
        Ok(snapshot)
    }

    fn material_slots(&self, object: &usize) -> Vec<Option<MaterialColor>> {
        let Some(mesh) = self.node(*object).and_then(|node| node.mesh()) else {
            return Vec::new();
        };

        mesh.primitives()
            .map(|primitive| {
                let material = primitive.material();
                material.index().map(|_| {
                    let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
                    MaterialColor::new(r, g, b, a)
                })
            })
            .collect()
    }

    fn animation_strips(&self, object: &usize) -> Option<Vec<Vec<AnimationStrip>>> {
        self.node(*object)?.skin()?;
        let joints = self.joints(*object);

        Some(
            self.clips
                .iter()
                .enumerate()
                .filter(|(_, clip)| clip.targets_any(&joints))
                .map(|(index, clip)| {
                    vec![AnimationStrip {
                        action: clip.name.clone(),
                        action_index: index,
                        frame_start: 0.0,
                        frame_end: (clip.duration * self.frame_rate).ceil(),
                    }]
                })
                .collect(),
        )
    }

    fn bind_action(&mut self, object: &usize, strip: &AnimationStrip) {
        if strip.action_index < self.clips.len() {
            self.active.insert(*object, strip.action_index);
            self.evaluate();
        }
    }

    fn advance_to(&mut self, frame: i32) {
        self.frame = frame;
        self.evaluate();
    }
}
