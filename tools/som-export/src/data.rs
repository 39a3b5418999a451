//! Scene aggregator and SOM records
//!
//! Records hold already-scaled scalars; truncation to integers happens only
//! when the block serializer writes them.

use som_shared::{
    BONE_FIELDS, BONE_HEAD_SCALE, COLOR_SCALE, FACE_FIELDS, MATERIAL_FIELDS, NORMAL_SCALE,
    POSITION_SCALE, UV_SCALE, VERTEX_FIELDS,
};

use crate::scene::{BonePose, MaterialColor};

#[inline]
fn scale3(v: [f32; 3], factor: f64) -> [f64; 3] {
    [
        f64::from(v[0]) * factor,
        f64::from(v[1]) * factor,
        f64::from(v[2]) * factor,
    ]
}

/// Vertex record (8 scalars)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexRecord {
    pub position: [f64; 3],
    pub normal: [f64; 3],
    /// Index into the global bone list
    pub bone_index: u32,
    /// Global material index, back-patched by the last face using this vertex
    pub material_index: usize,
}

impl VertexRecord {
    pub fn new(position: [f32; 3], normal: [f32; 3], bone_index: u32) -> Self {
        Self {
            position: scale3(position, POSITION_SCALE),
            normal: scale3(normal, NORMAL_SCALE),
            bone_index,
            material_index: 0,
        }
    }

    pub fn values(&self) -> [f64; VERTEX_FIELDS] {
        let [x, y, z] = self.position;
        let [nx, ny, nz] = self.normal;
        [
            x,
            y,
            z,
            nx,
            ny,
            nz,
            f64::from(self.bone_index),
            self.material_index as f64,
        ]
    }
}

/// Face record (10 scalars)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceRecord {
    /// Indices into the global vertex array
    pub vertices: [usize; 3],
    pub material_index: usize,
    /// Scaled (u, v) per corner
    pub uvs: [[f64; 2]; 3],
}

impl FaceRecord {
    pub fn new(vertices: [usize; 3], material_index: usize, uvs: Option<[[f32; 2]; 3]>) -> Self {
        let scale = |[u, v]: [f32; 2]| [f64::from(u) * UV_SCALE, f64::from(v) * UV_SCALE];
        let uvs = uvs.map_or([[0.0; 2]; 3], |corners| corners.map(scale));
        Self {
            vertices,
            material_index,
            uvs,
        }
    }

    pub fn values(&self) -> [f64; FACE_FIELDS] {
        let [a, b, c] = self.vertices;
        let [[u1, v1], [u2, v2], [u3, v3]] = self.uvs;
        [
            a as f64,
            b as f64,
            c as f64,
            self.material_index as f64,
            u1,
            v1,
            u2,
            v2,
            u3,
            v3,
        ]
    }
}

/// Material record (4 scalars)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialRecord {
    pub rgba: [f64; 4],
}

impl MaterialRecord {
    pub fn from_color(color: MaterialColor) -> Self {
        Self {
            rgba: [color.r, color.g, color.b, color.a].map(|c| f64::from(c) * COLOR_SCALE),
        }
    }

    pub fn values(&self) -> [f64; MATERIAL_FIELDS] {
        self.rgba
    }
}

/// One bone sampled at one frame (9 scalars)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneSample {
    pub head: [f64; 3],
    /// Degrees
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl BoneSample {
    pub fn from_pose(pose: &BonePose) -> Self {
        Self {
            head: scale3(pose.head, BONE_HEAD_SCALE),
            rotation: pose.rotation.map(|r| f64::from(r).to_degrees()),
            scale: scale3(pose.scale, 1.0),
        }
    }

    pub fn values(&self) -> [f64; BONE_FIELDS] {
        let [px, py, pz] = self.head;
        let [rx, ry, rz] = self.rotation;
        let [sx, sy, sz] = self.scale;
        [px, py, pz, rx, ry, rz, sx, sy, sz]
    }
}

/// Samples of every global bone for every frame of one strip
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRecord {
    /// Action name of the strip
    pub name: String,
    pub frame_count: usize,
    /// Frame-major, bone-minor
    pub bones: Vec<BoneSample>,
}

impl AnimationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_count: 0,
            bones: Vec::new(),
        }
    }

    /// Append one frame's samples of the whole bone list
    pub fn push_frame(&mut self, samples: Vec<BoneSample>) {
        self.bones.extend(samples);
        self.frame_count += 1;
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.bones.iter().flat_map(BoneSample::values)
    }
}

/// Counts reported after an export
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub objects: usize,
    pub vertices: usize,
    pub faces: usize,
    pub materials: usize,
    pub bones: usize,
    pub animations: usize,
}

/// Accumulator for one export pass
///
/// Written only while the scene is walked, then handed read-only to the
/// block serializer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    pub vertexes: Vec<VertexRecord>,
    pub faces: Vec<FaceRecord>,
    pub materials: Vec<MaterialRecord>,
    pub animations: Vec<AnimationRecord>,
    pub bones_count: usize,
    /// Objects that contributed geometry
    pub objects: usize,
}

impl SceneData {
    pub fn new(bones_count: usize) -> Self {
        Self {
            bones_count,
            ..Self::default()
        }
    }

    pub fn vertex_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.vertexes.iter().flat_map(VertexRecord::values)
    }

    pub fn face_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.faces.iter().flat_map(FaceRecord::values)
    }

    pub fn material_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.materials.iter().flat_map(MaterialRecord::values)
    }

    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            objects: self.objects,
            vertices: self.vertexes.len(),
            faces: self.faces.len(),
            materials: self.materials.len(),
            bones: self.bones_count,
            animations: self.animations.len(),
        }
    }
}
