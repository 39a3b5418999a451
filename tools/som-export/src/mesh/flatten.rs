//! Vertex and face record emission for one object

use crate::bones::{BoneList, BoneMatchPolicy};
use crate::data::{FaceRecord, SceneData, VertexRecord};
use crate::materials::MaterialRegistry;
use crate::scene::{MaterialColor, MeshSnapshot};

use super::triangulate::Triangle;

/// What one object added to the scene data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlattenedMesh {
    /// Index of the object's first vertex in the global vertex array
    pub vertex_base: usize,
    /// Registry base offset used for the object's material indices
    pub material_base: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Faces dropped because a corner pointed outside the mesh
    pub dropped_faces: usize,
}

/// Append one object's vertices, faces and materials
///
/// Pass 1 emits every vertex with material index 0. Pass 2 emits the faces
/// and overwrites the material index of the three vertices each face
/// touches; a vertex shared by faces with different materials keeps the
/// material of the last face.
pub fn flatten_mesh<B: Clone>(
    data: &mut SceneData,
    registry: &mut MaterialRegistry,
    mesh: &MeshSnapshot,
    triangles: &[Triangle],
    slots: &[Option<MaterialColor>],
    bones: &BoneList<B>,
    bone_policy: BoneMatchPolicy,
) -> FlattenedMesh {
    let vertex_base = data.vertexes.len();

    // Pass 1: vertices
    for vertex in &mesh.vertices {
        let groups = vertex
            .groups
            .iter()
            .filter_map(|&g| mesh.vertex_groups.get(g))
            .map(String::as_str);
        let bone_index = bones.resolve(groups, bone_policy);
        data.vertexes.push(VertexRecord::new(vertex.position, vertex.normal, bone_index));
    }

    // Pass 2: faces, back-patching vertex materials
    let material_base = registry.allocate(slots.len());
    let policy = registry.policy();
    let vertex_count = mesh.vertices.len();
    let mut dropped_faces = 0;

    for triangle in triangles {
        if triangle.corners.iter().any(|c| c.vertex >= vertex_count) {
            dropped_faces += 1;
            continue;
        }

        let material_index = material_base + policy.local_index(slots, triangle.material_slot);
        let uvs = mesh.uv_layer.as_ref().map(|layer| {
            triangle
                .corners
                .map(|c| layer.get(c.loop_index).copied().unwrap_or([0.0, 0.0]))
        });
        let vertices = triangle.corners.map(|c| vertex_base + c.vertex);

        for &v in &vertices {
            data.vertexes[v].material_index = material_index;
        }
        data.faces.push(FaceRecord::new(vertices, material_index, uvs));
    }

    if dropped_faces > 0 {
        tracing::warn!(
            "Dropped {} face(s) referencing vertices outside a {}-vertex mesh",
            dropped_faces,
            vertex_count
        );
    }

    // Bound slots only
    for color in slots.iter().flatten() {
        registry.record_material(*color);
    }

    FlattenedMesh {
        vertex_base,
        material_base,
        vertex_count,
        face_count: triangles.len() - dropped_faces,
        dropped_faces,
    }
}
