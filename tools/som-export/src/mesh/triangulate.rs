//! Polygon triangulation

use crate::scene::MeshSnapshot;

/// One triangle corner: the mesh vertex and the loop it came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub vertex: usize,
    /// Loop (face-corner) index, used to look up per-corner UVs
    pub loop_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub corners: [Corner; 3],
    pub material_slot: usize,
}

/// Polygon soup in, triangle soup out
pub trait Triangulate {
    fn triangulate(&self, mesh: &MeshSnapshot) -> Vec<Triangle>;
}

/// Fan triangulation for convex polygons
///
/// Triangles keep polygon order; a polygon with n corners yields n - 2
/// triangles. Polygons with fewer than three corners are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct FanTriangulator;

impl Triangulate for FanTriangulator {
    fn triangulate(&self, mesh: &MeshSnapshot) -> Vec<Triangle> {
        let mut triangles = Vec::with_capacity(mesh.polygons.len());

        for polygon in &mesh.polygons {
            let n = polygon.vertices.len();
            if n < 3 {
                continue;
            }

            let corner = |i: usize| Corner {
                vertex: polygon.vertices[i],
                loop_index: polygon.loop_start + i,
            };

            for i in 1..n - 1 {
                triangles.push(Triangle {
                    corners: [corner(0), corner(i), corner(i + 1)],
                    material_slot: polygon.material_slot,
                });
            }
        }

        triangles
    }
}
