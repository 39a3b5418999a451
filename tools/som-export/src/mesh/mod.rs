//! Geometry flattening (realized mesh -> SOM vertex/face records)

mod flatten;
mod triangulate;

// Re-export public API
pub use flatten::{flatten_mesh, FlattenedMesh};
pub use triangulate::{Corner, FanTriangulator, Triangle, Triangulate};
