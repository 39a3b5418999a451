//! Host scene capability interface
//!
//! Everything the exporter reads from a scene goes through [`ScenePort`].
//! Providers (`providers::memory`, `providers::gltf_scene`) implement it; the
//! exporter never touches a host structure directly.

use serde::Deserialize;
use thiserror::Error;

/// Posed transform of one bone at the scene's current frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonePose {
    /// Head position
    pub head: [f32; 3],
    /// XYZ Euler rotation in radians
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            head: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

/// RGBA material color in the 0..1 range
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct MaterialColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl MaterialColor {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// One strip of an NLA track: the action it plays and that action's frame range
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationStrip {
    /// Action name, written to the `Name` block
    pub action: String,
    /// Provider handle of the action; names are not required to be unique
    pub action_index: usize,
    pub frame_start: f32,
    pub frame_end: f32,
}

/// Vertex of a realized mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Indices into [`MeshSnapshot::vertex_groups`] this vertex belongs to
    pub groups: Vec<usize>,
}

/// Polygon of a realized mesh, any arity
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPolygon {
    /// Mesh-local vertex indices, one per corner
    pub vertices: Vec<usize>,
    /// Object-local material slot index
    pub material_slot: usize,
    /// Index of the first corner in the loop (face-corner) arrays
    pub loop_start: usize,
}

/// Concrete mesh data realized from an object at the current frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshSnapshot {
    pub vertices: Vec<MeshVertex>,
    pub polygons: Vec<MeshPolygon>,
    /// Vertex group names of the owning object
    pub vertex_groups: Vec<String>,
    /// Active UV layer, one entry per loop
    pub uv_layer: Option<Vec<[f32; 2]>>,
}

/// Why an object could not be realized into a mesh
///
/// Always recovered per object: the object is skipped and the export continues.
#[derive(Debug, Error, PartialEq)]
pub enum RealizeError {
    #[error("object has no geometry")]
    NoGeometry,
    #[error("modifier evaluation failed: {0}")]
    ModifierFailed(String),
    #[error("unsupported primitive topology: {0}")]
    UnsupportedTopology(String),
    #[error("invalid mesh data: {0}")]
    InvalidMesh(String),
}

/// Fixed capability interface over the host scene graph
///
/// `advance_to` mutates the scene clock that every `bone_pose` read observes,
/// so implementations are driven strictly sequentially.
pub trait ScenePort {
    type Object: Clone;
    type Bone: Clone;

    /// Visible objects in visitation order
    fn visible_objects(&self) -> Vec<Self::Object>;

    fn object_name(&self, object: &Self::Object) -> String;

    /// Pose bones of the object's skeleton, in skeleton order
    fn pose_bones(&self, object: &Self::Object) -> Vec<Self::Bone>;

    fn bone_name(&self, bone: &Self::Bone) -> String;

    /// Pose of the bone at the current frame
    fn bone_pose(&self, bone: &Self::Bone) -> BonePose;

    /// Realize the object into a concrete polygon mesh
    fn realize_mesh(
        &mut self,
        object: &Self::Object,
        apply_modifiers: bool,
    ) -> Result<MeshSnapshot, RealizeError>;

    /// Material slots of the object; `None` for a slot with no bound material
    fn material_slots(&self, object: &Self::Object) -> Vec<Option<MaterialColor>>;

    /// NLA tracks of the object, each a list of strips; `None` without animation data
    fn animation_strips(&self, object: &Self::Object) -> Option<Vec<Vec<AnimationStrip>>>;

    /// Make the strip's action the object's active action
    fn bind_action(&mut self, object: &Self::Object, strip: &AnimationStrip);

    /// Move the scene clock to `frame` and re-evaluate every pose
    fn advance_to(&mut self, frame: i32);
}
