//! Global bone list and vertex-group to bone resolution

use serde::Deserialize;

use crate::scene::ScenePort;

/// Which bone wins when several bones share a vertex group's name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BoneMatchPolicy {
    /// Every match overwrites the previous one (SOM exporter compatible)
    #[default]
    Last,
    /// The first match in group order, then bone order, is kept
    First,
}

/// Ordered list of every pose bone across all visible objects
///
/// Built once per export and never resorted; positions in this list are the
/// bone indices written to vertex and animation records.
pub struct BoneList<B> {
    bones: Vec<B>,
    names: Vec<String>,
}

impl<B: Clone> BoneList<B> {
    /// Scan visible objects in visitation order and concatenate their pose bones
    pub fn collect<S>(scene: &S) -> Self
    where
        S: ScenePort<Bone = B>,
    {
        let mut bones = Vec::new();
        for object in scene.visible_objects() {
            bones.extend(scene.pose_bones(&object));
        }
        let names = bones.iter().map(|b| scene.bone_name(b)).collect();
        Self { bones, names }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[B] {
        &self.bones
    }

    /// Resolve a vertex's bone index from the names of the groups it belongs to
    ///
    /// Every group is compared against the full list. Unmatched vertices get 0.
    pub fn resolve<'a, I>(&self, groups: I, policy: BoneMatchPolicy) -> u32
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = 0u32;
        for group in groups {
            for (i, name) in self.names.iter().enumerate() {
                if name == group {
                    match policy {
                        BoneMatchPolicy::Last => found = i as u32,
                        BoneMatchPolicy::First => return i as u32,
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
impl BoneList<()> {
    pub(crate) fn from_names(names: Vec<String>) -> Self {
        Self {
            bones: vec![(); names.len()],
            names,
        }
    }
}
