//! SOM block grammar (.som)
//!
//! Plaintext, UTF-8, `\n` line endings. Numbers are written as integers with
//! the fractional part discarded (truncated toward zero).
//!
//! # Layout
//! ```text
//! <commons header>
//!
//! Vertexes < x,y,z,nx,ny,nz,bone,material,... > Vertexes
//!
//! Faces < v1,v2,v3,material,u1,v1,u2,v2,u3,v3,... > Faces
//!
//! Materials < r,g,b,a,... > Materials
//!
//! Animations <
//!  BonesCount <B> BonesCount
//!  Animation <
//!   Name < name> Name
//!   Bones < px,py,pz,rx,ry,rz,sx,sy,sz,... > Bones
//!  > Animation
//! > Animations
//! ```

use std::io::{self, Write};

// =============================================================================
// Record Layout
// =============================================================================

/// Scalars per vertex record: x, y, z, nx, ny, nz, bone, material
pub const VERTEX_FIELDS: usize = 8;
/// Scalars per face record: 3 vertex indices, material, 3 (u, v) pairs
pub const FACE_FIELDS: usize = 10;
/// Scalars per material record: r, g, b, a
pub const MATERIAL_FIELDS: usize = 4;
/// Scalars per sampled bone: head xyz, rotation xyz (degrees), scale xyz
pub const BONE_FIELDS: usize = 9;

/// Vertex position multiplier
pub const POSITION_SCALE: f64 = 1000.0;
/// Vertex normal multiplier
pub const NORMAL_SCALE: f64 = 1000.0;
/// Texture coordinate multiplier
pub const UV_SCALE: f64 = 128.0;
/// Material color and alpha multiplier
pub const COLOR_SCALE: f64 = 255.0;
/// Bone head position multiplier
pub const BONE_HEAD_SCALE: f64 = 100.0;

// =============================================================================
// Block Tags
// =============================================================================

pub const TAG_VERTEXES: &str = "Vertexes";
pub const TAG_FACES: &str = "Faces";
pub const TAG_MATERIALS: &str = "Materials";
pub const TAG_ANIMATIONS: &str = "Animations";
pub const TAG_ANIMATION: &str = "Animation";
pub const TAG_BONES_COUNT: &str = "BonesCount";
pub const TAG_NAME: &str = "Name";
pub const TAG_BONES: &str = "Bones";

/// Truncate a scalar the way SOM writes it (toward zero, NaN as 0)
#[inline]
pub fn truncate_scalar(value: f64) -> i64 {
    value.trunc() as i64
}

/// Default commons block describing every record layout
pub fn default_commons(exporter: &str, version: &str) -> String {
    format!(
        "SOM (SceneObjectMesh) file created by {exporter} version {version}\n\
         \n\
         Wiki :\n \
         Vertexes contains the vertex data (x, y, z, nx, ny, nz, bone, material) of all visible objects in the scene.\n \
         Faces contains the face data (vertex1, vertex2, vertex3, material, u1, v1, u2, v2, u3, v3) of all visible objects in the scene.\n \
         Materials contains the material (red, green, blue, alpha) data of all visible objects in the scene.\n \
         Animations contains the animation data of all visible objects in the scene,\n \
         a animation contains the data of bones at each keyframe and a bone is composed of (px, py, pz, rx, ry, rz, sx, sy, sz),\n \
         where p = position, r = rotation and s = scale."
    )
}

// =============================================================================
// Writer
// =============================================================================

/// Streaming writer for the SOM block grammar
///
/// Blocks must be written in file order: commons, `Vertexes`, `Faces`,
/// `Materials`, then the `Animations` group.
pub struct SomWriter<W: Write> {
    w: W,
}

impl<W: Write> SomWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    /// Write the free-text header followed by one blank line
    pub fn write_commons(&mut self, commons: &str) -> io::Result<()> {
        self.w.write_all(commons.trim_end_matches('\n').as_bytes())?;
        self.w.write_all(b"\n\n")
    }

    /// Write a top-level block: `Tag < values > Tag` and a blank line
    pub fn write_block<I>(&mut self, tag: &str, values: I) -> io::Result<()>
    where
        I: IntoIterator<Item = f64>,
    {
        write!(self.w, "{tag} < ")?;
        self.write_values(values)?;
        writeln!(self.w, " > {tag}\n")
    }

    /// Open the `Animations` group with the global bone count
    pub fn begin_animations(&mut self, bones_count: usize) -> io::Result<()> {
        writeln!(self.w, "{TAG_ANIMATIONS} < ")?;
        writeln!(self.w, " {TAG_BONES_COUNT} <{bones_count}> {TAG_BONES_COUNT} ")
    }

    /// Write one `Animation` block (name and frame-major bone samples)
    pub fn write_animation<I>(&mut self, name: &str, bones: I) -> io::Result<()>
    where
        I: IntoIterator<Item = f64>,
    {
        writeln!(self.w, " {TAG_ANIMATION} < ")?;
        writeln!(self.w, "  {TAG_NAME} < {name}> {TAG_NAME} ")?;
        write!(self.w, "  {TAG_BONES} < ")?;
        self.write_values(bones)?;
        writeln!(self.w, " > {TAG_BONES}")?;
        writeln!(self.w, " > {TAG_ANIMATION} ")
    }

    /// Close the `Animations` group
    pub fn end_animations(&mut self) -> io::Result<()> {
        writeln!(self.w, "> {TAG_ANIMATIONS}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    fn write_values<I>(&mut self, values: I) -> io::Result<()>
    where
        I: IntoIterator<Item = f64>,
    {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.w.write_all(b",")?;
            }
            write!(self.w, "{}", truncate_scalar(value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut SomWriter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut writer = SomWriter::new(Vec::new());
        f(&mut writer).expect("write to Vec cannot fail");
        String::from_utf8(writer.into_inner()).expect("SOM output is UTF-8")
    }

    #[test]
    fn test_truncate_scalar_toward_zero() {
        assert_eq!(truncate_scalar(3.9), 3);
        assert_eq!(truncate_scalar(-3.9), -3);
        assert_eq!(truncate_scalar(-0.5), 0);
        assert_eq!(truncate_scalar(f64::NAN), 0);
    }

    #[test]
    fn test_block_has_no_trailing_comma() {
        let out = render(|w| w.write_block(TAG_VERTEXES, [1.5, -2.7, 300.0]));
        assert_eq!(out, "Vertexes < 1,-2,300 > Vertexes\n\n");
    }

    #[test]
    fn test_empty_block() {
        let out = render(|w| w.write_block(TAG_MATERIALS, std::iter::empty()));
        assert_eq!(out, "Materials <  > Materials\n\n");
    }

    #[test]
    fn test_animations_group() {
        let out = render(|w| {
            w.begin_animations(2)?;
            w.write_animation("Walk", [1.0, 2.0])?;
            w.end_animations()
        });
        assert_eq!(
            out,
            "Animations < \n \
             BonesCount <2> BonesCount \n \
             Animation < \n  \
             Name < Walk> Name \n  \
             Bones < 1,2 > Bones\n \
             > Animation \n\
             > Animations\n"
        );
    }

    #[test]
    fn test_commons_ends_with_blank_line() {
        let out = render(|w| w.write_commons("header\n"));
        assert_eq!(out, "header\n\n");

        let commons = default_commons("som-export", "0.1.0");
        assert!(commons.starts_with("SOM (SceneObjectMesh) file created by som-export"));
        assert!(commons.contains("(x, y, z, nx, ny, nz, bone, material)"));
    }
}
