//! SOM output reader for integration tests
//!
//! Splits a rendered file into its blocks and parses every block body back
//! into integers.

#![allow(dead_code)]

use som_export::formats::{BONE_FIELDS, FACE_FIELDS, MATERIAL_FIELDS, VERTEX_FIELDS};

#[derive(Debug)]
pub struct ParsedAnimation {
    pub name: String,
    pub bones: Vec<i64>,
}

#[derive(Debug)]
pub struct ParsedSom {
    pub vertexes: Vec<i64>,
    pub faces: Vec<i64>,
    pub materials: Vec<i64>,
    pub bones_count: i64,
    pub animations: Vec<ParsedAnimation>,
}

impl ParsedSom {
    pub fn vertex_count(&self) -> usize {
        self.vertexes.len() / VERTEX_FIELDS
    }

    pub fn vertex(&self, i: usize) -> &[i64] {
        &self.vertexes[i * VERTEX_FIELDS..(i + 1) * VERTEX_FIELDS]
    }

    pub fn face(&self, i: usize) -> &[i64] {
        &self.faces[i * FACE_FIELDS..(i + 1) * FACE_FIELDS]
    }

    pub fn faces(&self) -> impl Iterator<Item = &[i64]> + '_ {
        self.faces.chunks(FACE_FIELDS)
    }

    pub fn material(&self, i: usize) -> &[i64] {
        &self.materials[i * MATERIAL_FIELDS..(i + 1) * MATERIAL_FIELDS]
    }

    /// Frames in an animation's `Bones` block
    pub fn frame_count(&self, animation: &ParsedAnimation) -> usize {
        let per_frame = self.bones_count as usize * BONE_FIELDS;
        if per_frame == 0 {
            0
        } else {
            animation.bones.len() / per_frame
        }
    }
}

/// Body between `open` and the next `close`, plus the rest of the input
fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<(&'a str, &'a str)> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find(close)?;
    Some((&text[start..start + len], &text[start + len + close.len()..]))
}

fn integers(body: &str) -> Vec<i64> {
    body.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().unwrap_or_else(|_| panic!("not an integer: {s:?}")))
        .collect()
}

fn block(text: &str, tag: &str) -> Vec<i64> {
    let (body, _) = between(text, &format!("\n{tag} < "), &format!(" > {tag}\n"))
        .unwrap_or_else(|| panic!("missing {tag} block"));
    integers(body)
}

/// Parse a complete SOM file
pub fn parse_som(text: &str) -> ParsedSom {
    let (group, _) = between(text, "\nAnimations < \n", "> Animations\n")
        .expect("missing Animations group");
    let (count, mut rest) =
        between(group, " BonesCount <", "> BonesCount \n").expect("missing BonesCount");

    let mut animations = Vec::new();
    while let Some((animation, tail)) = between(rest, " Animation < \n", " > Animation \n") {
        let (name, after_name) =
            between(animation, "  Name < ", "> Name \n").expect("animation without a name");
        let (bones, _) =
            between(after_name, "  Bones < ", " > Bones\n").expect("animation without bones");
        animations.push(ParsedAnimation {
            name: name.to_string(),
            bones: integers(bones),
        });
        rest = tail;
    }

    ParsedSom {
        vertexes: block(text, "Vertexes"),
        faces: block(text, "Faces"),
        materials: block(text, "Materials"),
        bones_count: count.trim().parse().expect("BonesCount is an integer"),
        animations,
    }
}

/// Render scene data to a string
pub fn render(data: &som_export::SceneData, commons: &str) -> String {
    let mut out = Vec::new();
    som_export::formats::write_som(&mut out, data, commons).expect("write to Vec cannot fail");
    String::from_utf8(out).expect("SOM output is UTF-8")
}
