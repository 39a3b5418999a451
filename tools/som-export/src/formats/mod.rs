//! SOM block serializer
//!
//! Re-exports the block grammar from som-shared and renders a [`SceneData`]
//! through it. Pure formatting: every sequence is written in insertion order.

pub use som_shared::formats::*;

use anyhow::Result;
use std::io::Write;

use crate::data::SceneData;

/// Write a complete SOM file
pub fn write_som<W: Write>(w: &mut W, data: &SceneData, commons: &str) -> Result<()> {
    let mut writer = SomWriter::new(w);

    writer.write_commons(commons)?;
    writer.write_block(TAG_VERTEXES, data.vertex_values())?;
    writer.write_block(TAG_FACES, data.face_values())?;
    writer.write_block(TAG_MATERIALS, data.material_values())?;

    writer.begin_animations(data.bones_count)?;
    for animation in &data.animations {
        writer.write_animation(&animation.name, animation.values())?;
    }
    writer.end_animations()?;
    writer.flush()?;

    Ok(())
}
