//! SOM plaintext asset formats
//!
//! SOM files are tagged-block text, not binary: every block is
//! `Tag < v1,v2,... > Tag` with integer values.

pub mod som;

pub use som::*;

/// File extension for SOM files
pub const SOM_EXT: &str = "som";
