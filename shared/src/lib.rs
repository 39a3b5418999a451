//! Shared format definitions for the SOM (Scene Object Mesh) exporter.

pub mod formats;

pub use formats::*;
