//! som-export - SOM scene export tool
//!
//! Flattens a scene (glTF/GLB, or a TOML/JSON scene description) into a
//! single .som text file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use som_export::formats::SOM_EXT;
use som_export::manifest::SomManifest;
use som_export::providers::gltf_scene::DEFAULT_FRAME_RATE;
use som_export::{BoneMatchPolicy, LoadedScene, MaterialOffsetPolicy, export, inspect};

#[derive(Parser)]
#[command(name = "som-export")]
#[command(about = "SOM scene export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to a .som file
    Export {
        /// Input scene (glTF/GLB, or TOML/JSON scene description)
        input: PathBuf,

        /// Output .som file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to som.toml export manifest
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Realize meshes with modifiers applied (overrides manifest)
        #[arg(long)]
        apply_modifiers: bool,

        /// Bone picked when several share a vertex group's name (overrides manifest)
        #[arg(long, value_enum)]
        bone_match: Option<BoneMatchPolicy>,

        /// How material indices advance between objects (overrides manifest)
        #[arg(long, value_enum)]
        material_offset: Option<MaterialOffsetPolicy>,

        /// glTF animation sampling rate (overrides manifest, default: 24)
        #[arg(short, long)]
        frame_rate: Option<f32>,
    },

    /// List visible objects, pose bones and animation strips
    Inspect {
        /// Input scene (glTF/GLB, or TOML/JSON scene description)
        input: PathBuf,

        /// glTF animation sampling rate (default: 24)
        #[arg(short, long)]
        frame_rate: Option<f32>,
    },
}

fn load_manifest(config: Option<&Path>) -> Result<SomManifest> {
    match config {
        Some(path) => SomManifest::load(path),
        None => Ok(SomManifest::default()),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            config,
            apply_modifiers,
            bone_match,
            material_offset,
            frame_rate,
        } => {
            let manifest = load_manifest(config.as_deref())?;

            let mut options = manifest.export_options();
            options.apply_modifiers |= apply_modifiers;
            if let Some(policy) = bone_match {
                options.bone_match = policy;
            }
            if let Some(policy) = material_offset {
                options.material_offset = policy;
            }
            let frame_rate = frame_rate.unwrap_or(manifest.gltf.frame_rate);

            let output = output.unwrap_or_else(|| input.with_extension(SOM_EXT));
            tracing::info!(
                "Exporting {:?} -> {:?} (apply_modifiers: {}, bone_match: {:?}, material_offset: {:?})",
                input,
                output,
                options.apply_modifiers,
                options.bone_match,
                options.material_offset
            );

            match LoadedScene::load(&input, frame_rate)? {
                LoadedScene::Memory(mut scene) => {
                    export::export_to_file(&mut scene, &output, &options)?;
                }
                LoadedScene::Gltf(mut scene) => {
                    export::export_to_file(&mut *scene, &output, &options)?;
                }
            }
            tracing::info!("Done!");
        }

        Commands::Inspect { input, frame_rate } => {
            let frame_rate = frame_rate.unwrap_or(DEFAULT_FRAME_RATE);
            tracing::info!("Scene {:?}:", input);

            let objects = match LoadedScene::load(&input, frame_rate)? {
                LoadedScene::Memory(scene) => inspect::describe_scene(&scene),
                LoadedScene::Gltf(scene) => {
                    tracing::info!("Sampling glTF animations at {} fps", scene.frame_rate());
                    inspect::describe_scene(&*scene)
                }
            };
            inspect::log_scene(&objects);
        }
    }

    Ok(())
}
