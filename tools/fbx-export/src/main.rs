//! fbx-export - mesh to FBX export tool
//!
//! Converts OBJ and glTF/GLB meshes, or whole scene.toml manifests, into
//! binary or ASCII FBX 7.4 scenes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Use modules from library
use fbx_export::{batch, convert, manifest, ExportRequest};

#[derive(Parser)]
#[command(name = "fbx-export")]
#[command(about = "Mesh to FBX export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a single mesh file as a one-node FBX scene
    Mesh {
        /// Input mesh file (OBJ/glTF/GLB)
        input: PathBuf,

        /// Output .fbx file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node name (default: input file stem)
        #[arg(short, long)]
        node: Option<String>,

        /// Diffuse texture path
        #[arg(short, long)]
        texture: Option<String>,

        /// Write ASCII FBX if an ASCII writer is available
        #[arg(long)]
        ascii: bool,

        /// Embed the texture file in the output (binary only)
        #[arg(long)]
        embed: bool,
    },

    /// Build a scene from a manifest file
    Build {
        /// Path to scene.toml manifest
        #[arg(default_value = "scene.toml")]
        manifest: PathBuf,

        /// Output file (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to scene.toml manifest
        #[arg(default_value = "scene.toml")]
        manifest: PathBuf,
    },

    /// Convert every mesh under a directory
    Batch {
        /// Directory searched recursively for .obj/.gltf/.glb files
        input_dir: PathBuf,

        /// Directory receiving one .fbx per source
        output_dir: PathBuf,

        #[arg(long)]
        ascii: bool,

        #[arg(long)]
        embed: bool,
    },

    /// List the registered writer formats
    Formats,
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
        Commands::Mesh {
            input,
            output,
            node,
            texture,
            ascii,
            embed,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("fbx"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let request = ExportRequest::new(output)
                .textual(ascii)
                .embed_textures(embed);
            convert::convert_mesh_file(&input, node.as_deref(), texture.as_deref(), &request)?;
            tracing::info!("Done!");
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building scene from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete: {:?}", written);
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Batch {
            input_dir,
            output_dir,
            ascii,
            embed,
        } => {
            let options = batch::BatchOptions {
                textual: ascii,
                embed_textures: embed,
            };
            let summary = batch::convert_directory(&input_dir, &output_dir, &options)?;
            if summary.failed > 0 {
                anyhow::bail!(
                    "{} of {} files failed to convert",
                    summary.failed,
                    summary.failed + summary.converted
                );
            }
        }

        Commands::Formats => {
            let manager = fbx_export::fbx_common::Manager::new();
            let registry = manager.registry();
            let native = registry.native_writer_format();
            for (index, format) in registry.formats() {
                let marker = if Some(index) == native { " (native)" } else { "" };
                println!("{index}: {}{marker}", format.description());
            }
        }
    }

    Ok(())
}
