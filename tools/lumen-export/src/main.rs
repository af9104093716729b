//! lumen-export - Lumen asset export tool
//!
//! Converts raw assets (glTF, OBJ, PNG, JPEG) to compressed GPU-ready binary
//! formats (.lmesh, .lmeshes, .ltex)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lumen_export::{inspect, manifest, mesh, shell, texture};

#[derive(Parser)]
#[command(name = "lumen-export")]
#[command(about = "Lumen asset export tool")]
#[command(version)]
struct Cli {
    /// Defaults to the interactive shell
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a mesh file (glTF/GLB/OBJ)
    Genmodel {
        /// Input mesh file
        input: PathBuf,

        /// Output .lmesh (or .lmeshes for several primitives)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert an image file (PNG/JPEG)
    Gentexture {
        /// Input image file
        input: PathBuf,

        /// Output .ltex file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Store level 0 only
        #[arg(long)]
        no_mipmaps: bool,
    },

    /// Print the header fields of an asset file
    Inspect {
        /// Input .lmesh, .lmeshes or .ltex file
        input: PathBuf,
    },

    /// Build assets from a manifest file
    Build {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read commands from standard input
    Shell,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Genmodel { input, output } => {
            mesh::convert_mesh(&input, output.as_deref())?;
        }

        Commands::Gentexture {
            input,
            output,
            no_mipmaps,
        } => {
            texture::convert_image(&input, output.as_deref(), !no_mipmaps)?;
        }

        Commands::Inspect { input } => {
            print!("{}", inspect::describe(&input)?);
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building assets from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let base_dir = manifest
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            let report = manifest::build_all(&config, &base_dir, output.as_deref());
            if !report.is_success() {
                for (source, error) in &report.failed {
                    eprintln!("failed: {}: {}", source.display(), error);
                }
                anyhow::bail!(
                    "{} of {} assets failed",
                    report.failed.len(),
                    report.failed.len() + report.written.len()
                );
            }
            tracing::info!("Build complete!");
        }

        Commands::Shell => {
            let stdin = std::io::stdin();
            shell::run(stdin.lock(), std::io::stdout()).context("Shell I/O failed")?;
        }
    }

    Ok(())
}
