use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use jsgen_scene::bundle::{DirAssets, ARCHIVE_NAME};

#[derive(Parser)]
#[command(name = "jsgen", version)]
#[command(about = "jsgen: scene import/export and player bundles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a saved scene and print its layer summary
    Check {
        /// Saved scene (.json)
        file: PathBuf,
    },

    /// Re-export a saved scene in canonical form
    Export {
        /// Saved scene (.json)
        file: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },

    /// Package a saved scene with the player into a zip archive
    Bundle {
        /// Saved scene (.json)
        file: PathBuf,

        /// Directory holding player.bundle.js and index.player.html
        #[arg(long, default_value = "dist")]
        assets: PathBuf,

        /// Archive path
        #[arg(short, default_value = ARCHIVE_NAME)]
        o: PathBuf,
    },

    /// Start a live-reloading player preview for a saved scene
    Serve {
        /// Saved scene (.json)
        file: PathBuf,

        /// Directory holding player.bundle.js and index.player.html
        #[arg(long, default_value = "dist")]
        assets: PathBuf,

        /// Server port
        #[arg(long, default_value_t = 3333)]
        port: u16,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => {
            let text = read_scene(&file)?;
            let (_, summary) = jsgen_scene::load_scene(&text)
                .with_context(|| format!("{} is not a valid scene", file.display()))?;
            eprintln!(
                "{}: {} layer(s), {} mirrored, #blends={}",
                file.display(),
                summary.layer_count,
                summary.mirrored_count,
                summary.blends
            );
        }

        Commands::Export { file, o } => {
            let text = read_scene(&file)?;
            let json = jsgen_scene::normalize_scene(&text)
                .with_context(|| format!("cannot export {}", file.display()))?;

            if let Some(out_path) = o {
                fs::write(&out_path, &json)
                    .with_context(|| format!("cannot write '{}'", out_path.display()))?;
                eprintln!("wrote scene to {} ({} bytes)", out_path.display(), json.len());
            } else {
                println!("{json}");
            }
        }

        Commands::Bundle { file, assets, o } => {
            if !assets.is_dir() {
                bail!("'{}' is not a directory", assets.display());
            }
            let text = read_scene(&file)?;
            let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            let bytes = rt
                .block_on(jsgen_scene::bundle_scene(&text, &DirAssets::new(&assets)))
                .with_context(|| format!("cannot bundle {}", file.display()))?;

            fs::write(&o, &bytes).with_context(|| format!("cannot write '{}'", o.display()))?;
            eprintln!("wrote {} ({} bytes)", o.display(), bytes.len());
        }

        Commands::Serve { file, assets, port } => {
            let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            rt.block_on(async {
                jsgen_scene::server::run_preview_server(file, assets, port)
                    .await
                    .map_err(|e| anyhow::anyhow!("preview server failed: {e}"))
            })?;
        }
    }

    Ok(())
}

fn read_scene(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path.display()))
}
