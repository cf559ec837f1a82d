//! Standalone player bundle: the prebuilt player script and HTML shell plus
//! a generated `scene.js`, packed into `export.zip`.
//!
//! This module is split into:
//! - `assets`: where the player script and shell are fetched from
//!   (a directory on disk, or bytes already in memory)

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SceneError};

mod assets;

#[cfg(not(target_arch = "wasm32"))]
pub use assets::DirAssets;
pub use assets::{AssetSource, MemoryAssets};

/// Player script, fetched relative to the page.
pub const PLAYER_BUNDLE_PATH: &str = "./player.bundle.js";
/// Player HTML shell, fetched relative to the page.
pub const PLAYER_HTML_PATH: &str = "./index.player.html";

/// Name offered for the downloaded archive.
pub const ARCHIVE_NAME: &str = "export.zip";
pub const ARCHIVE_PLAYER_BUNDLE: &str = "player.bundle.js";
pub const ARCHIVE_SCENE_SCRIPT: &str = "scene.js";
pub const ARCHIVE_HTML: &str = "index.html";

/// The two prebuilt player files.
#[derive(Debug, Clone)]
pub struct PlayerAssets {
    pub player_bundle: Vec<u8>,
    pub player_html: Vec<u8>,
}

/// Fetch the player script, then the HTML shell. The shell is only
/// requested once the script has arrived.
pub async fn fetch_player_assets<A: AssetSource>(source: &A) -> Result<PlayerAssets> {
    let player_bundle = source.fetch(PLAYER_BUNDLE_PATH).await?;
    let player_html = source.fetch(PLAYER_HTML_PATH).await?;
    log::debug!(
        "fetched player assets ({} + {} bytes)",
        player_bundle.len(),
        player_html.len()
    );
    Ok(PlayerAssets {
        player_bundle,
        player_html,
    })
}

/// Content of `scene.js`: assigns the exported scene to a global the
/// player reads on startup.
pub fn scene_script(export_json: &str) -> String {
    format!("window.jsGenScene = {export_json};")
}

/// Assemble the archive in memory. Nothing is returned unless every entry
/// was written.
pub fn build_archive(assets: &PlayerAssets, export_json: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let script = scene_script(export_json);
    let entries: [(&str, &[u8]); 3] = [
        (ARCHIVE_PLAYER_BUNDLE, assets.player_bundle.as_slice()),
        (ARCHIVE_SCENE_SCRIPT, script.as_bytes()),
        (ARCHIVE_HTML, assets.player_html.as_slice()),
    ];

    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer
            .write_all(bytes)
            .map_err(|e| SceneError::archive(format!("cannot write {name}: {e}")))?;
    }

    let bytes = writer.finish()?.into_inner();
    log::info!("built {ARCHIVE_NAME} ({} bytes)", bytes.len());
    Ok(bytes)
}
