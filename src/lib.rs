pub mod bundle;
pub mod controller;
pub mod document;
pub mod error;
pub mod fragment;
pub mod host;
pub mod relay;
pub mod scene;
pub mod session;
pub mod ui;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use controller::{ImportSummary, SceneController, UiEffect};
pub use document::{BlendMode, LayerConfig, LayerKind, LayerState, SceneStateDocument};
pub use error::{Result, SceneError};

use bundle::AssetSource;
use host::RecordingHost;
use scene::SnapshotSceneBuilder;

/// Controller with no live host attached, restoring mirrored scenes from
/// their saved snapshots.
pub type OfflineController = SceneController<RecordingHost, SnapshotSceneBuilder>;

/// Load a saved scene document into a fresh offline controller.
pub fn load_scene(text: &str) -> Result<(OfflineController, ImportSummary)> {
    let mut controller = SceneController::new(RecordingHost::default(), SnapshotSceneBuilder);
    let summary = controller.import_state(text)?;
    Ok((controller, summary))
}

/// Re-export a saved scene document in canonical form: configs resolved
/// against their layer kinds, snapshots taken from the restored scenes,
/// two-space pretty printing.
pub fn normalize_scene(text: &str) -> Result<String> {
    let (mut controller, _) = load_scene(text)?;
    controller.export_state(text)
}

/// Package a saved scene document with the player into `export.zip` bytes.
pub async fn bundle_scene<A: AssetSource>(text: &str, assets: &A) -> Result<Vec<u8>> {
    let (mut controller, _) = load_scene(text)?;
    controller.export_zip(text, assets).await
}
