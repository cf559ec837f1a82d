use crate::bundle::{build_archive, fetch_player_assets, AssetSource, PlayerAssets};
use crate::document::{FssConfig, LayerConfig, SceneStateDocument};
use crate::error::Result;
use crate::host::{Host, HostCommand};
use crate::scene::{SceneBuilder, VertexSnapshot};

use super::SceneController;

impl<H: Host, B: SceneBuilder> SceneController<H, B> {
    /// Export the host's current state as pretty-printed JSON.
    ///
    /// Only the globals and each layer's kind and blend are read from
    /// `text`. Configs come from the last import and mirrored layers get a
    /// vertex snapshot of their live scene.
    pub fn export_state(&mut self, text: &str) -> Result<String> {
        self.export_document(text)?.to_pretty_json()
    }

    /// Same as [`export_state`](Self::export_state), returning the document.
    pub fn export_document(&mut self, text: &str) -> Result<SceneStateDocument> {
        self.send(HostCommand::Pause);
        let mut doc = SceneStateDocument::from_host_state(text)?;

        for (index, layer) in doc.layers.iter_mut().enumerate() {
            layer.config = self.session.config_for(index, &layer.kind);
            log_lights(index, &layer.config);

            layer.scene_fuzz = if layer.kind.is_mirrored() {
                self.snapshot_layer(index, &layer.config)
            } else {
                None
            };
        }

        log::info!("exported {} layer(s)", doc.layers.len());
        Ok(doc)
    }

    /// Vertex snapshot of a mirrored layer: from its live scene if one is
    /// cached, otherwise from a scene rebuilt from config alone.
    fn snapshot_layer(&self, index: usize, config: &LayerConfig) -> Option<Vec<VertexSnapshot>> {
        if let Some(fuzz) = self.session.scene(index).and_then(|s| s.snapshot()) {
            return Some(fuzz);
        }

        log::warn!("no live scene for layer {index}, rebuilding from config; animation state is lost");
        let fallback = FssConfig::default();
        let config = config.as_fss().unwrap_or(&fallback);
        let fuzz = self.builder.build(config, None).and_then(|s| s.snapshot());
        if fuzz.is_none() {
            log::warn!("layer {index} exported without a scene snapshot");
        }
        fuzz
    }

    /// Export the state and pack it with the player into `export.zip` bytes.
    ///
    /// Both assets are fetched before the state is exported, so a failed
    /// fetch leaves the host untouched.
    pub async fn export_zip<A: AssetSource>(&mut self, text: &str, assets: &A) -> Result<Vec<u8>> {
        let player = fetch_player_assets(assets).await?;
        self.package(&player, text)
    }

    /// Export the state and pack it with already fetched player assets.
    pub fn package(&mut self, player: &PlayerAssets, text: &str) -> Result<Vec<u8>> {
        let scene_json = self.export_state(text)?;
        build_archive(player, &scene_json)
    }
}

fn log_lights(index: usize, config: &LayerConfig) {
    match config.as_fss().and_then(|c| c.lights()) {
        Some(lights) => log::debug!(
            "layer {index}: ambient {:?}, diffuse {:?}",
            lights.ambient,
            lights.diffuse
        ),
        None => log::debug!("layer {index}: no lights"),
    }
}
