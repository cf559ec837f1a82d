//! The controller sitting between the host application and the outside
//! world. It owns the session caches and turns every failure at the UI
//! boundary into exactly one alert.
//!
//! This module is split into:
//! - `import`: reading a scene-state document into the host
//! - `export`: writing the host's state (plus vertex snapshots) back out,
//!   and packaging it as a player bundle

use crate::bundle::{AssetSource, ARCHIVE_NAME};
use crate::host::{GuiModel, Host, HostCommand, HostEvent};
use crate::relay::{relay, ControlChange};
use crate::scene::SceneBuilder;
use crate::session::Session;

mod export;
mod import;

pub use import::ImportSummary;

#[cfg(test)]
mod tests;

pub const ALERT_NOTHING_TO_IMPORT: &str = "Nothing to import";
pub const ALERT_IMPORT_FAILED: &str = "Failed to parse or send, incorrect format?";
pub const ALERT_EXPORT_FAILED: &str = "Failed to export, incorrect format?";
pub const ALERT_ZIP_FAILED: &str = "Failed to create .zip";

/// What the page should do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    /// Open the export panel showing this code.
    ShowExport(String),
    /// Offer these bytes as a file download.
    Download { file_name: String, bytes: Vec<u8> },
    /// Show a blocking alert.
    Alert(String),
}

pub struct SceneController<H, B> {
    host: H,
    builder: B,
    session: Session,
}

impl<H: Host, B: SceneBuilder> SceneController<H, B> {
    pub fn new(host: H, builder: B) -> Self {
        Self {
            host,
            builder,
            session: Session::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn send(&mut self, command: HostCommand) {
        self.host.send(command);
    }

    /// Tell the host the bridge is listening.
    pub fn start(&mut self) {
        self.send(HostCommand::Bang);
    }

    /// Forward a GUI control change to its host port.
    pub fn relay(&mut self, change: ControlChange) {
        self.send(relay(change));
    }

    /// Rebuild the scene of every mirrored layer in `model` and push it to
    /// the host. Returns the number of scenes sent.
    pub fn rebuild_mirrored(&mut self, model: &GuiModel) -> usize {
        let mut sent = 0;
        for (index, layer) in model.layers.iter().enumerate() {
            if !layer.kind.is_mirrored() {
                continue;
            }
            match self.builder.build(&model.fss, None) {
                Some(scene) => {
                    self.send(HostCommand::RebuildFss {
                        scene,
                        layer: index,
                    });
                    sent += 1;
                }
                None => log::warn!("no scene built for mirrored layer {index}"),
            }
        }
        sent
    }

    /// Handle the import button. `None` means the import went through.
    pub fn submit_import(&mut self, text: &str) -> Option<UiEffect> {
        if text.is_empty() {
            return Some(UiEffect::Alert(ALERT_NOTHING_TO_IMPORT.to_string()));
        }
        match self.import_state(text) {
            Ok(_) => None,
            Err(e) => {
                log::error!("import failed: {e}");
                Some(UiEffect::Alert(ALERT_IMPORT_FAILED.to_string()))
            }
        }
    }

    /// Handle a message from the host.
    pub async fn dispatch<A: AssetSource>(
        &mut self,
        event: HostEvent,
        assets: &A,
    ) -> Option<UiEffect> {
        match event {
            HostEvent::Export(state) => Some(match self.export_state(&state) {
                Ok(code) => UiEffect::ShowExport(code),
                Err(e) => {
                    log::error!("export failed: {e}");
                    UiEffect::Alert(ALERT_EXPORT_FAILED.to_string())
                }
            }),
            HostEvent::ExportZip(state) => Some(match self.export_zip(&state, assets).await {
                Ok(bytes) => UiEffect::Download {
                    file_name: ARCHIVE_NAME.to_string(),
                    bytes,
                },
                Err(e) => {
                    log::error!("zip export failed: {e}");
                    UiEffect::Alert(ALERT_ZIP_FAILED.to_string())
                }
            }),
            HostEvent::StartGui(model) | HostEvent::RequestFssRebuild(model) => {
                let sent = self.rebuild_mirrored(&model);
                log::debug!("rebuilt {sent} mirrored scene(s)");
                None
            }
        }
    }
}
