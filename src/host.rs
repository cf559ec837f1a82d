//! Typed messages exchanged with the host application over its named ports.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::document::{BlendMode, FssConfig, ImportPayload, LayerKind};
use crate::error::{Result, SceneError};
use crate::scene::Scene;

/// An integer parsed from user text; `None` stands for `NaN` and goes out
/// on the wire as `null`.
pub type SizeComponent = Option<i64>;

/// Outbound message to the host, one variant per port.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Pause,
    Bang,
    InitLayers(Vec<LayerKind>),
    Import(ImportPayload),
    ConfigureMirroredFss { config: FssConfig, layer: usize },
    RebuildFss { scene: Scene, layer: usize },
    ChangeLightSpeed(i64),
    ChangeFacesX(i64),
    ChangeFacesY(i64),
    ChangeVignette(i64),
    ChangeWglBlend { layer: usize, blend: Value },
    ChangeSvgBlend { layer: usize, blend: BlendMode },
    ChangeProduct(String),
    SetCustomSize(SizeComponent, SizeComponent),
}

impl HostCommand {
    /// Name of the host port this command is sent through.
    pub fn port(&self) -> &'static str {
        match self {
            HostCommand::Pause => "pause",
            HostCommand::Bang => "bang",
            HostCommand::InitLayers(_) => "initLayers",
            HostCommand::Import(_) => "import_",
            HostCommand::ConfigureMirroredFss { .. } => "configureMirroredFss",
            HostCommand::RebuildFss { .. } => "rebuildFss",
            HostCommand::ChangeLightSpeed(_) => "changeLightSpeed",
            HostCommand::ChangeFacesX(_) => "changeFacesX",
            HostCommand::ChangeFacesY(_) => "changeFacesY",
            HostCommand::ChangeVignette(_) => "changeVignette",
            HostCommand::ChangeWglBlend { .. } => "changeWGLBlend",
            HostCommand::ChangeSvgBlend { .. } => "changeSVGBlend",
            HostCommand::ChangeProduct(_) => "changeProduct",
            HostCommand::SetCustomSize(..) => "setCustomSize",
        }
    }

    /// Wire payload for the port.
    pub fn payload(&self) -> Value {
        match self {
            HostCommand::Pause | HostCommand::Bang => Value::Null,
            HostCommand::InitLayers(kinds) => json!(kinds),
            // The host decodes this port from a JSON string, not an object.
            HostCommand::Import(payload) => Value::String(json!(payload).to_string()),
            HostCommand::ConfigureMirroredFss { config, layer } => json!([config, layer]),
            HostCommand::RebuildFss { scene, layer } => json!([scene, layer]),
            HostCommand::ChangeLightSpeed(v)
            | HostCommand::ChangeFacesX(v)
            | HostCommand::ChangeFacesY(v)
            | HostCommand::ChangeVignette(v) => json!(v),
            HostCommand::ChangeWglBlend { layer, blend } => json!({ "layer": layer, "blend": blend }),
            HostCommand::ChangeSvgBlend { layer, blend } => json!({ "layer": layer, "blend": blend }),
            HostCommand::ChangeProduct(id) => json!(id),
            HostCommand::SetCustomSize(w, h) => json!([w, h]),
        }
    }
}

/// The host application as seen from this side of its ports.
pub trait Host {
    fn send(&mut self, command: HostCommand);

    /// Replace the page's URL fragment.
    fn publish_fragment(&mut self, fragment: &str);
}

impl<H: Host + ?Sized> Host for &mut H {
    fn send(&mut self, command: HostCommand) {
        (**self).send(command)
    }

    fn publish_fragment(&mut self, fragment: &str) {
        (**self).publish_fragment(fragment)
    }
}

/// Host that records every command instead of delivering it. Used by the
/// CLI and preview server, where no live application is attached.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub sent: Vec<HostCommand>,
    pub fragment: Option<String>,
}

impl RecordingHost {
    pub fn ports(&self) -> Vec<&'static str> {
        self.sent.iter().map(HostCommand::port).collect()
    }

    pub fn count(&self, port: &str) -> usize {
        self.sent.iter().filter(|c| c.port() == port).count()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
        self.fragment = None;
    }
}

impl Host for RecordingHost {
    fn send(&mut self, command: HostCommand) {
        log::debug!("host <- {}", command.port());
        self.sent.push(command);
    }

    fn publish_fragment(&mut self, fragment: &str) {
        log::debug!("fragment <- {fragment}");
        self.fragment = Some(fragment.to_string());
    }
}

/// Layer entry of the model the host hands over with `startGui`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiLayer {
    pub kind: LayerKind,
}

/// Host model sent with `startGui` and `requestFssRebuild`. Its top-level
/// fields double as the surface config for rebuilding mirrored layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiModel {
    pub layers: Vec<GuiLayer>,
    #[serde(flatten)]
    pub fss: FssConfig,
}

/// Inbound message from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Export(String),
    ExportZip(String),
    StartGui(GuiModel),
    RequestFssRebuild(GuiModel),
}

impl HostEvent {
    /// Decode a message received on one of the host's outbound ports.
    pub fn from_port(port: &str, payload: Value) -> Result<Self> {
        match port {
            "export_" => Ok(HostEvent::Export(expect_string(port, payload)?)),
            "exportZip_" => Ok(HostEvent::ExportZip(expect_string(port, payload)?)),
            "startGui" => Ok(HostEvent::StartGui(serde_json::from_value(payload)?)),
            "requestFssRebuild" => {
                Ok(HostEvent::RequestFssRebuild(serde_json::from_value(payload)?))
            }
            other => Err(SceneError::message(format!("unknown host port: {other}"))),
        }
    }

    pub fn port(&self) -> &'static str {
        match self {
            HostEvent::Export(_) => "export_",
            HostEvent::ExportZip(_) => "exportZip_",
            HostEvent::StartGui(_) => "startGui",
            HostEvent::RequestFssRebuild(_) => "requestFssRebuild",
        }
    }
}

fn expect_string(port: &str, payload: Value) -> Result<String> {
    match payload {
        Value::String(s) => Ok(s),
        // Tolerate hosts that send the state as an object.
        other @ Value::Object(_) => Ok(other.to_string()),
        _ => Err(SceneError::malformed(format!("{port} expects a state string"))),
    }
}
