//! Scene-state document: the JSON format shared by import, export and the
//! player bundle's `scene.js`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SceneError};
use crate::scene::VertexSnapshot;

/// Kind of a compositing layer, as named by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    Fss,
    /// Mirrored flat-surface layer (`fss-mirror`), the only kind whose
    /// animation state is snapshotted on export.
    MirroredFss,
    Lorenz,
    Fractal,
    Template,
    Voronoi,
    Text,
    SvgImage,
    Vignette,
    Cover,
    Other(String),
}

impl LayerKind {
    pub fn as_str(&self) -> &str {
        match self {
            LayerKind::Fss => "fss",
            LayerKind::MirroredFss => "fss-mirror",
            LayerKind::Lorenz => "lorenz",
            LayerKind::Fractal => "fractal",
            LayerKind::Template => "template",
            LayerKind::Voronoi => "voronoi",
            LayerKind::Text => "text",
            LayerKind::SvgImage => "svg-image",
            LayerKind::Vignette => "vignette",
            LayerKind::Cover => "cover",
            LayerKind::Other(name) => name,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        matches!(self, LayerKind::MirroredFss)
    }

    /// Whether this kind is configured with an [`FssConfig`].
    pub fn uses_fss_config(&self) -> bool {
        matches!(self, LayerKind::Fss | LayerKind::MirroredFss)
    }
}

impl From<String> for LayerKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "fss" => LayerKind::Fss,
            "fss-mirror" => LayerKind::MirroredFss,
            "lorenz" => LayerKind::Lorenz,
            "fractal" => LayerKind::Fractal,
            "template" => LayerKind::Template,
            "voronoi" => LayerKind::Voronoi,
            "text" => LayerKind::Text,
            "svg-image" => LayerKind::SvgImage,
            "vignette" => LayerKind::Vignette,
            "cover" => LayerKind::Cover,
            _ => LayerKind::Other(name),
        }
    }
}

impl From<&str> for LayerKind {
    fn from(name: &str) -> Self {
        LayerKind::from(name.to_string())
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compositing operator name applied when a layer is drawn over the ones
/// below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlendMode(pub String);

impl BlendMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlendMode {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faces {
    pub x: u32,
    pub y: u32,
}

/// A light as `[color, opacity]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSource(pub String, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lights {
    pub ambient: LightSource,
    pub diffuse: LightSource,
}

/// A config field that may be absent, explicitly `null`, or set.
///
/// `None` is absent, `Some(None)` is `null`; both survive re-serialization.
pub type Nullable<T> = Option<Option<T>>;

mod nullable {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Configuration of a flat-surface (`fss` / `fss-mirror`) layer.
///
/// Only the fields read on this side of the host boundary are typed; every
/// other field (`amplitude`, `colorShift`, ...) is kept in `extra` so a
/// config survives export and re-import unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FssConfig {
    #[serde(deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub faces: Nullable<Faces>,
    #[serde(deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub lights: Nullable<Lights>,
    #[serde(deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub light_speed: Nullable<f64>,
    #[serde(deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub size: Nullable<(u32, u32)>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FssConfig {
    pub fn faces(&self) -> Option<Faces> {
        self.faces.flatten()
    }

    pub fn lights(&self) -> Option<&Lights> {
        self.lights.as_ref().and_then(Option::as_ref)
    }

    pub fn light_speed(&self) -> Option<f64> {
        self.light_speed.flatten()
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size.flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_none()
            && self.lights.is_none()
            && self.light_speed.is_none()
            && self.size.is_none()
            && self.extra.is_empty()
    }
}

/// Per-layer configuration, keyed by the layer's kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerConfig {
    Fss(FssConfig),
    /// Kinds whose configuration is opaque on this side of the boundary.
    Opaque(Map<String, Value>),
}

impl LayerConfig {
    pub fn empty_for(kind: &LayerKind) -> Self {
        if kind.uses_fss_config() {
            LayerConfig::Fss(FssConfig::default())
        } else {
            LayerConfig::Opaque(Map::new())
        }
    }

    /// Interpret a raw JSON config for a layer of the given kind.
    ///
    /// `null` and `""` (what the host sends in place of a config) both mean
    /// an empty config.
    pub fn from_value(kind: &LayerKind, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::empty_for(kind)),
            Value::String(s) if s.is_empty() => Ok(Self::empty_for(kind)),
            Value::Object(map) if kind.uses_fss_config() => {
                let config = serde_json::from_value(Value::Object(map)).map_err(|e| {
                    SceneError::malformed(format!("invalid {kind} config: {e}"))
                })?;
                Ok(LayerConfig::Fss(config))
            }
            Value::Object(map) => Ok(LayerConfig::Opaque(map)),
            other => Err(SceneError::malformed(format!(
                "{kind} config must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn as_fss(&self) -> Option<&FssConfig> {
        match self {
            LayerConfig::Fss(config) => Some(config),
            LayerConfig::Opaque(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LayerConfig::Fss(config) => config.is_empty(),
            LayerConfig::Opaque(map) => map.is_empty(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One layer of a scene-state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLayer")]
pub struct LayerState {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub blend: BlendMode,
    pub config: LayerConfig,
    /// Vertex animation snapshot; only ever set for mirrored layers.
    #[serde(rename = "sceneFuzz")]
    pub scene_fuzz: Option<Vec<VertexSnapshot>>,
}

impl LayerState {
    pub fn new(kind: LayerKind, blend: BlendMode) -> Self {
        let config = LayerConfig::empty_for(&kind);
        Self {
            kind,
            blend,
            config,
            scene_fuzz: None,
        }
    }

    pub fn with_config(mut self, config: LayerConfig) -> Self {
        self.config = config;
        self
    }
}

/// Wire shape of a layer before its config is resolved against its kind.
#[derive(Deserialize)]
struct RawLayer {
    #[serde(rename = "type", alias = "kind")]
    kind: LayerKind,
    blend: BlendMode,
    #[serde(default)]
    config: Value,
    #[serde(default, rename = "sceneFuzz")]
    scene_fuzz: Option<Vec<VertexSnapshot>>,
}

impl TryFrom<RawLayer> for LayerState {
    type Error = String;

    fn try_from(raw: RawLayer) -> std::result::Result<Self, String> {
        let config =
            LayerConfig::from_value(&raw.kind, raw.config).map_err(SceneError::into_detail)?;
        Ok(LayerState {
            kind: raw.kind,
            blend: raw.blend,
            config,
            scene_fuzz: raw.scene_fuzz,
        })
    }
}

/// A complete serialized scene: global animation parameters plus the
/// ordered layer stack (bottom first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneStateDocument {
    pub theta: f64,
    pub size: (u32, u32),
    pub origin: (f64, f64),
    pub mouse: (f64, f64),
    pub now: f64,
    pub layers: Vec<LayerState>,
    /// Unrecognized top-level fields, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A layer as the host reports it for export. Its `config` and
/// `sceneFuzz` are replaced on export, so they are never read.
#[derive(Deserialize)]
struct HostLayer {
    #[serde(rename = "type", alias = "kind")]
    kind: LayerKind,
    blend: BlendMode,
}

#[derive(Deserialize)]
struct HostState {
    theta: f64,
    size: (u32, u32),
    origin: (f64, f64),
    mouse: (f64, f64),
    now: f64,
    layers: Vec<HostLayer>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SceneStateDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse the host's current state for export. Layers come back with
    /// empty configs and no snapshot, whatever the host sent for them.
    pub fn from_host_state(text: &str) -> Result<Self> {
        let state: HostState = serde_json::from_str(text)?;
        Ok(SceneStateDocument {
            theta: state.theta,
            size: state.size,
            origin: state.origin,
            mouse: state.mouse,
            now: state.now,
            layers: state
                .layers
                .into_iter()
                .map(|l| LayerState::new(l.kind, l.blend))
                .collect(),
            extra: state.extra,
        })
    }

    /// Pretty-print with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn layer_kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|l| l.kind.clone()).collect()
    }

    /// The reduced payload the host receives on import: globals and
    /// per-layer kind and blend, with configs left out.
    pub fn import_payload(&self) -> ImportPayload {
        ImportPayload {
            theta: self.theta,
            size: self.size,
            origin: self.origin,
            mouse: self.mouse,
            now: self.now,
            layers: self
                .layers
                .iter()
                .map(|l| ImportLayer {
                    kind: l.kind.clone(),
                    blend: l.blend.clone(),
                    config: String::new(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    pub theta: f64,
    pub size: (u32, u32),
    pub origin: (f64, f64),
    pub mouse: (f64, f64),
    pub now: f64,
    pub layers: Vec<ImportLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLayer {
    pub kind: LayerKind,
    pub blend: BlendMode,
    /// Always empty; the host requests configs over a separate port.
    pub config: String,
}
