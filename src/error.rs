use std::fmt;

/// All errors produced while importing, exporting or packaging a scene.
#[derive(Debug)]
pub struct SceneError {
    pub kind: ErrorKind,
    /// Index of the layer being processed when the error occurred, if any.
    pub layer: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Input text is not a valid scene-state document.
    #[error("malformed scene state: {0}")]
    MalformedInput(String),
    /// A player asset could not be fetched while packaging.
    #[error("cannot fetch asset '{path}': {reason}")]
    AssetFetch { path: String, reason: String },
    /// Archive assembly or serialization failed.
    #[error("archive error: {0}")]
    Archive(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// General message.
    #[error("{0}")]
    Message(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(layer) = self.layer {
            write!(f, " (layer {layer})")?;
        }

        Ok(())
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Shorthand constructors.
impl SceneError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedInput(msg.into()),
            layer: None,
        }
    }

    pub fn asset_fetch(path: &str, reason: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::AssetFetch {
                path: path.to_string(),
                reason: reason.to_string(),
            },
            layer: None,
        }
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Archive(msg.into()),
            layer: None,
        }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Message(msg.into()),
            layer: None,
        }
    }

    /// Attach the index of the layer that failed.
    pub fn at_layer(mut self, index: usize) -> Self {
        self.layer = Some(index);
        self
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedInput(_))
    }

    /// The message without its category prefix, for nesting inside a
    /// deserializer error that gets categorized again on the way out.
    pub fn into_detail(self) -> String {
        match self.kind {
            ErrorKind::MalformedInput(msg) | ErrorKind::Archive(msg) | ErrorKind::Message(msg) => {
                msg
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<zip::result::ZipError> for SceneError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::archive(e.to_string())
    }
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(e),
            layer: None,
        }
    }
}
