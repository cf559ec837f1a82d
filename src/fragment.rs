//! The `#blends=` URL fragment that makes a layer stack's blend modes
//! shareable as a link.

use crate::document::{BlendMode, LayerState};

pub const FRAGMENT_PREFIX: &str = "#blends=";
pub const BLEND_DELIMITER: char = ':';

/// Blend modes of all layers, in order, joined by `:`.
pub fn blend_string(layers: &[LayerState]) -> String {
    let blends: Vec<&str> = layers.iter().map(|l| l.blend.as_str()).collect();
    blends.join(":")
}

pub fn blend_fragment(layers: &[LayerState]) -> String {
    format!("{FRAGMENT_PREFIX}{}", blend_string(layers))
}

/// Read blend modes back from a fragment. The leading `#` is optional.
/// Returns `None` if the fragment is not a blends fragment.
pub fn parse_blend_fragment(fragment: &str) -> Option<Vec<BlendMode>> {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let joined = body.strip_prefix("blends=")?;
    if joined.is_empty() {
        return Some(Vec::new());
    }
    Some(joined.split(BLEND_DELIMITER).map(BlendMode::from).collect())
}
