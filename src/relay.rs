//! Forwarding of GUI control changes to the host.
//!
//! Each GUI callback maps to exactly one host port. Values pass through
//! untouched apart from what the port's decoder needs: slider values are
//! rounded to integers and the custom size field is split into a pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::BlendMode;
use crate::host::{HostCommand, SizeComponent};

/// A change reported by a GUI control, named after its callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value")]
pub enum ControlChange {
    #[serde(rename = "changeLightSpeed")]
    LightSpeed(f64),
    #[serde(rename = "changeFacesX")]
    FacesX(f64),
    #[serde(rename = "changeFacesY")]
    FacesY(f64),
    #[serde(rename = "changeVignette")]
    Vignette(f64),
    #[serde(rename = "changeWGLBlend")]
    WglBlend { layer: usize, blend: Value },
    #[serde(rename = "changeSVGBlend")]
    SvgBlend { layer: usize, blend: BlendMode },
    #[serde(rename = "changeProduct")]
    Product(String),
    #[serde(rename = "setCustomSize")]
    CustomSize(String),
}

/// Translate a control change into the command for its host port.
pub fn relay(change: ControlChange) -> HostCommand {
    match change {
        ControlChange::LightSpeed(v) => HostCommand::ChangeLightSpeed(round_half_up(v)),
        ControlChange::FacesX(v) => HostCommand::ChangeFacesX(round_half_up(v)),
        ControlChange::FacesY(v) => HostCommand::ChangeFacesY(round_half_up(v)),
        ControlChange::Vignette(v) => HostCommand::ChangeVignette(round_half_up(v)),
        ControlChange::WglBlend { layer, blend } => HostCommand::ChangeWglBlend { layer, blend },
        ControlChange::SvgBlend { layer, blend } => HostCommand::ChangeSvgBlend { layer, blend },
        ControlChange::Product(id) => HostCommand::ChangeProduct(id),
        ControlChange::CustomSize(text) => {
            let (w, h) = parse_custom_size(&text);
            HostCommand::SetCustomSize(w, h)
        }
    }
}

/// Round to the nearest integer, halves toward positive infinity
/// (`2.5 -> 3`, `-2.5 -> -2`), the way `Math.round` does. Non-finite input
/// maps to 0.
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    // `value - floor` is exact, unlike `value + 0.5`.
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// Parse `"width,height"`. Parts that do not start with an integer, and a
/// missing height, come back as `None`.
pub fn parse_custom_size(text: &str) -> (SizeComponent, SizeComponent) {
    let mut parts = text.split(',');
    let width = parts.next().and_then(parse_int_prefix);
    let height = parts.next().and_then(parse_int_prefix);
    (width, height)
}

/// Parse the leading integer of `text` after optional whitespace and sign,
/// ignoring whatever follows (`"12px" -> 12`). A `0x` prefix switches to
/// hexadecimal, as `parseInt` does without a radix.
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].chars().fold(0i64, |acc, c| {
        let digit = c.to_digit(radix).map_or(0, i64::from);
        acc.saturating_mul(i64::from(radix)).saturating_add(digit)
    });
    Some(if negative { -magnitude } else { magnitude })
}
