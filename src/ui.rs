//! Page-side constants and the overlay panel toggle.

/// Element ids of the import/export panels.
pub mod ids {
    pub const EXPORT_TARGET: &str = "export-target";
    pub const EXPORT_CODE: &str = "export-code";
    pub const CLOSE_EXPORT: &str = "close-export";
    pub const IMPORT_TARGET: &str = "import-target";
    pub const IMPORT_CODE: &str = "import-code";
    pub const IMPORT_BUTTON: &str = "import-button";
    pub const CLOSE_IMPORT: &str = "close-import";
    pub const IMPORT: &str = "import";
}

/// Class applied to a panel to show it.
pub const SHOWN_CLASS: &str = "shown";
/// Class marking panels hidden by the space bar.
pub const OVERLAY_CLASS: &str = "hide-on-space";

pub const SPACE_KEY_CODE: u32 = 32;

/// Tracks whether overlay panels are hidden.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayToggle {
    hidden: bool,
}

impl OverlayToggle {
    /// Handle a key press. On space, flips visibility and returns the CSS
    /// `display` value every overlay panel should take.
    pub fn on_key_down(&mut self, key_code: u32) -> Option<&'static str> {
        if key_code != SPACE_KEY_CODE {
            return None;
        }
        let display = if self.hidden { "block" } else { "none" };
        self.hidden = !self.hidden;
        Some(display)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}
