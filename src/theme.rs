//! Color values the console surface needs from the core.
//!
//! Everything here is an immutable value object: focus changes swap a whole
//! [`ColorTheme`], never mutate one in place, so a renderer reading
//! concurrently can never observe a torn theme. Deciding *when* to switch
//! (focus tracking) is the display layer's job; the core only stores and
//! exposes the values.

use serde::{Deserialize, Serialize};

/// Hex color representation (u32), `0xRRGGBB`.
pub type HexColor = u32;

/// Whether the console surface currently holds input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Active,
    Inactive,
}

/// Selection colors for one console surface: the role applied while the
/// surface is active, and the role applied while it is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTheme {
    /// Selection color while the surface holds focus
    pub selection: HexColor,
    /// Selection color while focus is elsewhere
    pub inactive: HexColor,
}

impl ColorTheme {
    pub fn new(selection: HexColor, inactive: HexColor) -> Self {
        Self {
            selection,
            inactive,
        }
    }

    /// The color role for the given focus state.
    pub fn color_for(&self, focus: FocusState) -> HexColor {
        match focus {
            FocusState::Active => self.selection,
            FocusState::Inactive => self.inactive,
        }
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        ColorTheme {
            selection: 0x3478F6, // system blue
            inactive: 0x8E8E93,  // desaturated gray
        }
    }
}

/// Text colors the display layer applies per
/// [`crate::output_sink::OutputStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPalette {
    /// Standard-output text color
    pub standard: HexColor,
    /// Error-output text color
    pub error: HexColor,
}

impl Default for OutputPalette {
    fn default() -> Self {
        OutputPalette {
            standard: 0x000000,
            error: 0xC41E3A,
        }
    }
}

impl OutputPalette {
    pub fn color_for(&self, style: crate::output_sink::OutputStyle) -> HexColor {
        match style {
            crate::output_sink::OutputStyle::Standard => self.standard,
            crate::output_sink::OutputStyle::Error => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_sink::OutputStyle;

    #[test]
    fn focus_state_selects_role() {
        let theme = ColorTheme::new(0x112233, 0x445566);
        assert_eq!(theme.color_for(FocusState::Active), 0x112233);
        assert_eq!(theme.color_for(FocusState::Inactive), 0x445566);
    }

    #[test]
    fn palette_maps_styles() {
        let palette = OutputPalette::default();
        assert_eq!(palette.color_for(OutputStyle::Standard), palette.standard);
        assert_eq!(palette.color_for(OutputStyle::Error), palette.error);
    }

    #[test]
    fn theme_round_trips_through_json() {
        let theme = ColorTheme::new(0xABCDEF, 0x123456);
        let json = serde_json::to_string(&theme).unwrap();
        let back: ColorTheme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, theme);
    }
}
