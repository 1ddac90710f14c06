use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ConsoleError, Result};
use crate::theme::{ColorTheme, OutputPalette};

/// Default prompt shown when a script requests input without one
pub const DEFAULT_PROMPT_PLACEHOLDER: &str = "> ";

/// Console configuration, read from `~/.script-console/console.json`.
///
/// Every field has a default so a missing or partial file is fine; an
/// unparseable file is reported, not silently replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Whether appended output is scanned for tappable URLs
    #[serde(default = "default_linkify", rename = "linkifyUrls")]
    pub linkify_urls: bool,
    /// Selection colors for the active/inactive console surface
    #[serde(default)]
    pub theme: ColorTheme,
    /// Text colors for standard and error output
    #[serde(default)]
    pub palette: OutputPalette,
    /// Placeholder for the input field while a prompt is pending
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "promptPlaceholder"
    )]
    pub prompt_placeholder: Option<String>,
    /// Whether the console shows its button controls row
    #[serde(default, rename = "showsButtonControls")]
    pub shows_button_controls: bool,
}

fn default_linkify() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            linkify_urls: true,
            theme: ColorTheme::default(),
            palette: OutputPalette::default(),
            prompt_placeholder: None, // Falls back to DEFAULT_PROMPT_PLACEHOLDER via getter
            shows_button_controls: false,
        }
    }
}

impl ConsoleConfig {
    /// Returns the prompt placeholder, or the default when not configured
    pub fn get_prompt_placeholder(&self) -> &str {
        self.prompt_placeholder
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_PLACEHOLDER)
    }

    /// Load from the default location; defaults when the file is absent.
    pub fn load() -> Self {
        match Self::load_from(&config_path()) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Falling back to default console config");
                Self::default()
            }
        }
    }

    /// Load from an explicit path. Absent file → defaults; unreadable or
    /// malformed file → `ConsoleError::Config`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No console config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConsoleError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Write to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConsoleError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConsoleError::Config(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ConsoleError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Path of the config file (`~/.script-console/console.json`)
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".script-console"))
        .unwrap_or_else(std::env::temp_dir)
        .join("console.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::FocusState;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert!(config.linkify_urls);
        assert_eq!(config.get_prompt_placeholder(), DEFAULT_PROMPT_PLACEHOLDER);
        assert!(!config.shows_button_controls);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, r#"{"linkifyUrls": false}"#).unwrap();

        let config = ConsoleConfig::load_from(&path).unwrap();
        assert!(!config.linkify_urls);
        assert_eq!(config.theme, ColorTheme::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ConsoleConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.json");

        let mut config = ConsoleConfig::default();
        config.prompt_placeholder = Some(">>> ".to_string());
        config.theme = ColorTheme::new(0x111111, 0x222222);
        config.save_to(&path).unwrap();

        let back = ConsoleConfig::load_from(&path).unwrap();
        assert_eq!(back.get_prompt_placeholder(), ">>> ");
        assert_eq!(back.theme.color_for(FocusState::Active), 0x111111);
    }
}
