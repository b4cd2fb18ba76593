use std::path::Path;

use addonlog_core::CHANGELOG_FILE_NAME;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default = "default_changelog_file_name")]
    pub changelog_file_name: String,

    #[serde(default = "default_true")]
    pub legacy_hook_enabled: bool,

    #[serde(default = "default_true")]
    pub modern_hook_enabled: bool,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_changelog_file_name() -> String {
    CHANGELOG_FILE_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            changelog_file_name: default_changelog_file_name(),
            legacy_hook_enabled: true,
            modern_hook_enabled: true,
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl PluginSettings {
    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let settings = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                warn!("Ignoring malformed settings {}: {error}", path.display());
                Self::default()
            }),
            Err(error) => {
                warn!("Could not read settings {}: {error}", path.display());
                Self::default()
            }
        };

        settings.sanitized()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        let name = self.changelog_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            warn!(
                "Invalid changelog file name '{}', using {CHANGELOG_FILE_NAME}",
                self.changelog_file_name
            );
            self.changelog_file_name = default_changelog_file_name();
        } else if name.len() != self.changelog_file_name.len() {
            self.changelog_file_name = name.to_string();
        }
        self
    }
}
