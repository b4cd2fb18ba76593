//! Shows the changelog bundled with an add-on while it is being installed.
//!
//! Two install entry points of the host are overridden through its
//! [`HookRegistry`]:
//!
//! - the bundle installer, which pops up the changelog in a message box once
//!   the package has been unpacked, and
//! - the GUI "install from path" flow, which appends the changelog to the
//!   upgrade question before anything is installed.
//!
//! The changelog is only shown when the package replaces a different version
//! of an add-on that is already installed.

mod legacy;
pub mod logging;
mod modern;
pub mod settings;

use addonlog_host::{HookHandle, HookRegistry};
use addonlog_platform::AppPaths;
use log::info;

pub use legacy::{ChangelogBundleInstaller, display_addon_changelog};
pub use modern::{ChangelogPathInstaller, whats_new_section};
pub use settings::PluginSettings;

/// A loaded instance of the plugin and the hooks it owns.
#[derive(Debug)]
pub struct ChangelogPlugin {
    settings: PluginSettings,
    handles: Vec<HookHandle>,
}

impl ChangelogPlugin {
    /// Register the enabled install overrides with `registry`.
    pub fn load(registry: &mut HookRegistry, settings: PluginSettings) -> Self {
        let mut handles = Vec::new();

        if settings.legacy_hook_enabled {
            handles.push(registry.register_bundle_installer(ChangelogBundleInstaller::new(
                settings.changelog_file_name.clone(),
            )));
        }
        if settings.modern_hook_enabled {
            handles.push(registry.register_path_installer(ChangelogPathInstaller::new(
                settings.changelog_file_name.clone(),
            )));
        }

        info!(
            "Changelog plugin loaded with {} hook(s), looking for {}",
            handles.len(),
            settings.changelog_file_name
        );
        Self { settings, handles }
    }

    /// Read settings and set up logging under `paths`, then [`load`](Self::load).
    pub fn start(registry: &mut HookRegistry, paths: &AppPaths) -> Self {
        let settings = PluginSettings::load_from(&paths.settings_file());
        if !logging::init_logging(paths, settings.debug_logging, settings.max_log_size_bytes) {
            info!("A logger is already installed, plugin messages go to it");
        }
        Self::load(registry, settings)
    }

    #[must_use]
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    #[must_use]
    pub fn handles(&self) -> &[HookHandle] {
        &self.handles
    }

    /// Remove every hook this plugin registered, restoring the previous
    /// installers.
    pub fn unload(self, registry: &mut HookRegistry) {
        for handle in self.handles {
            registry.unregister(handle);
        }
        info!("Changelog plugin unloaded");
    }
}
