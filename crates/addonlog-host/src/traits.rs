use std::path::{Path, PathBuf};

use addonlog_core::Manifest;

use crate::error::HostError;
use crate::types::{Addon, AddonBundle, InstallOutcome};

/// The add-on management subsystem of the host application.
///
/// Install flows run on the host's UI thread, one at a time.
pub trait AddonHost {
    /// UI language code, for example `en` or `pt_BR`.
    fn language(&self) -> String;

    /// Every registered add-on, including ones staged for install.
    fn installed_addons(&self) -> Vec<Addon>;

    /// The active (not staged) add-on registered under `name`.
    fn find_installed(&self, name: &str) -> Option<Addon> {
        self.installed_addons()
            .into_iter()
            .find(|addon| addon.name() == name && !addon.pending_install)
    }

    /// Directory a package with this manifest is staged into.
    fn pending_install_path(&self, manifest: &Manifest) -> PathBuf;

    /// Unpack a bundle into its pending-install path and register it.
    fn extract_bundle(&mut self, bundle: &AddonBundle) -> Result<Addon, HostError>;

    fn run_install_task(&mut self, addon: &Addon, task: &str) -> Result<(), HostError>;

    /// Unregister an add-on and delete its files.
    fn complete_remove(&mut self, addon: &Addon) -> Result<(), HostError>;

    /// Schedule removal of an installed add-on for the next restart.
    fn request_remove(&mut self, addon: &Addon) -> Result<(), HostError>;

    /// Record that `name` needs install completion on restart, and persist.
    fn mark_pending_install(&mut self, name: &str) -> Result<(), HostError>;

    /// Remove files staged during an install attempt.
    fn remove_staged(&mut self, path: &Path) -> Result<(), HostError>;
}

/// Modal, blocking dialogs provided by the host UI.
pub trait Dialogs {
    fn message_box(&self, title: &str, body: &str);

    /// Returns `true` when the user chose "Yes".
    fn ask_yes_no(&self, title: &str, message: &str) -> bool;

    fn show_error(&self, title: &str, message: &str);

    fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Overridable "install bundle" entry point.
pub trait BundleInstaller {
    fn install_bundle(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        bundle: &AddonBundle,
    ) -> Result<Addon, HostError>;
}

/// Overridable "install from path" entry point used by the add-ons GUI.
pub trait PathInstaller {
    fn install_from_path(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        path: &Path,
    ) -> Result<InstallOutcome, HostError>;
}
