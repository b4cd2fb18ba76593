//! Override of the host's bundle installation.
//!
//! Once the package is unpacked and registered, the changelog is shown in a
//! plain message box if it replaces a different version of the same add-on.
//! Installation then continues exactly as the host would do it.

use addonlog_core::{
    CHANGELOG_FILE_NAME, VersionGate, find_changelog_in_package, read_changelog_beside_doc,
};
use addonlog_host::messages::fill;
use addonlog_host::{
    Addon, AddonBundle, AddonHost, BundleInstaller, Dialogs, HostError, complete_bundle_install,
};
use log::{debug, warn};

const WHATS_NEW_TITLE: &str = "Whats new in {summary} {version}";

#[derive(Debug, Clone)]
pub struct ChangelogBundleInstaller {
    changelog_file_name: String,
}

impl ChangelogBundleInstaller {
    pub fn new(changelog_file_name: impl Into<String>) -> Self {
        Self {
            changelog_file_name: changelog_file_name.into(),
        }
    }
}

impl Default for ChangelogBundleInstaller {
    fn default() -> Self {
        Self::new(CHANGELOG_FILE_NAME)
    }
}

impl BundleInstaller for ChangelogBundleInstaller {
    fn install_bundle(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        bundle: &AddonBundle,
    ) -> Result<Addon, HostError> {
        let addon = host.extract_bundle(bundle)?;

        let previous = host
            .installed_addons()
            .into_iter()
            .find(|other| other.name() == addon.name() && other.path != addon.path);
        let gate = VersionGate::evaluate(
            &addon.manifest,
            previous.as_ref().map(|other| &other.manifest),
        );
        if gate.shows_changelog() {
            display_addon_changelog(dialogs, &addon, &host.language(), &self.changelog_file_name);
        }

        complete_bundle_install(host, addon)
    }
}

/// Show the changelog shipped with `addon` in a message box.
///
/// Returns whether a changelog was found and shown. An unreadable changelog
/// is logged and treated as absent.
pub fn display_addon_changelog(
    dialogs: &dyn Dialogs,
    addon: &Addon,
    language: &str,
    changelog_file_name: &str,
) -> bool {
    let lookup = match addon.doc_file_path(language) {
        Some(doc_file) => read_changelog_beside_doc(&doc_file, changelog_file_name),
        None => find_changelog_in_package(&addon.path, language, changelog_file_name),
    };

    let body = match lookup {
        Ok(Some(body)) => body,
        Ok(None) => {
            debug!("Add-on '{}' ships no changelog", addon.name());
            return false;
        }
        Err(error) => {
            warn!("Skipping changelog of '{}': {error}", addon.name());
            return false;
        }
    };

    let title = fill(
        &dialogs.translate(WHATS_NEW_TITLE),
        &[("summary", addon.summary()), ("version", addon.version())],
    );
    dialogs.message_box(&title, &body);
    true
}
