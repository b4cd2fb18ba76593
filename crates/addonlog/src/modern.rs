//! Override of the host's GUI "install from path" flow.
//!
//! Only the manifest and changelog are unpacked into the staging directory
//! before the user is asked; the changelog is appended to the upgrade
//! question so the user can read it before deciding.

use std::path::Path;

use addonlog_core::{
    CHANGELOG_FILE_NAME, VersionGate, extract_package_metadata, find_changelog_in_package,
};
use addonlog_host::messages::{self, fill};
use addonlog_host::{
    AddonHost, BundleInstaller, Dialogs, HostError, InstallOutcome, PathInstaller,
    StockBundleInstaller, open_bundle_or_report, replace_previous,
};
use log::{debug, error, info, warn};

const WHATS_NEW_HEADING: &str = "Whats new in {version}:";

#[derive(Debug, Clone)]
pub struct ChangelogPathInstaller {
    changelog_file_name: String,
}

impl ChangelogPathInstaller {
    pub fn new(changelog_file_name: impl Into<String>) -> Self {
        Self {
            changelog_file_name: changelog_file_name.into(),
        }
    }
}

impl Default for ChangelogPathInstaller {
    fn default() -> Self {
        Self::new(CHANGELOG_FILE_NAME)
    }
}

impl PathInstaller for ChangelogPathInstaller {
    fn install_from_path(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        path: &Path,
    ) -> Result<InstallOutcome, HostError> {
        let bundle = open_bundle_or_report(dialogs, path)?;
        let manifest = bundle.manifest();
        let staging = host.pending_install_path(manifest);

        if let Err(extract_error) =
            extract_package_metadata(path, &staging, &self.changelog_file_name)
        {
            error!(
                "Error staging add-on metadata from {}: {extract_error}",
                path.display()
            );
            discard_staging(host, &staging);
            dialogs.show_error(
                &messages::title(dialogs, messages::ERROR_TITLE),
                &messages::open_failed(dialogs, path),
            );
            return Err(HostError::bundle_open(path, extract_error.to_string()));
        }

        let installed = host.find_installed(&manifest.name);
        let gate = VersionGate::evaluate(
            manifest,
            installed.as_ref().map(|addon| &addon.manifest),
        );

        let mut question = messages::confirmation_question(dialogs, &gate, manifest);
        if gate.shows_changelog()
            && let Some(changelog) = self.staged_changelog(&staging, &host.language())
        {
            question.push_str(&whats_new_section(dialogs, &manifest.version, &changelog));
        }

        if !dialogs.ask_yes_no(
            &messages::title(dialogs, messages::INSTALL_TITLE),
            &question,
        ) {
            info!(
                "Installation of '{}' {} declined",
                manifest.name, manifest.version
            );
            discard_staging(host, &staging);
            return Ok(InstallOutcome::Declined);
        }

        let addon = StockBundleInstaller
            .install_bundle(host, dialogs, &bundle)
            .inspect_err(|_| discard_staging(host, &staging))?;
        replace_previous(host, installed.as_ref(), &addon)?;
        Ok(InstallOutcome::Installed(addon))
    }
}

impl ChangelogPathInstaller {
    fn staged_changelog(&self, staging: &Path, language: &str) -> Option<String> {
        match find_changelog_in_package(staging, language, &self.changelog_file_name) {
            Ok(changelog) => changelog,
            Err(read_error) => {
                warn!("Skipping unreadable changelog: {read_error}");
                None
            }
        }
    }
}

/// The text appended to the upgrade question.
#[must_use]
pub fn whats_new_section(dialogs: &dyn Dialogs, version: &str, changelog: &str) -> String {
    let heading = fill(
        &dialogs.translate(WHATS_NEW_HEADING),
        &[("version", version)],
    );
    format!("\n\n{heading}\n{changelog}")
}

fn discard_staging(host: &mut dyn AddonHost, staging: &Path) {
    match host.remove_staged(staging) {
        Ok(()) => debug!("Discarded staging {}", staging.display()),
        Err(remove_error) => warn!(
            "Failed to discard staging {}: {remove_error}",
            staging.display()
        ),
    }
}
