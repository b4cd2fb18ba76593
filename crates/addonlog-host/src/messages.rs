//! User-facing text of the install flows.
//!
//! Templates go through [`Dialogs::translate`] before placeholders are
//! filled, so translators see the `{name}` markers.

use std::path::Path;

use addonlog_core::{Manifest, VersionGate};

use crate::traits::Dialogs;

pub const INSTALL_TITLE: &str = "Add-on Installation";
pub const ERROR_TITLE: &str = "Error";

const OPEN_FAILED: &str =
    "Failed to open add-on package file at {path} - missing file or invalid file format";
const INSTALL_QUESTION: &str =
    "Are you sure you want to install this add-on?\nAdd-on: {summary} {version}";
const SAME_VERSION_QUESTION: &str = "You are about to install version {version} of {summary}, \
     which appears to be already installed. Would you still like to update?";
const UPGRADE_QUESTION: &str = "A version of this add-on is already installed. \
     Would you like to update {summary} version {installed} to version {incoming}?";

#[must_use]
pub fn title(dialogs: &dyn Dialogs, template: &str) -> String {
    dialogs.translate(template)
}

#[must_use]
pub fn open_failed(dialogs: &dyn Dialogs, path: &Path) -> String {
    fill(
        &dialogs.translate(OPEN_FAILED),
        &[("path", &path.display().to_string())],
    )
}

/// The confirmation question for an install, picked by the version gate.
#[must_use]
pub fn confirmation_question(
    dialogs: &dyn Dialogs,
    gate: &VersionGate,
    incoming: &Manifest,
) -> String {
    match gate {
        VersionGate::FreshInstall => fill(
            &dialogs.translate(INSTALL_QUESTION),
            &[("summary", &incoming.summary), ("version", &incoming.version)],
        ),
        VersionGate::SameVersion { version } => fill(
            &dialogs.translate(SAME_VERSION_QUESTION),
            &[("summary", &incoming.summary), ("version", version)],
        ),
        VersionGate::VersionChanged {
            installed,
            incoming: incoming_version,
        } => fill(
            &dialogs.translate(UPGRADE_QUESTION),
            &[
                ("summary", &incoming.summary),
                ("installed", installed),
                ("incoming", incoming_version),
            ],
        ),
    }
}

/// Substitute `{key}` markers in a translated template.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}
