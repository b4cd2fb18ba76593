use std::path::Path;

use addonlog_core::VersionGate;
use log::{error, info, warn};

use crate::error::HostError;
use crate::messages;
use crate::traits::{AddonHost, BundleInstaller, Dialogs, PathInstaller};
use crate::types::{Addon, AddonBundle, InstallOutcome};

pub const ON_INSTALL_TASK: &str = "onInstall";

/// The host's own bundle installation, used when no plugin overrides it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockBundleInstaller;

impl BundleInstaller for StockBundleInstaller {
    fn install_bundle(
        &self,
        host: &mut dyn AddonHost,
        _dialogs: &dyn Dialogs,
        bundle: &AddonBundle,
    ) -> Result<Addon, HostError> {
        let addon = host.extract_bundle(bundle)?;
        complete_bundle_install(host, addon)
    }
}

/// Run the install task of a freshly extracted add-on and mark it pending.
///
/// When the task fails the add-on is unregistered and its files deleted, so
/// the caller never sees a half-installed add-on.
///
/// # Errors
/// Returns [`HostError::InstallFailed`] when the install task fails, or the
/// host's error when the pending state cannot be saved.
pub fn complete_bundle_install(host: &mut dyn AddonHost, addon: Addon) -> Result<Addon, HostError> {
    if let Err(task_error) = host.run_install_task(&addon, ON_INSTALL_TASK) {
        error!(
            "task '{ON_INSTALL_TASK}' on addon '{}' failed: {task_error}",
            addon.name()
        );
        if let Err(remove_error) = host.complete_remove(&addon) {
            warn!(
                "Failed to roll back add-on '{}' at {}: {remove_error}",
                addon.name(),
                addon.path.display()
            );
        }
        return Err(HostError::install_failed(
            "install tasks",
            task_error.to_string(),
        ));
    }

    host.mark_pending_install(addon.name())?;
    info!(
        "Add-on '{}' {} staged for install at {}",
        addon.name(),
        addon.version(),
        addon.path.display()
    );
    Ok(addon)
}

/// Open a package, telling the user when it cannot be read.
///
/// # Errors
/// Returns [`HostError::BundleOpen`] after the error dialog was shown.
pub fn open_bundle_or_report(dialogs: &dyn Dialogs, path: &Path) -> Result<AddonBundle, HostError> {
    AddonBundle::open(path).inspect_err(|open_error| {
        error!("Error opening addon bundle from {}: {open_error}", path.display());
        dialogs.show_error(
            &messages::title(dialogs, messages::ERROR_TITLE),
            &messages::open_failed(dialogs, path),
        );
    })
}

/// The host's own GUI install flow, used when no plugin overrides it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockPathInstaller;

impl PathInstaller for StockPathInstaller {
    fn install_from_path(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        path: &Path,
    ) -> Result<InstallOutcome, HostError> {
        let bundle = open_bundle_or_report(dialogs, path)?;
        let installed = host.find_installed(&bundle.manifest().name);
        let gate = VersionGate::evaluate(
            bundle.manifest(),
            installed.as_ref().map(|addon| &addon.manifest),
        );

        let question = messages::confirmation_question(dialogs, &gate, bundle.manifest());
        if !dialogs.ask_yes_no(
            &messages::title(dialogs, messages::INSTALL_TITLE),
            &question,
        ) {
            info!("Installation of '{}' declined", bundle.manifest().name);
            return Ok(InstallOutcome::Declined);
        }

        let addon = StockBundleInstaller.install_bundle(host, dialogs, &bundle)?;
        replace_previous(host, installed.as_ref(), &addon)?;
        Ok(InstallOutcome::Installed(addon))
    }
}

/// Schedule removal of the version `addon` replaces.
///
/// Runs only once the new version is fully staged, so a failed install never
/// leaves the old one marked for removal. If the removal cannot be recorded
/// the new version is rolled back instead.
///
/// # Errors
/// Returns the host's error from `request_remove`.
pub fn replace_previous(
    host: &mut dyn AddonHost,
    previous: Option<&Addon>,
    addon: &Addon,
) -> Result<(), HostError> {
    let Some(previous) = previous else {
        return Ok(());
    };
    host.request_remove(previous).inspect_err(|remove_error| {
        error!(
            "Could not schedule removal of '{}' {}: {remove_error}",
            previous.name(),
            previous.version()
        );
        if let Err(rollback_error) = host.complete_remove(addon) {
            warn!(
                "Failed to roll back add-on '{}' at {}: {rollback_error}",
                addon.name(),
                addon.path.display()
            );
        }
    })
}
