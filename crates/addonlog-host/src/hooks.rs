use std::fmt;
use std::path::Path;

use log::debug;

use crate::error::HostError;
use crate::stock::{StockBundleInstaller, StockPathInstaller};
use crate::traits::{AddonHost, BundleInstaller, Dialogs, PathInstaller};
use crate::types::{Addon, AddonBundle, InstallOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    InstallBundle,
    InstallFromPath,
}

/// Proof of a registration; pass it back to [`HookRegistry::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle {
    id: u64,
    kind: HookKind,
}

impl HookHandle {
    #[must_use]
    pub fn kind(&self) -> HookKind {
        self.kind
    }
}

/// The host's install entry points and the plugin overrides layered on them.
///
/// The most recent registration of a kind is the one that runs; removing it
/// restores whatever was registered before, down to the stock installers.
#[derive(Default)]
pub struct HookRegistry {
    next_id: u64,
    bundle_installers: Vec<(u64, Box<dyn BundleInstaller>)>,
    path_installers: Vec<(u64, Box<dyn PathInstaller>)>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bundle_installer(
        &mut self,
        installer: impl BundleInstaller + 'static,
    ) -> HookHandle {
        let handle = self.next_handle(HookKind::InstallBundle);
        self.bundle_installers.push((handle.id, Box::new(installer)));
        debug!("Registered bundle installer #{}", handle.id);
        handle
    }

    pub fn register_path_installer(
        &mut self,
        installer: impl PathInstaller + 'static,
    ) -> HookHandle {
        let handle = self.next_handle(HookKind::InstallFromPath);
        self.path_installers.push((handle.id, Box::new(installer)));
        debug!("Registered path installer #{}", handle.id);
        handle
    }

    /// Remove a registration. Returns `false` if it was already removed.
    pub fn unregister(&mut self, handle: HookHandle) -> bool {
        let removed = match handle.kind {
            HookKind::InstallBundle => remove_by_id(&mut self.bundle_installers, handle.id),
            HookKind::InstallFromPath => remove_by_id(&mut self.path_installers, handle.id),
        };
        if removed {
            debug!("Unregistered {:?} hook #{}", handle.kind, handle.id);
        }
        removed
    }

    #[must_use]
    pub fn is_registered(&self, handle: HookHandle) -> bool {
        match handle.kind {
            HookKind::InstallBundle => self.bundle_installers.iter().any(|(id, _)| *id == handle.id),
            HookKind::InstallFromPath => self.path_installers.iter().any(|(id, _)| *id == handle.id),
        }
    }

    /// Install an already opened bundle through the active installer.
    ///
    /// # Errors
    /// Propagates the installer's failure; nothing stays registered.
    pub fn install_bundle(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        bundle: &AddonBundle,
    ) -> Result<Addon, HostError> {
        match self.bundle_installers.last() {
            Some((_, installer)) => installer.install_bundle(host, dialogs, bundle),
            None => StockBundleInstaller.install_bundle(host, dialogs, bundle),
        }
    }

    /// Install a package file through the active GUI installer.
    ///
    /// # Errors
    /// Propagates the installer's failure; nothing stays registered.
    pub fn install_from_path(
        &self,
        host: &mut dyn AddonHost,
        dialogs: &dyn Dialogs,
        path: &Path,
    ) -> Result<InstallOutcome, HostError> {
        match self.path_installers.last() {
            Some((_, installer)) => installer.install_from_path(host, dialogs, path),
            None => StockPathInstaller.install_from_path(host, dialogs, path),
        }
    }

    fn next_handle(&mut self, kind: HookKind) -> HookHandle {
        self.next_id += 1;
        HookHandle {
            id: self.next_id,
            kind,
        }
    }
}

fn remove_by_id<T>(entries: &mut Vec<(u64, T)>, id: u64) -> bool {
    let before = entries.len();
    entries.retain(|(entry_id, _)| *entry_id != id);
    entries.len() != before
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("bundle_installers", &self.bundle_installers.len())
            .field("path_installers", &self.path_installers.len())
            .finish_non_exhaustive()
    }
}
