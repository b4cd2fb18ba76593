use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use addonlog_core::Manifest;
use addonlog_host::{Addon, AddonBundle, AddonHost, HostError};
use log::{debug, info, warn};

use crate::state::{AddonsState, STATE_FILE_NAME};

pub const PENDING_INSTALL_SUFFIX: &str = ".pendingInstall";

const DEFAULT_LANGUAGE: &str = "en";

type InstallTask = Box<dyn Fn(&Addon) -> Result<(), String>>;

pub struct FsAddonHost {
    root: PathBuf,
    language: String,
    addons: Vec<Addon>,
    state: AddonsState,
    tasks: HashMap<String, InstallTask>,
}

impl FsAddonHost {
    /// Open (creating if needed) an add-ons directory and register every
    /// add-on found in it.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or read, or the
    /// state file is unreadable.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, HostError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let state = AddonsState::load(&root.join(STATE_FILE_NAME)).map_err(HostError::state_from)?;
        let addons = scan_addons(&root)?;
        debug!("Found {} add-ons under {}", addons.len(), root.display());

        Ok(Self {
            root,
            language: DEFAULT_LANGUAGE.to_string(),
            addons,
            state,
            tasks: HashMap::new(),
        })
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Run `run` whenever the install task named `task` is requested.
    pub fn register_install_task(
        &mut self,
        task: &str,
        run: impl Fn(&Addon) -> Result<(), String> + 'static,
    ) {
        self.tasks.insert(task.to_string(), Box::new(run));
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn state(&self) -> &AddonsState {
        &self.state
    }

    fn save_state(&self) -> Result<(), HostError> {
        self.state
            .save(&self.root.join(STATE_FILE_NAME))
            .map_err(HostError::state_from)
    }

    /// `path` must name an entry below the root without any `..` or root
    /// components.
    fn ensure_inside_root(&self, path: &Path) -> Result<(), HostError> {
        let inside = path.strip_prefix(&self.root).is_ok_and(|relative| {
            relative.components().next().is_some()
                && relative
                    .components()
                    .all(|part| matches!(part, Component::Normal(_)))
        });
        if inside {
            Ok(())
        } else {
            Err(HostError::State {
                details: format!(
                    "refusing to touch {} outside the add-ons directory",
                    path.display()
                ),
            })
        }
    }

    fn unregister_path(&mut self, path: &Path) {
        self.addons.retain(|addon| addon.path != path);
    }
}

impl AddonHost for FsAddonHost {
    fn language(&self) -> String {
        self.language.clone()
    }

    fn installed_addons(&self) -> Vec<Addon> {
        self.addons.clone()
    }

    fn pending_install_path(&self, manifest: &Manifest) -> PathBuf {
        self.root
            .join(format!("{}{PENDING_INSTALL_SUFFIX}", manifest.name))
    }

    fn extract_bundle(&mut self, bundle: &AddonBundle) -> Result<Addon, HostError> {
        let path = self.pending_install_path(bundle.manifest());
        self.ensure_inside_root(&path)?;
        remove_dir_if_present(&path)?;
        std::fs::create_dir_all(&path)?;

        if let Err(error) = bundle.extract(&path) {
            let _ = remove_dir_if_present(&path);
            return Err(error);
        }

        let addon = Addon::new(path, bundle.manifest().clone()).pending();
        self.unregister_path(&addon.path);
        self.addons.push(addon.clone());
        debug!(
            "Extracted {} into {}",
            bundle.path().display(),
            addon.path.display()
        );
        Ok(addon)
    }

    fn run_install_task(&mut self, addon: &Addon, task: &str) -> Result<(), HostError> {
        match self.tasks.get(task) {
            Some(run) => {
                run(addon).map_err(|details| HostError::task_failed(task, addon.name(), details))
            }
            None => Ok(()),
        }
    }

    fn complete_remove(&mut self, addon: &Addon) -> Result<(), HostError> {
        self.unregister_path(&addon.path);
        remove_dir_if_present(&addon.path)?;
        if addon.pending_install && self.state.pending_install.remove(addon.name()) {
            self.save_state()?;
        }
        info!("Removed add-on '{}' from {}", addon.name(), addon.path.display());
        Ok(())
    }

    fn request_remove(&mut self, addon: &Addon) -> Result<(), HostError> {
        if !self.addons.iter().any(|known| known.path == addon.path) {
            return Err(HostError::AddonNotFound {
                name: addon.name().to_string(),
            });
        }
        self.state.pending_remove.insert(addon.name().to_string());
        self.save_state()
    }

    fn mark_pending_install(&mut self, name: &str) -> Result<(), HostError> {
        self.state.pending_install.insert(name.to_string());
        self.save_state()
    }

    fn remove_staged(&mut self, path: &Path) -> Result<(), HostError> {
        self.ensure_inside_root(path)?;
        self.unregister_path(path);
        remove_dir_if_present(path)?;
        debug!("Removed staged files at {}", path.display());
        Ok(())
    }
}

impl fmt::Debug for FsAddonHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsAddonHost")
            .field("root", &self.root)
            .field("language", &self.language)
            .field("addons", &self.addons)
            .field("state", &self.state)
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn scan_addons(root: &Path) -> Result<Vec<Addon>, HostError> {
    let mut addons = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let pending = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(PENDING_INSTALL_SUFFIX));

        match Addon::load(&path) {
            Ok(addon) if pending => addons.push(addon.pending()),
            Ok(addon) => addons.push(addon),
            Err(error) => warn!("Ignoring {}: {error}", path.display()),
        }
    }
    addons.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(addons)
}

fn remove_dir_if_present(path: &Path) -> Result<(), HostError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::path::Path;

    use addonlog_host::{
        AddonBundle, AddonHost, Dialogs, HostError, ON_INSTALL_TASK, PathInstaller,
        StockPathInstaller, complete_bundle_install,
    };

    use super::FsAddonHost;

    fn write_package(path: &Path, name: &str, version: &str) {
        let file = std::fs::File::create(path).expect("package should be created");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer
            .start_file("manifest.ini", options)
            .expect("manifest entry should be started");
        write!(writer, "name = {name}\nversion = {version}\n").expect("manifest should be written");
        writer
            .start_file("globalPlugins/plugin.py", options)
            .expect("plugin entry should be started");
        writer.write_all(b"pass\n").expect("plugin should be written");
        writer.finish().expect("package should be finalized");
    }

    struct AlwaysYes;

    impl Dialogs for AlwaysYes {
        fn message_box(&self, _title: &str, _body: &str) {}

        fn ask_yes_no(&self, _title: &str, _message: &str) -> bool {
            true
        }

        fn show_error(&self, _title: &str, _message: &str) {}
    }

    fn install_dir(root: &Path, name: &str, version: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).expect("addon dir should be created");
        std::fs::write(
            dir.join("manifest.ini"),
            format!("name = {name}\nversion = {version}\n"),
        )
        .expect("manifest should be written");
    }

    #[test]
    fn open_registers_installed_and_pending_addons() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        install_dir(temp.path(), "foo", "1.0");
        install_dir(temp.path(), "bar.pendingInstall", "2.0");
        std::fs::create_dir_all(temp.path().join("broken")).expect("dir should be created");

        let host = FsAddonHost::open(temp.path()).expect("host should open");
        let addons = host.installed_addons();

        assert_eq!(addons.len(), 2);
        let foo = host.find_installed("foo").expect("foo should be installed");
        assert_eq!(foo.version(), "1.0");
        assert!(host.find_installed("bar.pendingInstall").is_none());
        assert!(addons.iter().any(|addon| addon.pending_install));
    }

    #[test]
    fn stock_install_stages_and_records_pending_install() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let package = temp.path().join("foo.nvda-addon");
        write_package(&package, "foo", "1.1");
        let mut host = FsAddonHost::open(temp.path().join("addons")).expect("host should open");

        let bundle = AddonBundle::open(&package).expect("bundle should open");
        let staged = host.extract_bundle(&bundle).expect("bundle should extract");
        let addon = complete_bundle_install(&mut host, staged).expect("install should complete");

        assert!(addon.pending_install);
        assert!(addon.path.join("globalPlugins/plugin.py").is_file());
        assert!(host.state().pending_install.contains("foo"));

        let reopened = FsAddonHost::open(host.root()).expect("host should reopen");
        assert!(reopened.state().pending_install.contains("foo"));
    }

    #[test]
    fn failing_install_task_rolls_back() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let package = temp.path().join("foo.nvda-addon");
        write_package(&package, "foo", "1.1");
        let mut host = FsAddonHost::open(temp.path().join("addons")).expect("host should open");
        host.register_install_task(ON_INSTALL_TASK, |_| Err("boom".to_string()));

        let bundle = AddonBundle::open(&package).expect("bundle should open");
        let staged = host.extract_bundle(&bundle).expect("bundle should extract");
        let staged_path = staged.path.clone();
        let result = complete_bundle_install(&mut host, staged);

        assert!(matches!(result, Err(HostError::InstallFailed { .. })));
        assert!(!staged_path.exists());
        assert!(host.installed_addons().is_empty());
        assert!(host.state().pending_install.is_empty());
    }

    #[test]
    fn request_remove_requires_a_registered_addon() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        install_dir(temp.path(), "foo", "1.0");
        let mut host = FsAddonHost::open(temp.path()).expect("host should open");
        let foo = host.find_installed("foo").expect("foo should be installed");

        host.request_remove(&foo).expect("removal should be scheduled");
        assert!(host.state().pending_remove.contains("foo"));

        let mut stranger = foo.clone();
        stranger.path = temp.path().join("elsewhere");
        assert!(matches!(
            host.request_remove(&stranger),
            Err(HostError::AddonNotFound { .. })
        ));
    }

    #[test]
    fn remove_staged_refuses_paths_outside_root() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let outside = temp.path().join("outside");
        std::fs::create_dir_all(&outside).expect("dir should be created");
        let mut host = FsAddonHost::open(temp.path().join("addons")).expect("host should open");

        assert!(host.remove_staged(&outside).is_err());
        assert!(outside.is_dir());
        assert!(host.remove_staged(&host.root().join("../outside")).is_err());
        assert!(outside.is_dir());
        assert!(host.remove_staged(&host.root().to_path_buf()).is_err());

        let staged = host.root().join("foo.pendingInstall");
        std::fs::create_dir_all(&staged).expect("staging should be created");
        host.remove_staged(&staged).expect("staging should be removed");
        assert!(!staged.exists());
        host.remove_staged(&staged)
            .expect("removing missing staging is not an error");
    }

    #[test]
    fn failed_upgrade_keeps_previous_version() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let root = temp.path().join("addons");
        install_dir(&root, "foo", "1.0");
        let package = temp.path().join("foo.nvda-addon");
        write_package(&package, "foo", "1.1");
        let mut host = FsAddonHost::open(&root).expect("host should open");
        host.register_install_task(ON_INSTALL_TASK, |_| Err("boom".to_string()));

        let result = StockPathInstaller.install_from_path(&mut host, &AlwaysYes, &package);

        assert!(matches!(result, Err(HostError::InstallFailed { .. })));
        assert!(host.state().pending_remove.is_empty());
        assert!(host.state().pending_install.is_empty());
        assert!(!root.join("foo.pendingInstall").exists());
        let foo = host.find_installed("foo").expect("old version should stay");
        assert_eq!(foo.version(), "1.0");
    }

    #[test]
    fn successful_upgrade_schedules_previous_removal() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let root = temp.path().join("addons");
        install_dir(&root, "foo", "1.0");
        let package = temp.path().join("foo.nvda-addon");
        write_package(&package, "foo", "1.1");
        let mut host = FsAddonHost::open(&root).expect("host should open");

        let outcome = StockPathInstaller
            .install_from_path(&mut host, &AlwaysYes, &package)
            .expect("upgrade should succeed");

        assert!(outcome.installed().is_some());
        assert!(host.state().pending_remove.contains("foo"));
        assert!(host.state().pending_install.contains("foo"));
    }
}
