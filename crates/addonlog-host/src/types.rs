use std::path::{Path, PathBuf};

use addonlog_core::{MANIFEST_FILE_NAME, Manifest, extract_zip, read_entry, resolve_doc_file};

use crate::error::HostError;

/// An add-on known to the host, installed or staged for install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addon {
    pub path: PathBuf,
    pub manifest: Manifest,
    pub pending_install: bool,
}

impl Addon {
    #[must_use]
    pub fn new(path: PathBuf, manifest: Manifest) -> Self {
        Self {
            path,
            manifest,
            pending_install: false,
        }
    }

    #[must_use]
    pub fn pending(mut self) -> Self {
        self.pending_install = true;
        self
    }

    /// Load an unpacked add-on from its directory.
    ///
    /// # Errors
    /// Returns an error when the manifest is missing or invalid.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path.join(MANIFEST_FILE_NAME))?;
        Ok(Self::new(path.to_path_buf(), Manifest::parse(&text)?))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.manifest.summary
    }

    /// Path to the add-on's documentation for `language`, if it ships one.
    #[must_use]
    pub fn doc_file_path(&self, language: &str) -> Option<PathBuf> {
        resolve_doc_file(&self.path, language, &self.manifest.doc_file_name)
    }
}

/// A package archive on disk together with its manifest.
#[derive(Debug, Clone)]
pub struct AddonBundle {
    path: PathBuf,
    manifest: Manifest,
}

impl AddonBundle {
    /// Open a package and read its manifest without extracting anything.
    ///
    /// # Errors
    /// Returns [`HostError::BundleOpen`] when the file is missing, is not a
    /// ZIP archive, or has no valid manifest.
    pub fn open(path: &Path) -> Result<Self, HostError> {
        let text = read_entry(path, MANIFEST_FILE_NAME)
            .map_err(|error| HostError::bundle_open(path, error.to_string()))?;
        let manifest = Manifest::parse(&text)
            .map_err(|error| HostError::bundle_open(path, error.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Unpack the whole package into `dest`.
    ///
    /// # Errors
    /// Returns an error when the archive cannot be read or written out.
    pub fn extract(&self, dest: &Path) -> Result<(), HostError> {
        extract_zip(&self.path, dest)
            .map_err(|error| HostError::install_failed("package extraction", error.to_string()))
    }
}

/// Result of a path-based install the user could decline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(Addon),
    Declined,
}

impl InstallOutcome {
    #[must_use]
    pub fn installed(&self) -> Option<&Addon> {
        match self {
            Self::Installed(addon) => Some(addon),
            Self::Declined => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{Addon, AddonBundle};
    use crate::HostError;

    fn write_package(path: &std::path::Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path).expect("package should be created");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer
                .start_file(*name, options)
                .expect("entry should be started");
            writer
                .write_all(content.as_bytes())
                .expect("entry should be written");
        }
        writer.finish().expect("package should be finalized");
    }

    #[test]
    fn bundle_open_reads_manifest() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("foo.nvda-addon");
        write_package(
            &path,
            &[("manifest.ini", "name = foo\nversion = 1.1\nsummary = Foo\n")],
        );

        let bundle = AddonBundle::open(&path).expect("bundle should open");
        assert_eq!(bundle.manifest().name, "foo");
        assert_eq!(bundle.manifest().version, "1.1");
        assert_eq!(bundle.path(), path.as_path());
    }

    #[test]
    fn bundle_open_rejects_package_without_manifest() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("foo.nvda-addon");
        write_package(&path, &[("readme.txt", "hello")]);

        assert!(matches!(
            AddonBundle::open(&path),
            Err(HostError::BundleOpen { .. })
        ));
    }

    #[test]
    fn addon_load_resolves_documentation() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        std::fs::write(
            temp.path().join("manifest.ini"),
            "name = foo\nversion = 1.0\n",
        )
        .expect("manifest should be written");
        std::fs::create_dir_all(temp.path().join("doc/en")).expect("doc dir should be created");
        std::fs::write(temp.path().join("doc/en/readme.html"), "readme")
            .expect("readme should be written");

        let addon = Addon::load(temp.path()).expect("addon should load");
        assert_eq!(addon.name(), "foo");
        assert!(!addon.pending_install);
        assert_eq!(
            addon.doc_file_path("fr"),
            Some(temp.path().join("doc").join("en").join("readme.html"))
        );
    }
}
