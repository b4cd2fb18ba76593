use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STATE_FILE_NAME: &str = "addonsState.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse add-on state: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize add-on state: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StateError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Names of add-ons waiting for a restart to finish installing or removing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsState {
    #[serde(default)]
    pub pending_install: BTreeSet<String>,
    #[serde(default)]
    pub pending_remove: BTreeSet<String>,
}

impl AddonsState {
    /// Load state from disk; a missing file is an empty state.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(StateError::Parse),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(StateError::io("failed to read add-on state", error)),
        }
    }

    /// Persist state, holding an exclusive lock on a sibling lock file.
    ///
    /// # Errors
    /// Returns an error when the lock or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let data = serde_json::to_vec_pretty(self).map_err(StateError::Serialize)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path(path))
            .map_err(|error| StateError::io("failed to open state lock file", error))?;
        lock_file
            .lock_exclusive()
            .map_err(|error| StateError::io("failed to lock add-on state", error))?;

        let result = write_atomic(path, &data)
            .map_err(|error| StateError::io("failed to write add-on state", error));
        let _ = FileExt::unlock(&lock_file);
        result
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "state path has no parent")
    })?;
    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("state");
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", std::process::id()));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}
