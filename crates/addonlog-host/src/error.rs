use std::path::Path;

use addonlog_core::ManifestError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Failed to open add-on package {path}: {details}")]
    BundleOpen { path: String, details: String },

    #[error(transparent)]
    InvalidManifest(#[from] ManifestError),

    #[error("Installation failed during {phase}: {details}")]
    InstallFailed {
        phase: &'static str,
        details: String,
    },

    #[error("Task '{task}' failed for add-on '{addon}': {details}")]
    TaskFailed {
        task: String,
        addon: String,
        details: String,
    },

    #[error("Add-on not found: {name}")]
    AddonNotFound { name: String },

    #[error("Add-on state error: {details}")]
    State { details: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl HostError {
    pub fn bundle_open(path: &Path, details: impl Into<String>) -> Self {
        Self::BundleOpen {
            path: path.display().to_string(),
            details: details.into(),
        }
    }

    pub fn install_failed(phase: &'static str, details: impl Into<String>) -> Self {
        Self::InstallFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn task_failed(task: &str, addon: &str, details: impl Into<String>) -> Self {
        Self::TaskFailed {
            task: task.to_string(),
            addon: addon.to_string(),
            details: details.into(),
        }
    }

    pub fn state_from<E>(error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::State {
            details: error.to_string(),
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
