use crate::manifest::Manifest;

/// Outcome of comparing an incoming package with what is already installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionGate {
    /// No add-on with the same name is installed.
    FreshInstall,
    /// The same name and the same version string are already installed.
    SameVersion { version: String },
    /// The same name is installed under a different version string.
    VersionChanged { installed: String, incoming: String },
}

impl VersionGate {
    #[must_use]
    pub fn evaluate(incoming: &Manifest, installed: Option<&Manifest>) -> Self {
        match installed {
            Some(installed) if installed.name == incoming.name => {
                if versions_differ(&incoming.version, &installed.version) {
                    Self::VersionChanged {
                        installed: installed.version.clone(),
                        incoming: incoming.version.clone(),
                    }
                } else {
                    Self::SameVersion {
                        version: incoming.version.clone(),
                    }
                }
            }
            _ => Self::FreshInstall,
        }
    }

    /// Whether the changelog of the incoming package should be surfaced.
    #[must_use]
    pub fn shows_changelog(&self) -> bool {
        matches!(self, Self::VersionChanged { .. })
    }
}

/// Version strings are opaque: "1.10" and "1.9" are simply different, and
/// no upgrade or downgrade direction is derived.
#[must_use]
pub fn versions_differ(incoming: &str, installed: &str) -> bool {
    incoming != installed
}
