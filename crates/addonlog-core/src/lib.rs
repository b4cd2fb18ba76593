//! Package-level logic shared by the install hooks.
//!
//! This crate has no knowledge of the host application:
//! - Selective and full extraction of add-on ZIP packages.
//! - Changelog and documentation lookup inside an unpacked package.
//! - Manifest parsing.
//! - The version-difference gate deciding when a changelog is surfaced.

pub mod archive;
pub mod changelog;
mod gate;
mod manifest;

/// Archive helpers and the well-known entry names.
pub use archive::{
    ArchiveError, CHANGELOG_FILE_NAME, MANIFEST_FILE_NAME, extract_package_metadata, extract_zip,
    read_entry,
};
/// Changelog lookup next to a documentation file or inside a package directory.
pub use changelog::{
    ChangelogError, find_changelog_in_package, read_changelog_beside_doc, resolve_doc_file,
};
/// String-equality version gate.
pub use gate::{VersionGate, versions_differ};
/// Add-on manifest model and parser.
pub use manifest::{Manifest, ManifestError};
