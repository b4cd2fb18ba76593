use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

/// Manifest entry every add-on package carries at its root.
pub const MANIFEST_FILE_NAME: &str = "manifest.ini";
/// Default changelog entry name.
pub const CHANGELOG_FILE_NAME: &str = "changelog.txt";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Zip {
        context: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("archive has no '{0}' entry")]
    MissingEntry(String),
}

impl ArchiveError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    fn zip(context: &'static str, source: zip::result::ZipError) -> Self {
        Self::Zip { context, source }
    }

    fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

fn open_archive(zip_path: &Path) -> Result<zip::ZipArchive<File>, ArchiveError> {
    let file = File::open(zip_path).map_err(|error| {
        ArchiveError::io_with_path("failed to open package file", zip_path, &error)
    })?;
    zip::ZipArchive::new(file)
        .map_err(|error| ArchiveError::zip("failed to read package archive", error))
}

/// Extract every entry of a package into `dest`.
///
/// Entries whose path would land outside `dest` are skipped.
///
/// # Errors
/// Returns an error when the archive cannot be opened or an entry cannot be
/// written.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let mut archive = open_archive(zip_path)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| ArchiveError::zip("failed to read zip entry", error))?;
        let Some(name) = decode_entry_name(entry.name_raw(), entry.name()) else {
            warn!("Skipping zip entry {i} with undecodable name");
            continue;
        };
        let Some(relative) = enclosed_relative_path(&name) else {
            warn!("Skipping zip entry with unsafe path: {name}");
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|error| {
                ArchiveError::io_with_path(
                    "failed to create extraction directory",
                    &out_path,
                    &error,
                )
            })?;
            continue;
        }

        write_entry(&mut entry, &out_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode));
            }
        }
    }

    debug!("Extraction complete to {}", dest.display());
    Ok(())
}

/// Extract only the manifest and changelog entries of a package.
///
/// Matching is on the entry's base name, ignoring ASCII case; the entry's
/// relative directory is preserved under `dest`. Returns the relative paths
/// written.
///
/// # Errors
/// Returns an error when the archive cannot be opened or a matching entry
/// cannot be written.
pub fn extract_package_metadata(
    zip_path: &Path,
    dest: &Path,
    changelog_file_name: &str,
) -> Result<Vec<PathBuf>, ArchiveError> {
    extract_matching(zip_path, dest, &[MANIFEST_FILE_NAME, changelog_file_name])
}

fn extract_matching(
    zip_path: &Path,
    dest: &Path,
    file_names: &[&str],
) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut archive = open_archive(zip_path)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| ArchiveError::zip("failed to read zip entry", error))?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = decode_entry_name(entry.name_raw(), entry.name()) else {
            warn!("Skipping zip entry {i} with undecodable name");
            continue;
        };
        let Some(relative) = enclosed_relative_path(&name) else {
            warn!("Skipping zip entry with unsafe path: {name}");
            continue;
        };
        if !base_name_matches(&relative, file_names) {
            continue;
        }

        let out_path = dest.join(&relative);
        write_entry(&mut entry, &out_path)?;
        debug!("Extracted {} from {}", relative.display(), zip_path.display());
        extracted.push(relative);
    }

    Ok(extracted)
}

/// Read a UTF-8 entry stored at the root of a package, matched ignoring
/// ASCII case.
///
/// # Errors
/// Returns an error when the archive cannot be opened, has no such entry, or
/// the entry is not valid UTF-8.
pub fn read_entry(zip_path: &Path, file_name: &str) -> Result<String, ArchiveError> {
    let mut archive = open_archive(zip_path)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|error| ArchiveError::zip("failed to read zip entry", error))?;
        let Some(name) = decode_entry_name(entry.name_raw(), entry.name()) else {
            continue;
        };
        if entry.is_dir() || !name.eq_ignore_ascii_case(file_name) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|error| ArchiveError::io("failed to read archive entry", error))?;
        return Ok(content);
    }

    Err(ArchiveError::MissingEntry(file_name.to_string()))
}

fn write_entry(entry: &mut impl Read, out_path: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            ArchiveError::io_with_path(
                "failed to create extraction parent directory",
                parent,
                &error,
            )
        })?;
    }
    let mut outfile = File::create(out_path).map_err(|error| {
        ArchiveError::io_with_path("failed to create extracted file", out_path, &error)
    })?;
    std::io::copy(entry, &mut outfile).map_err(|error| {
        ArchiveError::io_with_path("failed to extract archive entry", out_path, &error)
    })?;
    Ok(())
}

/// Pick the text form of an entry name.
///
/// `zip_name` is the `zip` crate's own decoding: UTF-8 when the entry's
/// language-encoding flag is set, CP437 otherwise. When the two disagree the
/// entry was written by a legacy tool and its bytes are in the OEM codepage.
fn decode_entry_name(raw: &[u8], zip_name: &str) -> Option<String> {
    if raw.is_ascii() || std::str::from_utf8(raw).is_ok_and(|utf8| utf8 == zip_name) {
        return Some(zip_name.to_string());
    }

    addonlog_platform::decode_oem(raw).or_else(|| {
        if cfg!(windows) {
            None
        } else {
            Some(zip_name.to_string())
        }
    })
}

fn enclosed_relative_path(name: &str) -> Option<PathBuf> {
    if name.starts_with(['/', '\\']) {
        return None;
    }

    let mut relative = PathBuf::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            _ if part.contains(':') => return None,
            _ => relative.push(part),
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

fn base_name_matches(relative: &Path, file_names: &[&str]) -> bool {
    relative
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|base| file_names.iter().any(|want| base.eq_ignore_ascii_case(want)))
}
