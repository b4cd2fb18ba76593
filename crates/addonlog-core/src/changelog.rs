use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

const FALLBACK_LANGUAGE: &str = "en";
const DOC_DIR_NAME: &str = "doc";

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("failed to read changelog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read the changelog that sits next to an add-on's documentation file.
///
/// A missing changelog is the common case and yields `Ok(None)`.
///
/// # Errors
/// Returns an error when the file exists but cannot be read as UTF-8 text.
pub fn read_changelog_beside_doc(
    doc_file: &Path,
    changelog_file_name: &str,
) -> Result<Option<String>, ChangelogError> {
    let Some(doc_dir) = doc_file.parent() else {
        return Ok(None);
    };
    match find_file_ignoring_case(doc_dir, changelog_file_name) {
        Some(path) => read_changelog(&path),
        None => Ok(None),
    }
}

/// Find and read a changelog inside an unpacked (or partially unpacked)
/// package directory.
///
/// Looks in the documentation folder for `language`, then its base language,
/// then English, then the package root.
///
/// # Errors
/// Returns an error when a changelog is found but cannot be read as UTF-8.
pub fn find_changelog_in_package(
    package_dir: &Path,
    language: &str,
    changelog_file_name: &str,
) -> Result<Option<String>, ChangelogError> {
    let mut candidates = doc_language_dirs(package_dir, language);
    candidates.push(package_dir.to_path_buf());

    for dir in candidates {
        if let Some(path) = find_file_ignoring_case(&dir, changelog_file_name) {
            return read_changelog(&path);
        }
    }

    debug!("No changelog in {}", package_dir.display());
    Ok(None)
}

/// Locate an add-on's documentation file using the same language fallback as
/// the changelog lookup.
#[must_use]
pub fn resolve_doc_file(package_dir: &Path, language: &str, doc_file_name: &str) -> Option<PathBuf> {
    doc_language_dirs(package_dir, language)
        .into_iter()
        .map(|dir| dir.join(doc_file_name))
        .find(|path| path.is_file())
}

fn doc_language_dirs(package_dir: &Path, language: &str) -> Vec<PathBuf> {
    let doc_root = package_dir.join(DOC_DIR_NAME);
    let mut languages: Vec<&str> = Vec::with_capacity(3);
    for candidate in [
        language,
        language.split(['_', '-']).next().unwrap_or(language),
        FALLBACK_LANGUAGE,
    ] {
        if !candidate.is_empty() && !languages.contains(&candidate) {
            languages.push(candidate);
        }
    }
    languages.into_iter().map(|lang| doc_root.join(lang)).collect()
}

fn find_file_ignoring_case(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let exact = dir.join(file_name);
    if exact.is_file() {
        return Some(exact);
    }

    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(file_name))
                && entry.path().is_file()
        })
        .map(|entry| entry.path())
}

fn read_changelog(path: &Path) -> Result<Option<String>, ChangelogError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ChangelogError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{
        ChangelogError, doc_language_dirs, find_changelog_in_package, read_changelog_beside_doc,
        resolve_doc_file,
    };

    fn write(path: &Path, content: &[u8]) {
        std::fs::create_dir_all(path.parent().expect("path should have a parent"))
            .expect("parent should be created");
        std::fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn reads_changelog_next_to_doc_file() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let doc = temp.path().join("doc/en/readme.html");
        write(&doc, b"<p>readme</p>");
        write(&temp.path().join("doc/en/changelog.txt"), b"Fixed bug X.");

        let changelog =
            read_changelog_beside_doc(&doc, "changelog.txt").expect("changelog should be read");
        assert_eq!(changelog.as_deref(), Some("Fixed bug X."));
    }

    #[test]
    fn missing_changelog_is_not_an_error() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let doc = temp.path().join("doc/en/readme.html");
        write(&doc, b"<p>readme</p>");

        let changelog =
            read_changelog_beside_doc(&doc, "changelog.txt").expect("lookup should succeed");
        assert!(changelog.is_none());
    }

    #[test]
    fn invalid_utf8_changelog_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let doc = temp.path().join("doc/en/readme.html");
        write(&doc, b"<p>readme</p>");
        write(&temp.path().join("doc/en/changelog.txt"), &[0xff, 0xfe, 0x00]);

        let result = read_changelog_beside_doc(&doc, "changelog.txt");
        assert!(matches!(result, Err(ChangelogError::Read { .. })));
    }

    #[test]
    fn package_lookup_follows_language_fallback() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        write(&temp.path().join("changelog.txt"), b"root");
        write(&temp.path().join("doc/en/changelog.txt"), b"english");
        write(&temp.path().join("doc/es/CHANGELOG.TXT"), b"espanol");

        let spanish = find_changelog_in_package(temp.path(), "es_ES", "changelog.txt")
            .expect("lookup should succeed");
        assert_eq!(spanish.as_deref(), Some("espanol"));

        let german = find_changelog_in_package(temp.path(), "de", "changelog.txt")
            .expect("lookup should succeed");
        assert_eq!(german.as_deref(), Some("english"));
    }

    #[test]
    fn package_lookup_uses_root_changelog_last() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        write(&temp.path().join("manifest.ini"), b"name = foo\n");
        write(&temp.path().join("changelog.txt"), b"root");

        let changelog = find_changelog_in_package(temp.path(), "fr", "changelog.txt")
            .expect("lookup should succeed");
        assert_eq!(changelog.as_deref(), Some("root"));

        std::fs::remove_file(temp.path().join("changelog.txt")).expect("file should be removed");
        let none = find_changelog_in_package(temp.path(), "fr", "changelog.txt")
            .expect("lookup should succeed");
        assert!(none.is_none());
    }

    #[test]
    fn resolve_doc_file_prefers_user_language() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        write(&temp.path().join("doc/en/readme.html"), b"en");
        write(&temp.path().join("doc/pt/readme.html"), b"pt");

        let doc = resolve_doc_file(temp.path(), "pt_BR", "readme.html")
            .expect("documentation should be found");
        assert!(doc.ends_with(Path::new("doc").join("pt").join("readme.html")));

        assert!(resolve_doc_file(temp.path(), "en", "missing.html").is_none());
    }

    #[test]
    fn language_dirs_are_deduplicated() {
        let root = Path::new("addon");
        let dirs = doc_language_dirs(root, "en");
        assert_eq!(dirs, vec![root.join("doc").join("en")]);

        let dirs = doc_language_dirs(root, "zh_TW");
        assert_eq!(dirs.len(), 3);
    }
}
