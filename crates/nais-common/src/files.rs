//! File system helpers
//!
//! Folder creation, recursive file search, and zip extraction. Every pipeline
//! stage that checks for or produces an on-disk artifact goes through these.

use crate::error::{NaisError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Create a folder with the given name as a subdirectory of `parent`, if it
/// does not already exist, and return its path.
///
/// Missing intermediate directories are created; an existing folder is
/// success, not an error.
pub fn create_folder(parent: &Path, name: &str) -> Result<PathBuf> {
    let folder = parent.join(name);
    fs::create_dir_all(&folder)?;
    Ok(folder)
}

/// Search the directory tree for a file whose name contains `pattern`
/// (case-insensitive) and return the first match in walk order.
///
/// The extension does not need to be included in the pattern. Returns
/// [`NaisError::FileNotFound`] carrying the directory and pattern when the
/// tree holds no match.
pub fn find_file(directory: &Path, pattern: &str) -> Result<PathBuf> {
    let needle = pattern.to_lowercase();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            NaisError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
            }))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(&needle) {
            debug!(path = %entry.path().display(), "Found file matching '{}'", pattern);
            return Ok(entry.path().to_path_buf());
        }
    }

    Err(NaisError::file_not_found(directory, pattern))
}

/// Extract a zip archive into `destination` and return the list of entry
/// names contained in the archive, in archive order.
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index(index)?.name().to_string());
    }

    info!(
        archive = %archive_path.display(),
        entries = names.len(),
        "Extracting archive to {}",
        destination.display()
    );
    archive.extract(destination)?;

    Ok(names)
}

/// Extract a single-entry zip archive and return the path to the extracted
/// file.
///
/// Returns [`NaisError::AmbiguousArchive`] when the archive contains more
/// than one entry.
pub fn extract_file(archive_path: &Path, destination: &Path) -> Result<PathBuf> {
    let names = extract_zip(archive_path, destination)?;
    match names.as_slice() {
        [name] => Ok(destination.join(name)),
        _ => Err(NaisError::ambiguous_archive(archive_path, names.len())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in entries {
            writer
                .start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_create_folder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();

        let first = create_folder(dir.path(), "2014").unwrap();
        assert!(first.is_dir());

        // Creating it again is a no-op, not an error
        let second = create_folder(dir.path(), "2014").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_create_folder_creates_intermediates() {
        let dir = tempfile::tempdir().unwrap();

        let nested = create_folder(dir.path(), "2014/01/Zone 10").unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_find_file_matches_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("A")).unwrap();
        fs::create_dir(dir.path().join("B")).unwrap();
        fs::write(dir.path().join("A/report.CSV"), "x").unwrap();
        fs::write(dir.path().join("B/summary.csv"), "y").unwrap();

        let found = find_file(dir.path(), "report").unwrap();
        assert_eq!(found, dir.path().join("A/report.CSV"));
    }

    #[test]
    fn test_find_file_returns_first_in_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/World_EEZ_v10.zip"), "x").unwrap();
        fs::write(dir.path().join("b/World_EEZ_v11.zip"), "y").unwrap();

        let found = find_file(dir.path(), "world_eez").unwrap();
        assert_eq!(found, dir.path().join("a/World_EEZ_v10.zip"));
    }

    #[test]
    fn test_find_file_reports_directory_and_pattern() {
        let dir = tempfile::tempdir().unwrap();

        let err = find_file(dir.path(), "missing").unwrap_err();
        match err {
            NaisError::FileNotFound { directory, pattern } => {
                assert_eq!(directory, dir.path());
                assert_eq!(pattern, "missing");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_zip_returns_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data.zip");
        write_zip(&archive, &[("one.txt", b"1"), ("two.txt", b"2")]);

        let dest = dir.path().join("out");
        let names = extract_zip(&archive, &dest).unwrap();

        assert_eq!(names, vec!["one.txt", "two.txt"]);
        assert_eq!(fs::read_to_string(dest.join("one.txt")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dest.join("two.txt")).unwrap(), "2");
    }

    #[test]
    fn test_extract_file_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("single.zip");
        write_zip(&archive, &[("eez_v10.geojson", b"{}")]);

        let dest = dir.path().join("out");
        let extracted = extract_file(&archive, &dest).unwrap();

        assert_eq!(extracted, dest.join("eez_v10.geojson"));
        assert!(extracted.is_file());
    }

    #[test]
    fn test_extract_file_rejects_multi_entry_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("multi.zip");
        write_zip(&archive, &[("a.txt", b"a"), ("b.txt", b"b")]);

        let err = extract_file(&archive, &dir.path().join("out")).unwrap_err();
        match err {
            NaisError::AmbiguousArchive { entries, .. } => assert_eq!(entries, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
