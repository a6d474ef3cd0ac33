//! Input file discovery

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, BlurBatchError};

/// List the entries directly inside `dir` whose name ends with `suffix`.
///
/// The match is a literal, case-sensitive suffix comparison on the name
/// alone. Subdirectories are not entered, but a directory or dangling
/// symlink with a matching name is listed and later fails in its worker.
/// Results are sorted by file name so worker ids are stable between runs.
pub fn discover_images(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if dir.exists() && !dir.is_dir() {
        return Err(BlurBatchError::config(format!(
            "Input path is not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BlurBatchError::DiscoveryError {
            dir: dir.to_path_buf(),
            source,
        })?;

        if entry.file_name().to_string_lossy().ends_with(suffix) {
            if !entry.path().is_file() {
                debug!("Listing non-file entry {:?}", entry.path());
            }
            files.push(entry.into_path());
        }
    }

    debug!("Discovered {} files in {:?}", files.len(), dir);

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_suffix_match_is_case_sensitive_and_flat() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("b.jpg"), b"").unwrap();
        fs::write(root.join("a.jpg"), b"").unwrap();
        fs::write(root.join("upper.JPG"), b"").unwrap();
        fs::write(root.join("photo.jpeg"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("nested.jpg"), b"").unwrap();
        fs::create_dir(root.join("folder.jpg")).unwrap();

        let files = discover_images(root, ".jpg").unwrap();
        assert_eq!(
            files,
            vec![root.join("a.jpg"), root.join("b.jpg"), root.join("folder.jpg")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_listed() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.png"), dir.path().join("link.jpg")).unwrap();

        let files = discover_images(dir.path(), ".jpg").unwrap();
        assert_eq!(files, vec![dir.path().join("link.jpg")]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover_images(dir.path(), ".jpg").unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = discover_images(&dir.path().join("missing"), ".jpg").unwrap_err();
        assert!(matches!(err, BlurBatchError::DiscoveryError { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_file_as_input_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.jpg");
        fs::write(&file, b"").unwrap();

        assert!(discover_images(&file, ".jpg").is_err());
    }

    #[test]
    fn test_custom_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();

        let files = discover_images(dir.path(), ".png").unwrap();
        assert_eq!(files, vec![dir.path().join("a.png")]);
    }
}
