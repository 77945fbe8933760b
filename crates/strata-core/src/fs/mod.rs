//! Filesystem primitives shared across features.

use std::fs;
use std::path::Path;

use anyhow::Context;

/// Remove a path (file or directory) if it exists.
///
/// Returns `Ok(true)` if something was removed, `Ok(false)` if path didn't exist.
pub fn remove_path_if_exists(path: &Path) -> anyhow::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read metadata: {}", path.display()));
        }
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(true)
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Path has no file name: {}", path.display()))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!("{}.{}.tmp", file_name, std::process::id()));

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write tmp file: {}", tmp_path.display()))?;

    // Remove target first on Windows for replace semantics
    if cfg!(windows) && path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing file: {}", path.display()))?;
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename tmp file: {}", tmp_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn remove_missing_path_is_noop() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let removed =
            remove_path_if_exists(&tmp.path().join("absent")).expect("remove should succeed");
        assert!(!removed);
    }

    #[test]
    fn remove_file_and_directory() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let file = tmp.path().join("a.jar");
        let dir = tmp.path().join("b.jar");
        fs::write(&file, b"zip").expect("write should succeed");
        fs::create_dir_all(dir.join("nested")).expect("create_dir_all should succeed");
        fs::write(dir.join("nested").join("deploy.xml"), b"<deploy/>")
            .expect("write should succeed");

        assert!(remove_path_if_exists(&file).expect("remove file should succeed"));
        assert!(remove_path_if_exists(&dir).expect("remove dir should succeed"));
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn write_atomic_replaces_content_and_leaves_no_tmp() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let target = tmp.path().join("state").join("doc.json");

        write_atomic(&target, b"first").expect("first write should succeed");
        write_atomic(&target, b"second").expect("second write should succeed");

        assert_eq!(fs::read(&target).expect("read should succeed"), b"second");
        let leftovers: Vec<_> = fs::read_dir(target.parent().expect("parent exists"))
            .expect("read_dir should succeed")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "tmp file should be renamed away");
    }
}
