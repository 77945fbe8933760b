//! Transfer controller for a target runtime on the local filesystem.

use std::path::Path;

use anyhow::Context;

use super::{CancelToken, TransferController};
use crate::fs::{ensure_parent_dir, remove_path_if_exists};

/// Copies and deletes directly on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransfer;

impl LocalTransfer {
    pub fn new() -> Self {
        Self
    }
}

impl TransferController for LocalTransfer {
    fn copy_file(&self, src: &Path, dest: &Path, cancel: &CancelToken) -> anyhow::Result<()> {
        cancel.check(&format!("copying {}", dest.display()))?;
        ensure_parent_dir(dest)?;
        std::fs::copy(src, dest).with_context(|| {
            format!("Failed to copy {} to {}", src.display(), dest.display())
        })?;
        tracing::debug!(src = %src.display(), dest = %dest.display(), "Copied file");
        Ok(())
    }

    fn delete_resource(&self, path: &Path, cancel: &CancelToken) -> anyhow::Result<()> {
        cancel.check(&format!("deleting {}", path.display()))?;
        let removed = remove_path_if_exists(path)?;
        if !removed {
            tracing::debug!(path = %path.display(), "Resource already absent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn copy_creates_missing_parents() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("archive");
        fs::write(&src, b"payload").expect("write should succeed");
        let dest = tmp.path().join("deploy").join("nested").join("orders-1.jar");

        LocalTransfer::new()
            .copy_file(&src, &dest, &CancelToken::new())
            .expect("copy should succeed");

        assert_eq!(fs::read(&dest).expect("read should succeed"), b"payload");
    }

    #[test]
    fn copy_missing_source_fails() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let result = LocalTransfer::new().copy_file(
            &tmp.path().join("missing"),
            &tmp.path().join("out.jar"),
            &CancelToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn delete_absent_resource_succeeds() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        LocalTransfer::new()
            .delete_resource(&tmp.path().join("gone.jar"), &CancelToken::new())
            .expect("deleting an absent path should succeed");
    }

    #[test]
    fn cancelled_token_blocks_calls() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let target = tmp.path().join("keep.jar");
        fs::write(&target, b"zip").expect("write should succeed");
        let token = CancelToken::new();
        token.cancel();

        assert!(LocalTransfer::new().delete_resource(&target, &token).is_err());
        assert!(target.exists());
    }
}
