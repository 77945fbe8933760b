//! Transfer of artifacts to the target system.
//!
//! The publisher never touches the target filesystem directly; it goes
//! through a [`TransferController`] supplied at construction. Every call
//! carries a [`CancelToken`] so long copies can be abandoned between steps.

pub mod local;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use local::LocalTransfer;

/// Copy and delete primitives on the target system.
pub trait TransferController: Send + Sync {
    /// Copy a local file to `dest` on the target system.
    fn copy_file(&self, src: &Path, dest: &Path, cancel: &CancelToken) -> anyhow::Result<()>;

    /// Delete a file or directory tree on the target system.
    fn delete_resource(&self, path: &Path, cancel: &CancelToken) -> anyhow::Result<()>;
}

/// Shared cancellation flag threaded through every publish phase.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with an error naming `step` if cancellation was requested.
    pub fn check(&self, step: &str) -> anyhow::Result<()> {
        if self.is_cancelled() {
            anyhow::bail!("Cancelled before {}", step);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        assert!(token.check("copy").is_ok());

        token.cancel();

        assert!(clone.is_cancelled());
        let err = clone.check("copy").expect_err("check should fail once cancelled");
        assert_eq!(err.to_string(), "Cancelled before copy");
    }
}
