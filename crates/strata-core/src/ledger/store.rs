//! Ledger persistence in the server state directory
//!
//! One JSON document per server, always fully read, mutated in memory and
//! fully rewritten. Mutations of the same document are serialized through a
//! process-wide lock registry.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use anyhow::Context;

use crate::fs::write_atomic;
use crate::ledger::document::DeploymentDescriptor;

/// File name of the ledger document inside a server's state directory
pub const LEDGER_FILE_NAME: &str = "deployment-versions.json";

/// Raw load/save of ledger documents
pub struct LedgerStore;

impl LedgerStore {
    /// Path of the ledger document for a server state directory
    pub fn document_path(state_dir: &Path) -> PathBuf {
        state_dir.join(LEDGER_FILE_NAME)
    }

    /// Load a ledger document from disk
    ///
    /// Returns a new empty document if the file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<DeploymentDescriptor> {
        if !path.exists() {
            return Ok(DeploymentDescriptor::new());
        }

        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read version ledger: {}", path.display()))?;
        let document: DeploymentDescriptor = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse version ledger: {}", path.display()))?;
        document.validate()?;
        Ok(document)
    }

    /// Save a ledger document atomically (tmp + rename)
    pub fn save(path: &Path, document: &DeploymentDescriptor) -> anyhow::Result<()> {
        let bytes =
            serde_json::to_vec_pretty(document).context("Failed to serialize version ledger")?;
        write_atomic(path, &bytes)
            .with_context(|| format!("Failed to write version ledger: {}", path.display()))
    }
}

/// Lock guarding one ledger document within this process.
fn document_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let registry = LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut locks = registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(()))),
    )
}

/// Version ledger of one server.
///
/// Every method loads the document, applies its change and saves it back
/// while holding the document's lock.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    document_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl VersionLedger {
    /// Create a ledger stored in `state_dir`.
    pub fn new(state_dir: &Path) -> Self {
        Self::at_path(LedgerStore::document_path(state_dir))
    }

    /// Create a ledger backed by an explicit document path.
    pub fn at_path(document_path: PathBuf) -> Self {
        let lock = document_lock(&document_path);
        Self {
            document_path,
            lock,
        }
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Load the current document (read-only access).
    pub fn load(&self) -> anyhow::Result<DeploymentDescriptor> {
        let _guard = self.guard();
        LedgerStore::load(&self.document_path)
    }

    /// Recorded paths of `project`, oldest first.
    pub fn list(&self, project: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.load()?.versions(project))
    }

    /// Projects that have a record.
    pub fn projects(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.load()?.project_names())
    }

    /// Append `path` to the record of `project`.
    pub fn add(&self, project: &str, path: &str) -> anyhow::Result<()> {
        self.modify(|document| document.add_version(project, path))?;
        tracing::debug!(project, path, "Recorded deployed version");
        Ok(())
    }

    /// Remove every entry of `project` equal to `path`.
    ///
    /// Returns the number of entries removed. A missing document or record
    /// is a no-op and nothing is written.
    pub fn remove_one(&self, project: &str, path: &str) -> anyhow::Result<usize> {
        let _guard = self.guard();
        if !self.document_path.exists() {
            return Ok(0);
        }
        let mut document = LedgerStore::load(&self.document_path)?;
        if !document.has_project(project) {
            return Ok(0);
        }
        let removed = document.remove_version(project, path);
        LedgerStore::save(&self.document_path, &document)?;
        Ok(removed)
    }

    /// Drop the whole record of `project`.
    ///
    /// Returns `true` if a record existed. A missing document or record is a
    /// no-op and nothing is written.
    pub fn remove_project(&self, project: &str) -> anyhow::Result<bool> {
        let _guard = self.guard();
        if !self.document_path.exists() {
            return Ok(false);
        }
        let mut document = LedgerStore::load(&self.document_path)?;
        if !document.remove_project(project) {
            return Ok(false);
        }
        LedgerStore::save(&self.document_path, &document)?;
        Ok(true)
    }

    /// Modify the document with a custom function.
    pub fn modify<F, R>(&self, f: F) -> anyhow::Result<R>
    where
        F: FnOnce(&mut DeploymentDescriptor) -> R,
    {
        let _guard = self.guard();
        let mut document = LedgerStore::load(&self.document_path)?;
        let result = f(&mut document);
        LedgerStore::save(&self.document_path, &document)?;
        Ok(result)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_empty_document() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let document = LedgerStore::load(&tmp.path().join(LEDGER_FILE_NAME))
            .expect("load should succeed");

        assert_eq!(document.version, 1);
        assert!(document.projects.is_empty());
    }

    #[test]
    fn test_document_created_lazily_on_first_add() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let ledger = VersionLedger::new(&tmp.path().join("server"));

        assert!(ledger.list("P").expect("list should succeed").is_empty());
        assert!(!ledger.document_path().exists());

        ledger.add("P", "/srv/a.jar").expect("add should succeed");
        assert!(ledger.document_path().exists());
    }

    #[test]
    fn test_remove_on_missing_document_writes_nothing() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let ledger = VersionLedger::new(tmp.path());

        assert_eq!(
            ledger
                .remove_one("P", "/srv/a.jar")
                .expect("remove_one should succeed"),
            0
        );
        assert!(
            !ledger
                .remove_project("P")
                .expect("remove_project should succeed")
        );
        assert!(!ledger.document_path().exists());
    }

    #[test]
    fn test_remove_unknown_project_leaves_document_untouched() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let ledger = VersionLedger::new(tmp.path());
        let compact = br#"{"version":1,"projects":{"P":["/srv/a.jar"]}}"#;
        fs::write(ledger.document_path(), compact).expect("write should succeed");

        assert!(
            !ledger
                .remove_project("Q")
                .expect("remove_project should succeed")
        );
        assert_eq!(
            fs::read(ledger.document_path()).expect("read should succeed"),
            compact.to_vec()
        );
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let ledger = VersionLedger::new(tmp.path());
        fs::write(ledger.document_path(), b"{not json").expect("write should succeed");

        assert!(ledger.list("P").is_err());
        assert!(ledger.add("P", "/srv/a.jar").is_err());
    }

    #[test]
    fn test_ledgers_on_same_path_share_lock() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let a = VersionLedger::new(tmp.path());
        let b = VersionLedger::new(tmp.path());
        assert!(Arc::ptr_eq(&a.lock, &b.lock));

        let other = TempDir::new().expect("tempdir should succeed");
        let c = VersionLedger::new(other.path());
        assert!(!Arc::ptr_eq(&a.lock, &c.lock));
    }

    #[test]
    fn test_modify_returns_closure_result() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let ledger = VersionLedger::new(tmp.path());

        let count = ledger
            .modify(|document| {
                document.add_version("P", "/srv/a.jar");
                document.add_version("Q", "/srv/b.jar");
                document.projects.len()
            })
            .expect("modify should succeed");

        assert_eq!(count, 2);
        assert_eq!(
            ledger.projects().expect("projects should succeed"),
            vec!["P", "Q"]
        );
    }
}
