//! Server configuration
//!
//! Servers are declared in `strata.toml`:
//! - `deploy_dir`: where artifacts land on the target runtime
//! - `zip_deployments`: publish one archive (default) or a raw directory tree
//! - `state_dir`: where the version ledger and temporary archives live

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

use std::path::PathBuf;

use crate::types::ModuleTree;

pub use parser::{parse_strata_toml, parse_strata_toml_str, to_toml};
pub use paths::{default_config_path, default_state_root, server_key};
pub use schema::{ServerEntry, ServerSettings, StrataConfig};
pub use store::ConfigStore;

/// Server-level settings the publisher consults.
pub trait ServerConfig: Send + Sync {
    /// Server name, used in logs.
    fn name(&self) -> &str;

    /// Location the host would deploy `tree` to. Its last segment is replaced
    /// by a versioned artifact name before use.
    fn deployment_location(&self, tree: &ModuleTree) -> PathBuf;

    /// Whether modules are published as a single archive.
    fn zip_deployments(&self) -> bool;

    /// Local scratch directory for archives built before transfer.
    fn temp_state_location(&self) -> PathBuf;

    /// Directory holding the server's version ledger.
    fn state_location(&self) -> PathBuf;
}
