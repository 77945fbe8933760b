//! strata.toml schema definitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ServerConfig;
use super::paths::server_key;
use crate::deploy::path::ARCHIVE_EXTENSION;
use crate::types::ModuleTree;

/// Directory name for temporary archives inside a server state directory
pub const TEMP_DEPLOY_DIR: &str = "tmp-deploy";

/// Root configuration (strata.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Target servers by name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

impl StrataConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve server `name` into settings the publisher can use.
    ///
    /// Servers without an explicit `state_dir` get
    /// `<default_state_root>/<server_key(name)>`.
    pub fn server(&self, name: &str, default_state_root: &Path) -> anyhow::Result<ServerSettings> {
        let entry = self.servers.get(name).ok_or_else(|| {
            let known: Vec<_> = self.servers.keys().map(|k| k.as_str()).collect();
            anyhow::anyhow!(
                "Unknown server '{}'. Configured servers: {}",
                name,
                if known.is_empty() {
                    "(none)".to_string()
                } else {
                    known.join(", ")
                }
            )
        })?;
        Ok(entry.resolve(name, default_state_root))
    }
}

/// One `[servers.<name>]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Deployment directory on the target runtime (absolute)
    pub deploy_dir: PathBuf,

    /// Publish archives instead of raw directory trees
    #[serde(default = "default_zip_deployments")]
    pub zip_deployments: bool,

    /// State directory for the ledger and temporary archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

fn default_zip_deployments() -> bool {
    true
}

impl ServerEntry {
    pub fn new(deploy_dir: impl Into<PathBuf>) -> Self {
        Self {
            deploy_dir: deploy_dir.into(),
            zip_deployments: true,
            state_dir: None,
        }
    }

    pub fn resolve(&self, name: &str, default_state_root: &Path) -> ServerSettings {
        let state_dir = self
            .state_dir
            .clone()
            .unwrap_or_else(|| default_state_root.join(server_key(name)));
        ServerSettings {
            name: name.to_string(),
            deploy_dir: self.deploy_dir.clone(),
            zip_deployments: self.zip_deployments,
            state_dir,
        }
    }
}

/// Fully resolved settings of one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub name: String,
    pub deploy_dir: PathBuf,
    pub zip_deployments: bool,
    pub state_dir: PathBuf,
}

impl ServerConfig for ServerSettings {
    fn name(&self) -> &str {
        &self.name
    }

    fn deployment_location(&self, tree: &ModuleTree) -> PathBuf {
        let mut path = self.deploy_dir.clone();
        for module in tree.modules() {
            path.push(format!("{}.{}", module.name, ARCHIVE_EXTENSION));
        }
        path
    }

    fn zip_deployments(&self) -> bool {
        self.zip_deployments
    }

    fn temp_state_location(&self) -> PathBuf {
        self.state_dir.join(TEMP_DEPLOY_DIR)
    }

    fn state_location(&self) -> PathBuf {
        self.state_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleRef;

    #[test]
    fn deployment_location_nests_module_tree() {
        let settings = ServerEntry::new("/opt/ode/processes").resolve("local", Path::new("/state"));
        let tree = ModuleTree::new(vec![ModuleRef::new("suite"), ModuleRef::new("orders")])
            .expect("tree should build");

        assert_eq!(
            settings.deployment_location(&tree),
            PathBuf::from("/opt/ode/processes/suite.jar/orders.jar")
        );
    }

    #[test]
    fn default_state_dir_uses_server_key() {
        let settings = ServerEntry::new("/deploy").resolve("local", Path::new("/state"));
        assert_eq!(settings.state_dir, Path::new("/state").join(server_key("local")));
        assert_eq!(
            settings.temp_state_location(),
            settings.state_dir.join(TEMP_DEPLOY_DIR)
        );
    }

    #[test]
    fn unknown_server_lists_configured_names() {
        let mut config = StrataConfig::new();
        config
            .servers
            .insert("local".to_string(), ServerEntry::new("/deploy"));

        let err = config
            .server("remote", Path::new("/state"))
            .expect_err("unknown server should fail");
        assert!(err.to_string().contains("local"));
    }
}
