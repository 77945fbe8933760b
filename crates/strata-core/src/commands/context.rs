//! Command context: config loading and service construction for commands.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::{ConfigStore, ServerConfig, ServerSettings, StrataConfig, default_state_root};
use crate::deploy::PublishOrchestrator;
use crate::ledger::VersionLedger;
use crate::module::ModuleResourceProvider;
use crate::transfer::{LocalTransfer, TransferController};

/// Shared state for command execution.
///
/// Loads strata.toml once and builds per-server services from it.
pub struct CommandContext {
    config_store: ConfigStore,
    /// Root for state directories of servers without an explicit `state_dir`
    state_root: PathBuf,
    transfer: Arc<dyn TransferController>,
    config_cache: OnceLock<StrataConfig>,
}

impl CommandContext {
    pub fn new(config_path: PathBuf, state_root: PathBuf) -> Self {
        Self {
            config_store: ConfigStore::new(config_path),
            state_root,
            transfer: Arc::new(LocalTransfer),
            config_cache: OnceLock::new(),
        }
    }

    /// Context with system default paths, optionally overriding the config file.
    pub fn with_defaults(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => crate::config::default_config_path()?,
        };
        Ok(Self::new(config_path, default_state_root()?))
    }

    /// Replace the transfer controller used by orchestrators.
    pub fn with_transfer(mut self, transfer: Arc<dyn TransferController>) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn config_path(&self) -> &Path {
        self.config_store.config_path()
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    /// Loaded configuration, read from disk on first access.
    pub fn config(&self) -> anyhow::Result<&StrataConfig> {
        if let Some(config) = self.config_cache.get() {
            return Ok(config);
        }

        let config = self.config_store.load()?;
        // Another thread may have won the race; either value is the same file.
        let _ = self.config_cache.set(config);
        self.config_cache
            .get()
            .ok_or_else(|| anyhow::anyhow!("Configuration cache was not initialized"))
    }

    /// Resolved settings of server `name`.
    pub fn server(&self, name: &str) -> anyhow::Result<ServerSettings> {
        self.config()?.server(name, &self.state_root)
    }

    /// Every configured server, resolved.
    pub fn servers(&self) -> anyhow::Result<Vec<ServerSettings>> {
        let config = self.config()?;
        Ok(config
            .servers
            .iter()
            .map(|(name, entry)| entry.resolve(name, &self.state_root))
            .collect())
    }

    pub fn ledger(&self, server: &ServerSettings) -> VersionLedger {
        VersionLedger::new(&server.state_location())
    }

    pub fn orchestrator(
        &self,
        server: ServerSettings,
        resources: Arc<dyn ModuleResourceProvider>,
    ) -> PublishOrchestrator {
        PublishOrchestrator::new(Arc::new(server), Arc::clone(&self.transfer), resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerEntry;
    use tempfile::TempDir;

    #[test]
    fn config_is_loaded_once_and_servers_resolve() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("strata.toml");
        let store = ConfigStore::new(config_path.clone());
        let mut config = StrataConfig::new();
        config
            .servers
            .insert("local".to_string(), ServerEntry::new(tmp.path().join("deploy")));
        store.save(&config).unwrap();

        let ctx = CommandContext::new(config_path, tmp.path().join("state"));
        let server = ctx.server("local").unwrap();
        assert_eq!(server.deploy_dir, tmp.path().join("deploy"));
        assert!(server.state_dir.starts_with(tmp.path().join("state")));

        // Changes on disk after first load are not observed
        store.save(&StrataConfig::new()).unwrap();
        assert_eq!(ctx.servers().unwrap().len(), 1);
    }

    #[test]
    fn unknown_server_lists_known_ones() {
        let tmp = TempDir::new().unwrap();
        let ctx = CommandContext::new(tmp.path().join("strata.toml"), tmp.path().join("state"));
        let err = ctx.server("prod").unwrap_err().to_string();
        assert!(err.contains("Unknown server 'prod'"));
    }
}
