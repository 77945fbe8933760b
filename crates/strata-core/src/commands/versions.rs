//! Ledger-facing commands: list, undeploy, and remove deployed versions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::context::CommandContext;
use crate::config::ServerConfig;
use crate::deploy::RemovalReport;
use crate::module::FsResourceProvider;
use crate::transfer::CancelToken;

/// Recorded versions on one server
#[derive(Debug, Clone, Serialize)]
pub struct VersionsReport {
    pub server: String,
    pub ledger_path: PathBuf,
    /// Project name to recorded paths, oldest first
    pub projects: BTreeMap<String, Vec<String>>,
}

impl VersionsReport {
    pub fn total(&self) -> usize {
        self.projects.values().map(|paths| paths.len()).sum()
    }
}

/// Result of undeploying one version
#[derive(Debug, Clone, Serialize)]
pub struct UndeployReport {
    pub server: String,
    pub project: String,
    pub path: String,
    /// Versions still recorded for the project afterwards
    pub remaining: Vec<String>,
}

/// Summary of one configured server
#[derive(Debug, Clone, Serialize)]
pub struct ServerSummary {
    pub name: String,
    pub deploy_dir: PathBuf,
    pub zip_deployments: bool,
    pub state_dir: PathBuf,
    pub recorded_versions: usize,
}

pub struct VersionsCommand<'a> {
    ctx: &'a CommandContext,
}

impl<'a> VersionsCommand<'a> {
    pub fn new(ctx: &'a CommandContext) -> Self {
        Self { ctx }
    }

    /// Recorded versions on `server`, for one project or all of them.
    pub fn list(&self, server: &str, project: Option<&str>) -> anyhow::Result<VersionsReport> {
        let settings = self.ctx.server(server)?;
        let ledger = self.ctx.ledger(&settings);
        let document = ledger.load()?;

        let projects = match project {
            Some(project) => {
                let mut projects = BTreeMap::new();
                let versions = document.versions(project);
                if !versions.is_empty() {
                    projects.insert(project.to_string(), versions);
                }
                projects
            }
            None => document
                .project_names()
                .into_iter()
                .map(|name| {
                    let versions = document.versions(&name);
                    (name, versions)
                })
                .collect(),
        };

        Ok(VersionsReport {
            server: settings.name.clone(),
            ledger_path: ledger.document_path().to_path_buf(),
            projects,
        })
    }

    /// Delete one deployed version and drop it from the ledger.
    pub fn undeploy(
        &self,
        server: &str,
        project: &str,
        path: &str,
        cancel: &CancelToken,
    ) -> anyhow::Result<UndeployReport> {
        let settings = self.ctx.server(server)?;
        let recorded = self.ctx.ledger(&settings).list(project)?;
        if !recorded.iter().any(|p| p == path) {
            anyhow::bail!(
                "'{}' is not a recorded version of project '{}' on server '{}'",
                path,
                project,
                server
            );
        }

        let orchestrator = self
            .ctx
            .orchestrator(settings, Arc::new(FsResourceProvider::new()));
        orchestrator.undeploy_version(project, path, cancel)?;

        Ok(UndeployReport {
            server: server.to_string(),
            project: project.to_string(),
            path: path.to_string(),
            remaining: orchestrator.ledger().list(project)?,
        })
    }

    /// Delete every recorded version of `project` and clear its record.
    pub fn remove_all(
        &self,
        server: &str,
        project: &str,
        cancel: &CancelToken,
    ) -> anyhow::Result<RemovalReport> {
        let settings = self.ctx.server(server)?;
        let orchestrator = self
            .ctx
            .orchestrator(settings, Arc::new(FsResourceProvider::new()));
        Ok(orchestrator.remove_all(project, cancel))
    }

    /// Every configured server with its recorded version count.
    pub fn servers(&self) -> anyhow::Result<Vec<ServerSummary>> {
        self.ctx
            .servers()?
            .into_iter()
            .map(|settings| {
                let document = self.ctx.ledger(&settings).load()?;
                let recorded_versions = document
                    .project_names()
                    .iter()
                    .map(|name| document.versions(name).len())
                    .sum::<usize>();
                Ok::<_, anyhow::Error>(ServerSummary {
                    name: settings.name().to_string(),
                    deploy_dir: settings.deploy_dir.clone(),
                    zip_deployments: settings.zip_deployments,
                    state_dir: settings.state_dir.clone(),
                    recorded_versions,
                })
            })
            .collect()
    }
}
