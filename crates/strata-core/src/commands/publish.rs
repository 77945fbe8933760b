//! Publish command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::context::CommandContext;
use crate::deploy::{PublishOutcome, PublishPhase, RemovalReport};
use crate::error::PublishError;
use crate::module::FsResourceProvider;
use crate::transfer::CancelToken;
use crate::types::{DeltaKind, ModuleRef, ModuleTree, PublishKind, PublishState};

/// Options for the publish command
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Configured server to publish to
    pub server: String,
    /// Module name (leaf of the module tree)
    pub module: String,
    /// Owning project; versions are recorded under it
    pub project: Option<String>,
    /// Enclosing modules, outermost first
    pub parents: Vec<String>,
    /// Local directory holding the module content
    pub source_dir: PathBuf,
    pub kind: PublishKind,
    pub delta: DeltaKind,
    /// Override for "was this module published before"; derived from the
    /// ledger when unset
    pub prior_publish_known: Option<bool>,
}

impl PublishOptions {
    pub fn new(
        server: impl Into<String>,
        module: impl Into<String>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            server: server.into(),
            module: module.into(),
            project: None,
            parents: Vec::new(),
            source_dir: source_dir.into(),
            kind: PublishKind::Auto,
            delta: DeltaKind::Changed,
            prior_publish_known: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_kind(mut self, kind: PublishKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_delta(mut self, delta: DeltaKind) -> Self {
        self.delta = delta;
        self
    }

    fn module_tree(&self) -> anyhow::Result<ModuleTree> {
        let mut modules: Vec<ModuleRef> = self.parents.iter().map(ModuleRef::new).collect();
        let leaf = match &self.project {
            Some(project) => ModuleRef::new(&self.module).with_project(project),
            None => ModuleRef::new(&self.module),
        };
        modules.push(leaf);
        ModuleTree::new(modules)
    }
}

/// One failure, flattened for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub kind: &'static str,
    pub message: String,
}

impl ErrorEntry {
    fn from_status(status: &Result<(), PublishError>) -> Vec<ErrorEntry> {
        match status {
            Ok(()) => Vec::new(),
            Err(err) => err
                .causes()
                .into_iter()
                .map(|cause| ErrorEntry {
                    kind: cause.kind(),
                    message: cause.to_string(),
                })
                .collect(),
        }
    }
}

/// Report from a publish operation
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub server: String,
    pub module: String,
    pub project: Option<String>,
    pub publish_type: &'static str,
    pub state: PublishState,
    pub phase: PublishPhase,
    pub target_path: Option<PathBuf>,
    pub recorded: bool,
    pub summary: Option<String>,
    pub errors: Vec<ErrorEntry>,
    pub removal: Option<RemovalReport>,
}

impl PublishReport {
    fn from_outcome(options: &PublishOptions, outcome: PublishOutcome) -> Self {
        Self {
            server: options.server.clone(),
            module: outcome.module,
            project: options.project.clone(),
            publish_type: outcome.publish_type.as_str(),
            state: outcome.state,
            phase: outcome.phase,
            target_path: outcome.target_path,
            recorded: outcome.recorded,
            summary: outcome.status.as_ref().err().map(|err| err.to_string()),
            errors: ErrorEntry::from_status(&outcome.status),
            removal: outcome.removal,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Publish command orchestrator
pub struct PublishCommand<'a> {
    ctx: &'a CommandContext,
}

impl<'a> PublishCommand<'a> {
    pub fn new(ctx: &'a CommandContext) -> Self {
        Self { ctx }
    }

    /// Execute the publish command
    pub fn execute(
        &self,
        options: &PublishOptions,
        cancel: &CancelToken,
    ) -> anyhow::Result<PublishReport> {
        let server = self.ctx.server(&options.server)?;
        let tree = options.module_tree()?;

        let prior_publish_known = match (options.prior_publish_known, &options.project) {
            (Some(known), _) => known,
            (None, Some(project)) => !self.ctx.ledger(&server).list(project)?.is_empty(),
            (None, None) => false,
        };

        let resources =
            FsResourceProvider::new().with_module(&options.module, &options.source_dir);
        let orchestrator = self.ctx.orchestrator(server, Arc::new(resources));
        let outcome = orchestrator.publish(
            options.kind,
            options.delta,
            &tree,
            prior_publish_known,
            cancel,
        );

        Ok(PublishReport::from_outcome(options, outcome))
    }
}
