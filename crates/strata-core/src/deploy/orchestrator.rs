//! Publish flow for one module: classify, then remove, ignore, or publish a
//! new versioned artifact and record it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::classify::{PublishType, classify};
use super::package::{Artifact, ArtifactPackager, TransferItem};
use super::path::{Clock, SystemClock, compute_target_path};
use super::validate::verify_descriptor;
use crate::config::ServerConfig;
use crate::error::PublishError;
use crate::ledger::VersionLedger;
use crate::module::ModuleResourceProvider;
use crate::status::StepResults;
use crate::transfer::{CancelToken, TransferController};
use crate::types::{DeltaKind, ModuleRef, ModuleTree, PublishKind, PublishState};

/// Phases of one publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishPhase {
    Idle,
    Classifying,
    Removing,
    Validating,
    Packaging,
    Transferring,
    Recording,
    Aggregating,
    Done,
    Failed,
    Cancelled,
}

impl PublishPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishPhase::Idle => "idle",
            PublishPhase::Classifying => "classifying",
            PublishPhase::Removing => "removing",
            PublishPhase::Validating => "validating",
            PublishPhase::Packaging => "packaging",
            PublishPhase::Transferring => "transferring",
            PublishPhase::Recording => "recording",
            PublishPhase::Aggregating => "aggregating",
            PublishPhase::Done => "done",
            PublishPhase::Failed => "failed",
            PublishPhase::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PublishPhase::Done | PublishPhase::Failed | PublishPhase::Cancelled
        )
    }
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the phase of one publish call.
struct PhaseTracker<'a> {
    module: &'a str,
    phase: PublishPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(module: &'a str) -> Self {
        Self {
            module,
            phase: PublishPhase::Idle,
        }
    }

    fn advance(&mut self, next: PublishPhase) {
        tracing::debug!(module = self.module, from = %self.phase, to = %next, "Publish phase");
        self.phase = next;
    }
}

/// What a remove-all did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub project: String,
    /// Recorded paths a delete was issued for, in ledger order
    pub attempted: Vec<String>,
    /// Paths whose delete succeeded
    pub deleted: Vec<String>,
    /// Failed deletions
    #[serde(skip)]
    pub failures: Vec<PublishError>,
    /// Whether the project's whole record was dropped
    pub ledger_cleared: bool,
    pub cancelled: bool,
}

impl RemovalReport {
    fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            attempted: Vec::new(),
            deleted: Vec::new(),
            failures: Vec::new(),
            ledger_cleared: false,
            cancelled: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Failed deletions bundled into one error, if any.
    pub fn status(&self) -> Result<(), PublishError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError::Removal {
                project: self.project.clone(),
                errors: self.failures.clone(),
            })
        }
    }
}

/// Result of one publish call.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub module: String,
    pub publish_type: PublishType,
    /// State reported back to the host
    pub state: PublishState,
    /// Terminal phase reached
    pub phase: PublishPhase,
    /// OK, or every failure of the call bundled into one error
    pub status: Result<(), PublishError>,
    /// Versioned target path, for full publishes that got that far
    pub target_path: Option<PathBuf>,
    /// Whether the target path was added to the ledger
    pub recorded: bool,
    /// Removal details for remove requests
    pub removal: Option<RemovalReport>,
}

impl PublishOutcome {
    fn new(module: &ModuleRef, publish_type: PublishType) -> Self {
        Self {
            module: module.name.clone(),
            publish_type,
            state: publish_type.publish_state(),
            phase: PublishPhase::Done,
            status: Ok(()),
            target_path: None,
            recorded: false,
            removal: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// Publishes versioned archive modules to one server.
///
/// Collaborators are injected so the flow can run against a local
/// directory, a remote transport, or test doubles.
pub struct PublishOrchestrator {
    server: Arc<dyn ServerConfig>,
    transfer: Arc<dyn TransferController>,
    resources: Arc<dyn ModuleResourceProvider>,
    ledger: VersionLedger,
    clock: Arc<dyn Clock>,
}

impl PublishOrchestrator {
    /// Orchestrator using the server's own ledger and the system clock.
    pub fn new(
        server: Arc<dyn ServerConfig>,
        transfer: Arc<dyn TransferController>,
        resources: Arc<dyn ModuleResourceProvider>,
    ) -> Self {
        let ledger = VersionLedger::new(&server.state_location());
        Self {
            server,
            transfer,
            resources,
            ledger,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ledger(mut self, ledger: VersionLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    pub fn server(&self) -> &dyn ServerConfig {
        self.server.as_ref()
    }

    /// Handle one publish request for the leaf module of `tree`.
    pub fn publish(
        &self,
        kind: PublishKind,
        delta: DeltaKind,
        tree: &ModuleTree,
        prior_publish_known: bool,
        cancel: &CancelToken,
    ) -> PublishOutcome {
        let leaf = tree.leaf();
        let mut tracker = PhaseTracker::new(&leaf.name);

        tracker.advance(PublishPhase::Classifying);
        let publish_type = classify(kind, delta, prior_publish_known);
        tracing::info!(
            server = self.server.name(),
            module = %leaf.name,
            kind = kind.as_str(),
            delta = delta.as_str(),
            publish_type = publish_type.as_str(),
            "Publishing module"
        );

        let outcome = match publish_type {
            PublishType::Incremental => {
                tracing::debug!(module = %leaf.name, "Incremental publish ignored for versioned archives");
                tracker.advance(PublishPhase::Done);
                PublishOutcome::new(leaf, publish_type)
            }
            PublishType::Remove => self.remove_module(leaf, cancel, &mut tracker),
            PublishType::Full => self.full_publish(tree, cancel, &mut tracker),
        };

        if let Err(err) = &outcome.status {
            tracing::warn!(module = %leaf.name, error = %err, "Publish finished with errors");
            for cause in err.causes() {
                tracing::warn!(module = %leaf.name, kind = cause.kind(), "  {}", cause);
            }
        }
        outcome
    }

    fn remove_module(
        &self,
        leaf: &ModuleRef,
        cancel: &CancelToken,
        tracker: &mut PhaseTracker<'_>,
    ) -> PublishOutcome {
        tracker.advance(PublishPhase::Removing);
        let mut outcome = PublishOutcome::new(leaf, PublishType::Remove);

        let Some(project) = leaf.project.as_deref() else {
            tracing::debug!(module = %leaf.name, "Module has no owning project, nothing to remove");
            tracker.advance(PublishPhase::Done);
            return outcome;
        };

        let report = self.remove_all(project, cancel);
        outcome.status = report.status();
        outcome.phase = if report.cancelled {
            PublishPhase::Cancelled
        } else {
            PublishPhase::Done
        };
        tracker.advance(outcome.phase);
        outcome.removal = Some(report);
        outcome
    }

    fn full_publish(
        &self,
        tree: &ModuleTree,
        cancel: &CancelToken,
        tracker: &mut PhaseTracker<'_>,
    ) -> PublishOutcome {
        let leaf = tree.leaf();
        let mut outcome = PublishOutcome::new(leaf, PublishType::Full);

        tracker.advance(PublishPhase::Validating);
        let resources = match self.resources.resources(leaf) {
            Ok(resources) => resources,
            Err(err) => {
                return fail_early(outcome, PublishError::packaging(&leaf.name, &err), tracker);
            }
        };
        if let Err(err) = verify_descriptor(leaf, &resources) {
            return fail_early(outcome, err, tracker);
        }

        let base = self.server.deployment_location(tree);
        let target = compute_target_path(tree, &base, self.clock.now());
        outcome.target_path = Some(target.clone());

        tracker.advance(PublishPhase::Packaging);
        let packager = ArtifactPackager::for_server(self.server.as_ref());
        let packaged = packager.package(leaf, &resources, &target, cancel);
        let mut steps = packaged.steps;

        tracker.advance(PublishPhase::Transferring);
        let transferred = match &packaged.artifact {
            Some(Artifact::Archive(archive)) => {
                self.transfer_archive(archive, &target, cancel, &mut steps)
            }
            Some(Artifact::Tree(items)) => self.transfer_tree(items, cancel, &mut steps),
            None => false,
        };

        if transferred {
            tracker.advance(PublishPhase::Recording);
            outcome.recorded = self.record(leaf, &target);
        }

        tracker.advance(PublishPhase::Aggregating);
        outcome.status = steps.aggregate(&leaf.name);
        outcome.phase = if transferred {
            PublishPhase::Done
        } else if cancel.is_cancelled() {
            PublishPhase::Cancelled
        } else {
            PublishPhase::Failed
        };
        tracker.advance(outcome.phase);

        if transferred {
            tracing::info!(
                module = %leaf.name,
                target = %target.display(),
                strategy = packager.strategy().as_str(),
                "Published module version"
            );
        }
        outcome
    }

    fn transfer_archive(
        &self,
        archive: &Path,
        target: &Path,
        cancel: &CancelToken,
        steps: &mut StepResults,
    ) -> bool {
        if cancel.is_cancelled() {
            steps.fail(PublishError::cancelled(format!("copying {}", target.display())));
            return false;
        }
        match self.transfer.copy_file(archive, target, cancel) {
            Ok(()) => {
                steps.ok();
                true
            }
            Err(err) => {
                steps.fail(PublishError::transfer(target, &err));
                false
            }
        }
    }

    /// Copy every planned file, continuing past failures.
    ///
    /// The tree counts as transferred when it was not cancelled and at least
    /// one copy succeeded, or there was nothing to copy.
    fn transfer_tree(
        &self,
        items: &[TransferItem],
        cancel: &CancelToken,
        steps: &mut StepResults,
    ) -> bool {
        let mut copied = 0;
        for item in items {
            if cancel.is_cancelled() {
                steps.fail(PublishError::cancelled(format!(
                    "copying {}",
                    item.dest.display()
                )));
                return false;
            }
            match self.transfer.copy_file(&item.source, &item.dest, cancel) {
                Ok(()) => {
                    copied += 1;
                    steps.ok();
                }
                Err(err) => steps.fail(PublishError::transfer(&item.dest, &err)),
            }
        }
        copied > 0 || items.is_empty()
    }

    /// Add `target` to the ledger. Failures are logged, never surfaced.
    fn record(&self, leaf: &ModuleRef, target: &Path) -> bool {
        let Some(project) = leaf.project.as_deref() else {
            tracing::warn!(module = %leaf.name, "Module has no owning project, version not recorded");
            return false;
        };
        let path = target.to_string_lossy();
        match self.ledger.add(project, &path) {
            Ok(()) => true,
            Err(err) => {
                let err = PublishError::persistence(project, &err);
                tracing::warn!(module = %leaf.name, error = %err, "Version ledger not updated");
                false
            }
        }
    }

    /// Delete every recorded version of `project` and clear its record.
    ///
    /// Every deletion is attempted even if earlier ones fail, and the record
    /// is dropped regardless of failures. When cancelled, deleting stops and
    /// only the entries already deleted leave the ledger.
    pub fn remove_all(&self, project: &str, cancel: &CancelToken) -> RemovalReport {
        let mut report = RemovalReport::new(project);

        let paths = match self.ledger.list(project) {
            Ok(paths) => paths,
            Err(err) => {
                let err = PublishError::persistence(project, &err);
                tracing::warn!(project, error = %err, "Could not read version ledger");
                Vec::new()
            }
        };

        for path in &paths {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.attempted.push(path.clone());
            match self.transfer.delete_resource(Path::new(path), cancel) {
                Ok(()) => {
                    tracing::debug!(project, path = %path, "Deleted deployed version");
                    report.deleted.push(path.clone());
                }
                Err(err) => {
                    let err = PublishError::transfer(path, &err);
                    tracing::warn!(project, error = %err, "Failed to delete deployed version");
                    report.failures.push(err);
                }
            }
        }

        if report.cancelled {
            for path in &report.deleted {
                if let Err(err) = self.ledger.remove_one(project, path) {
                    let err = PublishError::persistence(project, &err);
                    tracing::warn!(project, error = %err, "Version ledger not updated");
                }
            }
            tracing::info!(
                project,
                deleted = report.deleted.len(),
                remaining = paths.len() - report.deleted.len(),
                "Removal cancelled"
            );
            return report;
        }

        match self.ledger.remove_project(project) {
            Ok(_) => report.ledger_cleared = true,
            Err(err) => {
                let err = PublishError::persistence(project, &err);
                tracing::warn!(project, error = %err, "Version ledger not cleared");
            }
        }
        tracing::info!(
            project,
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            "Removed deployed versions"
        );
        report
    }

    /// Delete one deployed version, then drop it from the ledger.
    ///
    /// The ledger entry stays when the delete fails or is cancelled.
    pub fn undeploy_version(
        &self,
        project: &str,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<(), PublishError> {
        if cancel.is_cancelled() {
            return Err(PublishError::cancelled(format!("deleting {}", path)));
        }
        self.transfer
            .delete_resource(Path::new(path), cancel)
            .map_err(|err| {
                if cancel.is_cancelled() {
                    PublishError::cancelled(format!("deleting {}", path))
                } else {
                    PublishError::transfer(path, &err)
                }
            })?;

        match self.ledger.remove_one(project, path) {
            Ok(removed) => {
                tracing::info!(project, path, removed, "Undeployed version");
            }
            Err(err) => {
                let err = PublishError::persistence(project, &err);
                tracing::warn!(project, error = %err, "Version ledger not updated");
            }
        }
        Ok(())
    }
}

fn fail_early(
    mut outcome: PublishOutcome,
    err: PublishError,
    tracker: &mut PhaseTracker<'_>,
) -> PublishOutcome {
    outcome.status = Err(err);
    outcome.phase = PublishPhase::Failed;
    tracker.advance(PublishPhase::Failed);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(PublishPhase::Done.is_terminal());
        assert!(PublishPhase::Failed.is_terminal());
        assert!(PublishPhase::Cancelled.is_terminal());
        assert!(!PublishPhase::Transferring.is_terminal());
    }

    #[test]
    fn removal_status_bundles_failures() {
        let mut report = RemovalReport::new("P");
        assert!(report.status().is_ok());
        assert!(report.is_clean());

        report
            .failures
            .push(PublishError::cancelled("deleting /srv/a.jar"));
        match report.status() {
            Err(PublishError::Removal { project, errors }) => {
                assert_eq!(project, "P");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected removal error, got {:?}", other),
        }
    }
}
