//! Error taxonomy for publish, removal and undeploy flows

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Failure of one publish step, or the bundle of all failures of one publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Module has no deployment descriptor; nothing was touched
    #[error("Module '{module}' has no deploy.xml (or legacy bpel-deploy.xml) descriptor")]
    MissingDescriptor { module: String },

    /// Local archive or resource enumeration failed
    #[error("Failed to package '{resource}': {message}")]
    Packaging { resource: String, message: String },

    /// Copy or delete on the target system failed
    #[error("Failed to transfer '{}': {message}", path.display())]
    Transfer { path: PathBuf, message: String },

    /// Ledger load or save failed
    #[error("Failed to persist version ledger for project '{project}': {message}")]
    Persistence { project: String, message: String },

    /// Cancelled through the cancel token before the step ran
    #[error("Operation cancelled before '{step}'")]
    Cancelled { step: String },

    /// Every non-OK step of one full publish
    #[error("Full publish of module '{module}' failed ({} error(s))", errors.len())]
    Aggregate {
        module: String,
        errors: Vec<PublishError>,
    },

    /// Deletions that failed while removing every version of a project
    #[error("Removing deployed versions of project '{project}' left {} failure(s)", errors.len())]
    Removal {
        project: String,
        errors: Vec<PublishError>,
    },
}

impl PublishError {
    pub fn missing_descriptor(module: impl Into<String>) -> Self {
        Self::MissingDescriptor {
            module: module.into(),
        }
    }

    pub fn packaging(resource: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Packaging {
            resource: resource.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn transfer(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Transfer {
            path: path.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn persistence(project: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Persistence {
            project: project.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn cancelled(step: impl Into<String>) -> Self {
        Self::Cancelled { step: step.into() }
    }

    /// Short kind label used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::MissingDescriptor { .. } => "missing-descriptor",
            PublishError::Packaging { .. } => "packaging",
            PublishError::Transfer { .. } => "transfer",
            PublishError::Persistence { .. } => "persistence",
            PublishError::Cancelled { .. } => "cancelled",
            PublishError::Aggregate { .. } => "aggregate",
            PublishError::Removal { .. } => "removal",
        }
    }

    /// Leaf errors: the bundle's members for `Aggregate` and `Removal`, otherwise the error itself.
    pub fn causes(&self) -> Vec<&PublishError> {
        match self {
            PublishError::Aggregate { errors, .. } | PublishError::Removal { errors, .. } => {
                errors.iter().collect()
            }
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_names_module_and_count() {
        let err = PublishError::Aggregate {
            module: "orders".to_string(),
            errors: vec![
                PublishError::cancelled("copy"),
                PublishError::missing_descriptor("orders"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Full publish of module 'orders' failed (2 error(s))"
        );
        assert_eq!(err.causes().len(), 2);
        assert_eq!(err.kind(), "aggregate");
    }

    #[test]
    fn transfer_error_keeps_context_chain() {
        let source = anyhow::anyhow!("disk full").context("Failed to copy file");
        let err = PublishError::transfer("/srv/a.jar", &source);
        assert_eq!(
            err.to_string(),
            "Failed to transfer '/srv/a.jar': Failed to copy file: disk full"
        );
    }
}
