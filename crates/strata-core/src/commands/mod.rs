//! High-level commands for strata operations.
//!
//! Commands resolve a configured server, build the services it needs and
//! run one operation, returning a serializable report. Frontends only deal
//! with options and reports.

pub mod context;
pub mod publish;
pub mod versions;

pub use context::CommandContext;
pub use publish::{ErrorEntry, PublishCommand, PublishOptions, PublishReport};
pub use versions::{ServerSummary, UndeployReport, VersionsCommand, VersionsReport};
