//! Strata Core Library
//!
//! Publishes timestamp-versioned process archives to a target runtime and
//! keeps a per-server ledger of every artifact path it has deployed, so
//! old versions can be found and removed later.

pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod module;
pub mod status;
pub mod transfer;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, ServerConfig, ServerEntry, StrataConfig};

    // Publishing
    pub use crate::deploy::{
        Clock, FixedClock, PublishOrchestrator, PublishOutcome, PublishPhase, RemovalReport,
        SystemClock,
    };

    // Errors and statuses
    pub use crate::error::PublishError;
    pub use crate::status::StepResults;

    // Ledger
    pub use crate::ledger::{DeploymentDescriptor, VersionLedger};

    // Collaborators
    pub use crate::module::{FsResourceProvider, ModuleResource, ModuleResourceProvider};
    pub use crate::transfer::{CancelToken, LocalTransfer, TransferController};

    // Shared types
    pub use crate::types::{DeltaKind, ModuleRef, ModuleTree, PublishKind, PublishState};
}
