//! Versioned publishing of archive modules.
//!
//! A full publish never overwrites a deployed artifact. It writes a new one
//! next to it under a timestamped name and records the path in the server's
//! version ledger, so older versions keep serving running instances until
//! they are removed explicitly.

pub mod classify;
pub mod orchestrator;
pub mod package;
pub mod path;
pub mod validate;

pub use classify::{PublishType, classify};
pub use orchestrator::{PublishOrchestrator, PublishOutcome, PublishPhase, RemovalReport};
pub use package::{Artifact, ArtifactPackager, PackagingStrategy, TransferItem};
pub use path::{ARCHIVE_EXTENSION, Clock, FixedClock, SystemClock, compute_target_path};
pub use validate::{DESCRIPTOR_NAMES, verify_descriptor};
