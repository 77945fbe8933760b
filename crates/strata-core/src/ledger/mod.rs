//! Version ledger: every artifact path ever deployed to a server, per project.
//!
//! Each publish produces a new timestamp-named artifact instead of
//! overwriting the previous one, so the target runtime accumulates versions
//! the host no longer knows about. The ledger remembers them so that a later
//! undeploy can find and delete them.

pub mod document;
pub mod store;

pub use document::DeploymentDescriptor;
pub use store::{LEDGER_FILE_NAME, LedgerStore, VersionLedger};
