//! Decide what a publish request means for a versioned archive module.
//!
//! Archives are never patched in place: a running process instance could be
//! reading the old one. Any content change therefore becomes a full publish
//! of a new, separately addressed artifact, and incremental requests are
//! acknowledged without doing anything.

use crate::types::{DeltaKind, PublishKind, PublishState};

/// Outcome of classifying one publish request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishType {
    /// Module is leaving the server: remove every recorded version
    Remove,
    /// Build and transfer a new versioned artifact
    Full,
    /// Acknowledged but deliberately inert
    Incremental,
}

impl PublishType {
    /// State reported back to the host for this classification.
    pub fn publish_state(self) -> PublishState {
        match self {
            PublishType::Full => PublishState::None,
            PublishType::Incremental => PublishState::Incremental,
            PublishType::Remove => PublishState::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PublishType::Remove => "remove",
            PublishType::Full => "full",
            PublishType::Incremental => "incremental",
        }
    }
}

/// Classify a publish request.
///
/// Removal wins over everything else. An explicit incremental request stays
/// inert whatever the module state; any other request publishes a new
/// artifact unless nothing changed since a known prior publish.
pub fn classify(kind: PublishKind, delta: DeltaKind, prior_publish_known: bool) -> PublishType {
    if delta == DeltaKind::Removed {
        return PublishType::Remove;
    }
    match kind {
        PublishKind::Incremental => PublishType::Incremental,
        PublishKind::Full | PublishKind::Clean => PublishType::Full,
        PublishKind::Auto => match delta {
            DeltaKind::Added | DeltaKind::Changed => PublishType::Full,
            _ if !prior_publish_known => PublishType::Full,
            _ => PublishType::Incremental,
        },
    }
}
