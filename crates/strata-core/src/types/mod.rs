//! Shared core types describing what is published and how the host asked for it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A deployable module as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Module name; also the stem of every artifact published for it.
    pub name: String,
    /// Owning project. Modules without a project are never recorded in the ledger.
    pub project: Option<String>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Non-empty ancestry chain of modules; the last element is the leaf that gets built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawModuleTree")]
pub struct ModuleTree {
    modules: Vec<ModuleRef>,
}

#[derive(Deserialize)]
struct RawModuleTree {
    modules: Vec<ModuleRef>,
}

impl TryFrom<RawModuleTree> for ModuleTree {
    type Error = anyhow::Error;

    fn try_from(raw: RawModuleTree) -> anyhow::Result<Self> {
        ModuleTree::new(raw.modules)
    }
}

impl ModuleTree {
    pub fn new(modules: Vec<ModuleRef>) -> anyhow::Result<Self> {
        if modules.is_empty() {
            anyhow::bail!("Module tree must contain at least one module");
        }
        Ok(Self { modules })
    }

    /// Tree holding a single top-level module.
    pub fn single(module: ModuleRef) -> Self {
        Self {
            modules: vec![module],
        }
    }

    pub fn leaf(&self) -> &ModuleRef {
        self.modules
            .last()
            .expect("module tree is non-empty by construction")
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }
}

/// Publish kind requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishKind {
    Auto,
    Incremental,
    Full,
    Clean,
}

impl PublishKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishKind::Auto => "auto",
            PublishKind::Incremental => "incremental",
            PublishKind::Full => "full",
            PublishKind::Clean => "clean",
        }
    }
}

/// What changed in the module since the host last published it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeltaKind {
    NoChange,
    Added,
    Changed,
    Removed,
}

impl DeltaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaKind::NoChange => "no-change",
            DeltaKind::Added => "added",
            DeltaKind::Changed => "changed",
            DeltaKind::Removed => "removed",
        }
    }
}

/// Publish state reported back to the host after a publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    /// Module is fully published; nothing pending.
    None,
    /// Module has changes the publisher chose not to push.
    Incremental,
    /// Publish state is unknown (after removal).
    Unknown,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PublishState::None => "none",
            PublishState::Incremental => "incremental",
            PublishState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
