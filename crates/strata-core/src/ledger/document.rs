//! In-memory form of one server's deployment descriptor document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current document format version
pub const DESCRIPTOR_VERSION: u32 = 1;

/// All recorded artifact paths of one server, keyed by project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    /// Document format version
    pub version: u32,

    /// Deployed paths per project, in publish order. Duplicates are allowed.
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<String>>,
}

impl DeploymentDescriptor {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            version: DESCRIPTOR_VERSION,
            projects: BTreeMap::new(),
        }
    }

    /// Recorded paths for `project`; blank entries are skipped.
    pub fn versions(&self, project: &str) -> Vec<String> {
        self.projects
            .get(project)
            .map(|paths| {
                paths
                    .iter()
                    .filter(|p| !p.trim().is_empty())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append `path` to the record of `project`, creating the record if needed.
    pub fn add_version(&mut self, project: &str, path: impl Into<String>) {
        self.projects
            .entry(project.to_string())
            .or_default()
            .push(path.into());
    }

    /// Remove every entry of `project` equal to `path`.
    ///
    /// Returns the number of entries removed. The record itself stays, even
    /// when it becomes empty.
    pub fn remove_version(&mut self, project: &str, path: &str) -> usize {
        match self.projects.get_mut(project) {
            Some(paths) => {
                let before = paths.len();
                paths.retain(|p| p != path);
                before - paths.len()
            }
            None => 0,
        }
    }

    /// Drop the whole record of `project`. Returns `true` if it existed.
    pub fn remove_project(&mut self, project: &str) -> bool {
        self.projects.remove(project).is_some()
    }

    pub fn has_project(&self, project: &str) -> bool {
        self.projects.contains_key(project)
    }

    pub fn project_names(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    /// Validate the document
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.version != DESCRIPTOR_VERSION {
            anyhow::bail!(
                "Unsupported deployment descriptor version: {}",
                self.version
            );
        }
        Ok(())
    }
}

impl Default for DeploymentDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_order_and_duplicates() {
        let mut doc = DeploymentDescriptor::new();
        doc.add_version("P", "/srv/a.jar");
        doc.add_version("P", "/srv/b.jar");
        doc.add_version("P", "/srv/a.jar");

        assert_eq!(
            doc.versions("P"),
            vec!["/srv/a.jar", "/srv/b.jar", "/srv/a.jar"]
        );
    }

    #[test]
    fn remove_version_drops_all_matches_only() {
        let mut doc = DeploymentDescriptor::new();
        doc.add_version("P", "/srv/a.jar");
        doc.add_version("P", "/srv/b.jar");
        doc.add_version("P", "/srv/a.jar");
        doc.add_version("Q", "/srv/a.jar");

        assert_eq!(doc.remove_version("P", "/srv/a.jar"), 2);
        assert_eq!(doc.versions("P"), vec!["/srv/b.jar"]);
        assert_eq!(doc.versions("Q"), vec!["/srv/a.jar"]);
        assert_eq!(doc.remove_version("missing", "/srv/a.jar"), 0);
    }

    #[test]
    fn project_names_are_case_sensitive() {
        let mut doc = DeploymentDescriptor::new();
        doc.add_version("Orders", "/srv/a.jar");

        assert!(doc.versions("orders").is_empty());
        assert!(!doc.remove_project("orders"));
        assert!(doc.remove_project("Orders"));
        assert!(!doc.has_project("Orders"));
    }

    #[test]
    fn blank_entries_are_not_listed() {
        let mut doc = DeploymentDescriptor::new();
        doc.add_version("P", "");
        doc.add_version("P", "  ");
        doc.add_version("P", "/srv/a.jar");

        assert_eq!(doc.versions("P"), vec!["/srv/a.jar"]);
    }

    #[test]
    fn validate_rejects_unknown_version() {
        let mut doc = DeploymentDescriptor::new();
        assert!(doc.validate().is_ok());
        doc.version = 7;
        assert!(doc.validate().is_err());
    }

    #[test]
    fn json_shape_matches_documented_format() {
        let mut doc = DeploymentDescriptor::new();
        doc.add_version("P", "/srv/a.jar");
        let value = serde_json::to_value(&doc).expect("serialize should succeed");
        assert_eq!(
            value,
            serde_json::json!({ "version": 1, "projects": { "P": ["/srv/a.jar"] } })
        );
    }
}
