//! Module resources: what a module is made of on disk.
//!
//! The host decides which files belong to a module. The publisher only sees
//! the resulting tree through [`ModuleResourceProvider`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::types::ModuleRef;

/// One member of a module's resource tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResource {
    /// File or folder name (last path segment).
    pub name: String,
    /// Path relative to the module root, using the host's separators.
    pub relative_path: PathBuf,
    /// Where the content can be read locally.
    pub local_path: PathBuf,
    /// Children for folders; always empty for files.
    pub children: Vec<ModuleResource>,
    is_folder: bool,
}

impl ModuleResource {
    pub fn file(relative_path: impl Into<PathBuf>, local_path: impl Into<PathBuf>) -> Self {
        let relative_path = relative_path.into();
        Self {
            name: last_segment(&relative_path),
            relative_path,
            local_path: local_path.into(),
            children: Vec::new(),
            is_folder: false,
        }
    }

    pub fn folder(
        relative_path: impl Into<PathBuf>,
        local_path: impl Into<PathBuf>,
        children: Vec<ModuleResource>,
    ) -> Self {
        let relative_path = relative_path.into();
        Self {
            name: last_segment(&relative_path),
            relative_path,
            local_path: local_path.into(),
            children,
            is_folder: true,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    /// Every file below (and including) this resource, depth-first.
    pub fn files(&self) -> Vec<&ModuleResource> {
        let mut out = Vec::new();
        collect_files(self, &mut out);
        out
    }
}

fn collect_files<'a>(resource: &'a ModuleResource, out: &mut Vec<&'a ModuleResource>) {
    if resource.is_folder {
        for child in &resource.children {
            collect_files(child, out);
        }
    } else {
        out.push(resource);
    }
}

fn last_segment(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Enumerates the direct resources of a module.
pub trait ModuleResourceProvider: Send + Sync {
    fn resources(&self, module: &ModuleRef) -> anyhow::Result<Vec<ModuleResource>>;
}

/// Resource provider backed by one directory per module.
#[derive(Debug, Clone, Default)]
pub struct FsResourceProvider {
    roots: HashMap<String, PathBuf>,
}

impl FsResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `root` as the content directory of module `name`.
    pub fn with_module(mut self, name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(name.into(), root.into());
        self
    }

    pub fn root_for(&self, name: &str) -> Option<&Path> {
        self.roots.get(name).map(|p| p.as_path())
    }
}

impl ModuleResourceProvider for FsResourceProvider {
    fn resources(&self, module: &ModuleRef) -> anyhow::Result<Vec<ModuleResource>> {
        let root = self
            .roots
            .get(&module.name)
            .ok_or_else(|| anyhow::anyhow!("No content directory registered for module '{}'", module.name))?;
        let meta = fs::metadata(root)
            .with_context(|| format!("Failed to stat module directory: {}", root.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("Module path is not a directory: {}", root.display());
        }
        read_dir_resources(root, Path::new(""))
    }
}

fn read_dir_resources(dir: &Path, base: &Path) -> anyhow::Result<Vec<ModuleResource>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    // Sorted for stable archive layout
    let mut sorted_entries: Vec<_> = entries
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    sorted_entries.sort_by_key(|e| e.file_name());

    let mut resources = Vec::new();
    for entry in sorted_entries {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let relative = base.join(&name);
        let local = entry.path();
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat file: {}", local.display()))?;

        if ty.is_dir() {
            let children = read_dir_resources(&local, &relative)?;
            resources.push(ModuleResource::folder(relative, local, children));
        } else if ty.is_file() {
            resources.push(ModuleResource::file(relative, local));
        } else if ty.is_symlink() {
            anyhow::bail!("Symlinks are not supported: {}", local.display());
        } else {
            anyhow::bail!("Unsupported filesystem entry type: {}", local.display());
        }
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
        }
        fs::write(path, content).expect("write should succeed in test temp dirs");
    }

    #[test]
    fn enumerates_sorted_tree_and_skips_hidden() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        write_file(&tmp.path().join("deploy.xml"), "<deploy/>");
        write_file(&tmp.path().join("a.bpel"), "process");
        write_file(&tmp.path().join("wsdl").join("svc.wsdl"), "wsdl");
        write_file(&tmp.path().join(".project"), "ide metadata");

        let provider = FsResourceProvider::new().with_module("orders", tmp.path());
        let resources = provider
            .resources(&ModuleRef::new("orders"))
            .expect("resources should succeed");

        let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.bpel", "deploy.xml", "wsdl"]);

        let wsdl = &resources[2];
        assert!(wsdl.is_folder());
        assert_eq!(wsdl.children.len(), 1);
        assert_eq!(wsdl.children[0].relative_path, Path::new("wsdl").join("svc.wsdl"));
        assert_eq!(wsdl.files().len(), 1);
    }

    #[test]
    fn unknown_module_is_an_error() {
        let provider = FsResourceProvider::new();
        assert!(provider.resources(&ModuleRef::new("nope")).is_err());
    }
}
