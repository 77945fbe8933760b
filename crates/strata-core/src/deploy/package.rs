//! Turn a module's resource tree into something the transfer layer can ship.
//!
//! Zip packaging builds one archive under the server's temporary state
//! location and hands it over as a single file. Directory packaging builds
//! nothing locally; it only plans one copy per file under the target path.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use zip::write::SimpleFileOptions;

use crate::config::ServerConfig;
use crate::error::PublishError;
use crate::module::ModuleResource;
use crate::status::StepResults;
use crate::transfer::CancelToken;
use crate::types::ModuleRef;

/// How module content reaches the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingStrategy {
    /// One zip archive per publish
    Zip,
    /// The resource tree mirrored file by file
    Directory,
}

impl PackagingStrategy {
    pub fn from_zip_flag(zip_deployments: bool) -> Self {
        if zip_deployments {
            PackagingStrategy::Zip
        } else {
            PackagingStrategy::Directory
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackagingStrategy::Zip => "zip",
            PackagingStrategy::Directory => "directory",
        }
    }
}

/// One planned file copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferItem {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// What the transfer phase has to ship
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Local archive, copied as one file to the target path
    Archive(PathBuf),
    /// Files copied individually under the target path
    Tree(Vec<TransferItem>),
}

/// Result of packaging one module.
///
/// `artifact` is `None` when packaging failed badly enough that nothing
/// should be transferred; the reasons are in `steps`.
#[derive(Debug, Clone)]
pub struct Packaged {
    pub artifact: Option<Artifact>,
    pub steps: StepResults,
}

/// Packages module resources for one server.
#[derive(Debug, Clone)]
pub struct ArtifactPackager {
    strategy: PackagingStrategy,
    temp_root: PathBuf,
}

impl ArtifactPackager {
    pub fn new(strategy: PackagingStrategy, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            strategy,
            temp_root: temp_root.into(),
        }
    }

    pub fn for_server(server: &dyn ServerConfig) -> Self {
        Self::new(
            PackagingStrategy::from_zip_flag(server.zip_deployments()),
            server.temp_state_location(),
        )
    }

    pub fn strategy(&self) -> PackagingStrategy {
        self.strategy
    }

    /// Local archive location for `module`; overwritten by every publish.
    pub fn archive_path(&self, module: &ModuleRef) -> PathBuf {
        self.temp_root.join(&module.name)
    }

    pub fn package(
        &self,
        module: &ModuleRef,
        resources: &[ModuleResource],
        target: &Path,
        cancel: &CancelToken,
    ) -> Packaged {
        match self.strategy {
            PackagingStrategy::Zip => self.package_archive(module, resources, cancel),
            PackagingStrategy::Directory => Packaged {
                artifact: Some(Artifact::Tree(plan_directory(resources, target))),
                steps: StepResults::new(),
            },
        }
    }

    fn package_archive(
        &self,
        module: &ModuleRef,
        resources: &[ModuleResource],
        cancel: &CancelToken,
    ) -> Packaged {
        let archive_path = self.archive_path(module);
        let mut steps = StepResults::new();

        match write_archive(&self.temp_root, &archive_path, resources, cancel, &mut steps) {
            Ok(()) if !cancel.is_cancelled() => {
                tracing::debug!(
                    module = %module.name,
                    archive = %archive_path.display(),
                    "Built module archive"
                );
                Packaged {
                    artifact: Some(Artifact::Archive(archive_path)),
                    steps,
                }
            }
            Ok(()) => Packaged {
                artifact: None,
                steps,
            },
            Err(err) => {
                steps.fail(PublishError::packaging(&module.name, &err));
                Packaged {
                    artifact: None,
                    steps,
                }
            }
        }
    }
}

/// Write every resource into a fresh archive at `archive_path`.
///
/// Unreadable files become per-resource failures and are left out. Errors
/// that make the archive itself unusable are returned.
fn write_archive(
    temp_root: &Path,
    archive_path: &Path,
    resources: &[ModuleResource],
    cancel: &CancelToken,
    steps: &mut StepResults,
) -> anyhow::Result<()> {
    fs::create_dir_all(temp_root).with_context(|| {
        format!(
            "Failed to create temporary deploy directory: {}",
            temp_root.display()
        )
    })?;

    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for resource in resources {
        if !add_resource(&mut zip, resource, options, cancel, steps)? {
            break;
        }
    }

    zip.finish()
        .with_context(|| format!("Failed to finish archive: {}", archive_path.display()))?;
    Ok(())
}

/// Returns `false` once cancellation stopped the walk.
fn add_resource<W: Write + std::io::Seek>(
    zip: &mut zip::ZipWriter<W>,
    resource: &ModuleResource,
    options: SimpleFileOptions,
    cancel: &CancelToken,
    steps: &mut StepResults,
) -> anyhow::Result<bool> {
    let entry_name = entry_name(&resource.relative_path);

    if cancel.is_cancelled() {
        steps.fail(PublishError::cancelled(format!("packaging {}", entry_name)));
        return Ok(false);
    }

    if resource.is_folder() {
        zip.add_directory(entry_name.as_str(), options)
            .with_context(|| format!("Failed to add directory entry: {}", entry_name))?;
        for child in &resource.children {
            if !add_resource(zip, child, options, cancel, steps)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    let content = match fs::read(&resource.local_path)
        .with_context(|| format!("Failed to read {}", resource.local_path.display()))
    {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(resource = %entry_name, error = %format!("{:#}", err), "Skipping unreadable resource");
            steps.fail(PublishError::packaging(entry_name, &err));
            return Ok(true);
        }
    };

    zip.start_file(entry_name.as_str(), options)
        .with_context(|| format!("Failed to start archive entry: {}", entry_name))?;
    zip.write_all(&content)
        .with_context(|| format!("Failed to write archive entry: {}", entry_name))?;
    steps.ok();
    Ok(true)
}

/// Archive entry name: relative path segments joined with `/`.
fn entry_name(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// One copy per file, mirrored under `target_root`.
pub fn plan_directory(resources: &[ModuleResource], target_root: &Path) -> Vec<TransferItem> {
    resources
        .iter()
        .flat_map(|resource| resource.files())
        .map(|file| TransferItem {
            source: file.local_path.clone(),
            dest: target_root.join(&file.relative_path),
        })
        .collect()
}
