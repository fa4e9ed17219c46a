//! Distribution artifact builds
//!
//! This module provides:
//! - Backend selection from `[build-system].build-backend`
//! - Wheel and sdist builders for the hatchling layout
//! - Atomic artifact writes: a failed build leaves nothing in the output directory

mod metadata;
mod sdist;
mod select;
mod wheel;

pub use metadata::{core_metadata, entry_points_file, hex_digest, record_digest, wheel_file, Record, WHEEL_TAG};
pub use select::{
    compile_rules, sdist_paths, select_sdist_files, select_wheel_files, wheel_package_dirs,
    FileRule, SelectedFile, SourceTree,
};

use crate::domain::{BuildSystem, Readme, TargetKind};
use crate::error::BuildError;
use crate::manifest::Descriptor;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Backend implemented natively
pub const HATCHLING_BACKEND: &str = "hatchling.build";

/// Backends that can be selected
pub const SUPPORTED_BACKENDS: &[&str] = &[HATCHLING_BACKEND];

/// Inputs shared by every target of one build
pub struct BuildContext<'a> {
    pub descriptor: &'a Descriptor,
    pub tree: SourceTree,
}

impl<'a> BuildContext<'a> {
    pub fn new(descriptor: &'a Descriptor, tree: SourceTree) -> Self {
        Self { descriptor, tree }
    }

    pub fn root(&self) -> &Path {
        self.tree.root()
    }

    /// Content of the declared readme, if it can be read
    pub fn readme_body(&self) -> Option<String> {
        let path = match self.descriptor.project.readme.as_ref()? {
            Readme::Text { text, .. } => return Some(text.clone()),
            Readme::File { path, .. } => self.root().join(path),
        };
        match fs::read_to_string(&path) {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "readme not readable; omitting long description");
                None
            }
        }
    }

    /// `{name}-{version}` with the name in artifact form
    pub fn distribution_stem(&self) -> String {
        let project = &self.descriptor.project;
        format!("{}-{}", project.artifact_name(), project.version)
    }
}

/// A produced distribution file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: TargetKind,
    pub path: PathBuf,
    /// Number of project files packed (generated metadata excluded)
    pub files: usize,
    pub size: u64,
    pub sha256: String,
}

impl Artifact {
    fn from_file(kind: TargetKind, path: &Path, files: usize) -> Result<Self, BuildError> {
        let data = fs::read(path).map_err(|e| BuildError::io(path, e))?;
        Ok(Self {
            kind,
            path: path.to_path_buf(),
            files,
            size: data.len() as u64,
            sha256: hex_digest(&data),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A build backend able to produce wheel and sdist artifacts
pub trait BuildBackend {
    /// Backend import path as declared in `[build-system]`
    fn name(&self) -> &'static str;

    fn build_wheel(&self, ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError>;

    fn build_sdist(&self, ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError>;

    fn build(
        &self,
        kind: TargetKind,
        ctx: &BuildContext<'_>,
        out_dir: &Path,
    ) -> Result<Artifact, BuildError> {
        match kind {
            TargetKind::Wheel => self.build_wheel(ctx, out_dir),
            TargetKind::Sdist => self.build_sdist(ctx, out_dir),
        }
    }
}

/// The hatchling layout: wheel packages plus sdist include/exclude rules
pub struct Hatchling;

impl BuildBackend for Hatchling {
    fn name(&self) -> &'static str {
        HATCHLING_BACKEND
    }

    fn build_wheel(&self, ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError> {
        wheel::build_wheel(ctx, out_dir)
    }

    fn build_sdist(&self, ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError> {
        sdist::build_sdist(ctx, out_dir)
    }
}

/// Get the backend declared by `build_system`
pub fn select_backend(build_system: &BuildSystem) -> Result<Box<dyn BuildBackend>, BuildError> {
    let backend = build_system
        .backend
        .as_deref()
        .ok_or(BuildError::MissingBackend)?;

    match backend {
        HATCHLING_BACKEND => Ok(Box::new(Hatchling)),
        other => Err(BuildError::BackendUnavailable {
            backend: other.to_string(),
            supported: SUPPORTED_BACKENDS.join(", "),
        }),
    }
}

/// Build `kinds` for the project rooted at `root` into `out_dir`
///
/// Either every requested artifact is produced, or none is left behind.
pub fn build_artifacts(
    descriptor: &Descriptor,
    root: &Path,
    out_dir: &Path,
    kinds: &[TargetKind],
) -> Result<Vec<Artifact>, BuildError> {
    let backend = select_backend(&descriptor.build_system)?;
    debug!(backend = backend.name(), "selected build backend");

    fs::create_dir_all(out_dir).map_err(|e| BuildError::io(out_dir, e))?;
    let tree = SourceTree::scan(root, &[out_dir.to_path_buf()])?;
    let ctx = BuildContext::new(descriptor, tree);

    let mut artifacts: Vec<Artifact> = Vec::new();
    for kind in kinds {
        match backend.build(*kind, &ctx, out_dir) {
            Ok(artifact) => {
                info!(kind = %kind, path = %artifact.path.display(), "built artifact");
                artifacts.push(artifact);
            }
            Err(e) => {
                for artifact in &artifacts {
                    if let Err(remove_err) = fs::remove_file(&artifact.path) {
                        warn!(path = %artifact.path.display(), error = %remove_err, "failed to remove artifact");
                    }
                }
                return Err(e);
            }
        }
    }

    Ok(artifacts)
}

/// An artifact being written under a temporary name
///
/// The file is renamed into place by [`PartialFile::commit`]; dropping it
/// uncommitted removes the temporary file.
struct PartialFile {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn create(target: &Path) -> Result<(Self, File), BuildError> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = target.with_file_name(format!(".{}.partial", file_name));
        let file = File::create(&partial).map_err(|e| BuildError::io(&partial, e))?;
        Ok((
            Self {
                partial,
                target: target.to_path_buf(),
                committed: false,
            },
            file,
        ))
    }

    fn path(&self) -> &Path {
        &self.partial
    }

    fn commit(mut self) -> Result<(), BuildError> {
        fs::rename(&self.partial, &self.target).map_err(|e| BuildError::io(&self.target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.partial);
        }
    }
}

/// Read a selected file, reporting errors against its source path
fn read_source(file: &SelectedFile) -> Result<Vec<u8>, BuildError> {
    fs::read(&file.source).map_err(|e| BuildError::io(&file.source, e))
}
