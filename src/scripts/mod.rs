//! Console-script registration
//!
//! This module provides:
//! - Launcher shims that call an entry point with no arguments
//! - ScriptInstaller for writing shims into a bin directory (with dry-run)
//! - Best-effort lookup of the callable in the source tree

mod launcher;
mod locate;

pub use launcher::{render_launcher, DEFAULT_PYTHON};
pub use locate::{locate_callable, search_roots, CallableLocation};

use crate::domain::EntryPoint;
use crate::error::ScriptError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A launcher that was (or would be) written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledScript {
    pub name: String,
    pub path: PathBuf,
    pub target: String,
    /// False in dry-run mode
    pub written: bool,
}

/// Writes launcher shims into a bin directory
pub struct ScriptInstaller {
    bin_dir: PathBuf,
    python: String,
    dry_run: bool,
}

impl ScriptInstaller {
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            python: DEFAULT_PYTHON.to_string(),
            dry_run: false,
        }
    }

    /// Interpreter written into the shebang
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Write a launcher for every script
    ///
    /// If any launcher fails, those already written by this call are removed.
    pub fn install(&self, scripts: &[EntryPoint]) -> Result<Vec<InstalledScript>, ScriptError> {
        if scripts.is_empty() {
            return Err(ScriptError::NoScripts);
        }

        if !self.dry_run {
            fs::create_dir_all(&self.bin_dir).map_err(|e| ScriptError::WriteError {
                path: self.bin_dir.clone(),
                source: e,
            })?;
        }

        let mut installed = Vec::with_capacity(scripts.len());
        for script in scripts {
            let path = self.bin_dir.join(&script.name);
            let mut entry = InstalledScript {
                name: script.name.clone(),
                path: path.clone(),
                target: script.target(),
                written: false,
            };

            if self.dry_run {
                debug!(path = %path.display(), "dry-run: launcher not written");
                installed.push(entry);
                continue;
            }

            if let Err(e) = self.write_launcher(&path, &render_launcher(script, &self.python)) {
                rollback(&installed);
                return Err(e);
            }
            info!(command = %script.name, path = %path.display(), "installed launcher");
            entry.written = true;
            installed.push(entry);
        }

        Ok(installed)
    }

    fn write_launcher(&self, path: &Path, content: &str) -> Result<(), ScriptError> {
        let write_error = |source| ScriptError::WriteError {
            path: path.to_path_buf(),
            source,
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = path.with_file_name(format!(".{}.partial", file_name));

        let result = fs::write(&partial, content)
            .and_then(|_| set_executable(&partial))
            .and_then(|_| fs::rename(&partial, path));
        if result.is_err() {
            let _ = fs::remove_file(&partial);
        }
        result.map_err(write_error)
    }
}

fn rollback(installed: &[InstalledScript]) {
    for script in installed.iter().filter(|s| s.written) {
        if let Err(e) = fs::remove_file(&script.path) {
            warn!(path = %script.path.display(), error = %e, "failed to remove launcher");
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
