//! Descriptor file detection

use crate::error::DescriptorError;
use std::path::{Path, PathBuf};

/// File name of the package descriptor
pub const DESCRIPTOR_FILENAME: &str = "pyproject.toml";

/// Resolve `path` to a descriptor file
///
/// - An existing file is used as-is
/// - A directory resolves to its `pyproject.toml`
pub fn find_descriptor(path: &Path) -> Result<PathBuf, DescriptorError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let candidate = path.join(DESCRIPTOR_FILENAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(DescriptorError::not_found(candidate));
    }

    Err(DescriptorError::not_found(path))
}

/// Directory that relative file rules in a descriptor are anchored at
pub fn project_root(descriptor_path: &Path) -> &Path {
    match descriptor_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
