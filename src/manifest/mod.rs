//! Package descriptor loading, parsing and writing
//!
//! This module provides functionality to:
//! - Locate pyproject.toml for a file or project directory
//! - Parse it into a typed [`Descriptor`]
//! - Render a descriptor back to canonical TOML and write it out

mod descriptor;
mod detector;
mod pyproject_toml;
mod writer;

pub use descriptor::{Descriptor, Passthrough};
pub use detector::{find_descriptor, project_root, DESCRIPTOR_FILENAME};
pub use pyproject_toml::{parse_descriptor, parse_descriptor_at, render_descriptor, to_toml_string};
pub use writer::{read_descriptor, write_descriptor, DescriptorWriter, WriteResult};

use crate::error::DescriptorError;
use std::path::Path;
use tracing::debug;

/// A descriptor together with the file it was read from
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    /// Path to pyproject.toml
    pub path: std::path::PathBuf,
    /// Raw file content
    pub content: String,
    /// Parsed descriptor
    pub descriptor: Descriptor,
}

impl LoadedDescriptor {
    /// Directory containing the descriptor; file rules are relative to it
    pub fn root(&self) -> &Path {
        project_root(&self.path)
    }
}

/// Load a descriptor from a pyproject.toml path or a directory containing one
pub fn load_descriptor(path: &Path) -> Result<LoadedDescriptor, DescriptorError> {
    let path = find_descriptor(path)?;
    debug!(path = %path.display(), "loading descriptor");
    let content = read_descriptor(&path)?;
    let descriptor = parse_descriptor_at(&content, &path)?;
    Ok(LoadedDescriptor {
        path,
        content,
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL: &str = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n";

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), MINIMAL).unwrap();

        let loaded = load_descriptor(dir.path()).unwrap();
        assert_eq!(loaded.descriptor.project.name, "demo");
        assert_eq!(loaded.root(), dir.path());
        assert_eq!(loaded.content, MINIMAL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, MINIMAL).unwrap();

        let loaded = load_descriptor(&path).unwrap();
        assert_eq!(loaded.path, path);
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_descriptor(dir.path()).unwrap_err();
        assert!(matches!(err, DescriptorError::NotFound { .. }));
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project\n").unwrap();

        let err = load_descriptor(dir.path()).unwrap_err();
        assert!(err.to_string().contains("pyproject.toml"));
    }
}
