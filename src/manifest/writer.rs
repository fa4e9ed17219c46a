//! Canonical descriptor writing
//!
//! This module provides:
//! - DescriptorWriter for re-serializing a descriptor in canonical form
//! - Dry-run mode support (no actual file modifications)

use crate::error::DescriptorError;
use crate::manifest::{render_descriptor, Descriptor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writer that renders descriptors in canonical form
pub struct DescriptorWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

/// Result of writing a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    /// Path to the descriptor file
    pub path: PathBuf,
    /// Canonical rendering of the descriptor
    pub rendered: String,
    /// Whether the canonical text differs from what is on disk
    pub changed: bool,
    /// Whether the file was actually modified
    pub file_modified: bool,
}

impl DescriptorWriter {
    /// Create a new DescriptorWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create a DescriptorWriter in dry-run mode
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Check if this writer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Render `descriptor` over `current` and write it to `path` when the text differs
    pub fn write(
        &self,
        path: &Path,
        current: &str,
        descriptor: &Descriptor,
    ) -> Result<WriteResult, DescriptorError> {
        let rendered = render_descriptor(current, descriptor)?;
        let changed = rendered != current;

        let mut result = WriteResult {
            path: path.to_path_buf(),
            rendered,
            changed,
            file_modified: false,
        };

        if !changed {
            debug!(path = %path.display(), "descriptor already canonical");
            return Ok(result);
        }

        if self.dry_run {
            info!(path = %path.display(), "dry-run: descriptor would be rewritten");
            return Ok(result);
        }

        write_descriptor(path, &result.rendered)?;
        result.file_modified = true;
        Ok(result)
    }
}

/// Read a descriptor file content
pub fn read_descriptor(path: &Path) -> Result<String, DescriptorError> {
    fs::read_to_string(path).map_err(|e| DescriptorError::read_error(path, e))
}

/// Write content to a descriptor file
pub fn write_descriptor(path: &Path, content: &str) -> Result<(), DescriptorError> {
    fs::write(path, content).map_err(|e| DescriptorError::write_error(path, e))
}
