//! Package index adapters for fetching release information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - PyPI JSON API adapter
//! - Offline JSON index file

mod client;
mod local;
mod pypi;
mod release;

pub use client::HttpClient;
pub use local::LocalIndex;
pub use pypi::{PyPIAdapter, PYPI_API_URL};
pub use release::Release;

use crate::error::RegistryError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Trait for package index adapters
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Get the index name used in messages
    fn name(&self) -> &str;

    /// Fetch every release of a package, sorted by version
    async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>, RegistryError>;
}

/// Where releases are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// A server speaking the PyPI JSON API
    Remote { base_url: String },
    /// A local JSON index file
    File(PathBuf),
}

impl Default for IndexSource {
    fn default() -> Self {
        IndexSource::Remote {
            base_url: PYPI_API_URL.to_string(),
        }
    }
}

/// Create the index adapter for `source`
pub fn create_index(source: &IndexSource) -> Result<Arc<dyn PackageIndex>, RegistryError> {
    match source {
        IndexSource::Remote { base_url } => {
            let client = HttpClient::new()?;
            Ok(Arc::new(PyPIAdapter::with_base_url(client, base_url.clone())))
        }
        IndexSource::File(path) => Ok(Arc::new(LocalIndex::from_path(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_source_is_pypi() {
        assert_eq!(
            IndexSource::default(),
            IndexSource::Remote {
                base_url: "https://pypi.org/pypi".to_string()
            }
        );
    }

    #[test]
    fn test_create_remote_index() {
        let index = create_index(&IndexSource::default()).unwrap();
        assert_eq!(index.name(), "PyPI");
    }

    #[test]
    fn test_create_file_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, r#"{"mcp": ["1.0.0"]}"#).unwrap();

        let index = create_index(&IndexSource::File(path)).unwrap();
        assert!(index.name().ends_with("index.json"));
    }

    #[test]
    fn test_create_missing_file_index() {
        let result = create_index(&IndexSource::File(PathBuf::from("/nonexistent/index.json")));
        assert!(matches!(result, Err(RegistryError::IndexFile { .. })));
    }
}
