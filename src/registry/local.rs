//! Offline package index backed by a JSON file
//!
//! Format: package name → list of releases, each either a bare version
//! string or an object with `version`, optional `released_at` (RFC 3339)
//! and optional `yanked`.
//!
//! ```json
//! {
//!   "mcp": ["1.0.0", {"version": "1.2.0", "released_at": "2024-12-01T00:00:00Z"}],
//!   "pillow": [{"version": "11.0.0", "yanked": true}]
//! }
//! ```

use crate::domain::{normalize_name, Version};
use crate::error::RegistryError;
use crate::registry::{PackageIndex, Release};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRelease {
    Version(String),
    Detailed {
        version: String,
        #[serde(default)]
        released_at: Option<DateTime<Utc>>,
        #[serde(default)]
        yanked: bool,
    },
}

/// Package index loaded from a local JSON file
#[derive(Debug, Clone, Default)]
pub struct LocalIndex {
    name: String,
    packages: HashMap<String, Vec<Release>>,
}

impl LocalIndex {
    /// Load an index file
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let index_error = |message: String| RegistryError::IndexFile {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| index_error(e.to_string()))?;
        let mut index = Self::from_json(&content).map_err(index_error)?;
        index.name = path.display().to_string();
        Ok(index)
    }

    /// Parse index JSON; the error is a human-readable message
    pub fn from_json(content: &str) -> Result<Self, String> {
        let raw: HashMap<String, Vec<RawRelease>> =
            serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut packages = HashMap::new();
        for (name, entries) in raw {
            let mut releases = Vec::with_capacity(entries.len());
            for entry in entries {
                let (version, released_at, yanked) = match entry {
                    RawRelease::Version(version) => (version, None, false),
                    RawRelease::Detailed {
                        version,
                        released_at,
                        yanked,
                    } => (version, released_at, yanked),
                };
                let version = Version::parse(&version)
                    .map_err(|e| format!("package '{}': {}", name, e))?;
                releases.push(Release::new(version, released_at).with_yanked(yanked));
            }
            releases.sort();
            packages
                .entry(normalize_name(&name))
                .or_insert_with(Vec::new)
                .extend(releases);
        }

        Ok(Self {
            name: "local index".to_string(),
            packages,
        })
    }
}

#[async_trait]
impl PackageIndex for LocalIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>, RegistryError> {
        let mut releases = self
            .packages
            .get(&normalize_name(package))
            .cloned()
            .ok_or_else(|| RegistryError::package_not_found(package, &self.name))?;
        releases.sort();
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INDEX: &str = r#"{
        "mcp": ["1.0.0", {"version": "1.2.0", "released_at": "2024-12-01T00:00:00Z"}],
        "Pillow": [{"version": "11.0.0", "yanked": true}, "10.4.0"]
    }"#;

    #[tokio::test]
    async fn test_fetch_releases_sorted() {
        let index = LocalIndex::from_json(INDEX).unwrap();
        let releases = index.fetch_releases("mcp").await.unwrap();

        let versions: Vec<String> = releases.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.2.0"]);
        assert!(releases[0].released_at.is_none());
        assert!(releases[1].released_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_uses_normalized_names() {
        let index = LocalIndex::from_json(INDEX).unwrap();
        let releases = index.fetch_releases("pillow").await.unwrap();
        assert_eq!(releases.len(), 2);
        assert!(releases[1].yanked);
    }

    #[tokio::test]
    async fn test_fetch_unknown_package() {
        let index = LocalIndex::from_json(INDEX).unwrap();
        let err = index.fetch_releases("markdown").await.unwrap_err();
        assert!(matches!(err, RegistryError::PackageNotFound { .. }));
    }

    #[test]
    fn test_invalid_version_in_index() {
        let err = LocalIndex::from_json(r#"{"mcp": ["one"]}"#).unwrap_err();
        assert!(err.contains("mcp"));
    }

    #[test]
    fn test_from_path_reports_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "not json").unwrap();

        let err = LocalIndex::from_path(&path).unwrap_err();
        assert!(matches!(err, RegistryError::IndexFile { .. }));
        assert!(err.to_string().contains("index.json"));
    }

    #[test]
    fn test_from_path_names_index_after_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, INDEX).unwrap();

        let index = LocalIndex::from_path(&path).unwrap();
        assert!(index.name().ends_with("index.json"));
    }
}
