//! PyPI JSON API adapter
//!
//! Fetches package release information from PyPI (or a mirror serving the
//! same JSON API).
//! API endpoint: https://pypi.org/pypi/{package}/json

use crate::domain::{normalize_name, Version};
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageIndex, Release};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

/// PyPI API base URL
pub const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// PyPI adapter
pub struct PyPIAdapter {
    client: HttpClient,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    /// Release files keyed by version
    releases: HashMap<String, Vec<ReleaseFile>>,
}

/// Release file information
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    /// Upload time for the release file
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    yanked: bool,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, PYPI_API_URL)
    }

    /// Create an adapter for a mirror serving the PyPI JSON API
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.base_url, normalize_name(package))
    }
}

/// Convert the release map into sorted releases
///
/// Versions that do not parse and versions without any files are dropped.
/// A release counts as yanked only when every file is yanked.
fn releases_from_response(response: PyPIResponse) -> Vec<Release> {
    let mut releases = Vec::new();

    for (version, files) in response.releases {
        if files.is_empty() {
            continue;
        }
        let Ok(parsed) = Version::parse(&version) else {
            trace!(version, "skipping unparseable version");
            continue;
        };

        let earliest: Option<DateTime<Utc>> = files
            .iter()
            .filter_map(|f| f.upload_time_iso_8601.as_deref())
            .filter_map(|t| t.parse::<DateTime<Utc>>().ok())
            .min();
        let yanked = files.iter().all(|f| f.yanked);

        releases.push(Release::new(parsed, earliest).with_yanked(yanked));
    }

    releases.sort();
    releases
}

#[async_trait]
impl PackageIndex for PyPIAdapter {
    fn name(&self) -> &str {
        "PyPI"
    }

    async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>, RegistryError> {
        let url = self.build_url(package);
        let response: PyPIResponse = self.client.get_json(&url, package, self.name()).await?;
        Ok(releases_from_response(response))
    }
}
