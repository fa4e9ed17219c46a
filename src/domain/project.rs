//! Project identity: name, version and descriptive metadata

use super::{normalize_name, Version};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// How the project's license is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum License {
    /// SPDX expression (`license = "MIT"`)
    Expression(String),
    /// Inline text (`license = { text = "MIT" }`)
    Text(String),
    /// License file (`license = { file = "LICENSE" }`)
    File(String),
}

impl License {
    pub fn value(&self) -> &str {
        match self {
            License::Expression(v) | License::Text(v) | License::File(v) => v,
        }
    }
}

/// The long description source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readme {
    /// A file relative to the project root (`readme = "README.md"`)
    File {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// Inline text (`readme = { text = "...", content-type = "text/plain" }`)
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
}

impl Readme {
    /// Plain `readme = "path"` form
    pub fn file(path: impl Into<String>) -> Self {
        Readme::File {
            path: path.into(),
            content_type: None,
        }
    }

    /// Path of the readme file, if the description is not inline
    pub fn path(&self) -> Option<&str> {
        match self {
            Readme::File { path, .. } => Some(path),
            Readme::Text { .. } => None,
        }
    }

    /// Declared content type
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Readme::File { content_type, .. } | Readme::Text { content_type, .. } => {
                content_type.as_deref()
            }
        }
    }
}

/// An author or maintainer entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => write!(f, "{} <{}>", name, email),
            (Some(name), None) => write!(f, "{}", name),
            (None, Some(email)) => write!(f, "{}", email),
            (None, None) => Ok(()),
        }
    }
}

/// Identity and descriptive metadata of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectIdentity {
    pub name: String,
    pub version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<Readme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Person>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<String>,
    /// Project URLs keyed by label (`Homepage`, `Repository`, `Documentation`, `Issues`)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub urls: BTreeMap<String, String>,
}

impl ProjectIdentity {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            description: None,
            readme: None,
            requires_python: None,
            license: None,
            authors: Vec::new(),
            keywords: Vec::new(),
            classifiers: Vec::new(),
            urls: BTreeMap::new(),
        }
    }

    /// Normalized distribution name, unique within a package index
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Distribution name as used in artifact file names (`mcp_feedback_collector`)
    pub fn artifact_name(&self) -> String {
        self.normalized_name().replace('-', "_")
    }
}
