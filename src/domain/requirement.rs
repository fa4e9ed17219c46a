//! Dependency requirement structures

use super::SpecifierSet;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

static NAME_SEPARATORS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

static VALID_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").unwrap()
});

/// Normalized distribution name used for comparison (`Foo_Bar.baz` -> `foo-bar-baz`)
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATORS_RE
        .replace_all(name, "-")
        .to_ascii_lowercase()
}

/// Returns true if `name` is a valid distribution name
pub fn is_valid_name(name: &str) -> bool {
    VALID_NAME_RE.is_match(name)
}

/// A single dependency requirement (`pillow[webp]>=8.0.0; python_version >= "3.8"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name as written
    pub name: String,
    /// Requested extras
    pub extras: Vec<String>,
    /// Version constraints
    pub specifiers: SpecifierSet,
    /// Direct reference (`name @ url`)
    pub url: Option<String>,
    /// Environment marker, kept verbatim
    pub marker: Option<String>,
}

impl Requirement {
    /// Creates a requirement on any version of `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            specifiers: SpecifierSet::any(),
            url: None,
            marker: None,
        }
    }

    /// Sets the version constraints (builder pattern)
    pub fn with_specifiers(mut self, specifiers: SpecifierSet) -> Self {
        self.specifiers = specifiers;
        self
    }

    /// Sets the environment marker (builder pattern)
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Normalized package name
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Returns true if this requirement names the same package as `other`
    pub fn same_package(&self, other: &Requirement) -> bool {
        self.normalized_name() == other.normalized_name()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(ref url) = self.url {
            write!(f, " @ {}", url)?;
            if self.marker.is_some() {
                write!(f, " ")?;
            }
        } else {
            write!(f, "{}", self.specifiers)?;
        }
        if let Some(ref marker) = self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_specifiers;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Pillow"), "pillow");
        assert_eq!(normalize_name("mcp_feedback.collector"), "mcp-feedback-collector");
        assert_eq!(normalize_name("a--b__c"), "a-b-c");
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("mcp-feedback-collector"));
        assert!(is_valid_name("x"));
        assert!(!is_valid_name("-leading"));
        assert!(!is_valid_name("trailing."));
        assert!(!is_valid_name("has space"));
    }

    #[test]
    fn test_display_with_specifiers() {
        let req = Requirement::new("pillow").with_specifiers(parse_specifiers(">=8.0.0").unwrap());
        assert_eq!(req.to_string(), "pillow>=8.0.0");
    }

    #[test]
    fn test_display_with_extras_and_marker() {
        let mut req = Requirement::new("httpx")
            .with_specifiers(parse_specifiers(">=0.24").unwrap())
            .with_marker("python_version >= \"3.8\"");
        req.extras.push("http2".to_string());
        assert_eq!(req.to_string(), "httpx[http2]>=0.24; python_version >= \"3.8\"");
    }

    #[test]
    fn test_display_url() {
        let mut req = Requirement::new("pkg");
        req.url = Some("https://example.com/pkg.whl".to_string());
        assert_eq!(req.to_string(), "pkg @ https://example.com/pkg.whl");
    }

    #[test]
    fn test_same_package() {
        assert!(Requirement::new("Pillow").same_package(&Requirement::new("pillow")));
        assert!(!Requirement::new("mcp").same_package(&Requirement::new("mypy")));
    }
}
