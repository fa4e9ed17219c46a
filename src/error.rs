//! Application error types using thiserror
//!
//! Error hierarchy:
//! - DescriptorError: Issues reading, parsing or writing pyproject.toml
//! - RegistryError: Issues with package index communication
//! - ResolveError: Unsatisfiable dependency sets
//! - BuildError: Failures while producing wheel/sdist artifacts
//! - ScriptError: Failures while registering console-script launchers
//! - ConfigError: Issues with CLI configuration
//! - Output: stdout write failures

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{SpecifierSet, Version};
use crate::parser::ParseError;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Descriptor related errors
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Package index related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Dependency resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Artifact build errors
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Entry point registration errors
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failed to write command output
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors related to the package descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Descriptor file not found
    #[error("descriptor not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read descriptor file
    #[error("failed to read descriptor {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write descriptor file
    #[error("failed to write descriptor {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML syntax or unexpected value types
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// Required key is absent
    #[error("missing required field '{field}' in {path}")]
    MissingField { path: PathBuf, field: String },

    /// A field value is present but invalid
    #[error("invalid value for '{field}' in {path}: {source}")]
    InvalidField {
        path: PathBuf,
        field: String,
        #[source]
        source: ParseError,
    },

    /// Failed to render the descriptor back to TOML
    #[error("failed to serialize descriptor: {message}")]
    SerializeError { message: String },
}

/// Errors related to package index communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in index
    #[error("package '{package}' not found in {registry}")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry}")]
    RateLimitExceeded { registry: String },

    /// Invalid response from index
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// Local index file could not be loaded
    #[error("failed to load index file {path}: {message}")]
    IndexFile { path: PathBuf, message: String },
}

/// Why a single requirement could not be satisfied
#[derive(Debug, Clone)]
pub enum UnsatisfiedReason {
    /// The index has releases, but none match
    NoMatchingVersion { available: Vec<Version> },
    /// The index could not be queried
    IndexFailure(String),
}

/// A requirement that resolution could not satisfy
#[derive(Debug, Clone)]
pub struct Unsatisfied {
    pub package: String,
    pub specifiers: SpecifierSet,
    pub reason: UnsatisfiedReason,
}

impl fmt::Display for Unsatisfied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constraint = if self.specifiers.is_empty() {
            "*".to_string()
        } else {
            self.specifiers.to_string()
        };
        match &self.reason {
            UnsatisfiedReason::NoMatchingVersion { available } if available.is_empty() => {
                write!(f, "{} {}: no releases available", self.package, constraint)
            }
            UnsatisfiedReason::NoMatchingVersion { available } => {
                let shown: Vec<String> = available.iter().rev().take(5).map(|v| v.to_string()).collect();
                write!(
                    f,
                    "{} {}: no matching version (latest available: {})",
                    self.package,
                    constraint,
                    shown.join(", ")
                )
            }
            UnsatisfiedReason::IndexFailure(message) => {
                write!(f, "{} {}: {}", self.package, constraint, message)
            }
        }
    }
}

/// Errors related to dependency resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    /// One or more requirements have no compatible version
    #[error("unsatisfiable dependencies:\n{}", format_unsatisfied(.unsatisfied))]
    Unsatisfiable { unsatisfied: Vec<Unsatisfied> },

    /// A requested optional group does not exist
    #[error("unknown dependency group '{group}' (available: {available})")]
    UnknownGroup { group: String, available: String },
}

fn format_unsatisfied(unsatisfied: &[Unsatisfied]) -> String {
    unsatisfied
        .iter()
        .map(|u| format!("  - {}", u))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors related to building distribution artifacts
#[derive(Error, Debug)]
pub enum BuildError {
    /// No build backend declared
    #[error("no build backend declared in [build-system]")]
    MissingBackend,

    /// Declared backend is not available
    #[error("build backend '{backend}' is not available (supported: {supported})")]
    BackendUnavailable { backend: String, supported: String },

    /// A wheel package directory does not exist
    #[error("package directory not found: {path}")]
    MissingPackageDir { path: PathBuf },

    /// A target selected no files
    #[error("{target} target selects no files")]
    EmptyTarget { target: String },

    /// A file rule is not a valid glob pattern
    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Archive writing failed
    #[error("failed to write archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to console-script registration
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Descriptor declares no console scripts
    #[error("no console scripts declared in [project.scripts]")]
    NoScripts,

    /// Failed to write a launcher
    #[error("failed to write launcher {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '2w', '10d', '1m'")]
    InvalidDuration { value: String },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },
}

impl DescriptorError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        DescriptorError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DescriptorError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DescriptorError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DescriptorError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new MissingField error
    pub fn missing_field(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        DescriptorError::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Creates a new InvalidField error
    pub fn invalid_field(
        path: impl Into<PathBuf>,
        field: impl Into<String>,
        source: ParseError,
    ) -> Self {
        DescriptorError::InvalidField {
            path: path.into(),
            field: field.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }
}

impl BuildError {
    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Archive error
    pub fn archive(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        BuildError::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, AppError>;
