//! Output formatting for command results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::build::Artifact;
use crate::manifest::{LoadedDescriptor, WriteResult};
use crate::resolve::Resolution;
use crate::scripts::InstalledScript;
use crate::validate::ValidationReport;
use std::io::Write;
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Minimal output
    Quiet,
    /// Normal output
    #[default]
    Normal,
    /// Detailed output with additional information
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Whether this is a dry-run
    pub dry_run: bool,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            dry_run: false,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create a new output configuration
    pub fn new(format: OutputFormat, verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            format,
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, verbose: bool, quiet: bool, dry_run: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self::new(format, verbosity, dry_run)
    }
}

/// Trait for output formatters, one method per command result
pub trait OutputFormatter {
    /// Descriptor contents (`show`)
    fn format_descriptor(
        &self,
        loaded: &LoadedDescriptor,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Validation findings (`check`)
    fn format_validation(
        &self,
        path: &Path,
        report: &ValidationReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Canonical re-serialization outcome (`fmt`)
    fn format_write(
        &self,
        result: &WriteResult,
        check: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Resolved environment (`resolve`)
    fn format_resolution(
        &self,
        resolution: &Resolution,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Produced artifacts (`build`)
    fn format_artifacts(
        &self,
        artifacts: &[Artifact],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Written launchers (`install-scripts`)
    fn format_scripts(
        &self,
        scripts: &[InstalledScript],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(
            config.verbosity,
            config.dry_run,
            config.color,
        )),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity, config.dry_run)),
    }
}
