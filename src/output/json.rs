//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of every command result
//! - One pretty-printed document per invocation

use crate::build::Artifact;
use crate::domain::{BuildSystem, BuildTargets, EntryPoint, ProjectIdentity, Requirement};
use crate::manifest::{LoadedDescriptor, WriteResult};
use crate::output::{OutputFormatter, Verbosity};
use crate::resolve::Resolution;
use crate::scripts::InstalledScript;
use crate::validate::{Diagnostic, ValidationReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self { verbosity, dry_run }
    }

    fn emit<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)
    }
}

/// JSON representation of a descriptor
#[derive(Serialize)]
struct JsonDescriptor<'a> {
    path: String,
    #[serde(rename = "build-system")]
    build_system: &'a BuildSystem,
    project: &'a ProjectIdentity,
    dependencies: &'a [Requirement],
    #[serde(rename = "optional-dependencies")]
    optional_dependencies: &'a BTreeMap<String, Vec<Requirement>>,
    scripts: &'a [EntryPoint],
    targets: &'a BuildTargets,
}

/// JSON representation of validation findings
#[derive(Serialize)]
struct JsonValidation<'a> {
    path: String,
    valid: bool,
    errors: usize,
    warnings: usize,
    diagnostics: &'a [Diagnostic],
}

/// JSON representation of a fmt run
#[derive(Serialize)]
struct JsonWrite<'a> {
    path: String,
    check: bool,
    dry_run: bool,
    changed: bool,
    written: bool,
    /// Canonical text (only in verbose mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<&'a str>,
}

/// JSON representation of produced artifacts
#[derive(Serialize)]
struct JsonArtifacts<'a> {
    artifacts: &'a [Artifact],
}

/// JSON representation of launchers
#[derive(Serialize)]
struct JsonScripts<'a> {
    dry_run: bool,
    scripts: &'a [InstalledScript],
}

impl OutputFormatter for JsonFormatter {
    fn format_descriptor(
        &self,
        loaded: &LoadedDescriptor,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let descriptor = &loaded.descriptor;
        self.emit(
            &JsonDescriptor {
                path: loaded.path.display().to_string(),
                build_system: &descriptor.build_system,
                project: &descriptor.project,
                dependencies: &descriptor.dependencies,
                optional_dependencies: &descriptor.optional_dependencies,
                scripts: &descriptor.scripts,
                targets: &descriptor.targets,
            },
            writer,
        )
    }

    fn format_validation(
        &self,
        path: &Path,
        report: &ValidationReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.emit(
            &JsonValidation {
                path: path.display().to_string(),
                valid: !report.has_errors(),
                errors: report.error_count(),
                warnings: report.warning_count(),
                diagnostics: &report.diagnostics,
            },
            writer,
        )
    }

    fn format_write(
        &self,
        result: &WriteResult,
        check: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let rendered = (self.verbosity == Verbosity::Verbose).then_some(result.rendered.as_str());
        self.emit(
            &JsonWrite {
                path: result.path.display().to_string(),
                check,
                dry_run: self.dry_run,
                changed: result.changed,
                written: result.file_modified,
                rendered,
            },
            writer,
        )
    }

    fn format_resolution(
        &self,
        resolution: &Resolution,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.emit(resolution, writer)
    }

    fn format_artifacts(
        &self,
        artifacts: &[Artifact],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.emit(&JsonArtifacts { artifacts }, writer)
    }

    fn format_scripts(
        &self,
        scripts: &[InstalledScript],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.emit(
            &JsonScripts {
                dry_run: self.dry_run,
                scripts,
            },
            writer,
        )
    }
}
