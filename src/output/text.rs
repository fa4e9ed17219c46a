//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Descriptor overview (identity, dependencies, scripts, targets)
//! - Validation findings grouped by severity
//! - Resolution table with release dates and source groups
//! - Build and launcher summaries

use crate::build::Artifact;
use crate::manifest::{LoadedDescriptor, WriteResult};
use crate::output::{OutputFormatter, Verbosity};
use crate::resolve::Resolution;
use crate::scripts::InstalledScript;
use crate::validate::{Severity, ValidationReport};
use colored::{ColoredString, Colorize};
use std::io::Write;
use std::path::Path;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Apply `style` only when colors are enabled
    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if self.dry_run {
            format!("{} ", self.paint("(dry-run)", |s| s.cyan()))
        } else {
            String::new()
        }
    }

    fn section(&self, title: &str, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", self.paint(title, |s| s.bold()))
    }

    fn arrow(&self) -> String {
        if self.color {
            "→".dimmed().to_string()
        } else {
            "->".to_string()
        }
    }
}

/// Human-readable byte count
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

impl OutputFormatter for TextFormatter {
    fn format_descriptor(
        &self,
        loaded: &LoadedDescriptor,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let descriptor = &loaded.descriptor;
        let project = &descriptor.project;

        writeln!(
            writer,
            "{} {}",
            self.paint(&project.name, |s| s.bright_white().bold()),
            self.paint(&project.version.to_string(), |s| s.green())
        )?;
        if let Some(ref description) = project.description {
            writeln!(writer, "  {}", description)?;
        }
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        if let Some(ref requires_python) = project.requires_python {
            writeln!(writer, "  requires-python: {}", requires_python)?;
        }
        if let Some(ref license) = project.license {
            writeln!(writer, "  license: {}", license.value())?;
        }
        if !project.authors.is_empty() {
            let authors: Vec<String> = project.authors.iter().map(|a| a.to_string()).collect();
            writeln!(writer, "  authors: {}", authors.join(", "))?;
        }
        match descriptor.build_system.backend {
            Some(ref backend) => {
                let requires: Vec<String> = descriptor
                    .build_system
                    .requires
                    .iter()
                    .map(|r| r.to_string())
                    .collect();
                writeln!(
                    writer,
                    "  backend: {} (requires: {})",
                    backend,
                    requires.join(", ")
                )?;
            }
            None => writeln!(writer, "  backend: {}", self.paint("none", |s| s.red()))?,
        }
        if self.verbosity == Verbosity::Verbose {
            writeln!(writer, "  descriptor: {}", loaded.path.display())?;
            for (label, url) in &project.urls {
                writeln!(writer, "  {}: {}", label, url)?;
            }
        }

        self.section("Dependencies:", writer)?;
        if descriptor.dependencies.is_empty() {
            writeln!(writer, "  {}", self.paint("(none)", |s| s.dimmed()))?;
        }
        for requirement in &descriptor.dependencies {
            writeln!(writer, "  {}", requirement)?;
        }

        for (group, requirements) in &descriptor.optional_dependencies {
            self.section(&format!("Optional [{}]:", group), writer)?;
            for requirement in requirements {
                writeln!(writer, "  {}", requirement)?;
            }
        }

        if !descriptor.scripts.is_empty() {
            self.section("Scripts:", writer)?;
            let width = descriptor
                .scripts
                .iter()
                .map(|ep| ep.name.len())
                .max()
                .unwrap_or(0);
            for ep in &descriptor.scripts {
                writeln!(
                    writer,
                    "  {:width$} {} {}",
                    ep.name,
                    self.arrow(),
                    ep.target(),
                    width = width
                )?;
            }
        }

        if !descriptor.targets.is_empty() {
            let targets = &descriptor.targets;
            self.section("Targets:", writer)?;
            if !targets.wheel.packages.is_empty() {
                writeln!(writer, "  wheel packages: {}", targets.wheel.packages.join(", "))?;
            }
            if !targets.sdist.include.is_empty() {
                writeln!(writer, "  sdist include: {}", targets.sdist.include.join(", "))?;
            }
            if !targets.sdist.exclude.is_empty() {
                writeln!(writer, "  sdist exclude: {}", targets.sdist.exclude.join(", "))?;
            }
        }

        Ok(())
    }

    fn format_validation(
        &self,
        path: &Path,
        report: &ValidationReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let mut diagnostics: Vec<_> = report.diagnostics.iter().collect();
        diagnostics.sort_by_key(|d| d.severity);

        for diagnostic in diagnostics {
            if diagnostic.severity == Severity::Warning && self.verbosity == Verbosity::Quiet {
                continue;
            }
            let label = match diagnostic.severity {
                Severity::Error => self.paint("error", |s| s.red().bold()),
                Severity::Warning => self.paint("warning", |s| s.yellow()),
            };
            writeln!(
                writer,
                "{}: {}: {}",
                label,
                self.paint(&diagnostic.field, |s| s.bold()),
                diagnostic.message
            )?;
        }

        if self.verbosity == Verbosity::Quiet && !report.has_errors() {
            return Ok(());
        }

        let path_display = path.display().to_string();
        if report.is_clean() {
            let mark = self.paint("✓", |s| s.green());
            writeln!(writer, "{} {} is valid", mark, path_display)
        } else {
            let errors = report.error_count();
            let warnings = report.warning_count();
            writeln!(
                writer,
                "{}: {} {}, {} {}",
                path_display,
                errors,
                if errors == 1 { "error" } else { "errors" },
                warnings,
                if warnings == 1 { "warning" } else { "warnings" }
            )
        }
    }

    fn format_write(
        &self,
        result: &WriteResult,
        check: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let path_display = result.path.display().to_string();

        if !result.changed {
            if self.verbosity != Verbosity::Quiet {
                writeln!(writer, "{} already formatted", path_display)?;
            }
            return Ok(());
        }

        if check {
            return writeln!(
                writer,
                "{} {}",
                self.paint("would reformat", |s| s.yellow()),
                path_display
            );
        }

        if result.file_modified {
            writeln!(writer, "{} {}", self.paint("formatted", |s| s.green()), path_display)
        } else {
            writeln!(
                writer,
                "{}would reformat {}",
                self.dry_run_prefix(),
                path_display
            )?;
            if self.verbosity == Verbosity::Verbose {
                writeln!(writer)?;
                write!(writer, "{}", result.rendered)?;
            }
            Ok(())
        }
    }

    fn format_resolution(
        &self,
        resolution: &Resolution,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let name_width = resolution
            .packages
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0)
            .max(20);
        let version_width = resolution
            .packages
            .iter()
            .map(|p| p.version.to_string().len())
            .max()
            .unwrap_or(0);

        if self.verbosity != Verbosity::Quiet {
            for package in &resolution.packages {
                let version = format!("{:width$}", package.version, width = version_width);
                let date = package
                    .released_at
                    .map(|d| format!(" ({})", d.format("%Y/%m/%d")))
                    .unwrap_or_default();
                let groups = if package.groups.is_empty() || package.runtime {
                    String::new()
                } else {
                    format!(" [{}]", package.groups.join(", "))
                };

                writeln!(
                    writer,
                    "  {:name_width$} {}{}{}",
                    package.name,
                    self.paint(&version, |s| s.bright_white().bold()),
                    self.paint(&date, |s| s.dimmed()),
                    self.paint(&groups, |s| s.cyan()),
                    name_width = name_width
                )?;

                if self.verbosity == Verbosity::Verbose {
                    if !package.specifiers.is_empty() {
                        writeln!(writer, "    constraint: {}", package.specifiers)?;
                    }
                    for marker in &package.markers {
                        writeln!(writer, "    marker: {}", marker)?;
                    }
                }
            }
            for requirement in &resolution.direct {
                writeln!(writer, "  {}", self.paint(&requirement.to_string(), |s| s.dimmed()))?;
            }
            writeln!(writer)?;
        }

        let count = resolution.len();
        writeln!(
            writer,
            "Resolved {} {}",
            self.paint(&count.to_string(), |s| s.green()),
            if count == 1 { "package" } else { "packages" }
        )
    }

    fn format_artifacts(
        &self,
        artifacts: &[Artifact],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for artifact in artifacts {
            if self.verbosity == Verbosity::Quiet {
                writeln!(writer, "{}", artifact.path.display())?;
                continue;
            }
            writeln!(
                writer,
                "{} {} {} ({} files, {})",
                self.paint("Built", |s| s.green().bold()),
                artifact.kind,
                artifact.path.display(),
                artifact.files,
                human_size(artifact.size)
            )?;
            if self.verbosity == Verbosity::Verbose {
                writeln!(writer, "  sha256: {}", artifact.sha256)?;
            }
        }
        Ok(())
    }

    fn format_scripts(
        &self,
        scripts: &[InstalledScript],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        for script in scripts {
            let verb = if script.written {
                self.paint("Installed", |s| s.green().bold())
            } else {
                "Would install".to_string()
            };
            writeln!(
                writer,
                "{}{} {} {} {} ({})",
                prefix,
                verb,
                script.name,
                self.arrow(),
                script.path.display(),
                script.target
            )?;
        }
        Ok(())
    }
}
