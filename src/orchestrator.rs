//! Command orchestrator for coordinating each workflow
//!
//! This module provides:
//! - Workflow coordination: locate → load → act → format
//! - Index selection and progress display for resolution
//! - Output directory and bin directory checks
//! - Exit status decisions (validation errors, non-canonical files)

use crate::build::build_artifacts;
use crate::cli::{BuildArgs, CliArgs, Command, FmtArgs, InstallArgs, ResolveArgs};
use crate::error::{AppError, ConfigError};
use crate::manifest::{load_descriptor, DescriptorWriter, LoadedDescriptor};
use crate::output::{create_formatter, OutputConfig, OutputFormatter};
use crate::progress::Progress;
use crate::registry::create_index;
use crate::resolve::{ResolveOptions, Resolver};
use crate::scripts::ScriptInstaller;
use crate::validate::validate;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Runs one CLI command and renders its result
pub struct Orchestrator {
    /// CLI arguments for configuration
    args: CliArgs,
    /// Formatter chosen from the global output flags
    formatter: Box<dyn OutputFormatter>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given CLI arguments
    pub fn new(args: CliArgs) -> Self {
        let formatter = create_formatter(Self::output_config(&args));
        Self { args, formatter }
    }

    /// Output configuration derived from the global flags
    pub fn output_config(args: &CliArgs) -> OutputConfig {
        OutputConfig::from_cli(
            args.json,
            args.verbose,
            args.quiet,
            args.command.is_dry_run(),
        )
    }

    /// Run the command, writing results to `writer`
    ///
    /// Returns `Ok(false)` when the command completed but the outcome is a
    /// failure (validation errors, `fmt --check` on a non-canonical file).
    pub async fn run(&self, writer: &mut dyn Write) -> Result<bool, AppError> {
        let loaded = load_descriptor(self.args.command.path())?;
        info!(path = %loaded.path.display(), "loaded descriptor");

        match self.args.command {
            Command::Show(_) => {
                self.formatter.format_descriptor(&loaded, writer)?;
                Ok(true)
            }
            Command::Check(_) => self.check(&loaded, writer),
            Command::Fmt(ref args) => self.fmt(&loaded, args, writer),
            Command::Resolve(ref args) => self.resolve(&loaded, args, writer).await,
            Command::Build(ref args) => self.build(&loaded, args, writer),
            Command::InstallScripts(ref args) => self.install_scripts(&loaded, args, writer),
        }
    }

    fn check(&self, loaded: &LoadedDescriptor, writer: &mut dyn Write) -> Result<bool, AppError> {
        let report = validate(&loaded.descriptor, Some(loaded.root()));
        debug!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation finished"
        );
        self.formatter
            .format_validation(&loaded.path, &report, writer)?;
        Ok(!report.has_errors())
    }

    fn fmt(
        &self,
        loaded: &LoadedDescriptor,
        args: &FmtArgs,
        writer: &mut dyn Write,
    ) -> Result<bool, AppError> {
        let descriptor_writer = DescriptorWriter::new(args.dry_run || args.check);
        let result = descriptor_writer.write(&loaded.path, &loaded.content, &loaded.descriptor)?;
        self.formatter.format_write(&result, args.check, writer)?;
        Ok(!(args.check && result.changed))
    }

    async fn resolve(
        &self,
        loaded: &LoadedDescriptor,
        args: &ResolveArgs,
        writer: &mut dyn Write,
    ) -> Result<bool, AppError> {
        let mut progress = Progress::for_output(&Self::output_config(&self.args));

        progress.spinner("Loading package index...");
        let index = create_index(&args.index_source());
        progress.finish_and_clear();
        let index = index?;

        let mut options = ResolveOptions::new()
            .with_groups(args.groups.clone())
            .with_prerelease(args.pre)
            .with_concurrency(args.concurrency);
        if let Some(min_age) = args.min_age {
            options = options.with_min_age(min_age);
        }

        let resolver = Resolver::new(index, options);
        let resolution = resolver
            .resolve_with_progress(&loaded.descriptor, &mut progress)
            .await?;

        self.formatter.format_resolution(&resolution, writer)?;
        Ok(true)
    }

    fn build(
        &self,
        loaded: &LoadedDescriptor,
        args: &BuildArgs,
        writer: &mut dyn Write,
    ) -> Result<bool, AppError> {
        let out_dir = match args.out {
            Some(ref out) => out.clone(),
            None => loaded.root().join("dist"),
        };
        ensure_directory(&out_dir)?;

        let artifacts = build_artifacts(&loaded.descriptor, loaded.root(), &out_dir, &args.kinds())?;
        self.formatter.format_artifacts(&artifacts, writer)?;
        Ok(true)
    }

    fn install_scripts(
        &self,
        loaded: &LoadedDescriptor,
        args: &InstallArgs,
        writer: &mut dyn Write,
    ) -> Result<bool, AppError> {
        ensure_directory(&args.bin)?;

        let installer = ScriptInstaller::new(&args.bin)
            .with_python(&args.python)
            .with_dry_run(args.dry_run);
        let installed = installer.install(&loaded.descriptor.scripts)?;
        self.formatter.format_scripts(&installed, writer)?;
        Ok(true)
    }
}

/// Rejects a path that exists but is not a directory
fn ensure_directory(path: &Path) -> Result<(), ConfigError> {
    if path.exists() && !path.is_dir() {
        return Err(ConfigError::InvalidPath {
            path: path.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    Ok(())
}
