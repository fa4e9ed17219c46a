//! Descriptor validation
//!
//! Parsing already rejects malformed values; these checks cover the
//! cross-field and source-tree invariants that parsing cannot see.

use crate::build::{
    compile_rules, sdist_paths, wheel_package_dirs, SourceTree, SUPPORTED_BACKENDS,
};
use crate::domain::{is_valid_name, License, Readme, Requirement};
use crate::error::BuildError;
use crate::manifest::Descriptor;
use crate::parser::parse_specifiers;
use crate::scripts::{locate_callable, search_roots, CallableLocation};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One finding about a descriptor field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted descriptor key the finding is about
    pub field: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.field, self.message)
    }
}

/// All diagnostics for one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        debug!(%diagnostic, "validation finding");
        self.diagnostics.push(diagnostic);
    }
}

/// Validate `descriptor`; source-tree checks run only when `root` is given
pub fn validate(descriptor: &Descriptor, root: Option<&Path>) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_identity(descriptor, &mut report);
    check_dependencies(descriptor, &mut report);
    check_build_system(descriptor, &mut report);
    check_scripts(descriptor, &mut report);

    if let Some(root) = root {
        check_files(descriptor, root, &mut report);
    }

    report.diagnostics.sort_by_key(|d| d.severity);
    report
}

fn check_identity(descriptor: &Descriptor, report: &mut ValidationReport) {
    let project = &descriptor.project;

    if !is_valid_name(&project.name) {
        report.push(Diagnostic::error(
            "project.name",
            format!("'{}' is not a valid distribution name", project.name),
        ));
    }

    if project.version.to_semver().is_none() {
        report.push(Diagnostic::warning(
            "project.version",
            format!(
                "'{}' is a valid release version but not MAJOR.MINOR.PATCH",
                project.version
            ),
        ));
    }

    if let Some(requires_python) = &project.requires_python {
        if let Err(e) = parse_specifiers(requires_python) {
            report.push(Diagnostic::error("project.requires-python", e.to_string()));
        }
    }
}

fn check_dependencies(descriptor: &Descriptor, report: &mut ValidationReport) {
    let mut runtime: HashMap<String, &Requirement> = HashMap::new();
    for requirement in &descriptor.dependencies {
        let key = requirement.normalized_name();
        if !requirement.specifiers.is_satisfiable() {
            report.push(Diagnostic::error(
                "project.dependencies",
                format!("'{}' admits no version", requirement),
            ));
        }
        match runtime.get(&key) {
            Some(previous) if !previous.specifiers.intersects(&requirement.specifiers) => {
                report.push(Diagnostic::error(
                    "project.dependencies",
                    format!("'{}' conflicts with '{}'", requirement, previous),
                ));
            }
            Some(_) => {
                report.push(Diagnostic::warning(
                    "project.dependencies",
                    format!("'{}' is listed more than once", requirement.name),
                ));
            }
            None => {
                runtime.insert(key, requirement);
            }
        }
    }

    for (group, requirements) in &descriptor.optional_dependencies {
        let field = format!("project.optional-dependencies.{}", group);
        if requirements.is_empty() {
            report.push(Diagnostic::warning(&field, "group is empty"));
        }
        for requirement in requirements {
            if !requirement.specifiers.is_satisfiable() {
                report.push(Diagnostic::error(
                    &field,
                    format!("'{}' admits no version", requirement),
                ));
            }
            if let Some(mandatory) = runtime.get(&requirement.normalized_name()) {
                if !mandatory.specifiers.intersects(&requirement.specifiers) {
                    report.push(Diagnostic::error(
                        &field,
                        format!(
                            "'{}' conflicts with runtime dependency '{}'",
                            requirement, mandatory
                        ),
                    ));
                }
            }
        }
    }
}

fn check_build_system(descriptor: &Descriptor, report: &mut ValidationReport) {
    let build_system = &descriptor.build_system;

    match build_system.backend.as_deref() {
        None => report.push(Diagnostic::error(
            "build-system.build-backend",
            "no build backend declared",
        )),
        Some(backend) if !SUPPORTED_BACKENDS.contains(&backend) => {
            report.push(Diagnostic::warning(
                "build-system.build-backend",
                format!(
                    "'{}' cannot be built natively (supported: {})",
                    backend,
                    SUPPORTED_BACKENDS.join(", ")
                ),
            ))
        }
        Some(_) => {}
    }

    if build_system.requires.is_empty() {
        report.push(Diagnostic::warning(
            "build-system.requires",
            "no build requirements declared",
        ));
    }
}

fn check_scripts(descriptor: &Descriptor, report: &mut ValidationReport) {
    // Names that differ only in case collide on case-insensitive filesystems
    let mut seen: HashMap<String, &str> = HashMap::new();
    for script in &descriptor.scripts {
        if let Some(other) = seen.insert(script.name.to_lowercase(), &script.name) {
            report.push(Diagnostic::warning(
                format!("project.scripts.{}", script.name),
                format!("command name collides with '{}'", other),
            ));
        }
    }
}

fn check_files(descriptor: &Descriptor, root: &Path, report: &mut ValidationReport) {
    let project = &descriptor.project;

    if let Some(readme) = project.readme.as_ref().and_then(Readme::path) {
        if !root.join(readme).is_file() {
            report.push(Diagnostic::warning(
                "project.readme",
                format!("readme file '{}' not found", readme),
            ));
        }
    }
    if let Some(License::File(file)) = &project.license {
        if !root.join(file).is_file() {
            report.push(Diagnostic::warning(
                "project.license",
                format!("license file '{}' not found", file),
            ));
        }
    }

    let tree = match SourceTree::scan(root, &[root.join("dist")]) {
        Ok(tree) => tree,
        Err(e) => {
            report.push(Diagnostic::error("tool.hatch.build", e.to_string()));
            return;
        }
    };

    let package_dirs = check_wheel(descriptor, &tree, report);
    check_sdist(descriptor, &tree, report);

    let roots = search_roots(root, &package_dirs);
    for script in &descriptor.scripts {
        let field = format!("project.scripts.{}", script.name);
        match locate_callable(&roots, script) {
            CallableLocation::Found { .. } => {}
            CallableLocation::ModuleMissing => report.push(Diagnostic::error(
                field,
                format!("module '{}' not found in the source tree", script.module),
            )),
            CallableLocation::CallableMissing { path } => report.push(Diagnostic::error(
                field,
                format!(
                    "'{}' is not defined in {}",
                    script.callable,
                    path.display()
                ),
            )),
            CallableLocation::RequiresArguments { params, .. } => {
                report.push(Diagnostic::warning(
                    field,
                    format!(
                        "'{}({})' cannot be called without arguments",
                        script.callable, params
                    ),
                ))
            }
        }
    }
}

fn check_wheel(descriptor: &Descriptor, tree: &SourceTree, report: &mut ValidationReport) -> Vec<String> {
    let field = "tool.hatch.build.targets.wheel.packages";
    match wheel_package_dirs(tree, &descriptor.targets.wheel, &descriptor.project.artifact_name()) {
        Ok(dirs) => dirs,
        Err(BuildError::MissingPackageDir { path }) => {
            report.push(Diagnostic::error(
                field,
                format!("package directory {} selects no files", path.display()),
            ));
            Vec::new()
        }
        Err(e) => {
            report.push(Diagnostic::error(field, e.to_string()));
            Vec::new()
        }
    }
}

fn check_sdist(descriptor: &Descriptor, tree: &SourceTree, report: &mut ValidationReport) {
    let target = &descriptor.targets.sdist;

    let includes = match compile_rules(&target.include) {
        Ok(rules) => rules,
        Err(e) => {
            report.push(Diagnostic::error("tool.hatch.build.targets.sdist.include", e.to_string()));
            return;
        }
    };
    if let Err(e) = compile_rules(&target.exclude) {
        report.push(Diagnostic::error("tool.hatch.build.targets.sdist.exclude", e.to_string()));
        return;
    }

    for rule in includes.iter().filter(|r| !r.matches_any(tree)) {
        report.push(Diagnostic::warning(
            "tool.hatch.build.targets.sdist.include",
            format!("rule '{}' matches no files", rule.as_str()),
        ));
    }

    if let Err(e) = sdist_paths(tree, target) {
        report.push(Diagnostic::error("tool.hatch.build.targets.sdist", e.to_string()));
    }
}
