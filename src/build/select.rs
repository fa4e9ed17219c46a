//! Source tree scanning and distribution file selection
//!
//! Rules follow gitignore conventions:
//! - A leading `/` (or any inner `/`) anchors the rule at the project root
//! - Other rules match at any depth
//! - A rule matching a directory selects everything below it
//! - A trailing `/` restricts the rule to directories

use crate::domain::{SdistTarget, WheelTarget};
use crate::error::BuildError;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// File name always shipped in a source distribution
const DESCRIPTOR_FILE: &str = "pyproject.toml";

/// Directory names never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".venv", "__pycache__", ".mypy_cache", ".pytest_cache"];

/// File suffixes never selected
const SKIPPED_SUFFIXES: &[&str] = &[".pyc", ".pyo"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Relative paths (`/`-separated, sorted) of every file under a project root
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    files: Vec<String>,
}

impl SourceTree {
    /// Scan `root`, skipping VCS/cache directories and anything under `ignore`
    pub fn scan(root: &Path, ignore: &[PathBuf]) -> Result<Self, BuildError> {
        let ignore: Vec<PathBuf> = ignore
            .iter()
            .filter_map(|p| fs::canonicalize(p).ok())
            .collect();

        let mut files = Vec::new();
        walk(root, root, &ignore, &mut files)?;
        files.sort();

        debug!(root = %root.display(), files = files.len(), "scanned source tree");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Build a tree from known relative paths
    pub fn from_files(root: impl Into<PathBuf>, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut files: Vec<String> = files.into_iter().map(Into::into).collect();
        files.sort();
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Absolute location of a relative path
    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Returns true if any file lives at or below `dir`
    pub fn has_dir(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        self.files.iter().any(|f| f.starts_with(&prefix))
    }
}

fn walk(root: &Path, dir: &Path, ignore: &[PathBuf], files: &mut Vec<String>) -> Result<(), BuildError> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_dir() {
            if SKIPPED_DIRS.contains(&name.as_str()) {
                continue;
            }
            if !ignore.is_empty()
                && fs::canonicalize(&path)
                    .map(|c| ignore.contains(&c))
                    .unwrap_or(false)
            {
                trace!(path = %path.display(), "skipping ignored directory");
                continue;
            }
            walk(root, &path, ignore, files)?;
        } else if file_type.is_file() {
            if SKIPPED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(root) {
                files.push(to_slash(relative));
            }
        }
    }

    Ok(())
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A compiled include/exclude rule
#[derive(Debug, Clone)]
pub struct FileRule {
    raw: String,
    pattern: Pattern,
    anchored: bool,
    dir_only: bool,
}

impl FileRule {
    pub fn new(raw: &str) -> Result<Self, BuildError> {
        let dir_only = raw.ends_with('/');
        let trimmed = raw.trim_end_matches('/');
        let anchored = trimmed.starts_with('/') || trimmed.trim_start_matches('/').contains('/');
        let body = trimmed.trim_start_matches('/');

        if body.is_empty() {
            return Err(BuildError::InvalidPattern {
                pattern: raw.to_string(),
                message: "empty pattern".to_string(),
            });
        }

        let pattern = Pattern::new(body).map_err(|e| BuildError::InvalidPattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            pattern,
            anchored,
            dir_only,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `relative` or one of its parent directories matches
    pub fn matches(&self, relative: &str) -> bool {
        let components: Vec<&str> = relative.split('/').collect();
        let count = components.len();
        let starts = if self.anchored { 0..1 } else { 0..count };

        for start in starts {
            for end in (start + 1)..=count {
                if self.dir_only && end == count {
                    continue;
                }
                let candidate = components[start..end].join("/");
                if self.pattern.matches_with(&candidate, MATCH_OPTIONS) {
                    return true;
                }
            }
        }
        false
    }

    /// Returns true if the rule selects at least one file of `tree`
    pub fn matches_any(&self, tree: &SourceTree) -> bool {
        tree.files().iter().any(|f| self.matches(f))
    }
}

/// Compile a list of raw rules
pub fn compile_rules(rules: &[String]) -> Result<Vec<FileRule>, BuildError> {
    rules.iter().map(|r| FileRule::new(r)).collect()
}

/// A file to be placed in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Location on disk
    pub source: PathBuf,
    /// Path inside the archive
    pub archive_path: String,
}

/// Normalize a package directory rule (`./src/pkg/` → `src/pkg`)
fn package_dir(raw: &str) -> String {
    raw.trim_start_matches("./").trim_matches('/').to_string()
}

/// Package directories the wheel is built from
///
/// Declared packages are used as-is. Without a declaration, `src/<name>` and
/// then `<name>` are tried.
pub fn wheel_package_dirs(
    tree: &SourceTree,
    target: &WheelTarget,
    artifact_name: &str,
) -> Result<Vec<String>, BuildError> {
    if !target.packages.is_empty() {
        let dirs: Vec<String> = target.packages.iter().map(|p| package_dir(p)).collect();
        for dir in &dirs {
            if !tree.has_dir(dir) {
                return Err(BuildError::MissingPackageDir {
                    path: tree.absolute(dir),
                });
            }
        }
        return Ok(dirs);
    }

    [format!("src/{}", artifact_name), artifact_name.to_string()]
        .into_iter()
        .find(|dir| tree.has_dir(dir))
        .map(|dir| vec![dir])
        .ok_or_else(|| BuildError::MissingPackageDir {
            path: tree.absolute(artifact_name),
        })
}

/// Files of the wheel, mapped from `src/pkg/...` to `pkg/...`
pub fn select_wheel_files(
    tree: &SourceTree,
    target: &WheelTarget,
    artifact_name: &str,
) -> Result<Vec<SelectedFile>, BuildError> {
    let dirs = wheel_package_dirs(tree, target, artifact_name)?;
    let mut selected = BTreeMap::new();

    for dir in &dirs {
        let basename = dir.rsplit('/').next().unwrap_or(dir);
        let prefix = format!("{}/", dir);
        for file in tree.files() {
            if let Some(rest) = file.strip_prefix(&prefix) {
                selected
                    .entry(format!("{}/{}", basename, rest))
                    .or_insert_with(|| tree.absolute(file));
            }
        }
    }

    if selected.is_empty() {
        return Err(BuildError::EmptyTarget {
            target: "wheel".to_string(),
        });
    }

    Ok(selected
        .into_iter()
        .map(|(archive_path, source)| SelectedFile {
            source,
            archive_path,
        })
        .collect())
}

/// Relative paths selected by the sdist rules, without the archive prefix
///
/// `pyproject.toml` is always selected.
pub fn sdist_paths(tree: &SourceTree, target: &SdistTarget) -> Result<Vec<String>, BuildError> {
    let includes = compile_rules(&target.include)?;
    let excludes = compile_rules(&target.exclude)?;

    let selected: Vec<String> = tree
        .files()
        .iter()
        .filter(|file| {
            let included = includes.is_empty() || includes.iter().any(|r| r.matches(file));
            included && !excludes.iter().any(|r| r.matches(file))
        })
        .cloned()
        .collect();

    if selected.iter().all(|f| f == DESCRIPTOR_FILE) {
        return Err(BuildError::EmptyTarget {
            target: "sdist".to_string(),
        });
    }

    let mut paths = selected;
    if !paths.iter().any(|f| f == DESCRIPTOR_FILE) && tree.files().iter().any(|f| f == DESCRIPTOR_FILE) {
        paths.push(DESCRIPTOR_FILE.to_string());
        paths.sort();
    }
    Ok(paths)
}

/// Files of the sdist, placed under `prefix/`
pub fn select_sdist_files(
    tree: &SourceTree,
    target: &SdistTarget,
    prefix: &str,
) -> Result<Vec<SelectedFile>, BuildError> {
    Ok(sdist_paths(tree, target)?
        .into_iter()
        .map(|file| SelectedFile {
            source: tree.absolute(&file),
            archive_path: format!("{}/{}", prefix, file),
        })
        .collect())
}
