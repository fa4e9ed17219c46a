//! Best-effort lookup of an entry point's callable in the source tree

use crate::domain::EntryPoint;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where an entry point's target was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallableLocation {
    /// Module found and the callable is defined at top level
    Found { path: PathBuf },
    /// No module file for the dotted path
    ModuleMissing,
    /// Module found but nothing named like the callable
    CallableMissing { path: PathBuf },
    /// Function found but it cannot be called without arguments
    RequiresArguments { path: PathBuf, params: String },
}

impl CallableLocation {
    pub fn is_found(&self) -> bool {
        matches!(self, CallableLocation::Found { .. })
    }
}

/// Candidate files for a dotted module path under each search root
fn module_candidates(search_roots: &[PathBuf], module: &str) -> Vec<PathBuf> {
    let relative: PathBuf = module.split('.').collect();
    search_roots
        .iter()
        .flat_map(|root| {
            let base = root.join(&relative);
            [base.with_extension("py"), base.join("__init__.py")]
        })
        .collect()
}

/// Directories a module path may be resolved against
///
/// Parents of the wheel package directories come first, then `src/` and the
/// project root.
pub fn search_roots(root: &Path, package_dirs: &[String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in package_dirs {
        let parent = match dir.trim_matches('/').rsplit_once('/') {
            Some((parent, _)) => root.join(parent),
            None => root.to_path_buf(),
        };
        if !roots.contains(&parent) {
            roots.push(parent);
        }
    }
    for fallback in [root.join("src"), root.to_path_buf()] {
        if !roots.contains(&fallback) {
            roots.push(fallback);
        }
    }
    roots
}

/// Byte offsets of `target` in `text` outside brackets and string literals
fn top_level_positions(text: &str, target: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth > 0 => depth -= 1,
            _ if c == target && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in top_level_positions(text, separator) {
        parts.push(&text[start..i]);
        start = i + separator.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

/// Returns true if every parameter has a default or is variadic
fn callable_without_arguments(params: &str) -> bool {
    split_top_level(params, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "/" && *p != "*")
        .all(|p| p.starts_with('*') || !top_level_positions(p, '=').is_empty())
}

/// Look up `entry_point` under `search_roots`
pub fn locate_callable(search_roots: &[PathBuf], entry_point: &EntryPoint) -> CallableLocation {
    let Some((path, source)) = module_candidates(search_roots, &entry_point.module)
        .into_iter()
        .find_map(|path| fs::read_to_string(&path).ok().map(|s| (path, s)))
    else {
        return CallableLocation::ModuleMissing;
    };

    let name = regex::escape(entry_point.import_name());
    let nested = entry_point.callable.contains('.');

    // Top-level definitions only: no indentation before the keyword
    let function = Regex::new(&format!(r"(?m)^(?:async\s+)?def\s+{}\s*\(", name));
    let other = Regex::new(&format!(r"(?m)^(?:class\s+{name}\b|{name}\s*(?::[^=\n]*)?=[^=]|from\s+\S+\s+import\s+.*\b{name}\b|import\s+.*\bas\s+{name}\b)", name = name));

    let (Ok(function), Ok(other)) = (function, other) else {
        return CallableLocation::CallableMissing { path };
    };

    if let Some(found) = function.find(&source) {
        let rest = &source[found.end()..];
        let params = match top_level_positions(rest, ')').first() {
            Some(&end) => &rest[..end],
            None => rest,
        };
        if nested || callable_without_arguments(params) {
            return CallableLocation::Found { path };
        }
        return CallableLocation::RequiresArguments {
            path,
            params: params.split_whitespace().collect::<Vec<_>>().join(" "),
        };
    }

    if other.is_match(&source) {
        return CallableLocation::Found { path };
    }

    CallableLocation::CallableMissing { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    fn main_ep() -> EntryPoint {
        EntryPoint::new(
            "mcp-feedback-collector",
            "mcp_feedback_collector.server",
            "main",
        )
    }

    #[test]
    fn test_found_in_src_layout() {
        let dir = project(&[(
            "src/mcp_feedback_collector/server.py",
            "import sys\n\ndef main():\n    return 0\n",
        )]);
        let roots = search_roots(dir.path(), &["src/mcp_feedback_collector".to_string()]);

        let location = locate_callable(&roots, &main_ep());
        assert_eq!(
            location,
            CallableLocation::Found {
                path: dir.path().join("src/mcp_feedback_collector/server.py")
            }
        );
    }

    #[test]
    fn test_found_as_package_init() {
        let dir = project(&[("pkg/__init__.py", "async def main(argv=None):\n    pass\n")]);
        let ep = EntryPoint::new("tool", "pkg", "main");
        assert!(locate_callable(&search_roots(dir.path(), &[]), &ep).is_found());
    }

    #[test]
    fn test_module_missing() {
        let dir = project(&[("src/other/mod.py", "")]);
        let roots = search_roots(dir.path(), &[]);
        assert_eq!(
            locate_callable(&roots, &main_ep()),
            CallableLocation::ModuleMissing
        );
    }

    #[test]
    fn test_callable_missing_ignores_methods() {
        let dir = project(&[(
            "src/mcp_feedback_collector/server.py",
            "class Server:\n    def main(self):\n        pass\n",
        )]);
        let roots = search_roots(dir.path(), &[]);
        assert!(matches!(
            locate_callable(&roots, &main_ep()),
            CallableLocation::CallableMissing { .. }
        ));
    }

    #[test]
    fn test_requires_arguments() {
        let dir = project(&[(
            "src/mcp_feedback_collector/server.py",
            "def main(config, *, verbose=False):\n    pass\n",
        )]);
        let roots = search_roots(dir.path(), &[]);
        assert!(matches!(
            locate_callable(&roots, &main_ep()),
            CallableLocation::RequiresArguments { ref params, .. } if params == "config, *, verbose=False"
        ));
    }

    #[test]
    fn test_assigned_callable() {
        let dir = project(&[(
            "src/mcp_feedback_collector/server.py",
            "from .app import run as main\n",
        )]);
        let roots = search_roots(dir.path(), &[]);
        assert!(locate_callable(&roots, &main_ep()).is_found());
    }

    #[test]
    fn test_callable_without_arguments() {
        assert!(callable_without_arguments(""));
        assert!(callable_without_arguments("argv=None"));
        assert!(callable_without_arguments("*args, **kwargs"));
        assert!(callable_without_arguments("*, debug: bool = False"));
        assert!(!callable_without_arguments("config"));
        assert!(!callable_without_arguments("a, b=1"));
    }

    #[test]
    fn test_subscripted_annotations() {
        assert!(callable_without_arguments("opts: Dict[str, int] = None"));
        assert!(callable_without_arguments("argv: Optional[List[str]] = None, *, env: Mapping[str, str] = {}"));
        assert!(callable_without_arguments("sep: str = \",\""));
        assert!(!callable_without_arguments("opts: Dict[str, int]"));
        assert!(!callable_without_arguments("value: Annotated[int, Field(default=1)]"));
    }

    #[test]
    fn test_parameters_spanning_calls_and_lines() {
        let dir = project(&[(
            "src/mcp_feedback_collector/server.py",
            "def main(\n    opts: Dict[str, int] = dict(),\n    hook=print(),\n) -> int:\n    return 0\n",
        )]);
        let roots = search_roots(dir.path(), &[]);
        assert!(locate_callable(&roots, &main_ep()).is_found());
    }

    #[test]
    fn test_search_roots_order() {
        let root = Path::new("/work");
        let roots = search_roots(root, &["lib/pkg".to_string(), "pkg2".to_string()]);
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/work/lib"),
                PathBuf::from("/work"),
                PathBuf::from("/work/src"),
            ]
        );
    }
}
