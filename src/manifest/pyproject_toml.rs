//! pyproject.toml parser and serializer
//!
//! Handles:
//! - build-system.requires / build-system.build-backend (PEP 517/518)
//! - project identity and metadata (PEP 621)
//! - project.dependencies and project.optional-dependencies
//! - project.scripts
//! - tool.hatch.build.targets.{wheel,sdist} file rules
//!
//! Unrecognized keys under `[project]`, unknown top-level tables and all other
//! `[tool.*]` tables are carried through untouched.

use crate::domain::{
    BuildSystem, BuildTargets, License, Person, ProjectIdentity, Readme, Requirement,
    SdistTarget, Version, WheelTarget,
};
use crate::error::DescriptorError;
use crate::manifest::{Descriptor, Passthrough};
use crate::parser::{parse_entry_point, parse_requirement, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use toml::{Table, Value};
use toml_edit::{DocumentMut, Item};

const DEFAULT_PATH: &str = "pyproject.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPyproject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_system: Option<RawBuildSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<RawProject>,
    #[serde(default, skip_serializing_if = "Table::is_empty")]
    tool: Table,
    #[serde(flatten)]
    extra: Table,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawBuildSystem {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_backend: Option<String>,
    #[serde(flatten)]
    extra: Table,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    readme: Option<RawReadme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    requires_python: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license: Option<RawLicense>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    authors: Vec<RawPerson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    classifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    optional_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    scripts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    urls: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: Table,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawReadme {
    Path(String),
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(
            default,
            rename = "content-type",
            skip_serializing_if = "Option::is_none"
        )]
        content_type: Option<String>,
    },
}

impl RawReadme {
    fn into_readme(self) -> Result<Readme, &'static str> {
        match self {
            RawReadme::Path(path) => Ok(Readme::file(path)),
            RawReadme::Table {
                file: Some(path),
                text: None,
                content_type,
            } => Ok(Readme::File { path, content_type }),
            RawReadme::Table {
                file: None,
                text: Some(text),
                content_type,
            } => Ok(Readme::Text { text, content_type }),
            RawReadme::Table { .. } => Err("expected exactly one of 'file' or 'text'"),
        }
    }

    fn from_readme(readme: &Readme) -> Self {
        match readme {
            Readme::File {
                path,
                content_type: None,
            } => RawReadme::Path(path.clone()),
            Readme::File { path, content_type } => RawReadme::Table {
                file: Some(path.clone()),
                text: None,
                content_type: content_type.clone(),
            },
            Readme::Text { text, content_type } => RawReadme::Table {
                file: None,
                text: Some(text.clone()),
                content_type: content_type.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLicense {
    Expression(String),
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawPerson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

/// Parse descriptor content, reporting errors against `pyproject.toml`
pub fn parse_descriptor(content: &str) -> Result<Descriptor, DescriptorError> {
    parse_descriptor_at(content, Path::new(DEFAULT_PATH))
}

/// Parse descriptor content, reporting errors against `path`
pub fn parse_descriptor_at(content: &str, path: &Path) -> Result<Descriptor, DescriptorError> {
    let raw: RawPyproject = toml::from_str(content)
        .map_err(|e| DescriptorError::toml_parse_error(path, e.to_string()))?;

    let invalid = |field: String, err: ParseError| DescriptorError::invalid_field(path, field, err);

    let mut passthrough = Passthrough {
        top_level: raw.extra,
        ..Passthrough::default()
    };

    let raw_build = raw.build_system.unwrap_or_default();
    passthrough.build_system = raw_build.extra;
    let build_system = BuildSystem {
        requires: raw_build
            .requires
            .iter()
            .map(|r| parse_requirement(r).map_err(|e| invalid("build-system.requires".into(), e)))
            .collect::<Result<_, _>>()?,
        backend: raw_build.build_backend,
    };

    let raw_project = raw
        .project
        .ok_or_else(|| DescriptorError::missing_field(path, "project"))?;

    let name = raw_project
        .name
        .ok_or_else(|| DescriptorError::missing_field(path, "project.name"))?;
    let version_str = raw_project
        .version
        .ok_or_else(|| DescriptorError::missing_field(path, "project.version"))?;
    let version = Version::parse(&version_str).map_err(|e| {
        invalid(
            "project.version".into(),
            ParseError::new(&version_str, e.to_string()),
        )
    })?;

    let mut project = ProjectIdentity::new(name, version);
    project.description = raw_project.description;
    project.readme = raw_project
        .readme
        .map(|readme| {
            readme
                .into_readme()
                .map_err(|message| invalid("project.readme".into(), ParseError::new("readme", message)))
        })
        .transpose()?;
    project.requires_python = raw_project.requires_python;
    project.license = raw_project.license.and_then(|license| match license {
        RawLicense::Expression(expr) => Some(License::Expression(expr)),
        RawLicense::Table {
            text: Some(text), ..
        } => Some(License::Text(text)),
        RawLicense::Table {
            file: Some(file), ..
        } => Some(License::File(file)),
        RawLicense::Table { .. } => None,
    });
    project.authors = raw_project
        .authors
        .into_iter()
        .map(|p| Person {
            name: p.name,
            email: p.email,
        })
        .collect();
    project.keywords = raw_project.keywords;
    project.classifiers = raw_project.classifiers;
    project.urls = raw_project.urls;
    passthrough.project = raw_project.extra;

    let dependencies = raw_project
        .dependencies
        .iter()
        .map(|r| parse_requirement(r).map_err(|e| invalid("project.dependencies".into(), e)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut optional_dependencies = BTreeMap::new();
    for (group, requirements) in &raw_project.optional_dependencies {
        let parsed = requirements
            .iter()
            .map(|r| {
                parse_requirement(r).map_err(|e| {
                    invalid(format!("project.optional-dependencies.{}", group), e)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        optional_dependencies.insert(group.clone(), parsed);
    }

    let scripts = raw_project
        .scripts
        .iter()
        .map(|(name, target)| {
            parse_entry_point(name, target)
                .map_err(|e| invalid(format!("project.scripts.{}", name), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut tool = raw.tool;
    let targets = take_build_targets(&mut tool);

    Ok(Descriptor {
        build_system,
        project,
        dependencies,
        optional_dependencies,
        scripts,
        targets,
        tool,
        passthrough,
    })
}

/// Render a descriptor as canonical pyproject.toml text
pub fn to_toml_string(descriptor: &Descriptor) -> Result<String, DescriptorError> {
    let raw = to_raw(descriptor);
    toml::to_string(&raw).map_err(|e| DescriptorError::SerializeError {
        message: e.to_string(),
    })
}

/// Render a descriptor canonically, keeping the comments and layout of `current`
///
/// Key order and values come from the canonical form. Comments attached to
/// tables and keys that survive are carried over, as are string arrays whose
/// items did not change.
pub fn render_descriptor(current: &str, descriptor: &Descriptor) -> Result<String, DescriptorError> {
    let canonical = to_toml_string(descriptor)?;
    let Ok(original) = current.parse::<DocumentMut>() else {
        return Ok(canonical);
    };
    let mut rendered = canonical
        .parse::<DocumentMut>()
        .map_err(|e| DescriptorError::SerializeError {
            message: e.to_string(),
        })?;

    carry_layout(original.as_table(), rendered.as_table_mut());
    rendered.set_trailing(original.trailing().clone());
    Ok(rendered.to_string())
}

fn carry_layout(from: &toml_edit::Table, to: &mut toml_edit::Table) {
    let keeps_separator = to
        .decor()
        .prefix()
        .and_then(|p| p.as_str())
        .is_some_and(|p| p.starts_with('\n'));
    let mut decor = from.decor().clone();
    if keeps_separator {
        if let Some(prefix) = decor.prefix().and_then(|p| p.as_str()) {
            if !prefix.starts_with('\n') {
                let separated = format!("\n{}", prefix);
                decor.set_prefix(separated);
            }
        }
    }
    *to.decor_mut() = decor;

    let keys: Vec<String> = to.iter().map(|(key, _)| key.to_string()).collect();
    for key in keys {
        let (Some(source_key), Some(source_item)) = (from.key(&key), from.get(&key)) else {
            continue;
        };
        if let Some(mut target_key) = to.key_mut(&key) {
            *target_key.leaf_decor_mut() = source_key.leaf_decor().clone();
        }
        let Some(target_item) = to.get_mut(&key) else {
            continue;
        };
        match (source_item, target_item) {
            (Item::Table(source), Item::Table(target)) => carry_layout(source, target),
            (Item::Value(source), Item::Value(target)) => {
                if same_string_array(source, target) {
                    *target = source.clone();
                } else {
                    *target.decor_mut() = source.decor().clone();
                }
            }
            _ => {}
        }
    }
}

fn same_string_array(a: &toml_edit::Value, b: &toml_edit::Value) -> bool {
    match (a.as_array(), b.as_array()) {
        (Some(a), Some(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|(x, y)| x.as_str().is_some() && x.as_str() == y.as_str())
        }
        _ => false,
    }
}

fn to_raw(descriptor: &Descriptor) -> RawPyproject {
    let project = &descriptor.project;
    let strings = |reqs: &[Requirement]| reqs.iter().map(|r| r.to_string()).collect::<Vec<_>>();

    let raw_project = RawProject {
        name: Some(project.name.clone()),
        version: Some(project.version.to_string()),
        description: project.description.clone(),
        readme: project.readme.as_ref().map(RawReadme::from_readme),
        requires_python: project.requires_python.clone(),
        license: project.license.as_ref().map(|license| match license {
            License::Expression(expr) => RawLicense::Expression(expr.clone()),
            License::Text(text) => RawLicense::Table {
                text: Some(text.clone()),
                file: None,
            },
            License::File(file) => RawLicense::Table {
                text: None,
                file: Some(file.clone()),
            },
        }),
        authors: project
            .authors
            .iter()
            .map(|p| RawPerson {
                name: p.name.clone(),
                email: p.email.clone(),
            })
            .collect(),
        keywords: project.keywords.clone(),
        classifiers: project.classifiers.clone(),
        dependencies: strings(&descriptor.dependencies),
        optional_dependencies: descriptor
            .optional_dependencies
            .iter()
            .map(|(group, reqs)| (group.clone(), strings(reqs)))
            .collect(),
        scripts: descriptor
            .scripts
            .iter()
            .map(|ep| (ep.name.clone(), ep.target()))
            .collect(),
        urls: project.urls.clone(),
        extra: descriptor.passthrough.project.clone(),
    };

    let build_system = &descriptor.build_system;
    let raw_build = if build_system.requires.is_empty()
        && build_system.backend.is_none()
        && descriptor.passthrough.build_system.is_empty()
    {
        None
    } else {
        Some(RawBuildSystem {
            requires: strings(&build_system.requires),
            build_backend: build_system.backend.clone(),
            extra: descriptor.passthrough.build_system.clone(),
        })
    };

    let mut tool = descriptor.tool.clone();
    put_build_targets(&mut tool, &descriptor.targets);

    RawPyproject {
        build_system: raw_build,
        project: Some(raw_project),
        tool,
        extra: descriptor.passthrough.top_level.clone(),
    }
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Walks `tool.hatch.build.targets`, returning the table if present
fn targets_table(tool: &mut Table) -> Option<&mut Table> {
    tool.get_mut("hatch")?
        .as_table_mut()?
        .get_mut("build")?
        .as_table_mut()?
        .get_mut("targets")?
        .as_table_mut()
}

/// Removes the wheel/sdist rules from `tool`, pruning tables left empty
fn take_build_targets(tool: &mut Table) -> BuildTargets {
    let mut targets = BuildTargets::default();

    if let Some(table) = targets_table(tool) {
        if let Some(Value::Table(mut wheel)) = table.remove("wheel") {
            targets.wheel = WheelTarget {
                packages: string_list(wheel.remove("packages")),
            };
            if !wheel.is_empty() {
                table.insert("wheel".to_string(), Value::Table(wheel));
            }
        }
        if let Some(Value::Table(mut sdist)) = table.remove("sdist") {
            targets.sdist = SdistTarget {
                include: string_list(sdist.remove("include")),
                exclude: string_list(sdist.remove("exclude")),
            };
            if !sdist.is_empty() {
                table.insert("sdist".to_string(), Value::Table(sdist));
            }
        }
    }

    prune_empty(tool, &["hatch", "build", "targets"]);
    targets
}

fn prune_empty(table: &mut Table, path: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let remove = match table.get_mut(*first) {
        Some(Value::Table(child)) => {
            prune_empty(child, rest);
            child.is_empty()
        }
        _ => false,
    };
    if remove {
        table.remove(*first);
    }
}

fn child_table<'a>(table: &'a mut Table, key: &str) -> &'a mut Table {
    let entry = table
        .entry(key.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    if !entry.is_table() {
        *entry = Value::Table(Table::new());
    }
    match entry {
        Value::Table(t) => t,
        _ => unreachable!("entry was just replaced with a table"),
    }
}

fn put_build_targets(tool: &mut Table, targets: &BuildTargets) {
    if targets.is_empty() {
        return;
    }
    let to_array =
        |items: &[String]| Value::Array(items.iter().cloned().map(Value::String).collect());

    let hatch = child_table(tool, "hatch");
    let build = child_table(hatch, "build");
    let table = child_table(build, "targets");

    if !targets.wheel.packages.is_empty() {
        child_table(table, "wheel").insert("packages".to_string(), to_array(&targets.wheel.packages));
    }
    if !targets.sdist.include.is_empty() {
        child_table(table, "sdist").insert("include".to_string(), to_array(&targets.sdist.include));
    }
    if !targets.sdist.exclude.is_empty() {
        child_table(table, "sdist").insert("exclude".to_string(), to_array(&targets.sdist.exclude));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryPoint;

    const FEEDBACK_COLLECTOR: &str =
        include_str!("../../tests/fixtures/feedback-collector/pyproject.toml");

    #[test]
    fn test_parse_identity() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        assert_eq!(d.project.name, "mcp-feedback-collector");
        assert_eq!(d.project.version.major(), 2);
        assert_eq!(d.project.version.minor(), 1);
        assert_eq!(d.project.version.patch(), 0);
        assert_eq!(d.project.requires_python.as_deref(), Some(">=3.8"));
        assert_eq!(d.project.license, Some(License::Text("MIT".to_string())));
        assert_eq!(d.project.authors.len(), 1);
        assert_eq!(d.project.urls.len(), 4);
        assert_eq!(d.project.readme, Some(Readme::file("README.md")));
    }

    #[test]
    fn test_parse_build_system() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        assert_eq!(d.build_system.backend.as_deref(), Some("hatchling.build"));
        assert_eq!(d.build_system.requires[0].name, "hatchling");
    }

    #[test]
    fn test_parse_dependencies() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let names: Vec<_> = d.dependencies.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["mcp", "pillow", "markdown"]);
        let pillow = &d.dependencies[1];
        assert!(pillow
            .specifiers
            .contains(&Version::parse("8.0.0").unwrap(), false));
        assert!(!pillow
            .specifiers
            .contains(&Version::parse("7.9.9").unwrap(), false));
    }

    #[test]
    fn test_parse_optional_dependencies() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let dev = d.group("dev").unwrap();
        assert_eq!(dev.len(), 4);
        assert_eq!(dev[0].to_string(), "pytest>=6.0");
        assert!(dev[1].specifiers.is_empty());
    }

    #[test]
    fn test_parse_scripts() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        assert_eq!(
            d.scripts,
            vec![EntryPoint::new(
                "mcp-feedback-collector",
                "mcp_feedback_collector.server",
                "main"
            )]
        );
    }

    #[test]
    fn test_parse_build_targets() {
        let d = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        assert_eq!(d.targets.wheel.packages, vec!["src/mcp_feedback_collector"]);
        assert_eq!(d.targets.sdist.include, vec!["/src", "/README.md", "/LICENSE"]);
        assert!(d.targets.sdist.exclude.is_empty());
        // The hatch tables are lifted out of the opaque tool section
        assert!(d.tool.get("hatch").is_none());
        assert!(d.tool.contains_key("black"));
        assert!(d.tool.contains_key("mypy"));
    }

    #[test]
    fn test_parse_missing_project() {
        let err = parse_descriptor("[build-system]\nrequires = []\n").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField { ref field, .. } if field == "project"));
    }

    #[test]
    fn test_parse_missing_version() {
        let err = parse_descriptor("[project]\nname = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("project.version"));
    }

    #[test]
    fn test_parse_invalid_version() {
        let err = parse_descriptor("[project]\nname = \"x\"\nversion = \"one\"\n").unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidField { ref field, .. } if field == "project.version"));
    }

    #[test]
    fn test_parse_invalid_requirement() {
        let content = "[project]\nname = \"x\"\nversion = \"1.0\"\ndependencies = [\"pillow>=\"]\n";
        let err = parse_descriptor(content).unwrap_err();
        assert!(err.to_string().contains("project.dependencies"));
    }

    #[test]
    fn test_parse_invalid_script() {
        let content = "[project]\nname = \"x\"\nversion = \"1.0\"\n[project.scripts]\nx = \"nocolon\"\n";
        let err = parse_descriptor(content).unwrap_err();
        assert!(err.to_string().contains("project.scripts.x"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_descriptor("not valid toml").unwrap_err();
        assert!(matches!(err, DescriptorError::TomlParseError { .. }));
    }

    #[test]
    fn test_parse_license_forms() {
        let spdx = parse_descriptor("[project]\nname = \"x\"\nversion = \"1\"\nlicense = \"MIT\"\n").unwrap();
        assert_eq!(spdx.project.license, Some(License::Expression("MIT".to_string())));

        let file = parse_descriptor(
            "[project]\nname = \"x\"\nversion = \"1\"\nlicense = {file = \"LICENSE\"}\n",
        )
        .unwrap();
        assert_eq!(file.project.license, Some(License::File("LICENSE".to_string())));
    }

    #[test]
    fn test_round_trip_preserves_dependencies_and_scripts() {
        let original = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let rendered = to_toml_string(&original).unwrap();
        let reparsed = parse_descriptor(&rendered).unwrap();

        assert_eq!(reparsed.dependencies, original.dependencies);
        assert_eq!(reparsed.optional_dependencies, original.optional_dependencies);
        assert_eq!(reparsed.scripts, original.scripts);
        assert_eq!(reparsed.targets, original.targets);
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let original = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let once = to_toml_string(&original).unwrap();
        let twice = to_toml_string(&parse_descriptor(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_round_trip_keeps_unknown_project_keys() {
        let content = r#"
[project]
name = "x"
version = "1.0"
dynamic = ["readme"]

[project.gui-scripts]
x-gui = "x.gui:main"
"#;
        let d = parse_descriptor(content).unwrap();
        assert!(d.passthrough.project.contains_key("dynamic"));
        let rendered = to_toml_string(&d).unwrap();
        assert!(rendered.contains("gui-scripts"));
        assert_eq!(parse_descriptor(&rendered).unwrap(), d);
    }

    #[test]
    fn test_round_trip_readme_file_with_content_type() {
        let content = "[project]\nname = \"x\"\nversion = \"1.0\"\nreadme = {file = \"README.txt\", content-type = \"text/markdown\"}\n";
        let d = parse_descriptor(content).unwrap();
        assert_eq!(
            d.project.readme,
            Some(Readme::File {
                path: "README.txt".to_string(),
                content_type: Some("text/markdown".to_string()),
            })
        );

        let reparsed = parse_descriptor(&to_toml_string(&d).unwrap()).unwrap();
        assert_eq!(reparsed.project.readme, d.project.readme);
    }

    #[test]
    fn test_round_trip_inline_readme() {
        let content = "[project]\nname = \"x\"\nversion = \"1.0\"\nreadme = {text = \"Inline long description\", content-type = \"text/plain\"}\n";
        let d = parse_descriptor(content).unwrap();
        assert_eq!(
            d.project.readme,
            Some(Readme::Text {
                text: "Inline long description".to_string(),
                content_type: Some("text/plain".to_string()),
            })
        );

        let rendered = to_toml_string(&d).unwrap();
        assert!(rendered.contains("Inline long description"));
        assert_eq!(parse_descriptor(&rendered).unwrap().project.readme, d.project.readme);
    }

    #[test]
    fn test_readme_table_needs_file_or_text() {
        let content = "[project]\nname = \"x\"\nversion = \"1.0\"\nreadme = {content-type = \"text/plain\"}\n";
        let err = parse_descriptor(content).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidField { ref field, .. } if field == "project.readme"));
    }

    #[test]
    fn test_render_keeps_comments() {
        let content = "# keep me\n[project]\n# the distribution name\nname = \"x\"\nversion = \"1.0\"  # bumped by release\ndependencies = [\n    \"mcp>=1.0.0\",  # protocol\n]\n";
        let d = parse_descriptor(content).unwrap();
        let rendered = render_descriptor(content, &d).unwrap();

        assert!(rendered.contains("# keep me"));
        assert!(rendered.contains("# the distribution name"));
        assert!(rendered.contains("# bumped by release"));
        assert!(rendered.contains("# protocol"));
        assert_eq!(parse_descriptor(&rendered).unwrap(), d);
    }

    #[test]
    fn test_render_is_idempotent_with_comments() {
        let content = format!("# project descriptor\n{}", FEEDBACK_COLLECTOR);
        let d = parse_descriptor(&content).unwrap();
        let once = render_descriptor(&content, &d).unwrap();
        let twice = render_descriptor(&once, &parse_descriptor(&once).unwrap()).unwrap();

        assert!(once.contains("# project descriptor"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_render_still_canonicalizes_values() {
        let content = "[project]\nversion = \"1.0\"\nname = \"x\"\ndependencies = [\"mcp >= 1.0.0\"]  # runtime\n";
        let d = parse_descriptor(content).unwrap();
        let rendered = render_descriptor(content, &d).unwrap();

        assert!(rendered.contains("\"mcp>=1.0.0\""));
        assert!(rendered.contains("# runtime"));
        assert!(rendered.find("name").unwrap() < rendered.find("version").unwrap());
    }

    #[test]
    fn test_round_trip_keeps_unknown_hatch_settings() {
        let content = r#"
[project]
name = "x"
version = "1.0"

[tool.hatch.build.targets.wheel]
packages = ["src/x"]
only-include = ["src/x"]

[tool.hatch.version]
path = "src/x/__init__.py"
"#;
        let d = parse_descriptor(content).unwrap();
        assert_eq!(d.targets.wheel.packages, vec!["src/x"]);
        let rendered = to_toml_string(&d).unwrap();
        assert!(rendered.contains("only-include"));
        assert!(rendered.contains("[tool.hatch.version]"));
        assert_eq!(parse_descriptor(&rendered).unwrap(), d);
    }
}
