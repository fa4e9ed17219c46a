//! The parsed package descriptor

use crate::domain::{BuildSystem, BuildTargets, EntryPoint, ProjectIdentity, Requirement};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything pyproject.toml declares about how a project is built, what it
/// depends on and how it is invoked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub build_system: BuildSystem,
    pub project: ProjectIdentity,
    /// Mandatory runtime dependencies, in declaration order
    pub dependencies: Vec<Requirement>,
    /// Optional dependency groups keyed by group name
    pub optional_dependencies: BTreeMap<String, Vec<Requirement>>,
    /// Console scripts, ordered by command name
    pub scripts: Vec<EntryPoint>,
    /// Wheel/sdist file rules
    pub targets: BuildTargets,
    /// Remaining `[tool.*]` tables, kept verbatim
    #[serde(skip)]
    pub tool: toml::Table,
    /// Keys outside the model, written back unchanged
    #[serde(skip)]
    pub passthrough: Passthrough,
}

/// Keys the descriptor model does not interpret
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Passthrough {
    /// Unknown top-level tables
    pub top_level: toml::Table,
    /// Unknown `[build-system]` keys
    pub build_system: toml::Table,
    /// Unknown `[project]` keys (`maintainers`, `gui-scripts`, `dynamic`, ...)
    pub project: toml::Table,
}

impl Descriptor {
    /// Names of the optional dependency groups
    pub fn group_names(&self) -> Vec<&str> {
        self.optional_dependencies.keys().map(String::as_str).collect()
    }

    /// Requirements of one optional group
    pub fn group(&self, name: &str) -> Option<&[Requirement]> {
        self.optional_dependencies.get(name).map(Vec::as_slice)
    }

    /// Finds a console script by command name
    pub fn script(&self, name: &str) -> Option<&EntryPoint> {
        self.scripts.iter().find(|ep| ep.name == name)
    }

    /// Runtime requirements followed by the requirements of `groups`, each tagged
    /// with the partition it came from (`None` for runtime)
    pub fn requirements_for<'a>(
        &'a self,
        groups: &'a [String],
    ) -> impl Iterator<Item = (Option<&'a str>, &'a Requirement)> + 'a {
        let runtime = self.dependencies.iter().map(|r| (None, r));
        let optional = groups.iter().flat_map(move |group| {
            self.optional_dependencies
                .get(group)
                .into_iter()
                .flatten()
                .map(move |r| (Some(group.as_str()), r))
        });
        runtime.chain(optional)
    }
}
