//! Dependency resolution against a package index
//!
//! This module provides:
//! - Requirement collection: runtime dependencies plus selected optional groups
//! - Merging of requirements that name the same package
//! - Parallel index queries bounded by a semaphore
//! - Release selection (highest satisfying, yanked/pre-release/min-age aware)
//!
//! Only the declared requirements are resolved; environment markers are
//! carried along verbatim and never evaluated.

mod options;

pub use options::{ResolveOptions, DEFAULT_CONCURRENCY};

use crate::domain::{normalize_name, Operator, Requirement, SpecifierSet, Version};
use crate::error::{ResolveError, Unsatisfied, UnsatisfiedReason};
use crate::manifest::Descriptor;
use crate::progress::Progress;
use crate::registry::{PackageIndex, Release};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// All requirements on one package, merged across partitions
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRequirement {
    /// Name as first declared
    pub name: String,
    /// Intersection of every declared specifier set
    pub specifiers: SpecifierSet,
    /// Declared in the runtime dependencies
    pub runtime: bool,
    /// Optional groups declaring it
    pub groups: Vec<String>,
    /// Environment markers, unevaluated
    pub markers: Vec<String>,
}

impl MergedRequirement {
    fn from_requirement(requirement: &Requirement) -> Self {
        Self {
            name: requirement.name.clone(),
            specifiers: SpecifierSet::any(),
            runtime: false,
            groups: Vec::new(),
            markers: Vec::new(),
        }
    }

    fn add(&mut self, group: Option<&str>, requirement: &Requirement) {
        self.specifiers.extend(&requirement.specifiers);
        match group {
            None => self.runtime = true,
            Some(group) => {
                if !self.groups.iter().any(|g| g == group) {
                    self.groups.push(group.to_string());
                }
            }
        }
        if let Some(ref marker) = requirement.marker {
            if !self.markers.contains(marker) {
                self.markers.push(marker.clone());
            }
        }
    }
}

/// Requirements to resolve, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementSet {
    /// Index-resolved requirements, one per normalized name
    pub packages: Vec<MergedRequirement>,
    /// `name @ url` requirements, which bypass the index
    pub direct: Vec<Requirement>,
}

/// Collect and merge the requirements selected by `groups`
pub fn collect_requirements(
    descriptor: &Descriptor,
    groups: &[String],
) -> Result<RequirementSet, ResolveError> {
    for group in groups {
        if descriptor.group(group).is_none() {
            let available = descriptor.group_names();
            return Err(ResolveError::UnknownGroup {
                group: group.clone(),
                available: if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                },
            });
        }
    }

    let mut set = RequirementSet::default();
    let mut keys: Vec<String> = Vec::new();

    for (group, requirement) in descriptor.requirements_for(groups) {
        if requirement.url.is_some() {
            if !set.direct.iter().any(|r| r.same_package(requirement)) {
                set.direct.push(requirement.clone());
            }
            continue;
        }

        let key = requirement.normalized_name();
        let position = match keys.iter().position(|k| *k == key) {
            Some(position) => position,
            None => {
                keys.push(key);
                set.packages
                    .push(MergedRequirement::from_requirement(requirement));
                set.packages.len() - 1
            }
        };
        set.packages[position].add(group, requirement);
    }

    Ok(set)
}

/// Returns true if the set pins an exact version
fn is_pinned(specifiers: &SpecifierSet) -> bool {
    specifiers.iter().any(|s| {
        matches!(s.operator, Operator::Equal | Operator::ArbitraryEqual) && !s.wildcard
    })
}

/// Pick the highest eligible release satisfying `specifiers`
///
/// Yanked releases are only eligible when the set pins an exact version.
/// With a `cutoff`, releases published after it (or with no known date) are
/// skipped.
pub fn select_release<'a>(
    releases: &'a [Release],
    specifiers: &SpecifierSet,
    allow_prerelease: bool,
    cutoff: Option<DateTime<Utc>>,
) -> Option<&'a Release> {
    let pinned = is_pinned(specifiers);
    releases
        .iter()
        .filter(|r| !r.yanked || pinned)
        .filter(|r| cutoff.map_or(true, |cutoff| r.released_before(cutoff)))
        .filter(|r| specifiers.contains(&r.version, allow_prerelease))
        .max()
}

/// A package pinned to a concrete release
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    /// Merged constraint the version was chosen against
    pub specifiers: SpecifierSet,
    pub runtime: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
}

/// A concrete environment for the selected requirements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Resolved packages in declaration order
    pub packages: Vec<ResolvedPackage>,
    /// Direct references, installed from their URL as-is
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub direct: Vec<Requirement>,
}

impl Resolution {
    /// Find a resolved package by (normalized) name
    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        let key = normalize_name(name);
        self.packages.iter().find(|p| normalize_name(&p.name) == key)
    }

    pub fn len(&self) -> usize {
        self.packages.len() + self.direct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves descriptor requirements against a package index
pub struct Resolver {
    index: Arc<dyn PackageIndex>,
    options: ResolveOptions,
    /// Current time for age calculations
    now: DateTime<Utc>,
}

impl Resolver {
    pub fn new(index: Arc<dyn PackageIndex>, options: ResolveOptions) -> Self {
        Self::with_time(index, options, Utc::now())
    }

    /// Create a resolver with a fixed current time (for testing)
    pub fn with_time(
        index: Arc<dyn PackageIndex>,
        options: ResolveOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            options,
            now,
        }
    }

    fn cutoff(&self) -> Option<DateTime<Utc>> {
        let min_age = self.options.min_age?;
        let age = chrono::Duration::from_std(min_age).unwrap_or(chrono::Duration::MAX);
        Some(self.now.checked_sub_signed(age).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Resolve without progress display
    pub async fn resolve(&self, descriptor: &Descriptor) -> Result<Resolution, ResolveError> {
        self.resolve_with_progress(descriptor, &mut Progress::disabled())
            .await
    }

    /// Resolve every selected requirement, or report all that cannot be satisfied
    pub async fn resolve_with_progress(
        &self,
        descriptor: &Descriptor,
        progress: &mut Progress,
    ) -> Result<Resolution, ResolveError> {
        let set = collect_requirements(descriptor, &self.options.groups)?;
        debug!(
            packages = set.packages.len(),
            direct = set.direct.len(),
            index = self.index.name(),
            "resolving requirements"
        );

        progress.start(set.packages.len() as u64, "Fetching releases");
        let fetched = self.fetch_all(&set.packages, progress).await;
        progress.finish_and_clear();
        let cutoff = self.cutoff();

        let mut packages = Vec::with_capacity(set.packages.len());
        let mut unsatisfied = Vec::new();

        for (requirement, result) in set.packages.into_iter().zip(fetched) {
            let releases = match result {
                Ok(releases) => releases,
                Err(message) => {
                    unsatisfied.push(Unsatisfied {
                        package: requirement.name,
                        specifiers: requirement.specifiers,
                        reason: UnsatisfiedReason::IndexFailure(message),
                    });
                    continue;
                }
            };

            match select_release(
                &releases,
                &requirement.specifiers,
                self.options.allow_prerelease,
                cutoff,
            ) {
                Some(release) => {
                    debug!(package = %requirement.name, version = %release.version, "selected");
                    packages.push(ResolvedPackage {
                        name: requirement.name,
                        version: release.version.clone(),
                        released_at: release.released_at,
                        specifiers: requirement.specifiers,
                        runtime: requirement.runtime,
                        groups: requirement.groups,
                        markers: requirement.markers,
                    });
                }
                None => unsatisfied.push(Unsatisfied {
                    package: requirement.name,
                    specifiers: requirement.specifiers,
                    reason: UnsatisfiedReason::NoMatchingVersion {
                        available: releases.into_iter().map(|r| r.version).collect(),
                    },
                }),
            }
        }

        if !unsatisfied.is_empty() {
            return Err(ResolveError::Unsatisfiable { unsatisfied });
        }

        Ok(Resolution {
            packages,
            direct: set.direct,
        })
    }

    /// Query the index for every package, one task each
    async fn fetch_all(
        &self,
        packages: &[MergedRequirement],
        progress: &Progress,
    ) -> Vec<Result<Vec<Release>, String>> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut tasks = JoinSet::new();

        for (position, requirement) in packages.iter().enumerate() {
            let index = Arc::clone(&self.index);
            let semaphore = Arc::clone(&semaphore);
            let name = requirement.name.clone();
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => index
                        .fetch_releases(&name)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (position, result)
            });
        }

        let mut results: Vec<Option<Result<Vec<Release>, String>>> =
            (0..packages.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => {
                    if let Some(requirement) = packages.get(position) {
                        progress.fetched(&requirement.name);
                    }
                    results[position] = Some(result);
                }
                Err(e) => warn!(error = %e, "index query task failed"),
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err("index query did not complete".to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::manifest::parse_descriptor;
    use crate::parser::parse_specifiers;
    use crate::registry::LocalIndex;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    const FIXTURE: &str = include_str!("../../tests/fixtures/feedback-collector/pyproject.toml");

    const INDEX: &str = r#"{
        "mcp": [
            {"version": "1.0.0", "released_at": "2024-11-01T00:00:00Z"},
            {"version": "1.1.0", "released_at": "2024-12-01T00:00:00Z"},
            {"version": "1.2.0", "released_at": "2024-12-30T00:00:00Z"},
            {"version": "2.0.0b1", "released_at": "2024-12-31T00:00:00Z"}
        ],
        "pillow": [
            {"version": "10.4.0", "released_at": "2024-07-01T00:00:00Z"},
            {"version": "11.0.0", "released_at": "2024-10-15T00:00:00Z", "yanked": true}
        ],
        "markdown": ["3.7"],
        "pytest": ["8.3.4"],
        "black": ["24.10.0"],
        "isort": ["5.13.2"],
        "mypy": ["1.14.0"]
    }"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn resolver(options: ResolveOptions) -> Resolver {
        let index = LocalIndex::from_json(INDEX).unwrap();
        Resolver::with_time(Arc::new(index), options, now())
    }

    fn releases(versions: &[&str]) -> Vec<Release> {
        versions
            .iter()
            .map(|v| Release::new(Version::parse(v).unwrap(), None))
            .collect()
    }

    struct FailingIndex;

    #[async_trait]
    impl PackageIndex for FailingIndex {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_releases(&self, package: &str) -> Result<Vec<Release>, RegistryError> {
            Err(RegistryError::network_error(package, "failing", "connection refused"))
        }
    }

    #[test]
    fn test_collect_default_excludes_dev() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let set = collect_requirements(&descriptor, &[]).unwrap();
        let names: Vec<_> = set.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mcp", "pillow", "markdown"]);
        assert!(set.packages.iter().all(|p| p.runtime && p.groups.is_empty()));
    }

    #[test]
    fn test_collect_unknown_group() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let err = collect_requirements(&descriptor, &["docs".to_string()]).unwrap_err();
        match err {
            ResolveError::UnknownGroup { group, available } => {
                assert_eq!(group, "docs");
                assert_eq!(available, "dev");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_collect_merges_same_package() {
        let descriptor = parse_descriptor(
            r#"
[project]
name = "demo"
version = "1.0.0"
dependencies = ["mcp>=1.0.0", "extra-tool @ https://example.com/extra_tool-1.0.whl"]

[project.optional-dependencies]
dev = ["MCP<1.2; python_version >= '3.9'"]
"#,
        )
        .unwrap();

        let set = collect_requirements(&descriptor, &["dev".to_string()]).unwrap();
        assert_eq!(set.packages.len(), 1);
        let mcp = &set.packages[0];
        assert_eq!(mcp.name, "mcp");
        assert_eq!(mcp.specifiers.to_string(), ">=1.0.0,<1.2");
        assert!(mcp.runtime);
        assert_eq!(mcp.groups, vec!["dev"]);
        assert_eq!(mcp.markers, vec!["python_version >= '3.9'"]);
        assert_eq!(set.direct.len(), 1);
    }

    #[test]
    fn test_select_highest_matching() {
        let releases = releases(&["1.0.0", "1.5.0", "2.0.0"]);
        let specifiers = parse_specifiers(">=1.0,<2").unwrap();
        let selected = select_release(&releases, &specifiers, false, None).unwrap();
        assert_eq!(selected.version.to_string(), "1.5.0");
    }

    #[test]
    fn test_select_skips_prerelease_unless_allowed() {
        let releases = releases(&["1.0.0", "2.0.0rc1"]);
        let any = SpecifierSet::any();
        assert_eq!(
            select_release(&releases, &any, false, None).unwrap().version.to_string(),
            "1.0.0"
        );
        assert_eq!(
            select_release(&releases, &any, true, None).unwrap().version.to_string(),
            "2.0.0rc1"
        );

        let named = parse_specifiers(">=2.0.0rc1").unwrap();
        assert_eq!(
            select_release(&releases, &named, false, None).unwrap().version.to_string(),
            "2.0.0rc1"
        );
    }

    #[test]
    fn test_select_yanked_only_when_pinned() {
        let releases = vec![
            Release::new(Version::parse("1.0.0").unwrap(), None),
            Release::new(Version::parse("1.1.0").unwrap(), None).with_yanked(true),
        ];
        let open = parse_specifiers(">=1.0").unwrap();
        assert_eq!(
            select_release(&releases, &open, false, None).unwrap().version.to_string(),
            "1.0.0"
        );

        let pinned = parse_specifiers("==1.1.0").unwrap();
        assert_eq!(
            select_release(&releases, &pinned, false, None).unwrap().version.to_string(),
            "1.1.0"
        );
    }

    #[test]
    fn test_select_nothing_matches() {
        let releases = releases(&["1.0.0"]);
        let specifiers = parse_specifiers(">=2").unwrap();
        assert!(select_release(&releases, &specifiers, false, None).is_none());
    }

    #[tokio::test]
    async fn test_resolve_runtime_dependencies() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let resolution = resolver(ResolveOptions::new())
            .resolve(&descriptor)
            .await
            .unwrap();

        assert_eq!(resolution.packages.len(), 3);
        assert_eq!(resolution.get("mcp").unwrap().version.to_string(), "1.2.0");
        assert_eq!(resolution.get("pillow").unwrap().version.to_string(), "10.4.0");
        assert_eq!(resolution.get("Markdown").unwrap().version.to_string(), "3.7");
        assert!(resolution.get("pytest").is_none());
    }

    #[tokio::test]
    async fn test_resolve_with_dev_group() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let options = ResolveOptions::new().with_groups(vec!["dev".to_string()]);
        let resolution = resolver(options).resolve(&descriptor).await.unwrap();

        assert_eq!(resolution.packages.len(), 7);
        let pytest = resolution.get("pytest").unwrap();
        assert!(!pytest.runtime);
        assert_eq!(pytest.groups, vec!["dev"]);
    }

    #[tokio::test]
    async fn test_resolve_prerelease_flag() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let options = ResolveOptions::new().with_prerelease(true);
        let resolution = resolver(options).resolve(&descriptor).await.unwrap();
        assert_eq!(resolution.get("mcp").unwrap().version.to_string(), "2.0.0b1");
    }

    #[tokio::test]
    async fn test_resolve_min_age() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let options = ResolveOptions::new().with_min_age(Duration::from_secs(14 * 86400));
        let err = resolver(options).resolve(&descriptor).await.unwrap_err();

        // markdown has no release dates, so nothing is old enough
        match err {
            ResolveError::Unsatisfiable { unsatisfied } => {
                let names: Vec<_> = unsatisfied.iter().map(|u| u.package.as_str()).collect();
                assert_eq!(names, vec!["markdown"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_min_age_picks_older_release() {
        let descriptor = parse_descriptor(
            r#"
[project]
name = "demo"
version = "1.0.0"
dependencies = ["mcp>=1.0.0"]
"#,
        )
        .unwrap();
        let options = ResolveOptions::new().with_min_age(Duration::from_secs(14 * 86400));
        let resolution = resolver(options).resolve(&descriptor).await.unwrap();
        assert_eq!(resolution.get("mcp").unwrap().version.to_string(), "1.1.0");
    }

    #[tokio::test]
    async fn test_resolve_reports_every_unsatisfied_package() {
        let descriptor = parse_descriptor(
            r#"
[project]
name = "demo"
version = "1.0.0"
dependencies = ["mcp>=5", "pillow>=99", "markdown>=3", "ghost"]
"#,
        )
        .unwrap();

        let err = resolver(ResolveOptions::new())
            .resolve(&descriptor)
            .await
            .unwrap_err();
        match err {
            ResolveError::Unsatisfiable { unsatisfied } => {
                let names: Vec<_> = unsatisfied.iter().map(|u| u.package.as_str()).collect();
                assert_eq!(names, vec!["mcp", "pillow", "ghost"]);
                assert!(matches!(
                    unsatisfied[2].reason,
                    UnsatisfiedReason::IndexFailure(_)
                ));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_index_failure_per_package() {
        let descriptor = parse_descriptor(FIXTURE).unwrap();
        let resolver = Resolver::with_time(Arc::new(FailingIndex), ResolveOptions::new(), now());
        let err = resolver.resolve(&descriptor).await.unwrap_err();

        match err {
            ResolveError::Unsatisfiable { unsatisfied } => {
                assert_eq!(unsatisfied.len(), 3);
                assert!(unsatisfied[0].to_string().contains("connection refused"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_direct_references_skip_index() {
        let descriptor = parse_descriptor(
            r#"
[project]
name = "demo"
version = "1.0.0"
dependencies = ["extra-tool @ https://example.com/extra_tool-1.0.whl"]
"#,
        )
        .unwrap();

        let resolver = Resolver::with_time(Arc::new(FailingIndex), ResolveOptions::new(), now());
        let resolution = resolver.resolve(&descriptor).await.unwrap();
        assert!(resolution.packages.is_empty());
        assert_eq!(resolution.direct.len(), 1);
        assert_eq!(resolution.len(), 1);
    }
}
