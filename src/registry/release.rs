//! A published release of a package
//!
//! This module provides the Release struct that represents a parsed
//! version as listed by a package index, with its upload time.

use crate::domain::Version;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// One version of a package as listed by an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub version: Version,
    /// Earliest upload time of the release files, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    /// Withdrawn by the publisher; only selected when pinned with `==`
    pub yanked: bool,
}

impl Release {
    pub fn new(version: Version, released_at: Option<DateTime<Utc>>) -> Self {
        Self {
            version,
            released_at,
            yanked: false,
        }
    }

    pub fn with_yanked(mut self, yanked: bool) -> Self {
        self.yanked = yanked;
        self
    }

    /// Returns true if the release is known to predate `cutoff`
    pub fn released_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.released_at.is_some_and(|at| at <= cutoff)
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.released_at.cmp(&other.released_at))
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_release_new() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let release = Release::new(v("1.2.3"), Some(date));
        assert_eq!(release.version, v("1.2.3"));
        assert_eq!(release.released_at, Some(date));
        assert!(!release.yanked);
        assert!(release.with_yanked(true).yanked);
    }

    #[test]
    fn test_release_ordering_uses_version_order() {
        let mut releases = vec![
            Release::new(v("1.10.0"), None),
            Release::new(v("1.2.0"), None),
            Release::new(v("1.10.0rc1"), None),
        ];
        releases.sort();
        let versions: Vec<String> = releases.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, vec!["1.2.0", "1.10.0rc1", "1.10.0"]);
    }

    #[test]
    fn test_released_before() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let old = Release::new(v("1.0"), Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let new = Release::new(v("2.0"), Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
        let unknown = Release::new(v("3.0"), None);

        assert!(old.released_before(cutoff));
        assert!(!new.released_before(cutoff));
        assert!(!unknown.released_before(cutoff));
    }
}
