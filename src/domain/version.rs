//! Release versions as used by Python package indexes
//!
//! Handles version formats:
//! - Release segments: `1`, `2.1`, `2.1.0`, `1!2.0` (with epoch)
//! - Pre-releases: `1.0a1`, `1.0b2`, `1.0rc1` (and `alpha`/`beta`/`c`/`pre` spellings)
//! - Post-releases: `1.0.post1`, `1.0-1`
//! - Development releases: `1.0.dev3`
//! - Local labels: `1.0+ubuntu.1`
//!
//! Versions are totally ordered: `1.0.dev1 < 1.0a1 < 1.0rc1 < 1.0 < 1.0.post1`,
//! and trailing zero segments are insignificant (`1.0 == 1.0.0`).

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|rc|c)[-_.]?(?P<pre_n>\d+)?)?
        (?:-(?P<post_n1>\d+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>\d+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>\d+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        $",
    )
    .unwrap()
});

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Rc,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PreRelease::Alpha => "a",
            PreRelease::Beta => "b",
            PreRelease::Rc => "rc",
        }
    }
}

/// Error returned when a version string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{value}'")]
pub struct InvalidVersion {
    pub value: String,
}

/// A parsed release version
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

impl Version {
    /// Creates a final release from its numeric segments
    pub fn from_release(release: impl Into<Vec<u64>>) -> Self {
        let mut release = release.into();
        if release.is_empty() {
            release.push(0);
        }
        Self {
            epoch: 0,
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Parse a version string
    pub fn parse(value: &str) -> Result<Self, InvalidVersion> {
        let trimmed = value.trim();
        let invalid = || InvalidVersion {
            value: value.to_string(),
        };
        let caps = VERSION_RE.captures(trimmed).ok_or_else(invalid)?;

        let number = |name: &str| -> Result<Option<u64>, InvalidVersion> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
                .transpose()
        };

        let release = caps["release"]
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some((
                PreRelease::from_label(label.as_str()),
                number("pre_n")?.unwrap_or(0),
            )),
            None => None,
        };

        let post = if let Some(n) = number("post_n1")? {
            Some(n)
        } else if caps.name("post_l").is_some() {
            Some(number("post_n2")?.unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        Ok(Self {
            epoch: number("epoch")?.unwrap_or(0),
            release,
            pre,
            post,
            dev,
            local: caps
                .name("local")
                .map(|m| m.as_str().to_ascii_lowercase().replace(['-', '_'], ".")),
        })
    }

    /// Release segments as written
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// First release segment
    pub fn major(&self) -> u64 {
        self.segment(0)
    }

    /// Second release segment (0 when absent)
    pub fn minor(&self) -> u64 {
        self.segment(1)
    }

    /// Third release segment (0 when absent)
    pub fn patch(&self) -> u64 {
        self.segment(2)
    }

    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// Returns true for pre-releases and development releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// The same version without its local label
    pub fn public(&self) -> Version {
        Version {
            local: None,
            ..self.clone()
        }
    }

    /// The final release this version belongs to (`1.2rc1` -> `1.2`)
    pub fn base(&self) -> Version {
        Version {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Returns true if the release segments start with `prefix`, padding with zeros
    pub fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, segment)| self.segment(i) == *segment)
    }

    /// The smallest release strictly above every release sharing `prefix`
    /// (`[1, 4]` -> `1.5`)
    pub fn bump_prefix(epoch: u64, prefix: &[u64]) -> Version {
        let mut release = prefix.to_vec();
        if let Some(last) = release.last_mut() {
            *last += 1;
        }
        Version {
            epoch,
            ..Version::from_release(release)
        }
    }

    /// Strict `MAJOR.MINOR.PATCH` interpretation, if the version has one
    pub fn to_semver(&self) -> Option<semver::Version> {
        if self.epoch != 0 || self.local.is_some() || self.release.len() != 3 {
            return None;
        }
        if self.post.is_some() {
            return None;
        }
        let mut version = semver::Version::new(self.major(), self.minor(), self.patch());
        let pre = match (self.pre, self.dev) {
            (None, None) => None,
            (Some((kind, n)), None) => Some(format!("{}.{}", kind.label(), n)),
            (None, Some(n)) => Some(format!("dev.{}", n)),
            (Some((kind, n)), Some(d)) => Some(format!("{}.{}.dev.{}", kind.label(), n, d)),
        };
        if let Some(pre) = pre {
            version.pre = semver::Prerelease::new(&pre).ok()?;
        }
        Some(version)
    }

    fn trimmed_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|segment| *segment != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }

    fn sort_key(&self) -> (u64, &[u64], PreKey, Option<u64>, DevKey) {
        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((kind, n)), _, _) => PreKey::Pre(kind, n),
            _ => PreKey::Final,
        };
        let dev = match self.dev {
            Some(n) => DevKey::Dev(n),
            None => DevKey::Released,
        };
        (self.epoch, self.trimmed_release(), pre, self.post, dev)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Released,
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| compare_local(self.local.as_deref(), other.local.as_deref()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Local labels compare segment-wise; numeric segments sort above alphanumeric ones
fn compare_local(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let mut left = a.split('.');
            let mut right = b.split('.');
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(x), Some(y)) => {
                        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                            (Ok(x), Ok(y)) => x.cmp(&y),
                            (Ok(_), Err(_)) => Ordering::Greater,
                            (Err(_), Ok(_)) => Ordering::Less,
                            (Err(_), Err(_)) => x.cmp(y),
                        };
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{}", kind.label(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_semantic_version() {
        let version = v("2.1.0");
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 1);
        assert_eq!(version.patch(), 0);
        assert!(!version.is_prerelease());
    }

    #[test]
    fn test_parse_short_release() {
        let version = v("6.0");
        assert_eq!(version.release(), &[6, 0]);
        assert_eq!(version.patch(), 0);
    }

    #[test]
    fn test_parse_full_form() {
        let version = v("1!2.0rc1.post2.dev3+local.7");
        assert_eq!(version.epoch(), 1);
        assert!(version.is_prerelease());
        assert!(version.is_postrelease());
        assert_eq!(version.local(), Some("local.7"));
        assert_eq!(version.to_string(), "1!2.0rc1.post2.dev3+local.7");
    }

    #[test]
    fn test_parse_normalizes_spellings() {
        assert_eq!(v("1.0-alpha.1").to_string(), "1.0a1");
        assert_eq!(v("1.0c2").to_string(), "1.0rc2");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("v1.2").to_string(), "1.2");
        assert_eq!(v("1.0.dev").to_string(), "1.0.dev0");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("latest").is_err());
        assert!(Version::parse("1.0.x").is_err());
        assert!(Version::parse("1..0").is_err());
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("8"), v("8.0.0"));
        assert_ne!(v("1.0.1"), v("1.0"));
    }

    #[test]
    fn test_total_order() {
        let ordered = [
            "0.9", "1.0.dev1", "1.0a1", "1.0a2.dev1", "1.0a2", "1.0b1", "1.0rc1", "1.0",
            "1.0+local", "1.0.post1.dev1", "1.0.post1", "1.1", "2.0", "1!0.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_upgrade_comparison() {
        assert!(v("7.9.9") < v("8.0.0"));
        assert!(v("10.0.0") > v("9.5.1"));
    }

    #[test]
    fn test_release_starts_with() {
        assert!(v("1.4.5").release_starts_with(&[1, 4]));
        assert!(v("1").release_starts_with(&[1, 0]));
        assert!(!v("1.5").release_starts_with(&[1, 4]));
    }

    #[test]
    fn test_bump_prefix() {
        assert_eq!(Version::bump_prefix(0, &[1, 4]), v("1.5"));
        assert_eq!(Version::bump_prefix(0, &[2]), v("3"));
    }

    #[test]
    fn test_to_semver() {
        assert_eq!(v("2.1.0").to_semver(), Some(semver::Version::new(2, 1, 0)));
        assert!(v("2.1").to_semver().is_none());
        assert!(v("2.1.0.post1").to_semver().is_none());
        let pre = v("2.1.0rc1").to_semver().unwrap();
        assert_eq!(pre.pre.as_str(), "rc.1");
    }

    #[test]
    fn test_base_and_public() {
        let version = v("1.2rc1+abc");
        assert_eq!(version.base(), v("1.2"));
        assert_eq!(version.public().local(), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.0.0b2")).unwrap();
        assert_eq!(json, "\"1.0.0b2\"");
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v("1.0.0b2"));
    }
}
