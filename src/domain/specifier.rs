//! Version specifiers and specifier sets
//!
//! Handles constraint formats:
//! - Comparison: `>=8.0.0`, `>1.0`, `<=2.0`, `<3`
//! - Exact: `==1.2.3`, prefix match `==1.2.*`, exclusion `!=1.3.*`
//! - Compatible release: `~=2.2` (`>=2.2, ==2.*`)
//! - Arbitrary equality: `===foobar`
//! - Sets: `>=1.0,<2.0` (all members must match)

use super::version::Version;
use serde::{Serialize, Serializer};
use std::fmt;

/// Comparison operator of a single specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Compatible,
    Equal,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
    Less,
    Greater,
    ArbitraryEqual,
}

impl Operator {
    /// All operators, longest token first so prefix matching is unambiguous
    pub const ALL: [Operator; 8] = [
        Operator::ArbitraryEqual,
        Operator::Compatible,
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessOrEqual,
        Operator::GreaterOrEqual,
        Operator::Less,
        Operator::Greater,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::ArbitraryEqual => "===",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `operator version` constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub operator: Operator,
    /// Version operand; `None` only for `===` with a non-version operand
    pub version: Option<Version>,
    /// Raw operand as written (needed for `===` and display)
    pub operand: String,
    /// True for `==X.*` / `!=X.*`
    pub wildcard: bool,
}

impl Specifier {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self {
            operator,
            operand: version.to_string(),
            version: Some(version),
            wildcard: false,
        }
    }

    /// Returns true if `candidate` satisfies this specifier
    pub fn contains(&self, candidate: &Version) -> bool {
        let Some(ref version) = self.version else {
            return self.operand == candidate.to_string();
        };

        match self.operator {
            Operator::Equal if self.wildcard => {
                candidate.epoch() == version.epoch()
                    && candidate.release_starts_with(version.release())
            }
            Operator::NotEqual if self.wildcard => {
                !(candidate.epoch() == version.epoch()
                    && candidate.release_starts_with(version.release()))
            }
            Operator::Equal => {
                if version.local().is_some() {
                    candidate == version
                } else {
                    candidate.public() == *version
                }
            }
            Operator::NotEqual => {
                if version.local().is_some() {
                    candidate != version
                } else {
                    candidate.public() != *version
                }
            }
            Operator::GreaterOrEqual => candidate >= version,
            Operator::LessOrEqual => candidate.public() <= *version,
            Operator::Greater => {
                candidate > version
                    && !(candidate.is_postrelease()
                        && !version.is_postrelease()
                        && candidate.base() == version.base())
                    && !(candidate.local().is_some() && candidate.public() == *version)
            }
            Operator::Less => {
                candidate < version
                    && !(!version.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base() == version.base())
            }
            Operator::Compatible => {
                let release = version.release();
                let prefix = &release[..release.len().saturating_sub(1).max(1)];
                candidate >= version
                    && candidate.epoch() == version.epoch()
                    && candidate.release_starts_with(prefix)
            }
            Operator::ArbitraryEqual => self.operand == candidate.to_string(),
        }
    }

    /// Returns true if this specifier explicitly mentions a pre-release
    pub fn names_prerelease(&self) -> bool {
        matches!(
            self.operator,
            Operator::Equal
                | Operator::ArbitraryEqual
                | Operator::GreaterOrEqual
                | Operator::LessOrEqual
                | Operator::Compatible
        ) && self.version.as_ref().is_some_and(Version::is_prerelease)
    }

    /// Inclusive/exclusive bounds implied by this specifier
    fn bounds(&self) -> (Option<Bound>, Option<Bound>) {
        let Some(ref version) = self.version else {
            return (None, None);
        };
        match self.operator {
            Operator::GreaterOrEqual => (Some(Bound::inclusive(version.clone())), None),
            Operator::Greater => (Some(Bound::exclusive(version.clone())), None),
            Operator::LessOrEqual => (None, Some(Bound::inclusive(version.clone()))),
            Operator::Less => (None, Some(Bound::exclusive(version.clone()))),
            Operator::Equal if self.wildcard => (
                Some(Bound::inclusive(Version::from_release(version.release().to_vec()))),
                Some(Bound::exclusive(Version::bump_prefix(
                    version.epoch(),
                    version.release(),
                ))),
            ),
            Operator::Equal => (
                Some(Bound::inclusive(version.clone())),
                Some(Bound::inclusive(version.clone())),
            ),
            Operator::Compatible => {
                let release = version.release();
                let prefix = &release[..release.len().saturating_sub(1).max(1)];
                (
                    Some(Bound::inclusive(version.clone())),
                    Some(Bound::exclusive(Version::bump_prefix(version.epoch(), prefix))),
                )
            }
            Operator::NotEqual | Operator::ArbitraryEqual => (None, None),
        }
    }

    /// Half-open `[start, end)` range removed by a `!=X.*` member
    fn excluded_range(&self) -> Option<(Version, Version)> {
        match (self.operator, &self.version) {
            (Operator::NotEqual, Some(version)) if self.wildcard => Some((
                Version::from_release(version.release().to_vec()),
                Version::bump_prefix(version.epoch(), version.release()),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.operand)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl Bound {
    fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// A conjunction of specifiers; empty means "any version"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    pub fn new(specifiers: Vec<Specifier>) -> Self {
        Self { specifiers }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    pub fn push(&mut self, specifier: Specifier) {
        if !self.specifiers.contains(&specifier) {
            self.specifiers.push(specifier);
        }
    }

    /// Merge another set into this one (logical AND)
    pub fn extend(&mut self, other: &SpecifierSet) {
        for specifier in &other.specifiers {
            self.push(specifier.clone());
        }
    }

    /// The lowest version admitted by a `>=`, `~=` or `==` member, if any
    pub fn minimum(&self) -> Option<&Version> {
        self.specifiers
            .iter()
            .filter(|s| {
                matches!(
                    s.operator,
                    Operator::GreaterOrEqual | Operator::Compatible | Operator::Equal
                ) && !s.wildcard
            })
            .filter_map(|s| s.version.as_ref())
            .max()
    }

    /// Returns true if any member explicitly names a pre-release
    pub fn names_prerelease(&self) -> bool {
        self.specifiers.iter().any(Specifier::names_prerelease)
    }

    /// Returns true if `candidate` satisfies every member
    ///
    /// Pre-releases are rejected unless `allow_prerelease` is set or a member
    /// names a pre-release itself.
    pub fn contains(&self, candidate: &Version, allow_prerelease: bool) -> bool {
        if candidate.is_prerelease() && !allow_prerelease && !self.names_prerelease() {
            return false;
        }
        self.specifiers.iter().all(|s| s.contains(candidate))
    }

    /// Returns true if some version could satisfy both sets at once
    pub fn intersects(&self, other: &SpecifierSet) -> bool {
        let mut combined = self.clone();
        combined.extend(other);
        combined.is_satisfiable()
    }

    /// Conservative satisfiability check based on the implied version interval
    pub fn is_satisfiable(&self) -> bool {
        let mut lower: Option<Bound> = None;
        let mut upper: Option<Bound> = None;

        for specifier in &self.specifiers {
            let (lo, hi) = specifier.bounds();
            if let Some(lo) = lo {
                lower = Some(match lower {
                    Some(cur) if cur.version > lo.version => cur,
                    Some(cur) if cur.version == lo.version && !cur.inclusive => cur,
                    _ => lo,
                });
            }
            if let Some(hi) = hi {
                upper = Some(match upper {
                    Some(cur) if cur.version < hi.version => cur,
                    Some(cur) if cur.version == hi.version && !cur.inclusive => cur,
                    _ => hi,
                });
            }
        }

        if let (Some(lo), Some(hi)) = (&lower, &upper) {
            if lo.version > hi.version {
                return false;
            }
            let covered = self
                .specifiers
                .iter()
                .filter_map(Specifier::excluded_range)
                .any(|(start, end)| {
                    lo.version >= start
                        && (hi.version < end || (hi.version == end && !hi.inclusive))
                });
            if covered {
                return false;
            }
            if lo.version == hi.version {
                if !(lo.inclusive && hi.inclusive) {
                    return false;
                }
                // A single admissible point must survive every member
                return self.specifiers.iter().all(|s| s.contains(&lo.version));
            }
        }

        true
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specifiers.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl Serialize for SpecifierSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'a> IntoIterator for &'a SpecifierSet {
    type Item = &'a Specifier;
    type IntoIter = std::slice::Iter<'a, Specifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.specifiers.iter()
    }
}
