//! Version specifier parser
//!
//! Handles formats:
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Exact: `==1.2.3`, `==1.2.*`
//! - Exclusion: `!=1.2.3`, `!=1.2.*`
//! - Compatible release: `~=1.2.3`
//! - Arbitrary equality: `===anything`
//! - Lists: `>=1.0, <2.0` (optionally wrapped in parentheses)

use super::ParseError;
use crate::domain::{Operator, Specifier, SpecifierSet, Version};
use regex::Regex;
use std::sync::LazyLock;

static SPECIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(===|~=|==|!=|<=|>=|<|>)\s*(\S+)$").unwrap());

/// Parse a single specifier such as `>=8.0.0`
pub fn parse_specifier(input: &str) -> Result<Specifier, ParseError> {
    let trimmed = input.trim();
    let caps = SPECIFIER_RE
        .captures(trimmed)
        .ok_or_else(|| ParseError::new(input, "expected an operator followed by a version"))?;

    let operator = Operator::ALL
        .into_iter()
        .find(|op| op.as_str() == &caps[1])
        .ok_or_else(|| ParseError::new(input, "unknown operator"))?;
    let operand = &caps[2];

    if operator == Operator::ArbitraryEqual {
        return Ok(Specifier {
            operator,
            version: Version::parse(operand).ok(),
            operand: operand.to_string(),
            wildcard: false,
        });
    }

    let (operand, wildcard) = match operand.strip_suffix(".*") {
        Some(prefix) => (prefix, true),
        None => (operand, false),
    };

    if wildcard && !matches!(operator, Operator::Equal | Operator::NotEqual) {
        return Err(ParseError::new(
            input,
            format!("wildcard versions are only allowed with == and !=, not {}", operator),
        ));
    }

    let version = Version::parse(operand).map_err(|e| ParseError::new(input, e.to_string()))?;

    if wildcard && (version.is_prerelease() || version.is_postrelease() || version.local().is_some())
    {
        return Err(ParseError::new(input, "wildcard must follow a release number"));
    }

    if operator == Operator::Compatible && version.release().len() < 2 {
        return Err(ParseError::new(
            input,
            "~= requires at least two release segments",
        ));
    }

    if version.local().is_some() && !matches!(operator, Operator::Equal | Operator::NotEqual) {
        return Err(ParseError::new(
            input,
            format!("local versions are not allowed with {}", operator),
        ));
    }

    Ok(Specifier {
        operator,
        operand: version.to_string(),
        version: Some(version),
        wildcard,
    })
}

/// Parse a comma-separated specifier list; an empty string means "any version"
pub fn parse_specifiers(input: &str) -> Result<SpecifierSet, ParseError> {
    let mut trimmed = input.trim();
    if let Some(inner) = trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        trimmed = inner.trim();
    }

    let mut set = SpecifierSet::any();
    if trimmed.is_empty() {
        return Ok(set);
    }

    for part in trimmed.split(',') {
        if part.trim().is_empty() {
            return Err(ParseError::new(input, "empty specifier in list"));
        }
        set.push(parse_specifier(part)?);
    }
    Ok(set)
}
