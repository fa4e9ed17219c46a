//! Dependency requirement parser
//!
//! Handles formats:
//! - Bare name: `black`
//! - Constrained: `pillow>=8.0.0`, `mcp >= 1.0.0`, `pkg (>=1.0,<2)`
//! - Extras: `httpx[http2,socks]>=0.24.0`
//! - Markers: `pywin32>=300; sys_platform == 'win32'`
//! - Direct references: `pkg @ https://example.com/pkg.whl`

use super::{parse_specifiers, ParseError};
use crate::domain::Requirement;
use regex::Regex;
use std::sync::LazyLock;

// name, optional [extras], remainder
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[-A-Za-z0-9._]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?\s*(.*)$")
        .unwrap()
});

static EXTRA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[-A-Za-z0-9._]*[A-Za-z0-9])?$").unwrap());

/// Parse a requirement string
pub fn parse_requirement(input: &str) -> Result<Requirement, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(input, "empty requirement"));
    }

    let caps = REQUIREMENT_RE
        .captures(trimmed)
        .ok_or_else(|| ParseError::new(input, "requirement must start with a package name"))?;

    let mut requirement = Requirement::new(&caps[1]);

    if let Some(extras) = caps.get(2) {
        for extra in extras.as_str().split(',') {
            let extra = extra.trim();
            if extra.is_empty() {
                continue;
            }
            if !EXTRA_RE.is_match(extra) {
                return Err(ParseError::new(input, format!("invalid extra '{}'", extra)));
            }
            requirement.extras.push(extra.to_string());
        }
    }

    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("").trim();

    if let Some(reference) = rest.strip_prefix('@') {
        // Markers after a URL must be separated by whitespace
        let reference = reference.trim();
        let (url, marker) = match reference.find(" ;").or_else(|| reference.find("\t;")) {
            Some(idx) => (reference[..idx].trim(), Some(reference[idx + 2..].trim())),
            None => (reference, None),
        };
        if url.is_empty() {
            return Err(ParseError::new(input, "missing URL after '@'"));
        }
        requirement.url = Some(url.to_string());
        if let Some(marker) = marker {
            requirement.marker = Some(parse_marker(input, marker)?);
        }
        return Ok(requirement);
    }

    let (version_part, marker) = match rest.split_once(';') {
        Some((version, marker)) => (version.trim(), Some(marker)),
        None => (rest, None),
    };

    requirement.specifiers = parse_specifiers(version_part)?;
    if let Some(marker) = marker {
        requirement.marker = Some(parse_marker(input, marker)?);
    }

    Ok(requirement)
}

fn parse_marker(input: &str, marker: &str) -> Result<String, ParseError> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Err(ParseError::new(input, "empty environment marker"));
    }
    Ok(marker.to_string())
}
