//! Console-script target parser (`module.path:callable`)

use super::ParseError;
use crate::domain::EntryPoint;
use regex::Regex;
use std::sync::LazyLock;

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*:\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*(?:\[[^\]]*\])?$",
    )
    .unwrap()
});

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Returns true if `name` can be used as a launcher file name
pub fn is_valid_command_name(name: &str) -> bool {
    COMMAND_RE.is_match(name)
}

/// Parse a console-script mapping `name = "module:callable"`
pub fn parse_entry_point(name: &str, target: &str) -> Result<EntryPoint, ParseError> {
    if !is_valid_command_name(name) {
        return Err(ParseError::new(name, "invalid command name"));
    }

    let caps = TARGET_RE
        .captures(target.trim())
        .ok_or_else(|| ParseError::new(target, "expected 'module.path:callable'"))?;

    Ok(EntryPoint::new(name, &caps[1], &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_script() {
        let ep = parse_entry_point(
            "mcp-feedback-collector",
            "mcp_feedback_collector.server:main",
        )
        .unwrap();
        assert_eq!(ep.name, "mcp-feedback-collector");
        assert_eq!(ep.module, "mcp_feedback_collector.server");
        assert_eq!(ep.callable, "main");
    }

    #[test]
    fn test_parse_nested_callable() {
        let ep = parse_entry_point("tool", "pkg.cli : App.run").unwrap();
        assert_eq!(ep.module, "pkg.cli");
        assert_eq!(ep.callable, "App.run");
    }

    #[test]
    fn test_parse_ignores_extras() {
        let ep = parse_entry_point("tool", "pkg:main [gui]").unwrap();
        assert_eq!(ep.target(), "pkg:main");
    }

    #[test]
    fn test_parse_invalid_target() {
        assert!(parse_entry_point("tool", "pkg.main").is_err());
        assert!(parse_entry_point("tool", "pkg:").is_err());
        assert!(parse_entry_point("tool", "1pkg:main").is_err());
        assert!(parse_entry_point("tool", "pkg-name:main").is_err());
    }

    #[test]
    fn test_parse_invalid_name() {
        assert!(parse_entry_point("", "pkg:main").is_err());
        assert!(parse_entry_point("has space", "pkg:main").is_err());
        assert!(parse_entry_point("../escape", "pkg:main").is_err());
    }

    #[test]
    fn test_is_valid_command_name() {
        assert!(is_valid_command_name("mcp-feedback-collector"));
        assert!(is_valid_command_name("tool.py"));
        assert!(!is_valid_command_name(".hidden"));
    }
}
