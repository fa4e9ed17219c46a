//! Parsers for the string forms used inside a package descriptor
//!
//! This module provides parsers for:
//! - Version specifier lists (`>=1.0,<2.0`, `~=2.2`, `==1.*`)
//! - Dependency requirements (`pillow[webp]>=8.0.0; sys_platform == "win32"`)
//! - Console-script targets (`mcp_feedback_collector.server:main`)

mod entry_point;
mod requirement;
mod specifier;

pub use entry_point::{is_valid_command_name, parse_entry_point};
pub use requirement::parse_requirement;
pub use specifier::{parse_specifier, parse_specifiers};

use thiserror::Error;

/// Error returned when a descriptor string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{input}': {message}")]
pub struct ParseError {
    /// The offending input
    pub input: String,
    /// What was wrong with it
    pub message: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(">=x", "invalid version 'x'");
        assert_eq!(err.to_string(), "cannot parse '>=x': invalid version 'x'");
    }
}
