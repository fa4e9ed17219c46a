//! Console-script entry points

use serde::Serialize;
use std::fmt;

/// Mapping from an installed command name to `module.path:callable`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntryPoint {
    /// Command name of the generated launcher
    pub name: String,
    /// Dotted module path (`mcp_feedback_collector.server`)
    pub module: String,
    /// Attribute path inside the module (`main`, or `cli.run`)
    pub callable: String,
}

impl EntryPoint {
    pub fn new(
        name: impl Into<String>,
        module: impl Into<String>,
        callable: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            callable: callable.into(),
        }
    }

    /// The `module:callable` target as written in the descriptor
    pub fn target(&self) -> String {
        format!("{}:{}", self.module, self.callable)
    }

    /// First component of the callable path, the name imported from the module
    pub fn import_name(&self) -> &str {
        self.callable
            .split('.')
            .next()
            .unwrap_or(self.callable.as_str())
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.target())
    }
}
