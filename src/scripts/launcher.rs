//! Launcher shim rendering

use crate::domain::EntryPoint;

/// Interpreter used in the shebang unless configured otherwise
pub const DEFAULT_PYTHON: &str = "/usr/bin/env python3";

/// Render the launcher for `entry_point`
///
/// The shim imports the target module, calls the callable with no arguments
/// and hands its return value to `sys.exit`.
pub fn render_launcher(entry_point: &EntryPoint, python: &str) -> String {
    format!(
        "#!{python}\n\
         # -*- coding: utf-8 -*-\n\
         import re\n\
         import sys\n\
         from {module} import {import_name}\n\
         if __name__ == \"__main__\":\n    \
         sys.argv[0] = re.sub(r\"(-script\\.pyw|\\.exe)?$\", \"\", sys.argv[0])\n    \
         sys.exit({callable}())\n",
        python = python,
        module = entry_point.module,
        import_name = entry_point.import_name(),
        callable = entry_point.callable,
    )
}
