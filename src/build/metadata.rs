//! Core metadata (`METADATA` / `PKG-INFO`), `WHEEL`, `entry_points.txt` and `RECORD`

use crate::domain::{License, Readme, Requirement};
use crate::manifest::Descriptor;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

const METADATA_VERSION: &str = "2.3";

/// Wheel compatibility tag for pure-Python, version-independent wheels
pub const WHEEL_TAG: &str = "py3-none-any";

/// Content type of the long description, from the readme file extension
pub fn readme_content_type(readme: &str) -> &'static str {
    let lower = readme.to_ascii_lowercase();
    if lower.ends_with(".md") || lower.ends_with(".markdown") {
        "text/markdown"
    } else if lower.ends_with(".rst") {
        "text/x-rst"
    } else {
        "text/plain"
    }
}

/// Declared content type, else one guessed from the readme file name
fn description_content_type(readme: &Readme) -> &str {
    match (readme.content_type(), readme.path()) {
        (Some(content_type), _) => content_type,
        (None, Some(path)) => readme_content_type(path),
        (None, None) => "text/plain",
    }
}

/// Render a `Requires-Dist` value, folding the group into the marker
fn requires_dist(requirement: &Requirement, group: Option<&str>) -> String {
    let marker = match (requirement.marker.as_deref(), group) {
        (Some(marker), Some(group)) => Some(format!("({}) and extra == \"{}\"", marker, group)),
        (None, Some(group)) => Some(format!("extra == \"{}\"", group)),
        (Some(marker), None) => Some(marker.to_string()),
        (None, None) => None,
    };
    let mut requirement = requirement.clone();
    requirement.marker = marker;
    requirement.to_string()
}

/// Render core metadata for `descriptor`, appending `readme_body` as the description
pub fn core_metadata(descriptor: &Descriptor, readme_body: Option<&str>) -> String {
    let project = &descriptor.project;
    let mut out = String::new();

    // Writing to a String never fails
    let _ = writeln!(out, "Metadata-Version: {}", METADATA_VERSION);
    let _ = writeln!(out, "Name: {}", project.name);
    let _ = writeln!(out, "Version: {}", project.version);
    if let Some(summary) = &project.description {
        let _ = writeln!(out, "Summary: {}", summary.replace('\n', " "));
    }
    for (label, url) in &project.urls {
        let _ = writeln!(out, "Project-URL: {}, {}", label, url);
    }

    let authors: Vec<String> = project
        .authors
        .iter()
        .filter(|p| p.email.is_none())
        .filter_map(|p| p.name.clone())
        .collect();
    if !authors.is_empty() {
        let _ = writeln!(out, "Author: {}", authors.join(", "));
    }
    let author_emails: Vec<String> = project
        .authors
        .iter()
        .filter(|p| p.email.is_some())
        .map(|p| p.to_string())
        .collect();
    if !author_emails.is_empty() {
        let _ = writeln!(out, "Author-email: {}", author_emails.join(", "));
    }

    match &project.license {
        Some(License::File(file)) => {
            let _ = writeln!(out, "License-File: {}", file);
        }
        Some(license) => {
            let _ = writeln!(out, "License: {}", license.value());
        }
        None => {}
    }
    if !project.keywords.is_empty() {
        let _ = writeln!(out, "Keywords: {}", project.keywords.join(","));
    }
    for classifier in &project.classifiers {
        let _ = writeln!(out, "Classifier: {}", classifier);
    }
    if let Some(requires_python) = &project.requires_python {
        let _ = writeln!(out, "Requires-Python: {}", requires_python);
    }

    for requirement in &descriptor.dependencies {
        let _ = writeln!(out, "Requires-Dist: {}", requires_dist(requirement, None));
    }
    for (group, requirements) in &descriptor.optional_dependencies {
        for requirement in requirements {
            let _ = writeln!(out, "Requires-Dist: {}", requires_dist(requirement, Some(group)));
        }
    }
    for group in descriptor.optional_dependencies.keys() {
        let _ = writeln!(out, "Provides-Extra: {}", group);
    }

    if let (Some(readme), Some(body)) = (&project.readme, readme_body) {
        let _ = writeln!(out, "Description-Content-Type: {}", description_content_type(readme));
        let _ = writeln!(out);
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

/// The `.dist-info/WHEEL` file
pub fn wheel_file() -> String {
    format!(
        "Wheel-Version: 1.0\nGenerator: {} {}\nRoot-Is-Purelib: true\nTag: {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        WHEEL_TAG
    )
}

/// The `.dist-info/entry_points.txt` file, or `None` without console scripts
pub fn entry_points_file(descriptor: &Descriptor) -> Option<String> {
    if descriptor.scripts.is_empty() {
        return None;
    }
    let mut out = String::from("[console_scripts]\n");
    for script in &descriptor.scripts {
        let _ = writeln!(out, "{}", script);
    }
    Some(out)
}

/// `sha256=<urlsafe-base64-nopad>` digest as used in RECORD
pub fn record_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// Hex sha256 of a whole artifact
pub fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Accumulates RECORD rows as archive entries are written
#[derive(Debug, Default)]
pub struct Record {
    rows: Vec<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, archive_path: &str, data: &[u8]) {
        self.rows.push(format!(
            "{},{},{}",
            csv_field(archive_path),
            record_digest(data),
            data.len()
        ));
    }

    /// Render all rows plus the unhashed row for RECORD itself
    pub fn render(&self, record_path: &str) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(row);
            out.push('\n');
        }
        let _ = writeln!(out, "{},,", csv_field(record_path));
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_descriptor;

    const FEEDBACK_COLLECTOR: &str =
        include_str!("../../tests/fixtures/feedback-collector/pyproject.toml");

    #[test]
    fn test_core_metadata_fields() {
        let descriptor = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let metadata = core_metadata(&descriptor, Some("# Title\n"));

        assert!(metadata.starts_with("Metadata-Version: 2.3\nName: mcp-feedback-collector\nVersion: 2.1.0\n"));
        assert!(metadata.contains("Author-email: Feedback Author <author@example.com>\n"));
        assert!(metadata.contains("License: MIT\n"));
        assert!(metadata.contains("Requires-Python: >=3.8\n"));
        assert!(metadata.contains("Project-URL: Homepage, https://example.com/mcp-feedback-collector\n"));
        assert!(metadata.contains("Classifier: Programming Language :: Python :: 3\n"));
        assert!(metadata.ends_with("Description-Content-Type: text/markdown\n\n# Title\n"));
    }

    #[test]
    fn test_requires_dist_marks_optional_groups() {
        let descriptor = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        let metadata = core_metadata(&descriptor, None);

        assert!(metadata.contains("Requires-Dist: mcp>=1.0.0\n"));
        assert!(metadata.contains("Requires-Dist: pytest>=6.0; extra == \"dev\"\n"));
        assert!(metadata.contains("Requires-Dist: black; extra == \"dev\"\n"));
        assert!(metadata.contains("Provides-Extra: dev\n"));
        assert!(!metadata.contains("Description-Content-Type"));
    }

    #[test]
    fn test_requires_dist_combines_markers() {
        let requirement = crate::parser::parse_requirement("pywin32>=300; sys_platform == 'win32'").unwrap();
        assert_eq!(
            requires_dist(&requirement, Some("windows")),
            "pywin32>=300; (sys_platform == 'win32') and extra == \"windows\""
        );
    }

    #[test]
    fn test_entry_points_file() {
        let descriptor = parse_descriptor(FEEDBACK_COLLECTOR).unwrap();
        assert_eq!(
            entry_points_file(&descriptor).unwrap(),
            "[console_scripts]\nmcp-feedback-collector = mcp_feedback_collector.server:main\n"
        );
    }

    #[test]
    fn test_record_digest_known_value() {
        // sha256("") = e3b0c442...
        assert_eq!(
            record_digest(b""),
            "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
        assert_eq!(
            hex_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_record_render() {
        let mut record = Record::new();
        record.add("pkg/__init__.py", b"");
        let rendered = record.render("pkg-1.0.dist-info/RECORD");
        assert_eq!(
            rendered,
            "pkg/__init__.py,sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU,0\npkg-1.0.dist-info/RECORD,,\n"
        );
    }

    #[test]
    fn test_declared_content_type_wins_over_extension() {
        let content = FEEDBACK_COLLECTOR.replace(
            "readme = \"README.md\"",
            "readme = {file = \"README.md\", content-type = \"text/x-rst\"}",
        );
        let descriptor = parse_descriptor(&content).unwrap();
        let metadata = core_metadata(&descriptor, Some("Title\n=====\n"));
        assert!(metadata.contains("Description-Content-Type: text/x-rst\n"));
    }

    #[test]
    fn test_inline_readme_content_type() {
        let inline = Readme::Text {
            text: "Inline".to_string(),
            content_type: None,
        };
        assert_eq!(description_content_type(&inline), "text/plain");

        let declared = Readme::Text {
            text: "Inline".to_string(),
            content_type: Some("text/markdown".to_string()),
        };
        assert_eq!(description_content_type(&declared), "text/markdown");
    }

    #[test]
    fn test_readme_content_type() {
        assert_eq!(readme_content_type("README.md"), "text/markdown");
        assert_eq!(readme_content_type("README.rst"), "text/x-rst");
        assert_eq!(readme_content_type("README.txt"), "text/plain");
    }
}
