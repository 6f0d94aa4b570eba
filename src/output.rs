//! Report output types and serialization.
//!
//! The `report` command lists classes that could take a generated
//! `__repr__` but do not have one. Text output is one `path: line: Class`
//! line per entry; JSON output is a status-first response object so the
//! result is machine-parseable.
//!
//! Output is deterministic: entries appear in source order, field order is
//! fixed by the struct definitions.

use std::io::{self, Write};

use serde::Serialize;

/// One class missing a `__repr__`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub path: String,
    /// 1-based line of the `def __init__`.
    pub line: i64,
    pub class_name: String,
}

impl ReportEntry {
    /// The text form: `path: line: ClassName`.
    pub fn to_text(&self) -> String {
        format!("{}: {}: {}", self.path, self.line, self.class_name)
    }
}

/// JSON envelope for the report command.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub status: String,
    pub missing: Vec<ReportEntry>,
}

impl ReportResponse {
    pub fn new(missing: Vec<ReportEntry>) -> Self {
        ReportResponse {
            status: "ok".to_string(),
            missing,
        }
    }
}

/// Serialize a response as pretty JSON followed by a newline.
pub fn emit_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(writer, "{json}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form() {
        let entry = ReportEntry {
            path: "pkg/widgets.py".to_string(),
            line: 12,
            class_name: "Widget".to_string(),
        };
        assert_eq!(entry.to_text(), "pkg/widgets.py: 12: Widget");
    }

    #[test]
    fn json_envelope_is_status_first() {
        let response = ReportResponse::new(vec![ReportEntry {
            path: "m.py".to_string(),
            line: 3,
            class_name: "A".to_string(),
        }]);
        let mut buf = Vec::new();
        emit_json(&response, &mut buf).expect("serialize");
        let text = String::from_utf8(buf).expect("utf-8");
        assert!(text.trim_start().starts_with("{\n  \"status\": \"ok\""));
        assert!(text.contains("\"class_name\": \"A\""));
    }
}
