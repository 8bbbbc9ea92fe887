//! Raw diagnostics as emitted by the analysis tool, and the filter that turns
//! them into a bounded, severity-ordered view.
//!
//! The wire shape is basedpyright's `--outputjson` report:
//!
//! ```json
//! {"generalDiagnostics": [{"message": "...", "severity": "error",
//!   "range": {"start": {"line": 4, "character": 14}, "end": {"line": 4, "character": 17}},
//!   "rule": "reportArgumentType"}]}
//! ```
//!
//! Positions are zero-based here; [`crate::Issue`] carries the one-based form.

use serde::{Deserialize, Serialize};

use crate::severity::{Severity, SeverityFilter, TopN};

/// Zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    #[serde(default)]
    pub start: Position,
    #[serde(default)]
    pub end: Position,
}

/// One finding reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub message: String,
    /// Missing severities are treated as informational.
    #[serde(default = "missing_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

fn missing_severity() -> Severity {
    Severity::Info
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, severity: Severity, range: Range) -> Self {
        Self {
            message: message.into(),
            severity,
            range,
            code: None,
            rule: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Rule identifier; the tool reports it under either `code` or `rule`.
    pub fn rule_id(&self) -> Option<&str> {
        self.code.as_deref().or(self.rule.as_deref())
    }
}

/// Top-level report parsed from the tool's stdout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    #[serde(rename = "generalDiagnostics", default)]
    pub general_diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Order, filter and cap a diagnostic collection.
///
/// Sorting is stable by severity rank (error, warning, info, other), the
/// severity filter is applied to the sorted list, and the cap truncates what
/// remains.
pub fn filter_diagnostics(
    mut diagnostics: Vec<Diagnostic>,
    filter: SeverityFilter,
    cap: TopN,
) -> Vec<Diagnostic> {
    diagnostics.sort_by_key(|d| d.severity.rank());

    if filter != SeverityFilter::All {
        diagnostics.retain(|d| filter.matches(&d.severity));
    }

    if let Some(limit) = cap.get() {
        diagnostics.truncate(limit);
    }

    diagnostics
}
