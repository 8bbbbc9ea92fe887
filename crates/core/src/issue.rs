//! Normalized, one-based findings ready to hand back to a caller.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::severity::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
    pub message: String,
    pub severity: Severity,
    pub rule: Option<String>,
    /// The offending source line, when the position falls inside the code.
    pub line_content: Option<String>,
}

impl Issue {
    /// Normalize a tool diagnostic against the analysed source lines.
    pub fn from_diagnostic(diagnostic: &Diagnostic, source_lines: &[&str]) -> Self {
        let start = diagnostic.range.start;
        let line_content = usize::try_from(start.line)
            .ok()
            .and_then(|idx| source_lines.get(idx))
            .map(|l| (*l).to_string());

        Self {
            line: start.line.saturating_add(1),
            column: start.character.saturating_add(1),
            message: diagnostic.message.clone(),
            severity: diagnostic.severity.clone(),
            rule: diagnostic.rule_id().map(str::to_string),
            line_content,
        }
    }

    /// Stand-in issue for tool output that could not be parsed.
    pub fn raw_output(output: &str) -> Self {
        Self {
            line: 1,
            column: 1,
            message: format!("Raw output: {output}"),
            severity: Severity::Error,
            rule: None,
            line_content: None,
        }
    }
}

/// Split source into lines the way the analyser numbers them.
///
/// `\r\n`, `\n` and a lone `\r` all end a line. A trailing line break does
/// not start an extra empty line.
pub fn source_lines(code: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = code;
    while let Some(idx) = rest.find(['\r', '\n']) {
        lines.push(&rest[..idx]);
        let width = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[idx + width..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}
