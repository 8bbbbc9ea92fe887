//! Severity levels, severity filters and result caps.

use core::num::NonZeroUsize;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Severity of a single diagnostic as reported by the analysis tool.
///
/// Unrecognized spellings are kept verbatim in `Other` so they survive into
/// the result and sort after everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Other(String),
}

impl Severity {
    /// Sort rank: error < warning < info < anything else.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
            Severity::Other(_) => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Other(s) => s,
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            // basedpyright spells it out in `--outputjson` mode.
            "info" | "information" => Severity::Info,
            _ => Severity::Other(value),
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which severities a caller wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    Error,
    Warning,
    Info,
    #[default]
    All,
}

impl SeverityFilter {
    pub const VALID: [&'static str; 4] = ["error", "warning", "info", "all"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityFilter::Error => "error",
            SeverityFilter::Warning => "warning",
            SeverityFilter::Info => "info",
            SeverityFilter::All => "all",
        }
    }

    pub fn matches(&self, severity: &Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Error => *severity == Severity::Error,
            SeverityFilter::Warning => *severity == Severity::Warning,
            SeverityFilter::Info => *severity == Severity::Info,
        }
    }
}

impl core::fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(SeverityFilter::Error),
            "warning" => Ok(SeverityFilter::Warning),
            "info" => Ok(SeverityFilter::Info),
            "all" => Ok(SeverityFilter::All),
            _ => Err(DomainError::validation(format!(
                "Invalid severity. Must be one of: {}",
                Self::VALID.join(", ")
            ))),
        }
    }
}

/// Maximum number of issues kept after filtering.
///
/// Serializes as the limit, or `null` when unbounded. At the caller boundary
/// the sentinel `-1` means unbounded (see [`TopN::from_raw`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopN(Option<NonZeroUsize>);

impl TopN {
    pub const UNBOUNDED_SENTINEL: i64 = -1;

    pub fn unbounded() -> Self {
        Self(None)
    }

    pub fn limit(n: NonZeroUsize) -> Self {
        Self(Some(n))
    }

    /// Parse a caller-supplied cap: `-1` is unbounded, positive values are
    /// limits, `0` and anything below `-1` are rejected.
    pub fn from_raw(raw: i64) -> DomainResult<Self> {
        if raw == Self::UNBOUNDED_SENTINEL {
            return Ok(Self::unbounded());
        }
        usize::try_from(raw)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::limit)
            .ok_or_else(|| DomainError::validation("top_n must be a positive integer or -1 for all"))
    }

    pub fn get(&self) -> Option<usize> {
        self.0.map(NonZeroUsize::get)
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }

    /// Caller-facing form: the limit, or `-1` when unbounded.
    pub fn to_raw(&self) -> i64 {
        self.get()
            .map_or(Self::UNBOUNDED_SENTINEL, |n| i64::try_from(n).unwrap_or(i64::MAX))
    }
}
