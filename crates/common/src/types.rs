//! Core types for storysweep

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Vertical offset of the selected explorer tree node.
///
/// Stands in for "which catalog entry is selected". It is not a stable
/// identifier, only comparable within one traversal pass.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSelectionPosition(pub f64);

impl TreeSelectionPosition {
    /// Sorts before every real offset, so the first wrap check never ends a sweep.
    pub const BEFORE_FIRST: TreeSelectionPosition = TreeSelectionPosition(f64::NEG_INFINITY);

    pub fn offset(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for TreeSelectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One DOM node flagged by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationNode {
    #[serde(default)]
    pub failure_summary: String,
    #[serde(default)]
    pub html: String,
}

/// A single rule violation as reported by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,

    /// Rule identifier, e.g. `color-contrast`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

impl Violation {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            nodes: Vec::new(),
            id: None,
            impact: None,
            help: None,
            help_url: None,
        }
    }

    pub fn with_node(mut self, failure_summary: impl Into<String>, html: impl Into<String>) -> Self {
        self.nodes.push(ViolationNode {
            failure_summary: failure_summary.into(),
            html: html.into(),
        });
        self
    }
}

/// Raw report for one catalog entry. Anything besides `violations` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub violations: Vec<Violation>,
}

/// Outcome of auditing one catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    /// DOM id of the selected explorer item
    pub name: String,

    /// Violations left after noise filtering
    pub violations: Vec<Violation>,

    /// Set when the report payload was unreadable; violations is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl EntryReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.parse_error.is_none()
    }
}

/// Everything a completed sweep observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub entries: Vec<EntryReport>,
}

impl SweepSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            duration_ms: 0,
            entries: Vec::new(),
        }
    }

    pub fn violation_count(&self) -> usize {
        self.entries.iter().map(|e| e.violations.len()).sum()
    }

    pub fn failing_entries(&self) -> usize {
        self.entries.iter().filter(|e| !e.violations.is_empty()).count()
    }

    pub fn unparsed_entries(&self) -> usize {
        self.entries.iter().filter(|e| e.parse_error.is_some()).count()
    }
}

impl Default for SweepSummary {
    fn default() -> Self {
        Self::new()
    }
}
