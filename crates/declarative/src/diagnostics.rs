//! Diagnostics collected while running an operation
//!
//! A [`Diagnostics`] value is created per operation invocation and handed
//! back to the caller. It is append-only: components record errors and
//! warnings as they go, and the caller decides what to show. Any error
//! severity entry means the operation failed, whatever else it returned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A structured error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short, human-readable headline
    pub summary: String,
    /// Full underlying detail
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}: {}", self.severity, self.summary)
        } else {
            write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
        }
    }
}

/// Ordered, append-only collection of diagnostics for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            log::debug!("recorded error diagnostic: {}", diagnostic.summary);
        }
        self.entries.push(diagnostic);
    }

    /// Append an error diagnostic
    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.record(Diagnostic::error(summary, detail));
    }

    /// Append a warning diagnostic
    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.record(Diagnostic::warning(summary, detail));
    }

    /// Append every diagnostic from another collection, keeping order
    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.record(diagnostic);
        }
    }

    /// Whether any error severity diagnostic was recorded
    pub fn has_error(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries.len() - self.error_count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// First error diagnostic, if any
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.entries.iter().find(|d| d.is_error())
    }

    /// Take every recorded diagnostic out, in recording order
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.record(diagnostic);
        diagnostics
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
