//! Diagnostic types for structured observations about user source
//!
//! Diagnostics never abort the pipeline on their own; the driver aggregates
//! them and decides based on severity. Infrastructure failures travel as
//! [`crate::DevgenError`] instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity levels for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages
    Info,
    /// Warnings that should be addressed
    Warning,
    /// Errors that make the run unsuccessful
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A position in user source, 1-based; line 0 means unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A position that names a file but no location within it
    pub fn file_only(file: impl Into<PathBuf>) -> Self {
        Self::new(file, 0, 0)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A structured, positioned observation about user source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable 4-character identifier chosen by the tool
    pub code: String,
    /// Name of the tool that produced the diagnostic
    pub tool: String,
    pub message: String,
    #[serde(flatten)]
    pub pos: SourcePos,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        tool: impl Into<String>,
        message: impl Into<String>,
        pos: SourcePos,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            tool: tool.into(),
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.tool, self.code, self.pos, self.message
        )
    }
}

/// Per-tool, per-run accumulator of diagnostics in insertion order
///
/// Single writer by convention: one tool, one thread.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    tool: String,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a collector attributing its entries to the named tool
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            diagnostics: Vec::new(),
        }
    }

    /// The tool this collector attributes diagnostics to
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Record an error-severity diagnostic
    pub fn error(&mut self, code: &str, message: impl Into<String>, pos: SourcePos) {
        self.push(Severity::Error, code, message, pos);
    }

    /// Record a warning-severity diagnostic
    pub fn warning(&mut self, code: &str, message: impl Into<String>, pos: SourcePos) {
        self.push(Severity::Warning, code, message, pos);
    }

    /// Record an info-severity diagnostic
    pub fn info(&mut self, code: &str, message: impl Into<String>, pos: SourcePos) {
        self.push(Severity::Info, code, message, pos);
    }

    fn push(&mut self, severity: Severity, code: &str, message: impl Into<String>, pos: SourcePos) {
        self.diagnostics
            .push(Diagnostic::new(severity, code, self.tool.clone(), message, pos));
    }

    /// Append every entry of another collector, preserving its attribution
    pub fn merge(&mut self, other: DiagnosticCollector) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Append pre-built diagnostics (e.g. from a Validatable tool)
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// The accumulated list in insertion order
    pub fn collect(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the collector, yielding its entries in insertion order
    pub fn into_collected(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// True iff any entry has severity error
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> SourcePos {
        SourcePos::new("a.go", line, 1)
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut c = DiagnosticCollector::new("enumgen");
        c.warning("EG03", "first", pos(3));
        c.error("EG01", "second", pos(1));
        c.info("EG02", "third", pos(2));

        let msgs: Vec<_> = c.collect().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, ["first", "second", "third"]);
    }

    #[test]
    fn test_has_errors() {
        let mut c = DiagnosticCollector::new("enumgen");
        assert!(!c.has_errors());
        c.warning("EG03", "w", pos(1));
        assert!(!c.has_errors());
        c.error("EG01", "e", pos(2));
        assert!(c.has_errors());
    }

    #[test]
    fn test_merge_keeps_original_attribution() {
        let mut a = DiagnosticCollector::new("enumgen");
        a.error("EG01", "mine", pos(1));

        let mut b = DiagnosticCollector::new("plugin-x");
        b.warning("PX01", "theirs", pos(2));

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.collect()[1].tool, "plugin-x");
    }

    #[test]
    fn test_display_shape() {
        let d = Diagnostic::new(
            Severity::Error,
            "EG01",
            "enumgen",
            "unsupported underlying type",
            SourcePos::new("pkg/status.go", 4, 6),
        );
        assert_eq!(
            d.to_string(),
            "enumgen[EG01] pkg/status.go:4:6: unsupported underlying type"
        );
    }
}
