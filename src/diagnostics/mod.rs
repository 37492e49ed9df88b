//! Diagnostics for recoverable structural problems
//!
//! Malformed spine structure is common in real corpora, so the tracker never
//! aborts on it. Each anomaly becomes a `Diagnostic` with the line (and
//! column, when one applies) where it was detected, and parsing continues
//! with the best binding available.

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;

/// Severity level for diagnostics
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// One structural anomaly at a specific location
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Record index in the file
    pub line: usize,
    /// Field index, when the anomaly is tied to one spine
    pub column: Option<usize>,
    pub severity: DiagnosticSeverity,
    pub error: StructuralError,
}

impl Diagnostic {
    pub fn new(line: usize, severity: DiagnosticSeverity, error: StructuralError) -> Self {
        Self {
            line,
            column: None,
            severity,
            error,
        }
    }

    /// Attach a column
    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(f, "line {}, column {}: {}", self.line + 1, col + 1, self.error),
            None => write!(f, "line {}: {}", self.line + 1, self.error),
        }
    }
}

/// All diagnostics collected while parsing one file
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    marks: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// Record a diagnostic and forward it to the log
    pub fn add(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.marks.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.marks.iter()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.marks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            4,
            DiagnosticSeverity::Error,
            StructuralError::FieldCountMismatch { expected: 2, found: 3 },
        );
        assert_eq!(diag.to_string(), "line 5: expected 2 fields, found 3");

        let diag = diag.at_column(1);
        assert_eq!(diag.to_string(), "line 5, column 2: expected 2 fields, found 3");
    }

    #[test]
    fn test_diagnostics_has_errors() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());

        diags.add(Diagnostic::new(
            0,
            DiagnosticSeverity::Warning,
            StructuralError::UnterminatedSpines { count: 1 },
        ));
        assert!(!diags.has_errors());

        diags.add(Diagnostic::new(1, DiagnosticSeverity::Error, StructuralError::UnpairedMerge));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }
}
