//! Diagnostics collected while inspecting inputs.
//!
//! Weights graphs and cost matrices are accepted as long as they are
//! mathematically usable, but some shapes deserve a warning: units without
//! neighbors, asymmetric links, disconnected components, depots that cannot
//! reach a customer. These are reported through [`Diagnostics`] instead of
//! failing.
//!
//! # Example
//!
//! ```
//! use geoscope_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_unit("islands", "unit has no neighbors", "tract-3");
//! diag.add_error("matrix", "depot cannot reach any customer");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.issues[0].severity, Severity::Warning);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Usable, but statistics may be biased or a model may be infeasible
    Warning,
    /// Not usable as-is
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "islands", "symmetry", "connectivity")
    pub category: String,
    pub message: String,
    /// Optional spatial unit or node reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(unit) = &self.unit {
            write!(f, " ({})", unit)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_unit(&mut self, category: &str, message: &str, unit: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_unit(unit));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_unit(&mut self, category: &str, message: &str, unit: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_unit(unit));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_pluralizes() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("islands", "a");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_warning("islands", "b");
        diag.add_error("matrix", "c");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn display_includes_unit() {
        let issue = DiagnosticIssue::new(Severity::Warning, "islands", "no neighbors")
            .with_unit("tract-9");
        assert_eq!(issue.to_string(), "[warning:islands] no neighbors (tract-9)");
    }

    #[test]
    fn filter_by_category_and_merge() {
        let mut a = Diagnostics::new();
        a.add_warning("symmetry", "one-way link");
        let mut b = Diagnostics::new();
        b.add_warning_with_unit("islands", "no neighbors", "7");
        a.merge(b);

        assert_eq!(a.issues_by_category("islands").count(), 1);
        assert!(a.has_issues());
        assert!(!a.has_errors());
    }

    #[test]
    fn serializes_without_empty_unit() {
        let mut diag = Diagnostics::new();
        diag.add_warning("connectivity", "2 components");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(!json.contains("unit"));
    }
}
