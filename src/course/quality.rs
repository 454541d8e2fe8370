//! Content Quality Gate
//!
//! Advisory checks on generated lesson content. Issues never block a topic;
//! they are logged and handed back to the caller.

use serde_json::Value;
use std::fmt;

use super::content::ContentDocument;
use super::schema::Schema;
use crate::constants::fields::{LEARNING_OBJECTIVES, MIN_LEARNING_OBJECTIVES};

/// Fields accepted as the main lesson body, checked in order
pub const CONTENT_FIELD_ALIASES: [&str; 3] = ["content", "contentSections", "lessonContent"];

/// Fields accepted as practice material, checked in order
pub const EXERCISE_FIELD_ALIASES: [&str; 3] = ["exercises", "activities", "practice"];

/// Severity levels for quality issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Observation that doesn't affect usability
    Info,
    /// Usable, but degraded for learners
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Info => write!(f, "INFO"),
            IssueSeverity::Warning => write!(f, "WARN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityIssue {
    pub severity: IssueSeverity,
    pub message: String,
    /// Field the issue is about
    pub field: Option<String>,
}

impl QualityIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            field: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Info,
            message: message.into(),
            field: None,
        }
    }

    pub fn at(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {} ({})", self.severity, self.message, field),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    /// Any warning-level issue present
    pub fn is_flagged(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity >= IssueSeverity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }

    fn add(&mut self, issue: QualityIssue) {
        self.issues.push(issue);
    }
}

pub struct QualityGate;

impl QualityGate {
    /// Run the content checks, plus schema coverage when a schema is known
    pub fn check(document: &ContentDocument, schema: &Schema) -> QualityReport {
        let mut report = QualityReport::default();
        Self::check_content(document, &mut report);
        Self::check_schema_coverage(document, schema, &mut report);
        report
    }

    fn check_content(document: &ContentDocument, report: &mut QualityReport) {
        let objectives = document
            .get(LEARNING_OBJECTIVES)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if objectives < MIN_LEARNING_OBJECTIVES {
            report.add(
                QualityIssue::warning(format!(
                    "Missing or insufficient learning objectives ({} of {})",
                    objectives, MIN_LEARNING_OBJECTIVES
                ))
                .at(LEARNING_OBJECTIVES),
            );
        }

        if !CONTENT_FIELD_ALIASES.iter().any(|f| document.contains(f)) {
            report.add(QualityIssue::warning(format!(
                "No main content sections found (expected one of: {})",
                CONTENT_FIELD_ALIASES.join(", ")
            )));
        }

        if !EXERCISE_FIELD_ALIASES.iter().any(|f| document.contains(f)) {
            report.add(QualityIssue::warning(format!(
                "No exercises or activities found (expected one of: {})",
                EXERCISE_FIELD_ALIASES.join(", ")
            )));
        }
    }

    fn check_schema_coverage(
        document: &ContentDocument,
        schema: &Schema,
        report: &mut QualityReport,
    ) {
        for property in schema.property_names() {
            if !document.contains(property) {
                report.add(QualityIssue::info("Schema property missing from content").at(property));
            }
        }

        for required in schema.required_names() {
            if !document.contains(required) {
                report.add(QualityIssue::warning("Required field missing from content").at(required));
            }
        }
    }
}
