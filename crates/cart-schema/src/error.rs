use crate::report::ValidationReport;

/// Errors from parsing and validating a JSON payload.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The payload is not JSON at all.
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// The payload parsed but failed its schema.
    #[error("{} schema violation(s) reported by {}", .0.issues.len(), .0.validator)]
    Invalid(ValidationReport),
}

impl SchemaError {
    /// Flatten into a report, so malformed input reads like any other issue.
    pub fn into_report(self, validator: &str) -> ValidationReport {
        match self {
            Self::Malformed(message) => {
                let mut report = ValidationReport::new(validator);
                report.push("/", message);
                report
            }
            Self::Invalid(report) => report,
        }
    }
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
