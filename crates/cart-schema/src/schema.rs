use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::report::ValidationReport;

/// A structural check over one kind of JSON payload.
///
/// Validators are permissive about fields they do not know; they only reject
/// values that a reader of the payload could not interpret.
pub trait SchemaValidator: Send + Sync {
    /// Short name used in reports and logs (e.g. "metadata").
    fn name(&self) -> &str;

    /// Check `value`, collecting every issue rather than stopping at the first.
    fn validate(&self, value: &Value) -> ValidationReport;
}

/// Parse `bytes` as JSON and run `validator` over the result.
///
/// Returns the parsed value when it has no issues.
pub fn validate_json(validator: &dyn SchemaValidator, bytes: &[u8]) -> SchemaResult<Value> {
    let start = Instant::now();
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    let report = validator.validate(&value);
    debug!(
        validator = validator.name(),
        issues = report.issues.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "payload validated"
    );
    if report.is_valid() {
        Ok(value)
    } else {
        Err(SchemaError::Invalid(report))
    }
}
