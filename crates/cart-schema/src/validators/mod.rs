pub mod cart;
pub mod metadata;

use serde_json::{Map, Value};

use crate::report::{join, ValidationReport};

pub(crate) fn expect_object<'v>(
    report: &mut ValidationReport,
    path: &str,
    value: &'v Value,
) -> Option<&'v Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        report.push(path, format!("expected an object, found {}", kind(value)));
    }
    object
}

pub(crate) fn expect_string<'v>(
    report: &mut ValidationReport,
    path: &str,
    value: &'v Value,
) -> Option<&'v str> {
    let s = value.as_str();
    if s.is_none() {
        report.push(path, format!("expected a string, found {}", kind(value)));
    }
    s
}

pub(crate) fn expect_bool(report: &mut ValidationReport, path: &str, value: &Value) {
    if !value.is_boolean() {
        report.push(path, format!("expected a boolean, found {}", kind(value)));
    }
}

pub(crate) fn expect_number(report: &mut ValidationReport, path: &str, value: &Value) -> Option<f64> {
    let n = value.as_f64();
    if n.is_none() {
        report.push(path, format!("expected a number, found {}", kind(value)));
    }
    n
}

/// Look up a field that must be present; reports it when missing.
pub(crate) fn required<'v>(
    report: &mut ValidationReport,
    object: &'v Map<String, Value>,
    parent: &str,
    key: &str,
) -> Option<(String, &'v Value)> {
    let path = join(parent, key);
    match object.get(key) {
        Some(value) => Some((path, value)),
        None => {
            report.push(path, "missing required field");
            None
        }
    }
}

/// Look up a field where absence and `null` mean the same thing.
pub(crate) fn optional<'v>(
    object: &'v Map<String, Value>,
    parent: &str,
    key: &str,
) -> Option<(String, &'v Value)> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some((join(parent, key), value)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
