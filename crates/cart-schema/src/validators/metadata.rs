use std::str::FromStr;

use cart_types::{GuidelinePlane, CURRENT_SCHEMA_VERSION};
use chrono::DateTime;
use serde_json::{Map, Value};

use super::{expect_bool, expect_number, expect_object, expect_string, optional, required};
use crate::report::{join, ValidationReport};
use crate::schema::SchemaValidator;

/// Validator for `metadata.json`.
#[derive(Clone, Debug)]
pub struct MetadataSchema {
    max_version: u32,
}

impl MetadataSchema {
    pub fn new() -> Self {
        Self {
            max_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Accept payloads up to `max_version` instead of the current version.
    pub fn with_max_version(max_version: u32) -> Self {
        Self { max_version }
    }

    fn check_version(&self, report: &mut ValidationReport, path: &str, value: &Value) {
        match value.as_u64() {
            Some(version) if version > u64::from(self.max_version) => report.push(
                path,
                format!(
                    "schema version {version} is newer than supported version {}",
                    self.max_version
                ),
            ),
            Some(_) => {}
            None => report.push(path, "expected a non-negative integer"),
        }
    }
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator for MetadataSchema {
    fn name(&self) -> &str {
        "metadata"
    }

    fn validate(&self, value: &Value) -> ValidationReport {
        let mut report = ValidationReport::new(self.name());
        let Some(root) = expect_object(&mut report, "/", value) else {
            return report;
        };

        if let Some((path, version)) = required(&mut report, root, "/", "schemaVersion") {
            self.check_version(&mut report, &path, version);
        }
        if let Some((path, name)) = required(&mut report, root, "/", "projectName") {
            expect_string(&mut report, &path, name);
        }
        for key in ["createdAt", "lastModifiedAt"] {
            if let Some((path, stamp)) = optional(root, "/", key) {
                check_timestamp(&mut report, &path, stamp);
            }
        }
        if let Some((path, orbit)) = optional(root, "/", "orbitControls") {
            check_orbit_controls(&mut report, &path, orbit);
        }
        if let Some(guidelines) = root.get("guidelines") {
            let path = join("/", "guidelines");
            match guidelines.as_array() {
                Some(list) => {
                    for (i, guideline) in list.iter().enumerate() {
                        check_guideline(&mut report, &join(&path, &i.to_string()), guideline);
                    }
                }
                None => report.push(path, "expected an array"),
            }
        }
        report
    }
}

fn check_timestamp(report: &mut ValidationReport, path: &str, value: &Value) {
    match value.as_str() {
        Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => {}
        Some(s) => report.push(path, format!("{s:?} is not an RFC 3339 timestamp")),
        None => report.push(path, "expected an RFC 3339 timestamp or null"),
    }
}

fn check_vec3(report: &mut ValidationReport, path: &str, value: &Value) {
    let Some(object) = expect_object(report, path, value) else {
        return;
    };
    for axis in ["x", "y", "z"] {
        if let Some((path, n)) = required(report, object, path, axis) {
            expect_number(report, &path, n);
        }
    }
}

fn check_orbit_controls(report: &mut ValidationReport, path: &str, value: &Value) {
    let Some(object) = expect_object(report, path, value) else {
        return;
    };
    for key in ["position", "target"] {
        if let Some((path, v)) = required(report, object, path, key) {
            check_vec3(report, &path, v);
        }
    }
    if let Some((path, zoom)) = required(report, object, path, "zoom") {
        expect_number(report, &path, zoom);
    }
}

fn check_guideline(report: &mut ValidationReport, path: &str, value: &Value) {
    let Some(object) = expect_object(report, path, value) else {
        return;
    };

    if let Some((path, plane)) = required(report, object, path, "plane") {
        if let Some(s) = expect_string(report, &path, plane) {
            if GuidelinePlane::from_str(s).is_err() {
                report.push(path, format!("unknown plane {s:?}, expected xy, xz or yz"));
            }
        }
    }
    if let Some((path, position)) = required(report, object, path, "position") {
        check_vec3(report, &path, position);
    }
    for key in ["cellSize", "sectionSize"] {
        check_positive(report, object, path, key);
    }
    if let Some((path, color)) = required(report, object, path, "cellColor") {
        if let Some(s) = expect_string(report, &path, color) {
            if !is_hex_color(s) {
                report.push(path, format!("{s:?} is not a #rrggbb colour"));
            }
        }
    }
    if let Some((path, visible)) = required(report, object, path, "visible") {
        expect_bool(report, &path, visible);
    }
}

fn check_positive(report: &mut ValidationReport, object: &Map<String, Value>, parent: &str, key: &str) {
    if let Some((path, value)) = required(report, object, parent, key) {
        if let Some(n) = expect_number(report, &path, value) {
            if n <= 0.0 {
                report.push(path, format!("must be greater than zero, found {n}"));
            }
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_types::{Guideline, Metadata, OrbitControls};
    use serde_json::json;

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn serialized_metadata_is_valid() {
        let mut meta = Metadata::new("Coach");
        meta.orbit_controls = Some(OrbitControls::default());
        meta.guidelines.push(Guideline::default());
        let value = serde_json::to_value(meta.stamped(chrono::Utc::now())).unwrap();
        let report = MetadataSchema::new().validate(&value);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn unknown_fields_are_accepted() {
        let value = json!({"schemaVersion": 0, "projectName": "x", "theme": "dark"});
        assert!(MetadataSchema::new().validate(&value).is_valid());
    }

    #[test]
    fn root_must_be_object() {
        let report = MetadataSchema::new().validate(&json!([1, 2]));
        assert_eq!(paths(&report), vec!["/"]);
    }

    #[test]
    fn missing_required_fields() {
        let report = MetadataSchema::new().validate(&json!({}));
        assert_eq!(paths(&report), vec!["/schemaVersion", "/projectName"]);
    }

    #[test]
    fn rejects_newer_schema_version() {
        let value = json!({"schemaVersion": 3, "projectName": "x"});
        let report = MetadataSchema::new().validate(&value);
        assert!(report.issues[0].message.contains("newer"));
        assert!(MetadataSchema::with_max_version(3).validate(&value).is_valid());
    }

    #[test]
    fn rejects_negative_or_fractional_version() {
        for version in [json!(-1), json!(0.5), json!("0")] {
            let value = json!({"schemaVersion": version, "projectName": "x"});
            assert!(!MetadataSchema::new().validate(&value).is_valid());
        }
    }

    #[test]
    fn timestamps_are_nullable_rfc3339() {
        let ok = json!({
            "schemaVersion": 0,
            "projectName": "x",
            "createdAt": null,
            "lastModifiedAt": "2024-05-01T12:00:00Z"
        });
        assert!(MetadataSchema::new().validate(&ok).is_valid());

        let bad = json!({"schemaVersion": 0, "projectName": "x", "createdAt": "yesterday"});
        let report = MetadataSchema::new().validate(&bad);
        assert_eq!(paths(&report), vec!["/createdAt"]);
    }

    #[test]
    fn orbit_controls_shape() {
        let value = json!({
            "schemaVersion": 0,
            "projectName": "x",
            "orbitControls": {"position": {"x": 1, "y": 2}, "target": {"x": 0, "y": 0, "z": 0}}
        });
        let report = MetadataSchema::new().validate(&value);
        assert_eq!(
            paths(&report),
            vec!["/orbitControls/position/z", "/orbitControls/zoom"]
        );
    }

    #[test]
    fn guideline_issues_carry_index() {
        let value = json!({
            "schemaVersion": 0,
            "projectName": "x",
            "guidelines": [
                {"plane": "xz", "position": {"x": 0, "y": 0, "z": 0}, "cellSize": 1,
                 "sectionSize": 16, "cellColor": "#6f6f6f", "visible": true},
                {"plane": "zz", "position": {"x": 0, "y": 0, "z": 0}, "cellSize": 0,
                 "sectionSize": 16, "cellColor": "grey", "visible": "yes"}
            ]
        });
        let report = MetadataSchema::new().validate(&value);
        assert_eq!(
            paths(&report),
            vec![
                "/guidelines/1/plane",
                "/guidelines/1/cellSize",
                "/guidelines/1/cellColor",
                "/guidelines/1/visible",
            ]
        );
    }

    #[test]
    fn guidelines_must_be_array() {
        let value = json!({"schemaVersion": 0, "projectName": "x", "guidelines": null});
        let report = MetadataSchema::new().validate(&value);
        assert_eq!(paths(&report), vec!["/guidelines"]);
    }

    #[test]
    fn hex_colours() {
        assert!(is_hex_color("#A0b1C2"));
        assert!(!is_hex_color("#abc"));
        assert!(!is_hex_color("a0b1c2f"));
        assert!(!is_hex_color("#gggggg"));
    }
}
