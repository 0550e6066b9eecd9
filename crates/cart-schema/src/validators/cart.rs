use cart_types::CUSTOM_MODEL_DATA_COMPONENT;
use serde_json::Value;

use super::{expect_bool, expect_number, expect_object, expect_string, optional};
use crate::report::{join, ValidationReport};
use crate::schema::SchemaValidator;

const TRANSFORM_FIELDS: [&str; 9] = [
    "posX", "posY", "posZ", "rotX", "rotY", "rotZ", "sizeX", "sizeY", "sizeZ",
];

/// Validator for `cart.json`.
///
/// Walks the model and its attachment tree, checking only the fields the
/// editor interprets.
#[derive(Clone, Copy, Debug, Default)]
pub struct CartSchema;

impl SchemaValidator for CartSchema {
    fn name(&self) -> &str {
        "cart"
    }

    fn validate(&self, value: &Value) -> ValidationReport {
        let mut report = ValidationReport::new(self.name());
        let Some(root) = expect_object(&mut report, "/", value) else {
            return report;
        };

        if let Some(flipped) = root.get("flipped") {
            expect_bool(&mut report, &join("/", "flipped"), flipped);
        }
        if let Some((path, entity)) = optional(root, "/", "entityType") {
            expect_string(&mut report, &path, entity);
        }
        if let Some((path, model)) = optional(root, "/", "model") {
            check_node(&mut report, &path, model, true);
        }
        report
    }
}

fn check_node(report: &mut ValidationReport, path: &str, value: &Value, is_root: bool) {
    let Some(node) = expect_object(report, path, value) else {
        return;
    };

    // The root model may leave its type null; attachments may only omit it.
    match node.get("type") {
        None => {}
        Some(Value::Null) if is_root => {}
        Some(kind) => {
            expect_string(report, &join(path, "type"), kind);
        }
    }
    if let Some((path, item)) = optional(node, path, "item") {
        check_item(report, &path, item);
    }
    if let Some((path, position)) = optional(node, path, "position") {
        check_transform(report, &path, position);
    }
    if let Some(children) = node.get("attachments") {
        let children_path = join(path, "attachments");
        if let Some(children) = expect_object(report, &children_path, children) {
            for (name, child) in children {
                check_node(report, &join(&children_path, name), child, false);
            }
        }
    }
}

fn check_transform(report: &mut ValidationReport, path: &str, value: &Value) {
    let Some(transform) = expect_object(report, path, value) else {
        return;
    };
    for field in TRANSFORM_FIELDS {
        if let Some(n) = transform.get(field) {
            expect_number(report, &join(path, field), n);
        }
    }
}

fn check_item(report: &mut ValidationReport, path: &str, value: &Value) {
    let Some(item) = expect_object(report, path, value) else {
        return;
    };
    let Some(components) = item.get("components") else {
        return;
    };
    let components_path = join(path, "components");
    let Some(components) = expect_object(report, &components_path, components) else {
        return;
    };
    let Some((data_path, data)) = optional(components, &components_path, CUSTOM_MODEL_DATA_COMPONENT)
    else {
        return;
    };
    let Some(data) = expect_object(report, &data_path, data) else {
        return;
    };
    if let Some(floats) = data.get("floats") {
        let floats_path = join(&data_path, "floats");
        match floats.as_array() {
            Some(list) => {
                for (i, n) in list.iter().enumerate() {
                    expect_number(report, &join(&floats_path, &i.to_string()), n);
                }
            }
            None => report.push(floats_path, "expected an array of numbers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_types::{Attachment, AttachmentType, Cart, ItemPayload, Model, ModelAssetId};
    use serde_json::json;

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn serialized_cart_is_valid() {
        let model = Model::default().with_child(
            "body",
            Attachment::new(AttachmentType::Item)
                .with_item(ItemPayload::with_model_id(ModelAssetId::new(4)))
                .with_child("seat", Attachment::new(AttachmentType::Seat)),
        );
        let value = serde_json::to_value(Cart::with_model(model)).unwrap();
        let report = CartSchema.validate(&value);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn empty_object_is_valid() {
        assert!(CartSchema.validate(&json!({})).is_valid());
        assert!(CartSchema.validate(&json!({"model": null, "entityType": null})).is_valid());
    }

    #[test]
    fn root_must_be_object() {
        let report = CartSchema.validate(&json!("cart"));
        assert_eq!(paths(&report), vec!["/"]);
    }

    #[test]
    fn top_level_field_types() {
        let value = json!({"flipped": "no", "entityType": 7, "model": []});
        let report = CartSchema.validate(&value);
        assert_eq!(paths(&report), vec!["/flipped", "/entityType", "/model"]);
    }

    #[test]
    fn nested_issues_are_located() {
        let value = json!({
            "model": {
                "attachments": {
                    "wheel": {
                        "type": 3,
                        "position": {"posX": "left", "sizeY": 2},
                        "attachments": {
                            "hub": {
                                "item": {
                                    "components": {
                                        "minecraft:custom_model_data": {"floats": [1, "two"]}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let report = CartSchema.validate(&value);
        assert_eq!(
            paths(&report),
            vec![
                "/model/attachments/wheel/type",
                "/model/attachments/wheel/position/posX",
                "/model/attachments/wheel/attachments/hub/item/components/minecraft:custom_model_data/floats/1",
            ]
        );
    }

    #[test]
    fn attachments_must_be_object_of_objects() {
        let value = json!({"model": {"attachments": {"a": 1, "b": {}}}});
        let report = CartSchema.validate(&value);
        assert_eq!(paths(&report), vec!["/model/attachments/a"]);

        let value = json!({"model": {"attachments": null}});
        assert_eq!(paths(&CartSchema.validate(&value)), vec!["/model/attachments"]);
    }

    #[test]
    fn attachment_type_may_not_be_null() {
        let value = json!({"model": {"type": null, "attachments": {"a": {"type": null}}}});
        let report = CartSchema.validate(&value);
        assert_eq!(paths(&report), vec!["/model/attachments/a/type"]);
    }

    #[test]
    fn unknown_fields_are_accepted() {
        let value = json!({
            "animations": [1, 2],
            "model": {"glow": true, "attachments": {"a": {"type": "LIGHT", "color": "red"}}}
        });
        assert!(CartSchema.validate(&value).is_valid());
    }

    #[test]
    fn floats_must_be_array() {
        let value = json!({
            "model": {"item": {"components": {"minecraft:custom_model_data": {"floats": 3}}}}
        });
        let report = CartSchema.validate(&value);
        assert_eq!(
            paths(&report),
            vec!["/model/item/components/minecraft:custom_model_data/floats"]
        );
    }
}
