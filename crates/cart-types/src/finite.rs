//! Detection of numbers JSON cannot represent.
//!
//! `serde_json` writes NaN and the infinities as `null`, which the payload
//! schemas then reject on load. Saving code checks payloads with these
//! functions first and refuses to write them.

use crate::cart::{Attachment, Cart, Model, Transform};
use crate::metadata::{Metadata, Vec3};
use crate::visit::{walk_cart, CartVisitor};

impl Transform {
    /// JSON name of the first non-finite field, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let fields = [
            ("posX", self.pos_x),
            ("posY", self.pos_y),
            ("posZ", self.pos_z),
            ("rotX", self.rot_x),
            ("rotY", self.rot_y),
            ("rotZ", self.rot_z),
            ("sizeX", self.size_x),
            ("sizeY", self.size_y),
            ("sizeZ", self.size_z),
        ];
        fields
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

impl Vec3 {
    fn non_finite_field(&self) -> Option<&'static str> {
        [("x", self.x), ("y", self.y), ("z", self.z)]
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

impl Metadata {
    /// Pointer to the first NaN or infinite number, e.g. `/guidelines/0/cellSize`.
    pub fn non_finite_path(&self) -> Option<String> {
        if let Some(orbit) = &self.orbit_controls {
            if let Some(axis) = orbit.position.non_finite_field() {
                return Some(format!("/orbitControls/position/{axis}"));
            }
            if let Some(axis) = orbit.target.non_finite_field() {
                return Some(format!("/orbitControls/target/{axis}"));
            }
            if !orbit.zoom.is_finite() {
                return Some("/orbitControls/zoom".into());
            }
        }
        for (i, guideline) in self.guidelines.iter().enumerate() {
            if let Some(axis) = guideline.position.non_finite_field() {
                return Some(format!("/guidelines/{i}/position/{axis}"));
            }
            if !guideline.cell_size.is_finite() {
                return Some(format!("/guidelines/{i}/cellSize"));
            }
            if !guideline.section_size.is_finite() {
                return Some(format!("/guidelines/{i}/sectionSize"));
            }
        }
        None
    }
}

impl Cart {
    /// Pointer to the first NaN or infinite transform value in the tree,
    /// e.g. `/model/attachments/wheel/position/rotY`.
    pub fn non_finite_path(&self) -> Option<String> {
        let mut finder = NonFiniteFinder::default();
        walk_cart(self, &mut finder, usize::MAX);
        finder.found
    }
}

#[derive(Default)]
struct NonFiniteFinder {
    found: Option<String>,
}

impl CartVisitor for NonFiniteFinder {
    fn visit_model(&mut self, model: &Model) {
        if let Some(field) = model.position.as_ref().and_then(Transform::non_finite_field) {
            self.found = Some(format!("/model/position/{field}"));
        }
    }

    fn visit_attachment(&mut self, path: &[&str], attachment: &Attachment) {
        if self.found.is_some() {
            return;
        }
        if let Some(field) = attachment.position.as_ref().and_then(Transform::non_finite_field) {
            let mut pointer = String::from("/model");
            for name in path {
                pointer.push_str("/attachments/");
                pointer.push_str(&name.replace('~', "~0").replace('/', "~1"));
            }
            self.found = Some(format!("{pointer}/position/{field}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::AttachmentType;
    use crate::metadata::{Guideline, OrbitControls};

    fn positioned(transform: Transform) -> Attachment {
        let mut node = Attachment::new(AttachmentType::Item);
        node.position = Some(transform);
        node
    }

    #[test]
    fn finite_documents_pass() {
        let cart = Cart::with_model(
            Model::default().with_child("a", positioned(Transform::default())),
        );
        assert_eq!(cart.non_finite_path(), None);

        let mut meta = Metadata::new("p");
        meta.orbit_controls = Some(OrbitControls::default());
        meta.guidelines.push(Guideline::default());
        assert_eq!(meta.non_finite_path(), None);
    }

    #[test]
    fn reports_nested_transform() {
        let bad = Transform {
            rot_y: f64::NAN,
            ..Transform::default()
        };
        let cart = Cart::with_model(Model::default().with_child(
            "body",
            Attachment::new(AttachmentType::Model).with_child("a/b", positioned(bad)),
        ));
        assert_eq!(
            cart.non_finite_path().as_deref(),
            Some("/model/attachments/body/attachments/a~1b/position/rotY")
        );
    }

    #[test]
    fn reports_root_transform() {
        let mut model = Model::default();
        model.position = Some(Transform {
            size_z: f64::INFINITY,
            ..Transform::default()
        });
        assert_eq!(
            Cart::with_model(model).non_finite_path().as_deref(),
            Some("/model/position/sizeZ")
        );
    }

    #[test]
    fn reports_metadata_fields() {
        let mut meta = Metadata::new("p");
        meta.guidelines.push(Guideline::default());
        meta.guidelines.push(Guideline {
            cell_size: f64::NEG_INFINITY,
            ..Guideline::default()
        });
        assert_eq!(meta.non_finite_path().as_deref(), Some("/guidelines/1/cellSize"));

        let mut meta = Metadata::new("p");
        meta.orbit_controls = Some(OrbitControls {
            zoom: f64::NAN,
            ..OrbitControls::default()
        });
        assert_eq!(meta.non_finite_path().as_deref(), Some("/orbitControls/zoom"));
    }
}
