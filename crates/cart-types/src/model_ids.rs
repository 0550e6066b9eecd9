//! Derivation of the model asset ids referenced by a cart.

use std::collections::BTreeSet;

use tracing::warn;

use crate::asset_id::ModelAssetId;
use crate::cart::{Attachment, AttachmentType, Cart, Model};
use crate::visit::{walk_cart, CartVisitor};

/// Default nesting bound for attachment trees.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Result of scanning a cart for model ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelIdScan {
    /// Distinct ids, ascending.
    pub ids: Vec<ModelAssetId>,
    /// Attachment paths whose subtrees were skipped for exceeding the depth bound.
    pub truncated: Vec<String>,
}

impl ModelIdScan {
    pub fn is_truncated(&self) -> bool {
        !self.truncated.is_empty()
    }
}

#[derive(Default)]
struct ModelIdCollector {
    ids: BTreeSet<ModelAssetId>,
    truncated: Vec<String>,
}

impl CartVisitor for ModelIdCollector {
    fn visit_model(&mut self, model: &Model) {
        if let Some(item) = &model.item {
            self.ids.extend(item.model_ids());
        }
    }

    fn visit_attachment(&mut self, _path: &[&str], attachment: &Attachment) {
        // Every tag may carry an item payload, including interaction volumes.
        match &attachment.kind {
            AttachmentType::Empty
            | AttachmentType::Item
            | AttachmentType::Model
            | AttachmentType::Seat
            | AttachmentType::Hitbox
            | AttachmentType::Text
            | AttachmentType::Platform
            | AttachmentType::Sound
            | AttachmentType::Generic
            | AttachmentType::Other(_) => {
                if let Some(item) = &attachment.item {
                    self.ids.extend(item.model_ids());
                }
            }
        }
    }

    fn depth_exceeded(&mut self, path: &[&str]) {
        self.truncated.push(path.join("/"));
    }
}

/// Sorted, de-duplicated model ids referenced anywhere in `cart`.
///
/// `None` and carts without a model yield an empty list.
pub fn model_ids(cart: Option<&Cart>) -> Vec<ModelAssetId> {
    scan_model_ids(cart, DEFAULT_MAX_DEPTH).ids
}

/// Like [`model_ids`], with an explicit depth bound and truncation report.
pub fn scan_model_ids(cart: Option<&Cart>, max_depth: usize) -> ModelIdScan {
    let Some(cart) = cart else {
        return ModelIdScan::default();
    };

    let mut collector = ModelIdCollector::default();
    walk_cart(cart, &mut collector, max_depth);

    if !collector.truncated.is_empty() {
        warn!(
            max_depth,
            skipped = collector.truncated.len(),
            "attachment tree exceeds depth bound; deeper model ids ignored"
        );
    }

    ModelIdScan {
        ids: collector.ids.into_iter().collect(),
        truncated: collector.truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ItemPayload;
    use proptest::prelude::*;
    use serde_json::json;

    fn item(ids: &[u32]) -> ItemPayload {
        serde_json::from_value(json!({
            "components": {"minecraft:custom_model_data": {"floats": ids}}
        }))
        .unwrap()
    }

    #[test]
    fn none_and_empty_carts_have_no_ids() {
        assert!(model_ids(None).is_empty());
        assert!(model_ids(Some(&Cart::default())).is_empty());
        assert!(model_ids(Some(&Cart::with_model(Model::default()))).is_empty());
    }

    #[test]
    fn single_attachment_id() {
        let cart: Cart = serde_json::from_value(json!({
            "model": {"attachments": {"a": {
                "type": "GENERIC",
                "item": {"components": {"minecraft:custom_model_data": {"floats": [7]}}}
            }}}
        }))
        .unwrap();
        assert_eq!(model_ids(Some(&cart)), vec![ModelAssetId::new(7)]);
    }

    #[test]
    fn collects_root_and_nested_ids_sorted_and_unique() {
        let mut model = Model::default();
        model.item = Some(item(&[30, 2]));
        let cart = Cart::with_model(
            model
                .with_child(
                    "body",
                    Attachment::new(AttachmentType::Item)
                        .with_item(item(&[5, 2]))
                        .with_child(
                            "seat",
                            Attachment::new(AttachmentType::Seat).with_item(item(&[11])),
                        ),
                )
                .with_child("roof", Attachment::new(AttachmentType::Empty)),
        );
        let ids: Vec<u32> = model_ids(Some(&cart)).iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![2, 5, 11, 30]);
    }

    #[test]
    fn non_integral_floats_are_ignored() {
        let cart: Cart = serde_json::from_value(json!({
            "model": {"attachments": {"a": {
                "type": "ITEM",
                "item": {"components": {"minecraft:custom_model_data": {"floats": [1.5, -2, 4]}}}
            }}}
        }))
        .unwrap();
        assert_eq!(model_ids(Some(&cart)), vec![ModelAssetId::new(4)]);
    }

    #[test]
    fn every_tag_contributes_ids() {
        let tags = [
            AttachmentType::Empty,
            AttachmentType::Seat,
            AttachmentType::Hitbox,
            AttachmentType::Sound,
            AttachmentType::Other("FLAG".into()),
        ];
        let mut model = Model::default();
        for (i, tag) in tags.into_iter().enumerate() {
            model = model.with_child(
                format!("n{i}"),
                Attachment::new(tag).with_item(item(&[i as u32 + 1])),
            );
        }
        let ids: Vec<u32> = model_ids(Some(&Cart::with_model(model)))
            .iter()
            .map(|id| id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deep_trees_are_truncated_not_fatal() {
        let mut node = Attachment::new(AttachmentType::Item).with_item(item(&[99]));
        for _ in 0..9 {
            node = Attachment::new(AttachmentType::Empty).with_child("c", node);
        }
        let mut root = Model::default().with_child("c", node);
        root.item = Some(item(&[1]));
        let cart = Cart::with_model(root);

        let scan = scan_model_ids(Some(&cart), 4);
        assert!(scan.is_truncated());
        assert_eq!(scan.ids, vec![ModelAssetId::new(1)]);
        assert_eq!(scan.truncated, vec!["c/c/c/c/c"]);

        let full = scan_model_ids(Some(&cart), DEFAULT_MAX_DEPTH);
        assert!(!full.is_truncated());
        assert_eq!(full.ids, vec![ModelAssetId::new(1), ModelAssetId::new(99)]);
    }

    fn arb_attachment() -> impl Strategy<Value = Attachment> {
        let leaf = prop::collection::vec(0u32..50, 0..4)
            .prop_map(|ids| Attachment::new(AttachmentType::Item).with_item(item(&ids)));
        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                prop::collection::vec(0u32..50, 0..4),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4),
            )
                .prop_map(|(ids, children)| {
                    let mut node = Attachment::new(AttachmentType::Model).with_item(item(&ids));
                    node.attachments = children;
                    node
                })
        })
    }

    proptest! {
        #[test]
        fn ids_are_sorted_and_unique(
            children in prop::collection::btree_map("[a-z]{1,3}", arb_attachment(), 0..5)
        ) {
            let mut model = Model::default();
            model.attachments = children;
            let ids = model_ids(Some(&Cart::with_model(model)));
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
