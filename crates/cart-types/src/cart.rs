use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset_id::ModelAssetId;

/// Component key holding the custom model data of an item.
pub const CUSTOM_MODEL_DATA_COMPONENT: &str = "minecraft:custom_model_data";

/// Type tag of an attachment node.
///
/// Tags the editor does not know are kept verbatim in [`AttachmentType::Other`]
/// so they survive a load/save cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttachmentType {
    #[default]
    Empty,
    Item,
    Model,
    Seat,
    Hitbox,
    Text,
    Platform,
    Sound,
    Generic,
    Other(String),
}

impl AttachmentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Empty => "EMPTY",
            Self::Item => "ITEM",
            Self::Model => "MODEL",
            Self::Seat => "SEAT",
            Self::Hitbox => "HITBOX",
            Self::Text => "TEXT",
            Self::Platform => "PLATFORM",
            Self::Sound => "SOUND",
            Self::Generic => "GENERIC",
            Self::Other(tag) => tag,
        }
    }

    /// Whether the renderer draws a mesh for this node.
    ///
    /// Seats and hitboxes are interaction volumes; sounds have no geometry.
    pub fn is_renderable(&self) -> bool {
        match self {
            Self::Seat | Self::Hitbox | Self::Sound => false,
            Self::Empty
            | Self::Item
            | Self::Model
            | Self::Text
            | Self::Platform
            | Self::Generic
            | Self::Other(_) => true,
        }
    }
}

impl From<String> for AttachmentType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "EMPTY" => Self::Empty,
            "ITEM" => Self::Item,
            "MODEL" => Self::Model,
            "SEAT" => Self::Seat,
            "HITBOX" => Self::Hitbox,
            "TEXT" => Self::Text,
            "PLATFORM" => Self::Platform,
            "SOUND" => Self::Sound,
            "GENERIC" => Self::Generic,
            _ => Self::Other(tag),
        }
    }
}

impl From<AttachmentType> for String {
    fn from(kind: AttachmentType) -> Self {
        match kind {
            AttachmentType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AttachmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn one() -> f64 {
    1.0
}

/// Position, rotation and scale of a node relative to its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub pos_x: f64,
    #[serde(default)]
    pub pos_y: f64,
    #[serde(default)]
    pub pos_z: f64,
    #[serde(default)]
    pub rot_x: f64,
    #[serde(default)]
    pub rot_y: f64,
    #[serde(default)]
    pub rot_z: f64,
    #[serde(default = "one")]
    pub size_x: f64,
    #[serde(default = "one")]
    pub size_y: f64,
    #[serde(default = "one")]
    pub size_z: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            size_x: 1.0,
            size_y: 1.0,
            size_z: 1.0,
            extra: Map::new(),
        }
    }
}

/// Typed view of the `minecraft:custom_model_data` component.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CustomModelData {
    #[serde(default)]
    pub floats: Vec<f64>,
}

/// Inventory item displayed by a node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemPayload {
    /// Item carrying a single custom model id.
    pub fn with_model_id(id: ModelAssetId) -> Self {
        let mut components = Map::new();
        components.insert(
            CUSTOM_MODEL_DATA_COMPONENT.into(),
            serde_json::json!({ "floats": [id.get()] }),
        );
        Self {
            components,
            extra: Map::new(),
        }
    }

    /// The custom model data component, if present and well-formed.
    pub fn custom_model_data(&self) -> Option<CustomModelData> {
        let raw = self.components.get(CUSTOM_MODEL_DATA_COMPONENT)?;
        CustomModelData::deserialize(raw).ok()
    }

    /// Model asset ids referenced by this item, in payload order.
    pub fn model_ids(&self) -> impl Iterator<Item = ModelAssetId> {
        self.custom_model_data()
            .map(|data| data.floats)
            .unwrap_or_default()
            .into_iter()
            .filter_map(ModelAssetId::from_float)
    }
}

/// A child node of the object tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", default)]
    pub kind: AttachmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Transform>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attachments: BTreeMap<String, Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    pub fn new(kind: AttachmentType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: ItemPayload) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, child: Attachment) -> Self {
        self.attachments.insert(name.into(), child);
        self
    }
}

/// Root mesh node of a cart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttachmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Transform>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attachments: BTreeMap<String, Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    pub fn with_child(mut self, name: impl Into<String>, child: Attachment) -> Self {
        self.attachments.insert(name.into(), child);
        self
    }
}

/// The root of the editable object tree, persisted as `cart.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub flipped: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cart {
    pub fn with_model(model: Model) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }
}
