//! Document model for cart projects.
//!
//! A project is a pair of JSON payloads -- [`Metadata`] and [`Cart`] -- plus a
//! set of binary model assets. The cart is a recursive tree of named
//! [`Attachment`] nodes under a root [`Model`]; nodes reference model assets
//! only indirectly, through numeric ids in their item payloads.
//!
//! # Key Types
//!
//! - [`Metadata`] — project name, timestamps, camera state, [`Guideline`]s
//! - [`Cart`] / [`Model`] / [`Attachment`] — the owned object tree
//! - [`ModelAssetId`] — id of an external 3D model asset
//!
//! # Model ids
//!
//! [`model_ids`] derives the sorted set of asset ids referenced anywhere in a
//! cart, using the typed [`CartVisitor`] walk. The set is never stored; callers
//! recompute it whenever the cart is replaced.

pub mod asset_id;
pub mod cart;
pub mod error;
mod finite;
pub mod metadata;
pub mod model_ids;
pub mod visit;

pub use asset_id::ModelAssetId;
pub use cart::{
    Attachment, AttachmentType, Cart, CustomModelData, ItemPayload, Model, Transform,
    CUSTOM_MODEL_DATA_COMPONENT,
};
pub use error::TypeError;
pub use metadata::{
    Guideline, GuidelinePlane, Metadata, OrbitControls, Vec3, CURRENT_SCHEMA_VERSION,
};
pub use model_ids::{model_ids, scan_model_ids, ModelIdScan, DEFAULT_MAX_DEPTH};
pub use visit::{walk_cart, CartVisitor};
