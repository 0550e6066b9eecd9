//! Model asset storage for cart projects.
//!
//! An [`AssetRegistry`] owns the binary model files a project references,
//! keyed by [`ModelAssetId`](cart_types::ModelAssetId). Each stored asset is
//! paired with a [`DisplayHandle`] issued by a [`HandleHost`]; the registry is
//! the only party that releases handles.
//!
//! # Handle lifecycle
//!
//! 1. `set` releases the previous handle for the id before acquiring a new one.
//! 2. `remove` and `clear` release before discarding.
//! 3. Dropping the registry releases whatever is still held.
//!
//! Textual glTF models are converted to GLB on save through a
//! [`GlbTranscoder`]; [`EmbeddedGltfTranscoder`] handles self-contained
//! documents.

pub mod asset;
pub mod error;
pub mod handle;
pub mod registry;
pub mod transcode;

pub use asset::{ModelAsset, ModelFormat, GLB_MAGIC};
pub use error::{RegistryError, RegistryResult, TranscodeError};
pub use handle::{BlobUrlHost, DisplayHandle, HandleHost};
pub use registry::AssetRegistry;
pub use transcode::{EmbeddedGltfTranscoder, GlbTranscoder};
