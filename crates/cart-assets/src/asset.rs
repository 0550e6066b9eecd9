use std::fmt;

use bytes::Bytes;
use cart_types::ModelAssetId;

use crate::handle::DisplayHandle;

/// Magic bytes opening every binary glTF file.
pub const GLB_MAGIC: [u8; 4] = *b"glTF";

/// Encoding of a stored model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// Binary glTF container.
    Glb,
    /// Textual glTF JSON.
    Gltf,
}

impl ModelFormat {
    /// Detect the format from the first four bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&GLB_MAGIC) {
            Self::Glb
        } else {
            Self::Gltf
        }
    }

    /// MIME type handed to display handles.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Glb => "model/gltf-binary",
            Self::Gltf => "model/gltf+json",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glb => f.write_str("glb"),
            Self::Gltf => f.write_str("gltf"),
        }
    }
}

/// One model held by an [`AssetRegistry`](crate::AssetRegistry).
///
/// Consumers borrow the asset; the registry alone releases its handle.
#[derive(Debug)]
pub struct ModelAsset {
    pub(crate) id: ModelAssetId,
    pub(crate) bytes: Bytes,
    pub(crate) format: ModelFormat,
    pub(crate) handle: DisplayHandle,
}

impl ModelAsset {
    pub fn id(&self) -> ModelAssetId {
        self.id
    }

    /// Raw bytes as supplied to the registry.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn handle(&self) -> &DisplayHandle {
        &self.handle
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_binary_gltf() {
        assert_eq!(ModelFormat::detect(b"glTF\x02\x00\x00\x00"), ModelFormat::Glb);
    }

    #[test]
    fn anything_else_is_textual() {
        assert_eq!(ModelFormat::detect(b"{\"asset\":{}}"), ModelFormat::Gltf);
        assert_eq!(ModelFormat::detect(b"glT"), ModelFormat::Gltf);
        assert_eq!(ModelFormat::detect(b"GLTF"), ModelFormat::Gltf);
        assert_eq!(ModelFormat::detect(b""), ModelFormat::Gltf);
    }

    #[test]
    fn content_types() {
        assert_eq!(ModelFormat::Glb.content_type(), "model/gltf-binary");
        assert_eq!(ModelFormat::Gltf.content_type(), "model/gltf+json");
    }
}
