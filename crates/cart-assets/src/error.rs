use cart_types::ModelAssetId;

/// Errors from asset registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The handle host could not provide a display handle.
    #[error("no display handle available for model {id}: {reason}")]
    HandleUnavailable { id: ModelAssetId, reason: String },
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors from glTF to GLB conversion.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// The input is not a glTF JSON document.
    #[error("invalid glTF document: {0}")]
    InvalidGltf(String),

    /// The document points at a resource outside itself.
    #[error("glTF references external resource {0:?}")]
    ExternalResource(String),

    /// The output would not fit the 32-bit GLB length fields.
    #[error("GLB output too large: {0} bytes")]
    TooLarge(usize),
}
