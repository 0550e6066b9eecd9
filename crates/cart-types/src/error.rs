use thiserror::Error;

/// Errors produced by document model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid model asset id: {0:?}")]
    InvalidAssetId(String),

    #[error("invalid guideline plane: {0:?}")]
    InvalidPlane(String),
}
