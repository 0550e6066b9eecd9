use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("invalid container signature: expected {expected}, got {actual}")]
    InvalidSignature { expected: String, actual: String },

    #[error("corrupt container archive: {0}")]
    CorruptArchive(String),

    #[error("container entry not found: {0}")]
    EntryNotFound(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerError {
    /// Whether the input is not a readable container at all, as opposed to a
    /// readable container lacking something the caller wanted.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, Self::InvalidSignature { .. } | Self::CorruptArchive(_))
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;
