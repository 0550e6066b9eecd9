use cart_assets::{RegistryError, TranscodeError};
use cart_container::ContainerError;
use cart_schema::SchemaIssue;
use cart_types::ModelAssetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no document is open")]
    NoDocument,

    #[error("not a project file: {0}")]
    InvalidFormat(#[source] ContainerError),

    #[error("project failed validation with {} issue(s)", issues.len())]
    SchemaValidation { issues: Vec<SchemaIssue> },

    #[error("no asset stored for model {0}")]
    MissingAsset(ModelAssetId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not convert model {id} to GLB: {source}")]
    Transcode {
        id: ModelAssetId,
        #[source]
        source: TranscodeError,
    },

    #[error("could not encode project file: {0}")]
    Encode(#[source] ContainerError),

    #[error("asset registry error: {0}")]
    Asset(#[from] RegistryError),

    #[error("another save or load is in progress")]
    Busy,

    #[error("guideline index {index} out of range ({len} guidelines)")]
    GuidelineOutOfRange { index: usize, len: usize },

    /// JSON has no representation for NaN or infinity.
    #[error("{entry} cannot be saved: {path} is not a finite number")]
    NonFinite { entry: &'static str, path: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocumentError {
    /// Schema issues carried by a validation failure; empty for other errors.
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            Self::SchemaValidation { issues } => issues,
            _ => &[],
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
