//! The open cart project and its persistence.
//!
//! A [`DocumentStore`] holds the project metadata, the cart tree, the model
//! assets the cart references and the file the project was last saved to.
//! It tracks whether anything worth saving changed, writes project files in
//! place or to a new location, and loads them back with every JSON entry
//! validated before anything is adopted.
//!
//! # Project files
//!
//! ```text
//! [6-byte signature][zip archive]
//!   metadata.json     required
//!   cart.json         required
//!   models/{id}.glb   one per stored model
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod file;
pub mod layout;
pub mod shared;
pub mod store;

pub use config::{ConfigError, ConfigResult, StoreConfig};
pub use error::{DocumentError, DocumentResult};
pub use events::{DocumentEvent, EventStream, Operation, OperationStatus};
pub use file::{
    CancelPicker, FileHandle, FixedPathPicker, FsFileHandle, MemoryFileHandle, MemoryPicker,
    SaveLocationPicker,
};
pub use shared::SharedDocumentStore;
pub use store::{DocumentState, DocumentStore, LoadReport, SaveOutcome, SaveReport, Validators};

pub use cart_schema::SchemaIssue;
pub use cart_types::{Cart, Guideline, Metadata, ModelAssetId, OrbitControls};
