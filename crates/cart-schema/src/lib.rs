//! Structural validation for the JSON payloads inside a project file.
//!
//! Each payload (`metadata.json`, `cart.json`) has a [`SchemaValidator`]. A
//! validator collects every issue it finds, each located by a pointer path,
//! so a loader can report all problems at once instead of the first one.
//!
//! # Quick Start
//!
//! ```rust
//! use cart_schema::{validate_json, CartSchema, SchemaValidator};
//!
//! let value = validate_json(&CartSchema, br#"{"flipped": false}"#).unwrap();
//! assert!(CartSchema.validate(&value).is_valid());
//! ```

pub mod error;
pub mod report;
pub mod schema;
pub mod validators;

pub use error::{SchemaError, SchemaResult};
pub use report::{SchemaIssue, ValidationReport};
pub use schema::{validate_json, SchemaValidator};
pub use validators::cart::CartSchema;
pub use validators::metadata::MetadataSchema;
