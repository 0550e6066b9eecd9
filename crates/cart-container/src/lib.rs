//! Container file format for cart projects.
//!
//! A project file is a fixed signature followed by a zip archive of named
//! entries:
//!
//! ```text
//! [6 bytes: SIGNATURE][zip archive, every entry deflated at level 9]
//! ```
//!
//! The signature is a fingerprint only; format versioning lives inside the
//! payloads. The codec never interprets entry contents and never decides
//! which entries are required -- lookups of absent names yield
//! [`ContainerError::EntryNotFound`] and the caller judges severity.
//!
//! - [`encode`] / [`ContainerWriter`]: build a container
//! - [`decode`] / [`ContainerEntries`]: read one back, rejecting foreign
//!   files before any decompression

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{ContainerError, ContainerResult};
pub use reader::{decode, open, ContainerEntries};
pub use writer::{encode, ContainerWriter, COMPRESSION_LEVEL};

/// Leading bytes of every container: U+1F98A FOX FACE in UTF-8, then `TC`.
pub const SIGNATURE: [u8; 6] = [0xF0, 0x9F, 0xA6, 0x8A, b'T', b'C'];
