use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{ContainerError, ContainerResult};
use crate::SIGNATURE;

/// Deflate level used for every entry. Fixed; not a tuning knob.
pub const COMPRESSION_LEVEL: i64 = 9;

/// Builds a container from named entries.
///
/// Entries are written in name order with a fixed modification time, so the
/// same entries always encode to the same bytes.
#[derive(Debug, Default)]
pub struct ContainerWriter {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entry.
    pub fn add_entry(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), data.into());
    }

    /// Number of entries queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the container in memory.
    pub fn finish_to_bytes(self) -> ContainerResult<Vec<u8>> {
        encode(&self.entries)
    }

    /// Encode the container and write it to `path`.
    pub fn finish(self, path: &Path) -> ContainerResult<PathBuf> {
        let bytes = self.finish_to_bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(path.to_path_buf())
    }
}

impl From<BTreeMap<String, Vec<u8>>> for ContainerWriter {
    fn from(entries: BTreeMap<String, Vec<u8>>) -> Self {
        Self { entries }
    }
}

/// Encode `entries` as `SIGNATURE` followed by a deflate zip archive.
pub fn encode(entries: &BTreeMap<String, Vec<u8>>) -> ContainerResult<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut raw_len = 0usize;
    for (name, data) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(|e| ContainerError::CompressionFailed(e.to_string()))?;
        zip.write_all(data)
            .map_err(|e| ContainerError::CompressionFailed(e.to_string()))?;
        raw_len += data.len();
    }
    let archive = zip
        .finish()
        .map_err(|e| ContainerError::CompressionFailed(e.to_string()))?
        .into_inner();

    let mut out = Vec::with_capacity(SIGNATURE.len() + archive.len());
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&archive);

    debug!(
        entries = entries.len(),
        raw_len,
        encoded_len = out.len(),
        "container encoded"
    );
    Ok(out)
}
