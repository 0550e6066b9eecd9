use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{ContainerError, ContainerResult};
use crate::SIGNATURE;

/// Named entries decoded from a container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerEntries {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ContainerEntries {
    /// Bytes of the entry called `name`.
    pub fn get(&self, name: &str) -> ContainerResult<&[u8]> {
        self.entries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ContainerError::EntryNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<u8>> {
        self.entries
    }
}

impl From<BTreeMap<String, Vec<u8>>> for ContainerEntries {
    fn from(entries: BTreeMap<String, Vec<u8>>) -> Self {
        Self { entries }
    }
}

/// Check the signature and unpack every file entry of the archive.
///
/// The signature is verified before any decompression is attempted.
pub fn decode(bytes: &[u8]) -> ContainerResult<ContainerEntries> {
    check_signature(bytes)?;

    let archive_bytes = &bytes[SIGNATURE.len()..];
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| ContainerError::CorruptArchive(e.to_string()))?;

    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ContainerError::CorruptArchive(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        // The declared size is untrusted; it only sizes the initial buffer.
        let hint = usize::try_from(file.size())
            .map_or(archive_bytes.len(), |n| n.min(archive_bytes.len()));
        let mut data = Vec::with_capacity(hint);
        file.read_to_end(&mut data)
            .map_err(|e| ContainerError::CorruptArchive(format!("{name}: {e}")))?;
        if entries.insert(name.clone(), data).is_some() {
            warn!(entry = %name, "duplicate container entry; keeping the last one");
        }
    }

    debug!(entries = entries.len(), encoded_len = bytes.len(), "container decoded");
    Ok(ContainerEntries { entries })
}

/// Read and decode a container file from disk.
pub fn open(path: &Path) -> ContainerResult<ContainerEntries> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

fn check_signature(bytes: &[u8]) -> ContainerResult<()> {
    let prefix = &bytes[..bytes.len().min(SIGNATURE.len())];
    if prefix != SIGNATURE.as_slice() {
        return Err(ContainerError::InvalidSignature {
            expected: hex::encode(SIGNATURE),
            actual: hex::encode(prefix),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_invalid_signature() {
        let err = decode(&SIGNATURE[..3]).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidSignature { .. }));
    }

    #[test]
    fn empty_input_is_invalid_signature() {
        let err = decode(&[]).unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[test]
    fn signature_mismatch_reports_hex() {
        let err = decode(b"PK\x03\x04abcdef").unwrap_err();
        match err {
            ContainerError::InvalidSignature { expected, actual } => {
                assert_eq!(expected, hex::encode(SIGNATURE));
                assert_eq!(actual, "504b03046162");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn signature_without_archive_is_corrupt() {
        let mut bytes = SIGNATURE.to_vec();
        bytes.extend_from_slice(b"not a zip archive");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::CorruptArchive(_)));
        assert!(err.is_invalid_format());
    }

    #[test]
    fn missing_entry_is_not_a_format_error() {
        let entries = ContainerEntries::default();
        let err = entries.get("cart.json").unwrap_err();
        assert!(matches!(err, ContainerError::EntryNotFound(ref n) if n == "cart.json"));
        assert!(!err.is_invalid_format());
    }
}
