//! Conversion of textual glTF into binary GLB.
//!
//! GLB layout (all integers little-endian u32):
//!
//! ```text
//! [magic "glTF"][version 2][total length]
//! [chunk length][chunk type "JSON"][JSON, space-padded to 4 bytes]
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::asset::{ModelFormat, GLB_MAGIC};
use crate::error::TranscodeError;

const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;

/// Converts a textual glTF model into GLB bytes.
#[async_trait]
pub trait GlbTranscoder: Send + Sync {
    async fn to_glb(&self, gltf: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Packs self-contained glTF documents into a single-chunk GLB.
///
/// Buffers and images must be embedded as `data:` URIs; the JSON is carried
/// over unchanged apart from re-serialisation. Input that already is GLB is
/// returned as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedGltfTranscoder;

#[async_trait]
impl GlbTranscoder for EmbeddedGltfTranscoder {
    async fn to_glb(&self, gltf: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        if ModelFormat::detect(gltf) == ModelFormat::Glb {
            return Ok(gltf.to_vec());
        }

        let document: Value = serde_json::from_slice(strip_bom(gltf))
            .map_err(|e| TranscodeError::InvalidGltf(e.to_string()))?;
        check_document(&document)?;

        let json = serde_json::to_vec(&document)
            .map_err(|e| TranscodeError::InvalidGltf(e.to_string()))?;
        pack_json_chunk(&json)
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn check_document(document: &Value) -> Result<(), TranscodeError> {
    let root = document
        .as_object()
        .ok_or_else(|| TranscodeError::InvalidGltf("root is not an object".into()))?;
    if !root.get("asset").is_some_and(Value::is_object) {
        return Err(TranscodeError::InvalidGltf("missing \"asset\" object".into()));
    }

    for section in ["buffers", "images"] {
        let Some(list) = root.get(section).and_then(Value::as_array) else {
            continue;
        };
        for (i, entry) in list.iter().enumerate() {
            match entry.get("uri").and_then(Value::as_str) {
                Some(uri) if uri.starts_with("data:") => {}
                Some(uri) => return Err(TranscodeError::ExternalResource(uri.to_string())),
                // Images may live in a buffer view instead of a URI.
                None if section == "images" => {}
                None => {
                    return Err(TranscodeError::InvalidGltf(format!(
                        "buffers[{i}] has no uri"
                    )))
                }
            }
        }
    }
    Ok(())
}

fn pack_json_chunk(json: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    let padded_len = json.len().next_multiple_of(4);
    let total_len = GLB_HEADER_LEN + CHUNK_HEADER_LEN + padded_len;
    let total_u32 = u32::try_from(total_len).map_err(|_| TranscodeError::TooLarge(total_len))?;

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_u32.to_le_bytes());
    out.extend_from_slice(&(padded_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(total_len, b' ');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"byteLength": 4, "uri": "data:application/octet-stream;base64,AAAAAA=="}]
    }"#;

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[tokio::test]
    async fn packs_json_into_glb() {
        let glb = EmbeddedGltfTranscoder.to_glb(MINIMAL.as_bytes()).await.unwrap();
        assert_eq!(&glb[..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);
        assert_eq!(read_u32(&glb, 16), CHUNK_TYPE_JSON);

        let chunk_len = read_u32(&glb, 12) as usize;
        let chunk = &glb[20..20 + chunk_len];
        let json: Value = serde_json::from_slice(chunk).unwrap();
        assert_eq!(json["asset"]["version"], "2.0");
    }

    #[tokio::test]
    async fn glb_input_passes_through() {
        let glb = EmbeddedGltfTranscoder.to_glb(MINIMAL.as_bytes()).await.unwrap();
        let again = EmbeddedGltfTranscoder.to_glb(&glb).await.unwrap();
        assert_eq!(glb, again);
    }

    #[tokio::test]
    async fn accepts_byte_order_mark() {
        let mut input = b"\xEF\xBB\xBF".to_vec();
        input.extend_from_slice(MINIMAL.as_bytes());
        assert!(EmbeddedGltfTranscoder.to_glb(&input).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_non_json() {
        let err = EmbeddedGltfTranscoder.to_glb(b"\x00\x01binary").await.unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidGltf(_)));
    }

    #[tokio::test]
    async fn rejects_missing_asset() {
        let err = EmbeddedGltfTranscoder.to_glb(b"{\"buffers\": []}").await.unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidGltf(_)));
    }

    #[tokio::test]
    async fn rejects_external_buffers() {
        let doc = r#"{"asset": {"version": "2.0"}, "buffers": [{"byteLength": 4, "uri": "mesh.bin"}]}"#;
        let err = EmbeddedGltfTranscoder.to_glb(doc.as_bytes()).await.unwrap_err();
        assert!(matches!(err, TranscodeError::ExternalResource(ref uri) if uri == "mesh.bin"));
    }
}
