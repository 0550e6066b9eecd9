use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use bytes::Bytes;
use cart_types::ModelAssetId;
use uuid::Uuid;

use crate::error::RegistryResult;

/// A scoped reference through which the renderer reaches one model's bytes.
///
/// Deliberately not `Clone`: the registry owns every handle and hands it back
/// to its [`HandleHost`] exactly once.
pub struct DisplayHandle {
    id: ModelAssetId,
    url: String,
    content_type: &'static str,
}

impl DisplayHandle {
    pub fn new(id: ModelAssetId, url: impl Into<String>, content_type: &'static str) -> Self {
        Self {
            id,
            url: url.into(),
            content_type,
        }
    }

    pub fn id(&self) -> ModelAssetId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .finish()
    }
}

/// Issues and revokes display handles.
///
/// Implementations must tolerate `release` for every handle they issued,
/// in any order.
pub trait HandleHost: Send + Sync {
    /// Create a handle exposing `bytes` under `content_type`.
    fn acquire(
        &self,
        id: ModelAssetId,
        bytes: &Bytes,
        content_type: &'static str,
    ) -> RegistryResult<DisplayHandle>;

    /// Revoke a handle. After this returns the handle's URL no longer resolves.
    fn release(&self, handle: DisplayHandle);
}

/// In-memory host issuing `blob:` URLs.
///
/// Live URLs resolve to the bytes they were created for until released.
pub struct BlobUrlHost {
    live: RwLock<HashMap<String, Bytes>>,
}

impl BlobUrlHost {
    pub fn new() -> Self {
        Self {
            live: RwLock::new(HashMap::new()),
        }
    }

    /// Number of handles issued and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.read().expect("lock poisoned").len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.read().expect("lock poisoned").contains_key(url)
    }

    /// Bytes behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.live.read().expect("lock poisoned").get(url).cloned()
    }
}

impl Default for BlobUrlHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleHost for BlobUrlHost {
    fn acquire(
        &self,
        id: ModelAssetId,
        bytes: &Bytes,
        content_type: &'static str,
    ) -> RegistryResult<DisplayHandle> {
        let url = format!("blob:cart/{}", Uuid::now_v7());
        self.live
            .write()
            .expect("lock poisoned")
            .insert(url.clone(), bytes.clone());
        Ok(DisplayHandle::new(id, url, content_type))
    }

    fn release(&self, handle: DisplayHandle) {
        self.live.write().expect("lock poisoned").remove(&handle.url);
    }
}

impl fmt::Debug for BlobUrlHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobUrlHost")
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_issues_unique_live_urls() {
        let host = BlobUrlHost::new();
        let bytes = Bytes::from_static(b"glTF");
        let a = host.acquire(ModelAssetId::new(1), &bytes, "model/gltf-binary").unwrap();
        let b = host.acquire(ModelAssetId::new(1), &bytes, "model/gltf-binary").unwrap();
        assert_ne!(a.url(), b.url());
        assert!(a.url().starts_with("blob:cart/"));
        assert_eq!(host.live_count(), 2);
        assert_eq!(host.resolve(a.url()).unwrap(), bytes);
    }

    #[test]
    fn release_revokes_url() {
        let host = BlobUrlHost::new();
        let handle = host
            .acquire(ModelAssetId::new(4), &Bytes::from_static(b"{}"), "model/gltf+json")
            .unwrap();
        let url = handle.url().to_string();
        host.release(handle);
        assert!(!host.is_live(&url));
        assert!(host.resolve(&url).is_none());
        assert_eq!(host.live_count(), 0);
    }
}
