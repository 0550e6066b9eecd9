use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use cart_types::ModelAssetId;
use tracing::debug;

use crate::asset::{ModelAsset, ModelFormat};
use crate::error::RegistryResult;
use crate::handle::{BlobUrlHost, HandleHost};

/// Owns the decoded model assets of a document, keyed by id.
///
/// Every asset holds one display handle from the registry's [`HandleHost`].
/// Handles are released on `remove`, on `clear`, before a replacement is
/// created by `set`, and when the registry is dropped.
pub struct AssetRegistry {
    assets: BTreeMap<ModelAssetId, ModelAsset>,
    host: Arc<dyn HandleHost>,
}

impl AssetRegistry {
    /// Create an empty registry backed by a private [`BlobUrlHost`].
    pub fn new() -> Self {
        Self::with_host(Arc::new(BlobUrlHost::new()))
    }

    pub fn with_host(host: Arc<dyn HandleHost>) -> Self {
        Self {
            assets: BTreeMap::new(),
            host,
        }
    }

    /// Store `bytes` as the model for `id`, replacing any previous asset.
    ///
    /// The previous handle is released before the new one is acquired. If
    /// acquiring fails the id is left without an asset.
    pub fn set(&mut self, id: ModelAssetId, bytes: impl Into<Bytes>) -> RegistryResult<&ModelAsset> {
        self.remove(id);

        let bytes = bytes.into();
        let format = ModelFormat::detect(&bytes);
        let handle = self.host.acquire(id, &bytes, format.content_type())?;
        debug!(%id, %format, len = bytes.len(), "model asset stored");

        let asset = ModelAsset {
            id,
            bytes,
            format,
            handle,
        };
        Ok(self.assets.entry(id).or_insert(asset))
    }

    /// Drop the asset for `id`, releasing its handle. Returns `true` if one existed.
    pub fn remove(&mut self, id: ModelAssetId) -> bool {
        match self.assets.remove(&id) {
            Some(asset) => {
                self.host.release(asset.handle);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ModelAssetId) -> Option<&ModelAsset> {
        self.assets.get(&id)
    }

    pub fn contains(&self, id: ModelAssetId) -> bool {
        self.assets.contains_key(&id)
    }

    /// Release every handle, then forget every asset.
    pub fn clear(&mut self) {
        let assets = std::mem::take(&mut self.assets);
        let count = assets.len();
        for asset in assets.into_values() {
            self.host.release(asset.handle);
        }
        if count > 0 {
            debug!(count, "model assets cleared");
        }
    }

    /// Stored ids, ascending.
    pub fn ids(&self) -> Vec<ModelAssetId> {
        self.assets.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelAsset> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Total bytes across all stored assets.
    pub fn total_bytes(&self) -> usize {
        self.assets.values().map(ModelAsset::len).sum()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AssetRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("ids", &self.ids())
            .field("total_bytes", &self.total_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::handle::DisplayHandle;
    use std::sync::Mutex;

    fn id(n: u32) -> ModelAssetId {
        ModelAssetId::new(n)
    }

    fn registry() -> (Arc<BlobUrlHost>, AssetRegistry) {
        let host = Arc::new(BlobUrlHost::new());
        let registry = AssetRegistry::with_host(host.clone());
        (host, registry)
    }

    /// Records acquire/release order to check release-before-acquire.
    #[derive(Default)]
    struct LoggingHost {
        log: Mutex<Vec<String>>,
        fail_acquire: bool,
    }

    impl HandleHost for LoggingHost {
        fn acquire(
            &self,
            id: ModelAssetId,
            _bytes: &Bytes,
            content_type: &'static str,
        ) -> RegistryResult<DisplayHandle> {
            if self.fail_acquire {
                return Err(RegistryError::HandleUnavailable {
                    id,
                    reason: "host closed".into(),
                });
            }
            let mut log = self.log.lock().unwrap();
            let url = format!("h{}", log.len());
            log.push(format!("acquire {url}"));
            Ok(DisplayHandle::new(id, url, content_type))
        }

        fn release(&self, handle: DisplayHandle) {
            self.log.lock().unwrap().push(format!("release {}", handle.url()));
        }
    }

    #[test]
    fn set_and_get() {
        let (host, mut registry) = registry();
        let asset = registry.set(id(7), b"glTF-binary".to_vec()).unwrap();
        assert_eq!(asset.format(), ModelFormat::Glb);
        assert_eq!(asset.handle().content_type(), "model/gltf-binary");

        let asset = registry.get(id(7)).expect("should exist");
        assert_eq!(asset.bytes().as_ref(), b"glTF-binary");
        assert!(host.is_live(asset.handle().url()));
        assert!(registry.get(id(8)).is_none());
    }

    #[test]
    fn textual_models_are_detected() {
        let (_host, mut registry) = registry();
        let asset = registry.set(id(1), br#"{"asset":{"version":"2.0"}}"#.to_vec()).unwrap();
        assert_eq!(asset.format(), ModelFormat::Gltf);
    }

    #[test]
    fn replacing_releases_previous_handle_first() {
        let host = Arc::new(LoggingHost::default());
        let mut registry = AssetRegistry::with_host(host.clone());
        registry.set(id(3), b"a".to_vec()).unwrap();
        registry.set(id(3), b"b".to_vec()).unwrap();

        let log = host.log.lock().unwrap().clone();
        assert_eq!(log, vec!["acquire h0", "release h0", "acquire h2"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id(3)).unwrap().bytes().as_ref(), b"b");
    }

    #[test]
    fn replace_keeps_single_live_handle() {
        let (host, mut registry) = registry();
        let first_url = registry.set(id(2), b"one".to_vec()).unwrap().handle().url().to_string();
        registry.set(id(2), b"two".to_vec()).unwrap();
        assert!(!host.is_live(&first_url));
        assert_eq!(host.live_count(), 1);
    }

    #[test]
    fn remove_releases_handle() {
        let (host, mut registry) = registry();
        registry.set(id(5), b"x".to_vec()).unwrap();
        assert!(registry.remove(id(5)));
        assert!(!registry.remove(id(5)));
        assert_eq!(host.live_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_releases_everything() {
        let (host, mut registry) = registry();
        for n in 0..4 {
            registry.set(id(n), vec![n as u8; 8]).unwrap();
        }
        assert_eq!(host.live_count(), 4);
        assert_eq!(registry.total_bytes(), 32);
        registry.clear();
        assert_eq!(host.live_count(), 0);
        assert!(registry.ids().is_empty());
    }

    #[test]
    fn drop_releases_everything() {
        let host = Arc::new(BlobUrlHost::new());
        {
            let mut registry = AssetRegistry::with_host(host.clone());
            registry.set(id(1), b"a".to_vec()).unwrap();
            registry.set(id(2), b"b".to_vec()).unwrap();
        }
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn failed_acquire_leaves_no_asset_and_no_leak() {
        let (blob_host, mut registry) = registry();
        registry.set(id(9), b"old".to_vec()).unwrap();
        drop(registry);
        assert_eq!(blob_host.live_count(), 0);

        let host = Arc::new(LoggingHost {
            fail_acquire: true,
            ..LoggingHost::default()
        });
        let mut registry = AssetRegistry::with_host(host);
        let err = registry.set(id(9), b"new".to_vec()).unwrap_err();
        assert!(matches!(err, RegistryError::HandleUnavailable { .. }));
        assert!(!registry.contains(id(9)));
    }

    #[test]
    fn ids_are_sorted() {
        let (_host, mut registry) = registry();
        for n in [10, 3, 7] {
            registry.set(id(n), b"m".to_vec()).unwrap();
        }
        assert_eq!(registry.ids(), vec![id(3), id(7), id(10)]);
    }
}
