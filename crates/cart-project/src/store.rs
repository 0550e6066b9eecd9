use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use cart_assets::{
    AssetRegistry, DisplayHandle, EmbeddedGltfTranscoder, GlbTranscoder, HandleHost, ModelAsset,
    ModelFormat,
};
use cart_container::ContainerEntries;
use cart_schema::{validate_json, CartSchema, MetadataSchema, SchemaIssue, SchemaValidator};
use cart_types::{
    scan_model_ids, Cart, Guideline, Metadata, ModelAssetId, OrbitControls,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::events::{DocumentEvent, EventRouter, EventStream, Operation, OperationStatus};
use crate::file::{FileHandle, SaveLocationPicker};
use crate::layout::{is_model_entry, model_entry_name, parse_model_entry, CART_ENTRY, METADATA_ENTRY};

/// Coarse state of a document store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentState {
    /// No cart is open.
    Empty,
    Loaded { saved: bool },
    /// A save or load holds the store. Only reported by
    /// [`SharedDocumentStore`](crate::SharedDocumentStore).
    Busy,
}

/// Why metadata is being replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChangeOrigin {
    /// A user edit: compared against the current metadata, ignoring view state.
    Edit,
    /// The metadata was just written to disk.
    SaveCompletion,
}

/// Validators applied to the JSON entries of a project file on load.
pub struct Validators {
    pub metadata: Box<dyn SchemaValidator>,
    pub cart: Box<dyn SchemaValidator>,
}

impl Default for Validators {
    fn default() -> Self {
        Self {
            metadata: Box::new(MetadataSchema::new()),
            cart: Box::new(CartSchema),
        }
    }
}

/// Result of a save that was not cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub file_name: String,
    pub bytes_written: usize,
    /// Models written to the file, ascending.
    pub models: Vec<ModelAssetId>,
    /// Referenced models that had no asset and were left out.
    pub missing_assets: Vec<ModelAssetId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SaveReport),
    /// The user dismissed the location prompt. The store is unchanged.
    Cancelled,
}

/// Result of a successful load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub file_name: String,
    /// Model entries loaded into the registry, ascending.
    pub loaded: Vec<ModelAssetId>,
    /// Entries that were neither payloads nor valid model entries.
    pub skipped_entries: Vec<String>,
    /// Models the cart references but the file does not contain.
    pub missing_assets: Vec<ModelAssetId>,
    /// Attachment paths deeper than the configured scan depth.
    pub truncated_paths: Vec<String>,
}

/// The open project: metadata, cart, model assets and the file they came from.
///
/// All methods take `&mut self`; wrap the store in a
/// [`SharedDocumentStore`](crate::SharedDocumentStore) to share it between
/// tasks.
///
/// The `saved` flag is true exactly when nothing but view state changed since
/// the last successful save or load.
pub struct DocumentStore {
    config: StoreConfig,
    metadata: Metadata,
    cart: Option<Cart>,
    model_ids: Vec<ModelAssetId>,
    saved: bool,
    registry: AssetRegistry,
    file: Option<Arc<dyn FileHandle>>,
    picker: Arc<dyn SaveLocationPicker>,
    transcoder: Arc<dyn GlbTranscoder>,
    validators: Validators,
    events: Arc<EventRouter>,
}

impl DocumentStore {
    /// Create an empty store that asks `picker` where new files go.
    pub fn new(picker: Arc<dyn SaveLocationPicker>) -> Self {
        let config = StoreConfig::default();
        Self {
            metadata: Metadata::new(config.default_project_name.as_str()),
            cart: None,
            model_ids: Vec::new(),
            saved: false,
            registry: AssetRegistry::new(),
            file: None,
            picker,
            transcoder: Arc::new(EmbeddedGltfTranscoder),
            validators: Validators::default(),
            events: Arc::new(EventRouter::new(config.event_capacity)),
            config,
        }
    }

    /// Apply `config`. Subscriptions made before this call are dropped.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.events = Arc::new(EventRouter::new(config.event_capacity));
        if self.cart.is_none() {
            self.metadata = Metadata::new(config.default_project_name.as_str());
        }
        self.config = config;
        self
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn GlbTranscoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    /// Issue display handles from `host`. Existing assets are released.
    pub fn with_handle_host(mut self, host: Arc<dyn HandleHost>) -> Self {
        self.registry = AssetRegistry::with_host(host);
        self
    }

    // ---- Accessors ----

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn saved(&self) -> bool {
        self.saved
    }

    pub fn state(&self) -> DocumentState {
        match self.cart {
            None => DocumentState::Empty,
            Some(_) => DocumentState::Loaded { saved: self.saved },
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Model ids referenced by the cart, ascending and unique.
    pub fn model_ids(&self) -> &[ModelAssetId] {
        &self.model_ids
    }

    pub fn asset(&self, id: ModelAssetId) -> Option<&ModelAsset> {
        self.registry.get(id)
    }

    /// Display handle for a model, for the renderer.
    pub fn asset_handle(&self, id: ModelAssetId) -> DocumentResult<&DisplayHandle> {
        self.registry
            .get(id)
            .map(ModelAsset::handle)
            .ok_or(DocumentError::MissingAsset(id))
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Referenced model ids without a stored asset.
    pub fn missing_assets(&self) -> Vec<ModelAssetId> {
        self.model_ids
            .iter()
            .copied()
            .filter(|id| !self.registry.contains(*id))
            .collect()
    }

    /// The file the next in-place save writes to.
    pub fn file_handle(&self) -> Option<&Arc<dyn FileHandle>> {
        self.file.as_ref()
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    pub(crate) fn event_router(&self) -> Arc<EventRouter> {
        Arc::clone(&self.events)
    }

    // ---- Metadata edits ----

    /// Edit the metadata through `f`. Only content changes clear `saved`.
    pub fn update_metadata(&mut self, f: impl FnOnce(&mut Metadata)) {
        let mut next = self.metadata.clone();
        f(&mut next);
        self.commit_metadata(next, ChangeOrigin::Edit);
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.update_metadata(|meta| meta.project_name = name);
    }

    /// Store camera state. Never affects `saved`.
    pub fn set_orbit_controls(&mut self, controls: Option<OrbitControls>) {
        self.update_metadata(|meta| meta.orbit_controls = controls);
    }

    /// Append a guideline, returning its index.
    pub fn add_guideline(&mut self, guideline: Guideline) -> usize {
        let index = self.metadata.guidelines.len();
        self.update_metadata(|meta| meta.guidelines.push(guideline));
        index
    }

    pub fn update_guideline(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Guideline),
    ) -> DocumentResult<()> {
        self.check_guideline_index(index)?;
        self.update_metadata(|meta| f(&mut meta.guidelines[index]));
        Ok(())
    }

    pub fn remove_guideline(&mut self, index: usize) -> DocumentResult<Guideline> {
        self.check_guideline_index(index)?;
        let removed = self.metadata.guidelines[index].clone();
        self.update_metadata(|meta| {
            meta.guidelines.remove(index);
        });
        Ok(removed)
    }

    fn check_guideline_index(&self, index: usize) -> DocumentResult<()> {
        let len = self.metadata.guidelines.len();
        if index >= len {
            return Err(DocumentError::GuidelineOutOfRange { index, len });
        }
        Ok(())
    }

    pub(crate) fn commit_metadata(&mut self, next: Metadata, origin: ChangeOrigin) {
        match origin {
            ChangeOrigin::SaveCompletion => self.saved = true,
            ChangeOrigin::Edit => {
                if !self.metadata.same_content(&next) {
                    self.saved = false;
                }
            }
        }
        self.metadata = next;
        self.emit_changed();
    }

    // ---- Cart and asset edits ----

    /// Replace the cart and recompute its model ids. The registry is untouched.
    pub fn set_cart(&mut self, cart: Cart) {
        let scan = scan_model_ids(Some(&cart), self.config.max_tree_depth);
        self.model_ids = scan.ids;
        self.cart = Some(cart);
        self.saved = false;
        self.emit_changed();
    }

    /// Store the model for `id`. If the handle host refuses the new asset,
    /// any previous asset for `id` is already gone and the document counts as
    /// changed.
    pub fn set_asset(&mut self, id: ModelAssetId, bytes: impl Into<Bytes>) -> DocumentResult<()> {
        let replaced = self.registry.contains(id);
        let result = self.registry.set(id, bytes).map(|_| ());
        if result.is_ok() || replaced {
            self.saved = false;
            self.emit_changed();
        }
        result.map_err(DocumentError::from)
    }

    /// Remove a stored model. Returns `false` if there was none.
    pub fn remove_asset(&mut self, id: ModelAssetId) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            self.saved = false;
            self.emit_changed();
        }
        removed
    }

    // ---- Lifecycle ----

    /// Start a new, unsaved project with an empty cart.
    pub fn create_project(&mut self, name: impl Into<String>) {
        self.reset();
        self.metadata = Metadata::new(name);
        self.cart = Some(Cart::default());
        info!(project = %self.metadata.project_name, "project created");
        self.emit_changed();
    }

    /// Return to the empty state, releasing every asset and the file handle.
    pub fn reset(&mut self) {
        self.cart = None;
        self.metadata = Metadata::new(self.config.default_project_name.as_str());
        self.model_ids.clear();
        self.registry.clear();
        self.file = None;
        self.saved = false;
        self.events.emit(DocumentEvent::Reset);
    }

    // ---- Persistence ----

    /// Write the project to its file, asking for a location when there is no
    /// file yet or `as_new` is set.
    ///
    /// The file handle, stamped timestamps and `saved` flag are adopted only
    /// after the write succeeds.
    pub async fn save_project(&mut self, as_new: bool) -> DocumentResult<SaveOutcome> {
        self.emit_status(OperationStatus::InProgress {
            operation: Operation::Save,
        });
        let result = self.write_project(as_new).await;
        let status = match &result {
            Ok(SaveOutcome::Saved(report)) => OperationStatus::Succeeded {
                operation: Operation::Save,
                message: format!("Saved {}", report.file_name),
            },
            Ok(SaveOutcome::Cancelled) => OperationStatus::Cancelled {
                operation: Operation::Save,
            },
            Err(e) => {
                warn!(error = %e, "save failed");
                OperationStatus::Failed {
                    operation: Operation::Save,
                    message: e.to_string(),
                    issues: e.issues().to_vec(),
                }
            }
        };
        self.emit_status(status);
        result
    }

    async fn write_project(&mut self, as_new: bool) -> DocumentResult<SaveOutcome> {
        let cart = self.cart.as_ref().ok_or(DocumentError::NoDocument)?;
        let stamped = self.metadata.stamped(Utc::now());
        if let Some(path) = stamped.non_finite_path() {
            return Err(DocumentError::NonFinite { entry: METADATA_ENTRY, path });
        }
        if let Some(path) = cart.non_finite_path() {
            return Err(DocumentError::NonFinite { entry: CART_ENTRY, path });
        }

        let mut entries = BTreeMap::new();
        entries.insert(METADATA_ENTRY.to_string(), serde_json::to_vec_pretty(&stamped)?);
        entries.insert(CART_ENTRY.to_string(), serde_json::to_vec_pretty(cart)?);

        let mut models = Vec::new();
        let mut missing = Vec::new();
        for &id in &self.model_ids {
            let Some(asset) = self.registry.get(id) else {
                warn!(%id, "model referenced by the cart has no asset, saving without it");
                missing.push(id);
                continue;
            };
            let glb = match asset.format() {
                ModelFormat::Glb => asset.bytes().to_vec(),
                ModelFormat::Gltf => self
                    .transcoder
                    .to_glb(asset.bytes())
                    .await
                    .map_err(|source| DocumentError::Transcode { id, source })?,
            };
            entries.insert(model_entry_name(id), glb);
            models.push(id);
        }

        let bytes = cart_container::encode(&entries).map_err(DocumentError::Encode)?;

        let handle = match &self.file {
            Some(handle) if !as_new => Arc::clone(handle),
            _ => {
                let suggested = self.config.suggested_file_name(&self.metadata.project_name);
                match self.picker.pick_save_location(&suggested).await? {
                    Some(handle) => handle,
                    None => {
                        info!("save cancelled");
                        return Ok(SaveOutcome::Cancelled);
                    }
                }
            }
        };

        handle.write(&bytes).await?;

        self.file = Some(Arc::clone(&handle));
        self.commit_metadata(stamped, ChangeOrigin::SaveCompletion);
        info!(
            file = handle.name(),
            bytes = bytes.len(),
            models = models.len(),
            missing = missing.len(),
            "project saved"
        );
        Ok(SaveOutcome::Saved(SaveReport {
            file_name: handle.name().to_string(),
            bytes_written: bytes.len(),
            models,
            missing_assets: missing,
        }))
    }

    /// Replace the open project with the one in `handle`.
    ///
    /// The store is reset first. Any failure leaves it empty; a document is
    /// never half loaded.
    pub async fn load_project_from_handle(
        &mut self,
        handle: Arc<dyn FileHandle>,
    ) -> DocumentResult<LoadReport> {
        self.reset();
        self.emit_status(OperationStatus::InProgress {
            operation: Operation::Load,
        });
        let result = self.read_project(handle).await;
        let status = match &result {
            Ok(report) => OperationStatus::Succeeded {
                operation: Operation::Load,
                message: format!("Loaded {}", report.file_name),
            },
            Err(e) => {
                warn!(error = %e, "load failed");
                self.reset();
                OperationStatus::Failed {
                    operation: Operation::Load,
                    message: e.to_string(),
                    issues: e.issues().to_vec(),
                }
            }
        };
        self.emit_status(status);
        result
    }

    async fn read_project(&mut self, handle: Arc<dyn FileHandle>) -> DocumentResult<LoadReport> {
        let bytes = handle.read().await?;
        let entries = cart_container::decode(&bytes).map_err(DocumentError::InvalidFormat)?;
        debug!(file = handle.name(), entries = entries.len(), "project decoded");

        let mut issues = Vec::new();
        let metadata: Option<Metadata> = read_payload(
            &entries,
            METADATA_ENTRY,
            self.validators.metadata.as_ref(),
            &mut issues,
        );
        let cart: Option<Cart> =
            read_payload(&entries, CART_ENTRY, self.validators.cart.as_ref(), &mut issues);
        let (Some(metadata), Some(cart)) = (metadata, cart) else {
            return Err(DocumentError::SchemaValidation { issues });
        };

        let scan = scan_model_ids(Some(&cart), self.config.max_tree_depth);
        let mut loaded = Vec::new();
        let mut skipped = Vec::new();
        for (name, data) in entries.into_inner() {
            if name == METADATA_ENTRY || name == CART_ENTRY {
                continue;
            }
            match parse_model_entry(&name) {
                Some(id) => {
                    self.registry.set(id, data)?;
                    loaded.push(id);
                }
                None => {
                    if is_model_entry(&name) {
                        warn!(entry = %name, "model entry has no numeric id, skipping");
                    } else {
                        debug!(entry = %name, "ignoring unknown entry");
                    }
                    skipped.push(name);
                }
            }
        }
        loaded.sort();

        self.metadata = metadata;
        self.cart = Some(cart);
        self.model_ids = scan.ids;
        self.file = Some(Arc::clone(&handle));
        self.saved = true;

        let missing_assets = self.missing_assets();
        for id in &missing_assets {
            warn!(%id, "model referenced by the cart is not in the file");
        }
        info!(
            file = handle.name(),
            models = loaded.len(),
            missing = missing_assets.len(),
            "project loaded"
        );
        self.emit_changed();

        Ok(LoadReport {
            file_name: handle.name().to_string(),
            loaded,
            skipped_entries: skipped,
            missing_assets,
            truncated_paths: scan.truncated,
        })
    }

    fn emit_changed(&self) {
        self.events.emit(DocumentEvent::Changed { saved: self.saved });
    }

    fn emit_status(&self, status: OperationStatus) {
        self.events.emit(DocumentEvent::Status(status));
    }
}

/// Validate and deserialize one JSON entry, collecting issues under its name.
fn read_payload<T: DeserializeOwned>(
    entries: &ContainerEntries,
    name: &str,
    validator: &dyn SchemaValidator,
    issues: &mut Vec<SchemaIssue>,
) -> Option<T> {
    let Ok(bytes) = entries.get(name) else {
        issues.push(SchemaIssue::new(name, "required entry is missing"));
        return None;
    };
    let value = match validate_json(validator, bytes) {
        Ok(value) => value,
        Err(e) => {
            issues.extend(e.into_report(validator.name()).prefixed(name));
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(payload) => Some(payload),
        Err(e) => {
            issues.push(SchemaIssue::new(name, e.to_string()));
            None
        }
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("state", &self.state())
            .field("project", &self.metadata.project_name)
            .field("model_ids", &self.model_ids)
            .field("assets", &self.registry)
            .field("file", &self.file)
            .finish()
    }
}
