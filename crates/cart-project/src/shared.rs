use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{DocumentError, DocumentResult};
use crate::events::{EventRouter, EventStream};
use crate::file::FileHandle;
use crate::store::{DocumentState, DocumentStore, LoadReport, SaveOutcome};

/// A [`DocumentStore`] shared between tasks.
///
/// Save and load hold the lock for their whole duration, across file and
/// picker awaits. Anything attempted meanwhile fails with
/// [`DocumentError::Busy`] instead of queueing behind it.
#[derive(Clone)]
pub struct SharedDocumentStore {
    inner: Arc<Mutex<DocumentStore>>,
    events: Arc<EventRouter>,
}

impl SharedDocumentStore {
    pub fn new(store: DocumentStore) -> Self {
        let events = store.event_router();
        Self {
            inner: Arc::new(Mutex::new(store)),
            events,
        }
    }

    /// Subscribe without taking the lock, so progress of a running save or
    /// load can be observed.
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    pub fn state(&self) -> DocumentState {
        match self.inner.try_lock() {
            Ok(store) => store.state(),
            Err(_) => DocumentState::Busy,
        }
    }

    pub async fn save_project(&self, as_new: bool) -> DocumentResult<SaveOutcome> {
        let mut store = self.inner.try_lock().map_err(|_| DocumentError::Busy)?;
        store.save_project(as_new).await
    }

    pub async fn load_project_from_handle(
        &self,
        handle: Arc<dyn FileHandle>,
    ) -> DocumentResult<LoadReport> {
        let mut store = self.inner.try_lock().map_err(|_| DocumentError::Busy)?;
        store.load_project_from_handle(handle).await
    }

    /// Run a synchronous edit or query against the store.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> DocumentResult<R> {
        let mut store = self.inner.try_lock().map_err(|_| DocumentError::Busy)?;
        Ok(f(&mut store))
    }
}
