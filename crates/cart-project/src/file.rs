use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Capability to read and replace one file.
///
/// Handles come from a load request or from a [`SaveLocationPicker`]; the
/// store keeps the last successful one for in-place saves.
#[async_trait]
pub trait FileHandle: Send + Sync + fmt::Debug {
    /// Display name, usually the file name.
    fn name(&self) -> &str;

    async fn read(&self) -> io::Result<Vec<u8>>;

    /// Replace the full contents with `bytes`.
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

/// Asks the user where a new file should go.
#[async_trait]
pub trait SaveLocationPicker: Send + Sync {
    /// `Ok(None)` means the user cancelled.
    async fn pick_save_location(
        &self,
        suggested_name: &str,
    ) -> io::Result<Option<Arc<dyn FileHandle>>>;
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// A file on the local filesystem.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a failed write leaves the previous contents in place.
#[derive(Clone, Debug)]
pub struct FsFileHandle {
    path: PathBuf,
    name: String,
}

impl FsFileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let temp_name = format!(".{}.{}.tmp", self.name, Uuid::now_v7());
        match self.path.parent() {
            Some(parent) => parent.join(temp_name),
            None => PathBuf::from(temp_name),
        }
    }
}

#[async_trait]
impl FileHandle for FsFileHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        debug!(path = %self.path.display(), len = bytes.len(), "file replaced");
        Ok(())
    }
}

/// Picker that always grants the same path.
#[derive(Clone, Debug)]
pub struct FixedPathPicker {
    path: PathBuf,
}

impl FixedPathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SaveLocationPicker for FixedPathPicker {
    async fn pick_save_location(
        &self,
        _suggested_name: &str,
    ) -> io::Result<Option<Arc<dyn FileHandle>>> {
        Ok(Some(Arc::new(FsFileHandle::new(self.path.clone()))))
    }
}

/// Picker for contexts without a user: every request is cancelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelPicker;

#[async_trait]
impl SaveLocationPicker for CancelPicker {
    async fn pick_save_location(
        &self,
        _suggested_name: &str,
    ) -> io::Result<Option<Arc<dyn FileHandle>>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// A file held in memory.
pub struct MemoryFileHandle {
    name: String,
    contents: Mutex<Vec<u8>>,
    writes: AtomicUsize,
    failing: bool,
}

impl MemoryFileHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_contents(name, Vec::new())
    }

    pub fn with_contents(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents: Mutex::new(contents),
            writes: AtomicUsize::new(0),
            failing: false,
        }
    }

    /// A handle whose reads and writes all fail.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.contents.lock().expect("lock poisoned").clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> io::Result<()> {
        if self.failing {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not accessible", self.name),
            ))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for MemoryFileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFileHandle")
            .field("name", &self.name)
            .field("writes", &self.write_count())
            .field("failing", &self.failing)
            .finish()
    }
}

#[async_trait]
impl FileHandle for MemoryFileHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        self.check()?;
        Ok(self.contents())
    }

    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        self.check()?;
        *self.contents.lock().expect("lock poisoned") = bytes.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Picker handing out a fixed in-memory handle, or cancelling.
///
/// Records every suggested name it was asked about.
#[derive(Default)]
pub struct MemoryPicker {
    handle: Option<Arc<MemoryFileHandle>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryPicker {
    pub fn new(handle: Arc<MemoryFileHandle>) -> Self {
        Self {
            handle: Some(handle),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl SaveLocationPicker for MemoryPicker {
    async fn pick_save_location(
        &self,
        suggested_name: &str,
    ) -> io::Result<Option<Arc<dyn FileHandle>>> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push(suggested_name.to_string());
        Ok(self
            .handle
            .clone()
            .map(|handle| handle as Arc<dyn FileHandle>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_handle_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FsFileHandle::new(dir.path().join("coach.tcproj"));
        assert_eq!(handle.name(), "coach.tcproj");

        handle.write(b"first version").await.unwrap();
        handle.write(b"second").await.unwrap();
        assert_eq!(handle.read().await.unwrap(), b"second");

        // No temporary files are left behind.
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("coach.tcproj")]);
    }

    #[tokio::test]
    async fn fs_handle_failed_write_keeps_old_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("coach.tcproj");
        std::fs::write(&target, b"original").unwrap();

        let handle = FsFileHandle::new(dir.path().join("missing").join("coach.tcproj"));
        assert!(handle.write(b"new").await.is_err());
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }

    #[tokio::test]
    async fn fs_handle_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FsFileHandle::new(dir.path().join("nope.tcproj"));
        let err = handle.read().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn fixed_path_picker_grants_path() {
        let dir = tempfile::tempdir().unwrap();
        let picker = FixedPathPicker::new(dir.path().join("out.tcproj"));
        let handle = picker.pick_save_location("ignored").await.unwrap().unwrap();
        assert_eq!(handle.name(), "out.tcproj");
    }

    #[tokio::test]
    async fn cancel_picker_cancels() {
        assert!(CancelPicker.pick_save_location("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_handle_round_trip() {
        let handle = MemoryFileHandle::new("mem");
        handle.write(b"abc").await.unwrap();
        assert_eq!(handle.read().await.unwrap(), b"abc");
        assert_eq!(handle.write_count(), 1);
    }

    #[tokio::test]
    async fn failing_memory_handle() {
        let handle = MemoryFileHandle::failing("locked");
        assert!(handle.read().await.is_err());
        assert!(handle.write(b"abc").await.is_err());
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn memory_picker_records_requests() {
        let handle = Arc::new(MemoryFileHandle::new("mem"));
        let picker = MemoryPicker::new(handle);
        let picked = picker.pick_save_location("Coach.tcproj").await.unwrap();
        assert_eq!(picked.unwrap().name(), "mem");
        assert_eq!(picker.requests(), vec!["Coach.tcproj"]);

        let cancelling = MemoryPicker::cancelling();
        assert!(cancelling.pick_save_location("x").await.unwrap().is_none());
    }
}
