use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::{PreferenceKind, Preferences};

/// Fixed key the preference snapshot is stored under
pub const PREFS_STORAGE_KEY: &str = "newsflix_prefs_v1";

/// Where the preference snapshot lives
///
/// Implementations store one opaque string. Reads return `None` when nothing
/// has been stored yet; any read failure is treated the same way.
pub trait SnapshotStorage: Send + Sync {
    fn read(&self) -> Option<String>;

    fn write(&self, snapshot: &str) -> io::Result<()>;
}

impl<T: SnapshotStorage + ?Sized> SnapshotStorage for Arc<T> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn write(&self, snapshot: &str) -> io::Result<()> {
        (**self).write(snapshot)
    }
}

/// Snapshot kept in a JSON file named after [`PREFS_STORAGE_KEY`]
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", PREFS_STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read preference snapshot");
                None
            }
        }
    }

    /// Writes to a sibling temp file then renames, so readers never see half a snapshot
    fn write(&self, snapshot: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(snapshot.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

/// Snapshot kept in memory, for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot.into())),
        }
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self) -> Option<String> {
        self.snapshot.lock().ok().and_then(|guard| guard.clone())
    }

    fn write(&self, snapshot: &str) -> io::Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory storage poisoned"))?;
        *guard = Some(snapshot.to_string());
        Ok(())
    }
}

/// Full snapshot taken right after a mutation, not yet written
///
/// Revisions grow with every mutation of the owning store, so a writer can
/// tell when a snapshot has already been superseded.
#[must_use = "preferences are only persisted once the pending write runs"]
pub struct PendingWrite {
    storage: Arc<dyn SnapshotStorage>,
    revision: u64,
    snapshot: Option<String>,
}

impl PendingWrite {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Writes on the calling thread; failures are logged and ignored
    pub fn write(self) {
        let Some(snapshot) = self.snapshot else {
            return;
        };
        if let Err(e) = self.storage.write(&snapshot) {
            tracing::warn!(revision = self.revision, error = %e, "Failed to persist preferences");
        }
    }

    /// Writes on the blocking thread pool so no runtime worker waits on disk
    pub async fn write_blocking(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.write()).await {
            tracing::error!(error = %e, "Preference write task failed");
        }
    }
}

/// Liked/saved/hidden state with explicit load and save boundaries
///
/// The snapshot is read once in [`PreferenceStore::load`]. Every mutation
/// hands back a [`PendingWrite`] holding the whole new snapshot. Missing or
/// malformed snapshots load as empty preferences.
pub struct PreferenceStore {
    storage: Arc<dyn SnapshotStorage>,
    prefs: Preferences,
    revision: u64,
}

impl PreferenceStore {
    pub fn load(storage: Box<dyn SnapshotStorage>) -> Self {
        let prefs = match storage.read() {
            Some(raw) => serde_json::from_str::<Preferences>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding malformed preference snapshot");
                Preferences::default()
            }),
            None => Preferences::default(),
        };

        tracing::info!(
            liked = prefs.liked.len(),
            saved = prefs.saved.len(),
            hidden = prefs.hidden.len(),
            "Preferences loaded"
        );

        Self {
            storage: Arc::from(storage),
            prefs,
            revision: 0,
        }
    }

    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStorage::new()))
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Flips liked/saved membership; returns the new membership
    pub fn toggle(&mut self, kind: PreferenceKind, item_id: &str) -> (bool, PendingWrite) {
        let member = self.prefs.toggle(kind, item_id);
        (member, self.snapshot())
    }

    pub fn hide(&mut self, item_id: &str) -> PendingWrite {
        self.prefs.hide(item_id);
        self.snapshot()
    }

    pub fn unhide_all(&mut self) -> PendingWrite {
        self.prefs.unhide_all();
        self.snapshot()
    }

    fn snapshot(&mut self) -> PendingWrite {
        self.revision += 1;
        let snapshot = match serde_json::to_string(&self.prefs) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "Preference serialization error");
                None
            }
        };

        PendingWrite {
            storage: self.storage.clone(),
            revision: self.revision,
            snapshot,
        }
    }
}
