//! Durable store keeping a JSON snapshot on disk.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::data::{SessionData, StoredSession};
use super::store::{MemoryStore, SessionStore};
use crate::error::SessionError;
use crate::Result;

/// Store that serves from memory and writes a JSON snapshot on
/// [`flush`](SessionStore::flush).
///
/// The snapshot is only rewritten when a session was inserted, removed or
/// mutated since the previous flush. Writes go to a sibling temp file which
/// is then renamed over the snapshot.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    flush_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let stored: BTreeMap<String, StoredSession> = serde_json::from_slice(&bytes)?;
            info!(path = %path.display(), sessions = stored.len(), "Loaded session snapshot");
            stored
                .into_iter()
                .map(|(id, session)| (id, Arc::new(SessionData::from_stored(session))))
                .collect()
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            HashMap::new()
        };

        Ok(Self {
            path,
            inner: MemoryStore::from_entries(entries),
            flush_lock: Mutex::new(()),
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_snapshot(&self, snapshot: &BTreeMap<String, StoredSession>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, client_id: &str) -> Result<Option<Arc<SessionData>>> {
        self.inner.get(client_id)
    }

    fn insert_if_absent(
        &self,
        client_id: &str,
        data: Arc<SessionData>,
    ) -> Result<Arc<SessionData>> {
        self.inner.insert_if_absent(client_id, data)
    }

    fn remove(&self, client_id: &str) -> Result<Option<Arc<SessionData>>> {
        self.inner.remove(client_id)
    }

    fn remove_if(
        &self,
        client_id: &str,
        predicate: &dyn Fn(&SessionData) -> bool,
    ) -> Result<Option<Arc<SessionData>>> {
        self.inner.remove_if(client_id, predicate)
    }

    fn access_times(&self) -> Result<Vec<(String, u64)>> {
        self.inner.access_times()
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }

    fn flush(&self) -> Result<()> {
        let _guard = self
            .flush_lock
            .lock()
            .map_err(|_| SessionError::LockPoisoned)?;

        // Take the flag first: a removal landing after this point either
        // is missing from `entries` or sets the flag again.
        let changed = self.inner.take_changed();
        let entries = self.inner.entries()?;
        if !changed && !entries.iter().any(|(_, data)| data.is_dirty()) {
            return Ok(());
        }

        let mut snapshot = BTreeMap::new();
        for (client_id, data) in &entries {
            // Clear before capturing so writes racing this flush stay dirty.
            data.mark_clean();
            snapshot.insert(client_id.clone(), data.to_stored()?);
        }

        if let Err(e) = self.write_snapshot(&snapshot) {
            // Force a full rewrite on the next attempt.
            self.inner.set_changed();
            return Err(e);
        }

        debug!(
            path = %self.path.display(),
            sessions = snapshot.len(),
            "Flushed session snapshot"
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
