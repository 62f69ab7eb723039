//! Backing stores mapping client identifiers to session data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::data::SessionData;
use crate::error::SessionError;
use crate::Result;

/// Storage behind a [`SessionDataContainer`](super::SessionDataContainer).
///
/// Implementations must make [`insert_if_absent`](Self::insert_if_absent)
/// and [`remove_if`](Self::remove_if) atomic with respect to each other:
/// they are what keeps one live [`SessionData`] per client identifier.
pub trait SessionStore: Send + Sync {
    /// Get the data stored for `client_id`.
    fn get(&self, client_id: &str) -> Result<Option<Arc<SessionData>>>;

    /// Store `data` unless something is already stored for `client_id`.
    ///
    /// Returns whichever instance is stored after the call.
    fn insert_if_absent(&self, client_id: &str, data: Arc<SessionData>)
        -> Result<Arc<SessionData>>;

    /// Remove and return the data stored for `client_id`.
    fn remove(&self, client_id: &str) -> Result<Option<Arc<SessionData>>>;

    /// Remove the data for `client_id` only if `predicate` holds for it.
    ///
    /// The predicate is evaluated while the entry is locked against
    /// concurrent insertion and removal.
    fn remove_if(
        &self,
        client_id: &str,
        predicate: &dyn Fn(&SessionData) -> bool,
    ) -> Result<Option<Arc<SessionData>>>;

    /// Snapshot of `(client_id, last_access_time)` for every stored entry.
    fn access_times(&self) -> Result<Vec<(String, u64)>>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize>;

    /// Check if nothing is stored.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Persist pending changes. In-memory stores have nothing to do.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Short label for logs and admin output.
    fn kind(&self) -> &'static str;
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Arc<SessionData>>>,
    /// Set when entries are added or removed; durable wrappers consume it.
    changed: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: HashMap<String, Arc<SessionData>>) -> Self {
        Self {
            sessions: RwLock::new(entries),
            changed: AtomicBool::new(false),
        }
    }

    /// Clone out every entry, for snapshotting.
    pub(crate) fn entries(&self) -> Result<Vec<(String, Arc<SessionData>)>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions
            .iter()
            .map(|(id, data)| (id.clone(), Arc::clone(data)))
            .collect())
    }

    /// Whether entries were added or removed since the flag was last taken.
    pub(crate) fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn set_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, client_id: &str) -> Result<Option<Arc<SessionData>>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.get(client_id).cloned())
    }

    fn insert_if_absent(
        &self,
        client_id: &str,
        data: Arc<SessionData>,
    ) -> Result<Arc<SessionData>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let stored = sessions.entry(client_id.to_string()).or_insert_with(|| {
            self.set_changed();
            data
        });
        Ok(Arc::clone(stored))
    }

    fn remove(&self, client_id: &str) -> Result<Option<Arc<SessionData>>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let removed = sessions.remove(client_id);
        if removed.is_some() {
            self.set_changed();
        }
        Ok(removed)
    }

    fn remove_if(
        &self,
        client_id: &str,
        predicate: &dyn Fn(&SessionData) -> bool,
    ) -> Result<Option<Arc<SessionData>>> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let matches = sessions
            .get(client_id)
            .map(|data| predicate(data.as_ref()))
            .unwrap_or(false);
        if !matches {
            return Ok(None);
        }

        self.set_changed();
        Ok(sessions.remove(client_id))
    }

    fn access_times(&self) -> Result<Vec<(String, u64)>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions
            .iter()
            .map(|(id, data)| (id.clone(), data.last_access_time()))
            .collect())
    }

    fn len(&self) -> Result<usize> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(sessions.len())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let store = MemoryStore::new();
        let first = Arc::new(SessionData::new(1));
        let second = Arc::new(SessionData::new(2));

        let stored = store.insert_if_absent("client", Arc::clone(&first)).unwrap();
        assert!(Arc::ptr_eq(&stored, &first));

        let stored = store.insert_if_absent("client", second).unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = MemoryStore::new();
        assert!(store.get("nobody").unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store
            .insert_if_absent("client", Arc::new(SessionData::new(1)))
            .unwrap();

        assert!(store.remove("client").unwrap().is_some());
        assert!(store.remove("client").unwrap().is_none());
        assert!(store.get("client").unwrap().is_none());
    }

    #[test]
    fn test_remove_if_checks_predicate() {
        let store = MemoryStore::new();
        store
            .insert_if_absent("old", Arc::new(SessionData::new(10)))
            .unwrap();
        store
            .insert_if_absent("new", Arc::new(SessionData::new(1_000)))
            .unwrap();

        let stale = |d: &SessionData| d.last_access_time() < 100;
        assert!(store.remove_if("old", &stale).unwrap().is_some());
        assert!(store.remove_if("new", &stale).unwrap().is_none());
        assert!(store.remove_if("missing", &stale).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_access_times() {
        let store = MemoryStore::new();
        store
            .insert_if_absent("a", Arc::new(SessionData::new(5)))
            .unwrap();
        store
            .insert_if_absent("b", Arc::new(SessionData::new(7)))
            .unwrap();

        let mut times = store.access_times().unwrap();
        times.sort();
        assert_eq!(times, vec![("a".to_string(), 5), ("b".to_string(), 7)]);
    }

    #[test]
    fn test_changed_flag() {
        let store = MemoryStore::new();
        assert!(!store.take_changed());

        store
            .insert_if_absent("a", Arc::new(SessionData::new(5)))
            .unwrap();
        assert!(store.take_changed());
        assert!(!store.take_changed());

        // Losing insert does not count as a change
        store
            .insert_if_absent("a", Arc::new(SessionData::new(6)))
            .unwrap();
        assert!(!store.take_changed());
    }

    #[test]
    fn test_concurrent_insert_single_winner() {
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..64u64)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .insert_if_absent("shared", Arc::new(SessionData::new(i)))
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<SessionData>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winner = store.get("shared").unwrap().unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &winner)));
        assert_eq!(store.len().unwrap(), 1);
    }
}
