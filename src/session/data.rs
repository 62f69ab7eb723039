//! Per-client session data: namespaced packages plus last-access bookkeeping.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::package::PackageData;
use super::policy::ExpirationPolicy;
use crate::error::SessionError;
use crate::Result;

/// All session data one container holds for one client.
///
/// Namespaces ("package ids") partition the data by owning subsystem. Only
/// namespaces that were actually created are visible through
/// [`namespaces`](Self::namespaces) and
/// [`contains_package`](Self::contains_package).
#[derive(Debug)]
pub struct SessionData {
    last_access: AtomicU64,
    packages: RwLock<HashMap<String, Arc<PackageData>>>,
    dirty: Arc<AtomicBool>,
}

impl SessionData {
    /// Create empty session data stamped with `now`.
    pub fn new(now: u64) -> Self {
        Self {
            last_access: AtomicU64::new(now),
            packages: RwLock::new(HashMap::new()),
            dirty: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Approximate epoch time this data was last accessed.
    pub fn last_access_time(&self) -> u64 {
        self.last_access.load(Ordering::Acquire)
    }

    /// Record an access at `now`, subject to the policy's resolution.
    ///
    /// Returns `true` if the recorded time was advanced. The recorded time
    /// only ever moves forward: racing callers converge on the latest `now`
    /// among those that decided to write.
    pub fn touch(&self, now: u64, policy: &ExpirationPolicy) -> bool {
        let last = self.last_access_time();
        if !policy.needs_touch(last, now) {
            return false;
        }
        let previous = self.last_access.fetch_max(now, Ordering::AcqRel);
        if previous < now {
            self.mark_dirty();
            tracing::trace!(last_access = now, previous, "Recorded session access");
            true
        } else {
            false
        }
    }

    /// Look up the package for `namespace` without creating it.
    pub fn get_package(&self, namespace: &str) -> Result<Option<Arc<PackageData>>> {
        let packages = self
            .packages
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(packages.get(namespace).cloned())
    }

    /// Look up the package for `namespace`, creating an empty one on first use.
    ///
    /// Concurrent callers for the same namespace all receive the same instance.
    pub fn get_or_create_package(&self, namespace: &str) -> Result<Arc<PackageData>> {
        if let Some(existing) = self.get_package(namespace)? {
            return Ok(existing);
        }

        let mut packages = self
            .packages
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let package = packages
            .entry(namespace.to_string())
            .or_insert_with(|| {
                self.mark_dirty();
                Arc::new(PackageData::new(Arc::clone(&self.dirty)))
            });
        Ok(Arc::clone(package))
    }

    /// Drop the package for `namespace`, returning it if it existed.
    pub fn remove_package(&self, namespace: &str) -> Result<Option<Arc<PackageData>>> {
        let mut packages = self
            .packages
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let removed = packages.remove(namespace);
        if removed.is_some() {
            self.mark_dirty();
        }
        Ok(removed)
    }

    /// Check if a package was created for `namespace`.
    pub fn contains_package(&self, namespace: &str) -> Result<bool> {
        let packages = self
            .packages
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(packages.contains_key(namespace))
    }

    /// Namespaces that have a package, in sorted order.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let packages = self
            .packages
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        let mut names: Vec<String> = packages.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Whether anything changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty flag after the data has been persisted.
    pub fn mark_clean(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Capture a serializable copy of this data.
    pub fn to_stored(&self) -> Result<StoredSession> {
        let packages = self
            .packages
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        let mut stored = BTreeMap::new();
        for (namespace, package) in packages.iter() {
            stored.insert(namespace.clone(), package.snapshot()?);
        }
        Ok(StoredSession {
            last_access: self.last_access_time(),
            packages: stored,
        })
    }

    /// Rebuild session data from its stored form. The result starts clean.
    pub fn from_stored(stored: StoredSession) -> Self {
        let dirty = Arc::new(AtomicBool::new(false));
        let packages = stored
            .packages
            .into_iter()
            .map(|(namespace, items)| {
                let items: HashMap<String, Value> = items.into_iter().collect();
                let package = PackageData::from_items(items, Arc::clone(&dirty));
                (namespace, Arc::new(package))
            })
            .collect();

        Self {
            last_access: AtomicU64::new(stored.last_access),
            packages: RwLock::new(packages),
            dirty,
        }
    }
}

/// Serialized form of [`SessionData`] used by durable stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Last recorded access, epoch seconds.
    pub last_access: u64,
    /// Namespace -> key -> value.
    #[serde(default)]
    pub packages: BTreeMap<String, BTreeMap<String, Value>>,
}
