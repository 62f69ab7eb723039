//! Session data container: per-client lookup and expiry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::data::SessionData;
use super::policy::ExpirationPolicy;
use super::store::{MemoryStore, SessionStore};
use crate::error::SessionError;
use crate::Result;

/// Holds session data for every client and decides when it is stale.
///
/// Expired data is never returned. It is discarded lazily when a client
/// comes back, and physically removed by [`sweep`](Self::sweep), which can
/// be run from a background task or, with implicit sweeps enabled, on
/// access at most once per resolution window.
pub struct SessionDataContainer {
    name: String,
    store: Arc<dyn SessionStore>,
    policy: RwLock<ExpirationPolicy>,
    clock: Arc<dyn Clock>,
    implicit_sweep: AtomicBool,
    last_sweep: AtomicU64,
}

impl SessionDataContainer {
    /// Create an in-memory container with default policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_store(name, Arc::new(MemoryStore::new()))
    }

    /// Create a container over an explicit store.
    pub fn with_store(name: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            name: name.into(),
            store,
            policy: RwLock::new(ExpirationPolicy::default()),
            clock: Arc::new(SystemClock),
            implicit_sweep: AtomicBool::new(false),
            last_sweep: AtomicU64::new(0),
        }
    }

    /// Replace the expiration policy.
    pub fn with_policy(self, policy: ExpirationPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
            ..self
        }
    }

    /// Replace the time source.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self { clock, ..self }
    }

    /// Enable or disable access-triggered sweeps.
    pub fn with_implicit_sweep(self, enabled: bool) -> Self {
        self.implicit_sweep.store(enabled, Ordering::Relaxed);
        self
    }

    /// Container name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label of the backing store.
    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    /// Current expiration policy.
    pub fn policy(&self) -> Result<ExpirationPolicy> {
        self.policy
            .read()
            .map(|p| *p)
            .map_err(|_| SessionError::LockPoisoned)
    }

    /// Set the inactivity timeout in seconds (0 = never expire).
    ///
    /// Rejected with [`SessionError::InvalidConfig`] if the current
    /// resolution would exceed it; the policy is left unchanged then.
    pub fn set_timeout(&self, secs: u64) -> Result<()> {
        let mut policy = self
            .policy
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        *policy = policy.with_timeout(secs)?;
        debug!(container = %self.name, timeout = secs, "Updated session timeout");
        Ok(())
    }

    /// Set the last-access resolution in seconds.
    ///
    /// Rejected with [`SessionError::InvalidConfig`] if it exceeds the
    /// timeout; the policy is left unchanged then.
    pub fn set_resolution(&self, secs: u64) -> Result<()> {
        let mut policy = self
            .policy
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        *policy = policy.with_resolution(secs)?;
        debug!(container = %self.name, resolution = secs, "Updated session resolution");
        Ok(())
    }

    /// Whether access-triggered sweeps are enabled.
    pub fn implicit_sweep(&self) -> bool {
        self.implicit_sweep.load(Ordering::Relaxed)
    }

    /// Enable or disable access-triggered sweeps.
    pub fn set_implicit_sweep(&self, enabled: bool) {
        self.implicit_sweep.store(enabled, Ordering::Relaxed);
    }

    /// Return live session data for `client_id` without creating any.
    ///
    /// Expired data is discarded and reported as absent.
    pub fn get(&self, client_id: &str) -> Result<Option<Arc<SessionData>>> {
        let now = self.clock.now();
        let policy = self.policy()?;
        self.maybe_implicit_sweep(now, &policy)?;
        self.lookup_live(client_id, now, &policy)
    }

    /// Return live session data for `client_id`, installing fresh empty data
    /// if there is none or the existing data expired.
    ///
    /// Concurrent callers for the same client always receive the same
    /// instance.
    pub fn get_or_create(&self, client_id: &str) -> Result<Arc<SessionData>> {
        let now = self.clock.now();
        let policy = self.policy()?;
        self.maybe_implicit_sweep(now, &policy)?;

        if let Some(existing) = self.lookup_live(client_id, now, &policy)? {
            return Ok(existing);
        }

        let fresh = Arc::new(SessionData::new(now));
        let installed = self.store.insert_if_absent(client_id, Arc::clone(&fresh))?;
        if Arc::ptr_eq(&installed, &fresh) {
            debug!(container = %self.name, client_id = %client_id, "Created session data");
        } else {
            installed.touch(now, &policy);
        }
        Ok(installed)
    }

    /// Discard the data for `client_id`. Returns `true` if anything was removed.
    pub fn remove(&self, client_id: &str) -> Result<bool> {
        let removed = self.store.remove(client_id)?.is_some();
        if removed {
            debug!(container = %self.name, client_id = %client_id, "Removed session data");
        }
        Ok(removed)
    }

    fn lookup_live(
        &self,
        client_id: &str,
        now: u64,
        policy: &ExpirationPolicy,
    ) -> Result<Option<Arc<SessionData>>> {
        let Some(existing) = self.store.get(client_id)? else {
            return Ok(None);
        };

        if policy.is_expired(existing.last_access_time(), now) {
            let expired = |data: &SessionData| policy.is_expired(data.last_access_time(), now);
            if self.store.remove_if(client_id, &expired)?.is_some() {
                debug!(
                    container = %self.name,
                    client_id = %client_id,
                    last_access = existing.last_access_time(),
                    "Discarded expired session data"
                );
            }
            // A concurrent caller may already have installed fresh data.
            return match self.store.get(client_id)? {
                Some(current) if !Arc::ptr_eq(&current, &existing) => {
                    current.touch(now, policy);
                    Ok(Some(current))
                }
                _ => Ok(None),
            };
        }

        existing.touch(now, policy);
        // A sweep may have evicted the entry between the expiry check and
        // the touch; never hand out an instance the store no longer holds.
        match self.store.get(client_id)? {
            Some(current) if Arc::ptr_eq(&current, &existing) => Ok(Some(existing)),
            Some(current) => {
                current.touch(now, policy);
                Ok(Some(current))
            }
            None => Ok(None),
        }
    }

    fn maybe_implicit_sweep(&self, now: u64, policy: &ExpirationPolicy) -> Result<()> {
        if !self.implicit_sweep() || !policy.expires() {
            return Ok(());
        }
        let last = self.last_sweep.load(Ordering::Acquire);
        if now.saturating_sub(last) <= policy.resolution() {
            return Ok(());
        }
        // Only the caller that wins the exchange sweeps this window.
        if self
            .last_sweep
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        trace!(container = %self.name, "Running implicit sweep");
        self.sweep_at(now, policy)?;
        Ok(())
    }

    /// Remove every entry that is expired now. Returns how many were removed.
    ///
    /// Entries are evicted one at a time, oldest first; no lock is held for
    /// the whole scan, and each eviction re-checks expiry so data touched in
    /// the meantime survives.
    pub fn sweep(&self) -> Result<usize> {
        let now = self.clock.now();
        let policy = self.policy()?;
        self.last_sweep.store(now, Ordering::Release);
        self.sweep_at(now, &policy)
    }

    fn sweep_at(&self, now: u64, policy: &ExpirationPolicy) -> Result<usize> {
        if !policy.expires() {
            return Ok(0);
        }

        let mut candidates = self.store.access_times()?;
        candidates.sort_by_key(|(_, last_access)| *last_access);

        let expired = |data: &SessionData| policy.is_expired(data.last_access_time(), now);
        let mut removed = 0;
        for (client_id, last_access) in candidates {
            if !policy.is_expired(last_access, now) {
                break;
            }
            if self.store.remove_if(&client_id, &expired)?.is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(container = %self.name, removed, "Swept expired session data");
        }
        Ok(removed)
    }

    /// Persist pending changes through the backing store.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for SessionDataContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDataContainer")
            .field("name", &self.name)
            .field("store", &self.store.kind())
            .field("policy", &self.policy)
            .field("implicit_sweep", &self.implicit_sweep)
            .finish()
    }
}
