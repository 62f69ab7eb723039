//! Per-namespace key/value mapping handed to callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SessionError;
use crate::Result;

/// Session data for one namespace of one client.
///
/// Values are held as [`serde_json::Value`], so anything stored here has
/// already proven it can be serialized. Every mutation flags the owning
/// [`SessionData`](super::SessionData) as dirty so durable stores know to
/// write it back.
#[derive(Debug)]
pub struct PackageData {
    items: RwLock<HashMap<String, Value>>,
    dirty: Arc<AtomicBool>,
}

impl PackageData {
    pub(crate) fn new(dirty: Arc<AtomicBool>) -> Self {
        Self::from_items(HashMap::new(), dirty)
    }

    pub(crate) fn from_items(items: HashMap<String, Value>, dirty: Arc<AtomicBool>) -> Self {
        Self {
            items: RwLock::new(items),
            dirty,
        }
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Get a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let items = self.items.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    /// Get the value under `key`, failing with [`SessionError::NotFound`] if absent.
    pub fn require(&self, key: &str) -> Result<Value> {
        self.get(key)?
            .ok_or_else(|| SessionError::NotFound(format!("key '{}'", key)))
    }

    /// Get the value under `key` decoded as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a JSON value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        let mut items = self.items.write().map_err(|_| SessionError::LockPoisoned)?;
        let previous = items.insert(key.into(), value);
        self.mark_dirty();
        Ok(previous)
    }

    /// Serialize `value` and store it, returning the previous value.
    ///
    /// Fails with [`SessionError::Serialization`] if `value` has no JSON form;
    /// nothing is stored in that case.
    pub fn insert<T: Serialize + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Option<Value>> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let mut items = self.items.write().map_err(|_| SessionError::LockPoisoned)?;
        let removed = items.remove(key);
        if removed.is_some() {
            self.mark_dirty();
        }
        Ok(removed)
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        let items = self.items.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(items.contains_key(key))
    }

    /// List stored keys in sorted order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let items = self.items.read().map_err(|_| SessionError::LockPoisoned)?;
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize> {
        let items = self.items.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(items.len())
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every key.
    pub fn clear(&self) -> Result<()> {
        let mut items = self.items.write().map_err(|_| SessionError::LockPoisoned)?;
        if !items.is_empty() {
            items.clear();
            self.mark_dirty();
        }
        Ok(())
    }

    /// Copy of all entries, ordered by key.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Value>> {
        let items = self.items.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
