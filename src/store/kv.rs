use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::PersistenceError;

/// String-keyed blob storage. Values are JSON documents encoded by the caller.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Only used to roll back a failed import; categories are never deleted otherwise.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

/// In-process store. Nothing survives the process; used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw value without going through the trait's error type.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Memory store whose writes can be made to fail, for exercising error paths.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    /// Number of further `set` calls that succeed before writes start failing.
    /// `None` means writes never fail.
    pub writes_left: Mutex<Option<usize>>,
    /// Writes to this key always fail.
    pub fail_key: Mutex<Option<String>>,
    pub fail_reads: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStore {
    pub fn failing_after(writes: usize) -> Self {
        let store = Self::default();
        *store.writes_left.lock().unwrap() = Some(writes);
        store
    }

    pub fn failing_on(key: &str) -> Self {
        let store = Self::default();
        *store.fail_key.lock().unwrap() = Some(key.to_string());
        store
    }

    pub fn heal(&self) {
        *self.writes_left.lock().unwrap() = None;
        *self.fail_key.lock().unwrap() = None;
    }
}

#[cfg(test)]
impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("reads disabled".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.fail_key.lock().unwrap().as_deref() == Some(key) {
            return Err(PersistenceError::Unavailable(format!("cannot write {key}")));
        }
        let mut left = self.writes_left.lock().unwrap();
        match left.as_mut() {
            Some(0) => return Err(PersistenceError::Unavailable("disk full".to_string())),
            Some(n) => *n -= 1,
            None => {}
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.inner.remove(key)
    }
}
