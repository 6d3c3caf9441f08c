use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::errors::{ExpenseError, Result};

use super::StorageBackend;

/// Volatile store; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ExpenseError::Storage("memory store lock poisoned".into()))
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_remove() {
        let store = MemoryStorage::new();
        assert!(!store.contains("budget").unwrap());
        store.write("budget", "4200").unwrap();
        assert_eq!(store.read("budget").unwrap().as_deref(), Some("4200"));
        store.remove("budget").unwrap();
        assert!(store.read("budget").unwrap().is_none());
    }
}
