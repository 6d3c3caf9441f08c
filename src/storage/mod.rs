pub mod json_backend;
pub mod memory;

use crate::errors::Result;

/// String key-value store holding the persisted application state.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;
