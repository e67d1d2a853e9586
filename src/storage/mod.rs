//! Durable key-value storage backends.

use mockall::automock;

mod errors;
mod file;
mod memory;

pub use errors::*;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// String key-value storage that survives restarts (the browser's local storage, a file).
#[automock]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
