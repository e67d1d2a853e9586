//! Persisted session record.

use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    auth::Identity,
    storage::{KeyValueStorage, StorageError},
};

/// Storage key holding the JSON identity.
pub const IDENTITY_KEY: &str = "user";

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "access_token";

/// Identity and token as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Stored user.
    pub identity: Identity,

    /// Stored bearer token.
    pub token: String,
}

/// The two session entries in durable storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// A store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Persist `identity` and `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry cannot be written. The identity entry is removed
    /// again when the token write fails.
    pub fn write(&self, identity: &Identity, token: &str) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(identity).map_err(StorageError::Encode)?;

        self.storage.set(IDENTITY_KEY, &serialized)?;

        if let Err(write_error) = self.storage.set(TOKEN_KEY, token) {
            if let Err(cleanup_error) = self.storage.remove(IDENTITY_KEY) {
                error!("failed to roll back identity after token write failure: {cleanup_error}");
            }

            return Err(write_error);
        }

        Ok(())
    }

    /// Read the stored session.
    ///
    /// A partial record, unparsable identity JSON, or an identity without roles is
    /// discarded: the store is cleared and `None` returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when the storage itself fails.
    pub fn read(&self) -> Result<Option<SessionRecord>, StorageError> {
        let identity = self.storage.get(IDENTITY_KEY)?;
        let token = self.storage.get(TOKEN_KEY)?;

        let (identity, token) = match (identity, token) {
            (None, None) => return Ok(None),
            (Some(identity), Some(token)) => (identity, token),
            _ => {
                warn!("discarding partial stored session");

                self.clear()?;

                return Ok(None);
            }
        };

        match serde_json::from_str::<Identity>(&identity) {
            Ok(identity) if !identity.roles.is_empty() => Ok(Some(SessionRecord { identity, token })),
            Ok(_) => {
                warn!("discarding stored identity without roles");

                self.clear()?;

                Ok(None)
            }
            Err(parse_error) => {
                warn!("discarding unparsable stored identity: {parse_error}");

                self.clear()?;

                Ok(None)
            }
        }
    }

    /// Remove both entries. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(IDENTITY_KEY)?;
        self.storage.remove(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::storage::{MemoryStorage, MockKeyValueStorage};

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());

        (Arc::clone(&storage), SessionStore::new(storage))
    }

    fn farmer() -> Identity {
        Identity::new("u1", "Bhavesh", "bhavesh@example.com", vec!["user".into()])
    }

    #[test]
    fn write_then_read() -> TestResult {
        let (_, store) = store();

        store.write(&farmer(), "abc")?;

        assert_eq!(
            store.read()?,
            Some(SessionRecord {
                identity: farmer(),
                token: "abc".into()
            })
        );

        Ok(())
    }

    #[test]
    fn unparsable_identity_clears_the_store() -> TestResult {
        let (storage, store) = store();

        storage.set(IDENTITY_KEY, "{not json")?;
        storage.set(TOKEN_KEY, "abc")?;

        assert_eq!(store.read()?, None);
        assert!(storage.is_empty());

        Ok(())
    }

    #[test]
    fn identity_without_roles_is_discarded() -> TestResult {
        let (storage, store) = store();

        storage.set(IDENTITY_KEY, r#"{"id":"1","name":"n","email":"e","role":[]}"#)?;
        storage.set(TOKEN_KEY, "abc")?;

        assert_eq!(store.read()?, None);
        assert!(storage.is_empty());

        Ok(())
    }

    #[test]
    fn partial_record_is_discarded() -> TestResult {
        let (storage, store) = store();

        storage.set(TOKEN_KEY, "abc")?;

        assert_eq!(store.read()?, None);
        assert!(storage.is_empty());

        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> TestResult {
        let (storage, store) = store();

        store.clear()?;
        store.write(&farmer(), "abc")?;
        store.clear()?;
        store.clear()?;

        assert!(storage.is_empty());

        Ok(())
    }

    #[test]
    fn failed_token_write_rolls_back_identity() {
        let mut storage = MockKeyValueStorage::new();

        storage
            .expect_set()
            .withf(|key, _| key == IDENTITY_KEY)
            .once()
            .returning(|_, _| Ok(()));

        storage
            .expect_set()
            .withf(|key, value| key == TOKEN_KEY && value == "abc")
            .once()
            .returning(|_, _| Err(StorageError::Unavailable("quota exceeded".into())));

        storage
            .expect_remove()
            .withf(|key| key == IDENTITY_KEY)
            .once()
            .returning(|_| Ok(()));

        let store = SessionStore::new(Arc::new(storage));

        assert!(matches!(
            store.write(&farmer(), "abc"),
            Err(StorageError::Unavailable(_))
        ));
    }
}
