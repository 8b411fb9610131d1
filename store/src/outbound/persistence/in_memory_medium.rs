//! Storage medium held in process memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::{StorageKey, StorageMedium, StorageMediumError};

/// Medium that forgets everything when dropped. Backs ephemeral mode and
/// tests.
#[derive(Debug, Default)]
pub struct InMemoryMedium {
    documents: Mutex<HashMap<StorageKey, String>>,
}

impl InMemoryMedium {
    /// Medium pre-populated with `documents`.
    pub fn with_documents(documents: impl IntoIterator<Item = (StorageKey, String)>) -> Self {
        Self {
            documents: Mutex::new(documents.into_iter().collect()),
        }
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<StorageKey, String>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageMedium for InMemoryMedium {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageMediumError> {
        Ok(self.documents().get(&key).cloned())
    }

    fn write(&self, key: StorageKey, contents: &str) -> Result<(), StorageMediumError> {
        self.documents().insert(key, contents.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageMediumError> {
        self.documents().remove(&key);
        Ok(())
    }
}
