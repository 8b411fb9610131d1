//! Typed collections over a [`StorageMedium`].
//!
//! Every collection is one JSON array stored under its [`StorageKey`] and is
//! read and replaced whole. Writers go through [`RecordStore::update`],
//! which holds the collection's mutex across the read-modify-write so two
//! services cannot interleave and lose each other's changes.
//!
//! Lock discipline: never call `update` from inside another `update`
//! closure. Services that touch several collections finish one update
//! before starting the next, in the order users, posts, notifications,
//! live streams.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Error;
use super::ports::{StorageKey, StorageMedium, StorageMediumError, define_port_error};

define_port_error! {
    /// Errors raised while loading or saving collections.
    pub enum RecordStoreError {
        /// The medium failed.
        Medium { message: String } => "storage medium failed: {message}",
        /// A stored document is not valid JSON of the expected shape.
        Decode { key: String, message: String } => "stored {key} is corrupt: {message}",
        /// A collection could not be serialised.
        Encode { key: String, message: String } => "failed to encode {key}: {message}",
    }
}

impl From<StorageMediumError> for RecordStoreError {
    fn from(value: StorageMediumError) -> Self {
        Self::medium(value.to_string())
    }
}

impl From<RecordStoreError> for Error {
    fn from(value: RecordStoreError) -> Self {
        Self::internal(value.to_string())
    }
}

/// A type stored as one element of a keyed collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Collection key.
    const KEY: StorageKey;
    /// Identifier type used by [`RecordStore::find_by_id`].
    type Id: PartialEq;

    /// The record's identifier.
    fn id(&self) -> &Self::Id;
}

/// Result of an update closure: whether the collection must be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    /// The collection changed and will be written back.
    Changed(T),
    /// Nothing changed; the write is skipped.
    Unchanged(T),
}

impl<T> Mutation<T> {
    fn into_parts(self) -> (bool, T) {
        match self {
            Self::Changed(value) => (true, value),
            Self::Unchanged(value) => (false, value),
        }
    }
}

#[derive(Debug, Default)]
struct CollectionLocks {
    users: Mutex<()>,
    current_user: Mutex<()>,
    posts: Mutex<()>,
    notifications: Mutex<()>,
    live_streams: Mutex<()>,
    uploaded_files: Mutex<()>,
}

impl CollectionLocks {
    fn acquire(&self, key: StorageKey) -> MutexGuard<'_, ()> {
        let lock = match key {
            StorageKey::Users => &self.users,
            StorageKey::CurrentUser => &self.current_user,
            StorageKey::Posts => &self.posts,
            StorageKey::Notifications => &self.notifications,
            StorageKey::LiveStreams => &self.live_streams,
            StorageKey::UploadedFiles => &self.uploaded_files,
        };
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keyed, typed collections with one lock per key.
pub struct RecordStore {
    medium: Arc<dyn StorageMedium>,
    locks: CollectionLocks,
}

impl RecordStore {
    /// Create a store over `medium`.
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self {
            medium,
            locks: CollectionLocks::default(),
        }
    }

    /// The underlying medium.
    pub fn medium(&self) -> &Arc<dyn StorageMedium> {
        &self.medium
    }

    /// Load every record of `R`; an unwritten collection is empty.
    pub fn get_all<R: Record>(&self) -> Result<Vec<R>, RecordStoreError> {
        Ok(self.get_document(R::KEY)?.unwrap_or_default())
    }

    /// Replace the whole collection of `R`. Last writer wins.
    pub fn put_all<R: Record>(&self, records: &[R]) -> Result<(), RecordStoreError> {
        let _guard = self.locks.acquire(R::KEY);
        self.write_json(R::KEY, records)
    }

    /// Find a record by id with a linear scan.
    pub fn find_by_id<R: Record>(&self, id: &R::Id) -> Result<Option<R>, RecordStoreError> {
        Ok(self
            .get_all::<R>()?
            .into_iter()
            .find(|record| record.id() == id))
    }

    /// Read-modify-write the collection of `R` under its lock.
    ///
    /// `f` receives the loaded collection. The collection is written back
    /// only when `f` returns `Ok(Mutation::Changed(_))`; an error or
    /// `Mutation::Unchanged` leaves storage untouched.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use causeway_store::domain::{Mutation, RecordStore, RecordStoreError};
    /// use causeway_store::domain::UserRecord;
    /// use causeway_store::outbound::persistence::InMemoryMedium;
    ///
    /// let store = RecordStore::new(Arc::new(InMemoryMedium::default()));
    /// let count = store
    ///     .update::<UserRecord, _, RecordStoreError, _>(|users| {
    ///         Ok(Mutation::Unchanged(users.len()))
    ///     })
    ///     .unwrap();
    /// assert_eq!(count, 0);
    /// ```
    pub fn update<R, T, E, F>(&self, f: F) -> Result<T, E>
    where
        R: Record,
        E: From<RecordStoreError>,
        F: FnOnce(&mut Vec<R>) -> Result<Mutation<T>, E>,
    {
        let _guard = self.locks.acquire(R::KEY);
        let mut records: Vec<R> = self.read_json(R::KEY)?.unwrap_or_default();
        let (changed, value) = f(&mut records)?.into_parts();
        if changed {
            self.write_json(R::KEY, &records)?;
        } else {
            debug!(key = %R::KEY, "update left collection unchanged");
        }
        Ok(value)
    }

    /// Load a single document.
    pub fn get_document<D: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<D>, RecordStoreError> {
        self.read_json(key)
    }

    /// Replace a single document.
    pub fn put_document<D: Serialize + ?Sized>(
        &self,
        key: StorageKey,
        document: &D,
    ) -> Result<(), RecordStoreError> {
        let _guard = self.locks.acquire(key);
        self.write_json(key, document)
    }

    /// Remove a single document. Removing an absent document succeeds.
    pub fn remove_document(&self, key: StorageKey) -> Result<(), RecordStoreError> {
        let _guard = self.locks.acquire(key);
        self.medium.remove(key)?;
        debug!(key = %key, "removed document");
        Ok(())
    }

    /// Read-modify-write a single document under its lock, starting from
    /// `D::default()` when absent. Same write rules as [`Self::update`].
    pub fn update_document<D, T, E, F>(&self, key: StorageKey, f: F) -> Result<T, E>
    where
        D: Serialize + DeserializeOwned + Default,
        E: From<RecordStoreError>,
        F: FnOnce(&mut D) -> Result<Mutation<T>, E>,
    {
        let _guard = self.locks.acquire(key);
        let mut document: D = self.read_json(key)?.unwrap_or_default();
        let (changed, value) = f(&mut document)?.into_parts();
        if changed {
            self.write_json(key, &document)?;
        }
        Ok(value)
    }

    fn read_json<D: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<D>, RecordStoreError> {
        let Some(raw) = self.medium.read(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| RecordStoreError::decode(key, err.to_string()))
    }

    fn write_json<D: Serialize + ?Sized>(
        &self,
        key: StorageKey,
        document: &D,
    ) -> Result<(), RecordStoreError> {
        let raw = serde_json::to_string(document)
            .map_err(|err| RecordStoreError::encode(key, err.to_string()))?;
        self.medium.write(key, &raw)?;
        debug!(key = %key, bytes = raw.len(), "wrote document");
        Ok(())
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}
