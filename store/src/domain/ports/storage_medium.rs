//! Port for the durable local medium beneath the record store.
//!
//! The medium is a flat key/document space: each [`StorageKey`] maps to one
//! JSON document, read and written whole. Adapters decide where the bytes
//! live (a directory of JSON files, process memory); the record store layers
//! typing and locking on top.

use std::fmt;

use super::define_port_error;

/// Keys under which the medium stores one JSON document each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// Every registered user, including stored passwords.
    Users,
    /// Snapshot of the active session's user, password stripped.
    CurrentUser,
    /// Every post.
    Posts,
    /// Every notification, filtered by recipient on read.
    Notifications,
    /// Every live stream, live or ended.
    LiveStreams,
    /// Blob map written by the local media uploader.
    UploadedFiles,
}

impl StorageKey {
    /// All keys, in lock-acquisition order.
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::CurrentUser,
        Self::Posts,
        Self::Notifications,
        Self::LiveStreams,
        Self::UploadedFiles,
    ];

    /// Persisted key name.
    ///
    /// # Examples
    ///
    /// ```
    /// use causeway_store::domain::ports::StorageKey;
    ///
    /// assert_eq!(StorageKey::LiveStreams.as_str(), "liveStreams");
    /// assert_eq!(StorageKey::UploadedFiles.as_str(), "uploaded_files");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::CurrentUser => "currentUser",
            Self::Posts => "posts",
            Self::Notifications => "notifications",
            Self::LiveStreams => "liveStreams",
            Self::UploadedFiles => "uploaded_files",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StorageKey> for String {
    fn from(value: StorageKey) -> Self {
        value.as_str().to_owned()
    }
}

define_port_error! {
    /// Errors raised by storage medium adapters.
    pub enum StorageMediumError {
        /// The medium itself could not be opened or reached.
        Unavailable { message: String } => "storage medium unavailable: {message}",
        /// Reading a document failed.
        Read { key: String, message: String } => "failed to read {key}: {message}",
        /// Writing or removing a document failed.
        Write { key: String, message: String } => "failed to write {key}: {message}",
    }
}

/// Durable key/document storage.
///
/// Implementations must make each `write` all-or-nothing for its key. There
/// is no atomicity across keys.
#[cfg_attr(test, mockall::automock)]
pub trait StorageMedium: Send + Sync {
    /// Read the document stored under `key`, or `None` if it was never
    /// written (or has been removed).
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageMediumError>;

    /// Replace the document stored under `key`.
    fn write(&self, key: StorageKey, contents: &str) -> Result<(), StorageMediumError>;

    /// Remove the document stored under `key`. Removing a missing key is not
    /// an error.
    fn remove(&self, key: StorageKey) -> Result<(), StorageMediumError>;
}
