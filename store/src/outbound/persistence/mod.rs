//! Storage media and blob storage adapters.

mod atomic_io;
mod blob_store;
mod in_memory_medium;
mod json_directory_medium;

pub use blob_store::{LocalBlobUploader, StoredBlob};
pub use in_memory_medium::InMemoryMedium;
pub use json_directory_medium::JsonDirectoryMedium;
