//! Port for turning an uploaded file into a stable content URI.
//!
//! The store never interprets blob contents. Posts, avatars and stream
//! thumbnails only carry the opaque URI this port returns.

use super::define_port_error;

/// A file handed over by the UI for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// Logical bucket, e.g. `avatars` or `posts`.
    pub bucket: String,
    /// Caller-chosen path inside the bucket.
    pub path: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type reported by the caller.
    pub content_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

define_port_error! {
    /// Errors raised by media uploader adapters.
    pub enum UploadError {
        /// The file had no contents.
        EmptyFile { file_name: String } => "file {file_name} is empty",
        /// The MIME type is missing or malformed.
        InvalidContentType { content_type: String } =>
            "invalid content type: {content_type}",
        /// The blob could not be stored.
        Storage { message: String } => "upload storage failed: {message}",
    }
}

/// External capability producing stable content URIs for files.
#[cfg_attr(test, mockall::automock)]
pub trait MediaUploader: Send + Sync {
    /// Store the file and return its stable URI.
    fn upload(&self, upload: &MediaUpload) -> Result<String, UploadError>;

    /// Resolve a URI previously returned by [`MediaUploader::upload`] to a
    /// displayable URL (for local storage, a `data:` URI).
    fn resolve(&self, uri: &str) -> Result<Option<String>, UploadError>;
}

/// Uploader that fabricates deterministic URIs without storing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMediaUploader;

impl MediaUploader for FixtureMediaUploader {
    fn upload(&self, upload: &MediaUpload) -> Result<String, UploadError> {
        Ok(format!(
            "fixture://{}/{}/{}",
            upload.bucket, upload.path, upload.file_name
        ))
    }

    fn resolve(&self, _uri: &str) -> Result<Option<String>, UploadError> {
        Ok(None)
    }
}
