//! Local media uploader backed by the `uploaded_files` document.
//!
//! Blobs are kept inline as base64 `data:` URIs in a single map keyed by
//! blob id. Ids have the form `<bucket>_<path>_<uuid>` and are what posts,
//! avatars and thumbnails store as their media URI.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{MediaUpload, MediaUploader, StorageKey, UploadError};
use crate::domain::{Mutation, RecordStore, RecordStoreError};

type BlobMap = BTreeMap<String, StoredBlob>;

/// One entry of the `uploaded_files` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    /// Blob id, also the map key.
    pub id: String,
    /// `data:<type>;base64,<payload>` URI.
    pub data: String,
    /// MIME type reported at upload.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Original file name.
    pub name: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// [`MediaUploader`] that keeps blobs in the record store.
#[derive(Clone)]
pub struct LocalBlobUploader {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
}

impl LocalBlobUploader {
    /// Create an uploader writing through `store`.
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl MediaUploader for LocalBlobUploader {
    fn upload(&self, upload: &MediaUpload) -> Result<String, UploadError> {
        if upload.bytes.is_empty() {
            return Err(UploadError::empty_file(upload.file_name.as_str()));
        }
        if !is_mime_type(&upload.content_type) {
            return Err(UploadError::invalid_content_type(
                upload.content_type.as_str(),
            ));
        }

        let id = format!("{}_{}_{}", upload.bucket, upload.path, Uuid::new_v4());
        let blob = StoredBlob {
            id: id.clone(),
            data: format!(
                "data:{};base64,{}",
                upload.content_type,
                STANDARD.encode(&upload.bytes)
            ),
            content_type: upload.content_type.clone(),
            name: upload.file_name.clone(),
            uploaded_at: self.clock.utc(),
        };
        self.store
            .update_document::<BlobMap, _, RecordStoreError, _>(StorageKey::UploadedFiles, |blobs| {
                blobs.insert(blob.id.clone(), blob);
                Ok(Mutation::Changed(()))
            })
            .map_err(|err| {
                warn!(blob_id = %id, error = %err, "failed to store upload");
                UploadError::storage(err.to_string())
            })?;
        info!(blob_id = %id, bytes = upload.bytes.len(), "stored upload");
        Ok(id)
    }

    fn resolve(&self, uri: &str) -> Result<Option<String>, UploadError> {
        let blobs: Option<BlobMap> = self
            .store
            .get_document(StorageKey::UploadedFiles)
            .map_err(|err| UploadError::storage(err.to_string()))?;
        Ok(blobs.and_then(|mut map| map.remove(uri)).map(|blob| blob.data))
    }
}

fn is_mime_type(value: &str) -> bool {
    value.split_once('/').is_some_and(|(kind, subtype)| {
        !kind.is_empty()
            && !subtype.is_empty()
            && !value.contains(char::is_whitespace)
            && !subtype.contains('/')
    })
}
