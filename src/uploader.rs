//! Frame upload pipeline.

use crate::keys;
use crate::store::{ObjectStore, ObjectUpload, StoreError};
use bytes::Bytes;
use chrono::{Duration as TimeDelta, Utc};
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Content type recorded on every uploaded frame.
pub const FRAME_CONTENT_TYPE: &str = "image/png";

/// Errors from the upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("refusing to upload an empty frame")]
    EmptyFrame,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Uploads captured frames under sortable keys.
pub struct FrameUploader<S> {
    store: Arc<S>,
    folder: String,
    retention_days: i32,
}

impl<S: ObjectStore> FrameUploader<S> {
    pub fn new(store: Arc<S>, folder: &str, retention_days: i32) -> Self {
        Self {
            store,
            folder: folder.to_string(),
            retention_days,
        }
    }

    /// Upload one captured frame and return the object key written.
    ///
    /// The key is derived from the clock at upload time, not capture
    /// time, so a cycle retried after backoff never reuses a key.
    pub async fn upload(&self, frame: Bytes) -> Result<String, UploadError> {
        if frame.is_empty() {
            return Err(UploadError::EmptyFrame);
        }

        let now = Utc::now();
        let key = format!("{}/{}", self.folder, keys::object_key(now));
        let size = frame.len();

        info!(key = %key, bytes = size, "uploading frame");

        let expires = (self.retention_days > 0)
            .then(|| now + TimeDelta::days(i64::from(self.retention_days)));

        self.store
            .put_object(ObjectUpload {
                key: key.clone(),
                body: frame,
                content_type: FRAME_CONTENT_TYPE.to_string(),
                public_read: true,
                expires,
            })
            .await?;

        counter!("frames_uploaded_total").increment(1);
        counter!("frame_bytes_uploaded_total").increment(size as u64);

        Ok(key)
    }
}
