use log::{debug, info};

use crate::blob_store::BlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite an existing blob. When false and the blob exists, nothing is uploaded.
    pub replace: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self { replace: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Skipped,
}

/// Uploads `data` to `bucket/destination_name`.
///
/// With `replace: false` the existence check and the upload are two separate
/// requests, so two concurrent callers may both upload; the last write wins.
/// Errors from `store` are returned untouched.
pub fn upload_to_bucket<S: BlobStore + ?Sized>(
    store: &S,
    bucket: &str,
    destination_name: &str,
    data: &[u8],
    options: UploadOptions,
) -> Result<UploadOutcome, S::Error> {
    if !options.replace && store.check_blob_exists(bucket, destination_name)? {
        debug!(
            "{}/{} already exists, skipping upload",
            bucket, destination_name
        );
        return Ok(UploadOutcome::Skipped);
    }

    store.save_blob(bucket, destination_name, data)?;
    info!(
        "uploaded {} bytes to {}/{}",
        data.len(),
        bucket,
        destination_name
    );
    Ok(UploadOutcome::Uploaded)
}
