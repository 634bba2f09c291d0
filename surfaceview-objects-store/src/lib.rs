pub mod any_store;
pub mod blob_store;
pub mod file_store;
pub mod gcs_store;
pub mod upload;

pub use blob_store::BlobStore;
pub use upload::{upload_to_bucket, UploadOptions, UploadOutcome};
