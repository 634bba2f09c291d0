use crate::{
    blob_store::BlobStore,
    file_store::{FileBlobStore, FileStoreError},
    gcs_store::{GcsBlobStore, GcsBlobStoreError},
};

#[derive(Debug, Clone)]
pub enum AnyBlobStore {
    Gcs(GcsBlobStore),
    File(FileBlobStore),
}

#[derive(Debug)]
pub enum AnyBlobStoreError {
    Gcs(GcsBlobStoreError),
    File(FileStoreError),
}

impl std::fmt::Display for AnyBlobStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyBlobStoreError::Gcs(e) => write!(f, "{}", e),
            AnyBlobStoreError::File(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AnyBlobStoreError {}

impl BlobStore for AnyBlobStore {
    type Error = AnyBlobStoreError;

    fn check_blob_exists(&self, bucket: &str, name: &str) -> Result<bool, Self::Error> {
        match self {
            AnyBlobStore::Gcs(store) => store
                .check_blob_exists(bucket, name)
                .map_err(AnyBlobStoreError::Gcs),
            AnyBlobStore::File(store) => store
                .check_blob_exists(bucket, name)
                .map_err(AnyBlobStoreError::File),
        }
    }

    fn save_blob(&self, bucket: &str, name: &str, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            AnyBlobStore::Gcs(store) => store
                .save_blob(bucket, name, data)
                .map_err(AnyBlobStoreError::Gcs),
            AnyBlobStore::File(store) => store
                .save_blob(bucket, name, data)
                .map_err(AnyBlobStoreError::File),
        }
    }

    fn get_blob(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            AnyBlobStore::Gcs(store) => store.get_blob(bucket, name).map_err(AnyBlobStoreError::Gcs),
            AnyBlobStore::File(store) => store
                .get_blob(bucket, name)
                .map_err(AnyBlobStoreError::File),
        }
    }
}
