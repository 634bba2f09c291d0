use std::{
    fs::File,
    io::{Read, Write},
    path::PathBuf,
};

use log::debug;
use sha2::{Digest, Sha256};

use crate::blob_store::BlobStore;

/// Keeps blobs under `root/<bucket>/<h[0..2]>/<h[2..4]>/<h>`, where `h` is
/// the sha256 of the object name. Contents are brotli compressed.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

#[derive(Debug)]
pub enum FileStoreError {
    IOError(std::io::Error),
    InvalidBucketName(String),
}

impl std::fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStoreError::IOError(e) => write!(f, "{}", e),
            FileStoreError::InvalidBucketName(name) => {
                write!(f, "invalid bucket name: {:?}", name)
            }
        }
    }
}

impl std::error::Error for FileStoreError {}

impl FileBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_dir_and_id(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<(PathBuf, String), FileStoreError> {
        if !is_valid_bucket_name(bucket) {
            return Err(FileStoreError::InvalidBucketName(bucket.to_string()));
        }
        let id = self.calc_sha256(name.as_bytes());
        let dir = self.root.join(bucket).join(&id[0..2]).join(&id[2..4]);
        Ok((dir, id))
    }

    fn blob_path(&self, bucket: &str, name: &str) -> Result<PathBuf, FileStoreError> {
        let (dir, id) = self.blob_dir_and_id(bucket, name)?;
        Ok(dir.join(id))
    }

    fn save_file(&self, bucket: &str, name: &str, data: &[u8]) -> Result<(), FileStoreError> {
        let (dir, id) = self.blob_dir_and_id(bucket, name)?;

        std::fs::create_dir_all(&dir).map_err(FileStoreError::IOError)?;

        let path = dir.join(id);
        debug!("writing blob {}/{} to {}", bucket, name, path.display());
        // CompressorWriter ignores errors when finishing, so it only ever
        // finishes into memory
        let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
        writer.write_all(data).map_err(FileStoreError::IOError)?;
        let compressed = writer.into_inner();

        let mut file = File::create(&path).map_err(FileStoreError::IOError)?;
        file.write_all(&compressed).map_err(FileStoreError::IOError)?;
        file.flush().map_err(FileStoreError::IOError)?;

        Ok(())
    }

    fn read_file(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, FileStoreError> {
        let path = self.blob_path(bucket, name)?;

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileStoreError::IOError(e)),
        };
        let mut reader = brotli::Decompressor::new(file, 4096);
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(FileStoreError::IOError)?;

        Ok(Some(data))
    }

    fn calc_sha256(&self, data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        format!("{:x}", result)
    }
}

// Same character set GCS accepts; also keeps the bucket a single path component.
fn is_valid_bucket_name(bucket: &str) -> bool {
    !bucket.is_empty()
        && bucket != "."
        && bucket != ".."
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}

impl BlobStore for FileBlobStore {
    type Error = FileStoreError;

    fn check_blob_exists(&self, bucket: &str, name: &str) -> Result<bool, Self::Error> {
        let path = self.blob_path(bucket, name)?;
        Ok(path.exists())
    }

    fn save_blob(&self, bucket: &str, name: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.save_file(bucket, name, data)
    }

    fn get_blob(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.read_file(bucket, name)
    }
}
