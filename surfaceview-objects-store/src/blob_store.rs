/// A bucket/name addressed object store.
pub trait BlobStore {
    type Error;

    fn check_blob_exists(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<bool, <Self as BlobStore>::Error>;

    /// Writes the whole object, replacing any previous content.
    fn save_blob(
        &self,
        bucket: &str,
        name: &str,
        data: &[u8],
    ) -> Result<(), <Self as BlobStore>::Error>;

    fn get_blob(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<Option<Vec<u8>>, <Self as BlobStore>::Error>;
}
