use std::path::PathBuf;

use surfaceview_objects_store::file_store::FileBlobStore;

#[derive(Debug, Clone)]
pub struct ApiState {
    pub store: FileBlobStore,
}

impl ApiState {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            store: FileBlobStore::new(base_path),
        }
    }
}
