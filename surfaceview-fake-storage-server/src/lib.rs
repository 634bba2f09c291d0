//! Serves the parts of the Google Cloud Storage JSON API that the uploader
//! talks to, backed by a local `FileBlobStore`.

pub mod api;
pub mod state;
