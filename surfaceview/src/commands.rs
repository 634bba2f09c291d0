use std::path::{Path, PathBuf};

use log::{debug, info};
use surfaceview_config_file::{
    load_config, ConfigFileError, StorageConfigToml, SurfaceviewConfigToml,
};
use surfaceview_http_client::{http_json_post, HttpJsonPostError};
use surfaceview_mesh::{vtk_to_mesh_json, LegacyVtkConverter, VtkParseError, VtkToMeshJsonError};
use surfaceview_objects_store::{
    any_store::{AnyBlobStore, AnyBlobStoreError},
    file_store::FileBlobStore,
    gcs_store::{GcsBlobStore, DEFAULT_GCS_ENDPOINT},
    upload_to_bucket, UploadOptions, UploadOutcome,
};

use crate::args::{Args, Commands};

pub const ACCESS_TOKEN_ENV: &str = "SURFACEVIEW_GCS_ACCESS_TOKEN";

#[derive(Debug)]
pub enum CommandError {
    Config(ConfigFileError),
    IO(PathBuf, std::io::Error),
    InvalidJson(serde_json::Error),
    HttpJsonPost(HttpJsonPostError),
    MissingBucket,
    Storage(AnyBlobStoreError),
    Mesh(VtkToMeshJsonError<VtkParseError>),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Config(e) => write!(f, "{}", e),
            CommandError::IO(path, e) => write!(f, "{}: {}", path.display(), e),
            CommandError::InvalidJson(e) => write!(f, "invalid JSON body: {}", e),
            CommandError::HttpJsonPost(e) => write!(f, "{}", e),
            CommandError::MissingBucket => {
                write!(f, "no bucket given and storage.bucket is not configured")
            }
            CommandError::Storage(e) => write!(f, "{}", e),
            CommandError::Mesh(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {}

pub fn run(args: Args) -> Result<(), CommandError> {
    let config = match &args.config {
        Some(path) => load_config(path).map_err(CommandError::Config)?,
        None => SurfaceviewConfigToml::default(),
    };

    match args.subcommand {
        Commands::PostJson { url, data } => {
            let res = post_json(&url, &data)?;
            println!("{}", res);
        }
        Commands::Upload {
            bucket,
            name,
            file,
            no_replace,
        } => {
            let access_token = std::env::var(ACCESS_TOKEN_ENV).ok();
            let store = build_blob_store(&config.storage, access_token)?;
            let bucket = bucket
                .or_else(|| config.storage.bucket.clone())
                .ok_or(CommandError::MissingBucket)?;
            let options = UploadOptions {
                replace: !no_replace,
            };
            let outcome = upload_file(&store, &bucket, &name, &file, options)?;
            match outcome {
                UploadOutcome::Uploaded => println!("uploaded {}/{}", bucket, name),
                UploadOutcome::Skipped => {
                    println!("skipped {}/{} (already exists)", bucket, name)
                }
            }
        }
        Commands::VtkToMeshJson {
            vtk_path,
            json_path,
        } => {
            vtk_to_mesh_json(&LegacyVtkConverter::new(), &vtk_path, &json_path)
                .map_err(CommandError::Mesh)?;
        }
    }
    Ok(())
}

/// `data` is inline JSON, or `@path` naming a JSON file.
pub fn post_json(url: &str, data: &str) -> Result<serde_json::Value, CommandError> {
    let body: serde_json::Value = match data.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CommandError::IO(PathBuf::from(path), e))?;
            serde_json::from_str(&text).map_err(CommandError::InvalidJson)?
        }
        None => serde_json::from_str(data).map_err(CommandError::InvalidJson)?,
    };
    http_json_post(url, &body).map_err(CommandError::HttpJsonPost)
}

/// Picks the local store when `local_root` is configured, GCS otherwise.
/// A token from the environment wins over the configured one.
pub fn build_blob_store(
    storage: &StorageConfigToml,
    access_token_from_env: Option<String>,
) -> Result<AnyBlobStore, CommandError> {
    if let Some(root) = &storage.local_root {
        debug!("using local blob store at {}", root);
        return Ok(AnyBlobStore::File(FileBlobStore::new(PathBuf::from(root))));
    }

    let endpoint = storage.endpoint.as_deref().unwrap_or(DEFAULT_GCS_ENDPOINT);
    let access_token = access_token_from_env.or_else(|| storage.access_token.clone());
    debug!(
        "using gcs blob store at {} (token: {})",
        endpoint,
        access_token.is_some()
    );
    let store = GcsBlobStore::new(endpoint, access_token)
        .map_err(|e| CommandError::Storage(AnyBlobStoreError::Gcs(e)))?;
    Ok(AnyBlobStore::Gcs(store))
}

pub fn upload_file(
    store: &AnyBlobStore,
    bucket: &str,
    name: &str,
    file: &Path,
    options: UploadOptions,
) -> Result<UploadOutcome, CommandError> {
    let data = std::fs::read(file).map_err(|e| CommandError::IO(file.to_path_buf(), e))?;
    info!("read {} bytes from {}", data.len(), file.display());
    upload_to_bucket(store, bucket, name, &data, options).map_err(CommandError::Storage)
}

#[cfg(test)]
mod tests {
    use surfaceview_objects_store::BlobStore;
    use tempfile::tempdir;

    use super::*;

    fn local_storage(root: &Path) -> StorageConfigToml {
        StorageConfigToml {
            local_root: Some(root.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_local_blob_store() {
        let dir = tempdir().unwrap();
        let store = build_blob_store(&local_storage(dir.path()), None).unwrap();
        assert!(matches!(store, AnyBlobStore::File(_)));
    }

    #[test]
    fn test_build_gcs_blob_store_by_default() {
        let store = build_blob_store(&StorageConfigToml::default(), None).unwrap();
        assert!(matches!(store, AnyBlobStore::Gcs(_)));
    }

    #[test]
    fn test_build_gcs_blob_store_invalid_endpoint() {
        let storage = StorageConfigToml {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        let res = build_blob_store(&storage, None);
        assert!(matches!(res, Err(CommandError::Storage(_))));
    }

    #[test]
    fn test_upload_file_respects_replace() {
        let dir = tempdir().unwrap();
        let store = build_blob_store(&local_storage(&dir.path().join("blobs")), None).unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("second.bin");
        std::fs::write(&first, b"xyz").unwrap();
        std::fs::write(&second, b"abc").unwrap();

        let no_replace = UploadOptions { replace: false };
        let outcome = upload_file(&store, "bucket1", "k", &first, no_replace).unwrap();
        assert_eq!(outcome, UploadOutcome::Uploaded);
        let outcome = upload_file(&store, "bucket1", "k", &second, no_replace).unwrap();
        assert_eq!(outcome, UploadOutcome::Skipped);
        assert_eq!(store.get_blob("bucket1", "k").unwrap(), Some(b"xyz".to_vec()));

        let outcome =
            upload_file(&store, "bucket1", "k", &second, UploadOptions::default()).unwrap();
        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(store.get_blob("bucket1", "k").unwrap(), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_upload_missing_file() {
        let dir = tempdir().unwrap();
        let store = build_blob_store(&local_storage(dir.path()), None).unwrap();
        let res = upload_file(
            &store,
            "bucket1",
            "k",
            &dir.path().join("missing.bin"),
            UploadOptions::default(),
        );
        assert!(matches!(res, Err(CommandError::IO(_, _))));
    }

    #[test]
    fn test_post_json_rejects_invalid_body() {
        let res = post_json("http://127.0.0.1:1/", "{not json");
        assert!(matches!(res, Err(CommandError::InvalidJson(_))));
    }

    #[test]
    fn test_post_json_missing_body_file() {
        let dir = tempdir().unwrap();
        let arg = format!("@{}", dir.path().join("missing.json").display());
        let res = post_json("http://127.0.0.1:1/", &arg);
        assert!(matches!(res, Err(CommandError::IO(_, _))));
    }

    #[test]
    fn test_run_vtk_to_mesh_json() {
        let dir = tempdir().unwrap();
        let vtk_path = dir.path().join("tri.vtk");
        let json_path = dir.path().join("tri.json");
        std::fs::write(
            &vtk_path,
            "# vtk DataFile Version 3.0\ntri\nASCII\nDATASET POLYDATA\nPOINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 4\n3 0 1 2\n",
        )
        .unwrap();

        run(Args {
            config: None,
            subcommand: Commands::VtkToMeshJson {
                vtk_path,
                json_path: json_path.clone(),
            },
        })
        .unwrap();

        let text = std::fs::read_to_string(&json_path).unwrap();
        assert_eq!(
            text,
            r#"{"vertices":[[0.0,0.0,0.0],[1.0,0.0,0.0],[0.0,1.0,0.0]],"faces":[[0,1,2]]}"#
        );
    }

    #[test]
    fn test_run_upload_without_bucket() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("surfaceview.toml");
        std::fs::write(
            &config_path,
            format!(
                "[storage]\nlocal_root = {:?}\n",
                dir.path().join("blobs").to_string_lossy()
            ),
        )
        .unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"abc").unwrap();

        let res = run(Args {
            config: Some(config_path),
            subcommand: Commands::Upload {
                bucket: None,
                name: "k".to_string(),
                file,
                no_replace: false,
            },
        });
        assert!(matches!(res, Err(CommandError::MissingBucket)));
    }
}
