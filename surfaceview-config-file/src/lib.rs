use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SurfaceviewConfigToml {
    #[serde(default)]
    pub storage: StorageConfigToml,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StorageConfigToml {
    /// Base URL of the GCS JSON API, e.g. `https://storage.googleapis.com`
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    /// Bucket used when a command does not name one
    pub bucket: Option<String>,
    /// When set, blobs are kept in a local directory instead of GCS
    pub local_root: Option<String>,
}

#[derive(Debug)]
pub enum ConfigFileError {
    IO(Box<std::io::Error>),
    Toml(Box<toml::de::Error>),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFileError::IO(e) => write!(f, "failed to read config file: {}", e),
            ConfigFileError::Toml(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigFileError {}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SurfaceviewConfigToml, ConfigFileError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigFileError::IO(Box::new(e)))?;
    let config: SurfaceviewConfigToml =
        toml::from_str(&s).map_err(|e| ConfigFileError::Toml(Box::new(e)))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_surfaceview_config_toml() {
        let toml = r#"
[storage]
endpoint = "http://localhost:4443"
bucket = "meshes"
"#;
        let config: SurfaceviewConfigToml = toml::from_str(toml).unwrap();
        assert_eq!(
            config.storage.endpoint.as_deref(),
            Some("http://localhost:4443")
        );
        assert_eq!(config.storage.bucket.as_deref(), Some("meshes"));
        assert_eq!(config.storage.access_token, None);
        assert_eq!(config.storage.local_root, None);
    }

    #[test]
    fn test_deserialize_empty_config_toml() {
        let config: SurfaceviewConfigToml = toml::from_str("").unwrap();
        assert_eq!(config, SurfaceviewConfigToml::default());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surfaceview.toml");
        std::fs::write(&path, "[storage]\nlocal_root = \"/tmp/blobs\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.storage.local_root.as_deref(), Some("/tmp/blobs"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = load_config(dir.path().join("missing.toml"));
        assert!(matches!(res, Err(ConfigFileError::IO(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surfaceview.toml");
        std::fs::write(&path, "[storage\n").unwrap();

        let res = load_config(&path);
        assert!(matches!(res, Err(ConfigFileError::Toml(_))));
    }
}
