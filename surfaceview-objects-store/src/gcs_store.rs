use std::io::Read;

use log::debug;
use url::Url;

use crate::blob_store::BlobStore;

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Talks to the Google Cloud Storage JSON API (or anything serving the same
/// routes) with a blocking agent.
#[derive(Debug, Clone)]
pub struct GcsBlobStore {
    agent: ureq::Agent,
    endpoint: Url,
    access_token: Option<String>,
}

#[derive(Debug)]
pub enum GcsBlobStoreError {
    InvalidEndpoint(String),
    Status { status: u16, body: String },
    Ureq(Box<ureq::Error>),
    IO(Box<std::io::Error>),
}

impl std::fmt::Display for GcsBlobStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GcsBlobStoreError::InvalidEndpoint(endpoint) => {
                write!(f, "invalid storage endpoint: {}", endpoint)
            }
            GcsBlobStoreError::Status { status, body } => {
                write!(f, "storage request failed with status {}: {}", status, body)
            }
            GcsBlobStoreError::Ureq(e) => write!(f, "{}", e),
            GcsBlobStoreError::IO(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GcsBlobStoreError {}

impl GcsBlobStore {
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, GcsBlobStoreError> {
        Self::with_agent(ureq::AgentBuilder::new().build(), endpoint, access_token)
    }

    pub fn with_agent(
        agent: ureq::Agent,
        endpoint: &str,
        access_token: Option<String>,
    ) -> Result<Self, GcsBlobStoreError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| GcsBlobStoreError::InvalidEndpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(GcsBlobStoreError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            agent,
            endpoint,
            access_token,
        })
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, GcsBlobStoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| GcsBlobStoreError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{endpoint}/storage/v1/b/{bucket}/o/{name}`, name encoded as one segment
    pub fn object_url(&self, bucket: &str, name: &str) -> Result<Url, GcsBlobStoreError> {
        self.url_with_segments(&["storage", "v1", "b", bucket, "o", name])
    }

    /// `{endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={name}`
    pub fn upload_url(&self, bucket: &str, name: &str) -> Result<Url, GcsBlobStoreError> {
        let mut url = self.url_with_segments(&["upload", "storage", "v1", "b", bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);
        Ok(url)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let req = self.agent.request_url(method, url);
        match &self.access_token {
            Some(token) => req.set("Authorization", &format!("Bearer {}", token)),
            None => req,
        }
    }

    // None on 404
    fn call_allowing_not_found(
        &self,
        req: ureq::Request,
    ) -> Result<Option<ureq::Response>, GcsBlobStoreError> {
        match req.call() {
            Ok(res) => Ok(Some(res)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(status, res)) => Err(status_error(status, res)),
            Err(e) => Err(GcsBlobStoreError::Ureq(Box::new(e))),
        }
    }
}

fn status_error(status: u16, res: ureq::Response) -> GcsBlobStoreError {
    let body = res.into_string().unwrap_or_else(|e| {
        debug!("failed to read error body (status {}): {}", status, e);
        String::new()
    });
    GcsBlobStoreError::Status { status, body }
}

impl BlobStore for GcsBlobStore {
    type Error = GcsBlobStoreError;

    fn check_blob_exists(&self, bucket: &str, name: &str) -> Result<bool, Self::Error> {
        let url = self.object_url(bucket, name)?;
        debug!("GET {}", url);
        let res = self.call_allowing_not_found(self.request("GET", &url))?;
        Ok(res.is_some())
    }

    fn save_blob(&self, bucket: &str, name: &str, data: &[u8]) -> Result<(), Self::Error> {
        let url = self.upload_url(bucket, name)?;
        debug!("POST {} ({} bytes)", url, data.len());
        match self
            .request("POST", &url)
            .set("Content-Type", "application/octet-stream")
            .send_bytes(data)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, res)) => Err(status_error(status, res)),
            Err(e) => Err(GcsBlobStoreError::Ureq(Box::new(e))),
        }
    }

    fn get_blob(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut url = self.object_url(bucket, name)?;
        url.query_pairs_mut().append_pair("alt", "media");
        debug!("GET {}", url);
        let Some(res) = self.call_allowing_not_found(self.request("GET", &url))? else {
            return Ok(None);
        };
        let mut data = Vec::new();
        res.into_reader()
            .read_to_end(&mut data)
            .map_err(|e| GcsBlobStoreError::IO(Box::new(e)))?;
        Ok(Some(data))
    }
}
