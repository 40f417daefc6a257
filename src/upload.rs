//! Featured-image uploads to object storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use crate::error::{truncate_chars, Error, Result, ERROR_BODY_LIMIT};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `name` and return its public URL. Existing objects are overwritten.
    async fn put_object(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Upload a featured image for `content_id`; returns the public URL.
    async fn upload(&self, content_id: &str, original_filename: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::Upload("file is empty".into()));
        }
        let name = object_name(content_id, original_filename)?;
        let content_type = content_type_for(&name);
        let size = bytes.len();
        let url = self.put_object(&name, bytes, content_type).await?;
        info!(%name, content_type, size, %url, "object uploaded");
        Ok(url)
    }
}

/// `{content_id}.{ext}`, extension taken from the original file name.
pub fn object_name(content_id: &str, original_filename: &str) -> Result<String> {
    let id = content_id.trim();
    if id.is_empty() {
        return Err(Error::Upload("content id is required".into()));
    }
    if id.contains(['/', '\\']) || id.contains("..") {
        return Err(Error::Upload(format!("content id `{id}` is not a valid object name")));
    }
    let file = original_filename.trim();
    if file.is_empty() {
        return Err(Error::Upload("original filename is required".into()));
    }
    let ext = Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| Error::Upload(format!("`{file}` has no usable extension")))?;
    Ok(format!("{id}.{ext}"))
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name).extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Blob container reachable over HTTP `PUT` (Azure-style block blobs). A SAS
/// token in the container URL query is sent with the upload but left out of
/// the returned public URL.
pub struct HttpObjectStore {
    client: reqwest::Client,
    container: Url,
}

impl HttpObjectStore {
    pub fn new(container: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("building HTTP client: {e}")))?;
        Ok(Self { client, container })
    }

    fn object_url(&self, name: &str) -> Url {
        let mut url = self.container.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), name);
        url.set_path(&path);
        url
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = self.object_url(name);
        let resp = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Transport { url: url.to_string(), source: e })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "{} answered {}: {}",
                url.path(),
                status.as_u16(),
                truncate_chars(&body, ERROR_BODY_LIMIT)
            )));
        }
        let mut public = url;
        public.set_query(None);
        Ok(public.to_string())
    }
}

/// Directory-backed store for development.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self { root: root.into(), public_base: public_base.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(&self, name: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::Upload(format!("creating {}: {e}", self.root.display())))?;
        let path = self.root.join(name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| Error::Upload(format!("writing {}: {e}", path.display())))?;
        Ok(format!("{}/{}", self.public_base, name))
    }
}
