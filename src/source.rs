//! HTTP client for the content source (posts, categories, tags).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::SlugMatch;
use crate::storage::Storage;
use crate::types::{RawPost, Term};

/// Taxonomy lists are requested in one page of this size.
pub const TERMS_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Minimal GET seam so the client can run against fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| transport_error(url, e))?;
        Ok(HttpResponse { status, body })
    }
}

fn transport_error(url: &Url, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        // reqwest's own deadline mirrors the per-attempt timeout
        return Error::Timeout { url: url.to_string(), after: Duration::ZERO };
    }
    Error::Transport { url: url.to_string(), source: e }
}

/// Logical request, independent of URL shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Posts { limit: u32 },
    Categories,
    Tags,
    PostBySlug(String),
}

impl Endpoint {
    fn resource(&self) -> &'static str {
        match self {
            Endpoint::Posts { .. } | Endpoint::PostBySlug(_) => "posts",
            Endpoint::Categories => "categories",
            Endpoint::Tags => "tags",
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Posts { limit } => vec![("embed", "1".into()), ("per_page", limit.to_string())],
            Endpoint::Categories | Endpoint::Tags => vec![("per_page", TERMS_PER_PAGE.to_string())],
            Endpoint::PostBySlug(slug) => vec![("slug", slug.clone()), ("embed", "1".into())],
        }
    }

    /// Cache key: resource plus parameters, never the URL shape.
    pub fn cache_key(&self, base: &Url) -> String {
        let params: Vec<String> = self.params().into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("content|{}|{}|{}", base.as_str().trim_end_matches('/'), self.resource(), params.join("&"))
    }
}

/// URL layouts understood by the content source, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// `{base}/api/v2/posts?embed=1&per_page=N`
    Path,
    /// `{base}/?route=/v2/posts&embed=1&per_page=N`
    LegacyQuery,
}

impl UrlShape {
    pub const DEFAULT_ORDER: [UrlShape; 2] = [UrlShape::Path, UrlShape::LegacyQuery];

    pub fn url_for(self, base: &Url, endpoint: &Endpoint) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        let root = base.path().trim_end_matches('/').to_string();
        match self {
            UrlShape::Path => {
                url.set_path(&format!("{}/api/v2/{}", root, endpoint.resource()));
                {
                    let mut q = url.query_pairs_mut();
                    for (k, v) in endpoint.params() { q.append_pair(k, &v); }
                }
            }
            UrlShape::LegacyQuery => {
                url.set_path(&format!("{}/", root));
                {
                    let mut q = url.query_pairs_mut();
                    q.append_pair("route", &format!("/v2/{}", endpoint.resource()));
                    for (k, v) in endpoint.params() { q.append_pair(k, &v); }
                }
            }
        }
        url
    }
}

/// Content source client. Cheap to share behind an `Arc`; holds no per-request state.
pub struct ContentClient {
    base: Url,
    shapes: Vec<UrlShape>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    cache: Option<Arc<dyn Storage>>,
    cache_ttl_secs: i64,
}

impl ContentClient {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            base: config.content_url.clone(),
            shapes: UrlShape::DEFAULT_ORDER.to_vec(),
            transport,
            timeout: config.timeout,
            cache: None,
            cache_ttl_secs: config.cache_ttl_secs,
        }
    }

    /// Client over the real HTTP stack.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn with_cache(mut self, storage: Arc<dyn Storage>) -> Self {
        if self.cache_ttl_secs > 0 { self.cache = Some(storage); }
        self
    }

    pub fn with_shapes(mut self, shapes: Vec<UrlShape>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn base_url(&self) -> &Url { &self.base }
    pub fn cache(&self) -> Option<&Arc<dyn Storage>> { self.cache.as_ref() }

    pub async fn fetch_posts(&self, limit: u32) -> Result<Vec<RawPost>> {
        self.get_json(&Endpoint::Posts { limit }).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Term>> {
        self.get_json(&Endpoint::Categories).await
    }

    pub async fn fetch_tags(&self) -> Result<Vec<Term>> {
        self.get_json(&Endpoint::Tags).await
    }

    /// Look a post up by slug. The source may return near-matches; the exact
    /// (case-insensitive) one wins, otherwise the first candidate is returned
    /// with [`SlugMatch::Mismatch`].
    pub async fn fetch_post_by_slug(&self, slug: &str) -> Result<(RawPost, SlugMatch)> {
        let candidates: Vec<RawPost> = self.get_json(&Endpoint::PostBySlug(slug.to_string())).await?;
        pick_by_slug(candidates, slug)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let key = endpoint.cache_key(&self.base);
        let now = current_epoch();

        // Try cache first; unreadable entries fall through to the network
        if let Some(cache) = &self.cache {
            match cache.get_cache(&key, now).await {
                Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                    Ok(v) => {
                        debug!(%key, "content cache hit");
                        return Ok(v);
                    }
                    Err(e) => warn!(%key, error = %e, "discarding unreadable cache entry"),
                },
                Ok(None) => {}
                Err(e) => warn!(%key, error = %e, "cache read failed"),
            }
        }

        let (url, body) = self.fetch_body(endpoint).await?;
        let value = serde_json::from_str::<T>(&body).map_err(|source| Error::Decode { url, source })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_cache(&key, &body, now.saturating_add(self.cache_ttl_secs)).await {
                warn!(%key, error = %e, "cache write failed");
            }
        }
        Ok(value)
    }

    /// Walk the URL shapes in order. Only a non-success status moves on to
    /// the next shape; transport failures and timeouts end the call.
    async fn fetch_body(&self, endpoint: &Endpoint) -> Result<(String, String)> {
        let mut last: Option<Error> = None;
        for shape in &self.shapes {
            let url = shape.url_for(&self.base, endpoint);
            debug!(%url, ?shape, "requesting content");
            let resp = match tokio::time::timeout(self.timeout, self.transport.get(&url)).await {
                Ok(Ok(resp)) => resp,
                Ok(Err(Error::Timeout { url, .. })) => return Err(Error::Timeout { url, after: self.timeout }),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(Error::Timeout { url: url.to_string(), after: self.timeout }),
            };
            if resp.is_success() {
                return Ok((url.to_string(), resp.body));
            }
            warn!(%url, status = resp.status, "content source answered with non-success status");
            last = Some(Error::fetch(url.as_str(), resp.status, &resp.body));
        }
        Err(last.unwrap_or_else(|| Error::Configuration("no URL shapes configured for the content source".into())))
    }
}

/// Exact case-insensitive match first, else the first candidate flagged as a mismatch.
pub fn pick_by_slug(candidates: Vec<RawPost>, slug: &str) -> Result<(RawPost, SlugMatch)> {
    let wanted = slug.to_lowercase();
    let exact = candidates
        .iter()
        .position(|c| c.slug.as_deref().map(|s| s.to_lowercase() == wanted).unwrap_or(false));
    let mut candidates = candidates;
    match exact {
        Some(idx) => Ok((candidates.swap_remove(idx), SlugMatch::Exact)),
        None if !candidates.is_empty() => Ok((candidates.swap_remove(0), SlugMatch::Mismatch)),
        None => Err(Error::NotFound(format!("post with slug `{slug}`"))),
    }
}

fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
