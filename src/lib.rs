pub mod assembly;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod source;
pub mod storage;
pub mod types;
pub mod upload;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::assembly::PageSpec;
    pub use crate::classify::{BucketFilter, BucketSpec, Taxonomy};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fallback::FallbackPool;
    pub use crate::model::{Article, Bucket, NormalizedItem, Page, SlugMatch, TopicLink};
    pub use crate::Newsdesk;
}

pub use crate::config::Config;
pub use crate::error::{Error, Result};

use std::sync::Arc;
use tracing::{debug, info};

use crate::assembly::{assemble_page, load_article, PageSpec};
use crate::classify::Taxonomy;
use crate::db::Database;
use crate::model::{Article, Page};
use crate::source::ContentClient;
use crate::storage::{MemoryStorage, Storage};
use crate::upload::{HttpObjectStore, ObjectStore};

/// Async library entry point. Owns the content client, the response cache and
/// the optional object store. Clones share all three.
#[derive(Clone)]
pub struct Newsdesk {
    client: Arc<ContentClient>,
    cache: Arc<dyn Storage>,
    db: Option<Database>,
    objects: Option<Arc<dyn ObjectStore>>,
    posts_limit: u32,
}

impl Newsdesk {
    /// Build from validated config. Uses the SQLite cache when a database URL is
    /// configured (migrations are applied; `default` picks the platform data
    /// directory), otherwise an in-process cache.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db = match config.database_url.as_deref() {
            Some(url) => {
                let db = Database::connect(Some(url)).await?;
                db.run_migrations().await?;
                let purged = db.purge_expired(chrono::Utc::now().timestamp()).await?;
                debug!(purged, "expired cache rows dropped");
                Some(db)
            }
            None => None,
        };
        let client = ContentClient::from_config(config)?;
        let objects = match &config.storage_url {
            Some(url) => Some(Arc::new(HttpObjectStore::new(url.clone())?) as Arc<dyn ObjectStore>),
            None => None,
        };
        info!(
            content_url = %config.content_url,
            cache_ttl_secs = config.cache_ttl_secs,
            persistent_cache = config.database_url.is_some(),
            uploads = objects.is_some(),
            "newsdesk ready"
        );
        let desk = match db {
            Some(db) => Self::from_database(client, db, config.posts_limit),
            None => Self::from_parts(client, Arc::new(MemoryStorage::new()), config.posts_limit),
        };
        Ok(desk.with_object_store(objects))
    }

    /// Like [`Newsdesk::from_parts`] over the SQLite cache, keeping database
    /// maintenance available.
    pub fn from_database(client: ContentClient, db: Database, posts_limit: u32) -> Self {
        let mut desk = Self::from_parts(client, Arc::new(db.clone()), posts_limit);
        desk.db = Some(db);
        desk
    }

    /// Assemble around an existing client, e.g. one over a fake transport.
    pub fn from_parts(client: ContentClient, cache: Arc<dyn Storage>, posts_limit: u32) -> Self {
        let client = client.with_cache(cache.clone());
        Self { client: Arc::new(client), cache, db: None, objects: None, posts_limit }
    }

    pub fn with_object_store(mut self, objects: Option<Arc<dyn ObjectStore>>) -> Self {
        self.objects = objects;
        self
    }

    pub fn client(&self) -> &ContentClient { &self.client }

    pub async fn home(&self) -> Result<Page> {
        self.page(&PageSpec::home()).await
    }

    /// Home page with the feed narrowed to a topic link and/or a text search.
    pub async fn home_feed(&self, feed: Option<&str>, query: Option<&str>) -> Result<Page> {
        self.page(&PageSpec::home_feed(feed, query)).await
    }

    /// News listing; unknown or missing tabs show everything.
    pub async fn news(&self, tab: Option<&str>) -> Result<Page> {
        self.page(&PageSpec::news(tab)).await
    }

    pub async fn page(&self, spec: &PageSpec) -> Result<Page> {
        assemble_page(&self.client, spec, self.posts_limit).await
    }

    pub async fn article(&self, slug: &str) -> Result<Article> {
        load_article(&self.client, slug).await
    }

    pub async fn taxonomy(&self) -> Result<Taxonomy> {
        let (categories, tags) = futures::try_join!(self.client.fetch_categories(), self.client.fetch_tags())?;
        Ok(Taxonomy { categories, tags })
    }

    /// Store a featured image for `content_id`; returns the public URL.
    pub async fn upload(&self, content_id: &str, original_filename: &str, bytes: Vec<u8>) -> Result<String> {
        let store = self
            .objects
            .as_ref()
            .ok_or_else(|| Error::Configuration(format!("{} is not set; uploads are unavailable", config::ENV_STORAGE_URL)))?;
        store.upload(content_id, original_filename, bytes).await
    }

    /// Clear cached responses by key prefix. Returns number of entries removed.
    pub async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64> {
        self.cache.clear_cache_prefix(prefix).await.map_err(Into::into)
    }

    /// Drop expired rows and compact the SQLite cache. Returns `None` for the
    /// in-process cache, which has nothing to compact.
    pub async fn vacuum_cache(&self) -> Result<Option<u64>> {
        let Some(db) = &self.db else { return Ok(None) };
        let purged = db.purge_expired(chrono::Utc::now().timestamp()).await?;
        db.vacuum().await?;
        Ok(Some(purged))
    }
}
