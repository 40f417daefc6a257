use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::logging::LogFormat;

pub const ENV_CONTENT_URL: &str = "NEWSDESK_CONTENT_URL";
pub const ENV_CONFIG_FILE: &str = "NEWSDESK_CONFIG";
const ENV_TIMEOUT_SECS: &str = "NEWSDESK_TIMEOUT_SECS";
const ENV_CACHE_TTL_SECS: &str = "NEWSDESK_CACHE_TTL_SECS";
const ENV_POSTS_LIMIT: &str = "NEWSDESK_POSTS_LIMIT";
const ENV_DATABASE_URL: &str = "NEWSDESK_DATABASE_URL";
const ENV_LOG_LEVEL: &str = "NEWSDESK_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "NEWSDESK_LOG_FORMAT";
pub const ENV_STORAGE_URL: &str = "NEWSDESK_STORAGE_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 8;
const DEFAULT_CACHE_TTL_SECS: i64 = 60;
const DEFAULT_POSTS_LIMIT: u32 = 50;

/// Optional TOML layer. Every key is optional; environment variables win.
#[derive(Debug, Deserialize, Clone, Default)]
struct FileConfig {
    #[serde(default)]
    content_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    cache_ttl_secs: Option<i64>,
    #[serde(default)]
    posts_limit: Option<u32>,
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    log_format: Option<String>,
    #[serde(default)]
    storage_url: Option<String>,
}

/// Process-wide, read-only settings. Built once by the entry point.
#[derive(Debug, Clone)]
pub struct Config {
    pub content_url: Url,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Response cache TTL; zero disables caching.
    pub cache_ttl_secs: i64,
    pub posts_limit: u32,
    pub database_url: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage_url: Option<Url>,
}

impl Config {
    /// Config with defaults for everything but the content source.
    pub fn new(content_url: &str) -> Result<Self> {
        Ok(Self {
            content_url: parse_base_url(ENV_CONTENT_URL, content_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            posts_limit: DEFAULT_POSTS_LIMIT,
            database_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage_url: None,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup` (environment-shaped), layered over the
    /// TOML file named by `NEWSDESK_CONFIG` when present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let file = match get(ENV_CONFIG_FILE) {
            Some(path) => load_file(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let raw_url = get(ENV_CONTENT_URL).or(file.content_url).ok_or_else(|| {
            Error::Configuration(format!("{ENV_CONTENT_URL} is not set; the content source base URL is required"))
        })?;
        let mut cfg = Self::new(&raw_url)?;

        if let Some(secs) = parse_num(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS))?.or(file.timeout_secs) {
            if secs == 0 {
                return Err(Error::Configuration(format!("{ENV_TIMEOUT_SECS} must be greater than zero")));
            }
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(ttl) = parse_num(ENV_CACHE_TTL_SECS, get(ENV_CACHE_TTL_SECS))?.or(file.cache_ttl_secs) {
            cfg.cache_ttl_secs = ttl.max(0);
        }
        if let Some(limit) = parse_num(ENV_POSTS_LIMIT, get(ENV_POSTS_LIMIT))?.or(file.posts_limit) {
            cfg.posts_limit = limit.clamp(1, 100);
        }
        cfg.database_url = get(ENV_DATABASE_URL).or(file.database_url);
        if let Some(level) = get(ENV_LOG_LEVEL).or(file.log_level) {
            cfg.log_level = level;
        }
        if let Some(format) = get(ENV_LOG_FORMAT).or(file.log_format) {
            cfg.log_format = format.parse()?;
        }
        if let Some(storage) = get(ENV_STORAGE_URL).or(file.storage_url) {
            cfg.storage_url = Some(parse_base_url(ENV_STORAGE_URL, &storage)?);
        }
        Ok(cfg)
    }

    pub fn cache_enabled(&self) -> bool { self.cache_ttl_secs > 0 }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Configuration(format!("reading {}: {e}", path.display())))?;
    toml::from_str(&text).map_err(|e| Error::Configuration(format!("parsing {}: {e}", path.display())))
}

fn parse_num<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    match value {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| Error::Configuration(format!("{key} must be a number, got `{v}`"))),
        None => Ok(None),
    }
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Configuration(format!("{key} is empty")));
    }
    let url = Url::parse(raw).map_err(|e| Error::Configuration(format!("{key} is not a valid URL ({raw}): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Configuration(format!("{key} must use http or https, got `{other}`"))),
    }
}
