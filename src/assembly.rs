//! Page assembly: fetch once, map once, classify, then top buckets up.

use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, warn};

use crate::classify::{classify, BucketFilter, BucketSpec, Taxonomy};
use crate::error::{Error, Result};
use crate::fallback::{merge, merge_target, FallbackPool};
use crate::mapping::{map_article, map_posts};
use crate::model::{Article, Bucket, NormalizedItem, Page, SlugMatch, TopicLink};
use crate::source::ContentClient;
use crate::types::{index_by_id, Term};

/// Tabs on the news listing, in display order. `all` is the default.
pub const NEWS_TABS: &[(&str, &str)] = &[
    ("all", "All"),
    ("missiles", "Missiles"),
    ("submarine", "Submarine"),
    ("fighter-jet", "Fighter Jet"),
    ("drones", "Drones"),
    ("electronic-warfare", "Electronic Warfare"),
    ("air-force", "Air Force"),
    ("navy", "Navy"),
    ("army", "Army"),
    ("conflict-strategic-affairs", "Conflict & Strategic Affairs"),
    ("trending", "Trending"),
];

pub const LISTING_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    None,
    /// The fixed news tab list.
    NewsTabs,
    /// "All", "Trending", then every category that has at least one live item.
    UsedCategories,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pub name: String,
    pub buckets: Vec<BucketSpec>,
    pub topics: TopicSource,
    pub active_topic: Option<String>,
}

impl PageSpec {
    pub fn new(name: &str, buckets: Vec<BucketSpec>) -> Self {
        Self { name: name.to_string(), buckets, topics: TopicSource::None, active_topic: None }
    }

    pub fn home() -> Self {
        Self::home_feed(None, None)
    }

    /// Home page with the feed narrowed by one of its topic links (`all`,
    /// `trending` for anything tagged, or a category slug) and an optional
    /// title/excerpt search.
    pub fn home_feed(feed: Option<&str>, query: Option<&str>) -> Self {
        let (active, filter) = feed_filter(feed);
        Self {
            name: "home".into(),
            buckets: vec![
                BucketSpec::new("hero", BucketFilter::Tag("hero".into()), 4).min(4).with_fallback(FallbackPool::HeroSlides),
                BucketSpec::new("trending", BucketFilter::Tag("trending".into()), 6),
                BucketSpec::new("latest", BucketFilter::All, 6).min(6).with_fallback(FallbackPool::LatestBriefings),
                BucketSpec::new("intel", BucketFilter::Tag("intel".into()), 4),
                BucketSpec::new("feed", filter, LISTING_MAX).matching(query),
            ],
            topics: TopicSource::UsedCategories,
            active_topic: Some(active),
        }
    }

    /// News listing for `tab`; unknown or missing tabs fall back to `all`.
    pub fn news(tab: Option<&str>) -> Self {
        let tab = resolve_tab(tab);
        let filter = if tab == "all" { BucketFilter::All } else { BucketFilter::Topic(tab.to_string()) };
        Self {
            name: "news".into(),
            buckets: vec![BucketSpec::new("news", filter, LISTING_MAX).min(1).with_fallback(FallbackPool::NewsArchive)],
            topics: TopicSource::NewsTabs,
            active_topic: Some(tab.to_string()),
        }
    }
}

pub fn resolve_tab(tab: Option<&str>) -> &'static str {
    let wanted = tab.map(|t| t.trim().to_ascii_lowercase()).unwrap_or_default();
    NEWS_TABS.iter().find(|(id, _)| *id == wanted).map(|(id, _)| *id).unwrap_or("all")
}

fn feed_filter(feed: Option<&str>) -> (String, BucketFilter) {
    let id = feed.map(|f| f.trim().to_ascii_lowercase()).filter(|f| !f.is_empty()).unwrap_or_else(|| "all".into());
    let filter = match id.as_str() {
        "all" => BucketFilter::All,
        "trending" => BucketFilter::Tagged,
        slug => BucketFilter::Category(slug.to_string()),
    };
    (id, filter)
}

pub fn news_tabs() -> Vec<TopicLink> {
    NEWS_TABS.iter().map(|(id, label)| TopicLink { id: id.to_string(), label: label.to_string() }).collect()
}

/// Feed filters derived from content: categories in taxonomy order, only
/// those some item actually uses.
pub fn used_category_topics(items: &[NormalizedItem], categories: &[Term]) -> Vec<TopicLink> {
    let used: HashSet<&str> = items.iter().map(|i| i.category_slug.as_str()).collect();
    let mut out = vec![
        TopicLink { id: "all".into(), label: "All Briefings".into() },
        TopicLink { id: "trending".into(), label: "Trending".into() },
    ];
    for c in categories {
        if used.contains(c.slug.as_str()) && !out.iter().any(|t| t.id == c.slug) {
            out.push(TopicLink { id: c.slug.clone(), label: c.name.clone() });
        }
    }
    out
}

/// Synchronous half of page assembly: classify live items and merge fallback
/// per bucket. Never fails; short buckets are reported as degraded.
pub fn assemble(items: &[NormalizedItem], spec: &PageSpec, taxonomy: &Taxonomy) -> Page {
    let classified = classify(items, &spec.buckets, taxonomy);
    let buckets: Vec<Bucket> = spec
        .buckets
        .iter()
        .zip(classified)
        .map(|(bucket_spec, bucket)| top_up(bucket_spec, bucket))
        .collect();

    let topics = match spec.topics {
        TopicSource::None => Vec::new(),
        TopicSource::NewsTabs => news_tabs(),
        TopicSource::UsedCategories => used_category_topics(items, &taxonomy.categories),
    };

    Page { name: spec.name.clone(), buckets, topics, active_topic: spec.active_topic.clone() }
}

fn top_up(spec: &BucketSpec, bucket: Bucket) -> Bucket {
    let live_len = bucket.items.len();
    let target = merge_target(live_len, spec.min_size, spec.max_size);
    let merged = if target > live_len {
        let items = merge(bucket.items, spec.fallback.items(&spec.filter), target);
        Bucket { items, ..bucket }
    } else {
        bucket
    };
    if merged.is_degraded() {
        warn!(
            bucket = %merged.name,
            have = merged.len(),
            want = merged.min_size,
            live = live_len,
            "bucket below minimum after fallback"
        );
    }
    merged
}

/// Fetch posts, categories and tags concurrently, then assemble. Any fetch
/// failure fails the whole page.
pub async fn assemble_page(client: &ContentClient, spec: &PageSpec, posts_limit: u32) -> Result<Page> {
    let started = Instant::now();
    let (posts, categories, tags) =
        futures::try_join!(client.fetch_posts(posts_limit), client.fetch_categories(), client.fetch_tags())?;

    let items = map_posts(&posts, &index_by_id(&categories));
    let taxonomy = Taxonomy { categories, tags };
    let page = assemble(&items, spec, &taxonomy);

    info!(
        page = %page.name,
        posts = items.len(),
        buckets = page.buckets.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "page assembled"
    );
    Ok(page)
}

/// Single article by slug. A category lookup failure only costs the label;
/// the post fetch itself must succeed.
pub async fn load_article(client: &ContentClient, slug: &str) -> Result<Article> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(Error::NotFound("empty slug".into()));
    }

    let (post, categories) = futures::join!(client.fetch_post_by_slug(slug), client.fetch_categories());
    let (raw, slug_match) = post?;
    let categories = categories.unwrap_or_else(|e| {
        warn!(error = %e, "category lookup failed; using default label");
        Vec::new()
    });

    if slug_match == SlugMatch::Mismatch {
        warn!(requested = slug, returned = ?raw.slug, "no exact slug match; serving first candidate");
    }
    Ok(map_article(&raw, slug, slug_match, &index_by_id(&categories)))
}
