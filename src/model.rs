use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sanitized view model handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedItem {
    pub id: u64,
    /// `None` marks a fallback placeholder with no live page behind it.
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub image_url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category_slug: String,
    pub category_label: String,
    pub tag_ids: BTreeSet<u64>,
}

impl NormalizedItem {
    pub fn is_fallback(&self) -> bool { self.slug.is_none() }

    /// Detail page path, only for live items.
    pub fn href(&self) -> Option<String> {
        self.slug.as_ref().map(|s| format!("/news/{}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlugMatch {
    Exact,
    /// Candidates came back but none matched; the first one was used.
    Mismatch,
}

/// Single article page payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: u64,
    pub slug: String,
    pub requested_slug: String,
    pub title: String,
    /// Body HTML as delivered by the source.
    pub content_html: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category_label: String,
    pub slug_match: SlugMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bucket {
    pub name: String,
    pub min_size: usize,
    pub max_size: usize,
    pub items: Vec<NormalizedItem>,
}

impl Bucket {
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Fewer items than requested, even after fallback.
    pub fn is_degraded(&self) -> bool { self.items.len() < self.min_size }

    pub fn live_count(&self) -> usize { self.items.iter().filter(|i| !i.is_fallback()).count() }
}

/// Filter link shown above a listing (news tabs, home feed filters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicLink {
    pub id: String,
    pub label: String,
}

/// Ordered buckets for one page render.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub name: String,
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub topics: Vec<TopicLink>,
    /// Tab the listing was resolved to, for tabbed pages.
    #[serde(default)]
    pub active_topic: Option<String>,
}

impl Page {
    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.name.as_str()).collect()
    }
}
