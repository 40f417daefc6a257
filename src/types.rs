//! Wire shapes returned by the content source.
//!
//! Everything but `id` is optional on the wire; defaults are applied by
//! [`crate::mapping`] so downstream code never touches raw JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRef {
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embedded {
    #[serde(default, rename = "media", alias = "wp:featuredmedia")]
    pub media: Vec<MediaRef>,
}

/// A post as returned by the posts endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawPost {
    pub id: u64,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<Rendered>,
    #[serde(default)]
    pub excerpt: Option<Rendered>,
    #[serde(default)]
    pub content: Option<Rendered>,
    /// ISO-8601, with or without an offset.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<Embedded>,
}

impl RawPost {
    pub fn featured_image(&self) -> Option<&str> {
        self.embedded
            .as_ref()
            .and_then(|e| e.media.first())
            .and_then(|m| m.source_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Category or tag record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Term {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

pub fn index_by_id(terms: &[Term]) -> HashMap<u64, Term> {
    terms.iter().map(|t| (t.id, t.clone())).collect()
}

pub fn find_id_by_slug(terms: &[Term], slug: &str) -> Option<u64> {
    terms.iter().find(|t| t.slug == slug).map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sparse_post() {
        let post: RawPost = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(post.id, 7);
        assert!(post.slug.is_none());
        assert!(post.tags.is_empty());
        assert_eq!(post.featured_image(), None);
    }

    #[test]
    fn accepts_both_media_spellings() {
        let a: RawPost =
            serde_json::from_str(r#"{"id":1,"_embedded":{"media":[{"source_url":"https://img/a.jpg"}]}}"#).unwrap();
        let b: RawPost =
            serde_json::from_str(r#"{"id":2,"_embedded":{"wp:featuredmedia":[{"source_url":"https://img/b.jpg"}]}}"#)
                .unwrap();
        assert_eq!(a.featured_image(), Some("https://img/a.jpg"));
        assert_eq!(b.featured_image(), Some("https://img/b.jpg"));
    }

    #[test]
    fn slug_lookup() {
        let tags = vec![
            Term { id: 4, slug: "trending".into(), name: "Trending".into() },
            Term { id: 9, slug: "hero".into(), name: "Hero".into() },
        ];
        assert_eq!(find_id_by_slug(&tags, "hero"), Some(9));
        assert_eq!(find_id_by_slug(&tags, "intel"), None);
        assert_eq!(index_by_id(&tags)[&4].name, "Trending");
    }
}
