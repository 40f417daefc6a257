//! Sorting live items into named presentation buckets.

use serde::{Deserialize, Serialize};

use crate::fallback::FallbackPool;
use crate::model::{Bucket, NormalizedItem};
use crate::types::{find_id_by_slug, Term};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "slug")]
pub enum BucketFilter {
    /// Every item qualifies.
    All,
    /// Items carrying the tag with this slug.
    Tag(String),
    /// Items whose primary category has this slug.
    Category(String),
    /// Category or tag with this slug, as used by the news tabs.
    Topic(String),
    /// Items carrying any tag at all.
    Tagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    pub filter: BucketFilter,
    pub min_size: usize,
    pub max_size: usize,
    pub fallback: FallbackPool,
    /// Case-insensitive text that must occur in the title or excerpt.
    #[serde(default)]
    pub query: Option<String>,
}

impl BucketSpec {
    pub fn new(name: &str, filter: BucketFilter, max_size: usize) -> Self {
        Self { name: name.to_string(), filter, min_size: 0, max_size, fallback: FallbackPool::None, query: None }
    }

    /// Minimum is capped at the maximum.
    pub fn min(mut self, min_size: usize) -> Self {
        self.min_size = min_size.min(self.max_size);
        self
    }

    pub fn with_fallback(mut self, pool: FallbackPool) -> Self {
        self.fallback = pool;
        self
    }

    /// Blank queries match everything.
    pub fn matching(mut self, query: Option<&str>) -> Self {
        self.query = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
        self
    }
}

/// Category and tag tables fetched alongside the posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<Term>,
    pub tags: Vec<Term>,
}

/// Filter resolved against the taxonomy. `None` from [`Matcher::resolve`]
/// means the bucket can never fill.
enum Matcher<'a> {
    All,
    Tag(u64),
    Category(&'a str),
    Topic { category: Option<&'a str>, tag: Option<u64> },
    Tagged,
}

impl<'a> Matcher<'a> {
    fn resolve(filter: &'a BucketFilter, taxonomy: &Taxonomy) -> Option<Self> {
        let has_category = |slug: &str| taxonomy.categories.iter().any(|c| c.slug == slug);
        match filter {
            BucketFilter::All => Some(Matcher::All),
            BucketFilter::Tagged => Some(Matcher::Tagged),
            BucketFilter::Tag(slug) => find_id_by_slug(&taxonomy.tags, slug).map(Matcher::Tag),
            BucketFilter::Category(slug) => has_category(slug.as_str()).then_some(Matcher::Category(slug.as_str())),
            BucketFilter::Topic(slug) => {
                let category = has_category(slug.as_str()).then_some(slug.as_str());
                let tag = find_id_by_slug(&taxonomy.tags, slug);
                (category.is_some() || tag.is_some()).then_some(Matcher::Topic { category, tag })
            }
        }
    }

    fn admits(&self, item: &NormalizedItem) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Tag(id) => item.tag_ids.contains(id),
            Matcher::Tagged => !item.tag_ids.is_empty(),
            Matcher::Category(slug) => item.category_slug == *slug,
            Matcher::Topic { category, tag } => {
                category.map(|c| item.category_slug == c).unwrap_or(false)
                    || tag.map(|t| item.tag_ids.contains(&t)).unwrap_or(false)
            }
        }
    }
}

/// Newest first; undated items last. Stable, so equal timestamps keep input order.
pub fn sort_by_recency(items: &mut [&NormalizedItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Fill every bucket in one pass over the recency-sorted items. Buckets come
/// back in `specs` order, each truncated to its `max_size`. Items may land in
/// several buckets.
pub fn classify(items: &[NormalizedItem], specs: &[BucketSpec], taxonomy: &Taxonomy) -> Vec<Bucket> {
    let mut sorted: Vec<&NormalizedItem> = items.iter().collect();
    sort_by_recency(&mut sorted);

    let matchers: Vec<Option<Matcher>> = specs.iter().map(|s| Matcher::resolve(&s.filter, taxonomy)).collect();
    for (spec, matcher) in specs.iter().zip(&matchers) {
        if matcher.is_none() {
            tracing::debug!(bucket = %spec.name, filter = ?spec.filter, "filter not in taxonomy; bucket stays empty");
        }
    }

    let mut filled: Vec<Vec<NormalizedItem>> = specs.iter().map(|s| Vec::with_capacity(s.max_size.min(items.len()))).collect();
    for item in sorted {
        for ((spec, matcher), bucket) in specs.iter().zip(&matchers).zip(filled.iter_mut()) {
            if bucket.len() >= spec.max_size { continue; }
            if let Some(m) = matcher {
                if m.admits(item) && matches_query(item, spec.query.as_deref()) { bucket.push(item.clone()); }
            }
        }
    }

    specs
        .iter()
        .zip(filled)
        .map(|(spec, items)| Bucket { name: spec.name.clone(), min_size: spec.min_size, max_size: spec.max_size, items })
        .collect()
}

fn matches_query(item: &NormalizedItem, query: Option<&str>) -> bool {
    let Some(q) = query else { return true };
    let q = q.to_lowercase();
    item.title.to_lowercase().contains(&q) || item.excerpt.to_lowercase().contains(&q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::parse_published;

    fn item(id: u64, date: &str, category: &str, tags: &[u64]) -> NormalizedItem {
        NormalizedItem {
            id,
            slug: Some(format!("post-{id}")),
            title: format!("Post {id}"),
            excerpt: String::new(),
            image_url: "/fallback-image.jpg".into(),
            published_at: parse_published(date),
            category_slug: category.into(),
            category_label: category.into(),
            tag_ids: tags.iter().copied().collect(),
        }
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            categories: vec![
                Term { id: 1, slug: "navy".into(), name: "Navy".into() },
                Term { id: 2, slug: "army".into(), name: "Army".into() },
            ],
            tags: vec![
                Term { id: 10, slug: "trending".into(), name: "Trending".into() },
                Term { id: 11, slug: "hero".into(), name: "Hero".into() },
                Term { id: 12, slug: "navy".into(), name: "Navy".into() },
            ],
        }
    }

    fn ids(bucket: &Bucket) -> Vec<u64> { bucket.items.iter().map(|i| i.id).collect() }

    #[test]
    fn trending_bucket_takes_newest_two() {
        let items = vec![
            item(1, "2025-01-03", "navy", &[10]),
            item(2, "2025-01-01", "navy", &[10]),
            item(3, "2025-01-02", "army", &[10]),
        ];
        let specs = [BucketSpec::new("trending", BucketFilter::Tag("trending".into()), 2)];
        let out = classify(&items, &specs, &taxonomy());
        assert_eq!(ids(&out[0]), vec![1, 3]);
    }

    #[test]
    fn all_bucket_starts_with_newest() {
        let items = vec![
            item(1, "2024-12-01", "navy", &[]),
            item(2, "not a date", "navy", &[]),
            item(3, "2025-02-10", "army", &[]),
            item(4, "2025-01-10", "army", &[]),
        ];
        let out = classify(&items, &[BucketSpec::new("latest", BucketFilter::All, 10)], &taxonomy());
        let first = out[0].items[0].published_at;
        assert!(out[0].items.iter().all(|i| first >= i.published_at));
        assert_eq!(ids(&out[0]), vec![3, 4, 1, 2]);
    }

    #[test]
    fn classification_is_deterministic() {
        let items = vec![
            item(1, "2025-01-01", "navy", &[10]),
            item(2, "2025-01-01", "army", &[10, 11]),
            item(3, "2025-01-01", "navy", &[11]),
        ];
        let specs = fixture_specs();
        let a = classify(&items, &specs, &taxonomy());
        let b = classify(&items, &specs, &taxonomy());
        assert_eq!(a, b);
        // Equal timestamps keep input order
        assert_eq!(ids(&a[0]), vec![1, 2]);
    }

    #[test]
    fn category_and_topic_filters() {
        let items = vec![
            item(1, "2025-01-03", "army", &[12]),
            item(2, "2025-01-02", "navy", &[]),
            item(3, "2025-01-01", "army", &[]),
        ];
        let specs = [
            BucketSpec::new("navy-category", BucketFilter::Category("navy".into()), 10),
            BucketSpec::new("navy-topic", BucketFilter::Topic("navy".into()), 10),
        ];
        let out = classify(&items, &specs, &taxonomy());
        assert_eq!(ids(&out[0]), vec![2]);
        assert_eq!(ids(&out[1]), vec![1, 2]);
    }

    #[test]
    fn unknown_filters_yield_empty_buckets() {
        let items = vec![item(1, "2025-01-01", "all", &[10])];
        let specs = [
            BucketSpec::new("intel", BucketFilter::Tag("intel".into()), 5),
            BucketSpec::new("general", BucketFilter::Category("all".into()), 5),
            BucketSpec::new("subs", BucketFilter::Topic("submarine".into()), 5),
        ];
        let out = classify(&items, &specs, &taxonomy());
        assert!(out.iter().all(|b| b.is_empty()));
        assert_eq!(out.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["intel", "general", "subs"]);
    }

    #[test]
    fn items_may_appear_in_several_buckets_and_respect_max() {
        let items: Vec<_> = (1..=8).map(|i| item(i, &format!("2025-01-0{i}"), "navy", &[10])).collect();
        let specs = [
            BucketSpec::new("trending", BucketFilter::Tag("trending".into()), 3),
            BucketSpec::new("latest", BucketFilter::All, 5),
        ];
        let out = classify(&items, &specs, &taxonomy());
        assert_eq!(ids(&out[0]), vec![8, 7, 6]);
        assert_eq!(ids(&out[1]), vec![8, 7, 6, 5, 4]);
        let distinct: std::collections::HashSet<u64> = out.iter().flat_map(|b| b.items.iter().map(|i| i.id)).collect();
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn tagged_filter_and_query() {
        let mut a = item(1, "2025-01-03", "navy", &[99]);
        a.title = "Hypersonic Glide Vehicle".into();
        let mut b = item(2, "2025-01-02", "army", &[]);
        b.excerpt = "Counter-HYPERSONIC radar trials".into();
        let c = item(3, "2025-01-01", "army", &[10]);
        let items = vec![a, b, c];

        let specs = [
            BucketSpec::new("tagged", BucketFilter::Tagged, 10),
            BucketSpec::new("search", BucketFilter::All, 10).matching(Some("  hypersonic ")),
            BucketSpec::new("blank", BucketFilter::All, 10).matching(Some("   ")),
        ];
        let out = classify(&items, &specs, &taxonomy());
        assert_eq!(ids(&out[0]), vec![1, 3]);
        assert_eq!(ids(&out[1]), vec![1, 2]);
        assert_eq!(ids(&out[2]), vec![1, 2, 3]);
        assert_eq!(specs[2].query, None);
    }

    #[test]
    fn min_is_capped_by_max() {
        let spec = BucketSpec::new("hero", BucketFilter::All, 4).min(9);
        assert_eq!(spec.min_size, 4);
    }

    fn fixture_specs() -> Vec<BucketSpec> {
        vec![
            BucketSpec::new("trending", BucketFilter::Tag("trending".into()), 5),
            BucketSpec::new("hero", BucketFilter::Tag("hero".into()), 5),
            BucketSpec::new("latest", BucketFilter::All, 2),
        ]
    }
}
