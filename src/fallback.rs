//! Static placeholder content and the merge that tops buckets up with it.
//!
//! Placeholders never carry a slug, so the presentation layer cannot link
//! them to a detail page.

use serde::{Deserialize, Serialize};

use crate::classify::BucketFilter;
use crate::mapping::{parse_published, PLACEHOLDER_IMAGE};
use crate::model::NormalizedItem;

/// Live items first, in order, up to `target_size`; then fallback items in
/// their declared order until the target is met or the pool runs out.
pub fn merge(live: Vec<NormalizedItem>, fallback: Vec<NormalizedItem>, target_size: usize) -> Vec<NormalizedItem> {
    let mut out: Vec<NormalizedItem> = live.into_iter().take(target_size).collect();
    let missing = target_size - out.len();
    out.extend(fallback.into_iter().take(missing));
    out
}

/// Size to merge up to: everything live within `max`, and at least `min`.
pub fn merge_target(live_len: usize, min_size: usize, max_size: usize) -> usize {
    live_len.max(min_size).min(max_size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPool {
    None,
    HeroSlides,
    LatestBriefings,
    NewsArchive,
}

impl FallbackPool {
    /// Pool contents in declared order. The news archive is narrowed to the
    /// bucket's topic; the other pools are general-purpose.
    pub fn items(self, filter: &BucketFilter) -> Vec<NormalizedItem> {
        match self {
            FallbackPool::None => Vec::new(),
            FallbackPool::HeroSlides => HERO_SLIDES.iter().map(Placeholder::to_item).collect(),
            FallbackPool::LatestBriefings => LATEST_BRIEFINGS.iter().map(Placeholder::to_item).collect(),
            FallbackPool::NewsArchive => {
                let topic = match filter {
                    BucketFilter::All | BucketFilter::Tagged => None,
                    BucketFilter::Tag(s) | BucketFilter::Category(s) | BucketFilter::Topic(s) => Some(normalize_topic(s)),
                };
                NEWS_ARCHIVE
                    .iter()
                    .filter(|p| topic.as_deref().map(|t| p.covers(t)).unwrap_or(true))
                    .map(Placeholder::to_item)
                    .collect()
            }
        }
    }
}

/// Lowercase, whitespace to dashes: "Air Force" -> "air-force".
pub fn normalize_topic(s: &str) -> String {
    s.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

struct Placeholder {
    id: u64,
    title: &'static str,
    excerpt: &'static str,
    image: Option<&'static str>,
    category: &'static str,
    label: &'static str,
    date: Option<&'static str>,
    topics: &'static [&'static str],
}

impl Placeholder {
    fn covers(&self, topic: &str) -> bool {
        normalize_topic(self.category) == topic || self.topics.iter().any(|t| normalize_topic(t) == topic)
    }

    fn to_item(&self) -> NormalizedItem {
        NormalizedItem {
            id: self.id,
            slug: None,
            title: self.title.to_string(),
            excerpt: self.excerpt.to_string(),
            image_url: self.image.unwrap_or(PLACEHOLDER_IMAGE).to_string(),
            published_at: self.date.and_then(parse_published),
            category_slug: self.category.to_string(),
            category_label: self.label.to_string(),
            tag_ids: Default::default(),
        }
    }
}

const HERO_SLIDES: &[Placeholder] = &[
    Placeholder {
        id: 3001,
        title: "Strategic Defense Initiative: Next-Gen Missile Defense Systems",
        excerpt: "Analysis of emerging missile defense technologies and their strategic implications for global security architecture.",
        image: Some("https://images.unsplash.com/photo-1581091226825-a6a2a5aee158?q=80&w=1000&auto=format&fit=crop"),
        category: "defense",
        label: "Defense",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 3002,
        title: "Cybersecurity Threats in Critical Infrastructure",
        excerpt: "Comprehensive assessment of cyber vulnerabilities in national infrastructure and recommended countermeasures.",
        image: Some("https://images.unsplash.com/photo-1550751827-4bd374c3f58b?q=80&w=1000&auto=format&fit=crop"),
        category: "cyber-intel",
        label: "Cyber Intel",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 3003,
        title: "Arctic Operations: New Frontiers in Military Strategy",
        excerpt: "Examining the strategic importance of Arctic regions and evolving military capabilities in extreme environments.",
        image: Some("https://images.unsplash.com/photo-1506905925346-21bda4d32df4?q=80&w=1000&auto=format&fit=crop"),
        category: "strategy",
        label: "Strategy",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 3004,
        title: "AI Integration in Modern Warfare",
        excerpt: "Exploring artificial intelligence applications in defense systems and ethical considerations for autonomous weapons.",
        image: Some("https://images.unsplash.com/photo-1485827404703-89b55fcc595e?q=80&w=1000&auto=format&fit=crop"),
        category: "technology",
        label: "Technology",
        date: None,
        topics: &[],
    },
];

const LATEST_BRIEFINGS: &[Placeholder] = &[
    Placeholder {
        id: 2001,
        title: "Agni-V Test Firing: Strategic Implications",
        excerpt: "Analysis of the latest MIRV technology demonstration and what it means for regional deterrence stability.",
        image: Some("/missile-launch.jpg"),
        category: "missile-tech",
        label: "Missile Tech",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 2002,
        title: "Indian Navy's New Carrier Battle Group",
        excerpt: "INS Vikrant leads the largest naval exercise in the Arabian Sea with dual-carrier operations.",
        image: Some("/carrier.jpg"),
        category: "naval-power",
        label: "Naval Power",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 2003,
        title: "LCA Tejas Mk2: Production Timeline Update",
        excerpt: "HAL confirms the rollout schedule for the new medium-weight fighter jet prototype.",
        image: Some("/tejas-jet.jpg"),
        category: "air-force",
        label: "Air Force",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 2004,
        title: "Border Infrastructure Push in Ladakh",
        excerpt: "BRO completes strategic tunnel providing all-weather connectivity to forward areas.",
        image: Some("/ladakh-road.jpg"),
        category: "land-forces",
        label: "Land Forces",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 2005,
        title: "Cyber Warfare Command Structure",
        excerpt: "New organizational changes announced to bolster defense against state-sponsored cyber attacks.",
        image: Some("/cyber-ops.jpg"),
        category: "cyber-ew",
        label: "Cyber & EW",
        date: None,
        topics: &[],
    },
    Placeholder {
        id: 2006,
        title: "Indigenous Drone Swarm Capabilities",
        excerpt: "Private sector collaboration yields first successful test of autonomous swarming munition systems.",
        image: Some("/drones.jpg"),
        category: "future-tech",
        label: "Future Tech",
        date: None,
        topics: &[],
    },
];

const NEWS_ARCHIVE: &[Placeholder] = &[
    Placeholder {
        id: 1001,
        title: "BrahMos and the Next Generation of Precision Strike Power",
        excerpt: "How India’s supersonic BrahMos missile is reshaping deterrence and stand-off strike capabilities along contested borders.",
        image: Some("https://upload.wikimedia.org/wikipedia/commons/5/5f/BrahMos_missile_at_Engineering_Technologies_2012_01.jpg"),
        category: "missiles",
        label: "Missiles",
        date: Some("2025-02-10"),
        topics: &["Missiles", "India", "Precision Strike"],
    },
    Placeholder {
        id: 1002,
        title: "INS Arihant and the Evolution of India’s Sea-Based Deterrent",
        excerpt: "A deep dive into India’s nuclear submarine program and why credible sea-based deterrence matters in the Indo-Pacific.",
        image: Some("https://source.unsplash.com/1200x800/?submarine,navy,sea"),
        category: "submarine",
        label: "Submarine",
        date: Some("2025-02-02"),
        topics: &["Submarine", "Navy", "Deterrence"],
    },
    Placeholder {
        id: 1003,
        title: "Rafale and Beyond: Transforming the Indian Air Force Combat Edge",
        excerpt: "From Rafale to AMCA – how a new generation of platforms and weapons is rewriting the IAF’s air-dominance doctrine.",
        image: Some("https://source.unsplash.com/1200x800/?fighter-jet,air-force,jet"),
        category: "fighter-jet",
        label: "Fighter Jet",
        date: Some("2025-01-25"),
        topics: &["Fighter Jet", "Air Force", "Modernisation"],
    },
    Placeholder {
        id: 1004,
        title: "Armed Drones: The Next Frontier for Indian Forces",
        excerpt: "From high-altitude surveillance to precision strikes, a look at how drones are changing India’s border security posture.",
        image: Some("https://source.unsplash.com/1200x800/?military,drone,uas"),
        category: "drones",
        label: "Drones",
        date: Some("2025-01-18"),
        topics: &["Drones", "Army", "Border Security"],
    },
    Placeholder {
        id: 1005,
        title: "Electronic Warfare: Winning the Spectrum Before the Battle Begins",
        excerpt: "Why control of the electromagnetic spectrum is becoming as critical as control of land, air, and sea in modern conflicts.",
        image: Some("https://source.unsplash.com/1200x800/?radar,control-room,military"),
        category: "electronic-warfare",
        label: "Electronic Warfare",
        date: Some("2025-01-10"),
        topics: &["Electronic Warfare", "Cyber", "Future Warfare"],
    },
    Placeholder {
        id: 1006,
        title: "Siachen to Arunachal: How India’s Mountain Corps Holds the High Ground",
        excerpt: "Inside the demanding world of high-altitude warfare and how India sustains combat power in some of the world’s toughest terrain.",
        image: Some("https://source.unsplash.com/1200x800/?indian-army,mountains,soldiers"),
        category: "army",
        label: "Army",
        date: Some("2024-12-28"),
        topics: &["Army", "High Altitude", "Borders"],
    },
    Placeholder {
        id: 1007,
        title: "Indo-Pacific Chokepoints: India’s Navy at the Heart of Sea Lanes",
        excerpt: "From the Malacca Strait to the Persian Gulf, how the Indian Navy is adapting to protect vital sea lines of communication.",
        image: Some("https://source.unsplash.com/1200x800/?warship,navy,ocean"),
        category: "navy",
        label: "Navy",
        date: Some("2024-12-15"),
        topics: &["Navy", "Indo-Pacific", "Sea Lanes"],
    },
    Placeholder {
        id: 1008,
        title: "Ladakh Standoff: Hard Lessons in Deterrence and Deployment",
        excerpt: "Key military lessons from the Ladakh crisis and what they reveal about India’s readiness for high-tempo border stand-offs.",
        image: Some("https://source.unsplash.com/1200x800/?india,border,conflict"),
        category: "conflict-strategic-affairs",
        label: "Conflict & Strategic Affairs",
        date: Some("2024-12-01"),
        topics: &["Conflict", "Strategic Affairs", "Ladakh"],
    },
    Placeholder {
        id: 1009,
        title: "5 Defence Technologies Trending in Indian Military Modernisation",
        excerpt: "From loitering munitions to AI-enabled ISR, a quick briefing on technologies shaping the future of India’s armed forces.",
        image: Some("https://source.unsplash.com/1200x800/?military,technology,drone"),
        category: "trending",
        label: "Trending",
        date: Some("2024-11-20"),
        topics: &["Trending", "Technology", "Modernisation"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn live(id: u64) -> NormalizedItem {
        NormalizedItem {
            id,
            slug: Some(format!("live-{id}")),
            title: format!("Live {id}"),
            excerpt: String::new(),
            image_url: PLACEHOLDER_IMAGE.into(),
            published_at: None,
            category_slug: "all".into(),
            category_label: "General".into(),
            tag_ids: Default::default(),
        }
    }

    fn ids(items: &[NormalizedItem]) -> Vec<u64> { items.iter().map(|i| i.id).collect() }

    #[test]
    fn live_items_come_first_then_fallback() {
        let pool = FallbackPool::HeroSlides.items(&BucketFilter::All);
        let out = merge(vec![live(1), live(2)], pool, 4);
        assert_eq!(ids(&out), vec![1, 2, 3001, 3002]);
    }

    #[test]
    fn live_is_truncated_to_target() {
        let out = merge(vec![live(1), live(2), live(3)], FallbackPool::HeroSlides.items(&BucketFilter::All), 2);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn priority_holds_for_every_target() {
        let lives: Vec<_> = (1..=3).map(live).collect();
        let pool = FallbackPool::LatestBriefings.items(&BucketFilter::All);
        for target in 0..=12 {
            let out = merge(lives.clone(), pool.clone(), target);
            let taken = target.min(lives.len());
            assert_eq!(ids(&out[..taken]), ids(&lives[..taken]));
            assert_eq!(ids(&out[taken..]), ids(&pool[..out.len() - taken]));
            assert!(out.len() <= target);
            // Slugs survive untouched on both sides
            assert!(out[..taken].iter().all(|i| i.slug.is_some()));
            assert!(out[taken..].iter().all(|i| i.slug.is_none()));
        }
    }

    #[test]
    fn exhausted_pool_leaves_bucket_short() {
        let out = merge(vec![live(1)], FallbackPool::HeroSlides.items(&BucketFilter::All), 10);
        assert_eq!(out.len(), 5);
        assert!(merge(Vec::new(), Vec::new(), 3).is_empty());
    }

    #[test]
    fn merge_target_clamps() {
        assert_eq!(merge_target(1, 4, 4), 4);
        assert_eq!(merge_target(5, 1, 50), 5);
        assert_eq!(merge_target(80, 1, 50), 50);
        assert_eq!(merge_target(0, 0, 6), 0);
    }

    #[test]
    fn archive_narrows_to_topic() {
        let navy = FallbackPool::NewsArchive.items(&BucketFilter::Topic("navy".into()));
        // Navy category plus the submarine post tagged Navy
        assert_eq!(ids(&navy), vec![1002, 1007]);
        let air = FallbackPool::NewsArchive.items(&BucketFilter::Topic("air-force".into()));
        assert_eq!(ids(&air), vec![1003]);
        assert_eq!(FallbackPool::NewsArchive.items(&BucketFilter::All).len(), 9);
        assert!(FallbackPool::NewsArchive.items(&BucketFilter::Topic("space".into())).is_empty());
    }

    #[test]
    fn placeholders_never_have_slugs() {
        for pool in [FallbackPool::HeroSlides, FallbackPool::LatestBriefings, FallbackPool::NewsArchive] {
            assert!(pool.items(&BucketFilter::All).iter().all(|i| i.slug.is_none() && i.href().is_none()));
        }
        assert!(FallbackPool::None.items(&BucketFilter::All).is_empty());
    }

    #[test]
    fn normalizes_topics() {
        assert_eq!(normalize_topic("  Air   Force "), "air-force");
        assert_eq!(normalize_topic("navy"), "navy");
    }
}
