use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::model::{Article, NormalizedItem, SlugMatch};
use crate::types::{RawPost, Term};

pub const PLACEHOLDER_IMAGE: &str = "/fallback-image.jpg";
pub const DEFAULT_CATEGORY_SLUG: &str = "all";
pub const DEFAULT_CATEGORY_LABEL: &str = "General";
pub const ARTICLE_CATEGORY_LABEL: &str = "Briefing";
pub const UNTITLED: &str = "Untitled";
pub const EXCERPT_MAX_CHARS: usize = 220;

pub fn map_post(raw: &RawPost, categories_by_id: &HashMap<u64, Term>) -> NormalizedItem {
    let category = first_category(raw, categories_by_id);
    NormalizedItem {
        id: raw.id,
        slug: raw.slug.clone().filter(|s| !s.trim().is_empty()),
        title: title_of(raw),
        excerpt: bound_excerpt(&plain_text(rendered(&raw.excerpt)), EXCERPT_MAX_CHARS),
        image_url: raw.featured_image().unwrap_or(PLACEHOLDER_IMAGE).to_string(),
        published_at: raw.date.as_deref().and_then(parse_published),
        category_slug: category.map(|c| c.slug.clone()).unwrap_or_else(|| DEFAULT_CATEGORY_SLUG.to_string()),
        category_label: category
            .map(|c| plain_text(&c.name))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY_LABEL.to_string()),
        tag_ids: raw.tags.iter().copied().collect(),
    }
}

pub fn map_posts(raws: &[RawPost], categories_by_id: &HashMap<u64, Term>) -> Vec<NormalizedItem> {
    raws.iter().map(|r| map_post(r, categories_by_id)).collect()
}

/// Detail view. The body stays HTML; the presentation layer owns rendering it.
pub fn map_article(raw: &RawPost, requested_slug: &str, slug_match: SlugMatch, categories_by_id: &HashMap<u64, Term>) -> Article {
    Article {
        id: raw.id,
        slug: raw.slug.clone().unwrap_or_else(|| requested_slug.to_string()),
        requested_slug: requested_slug.to_string(),
        title: title_of(raw),
        content_html: rendered(&raw.content).to_string(),
        image_url: raw.featured_image().map(str::to_string),
        published_at: raw.date.as_deref().and_then(parse_published),
        category_label: first_category(raw, categories_by_id)
            .map(|c| plain_text(&c.name))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ARTICLE_CATEGORY_LABEL.to_string()),
        slug_match,
    }
}

fn first_category<'a>(raw: &RawPost, categories_by_id: &'a HashMap<u64, Term>) -> Option<&'a Term> {
    raw.categories.first().and_then(|id| categories_by_id.get(id))
}

fn rendered(field: &Option<crate::types::Rendered>) -> &str {
    field.as_ref().map(|r| r.rendered.as_str()).unwrap_or("")
}

fn title_of(raw: &RawPost) -> String {
    let t = plain_text(rendered(&raw.title));
    if t.is_empty() { UNTITLED.to_string() } else { t }
}

/// Strip tags, decode entities, collapse whitespace.
pub fn plain_text(html: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_tags(html)))
}

/// Remove complete `<...>` tags. A `<` without a closing `>`, or an empty
/// `<>`, is text and stays.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => {
                // Tags often separate words (`</p><p>`)
                out.push(' ');
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // Entities are short; anything longer is literal text
        let end = rest.char_indices().take(12).find(|(_, c)| *c == ';').map(|(i, _)| i);
        match end.and_then(|e| decode_one(&rest[1..e]).map(|c| (e, c))) {
            Some((e, c)) => {
                out.push(c);
                rest = &rest[e + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "hellip" => '…',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => return None,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut at a word boundary and append `…` when longer than `max` chars.
pub fn bound_excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == '.'))
}

/// RFC 3339 first, then the offset-less form the CMS emits (taken as UTC), then a bare date.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}
