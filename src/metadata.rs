//! Metadata harvester.
//!
//! Walks the document once, remembering the `<title>` element and ranking
//! every matching `<meta>` element against the priority tables below. This
//! is safe to call independently of [`crate::extract`] (it never mutates
//! the document), matching the external interface's third entry point.

use dom_query::Document;

use crate::patterns;
use crate::result::Metadata;
use crate::text;

/// Priority-ranked candidate keys for the `title` field, smallest index
/// wins (`<=` tie-break: a later match at the same rank still wins).
const TITLE_KEYS: &[&str] = &[
    "dc:title",
    "dcterm:title",
    "og:title",
    "weibo:article:title",
    "weibo:webpage:title",
    "title",
    "twitter:title",
];

const BYLINE_KEYS: &[&str] = &["dc:creator", "dcterm:creator", "author"];

const EXCERPT_KEYS: &[&str] = &[
    "dc:description",
    "dcterm:description",
    "og:description",
    "weibo:article:description",
    "weibo:webpage:description",
    "description",
    "twitter:description",
];

const SITE_NAME_KEYS: &[&str] = &["og:site_name"];

#[derive(Default)]
struct Ranked {
    title: Option<(usize, String)>,
    byline: Option<(usize, String)>,
    excerpt: Option<(usize, String)>,
    site_name: Option<(usize, String)>,
}

impl Ranked {
    fn consider(&mut self, key: &str, content: &str) {
        try_assign(&mut self.title, TITLE_KEYS, key, content);
        try_assign(&mut self.byline, BYLINE_KEYS, key, content);
        try_assign(&mut self.excerpt, EXCERPT_KEYS, key, content);
        try_assign(&mut self.site_name, SITE_NAME_KEYS, key, content);
    }
}

fn try_assign(slot: &mut Option<(usize, String)>, table: &[&str], key: &str, content: &str) {
    let Some(rank) = table.iter().position(|candidate| *candidate == key) else {
        return;
    };
    let should_replace = match slot {
        None => true,
        Some((current_rank, _)) => rank <= *current_rank,
    };
    if should_replace {
        *slot = Some((rank, content.to_string()));
    }
}

/// Recognized keys for the `property` attribute: `(dc|dcterm|og|twitter):*`
/// only, no `weibo:*` namespaces (those are `name`-only) and no bare
/// `author`.
const PROPERTY_KEYS: &[&str] = &[
    "dc:title", "dcterm:title", "og:title", "twitter:title",
    "dc:creator", "dcterm:creator",
    "dc:description", "dcterm:description", "og:description", "twitter:description",
    "og:site_name",
];

/// Recognized keys for the `name` attribute: the same namespaces as
/// `property` plus the `weibo:article`/`weibo:webpage` namespaces and
/// the bare `author` key.
const NAME_KEYS: &[&str] = &[
    "dc:title", "dcterm:title", "og:title", "twitter:title",
    "dc:creator", "dcterm:creator", "author",
    "dc:description", "dcterm:description", "og:description", "twitter:description",
    "og:site_name",
    "weibo:article:title", "weibo:webpage:title",
    "weibo:article:description", "weibo:webpage:description",
];

/// Normalize `raw` (`.`/`:` as a separator, case-insensitive) and check it
/// against `table`, returning the normalized key if recognized.
fn normalize_meta_key(raw: &str, table: &[&str]) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace('.', ":").to_ascii_lowercase();
    if table.contains(&normalized.as_str()) {
        Some(normalized)
    } else {
        None
    }
}

/// Harvest title/byline/excerpt/site-name from `<meta>`/`<title>` elements.
///
/// The `title` field falls back to the `<title>` element's text when no
/// meta tag supplied one, applying the separator/colon truncation
/// heuristics from the data model.
#[must_use]
pub fn harvest_metadata(doc: &Document) -> Metadata {
    let mut ranked = Ranked::default();

    for meta in doc.select("meta").nodes() {
        let sel = dom_query::Selection::from(*meta);
        let Some(content) = crate::dom::get_attribute(&sel, "content") else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        let property = crate::dom::get_attribute(&sel, "property")
            .and_then(|p| normalize_meta_key(&p, PROPERTY_KEYS));
        let normalized = match property {
            Some(normalized) => Some(normalized),
            None => crate::dom::get_attribute(&sel, "name")
                .and_then(|n| normalize_meta_key(&n, NAME_KEYS)),
        };
        let Some(normalized) = normalized else { continue };
        ranked.consider(&normalized, content);
    }

    let title_sel = doc.select("title");
    let title_element_text = if title_sel.exists() {
        Some(text::normalize_whitespace(title_sel.text().trim()))
    } else {
        None
    };

    let title = ranked
        .title
        .map(|(_, v)| text::normalize_whitespace(v.trim()))
        .or_else(|| title_element_text.map(|t| fallback_title(doc, &t)));

    Metadata {
        title,
        byline: ranked.byline.map(|(_, v)| text::normalize_whitespace(v.trim())),
        excerpt: ranked.excerpt.map(|(_, v)| text::normalize_whitespace(v.trim())),
        site_name: ranked.site_name.map(|(_, v)| text::normalize_whitespace(v.trim())),
        direction: None,
    }
}

/// Derive a title from the `<title>` element's text per the three-step
/// fallback: separator truncation, colon truncation (guarded against
/// colliding with an on-page heading), then the "too short" revert.
fn fallback_title(doc: &Document, original: &str) -> String {
    let original_word_count = text::word_count(original, false);

    if let Some(m) = patterns::TITLE_SEPARATOR.find_iter(original).last() {
        let truncated = original[..m.start()].trim_end();
        if !truncated.is_empty() {
            return finalize_or_revert(truncated, original, original_word_count, true);
        }
    }

    if let Some(idx) = original.rfind(':') {
        let truncated = original[idx + 1..].trim();
        if !truncated.is_empty() {
            let matches_heading = doc.select("h1, h2").nodes().iter().any(|h| {
                let heading_text = text::normalize_whitespace(
                    dom_query::Selection::from(*h).text().trim(),
                );
                heading_text == original
            });
            if !matches_heading {
                return finalize_or_revert(truncated, original, original_word_count, false);
            }
        }
    }

    original.to_string()
}

fn finalize_or_revert(
    candidate: &str,
    original: &str,
    original_word_count: usize,
    used_separator: bool,
) -> String {
    let candidate_word_count = text::word_count(candidate, false);
    let too_short = candidate_word_count <= 4
        && (!used_separator || candidate_word_count != original_word_count.saturating_sub(1));
    if too_short {
        original.to_string()
    } else {
        candidate.to_string()
    }
}
