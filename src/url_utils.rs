//! URL resolution for post-processing: absolute-URL detection and
//! resolution against `base_url`, plus the `srcset` grammar layered on
//! top for the attributes that carry more than one URL.
//!
//! Adapted from this lineage's own `url_utils.rs`, trading its
//! `http`/`https`-only absolute check and manual URL assembly for the
//! `url` crate's `Url::join`, which already implements RFC 3986
//! reference resolution (scheme-relative, root-relative, and
//! path-relative references) correctly.

use url::Url;

use crate::patterns;

/// Whether `value` is already absolute per the engine's ABSOLUTE regex
/// (scheme-qualified or protocol-relative), not `url`'s own notion of
/// "has a scheme" — kept distinct so callers can check output links
/// against this exact pattern.
#[must_use]
pub fn is_absolute(value: &str) -> bool {
    patterns::ABSOLUTE.is_match(value)
}

/// Resolve `value` against `base`, returning it unchanged if there is no
/// base, it is empty, or resolution fails.
#[must_use]
pub fn resolve_url(value: &str, base: Option<&Url>) -> String {
    if value.is_empty() {
        return value.to_string();
    }
    let Some(base) = base else {
        return value.to_string();
    };
    base.join(value).map_or_else(|_| value.to_string(), |u| u.to_string())
}

/// One parsed `srcset` entry: a URL and its optional width/density
/// descriptor (e.g. `1x`, `480w`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetEntry {
    pub url: String,
    pub descriptor: Option<String>,
}

/// Parse a `srcset` attribute value into its comma-separated entries.
/// Each entry is `URL [descriptor]`, separated from its descriptor by
/// whitespace; a trailing comma on a bare URL yields an entry with no
/// descriptor.
#[must_use]
pub fn parse_srcset(value: &str) -> Vec<SrcsetEntry> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(2, char::is_whitespace);
            let url = parts.next().unwrap_or_default().to_string();
            let descriptor = parts
                .next()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            SrcsetEntry { url, descriptor }
        })
        .collect()
}

/// Rebuild a `srcset` value from parsed entries: join with `, `, one
/// space between URL and descriptor.
#[must_use]
pub fn rebuild_srcset(entries: &[SrcsetEntry]) -> String {
    entries
        .iter()
        .map(|entry| match &entry.descriptor {
            Some(d) => format!("{} {d}", entry.url),
            None => entry.url.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve every URL in a `srcset` value against `base`, preserving
/// descriptors and entry order.
#[must_use]
pub fn resolve_srcset(value: &str, base: Option<&Url>) -> String {
    let resolved: Vec<SrcsetEntry> = parse_srcset(value)
        .into_iter()
        .map(|entry| SrcsetEntry { url: resolve_url(&entry.url, base), descriptor: entry.descriptor })
        .collect();
    rebuild_srcset(&resolved)
}
