//! Text normalization, entity handling, counting, and link-density utilities.
//!
//! Length comparisons throughout the scoring pass are in Unicode code
//! points, not bytes; the whitespace normalizer's non-breaking-space and
//! zero-width-space special cases are handled at the byte level for
//! performance, mirroring the source's `utf8len`/whitespace-normalizer
//! split.

use dom_query::Selection;

use crate::patterns;

const NBSP: &str = "\u{00A0}";
const ZWSP: &str = "\u{200B}";

/// Collapse runs of ASCII whitespace and non-breaking spaces into a single
/// space, and drop zero-width spaces. Leading/trailing whitespace is left
/// in the returned string (callers trim separately for length counts).
///
/// Idempotent: normalizing twice yields the same result as normalizing
/// once.
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    let despaced = s.replace(ZWSP, "").replace(NBSP, " ");
    let mut out = String::with_capacity(despaced.len());
    let mut last_was_space = false;
    for c in despaced.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// Decode the entities the source recognizes: `&amp;`, `&quot;`, `&apos;`,
/// `&lt;`, `&gt;`, and `&#NN;` (decimal numeric). Hex numeric entities
/// (`&#xNN;`) are a known gap, left undecoded.
#[must_use]
pub fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some(rest) = s.get(i + 1..) {
                if let Some(decoded) = decode_named_entity(rest) {
                    out.push_str(decoded.0);
                    i += 1 + decoded.1;
                    continue;
                }
                if let Some(stripped) = rest.strip_prefix('#') {
                    let digits: String = stripped.chars().take_while(char::is_ascii_digit).collect();
                    if !digits.is_empty() {
                        let after = &stripped[digits.len()..];
                        if after.starts_with(';') {
                            if let Ok(code) = digits.parse::<u32>() {
                                if let Some(ch) = char::from_u32(code) {
                                    out.push(ch);
                                    i += 1 + 1 + digits.len() + 1;
                                    continue;
                                }
                            }
                        }
                    }
                }
            }
        }
        let ch = s[i..].chars().next().unwrap_or('&');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn decode_named_entity(rest: &str) -> Option<(&'static str, usize)> {
    const NAMED: &[(&str, &str)] = &[
        ("amp;", "&"),
        ("quot;", "\""),
        ("apos;", "'"),
        ("lt;", "<"),
        ("gt;", ">"),
    ];
    for (name, value) in NAMED {
        if rest.starts_with(name) {
            return Some((value, name.len()));
        }
    }
    None
}

/// Re-escape the five basic entities. Composed with [`unescape_entities`],
/// this is a no-op on ASCII inputs that contain none of `& " ' < >`.
#[must_use]
pub fn escape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Word count. Default mode splits on whitespace; "separators-as-spaces"
/// additionally splits on any of `| - \ / > »`.
#[must_use]
pub fn word_count(s: &str, separators_as_spaces: bool) -> usize {
    if separators_as_spaces {
        s.split(|c: char| c.is_whitespace() || "|-\\/>\u{00BB}".contains(c))
            .filter(|w| !w.is_empty())
            .count()
    } else {
        s.split_whitespace().count()
    }
}

/// Count occurrences of a byte in a string.
#[must_use]
pub fn char_count(s: &str, byte: u8) -> usize {
    s.bytes().filter(|&b| b == byte).count()
}

/// Length (in code points) of the concatenated text content, with leading
/// and trailing whitespace trimmed from the count but **without**
/// whitespace collapsing.
#[must_use]
pub fn text_content_length(sel: &Selection) -> usize {
    let text = sel.text();
    text.trim().chars().count()
}

/// Length (in code points) after full normalization. Used to compare
/// article sizes across retry attempts.
#[must_use]
pub fn text_normalized_content_length(sel: &Selection) -> usize {
    let text = sel.text();
    normalize_whitespace(text.trim()).trim().chars().count()
}

/// Normalized-length of an HTML fragment's *text*, for comparing attempt
/// slots that are stored as serialized HTML rather than live selections.
/// Parses the fragment and measures its text content, so markup and
/// attribute characters never inflate the count.
#[must_use]
pub fn text_normalized_len_html(html: &str) -> usize {
    let doc = dom_query::Document::from(html);
    let body = doc.select("body");
    if body.exists() {
        text_normalized_content_length(&body)
    } else {
        text_normalized_content_length(&doc.select("html"))
    }
}

/// Link density: the fraction of a node's normalized text that lies
/// inside descendant `<a>` elements. Zero if the node has no text.
#[must_use]
pub fn link_density(sel: &Selection) -> f64 {
    let total = text_normalized_content_length(sel);
    if total == 0 {
        return 0.0;
    }
    let links = sel.select("a");
    let mut link_len = 0usize;
    for link in links.nodes() {
        let link_sel = Selection::from(*link);
        link_len += text_normalized_content_length(&link_sel);
    }
    link_len as f64 / total as f64
}

/// Whether trimmed text ends in sentence-ending punctuation (`. ` or `.$`).
#[must_use]
pub fn ends_like_a_sentence(s: &str) -> bool {
    patterns::SENTENCE_DOT.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_query::Document;

    #[test]
    fn normalize_is_idempotent() {
        let input = "  a\u{00A0}\u{00A0}b\t\tc\u{200B}  ";
        let once = normalize_whitespace(input);
        let twice = normalize_whitespace(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_collapses_nbsp_and_drops_zwsp() {
        let input = "a\u{00A0}\u{00A0}b\u{200B}c";
        assert_eq!(normalize_whitespace(input), "a b c");
    }

    #[test]
    fn entity_roundtrip_is_noop_on_ascii() {
        let input = "plain ascii text with no entities 123";
        let unescaped = unescape_entities(input);
        let reescaped = escape_entities(&unescaped);
        assert_eq!(reescaped, input);
    }

    #[test]
    fn unescape_handles_named_and_decimal_entities() {
        assert_eq!(unescape_entities("A &amp; B"), "A & B");
        assert_eq!(unescape_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(unescape_entities("&#65;&#66;"), "AB");
    }

    #[test]
    fn word_count_default_splits_whitespace_only() {
        assert_eq!(word_count("a|b-c d", false), 2);
    }

    #[test]
    fn word_count_separators_as_spaces_splits_extra_chars() {
        assert_eq!(word_count("a|b-c d", true), 4);
    }

    #[test]
    fn link_density_is_zero_with_no_links() {
        let doc = Document::from("<p>plain text here</p>");
        let p = doc.select("p");
        assert_eq!(link_density(&p), 0.0);
    }

    #[test]
    fn link_density_reflects_anchor_share_of_text() {
        let doc = Document::from("<p><a href=\"x\">link</a> rest</p>");
        let p = doc.select("p");
        let density = link_density(&p);
        assert!(density > 0.0 && density < 1.0);
    }

    #[test]
    fn normalized_len_html_ignores_markup() {
        let html = r#"<div id="readability-page-1" class="page"><p>hi</p></div>"#;
        // Text is "hi" (2 chars); the raw string is far longer than that.
        assert_eq!(text_normalized_len_html(html), 2);
        assert!(html.len() > 2);
    }
}
