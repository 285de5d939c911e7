//! Crate-wide invariants that must hold for every successful extraction.

use rs_rdrview::{extract_default, harvest_metadata, readerable, text};

fn lorem(chars: usize) -> String {
    "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor "
        .chars()
        .cycle()
        .take(chars)
        .collect()
}

const BOILERPLATE_TAGS: &[&str] =
    &["<script", "<style", "<noscript", "<iframe", "<input", "<textarea", "<select", "<button", "<aside", "<link", "<footer", "<h1", "<object"];

/// None of the always-stripped tags survive extraction.
#[test]
fn boilerplate_tags_are_stripped() {
    let html = format!(
        r#"<html><head><title>T</title></head><body>
            <script>var x = 1;</script>
            <style>.a {{ color: red }}</style>
            <aside>related stuff</aside>
            <footer>copyright</footer>
            <article><h1>Heading</h1><p>{}</p></article>
        </body></html>"#,
        lorem(600)
    );
    let result = extract_default(&html).expect("should extract");
    let lower = result.content.to_ascii_lowercase();
    for tag in BOILERPLATE_TAGS {
        assert!(!lower.contains(tag), "found {tag} in extracted content");
    }
}

/// An `<embed>` carrying a whitelisted video URL survives where a plain
/// `<embed>` would not.
#[test]
fn whitelisted_embed_video_survives() {
    let html = format!(
        r#"<html><body><article><p>{}</p><embed src="https://www.youtube.com/embed/xyz"></embed></article></body></html>"#,
        lorem(600)
    );
    let result = extract_default(&html).expect("should extract");
    assert!(result.content.to_ascii_lowercase().contains("<embed"));
}

/// `readerable` is monotone in added/removed prose.
#[test]
fn readerable_is_monotone_in_content() {
    let base = format!(
        "<html><body><p>{}</p><p>{}</p><p>{}</p></body></html>",
        lorem(300),
        lorem(300),
        lorem(300)
    );
    assert!(readerable(&base));

    let with_more = format!(
        "<html><body><p>{}</p><p>{}</p><p>{}</p><p>{}</p></body></html>",
        lorem(300),
        lorem(300),
        lorem(300),
        "a".repeat(200)
    );
    assert!(readerable(&with_more));

    let stripped = "<html><body><div>no paragraphs at all here</div></body></html>";
    assert!(!readerable(stripped));
}

/// Normalizing whitespace twice is the same as once.
#[test]
fn whitespace_normalization_is_idempotent() {
    let input = "  a\u{00A0}\u{00A0}b\t\tc\u{200B}  multiple   spaces  ";
    let once = text::normalize_whitespace(input);
    let twice = text::normalize_whitespace(&once);
    assert_eq!(once, twice);
}

/// Unescape composed with re-escape is a no-op on ASCII.
#[test]
fn entity_roundtrip_is_noop_on_ascii() {
    let input = "plain ascii text with no entities at all, 123 of them";
    let unescaped = text::unescape_entities(input);
    let reescaped = text::escape_entities(&unescaped);
    assert_eq!(reescaped, input);
}

/// Every output `<a href>` is either a hash bypass or resolves as
/// absolute per the engine's own ABSOLUTE grammar.
#[test]
fn output_links_are_hash_or_absolute() {
    static ABSOLUTE: std::sync::LazyLock<regex::Regex> =
        std::sync::LazyLock::new(|| regex::Regex::new(r"^([A-Za-z]+:)?//").expect("ABSOLUTE regex"));

    let html = format!(
        r#"<html><body><p>{}<a href="/relative/path">one</a> <a href="#jump">two</a> <a href="https://example.com/x">three</a></p></body></html>"#,
        lorem(600)
    );
    let result = extract_default(&html).expect("should extract");

    for href in extract_hrefs(&result.content) {
        assert!(href.starts_with('#') || ABSOLUTE.is_match(&href), "unexpected href: {href}");
    }
}

fn extract_hrefs(html: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = html;
    while let Some(idx) = rest.find("href=\"") {
        rest = &rest[idx + 6..];
        if let Some(end) = rest.find('"') {
            out.push(rest[..end].to_string());
            rest = &rest[end + 1..];
        } else {
            break;
        }
    }
    out
}

/// Every `<img>` in the output has `src` or `srcset` set.
#[test]
fn every_img_has_src_or_srcset() {
    let html = format!(
        r#"<html><body><p>{}<img src="photo.jpg" alt="a photo"></p></body></html>"#,
        lorem(600)
    );
    let result = extract_default(&html).expect("should extract");
    for img in extract_tags(&result.content, "img") {
        assert!(img.contains("src=") || img.contains("srcset="), "img with neither: {img}");
    }
}

fn extract_tags(html: &str, tag: &str) -> Vec<String> {
    let needle = format!("<{tag}");
    let mut out = Vec::new();
    let mut rest = html;
    while let Some(idx) = rest.find(&needle) {
        rest = &rest[idx..];
        if let Some(end) = rest.find('>') {
            out.push(rest[..=end].to_string());
            rest = &rest[end + 1..];
        } else {
            break;
        }
    }
    out
}

/// The final wrapper carries `id="readability-page-1"` and `class="page"`
/// on exactly one element.
#[test]
fn exactly_one_page_wrapper_in_output() {
    let html = format!("<html><body><p>{}</p></body></html>", lorem(600));
    let result = extract_default(&html).expect("should extract");
    assert_eq!(result.content.matches(r#"id="readability-page-1""#).count(), 1);
    assert_eq!(result.content.matches(r#"class="page""#).count(), 1);
}

/// `harvest_metadata` can be used independently of extraction.
#[test]
fn harvest_metadata_is_usable_standalone() {
    let html = r#"<html><head><title>Standalone Title</title></head><body><p>ignored</p></body></html>"#;
    let metadata = harvest_metadata(html);
    assert_eq!(metadata.title.as_deref(), Some("Standalone Title"));
}
