//! Post-processing: the pass that runs once over the finished article,
//! after cleanup. Rewrites links and media URLs to
//! absolute form, strips leftover `class` attributes, normalizes text
//! nodes outside `<pre>`/`<code>`, pads elements that would otherwise
//! serialize as self-closing, and fills in the metadata excerpt when
//! none was harvested.

use dom_query::{Document, NodeRef, Selection};
use url::Url;

use crate::dom;
use crate::options::Config;
use crate::result::Metadata;
use crate::text;
use crate::url_utils;

/// Tags whose `src`/`poster`/`srcset` attributes carry media URLs.
const MEDIA_TAGS: &[&str] = &["img", "picture", "figure", "video", "audio", "source"];

/// Run the full post-processing pass over the finished article document,
/// filling in `metadata`'s excerpt fallback and trimming its fields.
pub fn postprocess(doc: &Document, config: &Config, metadata: &mut Metadata) {
    let base = config.base_url.as_deref().and_then(|b| Url::parse(b).ok());

    rewrite_links(doc, base.as_ref(), config.url_override);
    rewrite_media_urls(doc, base.as_ref());
    strip_classes(doc);
    normalize_text_nodes(doc);
    collapse_nested_pre_code(doc);
    pad_empty_elements(doc);
    fill_excerpt_fallback(doc, metadata);
    finalize_metadata_strings(metadata);
}

// === Link rewriting ===

fn rewrite_links(doc: &Document, base: Option<&Url>, url_override: bool) {
    for node in doc.select("a").nodes().to_vec() {
        let sel = Selection::from(node);
        let Some(href) = dom::get_attribute(&sel, "href") else { continue };
        if href.starts_with("javascript:") {
            replace_with_span_or_text(&sel);
            continue;
        }
        if href.starts_with('#') && !url_override {
            continue;
        }
        let resolved = url_utils::resolve_url(&href, base);
        dom::set_attribute(&sel, "href", &resolved);
    }
}

/// Replace a `javascript:` `<a>` with a bare text node if it has a
/// single text child, otherwise a `<span>` wrapping its children.
fn replace_with_span_or_text(sel: &Selection) {
    let Some(node) = sel.nodes().first().copied() else { return };
    let children: Vec<NodeRef> = node.children().collect();
    if children.len() == 1 && children[0].is_text() {
        let text = Selection::from(children[0]).text();
        dom::replace_with_html(sel, &text::escape_entities(&text));
    } else {
        let inner = dom::inner_html(sel).to_string();
        dom::replace_with_html(sel, &format!("<span>{inner}</span>"));
    }
}

// === Media URL rewriting ===

fn rewrite_media_urls(doc: &Document, base: Option<&Url>) {
    for tag in MEDIA_TAGS {
        for node in doc.select(tag).nodes().to_vec() {
            let sel = Selection::from(node);
            for attr in ["src", "poster"] {
                if let Some(value) = dom::get_attribute(&sel, attr) {
                    if !value.is_empty() {
                        dom::set_attribute(&sel, attr, &url_utils::resolve_url(&value, base));
                    }
                }
            }
            if let Some(srcset) = dom::get_attribute(&sel, "srcset") {
                if !srcset.is_empty() {
                    dom::set_attribute(&sel, "srcset", &url_utils::resolve_srcset(&srcset, base));
                }
            }
        }
    }
}

// === Class stripping ===

/// The one class value the engine itself sets on the article's final
/// wrapper (see `grabber::shape_final`) and that survives stripping.
const PRESERVED_CLASS: &str = "page";

fn strip_classes(doc: &Document) {
    for node in doc.select("*").nodes().to_vec() {
        let sel = Selection::from(node);
        if dom::class_name(&sel).as_deref() == Some(PRESERVED_CLASS) {
            continue;
        }
        dom::remove_attribute(&sel, "class");
    }
}

// === Text normalization ===

fn normalize_text_nodes(doc: &Document) {
    let Some(root) = doc.select("html").nodes().first().copied() else { return };
    let root_id = root.id;
    let mut cursor = dom::following(root, root_id);
    while let Some(node) = cursor {
        if node.is_text() {
            if !dom::has_ancestor_tag(node, "pre") && !dom::has_ancestor_tag(node, "code") {
                let sel = Selection::from(node);
                let raw = sel.text();
                let normalized = text::normalize_whitespace(&raw);
                if normalized.as_str() != raw.as_ref() {
                    dom::replace_with_html(&sel, &text::escape_entities(&normalized));
                }
            }
            cursor = dom::skip_descendants(node, root_id);
        } else {
            cursor = dom::following(node, root_id);
        }
    }
}

/// Collapse a `<pre>` whose only non-whitespace child is a single
/// `<code>` into a `<pre>` holding that code's content directly.
fn collapse_nested_pre_code(doc: &Document) {
    for node in doc.select("pre").nodes().to_vec() {
        let pre_sel = Selection::from(node);
        let children: Vec<NodeRef> = node.children().collect();
        let element_children: Vec<NodeRef> = children.iter().copied().filter(NodeRef::is_element).collect();
        if element_children.len() != 1 {
            continue;
        }
        let code = element_children[0];
        if !code.node_name().is_some_and(|t| t.eq_ignore_ascii_case("code")) {
            continue;
        }
        let only_code_and_whitespace = children
            .iter()
            .all(|c| c.id == code.id || (c.is_text() && Selection::from(*c).text().trim().is_empty()));
        if !only_code_and_whitespace {
            continue;
        }
        let inner = dom::inner_html(&Selection::from(code)).to_string();
        dom::set_inner_html(&pre_sel, &inner);
    }
}

// === Empty-tag padding ===

/// Tags that serialize as self-closing (and so lose their semantic
/// meaning as a container) when they have no content at all.
const PADDED_TAGS: &[&str] = &["iframe", "em", "a"];

fn pad_empty_elements(doc: &Document) {
    for tag in PADDED_TAGS {
        for node in doc.select(tag).nodes().to_vec() {
            if node.children().next().is_none() {
                dom::set_inner_html(&Selection::from(node), " ");
            }
        }
    }
}

// === Excerpt fallback ===

fn fill_excerpt_fallback(doc: &Document, metadata: &mut Metadata) {
    if metadata.excerpt.is_some() {
        return;
    }
    let Some(first_p) = doc.select("p").nodes().first().copied() else { return };
    let normalized = text::normalize_whitespace(Selection::from(first_p).text().trim());
    if !normalized.is_empty() {
        metadata.excerpt = Some(normalized);
    }
}

// === Metadata finalization ===

fn finalize_metadata_strings(metadata: &mut Metadata) {
    for field in [
        &mut metadata.title,
        &mut metadata.byline,
        &mut metadata.excerpt,
        &mut metadata.site_name,
        &mut metadata.direction,
    ] {
        if let Some(value) = field {
            *value = text::unescape_entities(value.trim());
        }
    }
}
