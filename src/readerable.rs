//! The readerable quick check.
//!
//! Independent of full extraction: scores a handful of block-level nodes
//! and returns as soon as the running total passes the threshold, without
//! ever mutating the document.

use dom_query::{Document, NodeRef, Selection};

use crate::dom;
use crate::patterns;
use crate::text;

const SCORE_THRESHOLD: f64 = 20.0;
const LENGTH_FLOOR: usize = 140;

/// Walk the document scoring visible `<p>`/`<pre>` and `<div>`-with-`<br>`
/// nodes; true as soon as the accumulated score exceeds 20.
#[must_use]
pub fn is_readerable(doc: &Document) -> bool {
    let Some(root) = doc.select("html").nodes().first().copied() else { return false };
    let root_id = root.id;
    let mut score = 0.0;
    let mut cursor = dom::following(root, root_id);

    while let Some(node) = cursor {
        if !node.is_element() {
            cursor = dom::following(node, root_id);
            continue;
        }
        let tag = node.node_name().map(|t| t.to_ascii_lowercase()).unwrap_or_default();

        if tag == "p" || tag == "pre" {
            score += score_node(node);
            cursor = dom::following(node, root_id);
        } else if tag == "div" && has_direct_br_child(node) {
            score += score_node(node);
            cursor = dom::skip_descendants(node, root_id);
        } else {
            cursor = dom::following(node, root_id);
        }

        if score > SCORE_THRESHOLD {
            return true;
        }
    }

    false
}

fn score_node(node: NodeRef) -> f64 {
    let sel = Selection::from(node);
    if !dom::is_visible(&sel) {
        return 0.0;
    }
    if dom::has_ancestor_tag(node, "li") {
        return 0.0;
    }
    if dom::class_or_id_matches(&sel, &patterns::UNLIKELY) {
        return 0.0;
    }
    let len = text::text_content_length(&sel);
    if len < LENGTH_FLOOR {
        return 0.0;
    }
    ((len - LENGTH_FLOOR) as f64).sqrt()
}

fn has_direct_br_child(node: NodeRef) -> bool {
    node.children()
        .any(|c| c.is_element() && c.node_name().is_some_and(|t| t.eq_ignore_ascii_case("br")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lorem(chars: usize) -> String {
        "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod "
            .chars()
            .cycle()
            .take(chars)
            .collect()
    }

    #[test]
    fn single_short_paragraph_is_not_readerable() {
        let html = format!("<html><body><p>{}</p></body></html>", lorem(300));
        let doc = Document::from(html);
        assert!(!is_readerable(&doc));
    }

    #[test]
    fn several_long_paragraphs_are_readerable() {
        let html = format!(
            "<html><body><p>{}</p><p>{}</p><p>{}</p></body></html>",
            lorem(300),
            lorem(300),
            lorem(300)
        );
        let doc = Document::from(html);
        assert!(is_readerable(&doc));
    }

    #[test]
    fn removing_all_paragraphs_makes_it_unreaderable() {
        let html = "<html><body><div>no long text here</div></body></html>";
        let doc = Document::from(html);
        assert!(!is_readerable(&doc));
    }

    #[test]
    fn paragraph_inside_li_does_not_count() {
        let html = format!("<html><body><ul><li><p>{}</p></li></ul></body></html>", lorem(500));
        let doc = Document::from(html);
        assert!(!is_readerable(&doc));
    }

    #[test]
    fn div_with_br_child_counts_like_a_paragraph() {
        let html = format!("<html><body><div>{}<br>more</div></body></html>", lorem(500));
        let doc = Document::from(html);
        assert!(is_readerable(&doc));
    }
}
