//! Document preparation: the pass that runs once, before scoring, to turn
//! arbitrary page markup into something the grabber can reason about.
//!
//! Comment stripping happens before the document is even parsed (see
//! [`strip_html_comments`]) since `dom_query` exposes no comment nodes to
//! walk afterward; everything else in here operates on the parsed
//! [`Document`].

use dom_query::{Document, NodeRef, Selection};

use crate::dom;
use crate::patterns;
use crate::text;

/// Strip `<!-- ... -->` comments from raw HTML before parsing.
///
/// `dom_query`'s public API has no comment-node type to walk and remove
/// after the fact, so comments are cut out of the source string instead.
/// Non-greedy so that `<!--a--><!--b-->` removes two comments, not
/// everything between the first `<!--` and the last `-->`.
#[must_use]
pub fn strip_html_comments(html: &str) -> String {
    static COMMENT: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"(?s)<!--.*?-->").expect("COMMENT regex")
    });
    COMMENT.replace_all(html, "").into_owned()
}

/// Run the full preparation pass over an already-parsed document.
pub fn prepare_document(doc: &Document) {
    remove_image_placeholders(doc);
    unwrap_noscript_images(doc);
    remove_scripts(doc);
    remove_styles_and_rename_fonts(doc);
    coalesce_br_runs(doc);
}

/// Remove `<img>` elements with no real image source: no `src`,
/// `srcset`, `data-src`, `data-src`, `data-srcset`, and no attribute whose
/// value merely looks like an image URL.
fn remove_image_placeholders(doc: &Document) {
    let imgs: Vec<NodeRef> = doc.select("img").nodes().to_vec();
    for node in imgs {
        let sel = Selection::from(node);
        let has_source_attr = ["src", "srcset", "data-src", "data-srcset"]
            .iter()
            .any(|attr| dom::get_attribute(&sel, attr).is_some_and(|v| !v.trim().is_empty()));
        let has_image_like_attr = dom::get_all_attributes(&sel)
            .iter()
            .any(|(_, v)| patterns::IMGEXT.is_match(v));
        if !has_source_attr && !has_image_like_attr {
            dom::remove(&sel);
        }
    }
}

/// Replace `<noscript>` wrappers around a single real `<img>` with that
/// image, merging in any image-bearing attributes lost from the preceding
/// placeholder `<img>` (the one browsers render with JS disabled).
fn unwrap_noscript_images(doc: &Document) {
    let noscripts: Vec<NodeRef> = doc.select("noscript").nodes().to_vec();
    for noscript in noscripts {
        let noscript_sel = Selection::from(noscript);
        let Some(inner_img) = single_img_descendant(noscript_sel.clone()) else {
            continue;
        };
        let Some(prev) = dom::previous_element_sibling(&noscript_sel) else {
            continue;
        };
        let prev_is_single_image =
            dom::tag_name(&prev).as_deref() == Some("img") || single_img_descendant(prev.clone()).is_some();
        if !prev_is_single_image {
            continue;
        }
        let old_img = if dom::tag_name(&prev).as_deref() == Some("img") {
            prev.clone()
        } else {
            single_img_descendant(prev.clone()).expect("checked above")
        };
        merge_image_attributes(&old_img, &inner_img);
        let replacement_html = dom::outer_html(&inner_img).to_string();
        dom::remove(&prev);
        dom::replace_with_html(&noscript_sel, &replacement_html);
    }
}

/// Walk down through single-element-child wrappers to find a lone `<img>`.
/// Returns `None` if the subtree branches or bottoms out in anything else.
fn single_img_descendant<'a>(start: Selection<'a>) -> Option<Selection<'a>> {
    let mut current = start;
    loop {
        let kids = dom::children(&current);
        let nodes = kids.nodes();
        if nodes.len() != 1 {
            return None;
        }
        let child = Selection::from(nodes[0]);
        if dom::tag_name(&child).as_deref() == Some("img") {
            return Some(child);
        }
        current = child;
    }
}

/// Copy `src`/`srcset` and any image-extension-looking attribute from the
/// placeholder image onto the noscript image. The noscript image's own
/// value for a given attribute always wins; the placeholder's value is
/// only kept, under a `data-old-<name>` backup, when the noscript image
/// already carries that attribute under a different value.
fn merge_image_attributes(old_img: &Selection, new_img: &Selection) {
    for (name, value) in dom::get_all_attributes(old_img) {
        if value.trim().is_empty() {
            continue;
        }
        let eligible = name == "src" || name == "srcset" || patterns::IMGEXT.is_match(&value);
        if !eligible {
            continue;
        }
        if dom::get_attribute(new_img, &name).as_deref() == Some(value.as_str()) {
            continue;
        }
        if dom::has_attribute(new_img, &name) {
            dom::set_attribute(new_img, &format!("data-old-{name}"), &value);
        } else {
            dom::set_attribute(new_img, &name, &value);
        }
    }
}

/// Remove every `<script>` and any leftover `<noscript>`, clearing their
/// attributes and content first.
fn remove_scripts(doc: &Document) {
    for node in doc.select("script").nodes().to_vec() {
        let sel = Selection::from(node);
        dom::clear_all_attributes(&sel);
        dom::set_inner_html(&sel, "");
        dom::remove(&sel);
    }
    for node in doc.select("noscript").nodes().to_vec() {
        let sel = Selection::from(node);
        dom::set_inner_html(&sel, "");
        dom::remove(&sel);
    }
}

/// Remove `<style>` elements outright and rename legacy `<font>` elements
/// to `<span>` so later steps don't need to special-case them.
fn remove_styles_and_rename_fonts(doc: &Document) {
    for node in doc.select("style").nodes().to_vec() {
        dom::remove(&Selection::from(node));
    }
    for node in doc.select("font").nodes().to_vec() {
        dom::rename(&Selection::from(node), "span");
    }
}

fn is_whitespace_text(node: NodeRef) -> bool {
    node.is_text() && Selection::from(node).text().trim().is_empty()
}

fn next_significant_sibling(node: NodeRef) -> Option<NodeRef> {
    let mut cur = node.next_sibling();
    while let Some(n) = cur {
        if is_whitespace_text(n) {
            cur = n.next_sibling();
            continue;
        }
        return Some(n);
    }
    None
}

fn is_br(node: NodeRef) -> bool {
    node.is_element()
        && node
            .node_name()
            .is_some_and(|n| n.eq_ignore_ascii_case("br"))
}

/// Collapse runs of two or more `<br>` elements (ignoring intervening
/// whitespace text) into a `<p>` that adopts the following phrasing-content
/// siblings, per the source's `replaceBrs` pass.
fn coalesce_br_runs(doc: &Document) {
    loop {
        let brs: Vec<NodeRef> = doc.select("br").nodes().to_vec();
        let mut mutated = false;

        for br in brs {
            let br_sel = Selection::from(br);
            if dom::tag_name(&br_sel).as_deref() != Some("br") {
                // Already consumed by an earlier iteration of this loop.
                continue;
            }

            let mut next = next_significant_sibling(br);
            let mut replaced = false;
            while let Some(n) = next {
                if !is_br(n) {
                    break;
                }
                replaced = true;
                let after = next_significant_sibling(n);
                Selection::from(n).remove();
                next = after;
            }

            if !replaced {
                continue;
            }

            dom::rename(&br_sel, "p");

            let mut move_html = String::new();
            let mut cursor = next;
            while let Some(n) = cursor {
                if is_br(n) {
                    if let Some(after_br) = next_significant_sibling(n) {
                        if is_br(after_br) {
                            break;
                        }
                    }
                }
                if !dom::is_phrasing_content(n) {
                    break;
                }
                let next_cursor = n.next_sibling();
                let sibling_sel = Selection::from(n);
                if n.is_text() {
                    move_html.push_str(&text::escape_entities(&sibling_sel.text()));
                } else {
                    move_html.push_str(&dom::outer_html(&sibling_sel));
                }
                dom::remove(&sibling_sel);
                cursor = next_cursor;
            }

            let trimmed = move_html.trim_end();
            if !trimmed.is_empty() {
                dom::append_html(&br_sel, trimmed);
            }

            if let Some(parent_node) = dom::parent(&br_sel).nodes().first().copied() {
                let parent_sel = Selection::from(parent_node);
                if dom::tag_name(&parent_sel).as_deref() == Some("p") {
                    dom::rename(&parent_sel, "div");
                }
            }

            mutated = true;
            break;
        }

        if !mutated {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_comments_removes_single_and_multiple_comments() {
        let html = "<p>a</p><!-- one --><p>b</p><!--two--><p>c</p>";
        let stripped = strip_html_comments(html);
        assert_eq!(stripped, "<p>a</p><p>b</p><p>c</p>");
    }

    #[test]
    fn strip_html_comments_is_nongreedy_across_comments() {
        let html = "<!--a--><div>keep</div><!--b-->";
        assert_eq!(strip_html_comments(html), "<div>keep</div>");
    }

    #[test]
    fn placeholder_image_with_no_source_is_removed() {
        let doc = Document::from(r#"<div><img class="spinner"><img src="real.jpg"></div>"#);
        prepare_document(&doc);
        assert_eq!(doc.select("img").length(), 1);
    }

    #[test]
    fn noscript_image_replaces_placeholder_sibling() {
        let doc = Document::from(
            r#"<div><img src="placeholder.gif"><noscript><img src="real.jpg"></noscript></div>"#,
        );
        prepare_document(&doc);
        let imgs = doc.select("img");
        assert_eq!(imgs.length(), 1);
        assert_eq!(
            dom::get_attribute(&imgs, "src").as_deref(),
            Some("real.jpg")
        );
        assert_eq!(
            dom::get_attribute(&imgs, "data-old-src").as_deref(),
            Some("placeholder.gif")
        );
        assert_eq!(doc.select("noscript").length(), 0);
    }

    #[test]
    fn scripts_and_styles_are_removed_fonts_renamed() {
        let doc = Document::from(
            "<div><script>evil()</script><style>p{color:red}</style><font>text</font></div>",
        );
        prepare_document(&doc);
        assert_eq!(doc.select("script").length(), 0);
        assert_eq!(doc.select("style").length(), 0);
        assert_eq!(doc.select("font").length(), 0);
        assert_eq!(doc.select("span").length(), 1);
    }

    #[test]
    fn double_br_runs_coalesce_into_paragraphs() {
        let doc = Document::from("<div>A<br><br>B<br><br>C</div>");
        prepare_document(&doc);
        let ps = doc.select("p");
        assert_eq!(ps.length(), 2);
        let texts: Vec<String> = ps.nodes().iter().map(|n| Selection::from(*n).text().to_string()).collect();
        assert_eq!(texts, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn single_br_is_left_alone() {
        let doc = Document::from("<div>A<br>B</div>");
        prepare_document(&doc);
        assert_eq!(doc.select("p").length(), 0);
        assert_eq!(doc.select("br").length(), 1);
    }
}
