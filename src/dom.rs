//! DOM adapter over `dom_query`.
//!
//! A thin layer of free functions over `dom_query::Selection`/`NodeRef` that
//! the rest of the engine builds on, plus the document-order traversal
//! primitives from the data model (below the querying/manipulation
//! wrappers).

// Re-export core types for external use
pub use dom_query::{Document, Selection};

// StrTendril is reference-counted (non-atomic `Rc`), so cloning is O(1) and
// most call sites can pass it around without converting to an owned String.
pub use tendril::StrTendril;

// === Attribute Operations ===

/// Get element ID attribute
#[inline]
#[must_use]
pub fn id(sel: &Selection) -> Option<String> {
    sel.attr("id").map(|s| s.to_string())
}

/// Get element class attribute
#[inline]
#[must_use]
pub fn class_name(sel: &Selection) -> Option<String> {
    sel.attr("class").map(|s| s.to_string())
}

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Set an attribute value
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

/// Check if attribute exists
#[inline]
#[must_use]
pub fn has_attribute(sel: &Selection, name: &str) -> bool {
    sel.has_attr(name)
}

/// Remove an attribute
#[inline]
pub fn remove_attribute(sel: &Selection, name: &str) {
    sel.remove_attr(name);
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_string())
}

// === Text Content ===

/// Get inner HTML content
#[inline]
#[must_use]
pub fn inner_html(sel: &Selection) -> StrTendril {
    sel.inner_html()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> StrTendril {
    sel.html()
}

// === Tree Navigation ===

/// Get parent element
#[inline]
#[must_use]
pub fn parent<'a>(sel: &Selection<'a>) -> Selection<'a> {
    sel.parent()
}

/// Get direct element children
#[inline]
#[must_use]
pub fn children<'a>(sel: &Selection<'a>) -> Selection<'a> {
    sel.children()
}

/// Get next element sibling (skipping text nodes)
#[must_use]
pub fn next_element_sibling<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    sel.nodes().first().and_then(|node| {
        let mut sibling = node.next_sibling();
        while let Some(s) = sibling {
            if s.is_element() {
                return Some(Selection::from(s));
            }
            sibling = s.next_sibling();
        }
        None
    })
}

/// Get previous element sibling (skipping text nodes)
#[must_use]
pub fn previous_element_sibling<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    sel.nodes().first().and_then(|node| {
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            if s.is_element() {
                return Some(Selection::from(s));
            }
            sibling = s.prev_sibling();
        }
        None
    })
}

// === Tree Manipulation ===

/// Remove elements from tree
#[inline]
pub fn remove(sel: &Selection) {
    sel.remove();
}

/// Append HTML content
#[inline]
pub fn append_html(sel: &Selection, html: &str) {
    sel.append_html(html);
}

/// Set HTML content
#[inline]
pub fn set_inner_html(sel: &Selection, html: &str) {
    sel.set_html(html);
}

/// Replace element with HTML
#[inline]
pub fn replace_with_html(sel: &Selection, html: &str) {
    sel.replace_with_html(html);
}

/// Rename element tag
#[inline]
pub fn rename(sel: &Selection, new_tag: &str) {
    sel.rename(new_tag);
}

// === Element Utilities ===

/// Get all attributes as key-value pairs
///
/// Returns empty vector if node has no attributes or if selection is empty.
#[must_use]
pub fn get_all_attributes(sel: &Selection) -> Vec<(String, String)> {
    sel.nodes()
        .first()
        .map(|node| {
            node.attrs()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

// === Additional Utilities ===

/// Clear all attributes from a selection.
///
/// Go equivalent: `elem.Attr = nil` in html-processing.go
pub fn clear_all_attributes(sel: &Selection) {
    let attrs = get_all_attributes(sel);
    for (key, _) in attrs {
        remove_attribute(sel, &key);
    }
}

// === Parsing ===

/// Parse HTML string into document
///
/// Go equivalent: `dom.Parse(reader)`
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Phrasing Content ===

/// Tags that are always phrasing content (inline-safe; may appear inside a
/// paragraph without splitting it).
pub const PHRASING_TAGS: &[&str] = &[
    "abbr", "audio", "b", "bdo", "br", "button", "cite", "code", "data", "datalist", "dfn", "em",
    "embed", "i", "img", "input", "kbd", "label", "mark", "math", "meter", "noscript", "object",
    "output", "progress", "q", "ruby", "samp", "script", "select", "small", "span", "strong",
    "sub", "sup", "textarea", "time", "var", "wbr",
];

/// Tags that are phrasing content only if every descendant is also
/// phrasing content.
pub const CONDITIONAL_PHRASING_TAGS: &[&str] = &["a", "del", "ins"];

/// Whether a node is phrasing content: a text node, a tag in
/// [`PHRASING_TAGS`], or one of [`CONDITIONAL_PHRASING_TAGS`] whose every
/// descendant is itself phrasing content.
#[must_use]
pub fn is_phrasing_content(node: dom_query::NodeRef) -> bool {
    if node.is_text() {
        return true;
    }
    if !node.is_element() {
        return false;
    }
    let Some(tag) = node.node_name() else { return false };
    let tag = tag.to_ascii_lowercase();
    if PHRASING_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if CONDITIONAL_PHRASING_TAGS.contains(&tag.as_str()) {
        return forall_descendants(node, is_phrasing_content);
    }
    false
}

// === Traversal Primitives ===
//
// Document-order walks over a subtree, and the derived predicate/mapping
// operations built on them. These are the single place where tree
// mutation interacts with traversal: every derived operation computes its
// next cursor *before* performing any mutation, so a removed or replaced
// node is visited exactly once and the walk never reads through a dangling
// reference.

use dom_query::{NodeId, NodeRef};

/// Children-first, else next sibling, else walk up until a next sibling is
/// found. Returns `None` once the walk would leave `root`.
#[must_use]
pub fn following<'a>(node: NodeRef<'a>, root_id: NodeId) -> Option<NodeRef<'a>> {
    if let Some(first) = node.children().next() {
        return Some(first);
    }
    skip_descendants(node, root_id)
}

/// Like [`following`] but never descends into the current node's children.
#[must_use]
pub fn skip_descendants<'a>(node: NodeRef<'a>, root_id: NodeId) -> Option<NodeRef<'a>> {
    let mut cur = node;
    loop {
        if cur.id == root_id {
            return None;
        }
        if let Some(sibling) = cur.next_sibling() {
            return Some(sibling);
        }
        cur = cur.parent()?;
    }
}

/// Mirror of [`following`] in reverse document order.
#[must_use]
pub fn previous<'a>(node: NodeRef<'a>, root_id: NodeId) -> Option<NodeRef<'a>> {
    if node.id == root_id {
        return None;
    }
    if let Some(prev_sibling) = node.prev_sibling() {
        let mut deepest = prev_sibling;
        while let Some(last_child) = deepest.children().last() {
            deepest = last_child;
        }
        return Some(deepest);
    }
    node.parent()
}

/// Forward walk; when `pred` matches, unlink the node and continue from
/// its skip-descendants cursor (computed before the removal).
pub fn remove_descendants_if<'a, F>(root: NodeRef<'a>, mut pred: F)
where
    F: FnMut(NodeRef<'a>) -> bool,
{
    let root_id = root.id;
    let mut cursor = following(root, root_id);
    while let Some(node) = cursor {
        if pred(node) {
            let next = skip_descendants(node, root_id);
            Selection::from(node).remove();
            cursor = next;
        } else {
            cursor = following(node, root_id);
        }
    }
}

/// Reverse walk, needed when pruning children must precede re-evaluating
/// parents (e.g. the conditional-cleaning passes).
pub fn bw_remove_descendants_if<'a, F, C>(root: NodeRef<'a>, mut pred: F, ctx: &mut C)
where
    F: FnMut(NodeRef<'a>, &mut C) -> bool,
{
    // Collect document-order first, since a backward walk needs the last
    // descendant as its starting cursor and removing a node invalidates
    // sibling pointers we would otherwise need to re-derive.
    let mut nodes = Vec::new();
    let mut cursor = following(root, root.id);
    while let Some(node) = cursor {
        nodes.push(node);
        cursor = following(node, root.id);
    }
    for node in nodes.into_iter().rev() {
        if pred(node, ctx) {
            Selection::from(node).remove();
        }
    }
}

/// Short-circuit walk; true as soon as any descendant matches `pred`.
#[must_use]
pub fn has_such_descendant<'a, F>(root: NodeRef<'a>, mut pred: F) -> bool
where
    F: FnMut(NodeRef<'a>) -> bool,
{
    let root_id = root.id;
    let mut cursor = following(root, root_id);
    while let Some(node) = cursor {
        if pred(node) {
            return true;
        }
        cursor = following(node, root_id);
    }
    false
}

/// Short-circuit walk; true only if every descendant matches `pred`.
#[must_use]
pub fn forall_descendants<'a, F>(root: NodeRef<'a>, mut pred: F) -> bool
where
    F: FnMut(NodeRef<'a>) -> bool,
{
    !has_such_descendant(root, |n| !pred(n))
}

/// Map returns the node to continue from, allowing in-place replacement;
/// `None` ends the walk early.
pub fn change_descendants<'a, F>(root: NodeRef<'a>, mut map: F)
where
    F: FnMut(NodeRef<'a>) -> Option<NodeRef<'a>>,
{
    let root_id = root.id;
    let mut cursor = following(root, root_id);
    while let Some(node) = cursor {
        cursor = map(node).or_else(|| following(node, root_id));
    }
}

/// Numeric sum over all descendants.
#[must_use]
pub fn total_for_descendants<'a, F>(root: NodeRef<'a>, mut f: F) -> f64
where
    F: FnMut(NodeRef<'a>) -> f64,
{
    let root_id = root.id;
    let mut total = 0.0;
    let mut cursor = following(root, root_id);
    while let Some(node) = cursor {
        total += f(node);
        cursor = following(node, root_id);
    }
    total
}

/// Count descendants matching `pred`.
#[must_use]
pub fn count_such_descs<'a, F, C>(root: NodeRef<'a>, mut pred: F, ctx: &mut C) -> usize
where
    F: FnMut(NodeRef<'a>, &mut C) -> bool,
{
    let root_id = root.id;
    let mut count = 0;
    let mut cursor = following(root, root_id);
    while let Some(node) = cursor {
        if pred(node, ctx) {
            count += 1;
        }
        cursor = following(node, root_id);
    }
    count
}

// === Shared predicates ===
//
// Small node-shape checks used by more than one pass (pre-scoring,
// conditional cleaning, the readerable quick check).

/// Whether a selection's class or id attribute matches `re`.
#[must_use]
pub fn class_or_id_matches(sel: &Selection, re: &regex::Regex) -> bool {
    let class = class_name(sel).unwrap_or_default();
    let id = id(sel).unwrap_or_default();
    re.is_match(&class) || re.is_match(&id)
}

/// Whether a selection is visible: no `display:none` in `style`, no
/// `hidden` attribute, and no `aria-hidden="true"` unless its class
/// contains `fallback-image`.
#[must_use]
pub fn is_visible(sel: &Selection) -> bool {
    if let Some(style) = get_attribute(sel, "style") {
        if style.to_ascii_lowercase().replace(' ', "").contains("display:none") {
            return false;
        }
    }
    if has_attribute(sel, "hidden") {
        return false;
    }
    if get_attribute(sel, "aria-hidden").as_deref() == Some("true") {
        let class = class_name(sel).unwrap_or_default();
        if !class.contains("fallback-image") {
            return false;
        }
    }
    true
}

/// Whether any ancestor of `node` (not including itself) has tag `tag`.
#[must_use]
pub fn has_ancestor_tag(node: NodeRef, tag: &str) -> bool {
    let mut cur = node.parent();
    while let Some(n) = cur {
        if n.is_element() && n.node_name().is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
            return true;
        }
        cur = n.parent();
    }
    false
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select() {
        let doc = parse(r#"<div id="main" class="container">content</div>"#);
        let div = doc.select("div");

        assert_eq!(id(&div), Some("main".to_string()));
        assert_eq!(class_name(&div), Some("container".to_string()));
    }

    #[test]
    fn test_remove_elements() {
        let doc = parse(r#"<div><span class="ad">ad</span><p>content</p></div>"#);

        // Remove ads
        doc.select(".ad").remove();

        // Verify removed
        assert!(doc.select(".ad").is_empty());
        assert!(!doc.select("p").is_empty());
    }

    #[test]
    fn test_iteration_and_removal() {
        let doc = parse(
            r#"
            <div>
                <p class="remove">1</p>
                <p class="keep">2</p>
                <p class="remove">3</p>
            </div>
        "#,
        );

        // Collect and remove
        doc.select("p.remove").remove();

        // Only "keep" remains
        assert_eq!(doc.select("p").length(), 1);
        assert!(doc.select("p.keep").exists());
    }

    #[test]
    fn test_attribute_modification() {
        let doc = parse(r#"<a href="/old" class="link">text</a>"#);
        let link = doc.select("a");

        set_attribute(&link, "href", "/new");
        remove_attribute(&link, "class");

        assert_eq!(get_attribute(&link, "href"), Some("/new".to_string()));
        assert!(!has_attribute(&link, "class"));
    }

    #[test]
    fn test_next_element_sibling() {
        let doc = parse(r#"<div><p id="first">First</p>  <span id="second">Second</span></div>"#);
        let p = doc.select("#first");

        let next = next_element_sibling(&p);
        assert!(next.is_some());
        assert_eq!(tag_name(&next.unwrap()), Some("span".to_string()));
    }

    #[test]
    fn test_next_element_sibling_none() {
        let doc = parse(r#"<div><p id="last">Last</p></div>"#);
        let p = doc.select("#last");

        let next = next_element_sibling(&p);
        assert!(next.is_none());
    }

    #[test]
    fn test_previous_element_sibling() {
        let doc = parse(r#"<div><span id="first">First</span>  <p id="second">Second</p></div>"#);
        let p = doc.select("#second");

        let prev = previous_element_sibling(&p);
        assert!(prev.is_some());
        assert_eq!(tag_name(&prev.unwrap()), Some("span".to_string()));
    }

    #[test]
    fn test_previous_element_sibling_none() {
        let doc = parse(r#"<div><p id="first">First</p></div>"#);
        let p = doc.select("#first");

        let prev = previous_element_sibling(&p);
        assert!(prev.is_none());
    }

    #[test]
    fn test_get_all_attributes() {
        let doc = parse(r##"<a href="http://example.com" class="link" title="Example">Link</a>"##);
        let a = doc.select("a");

        let attrs = get_all_attributes(&a);
        assert_eq!(attrs.len(), 3);

        // Check that all expected attributes are present
        assert!(attrs.iter().any(|(k, v)| k == "href" && v == "http://example.com"));
        assert!(attrs.iter().any(|(k, v)| k == "class" && v == "link"));
        assert!(attrs.iter().any(|(k, v)| k == "title" && v == "Example"));
    }

    #[test]
    fn test_get_all_attributes_empty() {
        let doc = parse("<div>No attributes</div>");
        let div = doc.select("div");

        let attrs = get_all_attributes(&div);
        assert_eq!(attrs.len(), 0);
    }

    #[test]
    fn test_missing_attributes_return_none() {
        let doc = parse(r#"<div>no attributes</div>"#);
        let div = doc.select("div");

        assert_eq!(id(&div), None);
        assert_eq!(class_name(&div), None);
        assert_eq!(get_attribute(&div, "data-test"), None);
    }

    #[test]
    fn test_operations_on_empty_selection() {
        let doc = parse(r#"<div>content</div>"#);
        let empty = doc.select("span"); // No span elements

        // Operations on empty selections should be no-ops
        remove(&empty);
        set_attribute(&empty, "class", "test");
        remove_attribute(&empty, "id");

        // Should not panic or cause errors
        assert!(inner_html(&empty).is_empty());
    }

    #[test]
    fn test_tag_name() {
        let doc = parse(r#"<article><section>content</section></article>"#);
        let article = doc.select("article");
        let section = doc.select("section");

        assert_eq!(tag_name(&article), Some("article".to_string()));
        assert_eq!(tag_name(&section), Some("section".to_string()));
    }

    #[test]
    fn test_text_and_html_content() {
        let doc = parse(r#"<div>text <span>nested</span> more</div>"#);
        let div = doc.select("div");

        assert!(inner_html(&div).contains("<span>"));
        assert!(outer_html(&div).contains("<div>"));
    }

    #[test]
    fn test_children_navigation() {
        let doc = parse(r#"<ul><li>1</li><li>2</li><li>3</li></ul>"#);
        let ul = doc.select("ul");

        let child_list = children(&ul);
        assert_eq!(child_list.length(), 3);
    }

    #[test]
    fn test_append_and_set_html() {
        let doc = parse(r#"<div>original</div>"#);
        let div = doc.select("div");

        // Append
        append_html(&div, "<span>appended</span>");
        assert!(inner_html(&div).contains("appended"));

        // Set (replace)
        set_inner_html(&div, "<p>replaced</p>");
        assert!(inner_html(&div).contains("replaced"));
        assert!(!inner_html(&div).contains("original"));
    }

    #[test]
    fn test_replace_with_html() {
        let doc = parse(r#"<div><span id="old">old</span></div>"#);
        let span = doc.select("#old");

        replace_with_html(&span, r#"<strong id="new">new</strong>"#);

        assert!(doc.select("#old").is_empty());
        assert!(doc.select("#new").exists());
    }

    #[test]
    fn test_rename_element() {
        let doc = parse(r#"<div id="test">content</div>"#);
        let div = doc.select("#test");

        rename(&div, "section");

        // Check that it's now a section
        let section = doc.select("section#test");
        assert!(section.exists());
        assert!(doc.select("div#test").is_empty());
    }

}
