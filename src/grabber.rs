//! The article grabber: pre-scoring, candidate scoring, top-candidate
//! promotion, sibling gathering, and the retry loop with flag-weakening.
//!
//! This is the heart of the engine. It operates on a working copy of the
//! document so a retry can restart from a clean tree.

use dom_query::{Document, NodeId, NodeRef, Selection};

use crate::annotation::{Annotations, Flags};
use crate::article_prep;
use crate::dom;
use crate::options::{Config, RetryStage};
use crate::patterns;
use crate::text;

const TOP_CANDIDATES: usize = 5;
const MAX_ATTEMPTS: usize = 4;
const MIN_ARTICLE_LENGTH: usize = 500;

/// One saved retry attempt: the serialized article HTML and its normalized
/// text length, used to pick the longest attempt if every retry comes up
/// short.
struct Attempt {
    html: String,
    normalized_len: usize,
}

/// Result of a single grab: the article's outer HTML, whether it came from
/// the fallback-top path (affects final shaping), and the recovered text
/// direction.
pub struct GrabResult {
    pub html: String,
    pub direction: Option<String>,
}

/// Run the grabber, retrying with progressively weaker flags until the
/// article clears [`MIN_ARTICLE_LENGTH`] or all retries are exhausted.
pub fn grab_article(
    source_html: &str,
    config: &Config,
    byline: &mut Option<String>,
    title: Option<&str>,
) -> Option<GrabResult> {
    let mut stage = RetryStage::Initial;
    let mut attempts: Vec<Attempt> = Vec::new();
    let mut best_direction: Option<String> = None;

    loop {
        let attempt_config = stage.weaken(config);
        let doc = Document::from(source_html);
        let mut found_byline: Option<String> = None;

        let result = grab_once(&doc, &attempt_config, &mut found_byline, title);

        if byline.is_none() {
            *byline = found_byline;
        }

        if let Some(grabbed) = result {
            let normalized_len = text::text_normalized_len_html(&grabbed.html);
            if normalized_len >= MIN_ARTICLE_LENGTH {
                return Some(grabbed);
            }
            if cfg!(debug_assertions) {
                eprintln!(
                    "rs-rdrview: attempt under {stage:?} scored {normalized_len} chars, retrying with weaker flags"
                );
            }
            best_direction = best_direction.or_else(|| grabbed.direction.clone());
            attempts.push(Attempt { html: grabbed.html, normalized_len });
            if attempts.len() > MAX_ATTEMPTS {
                attempts.remove(0);
            }
        }

        match stage.next() {
            Some(next_stage) => stage = next_stage,
            None => break,
        }
    }

    attempts
        .into_iter()
        .max_by_key(|a| a.normalized_len)
        .map(|a| GrabResult { html: a.html, direction: best_direction })
}

/// One pass of the grabber over a freshly parsed working document.
fn grab_once(
    doc: &Document,
    config: &Config,
    byline: &mut Option<String>,
    title: Option<&str>,
) -> Option<GrabResult> {
    let root = doc.select("html");
    let root_node = *root.nodes().first()?;
    let mut annotations = Annotations::new();
    let mut byline_found = false;

    pre_score(doc, root_node, config, byline, &mut byline_found, &mut annotations);
    score_nodes(doc, root_node, config, &mut annotations);

    let top_candidates = select_top_candidates(doc, root_node, &mut annotations);
    let (top, is_fallback) = match top_candidates.first().copied() {
        Some(top) if dom::tag_name(&Selection::from(top)).as_deref() != Some("body") => {
            (top, false)
        }
        _ => (create_fallback_top(doc, &mut annotations)?, true),
    };

    let direction = recover_direction(doc, top);
    let promoted = promote_top_candidate(top, &top_candidates, &annotations);
    let article_doc = gather_siblings(doc, promoted, &annotations);

    article_prep::prepare_article(&article_doc, config, title);

    let article_sel = article_doc.select("*").first();
    let shaped = shape_final(&article_doc, &article_sel, is_fallback);

    Some(GrabResult { html: shaped, direction })
}

// === Pre-scoring ===

fn pre_score(
    doc: &Document,
    root_node: NodeRef,
    config: &Config,
    byline: &mut Option<String>,
    byline_found: &mut bool,
    annotations: &mut Annotations,
) {
    let root_id = root_node.id;
    let mut cursor = dom::following(root_node, root_id);

    while let Some(node) = cursor {
        if !node.is_element() {
            cursor = dom::following(node, root_id);
            continue;
        }
        let sel = Selection::from(node);

        if !*byline_found {
            if is_byline_candidate(&sel) {
                let candidate_text = text::normalize_whitespace(sel.text().trim());
                let len = candidate_text.chars().count();
                if len > 0 && len < 100 {
                    *byline_found = true;
                    if byline.is_none() {
                        *byline = Some(candidate_text);
                    }
                    let next = dom::skip_descendants(node, root_id);
                    Selection::from(node).remove();
                    cursor = next;
                    continue;
                }
            }
        }

        if !dom::is_visible(&sel) {
            let next = dom::skip_descendants(node, root_id);
            Selection::from(node).remove();
            cursor = next;
            continue;
        }

        if config.strip_unlikely && is_unlikely(&sel) {
            let next = dom::skip_descendants(node, root_id);
            Selection::from(node).remove();
            cursor = next;
            continue;
        }

        if is_empty_container(node, &sel) {
            let next = dom::skip_descendants(node, root_id);
            Selection::from(node).remove();
            cursor = next;
            continue;
        }

        let tag = dom::tag_name(&sel).unwrap_or_default();
        if matches!(tag.as_str(), "section" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "td" | "pre") {
            annotations.set_flag(node.id, Flags::TO_SCORE);
        }

        if tag == "div" {
            wrap_phrasing_runs(&sel);
            if let Some(replaced) = collapse_single_paragraph_div(&sel, annotations) {
                cursor = dom::following(replaced, root_id);
                continue;
            }
            if !has_block_descendant(&sel) {
                dom::rename(&sel, "p");
                annotations.set_flag(node.id, Flags::TO_SCORE);
            }
        }

        cursor = dom::following(node, root_id);
    }
}

fn is_byline_candidate(sel: &Selection) -> bool {
    dom::get_attribute(sel, "rel").as_deref() == Some("author")
        || dom::get_attribute(sel, "itemprop").is_some_and(|v| v.to_ascii_lowercase().contains("author"))
        || dom::class_or_id_matches(sel, &patterns::BYLINE)
}

fn is_unlikely(sel: &Selection) -> bool {
    if dom::get_attribute(sel, "role").as_deref() == Some("complementary") {
        return true;
    }
    let tag = dom::tag_name(sel).unwrap_or_default();
    if tag == "body" || tag == "a" {
        return false;
    }
    if has_table_ancestor(sel) {
        return false;
    }
    dom::class_or_id_matches(sel, &patterns::UNLIKELY) && !dom::class_or_id_matches(sel, &patterns::CANDIDATE)
}

fn has_table_ancestor(sel: &Selection) -> bool {
    let Some(node) = sel.nodes().first().copied() else { return false };
    let mut cur = node.parent();
    while let Some(n) = cur {
        if n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("table")) {
            return true;
        }
        cur = n.parent();
    }
    false
}

const EMPTY_CONTAINER_TAGS: &[&str] = &["div", "section", "header", "h1", "h2", "h3", "h4", "h5", "h6"];

fn is_empty_container(node: NodeRef, sel: &Selection) -> bool {
    let tag = dom::tag_name(sel).unwrap_or_default();
    if !EMPTY_CONTAINER_TAGS.contains(&tag.as_str()) {
        return false;
    }
    if text::text_content_length(sel) != 0 {
        return false;
    }
    dom::forall_descendants(node, |n| {
        n.is_text() || n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("br"))
    })
}

const BLOCK_TAGS: &[&str] = &["a", "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "select"];

fn has_block_descendant(sel: &Selection) -> bool {
    let Some(node) = sel.nodes().first().copied() else { return false };
    dom::has_such_descendant(node, |n| {
        n.is_element() && n.node_name().is_some_and(|t| BLOCK_TAGS.contains(&t.to_ascii_lowercase().as_str()))
    })
}

/// Group runs of phrasing-content children of a `<div>` under new `<p>`
/// wrappers, never starting a wrapper for whitespace alone. One left-to-
/// right pass; each node is visited at most once.
fn wrap_phrasing_runs(div_sel: &Selection) {
    let Some(div_node) = div_sel.nodes().first().copied() else { return };
    let mut cursor = div_node.children().next();

    while let Some(start) = cursor {
        if !dom::is_phrasing_content(start) {
            cursor = start.next_sibling();
            continue;
        }

        let mut run: Vec<NodeRef> = Vec::new();
        let mut saw_non_whitespace = false;
        let mut n = Some(start);
        while let Some(node) = n {
            if !dom::is_phrasing_content(node) {
                break;
            }
            let is_ws_text = node.is_text() && Selection::from(node).text().trim().is_empty();
            if !is_ws_text {
                saw_non_whitespace = true;
            }
            run.push(node);
            n = node.next_sibling();
        }
        let after = n;

        if saw_non_whitespace {
            wrap_run_in_p(&run);
        }
        cursor = after;
    }
}

fn wrap_run_in_p(run: &[NodeRef]) {
    if run.is_empty() {
        return;
    }
    let mut html = String::new();
    for n in run {
        if n.is_text() {
            html.push_str(&crate::text::escape_entities(&Selection::from(*n).text()));
        } else {
            html.push_str(&dom::outer_html(&Selection::from(*n)));
        }
    }
    let trimmed = html.trim_end();
    let wrapper_html = format!("<p>{trimmed}</p>");

    let anchor_sel = Selection::from(run[0]);
    dom::replace_with_html(&anchor_sel, &wrapper_html);
    for n in &run[1..] {
        Selection::from(*n).remove();
    }
}

/// If `div_sel` now has a single element child `<p>` with link density
/// below 0.25, replace the div with that `<p>` and mark it TO_SCORE.
/// Returns the replacement node on success.
fn collapse_single_paragraph_div(div_sel: &Selection, annotations: &mut Annotations) -> Option<NodeRef> {
    let div_node = div_sel.nodes().first().copied()?;
    let element_children: Vec<NodeRef> = div_node.children().filter(NodeRef::is_element).collect();
    if element_children.len() != 1 {
        return None;
    }
    let only = element_children[0];
    if !only.node_name().is_some_and(|t| t.eq_ignore_ascii_case("p")) {
        return None;
    }
    let p_sel = Selection::from(only);
    if text::link_density(&p_sel) >= 0.25 {
        return None;
    }
    let p_html = dom::outer_html(&p_sel).to_string();
    dom::replace_with_html(div_sel, &p_html);
    let replacement = div_sel.nodes().first().copied();
    if let Some(r) = replacement {
        annotations.set_flag(r.id, Flags::TO_SCORE);
    }
    replacement
}

// === Scoring ===

fn score_nodes(doc: &Document, root_node: NodeRef, config: &Config, annotations: &mut Annotations) {
    let root_id = root_node.id;
    let mut cursor = dom::following(root_node, root_id);
    let mut to_score: Vec<NodeRef> = Vec::new();
    while let Some(node) = cursor {
        if node.is_element() && annotations.has_flag(node.id, Flags::TO_SCORE) {
            to_score.push(node);
        }
        cursor = dom::following(node, root_id);
    }
    let _ = doc;

    for node in to_score {
        let sel = Selection::from(node);
        let Some(parent) = node.parent() else { continue };
        if !parent.is_element() {
            continue;
        }
        let normalized_len = text::text_normalized_content_length(&sel);
        if normalized_len < 25 {
            continue;
        }
        let text_content = sel.text();
        let commas = text::char_count(&text_content, b',') as f64;
        let s = 1.0 + commas + (normalized_len as f64 / 100.0).min(3.0);

        let mut ancestor = Some(parent);
        let mut level = 0;
        let weights = [1.0, 0.5, 1.0 / 6.0];
        while let Some(anc) = ancestor {
            if level >= 3 || !anc.is_element() {
                break;
            }
            ensure_initialized(anc, config, annotations);
            if !annotations.has_flag(anc.id, Flags::CANDIDATE) {
                annotations.set_flag(anc.id, Flags::CANDIDATE);
            }
            annotations.add_score(anc.id, s * weights[level]);
            ancestor = anc.parent();
            level += 1;
        }
    }
}

fn ensure_initialized(node: NodeRef, config: &Config, annotations: &mut Annotations) {
    if annotations.is_initialized(node.id) {
        return;
    }
    let sel = Selection::from(node);
    let tag = dom::tag_name(&sel).unwrap_or_default();
    let mut score = match tag.as_str() {
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "form" => -3.0,
        "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    if config.weight_classes {
        let class = dom::class_name(&sel).unwrap_or_default();
        let id = dom::id(&sel).unwrap_or_default();
        if patterns::POSITIVE.is_match(&class) {
            score += 25.0;
        }
        if patterns::NEGATIVE.is_match(&class) {
            score -= 25.0;
        }
        if patterns::POSITIVE.is_match(&id) {
            score += 25.0;
        }
        if patterns::NEGATIVE.is_match(&id) {
            score -= 25.0;
        }
    }
    annotations.set_score(node.id, score);
    annotations.set_flag(node.id, Flags::INITIALIZED);
}

// === Top-candidate selection ===

fn select_top_candidates(doc: &Document, root_node: NodeRef, annotations: &mut Annotations) -> Vec<NodeRef> {
    let root_id = root_node.id;
    let mut top: Vec<(f64, NodeRef)> = Vec::new();
    let mut cursor = dom::following(root_node, root_id);
    while let Some(node) = cursor {
        if node.is_element() && annotations.has_flag(node.id, Flags::CANDIDATE) {
            let sel = Selection::from(node);
            let raw = annotations.score(node.id);
            let normalized = raw * (1.0 - text::link_density(&sel));
            annotations.set_score(node.id, normalized);
            insert_top(&mut top, normalized, node);
        }
        cursor = dom::following(node, root_id);
    }
    let _ = doc;
    for (_, node) in &top {
        annotations.set_flag(node.id, Flags::TOP_CANDIDATE);
    }
    top.into_iter().map(|(_, n)| n).collect()
}

fn insert_top(top: &mut Vec<(f64, NodeRef)>, score: f64, node: NodeRef) {
    let pos = top.iter().position(|(s, _)| score > *s).unwrap_or(top.len());
    top.insert(pos, (score, node));
    top.truncate(TOP_CANDIDATES);
}

fn create_fallback_top(doc: &Document, annotations: &mut Annotations) -> Option<NodeRef> {
    let body = doc.select("body");
    let body_node = *body.nodes().first()?;
    // A childless body has nothing to fall back to; the whole grab fails
    // rather than promoting an empty wrapper as "the article".
    body_node.children().next()?;
    if cfg!(debug_assertions) {
        eprintln!("rs-rdrview: no scored candidate found, falling back to body's children");
    }
    let wrapper_doc = Document::from("<div></div>");
    let wrapper_sel = wrapper_doc.select("div");

    let mut children_html = String::new();
    for child in body_node.children() {
        if child.is_text() {
            children_html.push_str(&crate::text::escape_entities(&Selection::from(child).text()));
        } else if child.is_element() {
            children_html.push_str(&dom::outer_html(&Selection::from(child)));
        }
    }
    dom::set_inner_html(&wrapper_sel, &children_html);
    dom::set_inner_html(&body, "");
    dom::append_html(&body, &dom::outer_html(&wrapper_sel));

    let new_div = dom::children(&body).nodes().first().copied()?;
    ensure_initialized(new_div, &Config::default(), annotations);
    annotations.set_flag(new_div.id, Flags::CANDIDATE);
    annotations.set_flag(new_div.id, Flags::TOP_CANDIDATE);
    Some(new_div)
}

/// Walk up from `top`/its parent to `<html>`, returning the first `dir`
/// attribute found.
fn recover_direction(doc: &Document, top: NodeRef) -> Option<String> {
    let mut cur = Some(top);
    while let Some(n) = cur {
        if n.is_element() {
            let sel = Selection::from(n);
            if let Some(dir) = dom::get_attribute(&sel, "dir") {
                return Some(dir);
            }
        }
        cur = n.parent();
    }
    let _ = doc;
    None
}

fn promote_top_candidate(top: NodeRef, top_candidates: &[NodeRef], annotations: &Annotations) -> NodeRef {
    let top_score = annotations.score(top.id);
    let threshold = 0.75 * top_score;
    let significant: Vec<NodeId> = top_candidates
        .iter()
        .filter(|n| annotations.score(n.id) >= threshold)
        .map(|n| n.id)
        .collect();

    let mut promoted = top;
    let mut ancestor = top.parent();
    while let Some(anc) = ancestor {
        if !anc.is_element() || anc.node_name().is_some_and(|t| t.eq_ignore_ascii_case("body")) {
            break;
        }
        let count = significant
            .iter()
            .filter(|id| is_ancestor_of(anc, **id))
            .count();
        if count >= 3 {
            promoted = anc;
        }
        ancestor = anc.parent();
    }

    // "more content" step: keep walking up while each ancestor scores
    // higher than the previous and at least top_score / 3.
    let mut current = promoted;
    let mut current_score = annotations.score(current.id);
    while let Some(anc) = current.parent() {
        if !anc.is_element() || !annotations.is_initialized(anc.id) {
            break;
        }
        let anc_score = annotations.score(anc.id);
        if anc_score > current_score && anc_score >= top_score / 3.0 {
            current = anc;
            current_score = anc_score;
        } else {
            break;
        }
    }
    promoted = current;

    // Adopt single-element-child parents.
    loop {
        let Some(parent) = promoted.parent() else { break };
        if !parent.is_element() || parent.node_name().is_some_and(|t| t.eq_ignore_ascii_case("body")) {
            break;
        }
        let element_children: Vec<NodeRef> = parent.children().filter(NodeRef::is_element).collect();
        if element_children.len() == 1 {
            promoted = parent;
        } else {
            break;
        }
    }

    promoted
}

fn is_ancestor_of(candidate: NodeRef, descendant_id: NodeId) -> bool {
    dom::has_such_descendant(candidate, |n| n.id == descendant_id)
}

// === Sibling gathering ===

fn gather_siblings(doc: &Document, top: NodeRef, annotations: &Annotations) -> Document {
    let top_score = annotations.score(top.id);
    let threshold = (0.2 * top_score).max(10.0);
    let top_class = dom::class_name(&Selection::from(top)).unwrap_or_default();

    let wrapper_doc = Document::from("<div></div>");
    let wrapper_sel = wrapper_doc.select("div");
    let mut included_html = String::new();

    let Some(parent) = top.parent() else {
        included_html.push_str(&dom::outer_html(&Selection::from(top)));
        dom::set_inner_html(&wrapper_sel, &included_html);
        let _ = doc;
        return wrapper_doc;
    };

    for sibling in parent.children() {
        if !sibling.is_element() {
            continue;
        }
        let included = if sibling.id == top.id {
            true
        } else {
            should_include_sibling(sibling, top_score, threshold, &top_class, annotations)
        };
        if !included {
            continue;
        }
        let sel = Selection::from(sibling);
        let tag = dom::tag_name(&sel).unwrap_or_default();
        if !matches!(tag.as_str(), "div" | "article" | "section" | "p") {
            dom::rename(&sel, "div");
        }
        included_html.push_str(&dom::outer_html(&sel));
    }

    dom::set_inner_html(&wrapper_sel, &included_html);
    let _ = doc;
    wrapper_doc
}

fn should_include_sibling(
    sibling: NodeRef,
    top_score: f64,
    threshold: f64,
    top_class: &str,
    annotations: &Annotations,
) -> bool {
    let sel = Selection::from(sibling);
    let class = dom::class_name(&sel).unwrap_or_default();
    let bonus = if !class.is_empty() && class.eq_ignore_ascii_case(top_class) {
        0.2 * top_score
    } else {
        0.0
    };

    if annotations.is_initialized(sibling.id) {
        let score = annotations.score(sibling.id);
        if score + bonus >= threshold {
            return true;
        }
    }

    is_paragraph_with_content(&sel)
}

fn is_paragraph_with_content(sel: &Selection) -> bool {
    if dom::tag_name(sel).as_deref() != Some("p") {
        return false;
    }
    let len = text::text_normalized_content_length(sel);
    let density = text::link_density(sel);
    if len > 80 && density < 0.25 {
        return true;
    }
    density == 0.0 && text::ends_like_a_sentence(sel.text().trim())
}

// === Final shaping ===

fn shape_final(article_doc: &Document, article_sel: &Selection, is_fallback: bool) -> String {
    if is_fallback {
        dom::set_attribute(article_sel, "id", "readability-page-1");
        dom::set_attribute(article_sel, "class", "page");
        dom::outer_html(article_sel).to_string()
    } else {
        let inner = dom::inner_html(article_sel).to_string();
        format!(r#"<div id="readability-page-1" class="page">{inner}</div>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_visible_rejects_display_none_and_hidden() {
        let doc = Document::from(r#"<div style="display:none">x</div>"#);
        let sel = doc.select("div");
        assert!(!dom::is_visible(&sel));

        let doc2 = Document::from("<div hidden>x</div>");
        let sel2 = doc2.select("div");
        assert!(!dom::is_visible(&sel2));
    }

    #[test]
    fn is_visible_allows_aria_hidden_fallback_image() {
        let doc = Document::from(r#"<div aria-hidden="true" class="fallback-image">x</div>"#);
        let sel = doc.select("div");
        assert!(dom::is_visible(&sel));
    }

    #[test]
    fn is_unlikely_respects_candidate_rescue() {
        let doc = Document::from(r#"<div class="sidebar article-body">x</div>"#);
        let sel = doc.select("div");
        assert!(!is_unlikely(&sel));

        let doc2 = Document::from(r#"<div class="sidebar-widget">x</div>"#);
        let sel2 = doc2.select("div");
        assert!(is_unlikely(&sel2));
    }

    #[test]
    fn minimal_paragraph_is_extracted() {
        let html = "<html><body><article><p>This is a reasonably long paragraph of article text that should score well above the minimum threshold used for scoring nodes in this engine, comma, comma, comma.</p></article></body></html>";
        let config = Config::default();
        let mut byline = None;
        let result = grab_article(html, &config, &mut byline, None);
        assert!(result.is_some());
        let html_out = result.expect("article").html;
        assert!(html_out.contains("reasonably long paragraph"));
    }
}
