//! Article cleanup passes: run once the grabber has promoted a top
//! candidate and gathered its siblings into a standalone working document.
//!
//! Order matters. Style cleanup and data-table marking run first so later
//! passes can tell a layout table from a real one; the two conditional
//! cleaning passes bracket the unconditional removals so a fishy sibling
//! exposed by an earlier removal still gets a chance to be caught.

use dom_query::{Document, NodeRef, Selection};

use crate::annotation::{Annotations, Flags};
use crate::dom;
use crate::options::Config;
use crate::patterns;
use crate::text;

/// Attributes stripped from every element outside `<svg>` subtrees.
const PRESENTATIONAL_ATTRS: &[&str] = &[
    "align", "background", "bgcolor", "border", "cellpadding", "cellspacing", "frame",
    "hspace", "rules", "style", "valign", "vspace",
];

/// Tags that additionally lose `width`/`height`.
const SIZE_ATTR_TAGS: &[&str] = &["table", "th", "td", "hr", "pre"];

/// Tags removed outright, regardless of content (video embeds excepted for
/// `object`/`embed`/`iframe`, handled separately).
const UNCONDITIONAL_TAGS: &[&str] = &["h1", "footer", "link", "aside", "input", "textarea", "select", "button"];

const EMBED_TAGS: &[&str] = &["object", "embed", "iframe"];

/// A base64 data-URL placeholder this short is assumed to be a tracking
/// pixel or spinner rather than real image data (mirrors the 133-character
/// threshold the source heuristic uses).
const TINY_PLACEHOLDER_MAX_LEN: usize = 133;

/// Run the full cleanup sequence over a gathered article document.
///
/// `title`, when known, feeds the duplicate-title-removal step; pass `None`
/// to skip it (the step is a no-op without a title to compare against).
pub fn prepare_article(doc: &Document, config: &Config, title: Option<&str>) {
    clean_styles(doc);

    let mut tables = Annotations::new();
    mark_data_tables(doc, &mut tables);

    fix_lazy_images(doc);

    if config.clean_conditionally {
        clean_conditionally_tags(doc, &["form", "fieldset"], &tables);
        clean_conditionally_tags(doc, &["table", "ul", "div"], &tables);
    }

    remove_unconditional(doc);
    remove_share_widgets(doc);
    remove_duplicate_title(doc, title);
    remove_spurious_headers(doc);

    if config.clean_conditionally {
        clean_conditionally_tags(doc, &["table", "ul", "div"], &tables);
    }

    remove_empty_paragraphs(doc);
    remove_br_before_paragraph(doc);
    unwrap_single_cell_tables(doc);
}

// === Style cleanup ===

fn is_within_svg(node: NodeRef) -> bool {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if n.is_element() && n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("svg")) {
            return true;
        }
        cur = n.parent();
    }
    false
}

fn clean_styles(doc: &Document) {
    for node in doc.select("*").nodes().to_vec() {
        if is_within_svg(node) {
            continue;
        }
        let sel = Selection::from(node);
        for attr in PRESENTATIONAL_ATTRS {
            dom::remove_attribute(&sel, attr);
        }
        let tag = dom::tag_name(&sel).unwrap_or_default();
        if SIZE_ATTR_TAGS.contains(&tag.as_str()) {
            dom::remove_attribute(&sel, "width");
            dom::remove_attribute(&sel, "height");
        }
    }
}

// === Data-table marking ===

fn has_nested_table(table_node: NodeRef) -> bool {
    dom::has_such_descendant(table_node, |n| {
        n.is_element() && n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("table"))
    })
}

fn parse_usize_attr(value: Option<&str>, default: usize) -> usize {
    value.and_then(|v| v.trim().parse::<usize>().ok()).unwrap_or(default)
}

/// Row and column counts for a table, preserving the source's bug of
/// reading `colspan` off the row element instead of the cell: the row's
/// own `colspan` attribute (if any) is added once per cell in that row,
/// rather than each cell's own `colspan`.
fn count_rows_cols(table_sel: &Selection) -> (usize, usize) {
    let mut rows = 0usize;
    let mut cols = 0usize;
    for tr in table_sel.select("tr").nodes() {
        let tr_sel = Selection::from(*tr);
        rows += parse_usize_attr(dom::get_attribute(&tr_sel, "rowspan").as_deref(), 1);
        let row_colspan = parse_usize_attr(dom::get_attribute(&tr_sel, "colspan").as_deref(), 1);
        let cell_count = tr_sel.select("td, th").length();
        cols = cols.max(cell_count * row_colspan);
    }
    (rows, cols)
}

fn is_data_table(table_sel: &Selection, table_node: NodeRef) -> bool {
    if has_nested_table(table_node) {
        return false;
    }
    if dom::get_attribute(table_sel, "role").as_deref() == Some("presentation") {
        return false;
    }
    if dom::get_attribute(table_sel, "datatable").as_deref() == Some("0") {
        return false;
    }
    if dom::has_attribute(table_sel, "summary") {
        return true;
    }
    let caption = table_sel.select("caption");
    if caption.exists() && !dom::children(&caption).nodes().is_empty() {
        return true;
    }
    if table_sel.select("col, colgroup, tfoot, thead, th").length() > 0 {
        return true;
    }
    let (rows, cols) = count_rows_cols(table_sel);
    rows >= 10 || cols > 4 || rows * cols > 10
}

fn mark_data_tables(doc: &Document, tables: &mut Annotations) {
    for node in doc.select("table").nodes().to_vec() {
        let sel = Selection::from(node);
        if is_data_table(&sel, node) {
            tables.set_flag(node.id, Flags::DATA_TABLE);
        }
    }
}

fn has_data_table_ancestor(node: NodeRef, tables: &Annotations) -> bool {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if n.is_element()
            && n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("table"))
            && tables.has_flag(n.id, Flags::DATA_TABLE)
        {
            return true;
        }
        cur = n.parent();
    }
    false
}

// === Lazy-image fixing ===

fn is_tiny_placeholder(sel: &Selection, src: &str) -> bool {
    if !patterns::B64_DATAURL.is_match(src) {
        return false;
    }
    if src.to_ascii_lowercase().contains("image/svg") {
        return false;
    }
    if src.len() >= TINY_PLACEHOLDER_MAX_LEN {
        return false;
    }
    dom::get_all_attributes(sel)
        .iter()
        .any(|(name, value)| name != "src" && (patterns::SRCSET.is_match(value) || patterns::SRC.is_match(value)))
}

fn has_img_descendant(node: NodeRef) -> bool {
    dom::has_such_descendant(node, |n| n.is_element() && n.node_name().is_some_and(|t| t.eq_ignore_ascii_case("img")))
}

fn fix_lazy_images(doc: &Document) {
    for node in doc.select("img, picture, figure").nodes().to_vec() {
        let sel = Selection::from(node);
        let tag = dom::tag_name(&sel).unwrap_or_default();

        if tag == "img" {
            if let Some(src) = dom::get_attribute(&sel, "src") {
                if is_tiny_placeholder(&sel, &src) {
                    dom::remove_attribute(&sel, "src");
                }
            }
        }

        let has_src_or_srcset = dom::has_attribute(&sel, "src") || dom::has_attribute(&sel, "srcset");
        let class = dom::class_name(&sel).unwrap_or_default();
        let is_lazy_class = class.to_ascii_lowercase().contains("lazy");
        if has_src_or_srcset && !is_lazy_class {
            continue;
        }

        let attrs = dom::get_all_attributes(&sel);
        let mut new_srcset = None;
        let mut new_src = None;
        for (name, value) in &attrs {
            if name == "src" || name == "srcset" {
                continue;
            }
            if new_srcset.is_none() && patterns::SRCSET.is_match(value) {
                new_srcset = Some(value.clone());
            } else if new_src.is_none() && patterns::SRC.is_match(value) {
                new_src = Some(value.clone());
            }
        }

        match tag.as_str() {
            "img" | "picture" => {
                if let Some(s) = &new_srcset {
                    dom::set_attribute(&sel, "srcset", s);
                }
                if let Some(s) = &new_src {
                    dom::set_attribute(&sel, "src", s);
                }
            }
            "figure" => {
                if !has_img_descendant(node) && (new_srcset.is_some() || new_src.is_some()) {
                    let mut img_html = String::from("<img");
                    if let Some(s) = &new_srcset {
                        img_html.push_str(&format!(" srcset=\"{}\"", text::escape_entities(s)));
                    }
                    if let Some(s) = &new_src {
                        img_html.push_str(&format!(" src=\"{}\"", text::escape_entities(s)));
                    }
                    img_html.push('>');
                    dom::append_html(&sel, &img_html);
                }
            }
            _ => {}
        }
    }
}

// === Conditional cleaning ===

fn class_weight(sel: &Selection) -> f64 {
    let mut w = 0.0;
    let class = dom::class_name(sel).unwrap_or_default();
    let id = dom::id(sel).unwrap_or_default();
    if patterns::POSITIVE.is_match(&class) {
        w += 25.0;
    }
    if patterns::NEGATIVE.is_match(&class) {
        w -= 25.0;
    }
    if patterns::POSITIVE.is_match(&id) {
        w += 25.0;
    }
    if patterns::NEGATIVE.is_match(&id) {
        w -= 25.0;
    }
    w
}

struct EmbedInfo {
    count: usize,
    has_video: bool,
}

fn count_embeds(sel: &Selection) -> EmbedInfo {
    let embeds = sel.select("object, embed, iframe");
    let count = embeds.length();
    let mut has_video = false;
    for e in embeds.nodes() {
        let esel = Selection::from(*e);
        if is_video_embed(&esel) {
            has_video = true;
        }
    }
    EmbedInfo { count, has_video }
}

fn is_video_embed(sel: &Selection) -> bool {
    let attrs_text: String = dom::get_all_attributes(sel)
        .into_iter()
        .map(|(_, v)| v)
        .collect::<Vec<_>>()
        .join(" ");
    if patterns::VIDEOS.is_match(&attrs_text) {
        return true;
    }
    dom::tag_name(sel).as_deref() == Some("object") && patterns::VIDEOS.is_match(&dom::inner_html(sel))
}

fn is_fishy(node: NodeRef, sel: &Selection, tables: &Annotations) -> bool {
    let weight = class_weight(sel);
    if !has_data_table_ancestor(node, tables) && weight < 0.0 {
        return true;
    }

    let text_content = sel.text();
    let commas = text::char_count(&text_content, b',');
    if commas > 9 {
        return false;
    }

    let img_count = sel.select("img").length();
    let p_count = sel.select("p").length();
    let li_count = sel.select("li").length();
    let input_count = sel.select("input").length();
    let content_len = text::text_normalized_content_length(sel);
    let link_density = text::link_density(sel);
    let tag = dom::tag_name(sel).unwrap_or_default();
    let is_list = tag == "ul" || tag == "ol";

    if !dom::has_ancestor_tag(node, "figure") && img_count > 1 && (p_count as f64) < (img_count as f64) / 2.0 {
        return true;
    }
    if content_len < 25 && !(img_count == 1 || img_count == 2) {
        return true;
    }
    // Preserve literally: this compares `li_count - 100` against `p_count`,
    // which only fires for implausibly list-heavy nodes, not genuinely
    // `li_count > p_count`.
    if !is_list && (li_count as i64) - 100 > p_count as i64 {
        return true;
    }
    if (input_count as f64) > (p_count as f64) / 3.0 {
        return true;
    }
    if !is_list && weight < 25.0 && link_density > 0.2 {
        return true;
    }
    if weight >= 25.0 && link_density > 0.5 {
        return true;
    }

    let embeds = count_embeds(sel);
    let embed_trips = (embeds.count == 1 && content_len < 75) || embeds.count > 1;
    if embed_trips && !embeds.has_video {
        return true;
    }

    false
}

fn clean_conditionally_tags(doc: &Document, tags: &[&str], tables: &Annotations) {
    for tag in tags {
        let nodes: Vec<NodeRef> = doc.select(tag).nodes().to_vec();
        for node in nodes.into_iter().rev() {
            if node.parent().is_none() {
                continue; // already removed by an earlier iteration
            }
            let sel = Selection::from(node);
            if is_fishy(node, &sel, tables) {
                dom::remove(&sel);
            }
        }
    }
}

// === Unconditional cleaning ===

fn remove_unconditional(doc: &Document) {
    for tag in UNCONDITIONAL_TAGS {
        dom::remove(&doc.select(tag));
    }
    for tag in EMBED_TAGS {
        for node in doc.select(tag).nodes().to_vec() {
            let sel = Selection::from(node);
            if is_video_embed(&sel) {
                continue;
            }
            dom::remove(&sel);
        }
    }
}

// === Share widgets ===

fn remove_share_widgets(doc: &Document) {
    for node in doc.select("*").nodes().to_vec() {
        if node.parent().is_none() {
            continue;
        }
        let sel = Selection::from(node);
        if dom::class_or_id_matches(&sel, &patterns::SHARE) && text::text_content_length(&sel) < 500 {
            dom::remove(&sel);
        }
    }
}

// === Duplicate title ===

fn remove_duplicate_title(doc: &Document, title: Option<&str>) {
    let Some(title) = title else { return };
    let h2s = doc.select("h2");
    if h2s.length() != 1 {
        return;
    }
    let title_norm = text::normalize_whitespace(title.trim());
    if title_norm.is_empty() {
        return;
    }
    let h2_text = text::normalize_whitespace(h2s.text().trim());

    let len_diff = (h2_text.chars().count() as i64 - title_norm.chars().count() as i64).unsigned_abs() as f64;
    let ratio = len_diff / title_norm.chars().count() as f64;

    let (shorter, longer) = if h2_text.chars().count() <= title_norm.chars().count() {
        (&h2_text, &title_norm)
    } else {
        (&title_norm, &h2_text)
    };

    if ratio < 0.5 && longer.contains(shorter.as_str()) {
        dom::remove(&h2s);
    }
}

// === Spurious headers ===

fn remove_spurious_headers(doc: &Document) {
    for node in doc.select("h1, h2").nodes().to_vec() {
        let sel = Selection::from(node);
        if class_weight(&sel) < 0.0 {
            dom::remove(&sel);
        }
    }
}

// === Empty paragraphs ===

fn remove_empty_paragraphs(doc: &Document) {
    for node in doc.select("p").nodes().to_vec() {
        let sel = Selection::from(node);
        let has_media = sel.select("img, embed, object, iframe").length() > 0;
        if !has_media && text::text_content_length(&sel) == 0 {
            dom::remove(&sel);
        }
    }
}

// === Break-before-paragraph ===

fn remove_br_before_paragraph(doc: &Document) {
    for node in doc.select("br").nodes().to_vec() {
        let sel = Selection::from(node);
        if let Some(next) = dom::next_element_sibling(&sel) {
            if dom::tag_name(&next).as_deref() == Some("p") {
                dom::remove(&sel);
            }
        }
    }
}

// === Single-cell tables ===

fn element_children(node: NodeRef) -> Vec<NodeRef> {
    node.children().filter(NodeRef::is_element).collect()
}

fn find_single_row(table_node: NodeRef) -> Option<NodeRef> {
    let kids = element_children(table_node);
    let row_candidates = if kids.len() == 1 && kids[0].node_name().is_some_and(|t| t.eq_ignore_ascii_case("tbody")) {
        element_children(kids[0])
    } else {
        kids
    };
    if row_candidates.len() == 1 && row_candidates[0].node_name().is_some_and(|t| t.eq_ignore_ascii_case("tr")) {
        Some(row_candidates[0])
    } else {
        None
    }
}

fn find_single_cell(table_node: NodeRef) -> Option<NodeRef> {
    let row = find_single_row(table_node)?;
    let cells = element_children(row);
    if cells.len() == 1 && cells[0].node_name().is_some_and(|t| t.eq_ignore_ascii_case("td")) {
        Some(cells[0])
    } else {
        None
    }
}

fn unwrap_single_cell_tables(doc: &Document) {
    loop {
        let tables: Vec<NodeRef> = doc.select("table").nodes().to_vec();
        let mut mutated = false;
        for table in tables {
            let table_sel = Selection::from(table);
            if dom::tag_name(&table_sel).as_deref() != Some("table") {
                continue;
            }
            let Some(cell) = find_single_cell(table) else { continue };
            let all_phrasing = cell.children().all(dom::is_phrasing_content);
            let new_tag = if all_phrasing { "p" } else { "div" };
            let cell_sel = Selection::from(cell);
            dom::rename(&cell_sel, new_tag);
            let replacement_html = dom::outer_html(&cell_sel).to_string();
            dom::replace_with_html(&table_sel, &replacement_html);
            mutated = true;
        }
        if !mutated {
            break;
        }
    }
}
