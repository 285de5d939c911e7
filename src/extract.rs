//! Top-level orchestration: harvest metadata, prepare the document, grab
//! the article (retrying with progressively weaker flags), post-process
//! the result, and assemble the final [`ExtractResult`].
//!
//! Split from [`crate::lib`] so callers who already hold a parsed
//! [`Document`] can drive the pipeline without paying for a second parse.

use dom_query::Document;

use crate::error::{Error, Result};
use crate::grabber::{self, GrabResult};
use crate::metadata;
use crate::options::Config;
use crate::postprocess;
use crate::prepare;
use crate::result::ExtractResult;

/// Run the full pipeline over an already-parsed document.
pub fn extract_document(doc: &Document, config: &Config) -> Result<ExtractResult> {
    if !doc.select("html").exists() {
        return Err(Error::Empty);
    }
    if !doc.select("body").exists() {
        return Err(Error::Malformed("document has no <body> element".to_string()));
    }

    let mut metadata = metadata::harvest_metadata(doc);

    prepare::prepare_document(doc);
    let prepared_html = doc.html().to_string();

    let mut byline = metadata.byline.take();
    let grabbed = grabber::grab_article(&prepared_html, config, &mut byline, metadata.title.as_deref());
    metadata.byline = byline;

    let Some(GrabResult { html, direction }) = grabbed else {
        if cfg!(debug_assertions) {
            eprintln!("rs-rdrview: grabber produced no candidate, returning ErrNoContent");
        }
        return Err(Error::NoContent);
    };

    if metadata.direction.is_none() {
        metadata.direction = direction;
    }

    let article_doc = Document::from(html);
    postprocess::postprocess(&article_doc, config, &mut metadata);

    Ok(ExtractResult { content: article_doc.select("body").inner_html().to_string(), metadata })
}

/// Parse raw HTML and run the full pipeline, stripping comments first
/// since [`dom_query`] never exposes comment nodes to remove afterward.
pub fn extract(html: &str, config: &Config) -> Result<ExtractResult> {
    let without_comments = prepare::strip_html_comments(html);
    let doc = Document::from(without_comments);
    extract_document(&doc, config)
}

/// Run the grabber alone against an already-parsed document, for callers
/// who only want the article subtree without metadata or post-processing.
pub fn grab_article_from(doc: &Document, config: &Config) -> Option<GrabResult> {
    let source_html = doc.html().to_string();
    let mut byline = None;
    grabber::grab_article(&source_html, config, &mut byline, None)
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
    fn childless_root_yields_no_content() {
        let doc = Document::from("<html></html>");
        let err = extract_document(&doc, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::NoContent));
    }

    #[test]
    fn minimal_paragraph_extracts_successfully() {
        let html = format!("<html><head><title>T</title></head><body><p>{}</p></body></html>", lorem(600));
        let result = extract(&html, &Config::default()).expect("extraction");
        assert!(result.content.contains("Lorem"));
        assert_eq!(result.metadata.title.as_deref(), Some("T"));
    }

    #[test]
    fn double_br_run_becomes_three_paragraphs() {
        let p = lorem(200);
        let html = format!("<html><body><div>{p}<br><br>{p}<br><br>{p}</div></body></html>");
        let result = extract(&html, &Config::default()).expect("extraction");
        assert_eq!(result.content.matches("<p").count(), 3);
    }

    #[test]
    fn title_separator_prefers_longer_segment() {
        let html = format!(
            "<html><head><title>Example Site - A Much Longer Article Headline Here</title></head><body><p>{}</p></body></html>",
            lorem(600)
        );
        let result = extract(&html, &Config::default()).expect("extraction");
        assert_eq!(result.metadata.title.as_deref(), Some("A Much Longer Article Headline Here"));
    }

    #[test]
    fn og_title_overrides_title_tag() {
        let html = format!(
            r#"<html><head><title>Fallback</title><meta property="og:title" content="Canonical Title"></head><body><p>{}</p></body></html>"#,
            lorem(600)
        );
        let result = extract(&html, &Config::default()).expect("extraction");
        assert_eq!(result.metadata.title.as_deref(), Some("Canonical Title"));
    }

    #[test]
    fn javascript_link_is_rewritten_in_final_content() {
        let html = format!(
            r#"<html><body><p>{}<a href="javascript:void(0)">click</a></p></body></html>"#,
            lorem(600)
        );
        let result = extract(&html, &Config::default()).expect("extraction");
        assert!(!result.content.contains("javascript:"));
    }

    #[test]
    fn document_with_no_html_element_is_empty() {
        let doc = Document::from("");
        doc.select("html").remove();
        let err = extract_document(&doc, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Empty));
    }

    #[test]
    fn document_with_html_but_no_body_is_malformed() {
        let doc = Document::from("<html><body></body></html>");
        doc.select("body").remove();
        let err = extract_document(&doc, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }
}
