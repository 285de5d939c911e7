//! # rs-rdrview
//!
//! Mozilla-Readability-style article extraction: given a raw HTML
//! document, identify and return the main article content plus the
//! metadata (title, byline, excerpt, site name, text direction) that
//! goes with it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_rdrview::{extract_default};
//!
//! let html = r#"<html><head><title>My Article</title></head>
//! <body><article><p>Main content here, long enough to clear the
//! minimum article length the grabber requires before it accepts a
//! candidate as the real article body instead of retrying.</p></article>
//! </body></html>"#;
//!
//! match extract_default(html) {
//!     Ok(result) => println!("Title: {:?}", result.metadata.title),
//!     Err(err) => println!("no article found: {err}"),
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. Strip comments and parse the document.
//! 2. Harvest metadata from `<title>` and `<meta>` tags ([`harvest_metadata`]).
//! 3. Prepare the document: drop scripts/styles, unwrap `<noscript>` image
//!    fallbacks, coalesce `<br><br>` runs into paragraph breaks.
//! 4. Grab the article: score every node, promote the top candidate,
//!    gather its qualifying siblings, retrying with progressively weaker
//!    flags if the result comes up short.
//! 5. Post-process: rewrite relative URLs to absolute, strip leftover
//!    classes, normalize whitespace, and fill in a missing excerpt.
//!
//! [`readerable`] runs a cheap, independent quick check without any of
//! the above, for callers who just need a yes/no before doing real work.

mod annotation;
mod article_prep;
mod error;
mod extract;
mod grabber;
mod options;
mod patterns;
mod postprocess;
mod prepare;
mod readerable;
mod result;
mod url_utils;

/// DOM traversal and mutation primitives built on top of `dom_query`.
pub mod dom;

/// Text normalization, entity handling, and link-density helpers.
pub mod text;

/// Metadata harvesting (`<title>`, `<meta>` priority tables).
pub mod metadata;

pub use error::{Error, Result};
pub use grabber::GrabResult;
pub use options::Config;
pub use result::{ExtractResult, Metadata};

/// Extract the main article and its metadata using `config`.
///
/// # Errors
///
/// Returns [`Error::Empty`] if the document has no root element,
/// [`Error::Malformed`] if it has no `<body>`, and [`Error::NoContent`]
/// if the grabber finds nothing worth returning after exhausting every
/// retry.
pub fn extract(html: &str, config: &Config) -> Result<ExtractResult> {
    extract::extract(html, config)
}

/// [`extract`] with [`Config::default`].
///
/// # Errors
///
/// See [`extract`].
pub fn extract_default(html: &str) -> Result<ExtractResult> {
    extract::extract(html, &Config::default())
}

/// The readerable quick check: true if the document looks like it has
/// enough substantial prose to be worth extracting, without running the
/// full grabber.
#[must_use]
pub fn readerable(html: &str) -> bool {
    let doc = dom_query::Document::from(html);
    readerable::is_readerable(&doc)
}

/// Harvest title/byline/excerpt/site-name/direction metadata without
/// running extraction. Never mutates the input.
#[must_use]
pub fn harvest_metadata(html: &str) -> Metadata {
    let doc = dom_query::Document::from(html);
    metadata::harvest_metadata(&doc)
}

/// Lower-level entry point for callers who already hold a parsed
/// [`dom_query::Document`] and want to skip the second parse `extract`
/// would otherwise do.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_document(doc: &dom_query::Document, config: &Config) -> Result<ExtractResult> {
    extract::extract_document(doc, config)
}

/// Run just the grabber against an already-parsed document, skipping
/// metadata harvesting and post-processing.
pub fn grab_article_from(doc: &dom_query::Document, config: &Config) -> Option<GrabResult> {
    extract::grab_article_from(doc, config)
}
