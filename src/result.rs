//! Result types for extraction output.
//!
//! This module defines the structured output from content extraction: the
//! article subtree plus the harvested metadata record.

/// Metadata harvested from an HTML document.
///
/// All fields are optional as metadata may not be present in all documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Page title, after the separator/colon fallback heuristics.
    pub title: Option<String>,

    /// Author byline.
    pub byline: Option<String>,

    /// Short excerpt/description, falling back to the article's first
    /// paragraph when no meta description was harvested.
    pub excerpt: Option<String>,

    /// Site name (`og:site_name`).
    pub site_name: Option<String>,

    /// Text direction (`dir` attribute) recovered from the original top
    /// candidate's ancestry.
    pub direction: Option<String>,
}

/// Result of extracting the main article from an HTML document.
#[derive(Debug, Clone)]
pub struct ExtractResult {
    /// Serialized HTML of the extracted article subtree.
    pub content: String,

    /// Harvested metadata.
    pub metadata: Metadata,
}
