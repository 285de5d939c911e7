//! Configuration for article extraction.
//!
//! The `Config` struct controls the retry-weakenable feature flags, the
//! base URL used to resolve relative links, and the metadata template. All
//! fields are public; use `Default::default()` for standard settings.

/// Configuration for one `extract` call.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_rdrview::Config;
///
/// // Use defaults
/// let config = Config::default();
///
/// // Customize specific fields
/// let config = Config {
///     base_url: Some("https://example.com/article".to_string()),
///     ..Config::default()
/// };
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Strip elements whose class/id matches the "unlikely" pattern during
    /// pre-scoring, unless they also match the "candidate" pattern.
    ///
    /// Cleared by the retry loop on the first restart if the article is too
    /// short.
    ///
    /// Default: `true`
    pub strip_unlikely: bool,

    /// Apply the ±25 class/id weight bonus during node initialization.
    ///
    /// Cleared by the retry loop on the second restart if the article is
    /// still too short.
    ///
    /// Default: `true`
    pub weight_classes: bool,

    /// Run the conditional-cleaning passes (fishy-element removal) during
    /// article preparation.
    ///
    /// Cleared by the retry loop on the third restart if the article is
    /// still too short.
    ///
    /// Default: `true`
    pub clean_conditionally: bool,

    /// Base URL used to resolve relative `href`/`src`/`srcset` values to
    /// absolute form during post-processing.
    ///
    /// Default: `None` (relative URLs are left unresolved)
    pub base_url: Option<String>,

    /// Set when the document itself supplies a `<base href>`, which changes
    /// how hash-only links are treated during post-processing.
    ///
    /// Default: `false`
    pub url_override: bool,

    /// Ordered list of metadata fields to interleave into rendered output.
    ///
    /// Purely advisory to callers that render `ExtractResult`; the engine
    /// itself does not read this field.
    ///
    /// Default: `[]`
    pub template: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strip_unlikely: true,
            weight_classes: true,
            clean_conditionally: true,
            base_url: None,
            url_override: false,
            template: Vec::new(),
        }
    }
}

/// Which flag the retry loop clears next, in the fixed order required by
/// the article grabber (strip_unlikely, then weight_classes, then
/// clean_conditionally).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryStage {
    Initial,
    StrippedUnlikely,
    WeightedClasses,
    CleanedConditionally,
}

impl RetryStage {
    pub(crate) fn next(self) -> Option<Self> {
        match self {
            Self::Initial => Some(Self::StrippedUnlikely),
            Self::StrippedUnlikely => Some(Self::WeightedClasses),
            Self::WeightedClasses => Some(Self::CleanedConditionally),
            Self::CleanedConditionally => None,
        }
    }

    /// Apply this stage's flag-weakening to a config clone.
    pub(crate) fn weaken(self, config: &Config) -> Config {
        let mut cfg = config.clone();
        match self {
            Self::Initial => {}
            Self::StrippedUnlikely => cfg.strip_unlikely = false,
            Self::WeightedClasses => {
                cfg.strip_unlikely = false;
                cfg.weight_classes = false;
            }
            Self::CleanedConditionally => {
                cfg.strip_unlikely = false;
                cfg.weight_classes = false;
                cfg.clean_conditionally = false;
            }
        }
        cfg
    }
}
