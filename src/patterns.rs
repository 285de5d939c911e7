//! Compiled regex patterns used throughout the extraction pipeline.
//!
//! All patterns are compiled once via `LazyLock` and are reproduced
//! verbatim from the external interface appendix: character classes and
//! alternation are expressed equivalently in the `regex` crate, but no
//! pattern has been "cleaned up" relative to its source definition. See
//! [`SHARE`] for one preserved quirk; the sibling `li_count - 100 > p_count`
//! quirk lives in `article_prep.rs`, not here.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

/// Class/id names that mark an element as likely-boilerplate during
/// pre-scoring (navigation, ads, social widgets, etc.).
pub static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .expect("UNLIKELY regex")
});

/// Class/id names that rescue an otherwise-unlikely element.
pub static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)and|article|body|column|content|main|shadow").expect("CANDIDATE regex")
});

/// Class/id/`rel`/`itemprop` patterns identifying a byline element.
pub static BYLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)byline|author|dateline|writtenby|p-author").expect("BYLINE regex")
});

/// Class/id names contributing a −25 class weight.
pub static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .expect("NEGATIVE regex")
});

/// Class/id names contributing a +25 class weight.
pub static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story",
    )
    .expect("POSITIVE regex")
});

/// Matches trailing sentence-ending punctuation, used by the
/// paragraph-with-content sibling-inclusion heuristic.
pub static SENTENCE_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.( |$)").expect("SENTENCE_DOT regex"));

/// Matches a bare image-file extension.
pub static IMGEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp)").expect("IMGEXT regex"));

/// Matches an image extension followed by a srcset width/density descriptor.
pub static SRCSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp)\s+\d").expect("SRCSET regex"));

/// Matches an attribute value that looks like a single bare image URL.
pub static SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\S+\.(jpg|jpeg|png|webp)\S*\s*$").expect("SRC regex")
});

/// Matches known video-embed hosts, exempting them from embed removal.
pub static VIDEOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .expect("VIDEOS regex")
});

/// Matches share-widget class/id names.
///
/// Reproduced verbatim from the source appendix, which ends the trailing
/// alternation with a bare `_` rather than the evidently-intended
/// `[\s_]` character class. Do not "fix" this: compatibility with the
/// reference fixture corpus depends on the literal behavior.
pub static SHARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[\s_])(share|sharedaddy)($|[\s_]|_)").expect("SHARE regex")
});

/// Matches an absolute URL (scheme-qualified or protocol-relative).
pub static ABSOLUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+:)?//").expect("ABSOLUTE regex"));

/// Matches a base64-encoded data URL, used to spot tiny placeholder images.
pub static B64_DATAURL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^data:\s*[^\s;,]+\s*;\s*base64\s*,").expect("B64_DATAURL regex")
});

/// Matches a string with at least one non-whitespace character at its end,
/// i.e. a non-blank trimmed value.
pub static HASCONTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s]$").expect("HASCONTENT regex"));

/// Matches one of the title/site-name separators (`| - \ / > »`) flanked by
/// whitespace on both sides. Used by the metadata title fallback.
pub static TITLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s[|\-\\/>\x{00BB}]\s").expect("TITLE_SEPARATOR regex")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlikely_matches_known_boilerplate_classes() {
        assert!(UNLIKELY.is_match("sidebar-widget"));
        assert!(UNLIKELY.is_match("comment-list"));
        assert!(!UNLIKELY.is_match("article-body"));
    }

    #[test]
    fn candidate_rescues_content_like_classes() {
        assert!(CANDIDATE.is_match("main-content"));
        assert!(CANDIDATE.is_match("article"));
    }

    #[test]
    fn share_regex_preserves_trailing_underscore_quirk() {
        assert!(SHARE.is_match("share_widget"));
        assert!(SHARE.is_match(" share "));
        assert!(SHARE.is_match("sharedaddy"));
    }

    #[test]
    fn absolute_matches_scheme_and_protocol_relative() {
        assert!(ABSOLUTE.is_match("https://example.com/a"));
        assert!(ABSOLUTE.is_match("//cdn.example.com/a.js"));
        assert!(!ABSOLUTE.is_match("/relative/path"));
        assert!(!ABSOLUTE.is_match("relative/path"));
    }

    #[test]
    fn b64_dataurl_matches_base64_prefix() {
        assert!(B64_DATAURL.is_match("data:image/png;base64,AAAA"));
        assert!(!B64_DATAURL.is_match("data:image/png,AAAA"));
    }

    #[test]
    fn title_separator_matches_flanked_pipe_and_dash() {
        assert!(TITLE_SEPARATOR.is_match("Real Title | Example Site"));
        assert!(TITLE_SEPARATOR.is_match("Real Title - Example Site"));
        assert!(!TITLE_SEPARATOR.is_match("Real-Title"));
    }

    #[test]
    fn srcset_requires_descriptor_digit() {
        assert!(SRCSET.is_match("photo.jpg 1x"));
        assert!(!SRCSET.is_match("photo.jpg"));
    }
}
