//! Spam heuristics for free-text message bodies.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// More links than this marks a message as spam.
pub const MAX_URLS: usize = 3;

/// Repetition is only judged on messages longer than this many words.
pub const MIN_WORDS_FOR_REPETITION: usize = 20;

/// Unique-to-total word ratio below which a message is repetitive.
pub const MIN_UNIQUE_RATIO: f64 = 0.3;

/// Phrases that never show up in a genuine contact message.
pub const SPAM_KEYWORDS: &[&str] = &[
    "viagra",
    "cialis",
    "lottery",
    "prize",
    "congratulations",
    "click here",
    "buy now",
    "limited time",
];

static URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://")
        .inspect_err(|e| log::error!("Invalid URL pattern: {e}"))
        .ok()
});

/// Which heuristic rejected a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamSignal {
    /// More links than [`MAX_URLS`], with the count found.
    TooManyUrls(usize),
    /// A phrase from [`SPAM_KEYWORDS`].
    Keyword(&'static str),
    /// Too few distinct words in a long message.
    Repetition,
}

impl fmt::Display for SpamSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyUrls(count) => write!(f, "Too many URLs ({count})"),
            Self::Keyword(keyword) => write!(f, "Spam keyword detected: {keyword}"),
            Self::Repetition => f.write_str("Excessive word repetition"),
        }
    }
}

/// Outcome of [`validate_content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCheck {
    /// Whether the message passed every heuristic.
    pub valid: bool,
    /// First heuristic that failed.
    pub reason: Option<SpamSignal>,
}

impl ContentCheck {
    fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn fail(signal: SpamSignal) -> Self {
        Self {
            valid: false,
            reason: Some(signal),
        }
    }
}

/// Counts `http://` and `https://` occurrences, ignoring case.
pub fn count_urls(content: &str) -> usize {
    URL_RE
        .as_ref()
        .map(|re| re.find_iter(content).count())
        .unwrap_or_default()
}

/// Runs the URL, keyword and repetition heuristics in that order.
/// The first one that fires decides.
pub fn validate_content(content: &str) -> ContentCheck {
    let url_count = count_urls(content);
    if url_count > MAX_URLS {
        return ContentCheck::fail(SpamSignal::TooManyUrls(url_count));
    }

    let lower_content = content.to_lowercase();
    if let Some(keyword) = SPAM_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lower_content.contains(keyword))
    {
        return ContentCheck::fail(SpamSignal::Keyword(keyword));
    }

    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() > MIN_WORDS_FOR_REPETITION {
        let unique: HashSet<&str> = words.iter().copied().collect();
        #[allow(clippy::cast_precision_loss)]
        let ratio = unique.len() as f64 / words.len() as f64;
        if ratio < MIN_UNIQUE_RATIO {
            return ContentCheck::fail(SpamSignal::Repetition);
        }
    }

    ContentCheck::pass()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn links(n: usize) -> String {
        (0..n)
            .map(|i| format!("see https://example.org/{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn test_url_count_at_limit_passes(#[case] n: usize) {
        assert!(validate_content(&links(n)).valid);
    }

    #[test]
    fn test_four_urls_rejected() {
        let check = validate_content(&links(4));
        assert!(!check.valid);
        assert_eq!(check.reason, Some(SpamSignal::TooManyUrls(4)));
    }

    #[test]
    fn test_urls_counted_case_insensitively() {
        assert_eq!(
            count_urls("HTTP://a HtTpS://b http://c https://d plain.example"),
            4
        );
    }

    #[test]
    fn test_url_pattern_compiles() {
        assert!(URL_RE.is_some());
    }

    #[rstest]
    #[case("Please BUY NOW while stocks last", "buy now")]
    #[case("Buy Now", "buy now")]
    #[case("You won the lottery!", "lottery")]
    #[case("congratulations on the new job", "congratulations")]
    #[case("just click here", "click here")]
    fn test_keyword_rejected(#[case] content: &str, #[case] keyword: &str) {
        let check = validate_content(content);
        assert!(!check.valid);
        assert!(matches!(check.reason, Some(SpamSignal::Keyword(k)) if k == keyword));
        assert_eq!(
            check.reason.map(|r| r.to_string()),
            Some(format!("Spam keyword detected: {keyword}"))
        );
    }

    #[test]
    fn test_urls_checked_before_keywords() {
        let content = format!("{} buy now", links(4));
        assert_eq!(
            validate_content(&content).reason,
            Some(SpamSignal::TooManyUrls(4))
        );
    }

    #[test]
    fn test_repetitive_message_rejected() {
        let content = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .cycle()
            .take(25)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let check = validate_content(&content);
        assert!(!check.valid);
        assert_eq!(check.reason, Some(SpamSignal::Repetition));
    }

    #[test]
    fn test_short_repetitive_message_passes() {
        assert!(validate_content(&"spam ".repeat(20)).valid);
    }

    #[test]
    fn test_ordinary_prose_passes() {
        let content = "Hello, I read your paper on thermal comfort in automated vehicles \
            and would like to discuss a possible collaboration with our research group. \
            Would you have time for a short call next week?";
        assert_eq!(validate_content(content), ContentCheck::pass());
    }
}
