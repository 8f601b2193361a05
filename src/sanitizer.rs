//! Best-effort markup stripping for user supplied text.
//!
//! This is a denylist, not an HTML sanitizer. It removes the patterns most
//! likely to execute if a mail template renders the text unescaped.

use regex::Regex;
use std::sync::LazyLock;

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Whole blocks first, then the bare tag name of an unclosed opener.
        r"(?is)<script\b.*?</script\s*>",
        r"(?i)<script\b",
        r"(?is)<iframe\b.*?</iframe\s*>",
        r"(?i)<iframe\b",
        r#"(?i)on\w+\s*=\s*["'][^"']*["']"#,
        r"(?i)javascript:",
    ]
    .iter()
    .filter_map(|pattern| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("Invalid sanitizer pattern {pattern}: {e}");
            None
        }
    })
    .collect()
});

fn sanitize_once(input: &str) -> String {
    PATTERNS
        .iter()
        .fold(input.trim().to_string(), |text, re| {
            re.replace_all(&text, "").into_owned()
        })
}

/// Trims `input` and strips script and iframe elements, inline event
/// handlers and `javascript:` URIs.
///
/// Removal repeats until nothing changes, so fragments glued together by a
/// removal (`<scr<script></script>ipt>`) are caught as well and the result
/// is stable under another pass.
pub fn sanitize_input(input: &str) -> String {
    let mut current = sanitize_once(input);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("  hello  ", "hello")]
    #[case("Hi <script>alert(1)</script>there", "Hi there")]
    #[case("Hi <SCRIPT type=\"text/javascript\">\nalert(1)\n</ScRiPt>there", "Hi there")]
    #[case("<iframe src=\"x\"></iframe>text", "text")]
    #[case("<img src=x onerror=\"alert(1)\">", "<img src=x >")]
    #[case("<a href='#' onClick='steal()'>x</a>", "<a href='#' >x</a>")]
    #[case("<a href=\"javascript:alert(1)\">x</a>", "<a href=\"alert(1)\">x</a>")]
    #[case("JavaScript:void(0)", "void(0)")]
    #[case("plain text stays", "plain text stays")]
    fn test_sanitize_input(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_input(input), expected);
    }

    #[rstest]
    #[case(
        "Hi, your page uses <script without closing.\nPlease call me at 555-1234.\nBest, Ada",
        "Hi, your page uses  without closing.\nPlease call me at 555-1234.\nBest, Ada"
    )]
    #[case("Compare a <iframe tag and 3 < 4 results", "Compare a  tag and 3 < 4 results")]
    #[case("<script src=evil.js> and more", "src=evil.js> and more")]
    fn test_unclosed_opener_keeps_following_text(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_input(input), expected);
    }

    #[rstest]
    #[case("<script>a</script>")]
    #[case("x<scr<script>y</script>ipt>alert(1)</script>z")]
    #[case("<script>a</script><script>unterminated")]
    #[case("<ScRiPt>x</sCrIpT> and <script src=evil.js>")]
    #[case("javajavascript:script:alert(1)")]
    #[case(" <iframe>  </iframe> <script> </script> ")]
    fn test_no_script_left_and_idempotent(#[case] input: &str) {
        let once = sanitize_input(input);
        assert!(!once.to_lowercase().contains("<script"), "{once}");
        assert!(!once.to_lowercase().contains("javascript:"), "{once}");
        assert_eq!(sanitize_input(&once), once);
    }
}
