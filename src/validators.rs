//! Field checks run on every submission.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Default minimum dwell time between form render and submit.
pub const MIN_DWELL: Duration = Duration::from_millis(3000);

// Deliberately loose: something, an `@`, something, a dot, something.
static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .inspect_err(|e| log::error!("Invalid email pattern: {e}"))
        .ok()
});

/// Check that the hidden honeypot field was left empty.
///
/// Humans never see the field, so any content means a bot filled it in.
pub fn validate_honeypot(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Check that at least `min_time` passed between render and `now`.
///
/// A render time in the future counts as too fast.
pub fn validate_submission_timing(
    form_rendered_at: DateTime<Utc>,
    now: DateTime<Utc>,
    min_time: Duration,
) -> bool {
    let Ok(elapsed) = (now - form_rendered_at).to_std() else {
        return false;
    };
    elapsed >= min_time
}

/// Syntactic email check. Catches obviously malformed addresses only.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}
