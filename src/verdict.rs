//! Submission outcomes and their user facing messages.

use serde::Serialize;
use std::fmt;

/// Why a submission did not go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Too many submissions in the current window.
    RateLimited,
    /// The honeypot field was filled in.
    BotDetected,
    /// Submitted sooner after render than a person types.
    TooFast,
    /// Session token missing or malformed.
    SessionInvalid,
    /// Sender address does not look like one.
    InvalidEmail,
    /// Message tripped a spam heuristic.
    SuspiciousContent,
    /// Relay did not take the message.
    DispatchFailed,
}

impl ReasonCode {
    /// Stable snake_case name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::BotDetected => "bot_detected",
            Self::TooFast => "too_fast",
            Self::SessionInvalid => "session_invalid",
            Self::InvalidEmail => "invalid_email",
            Self::SuspiciousContent => "suspicious_content",
            Self::DispatchFailed => "dispatch_failed",
        }
    }

    /// Translation key of the message shown to the user.
    ///
    /// Bot detection and dispatch failures share the generic error text so
    /// the message does not tell a bot which check caught it.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::RateLimited => "contact.rateLimited",
            Self::TooFast => "contact.tooFast",
            Self::SessionInvalid => "contact.sessionInvalid",
            Self::InvalidEmail => "contact.invalidEmail",
            Self::SuspiciousContent => "contact.suspiciousContent",
            Self::BotDetected | Self::DispatchFailed => GENERIC_ERROR_KEY,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translation key for a generic failure.
pub const GENERIC_ERROR_KEY: &str = "contact.errorDescription";

/// Translation key for a sent message.
pub const SENT_KEY: &str = "contact.messageSent";

/// Lookup from translation key to display text.
///
/// Any `Fn(&str) -> String` closure is a localizer.
pub trait Localizer: Send + Sync {
    /// Display text for `key`.
    fn translate(&self, key: &str) -> String;
}

impl<F> Localizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    /// Whether the message went out.
    pub accepted: bool,
    /// Set on every rejection.
    pub reason_code: Option<ReasonCode>,
    /// Localized text to show next to the form.
    pub user_message: Option<String>,
    /// Minutes until the rate limit window ends, for `rate_limited` only.
    pub retry_after_minutes: Option<u64>,
}

impl ValidationVerdict {
    /// Message handed to the relay.
    pub fn sent(localizer: &dyn Localizer) -> Self {
        Self {
            accepted: true,
            reason_code: None,
            user_message: Some(localizer.translate(SENT_KEY)),
            retry_after_minutes: None,
        }
    }

    /// Rejected for `reason`.
    pub fn rejected(reason: ReasonCode, localizer: &dyn Localizer) -> Self {
        Self {
            accepted: false,
            reason_code: Some(reason),
            user_message: Some(localizer.translate(reason.message_key())),
            retry_after_minutes: None,
        }
    }

    /// Rejected until the window ends in `minutes`.
    pub fn rate_limited(minutes: u64, localizer: &dyn Localizer) -> Self {
        Self {
            retry_after_minutes: Some(minutes),
            ..Self::rejected(ReasonCode::RateLimited, localizer)
        }
    }
}

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    /// Waiting for input.
    #[default]
    Idle,
    /// Running the local checks.
    Validating,
    /// A check failed.
    Rejected(ReasonCode),
    /// Waiting on the relay.
    Dispatching,
    /// Last message went out.
    Sent,
    /// Relay refused or was unreachable.
    DispatchFailed,
}

impl FormState {
    /// While busy the submit control must stay disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::Dispatching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn echo(key: &str) -> String {
        format!("<{key}>")
    }

    #[rstest]
    #[case(ReasonCode::RateLimited, "rate_limited", "contact.rateLimited")]
    #[case(ReasonCode::BotDetected, "bot_detected", GENERIC_ERROR_KEY)]
    #[case(ReasonCode::TooFast, "too_fast", "contact.tooFast")]
    #[case(ReasonCode::SessionInvalid, "session_invalid", "contact.sessionInvalid")]
    #[case(ReasonCode::InvalidEmail, "invalid_email", "contact.invalidEmail")]
    #[case(ReasonCode::SuspiciousContent, "suspicious_content", "contact.suspiciousContent")]
    #[case(ReasonCode::DispatchFailed, "dispatch_failed", GENERIC_ERROR_KEY)]
    fn test_reason_codes(#[case] reason: ReasonCode, #[case] code: &str, #[case] key: &str) {
        assert_eq!(reason.to_string(), code);
        assert_eq!(
            serde_json::to_value(reason).ok(),
            Some(serde_json::Value::String(code.to_string()))
        );
        assert_eq!(reason.message_key(), key);
    }

    #[test]
    fn test_verdicts_are_localized() {
        let sent = ValidationVerdict::sent(&echo);
        assert!(sent.accepted);
        assert_eq!(sent.user_message.as_deref(), Some("<contact.messageSent>"));

        let limited = ValidationVerdict::rate_limited(7, &echo);
        assert!(!limited.accepted);
        assert_eq!(limited.reason_code, Some(ReasonCode::RateLimited));
        assert_eq!(limited.retry_after_minutes, Some(7));
        assert_eq!(limited.user_message.as_deref(), Some("<contact.rateLimited>"));
    }

    #[rstest]
    #[case(FormState::Idle, false)]
    #[case(FormState::Validating, true)]
    #[case(FormState::Dispatching, true)]
    #[case(FormState::Rejected(ReasonCode::TooFast), false)]
    #[case(FormState::Sent, false)]
    #[case(FormState::DispatchFailed, false)]
    fn test_busy_states(#[case] state: FormState, #[case] busy: bool) {
        assert_eq!(state.is_busy(), busy);
    }
}
