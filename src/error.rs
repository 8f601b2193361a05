//! Error types.

/// Error type for contactgate.
///
/// Rejected submissions are not errors, they come back as a
/// [`ValidationVerdict`](crate::verdict::ValidationVerdict).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The config file could not be parsed.
    #[error("Contact config is invalid: {0}")]
    Config(#[from] serini::Error),
    #[error(transparent)]
    /// Reading or writing a file failed.
    Io(#[from] std::io::Error),
    /// A stored value or the store file is not valid JSON.
    #[error("Stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The relay refused the message or could not be reached.
    #[error("Message dispatch failed: {0}")]
    Dispatch(String),
    /// A mail address did not parse.
    #[error("Invalid mail address <{0}>")]
    InvalidAddress(String),
    /// [`ContactForm::submit`](crate::form::ContactForm::submit) was called while a submission was running.
    #[error("A submission is already in flight for this form")]
    SubmissionInFlight,
}
