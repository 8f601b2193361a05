#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::correctness,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::wildcard_imports,
    clippy::needless_borrow,
    clippy::cast_lossless,
    clippy::unused_async,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
    clippy::cloned_instead_of_copied
)]
#![cfg_attr(not(test), forbid(clippy::indexing_slicing))]
#![cfg_attr(not(test), forbid(clippy::string_slice))]
#![allow(
    clippy::match_bool,
    clippy::bool_assert_comparison,
    clippy::format_push_string
)]
pub mod clock;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod rate_limiter;
pub mod sanitizer;
pub mod session;
pub mod smtp_relay;
pub mod store;
pub mod validators;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use content::{ContentCheck, SpamSignal, validate_content};
pub use dispatch::{DispatchRequest, Dispatcher};
pub use error::Error;
pub use form::{Capabilities, ContactForm, SubmissionAttempt};
pub use rate_limiter::{RateLimitRecord, RateLimitStatus, RateLimiter};
pub use sanitizer::sanitize_input;
pub use session::{
    FormSession, OsRandom, RandomBytesSource, generate_session_token, validate_session_token,
};
pub use smtp_relay::SmtpRelayDispatcher;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use validators::{validate_email, validate_honeypot, validate_submission_timing};
pub use verdict::{FormState, Localizer, ReasonCode, ValidationVerdict};
