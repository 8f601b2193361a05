//! Module for rate limiting.
//!
//! A fixed window limiter whose state lives in a [`KeyValueStore`] under a
//! single key. The state belongs to whoever controls the store: a client
//! that wipes its storage gets a fresh allowance. Treat this as an advisory
//! throttle against accidental floods and lazy bots, not as abuse prevention.

use crate::clock::Clock;
use crate::error::Error;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Store key the attempt record is kept under.
pub const RATE_LIMIT_KEY: &str = "form_submissions";

/// Attempts allowed per window.
pub const MAX_ATTEMPTS: u32 = 3;

/// Length of one rate limiting window.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Persisted attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    /// Attempts in the current window, frozen at the cap.
    pub attempts: u32,
    /// Start of the window, milliseconds since the Unix epoch.
    pub first_attempt: i64,
}

/// Result of [`RateLimiter::check_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether this attempt may proceed.
    pub allowed: bool,
    /// Attempts left in the window after this one.
    pub remaining_attempts: u32,
    /// When the current window ends. Only set when the attempt was refused.
    pub reset_time: Option<DateTime<Utc>>,
}

impl RateLimitStatus {
    /// Whole minutes until `reset_time`, rounded up and never below one.
    pub fn minutes_until_reset(&self, now: DateTime<Utc>) -> Option<u64> {
        let reset_time = self.reset_time?;
        let millis = u64::try_from((reset_time - now).num_milliseconds()).unwrap_or(0);
        Some(millis.div_ceil(60_000).max(1))
    }
}

/// Fixed window limiter over a persisted attempt counter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    /// Limiter with the default key, cap and window.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            key: RATE_LIMIT_KEY.to_string(),
            max_attempts: MAX_ATTEMPTS,
            window: WINDOW,
        }
    }

    /// Overrides the store key, attempt cap and window length.
    pub fn with_limits(mut self, key: impl Into<String>, max_attempts: u32, window: Duration) -> Self {
        self.key = key.into();
        self.max_attempts = max_attempts;
        self.window = window;
        self
    }

    /// Counts one attempt and reports whether it may proceed.
    ///
    /// Attempts refused because the cap is reached are not counted, so the
    /// counter stays at the cap until the window runs out.
    ///
    /// Storage faults fail open: the attempt is allowed and nothing is counted.
    pub fn check_limit(&self) -> RateLimitStatus {
        match self.try_check_limit() {
            Ok(status) => status,
            Err(e) => {
                log::warn!("Rate limit storage unavailable, allowing attempt: {e}");
                RateLimitStatus {
                    allowed: true,
                    remaining_attempts: self.max_attempts,
                    reset_time: None,
                }
            }
        }
    }

    fn try_check_limit(&self) -> Result<RateLimitStatus, Error> {
        let now = self.clock.now().timestamp_millis();
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);

        let record = self
            .load()?
            .filter(|record| now.saturating_sub(record.first_attempt) <= window_ms);

        let Some(mut record) = record else {
            self.save(&RateLimitRecord {
                attempts: 1,
                first_attempt: now,
            })?;
            return Ok(RateLimitStatus {
                allowed: true,
                remaining_attempts: self.max_attempts.saturating_sub(1),
                reset_time: None,
            });
        };

        if record.attempts >= self.max_attempts {
            log::debug!(
                "Rate limit reached: {} attempts since {}",
                record.attempts,
                record.first_attempt
            );
            return Ok(RateLimitStatus {
                allowed: false,
                remaining_attempts: 0,
                reset_time: DateTime::from_timestamp_millis(
                    record.first_attempt.saturating_add(window_ms),
                ),
            });
        }

        record.attempts += 1;
        self.save(&record)?;
        Ok(RateLimitStatus {
            allowed: true,
            remaining_attempts: self.max_attempts - record.attempts,
            reset_time: None,
        })
    }

    /// Forgets all counted attempts.
    pub fn reset(&self) -> Result<(), Error> {
        self.store.remove(&self.key)
    }

    /// Reads the persisted record. Unparseable content counts as no record.
    pub fn record(&self) -> Result<Option<RateLimitRecord>, Error> {
        self.load()
    }

    fn load(&self) -> Result<Option<RateLimitRecord>, Error> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                log::warn!("Discarding malformed rate limit record {raw:?}: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, record: &RateLimitRecord) -> Result<(), Error> {
        self.store.set(&self.key, &serde_json::to_string(record)?)
    }
}
