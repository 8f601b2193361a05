//! Wall clock access.

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Source of the current time.
///
/// The rate limiter persists absolute timestamps, so this is a wall clock
/// rather than a monotonic one.
pub trait Clock: Send + Sync + Debug {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
