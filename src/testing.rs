//! Test doubles for the injected capabilities.

use crate::clock::Clock;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::error::Error;
use crate::session::RandomBytesSource;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = DateTime::from_timestamp(1_767_268_800, 0).expect("valid timestamp");
        Self {
            now: Mutex::new(start),
        }
    }
}

impl ManualClock {
    pub(crate) fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).expect("duration in range");
        *self.now.lock().expect("clock lock") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Fills every byte with the same value.
#[derive(Debug)]
pub(crate) struct FixedRandom(pub u8);

impl RandomBytesSource for FixedRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        dest.fill(self.0);
    }
}

/// Store whose every operation fails.
#[derive(Debug)]
pub(crate) struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(std::io::Error::other("storage disabled").into())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), Error> {
        Err(std::io::Error::other("storage disabled").into())
    }

    fn remove(&self, _key: &str) -> Result<(), Error> {
        Err(std::io::Error::other("storage disabled").into())
    }
}

/// Dispatcher remembering every request, optionally failing them all.
#[derive(Debug, Default)]
pub(crate) struct RecordingDispatcher {
    pub(crate) requests: Mutex<Vec<DispatchRequest>>,
    pub(crate) fail: AtomicBool,
}

impl RecordingDispatcher {
    pub(crate) fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, request: &DispatchRequest) -> Result<(), Error> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Dispatch("relay refused".to_string()));
        }
        Ok(())
    }
}

/// Dispatcher that signals `entered` and then waits for `release`.
#[derive(Debug, Default)]
pub(crate) struct GatedDispatcher {
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

#[async_trait]
impl Dispatcher for GatedDispatcher {
    async fn send(&self, _request: &DispatchRequest) -> Result<(), Error> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}
