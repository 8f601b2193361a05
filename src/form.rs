//! The contact form submit pipeline.
//!
//! A submission passes the rate limiter, honeypot, dwell time, session
//! token, email and content checks in that order. The first failing check
//! rejects it. Only a submission passing all of them is sanitized and handed
//! to the [`Dispatcher`].

use crate::clock::Clock;
use crate::config::Config;
use crate::content::validate_content;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::error::Error;
use crate::rate_limiter::RateLimiter;
use crate::sanitizer::sanitize_input;
use crate::session::{FormSession, RandomBytesSource, validate_session_token};
use crate::store::KeyValueStore;
use crate::validators::{validate_email, validate_honeypot, validate_submission_timing};
use crate::verdict::{FormState, Localizer, ReasonCode, ValidationVerdict};
use chrono::SecondsFormat;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Field values collected by the page when the user hits submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    /// Sender name.
    pub name: String,
    /// Sender address, used as `Reply-To`.
    pub email: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
    /// Content of the hidden `website` field.
    pub honeypot: Option<String>,
    /// Session the form was rendered with.
    pub session: FormSession,
}

/// Collaborators the form works with.
#[derive(Clone)]
pub struct Capabilities {
    /// Holds the rate limit record.
    pub store: Arc<dyn KeyValueStore>,
    /// Time source for dwell and rate limit checks.
    pub clock: Arc<dyn Clock>,
    /// Randomness for session tokens.
    pub random: Arc<dyn RandomBytesSource>,
    /// Where accepted messages go.
    pub dispatcher: Arc<dyn Dispatcher>,
    /// Turns message keys into display text.
    pub localizer: Arc<dyn Localizer>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("store", &self.store)
            .field("clock", &self.clock)
            .field("random", &self.random)
            .finish_non_exhaustive()
    }
}

/// One mounted contact form.
///
/// At most one submission runs at a time. [`ContactForm::submit`] marks the
/// form busy before it first suspends, and a second call made meanwhile
/// fails with [`Error::SubmissionInFlight`].
pub struct ContactForm {
    config: Config,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomBytesSource>,
    dispatcher: Arc<dyn Dispatcher>,
    localizer: Arc<dyn Localizer>,
    session: Mutex<FormSession>,
    state: Mutex<FormState>,
    busy: AtomicBool,
}

impl fmt::Debug for ContactForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactForm")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the busy flag for the duration of one submission.
///
/// Dropping it mid-flight, when the submit future is abandoned, frees the
/// form again and forgets the unfinished attempt.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a Mutex<FormState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a AtomicBool, state: &'a Mutex<FormState>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { busy, state })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.is_busy() {
            log::debug!("Submission abandoned in state {:?}", *state);
            *state = FormState::Idle;
        }
        self.busy.store(false, Ordering::Release);
    }
}

impl ContactForm {
    /// Creates the form and renders it for the first time.
    pub fn new(config: Config, capabilities: Capabilities) -> Self {
        let Capabilities {
            store,
            clock,
            random,
            dispatcher,
            localizer,
        } = capabilities;

        let limiter = RateLimiter::new(store, clock.clone()).with_limits(
            config.rate_limit_key.clone(),
            config.max_attempts,
            config.window(),
        );
        let session = FormSession::new(random.as_ref(), clock.now());

        Self {
            config,
            limiter,
            clock,
            random,
            dispatcher,
            localizer,
            session: Mutex::new(session),
            state: Mutex::new(FormState::Idle),
            busy: AtomicBool::new(false),
        }
    }

    /// Re-renders the form: new session token, dwell timer restarts now.
    pub fn render(&self) -> FormSession {
        let session = FormSession::new(self.random.as_ref(), self.clock.now());
        *lock(&self.session) = session.clone();
        session
    }

    /// Session of the form as currently rendered.
    pub fn session(&self) -> FormSession {
        lock(&self.session).clone()
    }

    /// Current point in the submit cycle.
    pub fn state(&self) -> FormState {
        *lock(&self.state)
    }

    /// True while a submission is being validated or dispatched.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Forgets all rate limited attempts.
    pub fn reset_rate_limit(&self) -> Result<(), Error> {
        self.limiter.reset()
    }

    fn set_state(&self, state: FormState) {
        *lock(&self.state) = state;
    }

    /// Runs one submission through the pipeline.
    ///
    /// Every outcome of the checks and of the dispatch is reported through
    /// the verdict. A dispatch failure is not retried.
    pub async fn submit(&self, attempt: SubmissionAttempt) -> Result<ValidationVerdict, Error> {
        let _guard = BusyGuard::acquire(&self.busy, &self.state).ok_or_else(|| {
            log::debug!("Ignoring submit while another submission is in flight");
            Error::SubmissionInFlight
        })?;
        self.set_state(FormState::Validating);

        let request = match self.check(&attempt) {
            Ok(request) => request,
            Err(reason) => {
                self.set_state(FormState::Rejected(reason.reason_code));
                return Ok(reason.into_verdict(self.localizer.as_ref()));
            }
        };

        self.set_state(FormState::Dispatching);
        match self.dispatcher.send(&request).await {
            Ok(()) => {
                log::info!("Contact message dispatched");
                self.render();
                self.set_state(FormState::Sent);
                Ok(ValidationVerdict::sent(self.localizer.as_ref()))
            }
            Err(e) => {
                log::error!("Error sending contact message: {e}");
                self.set_state(FormState::DispatchFailed);
                Ok(ValidationVerdict::rejected(
                    ReasonCode::DispatchFailed,
                    self.localizer.as_ref(),
                ))
            }
        }
    }

    /// Runs the checks and builds the dispatch request from sanitized fields.
    fn check(&self, attempt: &SubmissionAttempt) -> Result<DispatchRequest, Rejection> {
        let status = self.limiter.check_limit();
        let now = self.clock.now();
        if !status.allowed {
            let minutes = status.minutes_until_reset(now).unwrap_or(1);
            log::info!("Rate limited: retry in {minutes} minutes");
            return Err(Rejection::rate_limited(minutes));
        }

        if !validate_honeypot(attempt.honeypot.as_deref()) {
            log::warn!("Spam detected: honeypot field filled");
            return Err(ReasonCode::BotDetected.into());
        }

        if !validate_submission_timing(attempt.session.rendered_at, now, self.config.min_dwell()) {
            log::warn!("Spam detected: form submitted too quickly");
            return Err(ReasonCode::TooFast.into());
        }

        if !validate_session_token(&attempt.session.token) {
            log::warn!("Rejected submission with malformed session token");
            return Err(ReasonCode::SessionInvalid.into());
        }

        if !validate_email(&attempt.email) {
            log::info!("Rejected submission with invalid email");
            return Err(ReasonCode::InvalidEmail.into());
        }

        let content = validate_content(&attempt.message);
        if !content.valid {
            if let Some(signal) = content.reason {
                log::warn!("Suspicious content: {signal}");
            }
            return Err(ReasonCode::SuspiciousContent.into());
        }

        let params = [
            ("from_name", sanitize_input(&attempt.name)),
            ("from_email", sanitize_input(&attempt.email)),
            ("subject", sanitize_input(&attempt.subject)),
            ("message", sanitize_input(&attempt.message)),
            ("to_email", self.config.to_email.clone()),
            (
                "submission_time",
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (
                "session_token",
                attempt
                    .session
                    .token_prefix(self.config.token_prefix_len)
                    .to_string(),
            ),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect::<BTreeMap<_, _>>();

        Ok(DispatchRequest {
            service_id: self.config.service_id.clone(),
            template_id: self.config.template_id.clone(),
            params,
            public_key: self.config.public_key.clone(),
        })
    }
}

/// A failed check, before it is turned into a user facing verdict.
#[derive(Debug)]
struct Rejection {
    reason_code: ReasonCode,
    retry_after_minutes: Option<u64>,
}

impl Rejection {
    fn rate_limited(minutes: u64) -> Self {
        Self {
            reason_code: ReasonCode::RateLimited,
            retry_after_minutes: Some(minutes),
        }
    }

    fn into_verdict(self, localizer: &dyn Localizer) -> ValidationVerdict {
        match self.retry_after_minutes {
            Some(minutes) => ValidationVerdict::rate_limited(minutes, localizer),
            None => ValidationVerdict::rejected(self.reason_code, localizer),
        }
    }
}

impl From<ReasonCode> for Rejection {
    fn from(reason_code: ReasonCode) -> Self {
        Self {
            reason_code,
            retry_after_minutes: None,
        }
    }
}
