//! # Circuit Breaker
//!
//! Three-state guard around an upstream dependency.
//!
//! ```text
//!            failures >= threshold
//!   Closed ─────────────────────────▶ Open
//!     ▲                                │ reset_timeout elapsed
//!     │ trial succeeds                 ▼
//!     └──────────────────────────── HalfOpen ──▶ Open (trial fails)
//! ```
//!
//! ## Concurrency
//!
//! All state lives behind one `parking_lot::Mutex`, so each admission check
//! and each outcome is a single atomic transition. The lock is never held
//! across an `.await`. In `HalfOpen` exactly one caller is admitted; if that
//! caller is dropped without reporting an outcome, a new trial is admitted
//! once another `reset_timeout` has passed.
//!
//! Every admission returns an [`Admission`] tagged with the breaker's
//! generation, which advances on each state change and each trial. An
//! outcome only counts if its admission is still current: a call admitted
//! while `Closed` that finishes after the breaker opened cannot close it,
//! and a superseded trial cannot decide the `HalfOpen` state.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        })
    }
}

/// Breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// Time spent open before a half-open trial.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Permission to make one call, returned by [`CircuitBreaker::try_acquire`].
///
/// Hand it back to [`CircuitBreaker::record_success`] or
/// [`CircuitBreaker::record_failure`] with the call's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "report the call outcome with this admission"]
pub struct Admission {
    generation: u64,
}

#[derive(Debug)]
struct Inner {
    config: BreakerConfig,
    state: BreakerState,
    consecutive_failures: u32,
    transitioned_at: Instant,
    trial_in_flight: bool,
    generation: u64,
}

impl Inner {
    fn transition(&mut self, state: BreakerState, now: Instant) {
        self.state = state;
        self.transitioned_at = now;
        self.generation = self.generation.wrapping_add(1);
    }

    fn admit_trial(&mut self, now: Instant) -> Admission {
        self.transitioned_at = now;
        self.trial_in_flight = true;
        self.generation = self.generation.wrapping_add(1);
        Admission {
            generation: self.generation,
        }
    }

    fn is_current(&self, admission: Admission) -> bool {
        admission.generation == self.generation && self.state != BreakerState::Open
    }
}

/// A circuit breaker shared by every call made through one client.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                state: BreakerState::Closed,
                consecutive_failures: 0,
                transitioned_at: Instant::now(),
                trial_in_flight: false,
                generation: 0,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Apply new thresholds and return to `Closed`.
    ///
    /// This is the only external reset.
    pub fn reconfigure(&self, config: BreakerConfig) {
        let mut inner = self.inner.lock();
        inner.config = config;
        inner.consecutive_failures = 0;
        inner.trial_in_flight = false;
        inner.transition(BreakerState::Closed, Instant::now());
    }

    /// Ask to make a call now.
    ///
    /// `Err` carries the remaining open time; no request may be sent.
    pub fn try_acquire(&self) -> Result<Admission, Duration> {
        self.try_acquire_at(Instant::now())
    }

    /// [`try_acquire`](Self::try_acquire) against an explicit clock reading.
    pub fn try_acquire_at(&self, now: Instant) -> Result<Admission, Duration> {
        let mut inner = self.inner.lock();
        let elapsed = now.saturating_duration_since(inner.transitioned_at);
        let reset = inner.config.reset_timeout;
        match inner.state {
            BreakerState::Closed => Ok(Admission {
                generation: inner.generation,
            }),
            BreakerState::Open if elapsed >= reset => {
                inner.state = BreakerState::HalfOpen;
                tracing::debug!("circuit breaker half-open, admitting trial call");
                Ok(inner.admit_trial(now))
            }
            BreakerState::Open => Err(reset - elapsed),
            BreakerState::HalfOpen if !inner.trial_in_flight || elapsed >= reset => Ok(inner.admit_trial(now)),
            BreakerState::HalfOpen => Err(reset - elapsed),
        }
    }

    /// Report a successful (or non-transient) outcome.
    ///
    /// Ignored when `admission` is stale.
    pub fn record_success(&self, admission: Admission) {
        let mut inner = self.inner.lock();
        if !inner.is_current(admission) {
            tracing::debug!(state = %inner.state, "ignoring outcome of stale admission");
            return;
        }
        inner.consecutive_failures = 0;
        inner.trial_in_flight = false;
        if inner.state == BreakerState::HalfOpen {
            tracing::info!(from = %inner.state, "circuit breaker closed");
            inner.transition(BreakerState::Closed, Instant::now());
        }
    }

    /// Report a transient failure.
    ///
    /// Ignored when `admission` is stale.
    pub fn record_failure(&self, admission: Admission) {
        self.record_failure_at(admission, Instant::now());
    }

    /// [`record_failure`](Self::record_failure) against an explicit clock
    /// reading.
    pub fn record_failure_at(&self, admission: Admission, now: Instant) {
        let mut inner = self.inner.lock();
        if !inner.is_current(admission) {
            tracing::debug!(state = %inner.state, "ignoring outcome of stale admission");
            return;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        match inner.state {
            BreakerState::Closed if inner.consecutive_failures >= inner.config.failure_threshold => {
                tracing::warn!(
                    failures = inner.consecutive_failures,
                    threshold = inner.config.failure_threshold,
                    "circuit breaker opened"
                );
                inner.transition(BreakerState::Open, now);
            }
            BreakerState::HalfOpen => {
                tracing::warn!("circuit breaker trial call failed, reopening");
                inner.trial_in_flight = false;
                inner.transition(BreakerState::Open, now);
            }
            BreakerState::Closed | BreakerState::Open => {}
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
