//! Throttle gate
//!
//! Runs an action at most once per period. The block window is anchored on
//! the completion of the last successful run: after the action returns the
//! gate closes until `now + period`. Calls arriving while closed are dropped.

use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Independent block-until timestamp for one throttled action
pub struct ThrottleGate {
    period: Duration,
    /// `None` until the first run, so the first call always passes
    block_until: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    /// Create an open gate
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            block_until: Mutex::new(None),
        }
    }

    /// Get the configured period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Check whether a call made now would run
    pub fn is_open(&self) -> bool {
        self.block_until
            .lock()
            .map_or(true, |until| Instant::now() >= until)
    }

    /// Run `action` if the gate is open, then close it for one period
    ///
    /// Returns whether the action ran. The lock is held while the action runs,
    /// so `action` must not call back into this gate.
    pub fn run<F>(&self, action: F) -> bool
    where
        F: FnOnce(),
    {
        let mut block_until = self.block_until.lock();

        if let Some(until) = *block_until {
            if Instant::now() < until {
                tracing::trace!(
                    remaining_ms = (until - Instant::now()).as_millis() as u64,
                    "Throttled call dropped"
                );
                return false;
            }
        }

        action();
        *block_until = Some(Instant::now() + self.period);
        true
    }
}

impl fmt::Debug for ThrottleGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleGate")
            .field("period", &self.period)
            .field("open", &self.is_open())
            .finish()
    }
}

/// An action wrapped in its own [`ThrottleGate`]
pub struct Throttled<F> {
    action: F,
    gate: ThrottleGate,
}

impl<F> Throttled<F>
where
    F: Fn(),
{
    /// Wrap `action` so it runs at most once per `period`
    pub fn new(action: F, period: Duration) -> Self {
        Self {
            action,
            gate: ThrottleGate::new(period),
        }
    }

    /// Invoke the action unless the gate is closed; returns whether it ran
    pub fn call(&self) -> bool {
        self.gate.run(&self.action)
    }

    /// Get the underlying gate
    pub fn gate(&self) -> &ThrottleGate {
        &self.gate
    }
}

impl<F> fmt::Debug for Throttled<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled").field("gate", &self.gate).finish()
    }
}

/// Wrap a zero-result action so it runs at most once per `period`
pub fn throttle<F>(action: F, period: Duration) -> Throttled<F>
where
    F: Fn(),
{
    Throttled::new(action, period)
}
