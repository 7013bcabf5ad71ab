// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Retry policies for fallible operations.
//!
//! A [`RetryStrategy`] receives a zero-argument operation and decides
//! whether and when to run it again. Only errors for which
//! [`Error::is_retryable`] holds are retried; any other error is returned
//! unchanged on the spot.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Policy wrapping a fallible operation.
pub trait RetryStrategy: Send + Sync + fmt::Debug {
    /// Run `operation` until it succeeds or the policy gives up.
    fn retry(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}

/// Run `operation` under `strategy` and return its output.
pub fn retry_operation<T, F>(strategy: &dyn RetryStrategy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut output = None;
    strategy.retry(&mut || {
        output = Some(operation()?);
        Ok(())
    })?;
    // A strategy that reports success without running the operation
    output.ok_or(Error::RetriesExhausted {
        attempts: 0,
        last: None,
    })
}

/// Shared attempt loop; `delay(n)` is the pause after failed attempt `n`.
fn run_attempts(
    max_attempts: u32,
    delay: impl Fn(u32) -> Duration,
    operation: &mut dyn FnMut() -> Result<()>,
) -> Result<()> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation() {
            Ok(()) => return Ok(()),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: Some(Box::new(e)),
                });
            }
            Err(e) => {
                let pause = delay(attempt);
                log::debug!(
                    "[retry] attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    pause
                );
                thread::sleep(pause);
            }
        }
    }
}

/// Run the operation exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discontinue;

impl RetryStrategy for Discontinue {
    fn retry(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        operation()
    }
}

/// Up to `attempts` runs with a constant pause between them.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub attempts: u32,
    pub delay: Duration,
}

impl FixedDelay {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl RetryStrategy for FixedDelay {
    fn retry(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        run_attempts(self.attempts, |_| self.delay, operation)
    }
}

/// Up to `max_attempts` runs; the pause starts at `initial_delay` and is
/// multiplied by `multiplier` after each failure, capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pause after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = self.initial_delay.as_nanos() as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = base.min(self.max_delay.as_nanos() as f64);
        Duration::from_nanos(capped as u64)
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn retry(&self, operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        run_attempts(self.max_attempts, |attempt| self.delay_for(attempt), operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Fails with `error()` for the first `failures` calls.
    fn flaky(failures: u32, error: fn() -> Error) -> (impl FnMut() -> Result<u32>, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let op = move || {
            counter.set(counter.get() + 1);
            if counter.get() <= failures {
                Err(error())
            } else {
                Ok(counter.get())
            }
        };
        (op, calls)
    }

    #[test]
    fn test_discontinue_runs_once() {
        let (op, calls) = flaky(1, || Error::NoReachableHost);
        let result = retry_operation(&Discontinue, op);
        assert!(matches!(result, Err(Error::NoReachableHost)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_fixed_delay_recovers() {
        let (op, calls) = flaky(2, || Error::NoReachableHost);
        let result = retry_operation(&FixedDelay::new(5, Duration::from_millis(1)), op);
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_fixed_delay_exhausts() {
        let (op, calls) = flaky(10, || Error::ConnectionClosed);
        match retry_operation(&FixedDelay::new(3, Duration::from_millis(1)), op) {
            Err(Error::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(last.as_deref(), Some(Error::ConnectionClosed)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_non_retryable_error_stops_immediately() {
        let (op, calls) = flaky(10, || Error::Handshake("bad credentials".into()));
        let strategy = ExponentialBackoff::default().with_initial_delay(Duration::from_millis(1));
        assert!(matches!(
            retry_operation(&strategy, op),
            Err(Error::Handshake(_))
        ));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_delays() {
        let strategy = ExponentialBackoff::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(500))
            .with_multiplier(2.0);

        assert_eq!(strategy.delay_for(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(3), Duration::from_millis(400));
        assert_eq!(strategy.delay_for(4), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(u32::MAX), Duration::from_millis(500));
    }

    #[derive(Debug)]
    struct NeverRuns;

    impl RetryStrategy for NeverRuns {
        fn retry(&self, _operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_strategy_that_skips_operation() {
        let result = retry_operation(&NeverRuns, || Ok(1));
        assert!(matches!(
            result,
            Err(Error::RetriesExhausted { attempts: 0, last: None })
        ));
    }
}
