//! Bounded retry with exponential backoff for throttled provider calls.

use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, optionally jittered by +/- 50%.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(2),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: false,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = base.as_secs_f64() * factor.powi(exponent);
                // NaN collapses to `max`; negative schedules collapse to zero.
                let capped = Duration::try_from_secs_f64(seconds.min(max.as_secs_f64()))
                    .unwrap_or(Duration::ZERO);
                if jitter {
                    apply_jitter(capped)
                } else {
                    capped
                }
            }
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let spread = millis / 2;
    let offset = fastrand::u64(0..=spread.saturating_mul(2));
    Duration::from_millis(millis.saturating_sub(spread).saturating_add(offset))
}

/// Retry policy owned by the resolver.
///
/// Only throttling is retried by default; `not found` is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    /// Whether a call that exceeded its timeout is attempted again.
    pub retry_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::default(),
            retry_on_timeout: false,
        }
    }
}

impl RetryPolicy {
    pub fn exponential(max_retries: u32, base: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base,
                factor: 2.0,
                max: Duration::from_secs(30),
                jitter: false,
            },
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
