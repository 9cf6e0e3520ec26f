//! Retry delay computation and the sleep/jitter seams

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Exponent ceiling; keeps `base * 2^n` from overflowing before the cap applies
const MAX_EXPONENT: u32 = 16;

/// Exponential backoff with proportional jitter.
///
/// The delay for attempt `n` (zero-based) is `min(cap, base * 2^n)`, then
/// reduced by up to `jitter_ratio` of itself. It never exceeds `cap` and is
/// never below `(1 - jitter_ratio)` of the un-jittered value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    /// Fraction of the delay randomized away, in `0.0..=1.0`
    pub jitter_ratio: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(30),
            jitter_ratio: 0.5,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Delay before the retry that follows `attempt`, given a jitter sample in `[0, 1]`.
    pub fn delay(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 1u32 << attempt.min(MAX_EXPONENT);
        let raw = self.base.saturating_mul(factor).min(self.cap);
        let ratio = self.jitter_ratio.clamp(0.0, 1.0);
        raw.mul_f64(1.0 - ratio * jitter.clamp(0.0, 1.0))
    }

    /// Un-jittered delay for `attempt`.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        self.delay(attempt, 0.0)
    }
}

/// Source of jitter samples in `[0, 1)`
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG jitter
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Constant jitter, for deterministic delays
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Waits between attempts. Injected so tests never sleep for real.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
