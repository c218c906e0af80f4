//! Command rate limiting.
//!
//! JLIP decks drop or garble commands that arrive faster than they can
//! process them. Every exchange therefore passes through a [`RateLimiter`]
//! before the frame is written. Limiters only delay; they never drop or fail
//! a command.
//!
//! Slots are spaced evenly: a limiter admitting `n` commands per `period`
//! hands out one slot every `period / n`. Any half-open window of length
//! `period` therefore contains at most `n` admissions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use jlip_core::{Error, Result};

/// Commands per second admitted by the normal limiter.
pub const NORMAL_COMMANDS_PER_SECOND: u32 = 2;

/// Commands per second admitted by the fast (polling) limiter.
pub const FAST_COMMANDS_PER_SECOND: u32 = 10;

/// Which limiter an exchange is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Speed {
    /// General commands: 2 per second.
    #[default]
    Normal,
    /// High-frequency polling such as VTR mode queries: 10 per second.
    Fast,
}

/// An evenly spaced admission gate.
///
/// Share one instance (through an `Arc`) between every link that drives
/// the same physical bus; the bus, not the link, is what has a bandwidth
/// budget.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Admit at most `count` commands per `period`.
    ///
    /// Fails with [`Error::InvalidArgument`] if `count` is zero or
    /// `period` is zero.
    pub fn new(count: u32, period: Duration) -> Result<Self> {
        if count == 0 || period.is_zero() {
            return Err(Error::InvalidArgument(format!(
                "rate limit of {count} per {period:?} admits nothing"
            )));
        }
        Ok(RateLimiter {
            interval: period / count,
            next_slot: Mutex::new(None),
        })
    }

    /// Admit at most `count` commands per second.
    pub fn per_second(count: u32) -> Result<Self> {
        Self::new(count, Duration::from_secs(1))
    }

    /// Minimum spacing between two admissions.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a slot is available, then take it.
    ///
    /// Slots are reserved in call order, so concurrent callers are admitted
    /// first come, first served.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };

        if slot > Instant::now() {
            tracing::trace!(
                delay_ms = (slot - Instant::now()).as_millis() as u64,
                "rate limited"
            );
            tokio::time::sleep_until(slot).await;
        }
    }
}

/// The pair of limiters a link charges its exchanges against.
#[derive(Debug, Clone)]
pub struct Limiters {
    pub normal: Arc<RateLimiter>,
    pub fast: Arc<RateLimiter>,
}

impl Limiters {
    /// Build a pair from explicit instances.
    pub fn new(normal: Arc<RateLimiter>, fast: Arc<RateLimiter>) -> Self {
        Limiters { normal, fast }
    }

    /// The limiter for `speed`.
    pub fn for_speed(&self, speed: Speed) -> &RateLimiter {
        match speed {
            Speed::Normal => &self.normal,
            Speed::Fast => &self.fast,
        }
    }
}

impl Default for Limiters {
    fn default() -> Self {
        let normal = RateLimiter {
            interval: Duration::from_secs(1) / NORMAL_COMMANDS_PER_SECOND,
            next_slot: Mutex::new(None),
        };
        let fast = RateLimiter {
            interval: Duration::from_secs(1) / FAST_COMMANDS_PER_SECOND,
            next_slot: Mutex::new(None),
        };
        Limiters::new(Arc::new(normal), Arc::new(fast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            RateLimiter::per_second(0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            RateLimiter::new(1, Duration::ZERO),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn default_intervals() {
        let limiters = Limiters::default();
        assert_eq!(limiters.normal.interval(), Duration::from_millis(500));
        assert_eq!(limiters.fast.interval(), Duration::from_millis(100));
        assert_eq!(
            limiters.for_speed(Speed::Fast).interval(),
            Duration::from_millis(100)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::per_second(2).unwrap();
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn twenty_normal_commands_take_at_least_nine_seconds() {
        let limiters = Limiters::default();
        let start = Instant::now();
        for _ in 0..20 {
            limiters.for_speed(Speed::Normal).acquire().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(9), "took {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn twenty_fast_commands_take_at_least_1900ms() {
        let limiters = Limiters::default();
        let start = Instant::now();
        for _ in 0..20 {
            limiters.for_speed(Speed::Fast).acquire().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1900), "took {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn limiters_are_independent() {
        let limiters = Limiters::default();
        limiters.normal.acquire().await;
        let start = Instant::now();
        limiters.fast.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_is_not_banked() {
        let limiter = RateLimiter::per_second(2).unwrap();
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        // A long idle period grants one immediate slot, not a burst.
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "took {elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn shared_limiter_spaces_concurrent_callers() {
        let limiter = Arc::new(RateLimiter::per_second(10).unwrap());
        let start = Instant::now();
        let mut tasks = Vec::new();
        for _ in 0..5 {
            let limiter = Arc::clone(&limiter);
            tasks.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(400), "took {elapsed:?}");
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    }
}
