// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A reconfigurable token bucket rate limiter.
///
/// The bucket starts full. Credits are replenished continuously at `credits_per_second`
/// and never exceed `max_balance`, which bounds the size of a burst.
pub struct RateLimiter {
    inner: Mutex<RateLimiterState>,
}

/// The internal state of the rate limiter
struct RateLimiterState {
    /// Replenish rate
    credits_per_second: f64,

    /// Credits currently available
    balance: f64,

    /// Maximum number of credits that can be stored
    max_balance: f64,

    /// Last time credits were replenished
    last_tick: Instant,
}

impl RateLimiterState {
    /// Replenish credits based on elapsed time
    fn replenish(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.balance = (self.balance + elapsed.as_secs_f64() * self.credits_per_second)
            .min(self.max_balance);
        self.last_tick = now;
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("RateLimiter")
            .field("credits_per_second", &state.credits_per_second)
            .field("max_balance", &state.max_balance)
            .field("balance", &state.balance)
            .finish()
    }
}

impl RateLimiter {
    /// Creates a new RateLimiter.
    ///
    /// # Parameters
    /// * `credits_per_second` - rate at which credits are replenished
    /// * `max_balance` - maximum number of credits the bucket can hold, the bucket starts full
    pub fn new(credits_per_second: f64, max_balance: f64) -> Self {
        Self::new_at(credits_per_second, max_balance, Instant::now())
    }

    pub(crate) fn new_at(credits_per_second: f64, max_balance: f64, now: Instant) -> Self {
        let credits_per_second = credits_per_second.max(0.0);
        let max_balance = max_balance.max(0.0);
        RateLimiter {
            inner: Mutex::new(RateLimiterState {
                credits_per_second,
                balance: max_balance,
                max_balance,
                last_tick: now,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RateLimiterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consumes `cost` credits if they are available.
    ///
    /// # Returns
    /// `true` if the request is allowed, `false` otherwise
    pub fn check_credit(&self, cost: f64) -> bool {
        self.check_credit_at(cost, Instant::now())
    }

    pub(crate) fn check_credit_at(&self, cost: f64, now: Instant) -> bool {
        let mut state = self.lock();
        // Try to consume first, only replenish when the bucket looks empty
        if state.balance < cost {
            state.replenish(now);
        }
        if state.balance >= cost {
            state.balance -= cost;
            true
        } else {
            false
        }
    }

    /// Changes the rate and burst size of the limiter.
    ///
    /// The current balance is rescaled by `max_balance / previous max_balance` so that a
    /// partially consumed bucket stays partially consumed.
    pub fn update(&self, credits_per_second: f64, max_balance: f64) {
        self.update_at(credits_per_second, max_balance, Instant::now())
    }

    pub(crate) fn update_at(&self, credits_per_second: f64, max_balance: f64, now: Instant) {
        let mut state = self.lock();
        state.replenish(now);
        let max_balance = max_balance.max(0.0);
        state.balance = if state.max_balance > 0.0 {
            state.balance * max_balance / state.max_balance
        } else {
            state.balance.min(max_balance)
        };
        state.credits_per_second = credits_per_second.max(0.0);
        state.max_balance = max_balance;
    }

    pub fn credits_per_second(&self) -> f64 {
        self.lock().credits_per_second
    }

    pub fn max_balance(&self) -> f64 {
        self.lock().max_balance
    }

    /// Credits available right now, without replenishing
    pub fn balance(&self) -> f64 {
        self.lock().balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_rate_limiter_block_all() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(0.0, 0.0, start);

        for i in 0..10 {
            assert!(!limiter.check_credit_at(1.0, start + Duration::from_secs(i)));
        }
    }

    #[test]
    fn test_rate_limiter_limit_rate() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(2.0, 2.0, start);

        // The bucket starts full
        assert!(limiter.check_credit_at(1.0, start));
        assert!(limiter.check_credit_at(1.0, start));
        assert!(!limiter.check_credit_at(1.0, start));

        // 0.25s * 2 credits/s = 0.5 credit, not enough
        assert!(!limiter.check_credit_at(1.0, start + Duration::from_millis(250)));
        // another 0.25s tops it up to one credit
        assert!(limiter.check_credit_at(1.0, start + Duration::from_millis(500)));
        assert!(!limiter.check_credit_at(1.0, start + Duration::from_millis(500)));
    }

    #[test]
    fn test_rate_limiter_caps_balance() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(10.0, 3.0, start);
        for _ in 0..3 {
            assert!(limiter.check_credit_at(1.0, start));
        }

        // A long idle period never accumulates more than max_balance
        let later = start + Duration::from_secs(60);
        for _ in 0..3 {
            assert!(limiter.check_credit_at(1.0, later));
        }
        assert!(!limiter.check_credit_at(1.0, later));
    }

    #[test]
    fn test_rate_limiter_fractional_rate() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(0.1, 1.0, start);
        assert!(limiter.check_credit_at(1.0, start));
        assert!(!limiter.check_credit_at(1.0, start + Duration::from_secs(5)));
        assert!(limiter.check_credit_at(1.0, start + Duration::from_secs(10)));
    }

    #[test]
    fn test_rate_limiter_update_rescales_balance() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(2.0, 2.0, start);
        assert!(limiter.check_credit_at(1.0, start));
        assert_eq!(limiter.balance(), 1.0);

        // half full bucket stays half full
        limiter.update_at(4.0, 4.0, start);
        assert_eq!(limiter.balance(), 2.0);
        assert_eq!(limiter.credits_per_second(), 4.0);
        assert_eq!(limiter.max_balance(), 4.0);

        limiter.update_at(1.0, 1.0, start);
        assert_eq!(limiter.balance(), 0.5);
        assert!(!limiter.check_credit_at(1.0, start));
        assert!(limiter.check_credit_at(1.0, start + Duration::from_millis(500)));
    }

    #[test]
    fn test_rate_limiter_update_from_empty_bucket() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(0.0, 0.0, start);
        limiter.update_at(1.0, 1.0, start);
        assert!(!limiter.check_credit_at(1.0, start));
        assert!(limiter.check_credit_at(1.0, start + Duration::from_secs(1)));
    }

    #[test]
    fn test_rate_limiter_thread_safety() {
        // No replenishment during the test
        let limiter = Arc::new(RateLimiter::new(0.0, 100.0));
        let limiter_clone = limiter.clone();

        let handle = thread::spawn(move || {
            (0..100).filter(|_| limiter_clone.check_credit(1.0)).count()
        });
        let main_allowed_count = (0..100).filter(|_| limiter.check_credit(1.0)).count();
        let thread_allowed_count = handle.join().unwrap();

        assert_eq!(main_allowed_count + thread_allowed_count, 100);
    }

    #[test]
    fn check_debug_impl() {
        let limiter = RateLimiter::new(5.0, 5.0);
        let debug_output = format!("{:?}", limiter);
        assert!(debug_output.contains("RateLimiter"));
        assert!(debug_output.contains("credits_per_second: 5.0"));
    }
}
