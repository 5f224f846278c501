//! Process-local request rate limiting.
//!
//! One counter per caller identity per fixed time window. Buckets are reset
//! lazily when reused after their window has passed; there is no background
//! sweep, so a multi-process deployment needs a shared store instead (see
//! DESIGN.md). The limiter is an injected service, not a global, so tests
//! get isolated instances.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Requests allowed per identity per window.
pub const DEFAULT_LIMIT: u32 = 100;

/// Window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// The verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Seconds until the window resets; positive when `allowed` is false.
    pub retry_after_secs: u64,
    /// Requests left in the current window.
    pub remaining: u32,
}

#[derive(Debug)]
struct Bucket {
    count: u32,
    reset_at_ms: u64,
}

/// Fixed-window request counter keyed by caller identity.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }

    /// The configured per-window limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `identity` and decide whether it may proceed.
    ///
    /// Increment and check happen under one lock acquisition, so concurrent
    /// requests from the same caller cannot undercount.
    pub fn check(&self, identity: &str) -> RateDecision {
        self.check_at(identity, epoch_ms())
    }

    fn check_at(&self, identity: &str, now_ms: u64) -> RateDecision {
        let window_ms = self.window.as_millis() as u64;
        let key = format!("{identity}:{}", now_ms / window_ms);

        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let bucket = buckets.entry(key).or_insert(Bucket {
            count: 0,
            reset_at_ms: now_ms + window_ms,
        });

        if now_ms > bucket.reset_at_ms {
            bucket.count = 0;
            bucket.reset_at_ms = now_ms + window_ms;
        }

        bucket.count += 1;

        if bucket.count > self.limit {
            let retry_after_secs = (bucket.reset_at_ms.saturating_sub(now_ms)).div_ceil(1000).max(1);
            RateDecision {
                allowed: false,
                retry_after_secs,
                remaining: 0,
            }
        } else {
            RateDecision {
                allowed: true,
                retry_after_secs: 0,
                remaining: self.limit - bucket.count,
            }
        }
    }
}

/// Derive the caller identity from proxy headers: forwarded-for, then
/// real-ip, then a shared "unknown" bucket.
pub fn client_identity(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = 1_000_000;

        for i in 0..5 {
            let decision = limiter.check_at("1.2.3.4", now);
            assert!(decision.allowed, "request {} should pass", i + 1);
        }

        let decision = limiter.check_at("1.2.3.4", now);
        assert!(!decision.allowed);
        assert!(decision.retry_after_secs > 0);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn identities_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = 1_000_000;

        assert!(limiter.check_at("1.2.3.4", now).allowed);
        assert!(limiter.check_at("5.6.7.8", now).allowed);
        assert!(!limiter.check_at("1.2.3.4", now).allowed);
    }

    #[test]
    fn new_window_resets_the_count() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check_at("1.2.3.4", 1_000).allowed);
        assert!(!limiter.check_at("1.2.3.4", 2_000).allowed);

        // Next window index gets a fresh bucket.
        assert!(limiter.check_at("1.2.3.4", 61_000).allowed);
    }

    #[test]
    fn retry_after_reflects_remaining_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        limiter.check_at("1.2.3.4", 0);
        let decision = limiter.check_at("1.2.3.4", 30_000);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_secs, 30);
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = 0;

        assert_eq!(limiter.check_at("a", now).remaining, 2);
        assert_eq!(limiter.check_at("a", now).remaining, 1);
        assert_eq!(limiter.check_at("a", now).remaining, 0);
    }

    #[test]
    fn identity_fallback_chain() {
        assert_eq!(client_identity(Some("1.2.3.4"), Some("5.6.7.8")), "1.2.3.4");
        assert_eq!(client_identity(None, Some("5.6.7.8")), "5.6.7.8");
        assert_eq!(client_identity(None, None), "unknown");
        assert_eq!(client_identity(Some("  "), None), "unknown");
        assert_eq!(client_identity(Some("  "), Some("5.6.7.8")), "5.6.7.8");
    }
}
