//! Signin rate limiter for preventing brute force attacks
//!
//! Failed signin attempts are counted per username inside a rolling
//! window; too many failures ban the username for a cooldown period. A
//! successful signin clears the counter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of failed attempts allowed inside the window
    pub max_failures: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct AttemptEntry {
    failures: u32,
    window_start: Instant,
    ban_expires: Option<Instant>,
}

/// Per-key signin attempt limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a signin attempt for this key may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(key) else {
            return true;
        };

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.failures = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.window_start)
            >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.window_start = now;
        }

        true
    }

    /// Record a failed signin; over the limit the key gets banned
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(AttemptEntry {
            failures: 0,
            window_start: now,
            ban_expires: None,
        });

        entry.failures += 1;
        if entry.failures >= self.config.max_failures {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned signin for {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Record a successful signin, clearing any accumulated failures
    pub async fn record_success(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_failures: 3,
            window_seconds: 300,
            ban_duration_seconds: 900,
        })
    }

    #[tokio::test]
    async fn test_bans_after_max_failures() {
        let limiter = limiter();

        for _ in 0..3 {
            assert!(limiter.is_allowed("alice").await);
            limiter.record_failure("alice").await;
        }

        assert!(!limiter.is_allowed("alice").await);
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let limiter = limiter();

        limiter.record_failure("alice").await;
        limiter.record_failure("alice").await;
        limiter.record_success("alice").await;

        for _ in 0..2 {
            assert!(limiter.is_allowed("alice").await);
            limiter.record_failure("alice").await;
        }
        assert!(limiter.is_allowed("alice").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.record_failure("alice").await;
        }

        assert!(!limiter.is_allowed("alice").await);
        assert!(limiter.is_allowed("bob").await);
    }
}
