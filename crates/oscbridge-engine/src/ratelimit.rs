//! Per-filter dual-threshold rate limiting.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oscbridge_config::{DEFAULT_RATE_LIMIT_COUNT, DEFAULT_RATE_LIMIT_SECONDS};
use tracing::warn;

/// Gate requiring both a minimum match-count delta and a minimum elapsed
/// time since the last recorded execution.
///
/// A limiter configured to `count <= 1` and `seconds == 0` is an explicit
/// opt-out and permits every call. Callers must treat [`Self::can_execute`]
/// followed by [`Self::record_execution`] as one atomic unit per filter;
/// the registry does both while holding its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    /// Minimum count delta required between executions.
    required_count: u32,
    /// Minimum seconds required between executions.
    required_seconds: u32,
    /// Match count at the last execution.
    last_execution_count: u64,
    /// Wall-clock time of the last execution; `None` means never.
    last_execution_time: Option<SystemTime>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Limiter with the default thresholds.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_RATE_LIMIT_COUNT, DEFAULT_RATE_LIMIT_SECONDS)
    }

    /// Limiter with explicit thresholds. A zero count is coerced to the
    /// default with a warning.
    pub fn with_limits(count: u32, seconds: u32) -> Self {
        let mut limiter = Self {
            required_count: DEFAULT_RATE_LIMIT_COUNT,
            required_seconds: DEFAULT_RATE_LIMIT_SECONDS,
            last_execution_count: 0,
            last_execution_time: None,
        };
        limiter.set_limits(count, seconds);
        limiter
    }

    /// Whether an action may execute at `current_count` matches and time
    /// `now`.
    pub fn can_execute(&self, current_count: u64, now: SystemTime) -> bool {
        // Explicit no-limiting escape valve for latency-sensitive toggles.
        if self.required_count <= 1 && self.required_seconds == 0 {
            return true;
        }

        let count_delta = current_count.saturating_sub(self.last_execution_count);
        let count_ok = count_delta >= u64::from(self.required_count);

        let time_ok = match self.last_execution_time {
            None => true,
            Some(last) => {
                let elapsed = now.duration_since(last).unwrap_or(Duration::ZERO);
                elapsed.as_secs() >= u64::from(self.required_seconds)
            }
        };

        count_ok && time_ok
    }

    /// Record that an action executed at `current_count` matches.
    pub fn record_execution(&mut self, current_count: u64, now: SystemTime) {
        self.last_execution_count = current_count;
        self.last_execution_time = Some(now);
    }

    /// Forget all execution history.
    pub fn reset(&mut self) {
        self.last_execution_count = 0;
        self.last_execution_time = None;
    }

    /// Change the thresholds. A zero count is coerced to the default with a
    /// warning; seconds are unsigned, so the zero floor holds by type.
    pub fn set_limits(&mut self, count: u32, seconds: u32) {
        if count < 1 {
            warn!(
                "rate limit count must be at least 1, using default ({})",
                DEFAULT_RATE_LIMIT_COUNT
            );
            self.required_count = DEFAULT_RATE_LIMIT_COUNT;
        } else {
            self.required_count = count;
        }
        self.required_seconds = seconds;
    }

    /// Current `(count, seconds)` thresholds.
    pub fn limits(&self) -> (u32, u32) {
        (self.required_count, self.required_seconds)
    }

    /// Whether the thresholds equal the defaults.
    pub fn is_default(&self) -> bool {
        self.required_count == DEFAULT_RATE_LIMIT_COUNT
            && self.required_seconds == DEFAULT_RATE_LIMIT_SECONDS
    }

    /// Last execution bookkeeping as `(count, unix_seconds)`; 0 seconds
    /// means never. This is the persisted form.
    pub fn execution_snapshot(&self) -> (u64, u64) {
        let secs = self
            .last_execution_time
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        (self.last_execution_count, secs)
    }

    /// Restore persisted execution bookkeeping; 0 seconds means never.
    pub fn restore_execution(&mut self, count: u64, unix_seconds: u64) {
        self.last_execution_count = count;
        self.last_execution_time = if unix_seconds == 0 {
            None
        } else {
            Some(UNIX_EPOCH + Duration::from_secs(unix_seconds))
        };
    }

    /// Compact display form, e.g. `2c/1s`.
    pub fn display_compact(&self) -> String {
        format!("{}c/{}s", self.required_count, self.required_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn both_thresholds_required() {
        let mut limiter = RateLimiter::with_limits(2, 1);
        let now = at(1000);

        // One count of delta: denied no matter how often we ask.
        assert!(!limiter.can_execute(1, now));
        assert!(!limiter.can_execute(1, now));

        // Two counts, no prior execution: first fire permitted exactly once.
        assert!(limiter.can_execute(2, now));
        limiter.record_execution(2, now);
        assert!(!limiter.can_execute(3, now));

        // Count satisfied but time not yet elapsed.
        assert!(!limiter.can_execute(4, now));
        // Both satisfied.
        assert!(limiter.can_execute(4, at(1001)));
    }

    #[test]
    fn first_execution_never_time_blocked() {
        let limiter = RateLimiter::with_limits(1, 3600);
        assert!(limiter.can_execute(1, at(0)));
    }

    #[test]
    fn escape_valve_always_permits() {
        let mut limiter = RateLimiter::with_limits(1, 0);
        let now = at(42);
        for _ in 0..5 {
            assert!(limiter.can_execute(1, now));
            limiter.record_execution(1, now);
        }
    }

    #[test]
    fn zero_count_coerced_to_default() {
        let limiter = RateLimiter::with_limits(0, 5);
        assert_eq!(limiter.limits(), (DEFAULT_RATE_LIMIT_COUNT, 5));
    }

    #[test]
    fn reset_clears_history() {
        let mut limiter = RateLimiter::with_limits(2, 1);
        limiter.record_execution(10, at(500));
        limiter.reset();
        assert_eq!(limiter.execution_snapshot(), (0, 0));
        // After reset the next fire needs only the count threshold again.
        assert!(limiter.can_execute(2, at(500)));
    }

    #[test]
    fn execution_snapshot_round_trip() {
        let mut limiter = RateLimiter::new();
        limiter.record_execution(7, at(1234));
        let (count, secs) = limiter.execution_snapshot();
        let mut restored = RateLimiter::new();
        restored.restore_execution(count, secs);
        assert_eq!(restored, limiter);
    }

    #[test]
    fn compact_display() {
        assert_eq!(RateLimiter::with_limits(2, 1).display_compact(), "2c/1s");
        assert!(RateLimiter::new().is_default());
        assert!(!RateLimiter::with_limits(3, 1).is_default());
    }
}
