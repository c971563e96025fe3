//! The filter table: patterns, match counters, and per-filter limiters.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use oscbridge_config::{DefaultFilter, FilterEntry};
use thiserror::Error;
use tracing::debug;

use crate::ratelimit::RateLimiter;

/// Hard cap on the number of live filters.
pub const MAX_FILTERS: usize = 100;

/// Error type for filter table mutations. All variants are operator-level
/// validation failures; none is fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A filter with this pattern already exists.
    #[error("filter '{0}' already exists")]
    Duplicate(String),
    /// The table is at [`MAX_FILTERS`].
    #[error("maximum number of filters reached ({0})")]
    TableFull(usize),
    /// No filter with this pattern.
    #[error("filter '{0}' not found")]
    NotFound(String),
}

/// One pattern rule.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Substring matched against inbound messages. Unique within the table.
    pub pattern: String,
    /// Whether the filter participates in matching.
    pub enabled: bool,
    /// Matches seen since creation or the last reset.
    pub count: u64,
    /// When the last matching message arrived.
    pub last_received: Option<SystemTime>,
    /// Action string; empty means none configured.
    pub action: String,
    /// Whether a match may dispatch the action.
    pub trigger_action: bool,
    /// The filter's own rate-limit gate.
    pub limiter: RateLimiter,
}

impl Filter {
    /// Fresh filter with the given limits and no action.
    fn new(pattern: &str, limits: (u32, u32)) -> Self {
        Self {
            pattern: pattern.to_string(),
            enabled: true,
            count: 0,
            last_received: None,
            action: String::new(),
            trigger_action: false,
            limiter: RateLimiter::with_limits(limits.0, limits.1),
        }
    }
}

/// An action approved for dispatch by a matching, rate-satisfied filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triggered {
    /// Pattern of the filter that fired.
    pub pattern: String,
    /// The action to dispatch.
    pub action: String,
}

/// Owns the set of pattern filters.
///
/// Matching is substring containment: every enabled filter whose pattern is
/// contained in the message is independently counted and independently
/// evaluated for dispatch. All mutation happens through `&mut self`; the
/// engine serializes access behind its lock.
#[derive(Debug)]
pub struct FilterRegistry {
    /// Live filters, in insertion order.
    filters: Vec<Filter>,
    /// Limits applied to newly added filters.
    default_limits: (u32, u32),
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    /// Empty registry with the built-in default limits.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            default_limits: (
                oscbridge_config::DEFAULT_RATE_LIMIT_COUNT,
                oscbridge_config::DEFAULT_RATE_LIMIT_SECONDS,
            ),
        }
    }

    /// Limits applied to newly added filters.
    pub fn default_limits(&self) -> (u32, u32) {
        self.default_limits
    }

    /// Set the limits applied to newly added filters.
    pub fn set_default_limits(&mut self, count: u32, seconds: u32) {
        self.default_limits = (count.max(1), seconds);
    }

    /// Add a new filter for `pattern`.
    pub fn add(&mut self, pattern: &str) -> Result<(), RegistryError> {
        if self.filters.len() >= MAX_FILTERS {
            return Err(RegistryError::TableFull(MAX_FILTERS));
        }
        if self.find(pattern).is_some() {
            return Err(RegistryError::Duplicate(pattern.to_string()));
        }
        self.filters.push(Filter::new(pattern, self.default_limits));
        Ok(())
    }

    /// Remove the filter for `pattern`.
    pub fn remove(&mut self, pattern: &str) -> Result<(), RegistryError> {
        let idx = self
            .position(pattern)
            .ok_or_else(|| RegistryError::NotFound(pattern.to_string()))?;
        self.filters.remove(idx);
        Ok(())
    }

    /// Remove all filters.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Zero all match counts, receipt timestamps, and execution history.
    pub fn reset_counts(&mut self) {
        for f in &mut self.filters {
            f.count = 0;
            f.last_received = None;
            f.limiter.reset();
        }
    }

    /// Enable or disable the filter for `pattern`.
    pub fn set_enabled(&mut self, pattern: &str, enabled: bool) -> Result<(), RegistryError> {
        self.find_mut(pattern)?.enabled = enabled;
        Ok(())
    }

    /// Set the action for `pattern` and arm its trigger.
    pub fn set_action(&mut self, pattern: &str, action: &str) -> Result<(), RegistryError> {
        let f = self.find_mut(pattern)?;
        f.action = action.to_string();
        f.trigger_action = true;
        Ok(())
    }

    /// Flip action triggering for `pattern`; returns the new state.
    pub fn toggle_action(&mut self, pattern: &str) -> Result<bool, RegistryError> {
        let f = self.find_mut(pattern)?;
        f.trigger_action = !f.trigger_action;
        Ok(f.trigger_action)
    }

    /// Set per-filter rate limits for `pattern`.
    pub fn set_rate(
        &mut self,
        pattern: &str,
        count: u32,
        seconds: u32,
    ) -> Result<(), RegistryError> {
        self.find_mut(pattern)?.limiter.set_limits(count, seconds);
        Ok(())
    }

    /// Reset `pattern`'s rate limits to the registry defaults.
    pub fn reset_rate(&mut self, pattern: &str) -> Result<(), RegistryError> {
        let defaults = self.default_limits;
        self.find_mut(pattern)?
            .limiter
            .set_limits(defaults.0, defaults.1);
        Ok(())
    }

    /// Install seed filters, skipping patterns already present. Returns how
    /// many were added.
    pub fn install_defaults(&mut self, seeds: &[DefaultFilter]) -> usize {
        let mut added = 0;
        for seed in seeds {
            if self.find(seed.pattern).is_some() || self.filters.len() >= MAX_FILTERS {
                continue;
            }
            let mut f = Filter::new(seed.pattern, self.default_limits);
            f.action = seed.action.to_string();
            f.trigger_action = true;
            self.filters.push(f);
            added += 1;
        }
        added
    }

    /// Look up a filter by exact pattern.
    pub fn find(&self, pattern: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.pattern == pattern)
    }

    /// Index of the filter for `pattern`.
    fn position(&self, pattern: &str) -> Option<usize> {
        self.filters.iter().position(|f| f.pattern == pattern)
    }

    /// Mutable lookup, mapping absence to [`RegistryError::NotFound`].
    fn find_mut(&mut self, pattern: &str) -> Result<&mut Filter, RegistryError> {
        self.filters
            .iter_mut()
            .find(|f| f.pattern == pattern)
            .ok_or_else(|| RegistryError::NotFound(pattern.to_string()))
    }

    /// Iterate over all filters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Number of live filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run one inbound message through the table.
    ///
    /// Every enabled filter whose pattern is a substring of `message` has
    /// its counter bumped; armed filters whose limiter approves are recorded
    /// as executed and returned for dispatch. Returns `(matched_any,
    /// approved_actions)`.
    pub fn match_message(&mut self, message: &str, now: SystemTime) -> (bool, Vec<Triggered>) {
        let mut matched = false;
        let mut triggered = Vec::new();
        for f in &mut self.filters {
            if !f.enabled || !message.contains(&f.pattern) {
                continue;
            }
            matched = true;
            f.count += 1;
            f.last_received = Some(now);
            debug!(pattern = %f.pattern, count = f.count, "filter match");

            if !f.trigger_action || f.action.is_empty() {
                continue;
            }
            // Check and record together so concurrent evaluation of the same
            // filter cannot double-fire.
            if f.limiter.can_execute(f.count, now) {
                f.limiter.record_execution(f.count, now);
                triggered.push(Triggered {
                    pattern: f.pattern.clone(),
                    action: f.action.clone(),
                });
            } else {
                debug!(
                    pattern = %f.pattern,
                    limits = %f.limiter.display_compact(),
                    "action rate limited"
                );
            }
        }
        (matched, triggered)
    }

    /// Persisted form of the table.
    pub fn to_entries(&self) -> Vec<FilterEntry> {
        self.filters
            .iter()
            .map(|f| {
                let (count, seconds) = f.limiter.limits();
                let (last_count, last_secs) = f.limiter.execution_snapshot();
                FilterEntry {
                    pattern: f.pattern.clone(),
                    enabled: f.enabled,
                    trigger_action: f.trigger_action,
                    action: f.action.clone(),
                    last_execution_count: last_count,
                    last_execution_time: last_secs,
                    rate_limit_count: count,
                    rate_limit_seconds: seconds,
                }
            })
            .collect()
    }

    /// Rebuild the table from persisted entries. Match counts and receipt
    /// timestamps always start over; execution bookkeeping is restored.
    pub fn load_entries(&mut self, entries: &[FilterEntry]) {
        self.filters.clear();
        for entry in entries {
            if entry.pattern.is_empty() || self.filters.len() >= MAX_FILTERS {
                continue;
            }
            if self.find(&entry.pattern).is_some() {
                continue;
            }
            let mut f = Filter::new(
                &entry.pattern,
                (entry.rate_limit_count, entry.rate_limit_seconds),
            );
            f.enabled = entry.enabled;
            f.trigger_action = entry.trigger_action;
            f.action = entry.action.clone();
            f.limiter
                .restore_execution(entry.last_execution_count, entry.last_execution_time);
            self.filters.push(f);
        }
    }
}

/// Seconds since the Unix epoch for display code; 0 when `time` is `None`.
pub fn unix_seconds(time: Option<SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Duration since `time`, for "last seen Ns ago" display.
pub fn seconds_ago(time: Option<SystemTime>, now: SystemTime) -> Option<u64> {
    time.map(|t| now.duration_since(t).unwrap_or(Duration::ZERO).as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_000_000)
    }

    #[test]
    fn add_remove_and_duplicates() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        assert_eq!(
            reg.add("foo"),
            Err(RegistryError::Duplicate("foo".to_string()))
        );
        reg.remove("foo").expect("remove");
        assert_eq!(
            reg.remove("foo"),
            Err(RegistryError::NotFound("foo".to_string()))
        );
    }

    #[test]
    fn table_full_is_reported() {
        let mut reg = FilterRegistry::new();
        for i in 0..MAX_FILTERS {
            reg.add(&format!("pattern-{i}")).expect("add");
        }
        assert_eq!(reg.add("one-more"), Err(RegistryError::TableFull(MAX_FILTERS)));
    }

    #[test]
    fn counts_are_monotonic_and_per_filter() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.add("bar").expect("add");

        reg.match_message("xx foo yy", now());
        reg.match_message("foo bar", now());
        reg.match_message("bar only", now());

        assert_eq!(reg.find("foo").unwrap().count, 2);
        assert_eq!(reg.find("bar").unwrap().count, 2);
    }

    #[test]
    fn substring_containment_not_exact_match() {
        let mut reg = FilterRegistry::new();
        reg.add("/avatar/parameters/MediaPlay").expect("add");
        let (matched, _) = reg.match_message("/avatar/parameters/MediaPlay 1.0", now());
        assert!(matched);
        let (matched, _) = reg.match_message("/avatar/parameters/Media", now());
        assert!(!matched);
    }

    #[test]
    fn disabled_filters_do_not_match() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.set_enabled("foo", false).expect("disable");
        let (matched, _) = reg.match_message("foo", now());
        assert!(!matched);
        assert_eq!(reg.find("foo").unwrap().count, 0);
    }

    #[test]
    fn one_message_can_trigger_multiple_filters() {
        let mut reg = FilterRegistry::new();
        for p in ["foo", "bar"] {
            reg.add(p).expect("add");
            reg.set_action(p, "@media-play").expect("action");
            reg.set_rate(p, 1, 0).expect("rate");
        }
        let (_, triggered) = reg.match_message("foo bar", now());
        let patterns: Vec<&str> = triggered.iter().map(|t| t.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["foo", "bar"]);
    }

    #[test]
    fn rate_limit_gates_dispatch() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.set_action("foo", "@media-play").expect("action");

        // Default 2c/1s: first match (delta 1) is suppressed, second fires.
        let (_, t1) = reg.match_message("foo", now());
        assert!(t1.is_empty());
        let (_, t2) = reg.match_message("foo", now());
        assert_eq!(t2.len(), 1);
        // Delta is 1 again right after the recorded execution.
        let (_, t3) = reg.match_message("foo", now());
        assert!(t3.is_empty());
    }

    #[test]
    fn unarmed_or_empty_actions_never_dispatch() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.set_rate("foo", 1, 0).expect("rate");
        let (_, triggered) = reg.match_message("foo", now());
        assert!(triggered.is_empty());

        reg.set_action("foo", "@media-play").expect("action");
        reg.toggle_action("foo").expect("toggle off");
        let (_, triggered) = reg.match_message("foo", now());
        assert!(triggered.is_empty());
    }

    #[test]
    fn reset_counts_clears_everything() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.set_action("foo", "x").expect("action");
        reg.set_rate("foo", 1, 0).expect("rate");
        reg.match_message("foo", now());
        reg.reset_counts();
        let f = reg.find("foo").unwrap();
        assert_eq!(f.count, 0);
        assert!(f.last_received.is_none());
        assert_eq!(f.limiter.execution_snapshot(), (0, 0));
    }

    #[test]
    fn install_defaults_skips_existing() {
        let mut reg = FilterRegistry::new();
        reg.add(oscbridge_config::DEFAULT_FILTERS[0].pattern)
            .expect("add");
        let added = reg.install_defaults(oscbridge_config::DEFAULT_FILTERS);
        assert_eq!(added, oscbridge_config::DEFAULT_FILTERS.len() - 1);
        // Seeded filters arrive armed.
        let seeded = reg
            .find(oscbridge_config::DEFAULT_FILTERS[1].pattern)
            .unwrap();
        assert!(seeded.trigger_action);
        assert_eq!(seeded.action, oscbridge_config::DEFAULT_FILTERS[1].action);
    }

    #[test]
    fn entries_round_trip_resets_counts() {
        let mut reg = FilterRegistry::new();
        reg.add("foo").expect("add");
        reg.set_action("foo", "@key:a").expect("action");
        reg.set_rate("foo", 1, 0).expect("rate");
        reg.match_message("foo", now());
        assert_eq!(reg.find("foo").unwrap().count, 1);

        let entries = reg.to_entries();
        let mut restored = FilterRegistry::new();
        restored.load_entries(&entries);
        let f = restored.find("foo").unwrap();
        assert_eq!(f.action, "@key:a");
        assert!(f.trigger_action);
        assert!(f.enabled);
        assert_eq!(f.limiter.limits(), (1, 0));
        // Live counters do not survive persistence.
        assert_eq!(f.count, 0);
        assert!(f.last_received.is_none());
        // Execution bookkeeping does.
        assert_eq!(
            f.limiter.execution_snapshot(),
            reg.find("foo").unwrap().limiter.execution_snapshot()
        );
    }
}
