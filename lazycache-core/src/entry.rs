//! Entry handles, entry options and cache-wide defaults.
//!
//! These are inert data carriers. The contract passes them around so a real
//! cache can apply expiration and priority; a test double records them and
//! otherwise ignores them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relative priority of an entry when a real cache has to evict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CacheItemPriority {
    Low,
    #[default]
    Normal,
    High,
    NeverRemove,
}

/// Options supplied alongside `add` / `get_or_add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Absolute point in time at which the entry expires.
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Expiration relative to the moment the entry is written.
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Expire when not read for this long.
    pub sliding_expiration: Option<Duration>,
    pub priority: CacheItemPriority,
    pub size: Option<u64>,
}

impl EntryOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options expiring at an absolute point in time.
    pub fn expires_at(at: DateTime<Utc>) -> Self {
        Self::new().with_absolute_expiration(at)
    }

    /// Options with a sliding expiration window.
    pub fn sliding(window: Duration) -> Self {
        Self::new().with_sliding_expiration(window)
    }

    /// Set the absolute expiration.
    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    /// Set the expiration relative to now.
    pub fn with_expiration_relative_to_now(mut self, after: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(after);
        self
    }

    /// Set the sliding expiration.
    pub fn with_sliding_expiration(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: CacheItemPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Cache-wide defaults, exposed by the contract as its default cache policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDefaults {
    pub default_cache_duration_seconds: u64,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            default_cache_duration_seconds: 60 * 20,
        }
    }
}

impl CacheDefaults {
    /// Entry options implied by these defaults.
    pub fn build_options(&self) -> EntryOptions {
        EntryOptions::new().with_expiration_relative_to_now(Duration::from_secs(
            self.default_cache_duration_seconds,
        ))
    }
}

/// Handle passed into a `get_or_add` factory.
///
/// A real cache hands the factory its pending entry so the factory can tune
/// expiration and priority before the value is stored. Only the key is
/// meaningful here; every other field can be mutated freely and has no effect.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    key: String,
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
    pub priority: CacheItemPriority,
    pub size: Option<u64>,
}

impl CacheEntry {
    /// Placeholder handle for `key` with every other field at its default.
    pub fn placeholder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            absolute_expiration: None,
            absolute_expiration_relative_to_now: None,
            sliding_expiration: None,
            priority: CacheItemPriority::Normal,
            size: None,
        }
    }

    /// The key the factory is producing a value for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Copy the handle's settings out as options.
    pub fn options(&self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.absolute_expiration,
            absolute_expiration_relative_to_now: self.absolute_expiration_relative_to_now,
            sliding_expiration: self.sliding_expiration,
            priority: self.priority,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_carries_key_only() {
        let entry = CacheEntry::placeholder("SomethingInTheCache");
        assert_eq!(entry.key(), "SomethingInTheCache");
        assert_eq!(entry.options(), EntryOptions::default());
    }

    #[test]
    fn test_default_policy_builds_relative_expiration() {
        let options = CacheDefaults::default().build_options();
        assert_eq!(
            options.absolute_expiration_relative_to_now,
            Some(Duration::from_secs(1200))
        );
        assert!(options.absolute_expiration.is_none());
    }

    #[test]
    fn test_entry_options_builder() {
        let at = Utc::now();
        let options = EntryOptions::expires_at(at)
            .with_sliding_expiration(Duration::from_secs(30))
            .with_priority(CacheItemPriority::High)
            .with_size(4);

        assert_eq!(options.absolute_expiration, Some(at));
        assert_eq!(options.sliding_expiration, Some(Duration::from_secs(30)));
        assert_eq!(options.priority, CacheItemPriority::High);
        assert_eq!(options.size, Some(4));
    }
}
