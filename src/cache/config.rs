//! Cache configuration.
//!
//! Controls the entity-list store via the `[cache]` section of `holocron.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

// Default values for cache configuration
const DEFAULT_ENTRY_TTL_SECS: u64 = 2 * 60 * 60;
const DEFAULT_INVALIDATION_TTL_SECS: u64 = 1;
const DEFAULT_MAX_ENTRIES: usize = 256;

/// Where cached entity lists live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process LRU map with per-entry deadlines.
    Memory,
    /// Shared Redis instance.
    Redis { url: String },
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Lifetime of a freshly written entity list.
    pub entry_ttl: Duration,
    /// Remaining lifetime forced onto the movie list after a comment is written.
    pub invalidation_ttl: Duration,
    /// Upper bound on in-process entries.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            entry_ttl: Duration::from_secs(DEFAULT_ENTRY_TTL_SECS),
            invalidation_ttl: Duration::from_secs(DEFAULT_INVALIDATION_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend.clone(),
            entry_ttl: settings.entry_ttl,
            invalidation_ttl: settings.invalidation_ttl,
            max_entries: settings.max_entries.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.entry_ttl, Duration::from_secs(7200));
        assert_eq!(config.invalidation_ttl, Duration::from_secs(1));
        assert_eq!(config.max_entries, 256);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(config.max_entries_non_zero().get(), 1);
    }
}
