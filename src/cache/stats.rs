//! Cache Statistics Module
//!
//! Diagnostic snapshots for both tiers. Validity counts are computed by
//! scanning at call time, never cached.

use serde::Serialize;

// == Memory Stats ==
/// Snapshot of the in-memory tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    /// Entries currently stored, valid or not
    pub total: usize,
    /// Entries still within their TTL
    pub valid: usize,
    /// Entries past their TTL but not yet swept
    pub expired: usize,
    /// Network fetches currently in flight
    pub pending: usize,
    /// Lookups that returned data
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
}

impl MemoryStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cookie Stats ==
/// Snapshot of the cookie tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CookieStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    /// Sum of stored cookie value lengths in bytes
    pub total_bytes: usize,
}

// == Combined Report ==
/// Totals across both tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalStats {
    pub entries: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Stats for both tiers as reported by `ApiClient::cache_stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStatsReport {
    pub memory: MemoryStats,
    pub cookies: CookieStats,
    pub total: TotalStats,
}

impl CacheStatsReport {
    pub fn new(memory: MemoryStats, cookies: CookieStats) -> Self {
        let total = TotalStats {
            entries: memory.total + cookies.total,
            valid: memory.valid + cookies.valid,
            expired: memory.expired + cookies.expired,
        };
        Self {
            memory,
            cookies,
            total,
        }
    }
}

/// Entries removed from each tier by a pattern invalidation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub memory: usize,
    pub cookies: usize,
}

impl InvalidationReport {
    pub fn total(&self) -> usize {
        self.memory + self.cookies
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = MemoryStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = MemoryStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_report_totals() {
        let memory = MemoryStats {
            total: 3,
            valid: 2,
            expired: 1,
            ..Default::default()
        };
        let cookies = CookieStats {
            total: 2,
            valid: 2,
            expired: 0,
            total_bytes: 120,
        };

        let report = CacheStatsReport::new(memory, cookies);
        assert_eq!(report.total.entries, 5);
        assert_eq!(report.total.valid, 4);
        assert_eq!(report.total.expired, 1);
    }

    #[test]
    fn test_invalidation_total() {
        let report = InvalidationReport {
            memory: 2,
            cookies: 1,
        };
        assert_eq!(report.total(), 3);
    }
}
