//! Cache Module
//!
//! Two independent cache tiers (in-memory and cookie-backed) sharing one
//! entry shape and one key scheme. Neither tier knows about the other; the
//! write-through policy lives in [`crate::client::ApiClient`].

mod cookie;
mod entry;
mod key;
mod memory;
mod stats;


use std::time::Duration;

// Re-export public types
pub use cookie::{CookieCache, PREFERENCE_PREFIX, SESSION_PREFIX};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{generate_key, to_params, CacheParams};
pub use memory::MemoryCache;
pub use stats::{CacheStatsReport, CookieStats, InvalidationReport, MemoryStats, TotalStats};

// == Public Constants ==
/// Maximum serialized cookie payload in bytes
pub const MAX_COOKIE_SIZE: usize = 4000;

/// Namespace prefix that marks a cookie as a cache cookie
pub const DEFAULT_COOKIE_PREFIX: &str = "jb_cache_";

// == Memory TTL ==
/// Lifetimes for the in-memory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTtl {
    /// 2 minutes
    Short,
    /// 5 minutes
    Medium,
    /// 15 minutes
    Long,
    /// 1 hour
    VeryLong,
}

impl MemoryTtl {
    pub fn duration(self) -> Duration {
        match self {
            MemoryTtl::Short => Duration::from_secs(2 * 60),
            MemoryTtl::Medium => Duration::from_secs(5 * 60),
            MemoryTtl::Long => Duration::from_secs(15 * 60),
            MemoryTtl::VeryLong => Duration::from_secs(60 * 60),
        }
    }
}

impl From<MemoryTtl> for Duration {
    fn from(ttl: MemoryTtl) -> Self {
        ttl.duration()
    }
}

// == Cookie TTL ==
/// Lifetimes for the cookie tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieTtl {
    /// 5 minutes
    Short,
    /// 30 minutes
    Medium,
    /// 2 hours
    Long,
    /// 8 hours
    Session,
    /// 30 days
    Persistent,
}

impl CookieTtl {
    pub fn duration(self) -> Duration {
        match self {
            CookieTtl::Short => Duration::from_secs(5 * 60),
            CookieTtl::Medium => Duration::from_secs(30 * 60),
            CookieTtl::Long => Duration::from_secs(2 * 60 * 60),
            CookieTtl::Session => Duration::from_secs(8 * 60 * 60),
            CookieTtl::Persistent => Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl From<CookieTtl> for Duration {
    fn from(ttl: CookieTtl) -> Self {
        ttl.duration()
    }
}
