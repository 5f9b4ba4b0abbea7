//! Job Board Cache - client-side response caching for the job board API
//!
//! Provides an HTTP client with a two-tier cache (in-memory and cookie-backed),
//! TTL expiration, request deduplication and pattern-based invalidation.

pub mod cache;
pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod http;
pub mod storage;
pub mod tasks;

pub use cache::{CookieTtl, MemoryTtl};
pub use client::{ApiClient, CacheOptions, CacheTiers};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use tasks::spawn_cleanup_task;
