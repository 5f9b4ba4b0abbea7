//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the client is alive.
//!
//! # Tasks
//! - Cache Cleanup: Removes expired entries from both cache tiers

mod cleanup;

pub use cleanup::spawn_cleanup_task;
