//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from both
//! cache tiers, independent of request activity.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::CacheTiers;

/// Spawns a background task that periodically sweeps both cache tiers.
///
/// The task sleeps for `interval` between runs and holds each tier's write
/// lock only for the duration of that tier's sweep.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let client = ApiClient::from_config(&config)?;
/// let cleanup_handle = spawn_cleanup_task(client.tiers().clone(), config.cleanup_interval);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(tiers: CacheTiers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting cache cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = tiers.cleanup().await;

            if removed.total() > 0 {
                info!(
                    "Cache cleanup: removed {} memory and {} cookie entries",
                    removed.memory, removed.cookies
                );
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheParams, MAX_COOKIE_SIZE};
    use crate::storage::MemoryCookieStore;
    use serde_json::json;

    fn tiers() -> CacheTiers {
        CacheTiers::new(Box::new(MemoryCookieStore::new(MAX_COOKIE_SIZE)), "test_")
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let tiers = tiers();
        let none = CacheParams::new();

        tiers
            .memory
            .write()
            .await
            .set("/expire_soon", &none, json!(1), Duration::from_millis(50));

        let handle = spawn_cleanup_task(tiers.clone(), Duration::from_millis(100));

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(tiers.memory.read().await.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_cookies() {
        let tiers = tiers();
        let none = CacheParams::new();

        {
            let mut cookies = tiers.cookies.write().await;
            cookies.set("/expire_soon", &none, &json!(1), Duration::from_millis(50));
            cookies.set("/long_lived", &none, &json!(2), Duration::from_secs(3600));
        }

        tokio::time::sleep(Duration::from_millis(100)).await;

        let removed = tiers.cleanup().await;
        assert_eq!(removed.cookies, 1);
        assert_eq!(removed.memory, 0);
        assert_eq!(tiers.cleanup().await.cookies, 0);
        assert_eq!(tiers.cookies.read().await.keys(), vec!["/long_lived".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let tiers = tiers();
        let none = CacheParams::new();

        tiers
            .memory
            .write()
            .await
            .set("/long_lived", &none, json!("value"), Duration::from_secs(3600));
        tiers
            .cookies
            .write()
            .await
            .set("/long_lived", &none, &json!("value"), Duration::from_secs(3600));

        let handle = spawn_cleanup_task(tiers.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(
            tiers.memory.write().await.get("/long_lived", &none),
            Some(json!("value"))
        );
        assert_eq!(
            tiers.cookies.write().await.get::<String>("/long_lived", &none),
            Some("value".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(tiers(), Duration::from_secs(1));

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
