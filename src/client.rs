//! Cached-fetch orchestration.
//!
//! [`ApiClient`] composes the memory tier, the cookie tier, the request
//! deduplicator and the HTTP client. It owns the write-through policy: a
//! fresh network result goes to the memory tier always and to the cookie
//! tier when the call opts in. Failed fetches are never cached.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{
    generate_key, to_params, CacheParams, CacheStatsReport, CookieCache, CookieTtl,
    InvalidationReport, MemoryCache, MemoryTtl,
};
use crate::config::ClientConfig;
use crate::dedup::RequestDeduplicator;
use crate::error::{ApiError, Result};
use crate::http::{
    ApiResponse, FileTokenStore, HttpClient, MemoryTokenStore, RequestBody, RequestOptions,
    TokenStore,
};
use crate::storage::{CookieStore, FileCookieStore, MemoryCookieStore};

/// Cookie tier over whichever store the client was built with.
pub type SharedCookieCache = Arc<RwLock<CookieCache<Box<dyn CookieStore>>>>;

// == Cache Options ==
/// Per-call cache policy for [`ApiClient::get_cached`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub params: CacheParams,
    /// `false` sends the request straight to the network
    pub use_cache: bool,
    /// Memory-tier lifetime
    pub cache_ttl: Duration,
    /// Whether the cookie tier is consulted and populated
    pub use_cookies: bool,
    /// Cookie-tier lifetime
    pub cookie_ttl: Duration,
    pub headers: Vec<(String, String)>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            params: CacheParams::new(),
            use_cache: true,
            cache_ttl: MemoryTtl::Medium.duration(),
            use_cookies: false,
            cookie_ttl: CookieTtl::Medium.duration(),
            headers: Vec::new(),
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for per-user data: session-length cookie, long memory TTL.
    pub fn user_data() -> Self {
        Self::new().with_user_data_policy()
    }

    /// Preset for preferences: persistent cookie, very long memory TTL.
    pub fn preferences() -> Self {
        Self::new().with_preferences_policy()
    }

    pub fn with_user_data_policy(self) -> Self {
        self.with_cookies(CookieTtl::Session)
            .with_cache_ttl(MemoryTtl::Long)
    }

    pub fn with_preferences_policy(self) -> Self {
        self.with_cookies(CookieTtl::Persistent)
            .with_cache_ttl(MemoryTtl::VeryLong)
    }

    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        self.params = to_params(params);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: impl Into<Duration>) -> Self {
        self.cache_ttl = ttl.into();
        self
    }

    /// Opts into the cookie tier with the given lifetime.
    pub fn with_cookies(mut self, ttl: impl Into<Duration>) -> Self {
        self.use_cookies = true;
        self.cookie_ttl = ttl.into();
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn request_options(&self) -> RequestOptions {
        RequestOptions {
            params: self.params.clone(),
            headers: self.headers.clone(),
        }
    }
}

// == Cache Tiers ==
/// Handles to both cache tiers, shared with the background sweep.
#[derive(Clone)]
pub struct CacheTiers {
    pub memory: Arc<RwLock<MemoryCache>>,
    pub cookies: SharedCookieCache,
}

impl CacheTiers {
    pub fn new(cookie_store: Box<dyn CookieStore>, cookie_prefix: &str) -> Self {
        Self {
            memory: Arc::new(RwLock::new(MemoryCache::new())),
            cookies: Arc::new(RwLock::new(CookieCache::new(cookie_store, cookie_prefix))),
        }
    }

    /// Evicts expired entries from both tiers.
    pub async fn cleanup(&self) -> InvalidationReport {
        let memory = self.memory.write().await.cleanup();
        let cookies = self.cookies.write().await.cleanup();
        InvalidationReport { memory, cookies }
    }
}

// == Api Client ==
/// Public surface used by the application layer.
///
/// Cheap to clone; clones share tiers, pending requests and the token store.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    tiers: CacheTiers,
    dedup: Arc<RequestDeduplicator>,
}

impl ApiClient {
    pub fn new(http: HttpClient, cookie_store: Box<dyn CookieStore>, cookie_prefix: &str) -> Self {
        Self {
            http,
            tiers: CacheTiers::new(cookie_store, cookie_prefix),
            dedup: Arc::new(RequestDeduplicator::new()),
        }
    }

    /// Builds a client with file-backed stores where the configuration names
    /// a path, in-memory stores otherwise.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> = match &config.token_path {
            Some(path) => Arc::new(FileTokenStore::open(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };

        let cookie_store: Box<dyn CookieStore> = match &config.cookie_store_path {
            Some(path) => Box::new(
                FileCookieStore::open(path, config.cookie_max_size)
                    .map_err(|e| ApiError::Config(format!("cookie store unavailable: {}", e)))?,
            ),
            None => Box::new(MemoryCookieStore::new(config.cookie_max_size)),
        };

        let http = HttpClient::new(config, tokens)?;
        Ok(Self::new(http, cookie_store, &config.cookie_prefix))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn tiers(&self) -> &CacheTiers {
        &self.tiers
    }

    // == Uncached Verbs ==
    pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<ApiResponse> {
        self.http.get(url, options).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.http.post(url, body, options).await
    }

    pub async fn put(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.http.put(url, body, options).await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.http.patch(url, body, options).await
    }

    pub async fn delete(&self, url: &str, options: &RequestOptions) -> Result<ApiResponse> {
        self.http.delete(url, options).await
    }

    // == Cached Fetch ==
    /// Cached GET decoded into the caller's type.
    pub async fn get_cached<T: DeserializeOwned>(
        &self,
        url: &str,
        options: CacheOptions,
    ) -> Result<T> {
        let data = self.get_cached_value(url, options).await?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse {
            status: 200,
            message: e.to_string(),
        })
    }

    /// Cached GET returning the raw JSON payload.
    ///
    /// Lookup order: memory tier, cookie tier (when enabled, promoting hits
    /// into memory), then one deduplicated network fetch per key.
    pub async fn get_cached_value(&self, url: &str, options: CacheOptions) -> Result<Value> {
        if !options.use_cache {
            return self
                .http
                .get(url, &options.request_options())
                .await
                .map(|response| response.data);
        }

        let key = generate_key(url, &options.params);

        let memory_hit = self.tiers.memory.write().await.get_key(&key);
        if let Some(data) = memory_hit {
            debug!("Memory cache hit: {}", key);
            return Ok(data);
        }

        if options.use_cookies {
            let cookie_hit = self.tiers.cookies.write().await.get_key::<Value>(&key);
            if let Some(data) = cookie_hit {
                debug!("Cookie cache hit: {}, promoting to memory", key);
                self.tiers
                    .memory
                    .write()
                    .await
                    .set_key(key, data.clone(), options.cache_ttl);
                return Ok(data);
            }
        }

        debug!("Cache miss: {}", key);
        let fetch = {
            let http = self.http.clone();
            let tiers = self.tiers.clone();
            let url = url.to_string();
            let key = key.clone();
            move || async move {
                let request = options.request_options();
                let response = http.get(&url, &request).await?;

                // Written once per network call, not once per waiter
                tiers
                    .memory
                    .write()
                    .await
                    .set_key(key.clone(), response.data.clone(), options.cache_ttl);
                if options.use_cookies {
                    tiers
                        .cookies
                        .write()
                        .await
                        .set_key(&key, &response.data, options.cookie_ttl);
                }
                Ok(response.data)
            }
        };

        let memory = &self.tiers.memory;
        let recheck_key = key.as_str();
        let cached = move || async move { memory.read().await.peek_key(recheck_key) };

        self.dedup
            .deduplicate_unless_cached(&key, cached, fetch)
            .await
    }

    /// [`get_cached`](Self::get_cached) with the user-data tier policy.
    pub async fn get_user_data<T: DeserializeOwned>(
        &self,
        url: &str,
        options: CacheOptions,
    ) -> Result<T> {
        self.get_cached(url, options.with_user_data_policy()).await
    }

    /// [`get_cached`](Self::get_cached) with the preferences tier policy.
    pub async fn get_preferences<T: DeserializeOwned>(
        &self,
        url: &str,
        options: CacheOptions,
    ) -> Result<T> {
        self.get_cached(url, options.with_preferences_policy()).await
    }

    // == Invalidation ==
    /// Removes entries whose key contains `pattern` from both tiers.
    pub async fn invalidate_cache(&self, pattern: &str) -> InvalidationReport {
        let memory = self.tiers.memory.write().await.invalidate_pattern(pattern);
        let cookies = self.tiers.cookies.write().await.invalidate_pattern(pattern);
        debug!(
            "Invalidated '{}': {} memory, {} cookie entries",
            pattern, memory, cookies
        );
        InvalidationReport { memory, cookies }
    }

    /// Empties both tiers and forgets pending-request bookkeeping.
    pub async fn clear_cache(&self) {
        self.tiers.memory.write().await.clear();
        let cookies = self.tiers.cookies.write().await.clear();
        self.dedup.clear().await;
        info!("Cache cleared ({} cookies removed)", cookies);
    }

    pub async fn cache_stats(&self) -> CacheStatsReport {
        let mut memory = self.tiers.memory.read().await.stats();
        memory.pending = self.dedup.pending_count().await;
        let cookies = self.tiers.cookies.read().await.stats();
        CacheStatsReport::new(memory, cookies)
    }

    // == Auth Token ==
    pub fn set_auth_token(&self, token: Option<&str>) {
        self.http.set_auth_token(token);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.http.auth_token()
    }

    // == Cookie Convenience ==
    pub async fn set_user_preference<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.tiers.cookies.write().await.set_preference(key, value)
    }

    pub async fn get_user_preference<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.tiers.cookies.write().await.get_preference(key)
    }

    pub async fn set_session_data<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.tiers.cookies.write().await.set_session_data(key, value)
    }

    pub async fn get_session_data<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.tiers.cookies.write().await.get_session_data(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MAX_COOKIE_SIZE;
    use serde_json::json;

    fn offline_client() -> ApiClient {
        // Nothing listens here; any network call fails fast
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_request_timeout(Duration::from_millis(500));
        ApiClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_presets() {
        let user = CacheOptions::user_data();
        assert!(user.use_cookies);
        assert_eq!(user.cookie_ttl, CookieTtl::Session.duration());
        assert_eq!(user.cache_ttl, MemoryTtl::Long.duration());

        let prefs = CacheOptions::preferences();
        assert!(prefs.use_cookies);
        assert_eq!(prefs.cookie_ttl, CookieTtl::Persistent.duration());
        assert_eq!(prefs.cache_ttl, MemoryTtl::VeryLong.duration());

        let default = CacheOptions::default();
        assert!(default.use_cache);
        assert!(!default.use_cookies);
    }

    #[tokio::test]
    async fn test_memory_hit_skips_network() {
        let client = offline_client();
        let key = generate_key("/jobs", &CacheParams::new());
        client
            .tiers()
            .memory
            .write()
            .await
            .set_key(key, json!(["job"]), MemoryTtl::Short.duration());

        let data: Value = client.get_cached("/jobs", CacheOptions::new()).await.unwrap();
        assert_eq!(data, json!(["job"]));
    }

    #[tokio::test]
    async fn test_cookie_hit_promotes_to_memory() {
        let client = offline_client();
        client.tiers().cookies.write().await.set(
            "/me",
            &CacheParams::new(),
            &json!({"name": "Ada"}),
            CookieTtl::Session.duration(),
        );

        let data: Value = client
            .get_user_data("/me", CacheOptions::new())
            .await
            .unwrap();
        assert_eq!(data, json!({"name": "Ada"}));

        let promoted = client
            .tiers()
            .memory
            .write()
            .await
            .get("/me", &CacheParams::new());
        assert_eq!(promoted, Some(json!({"name": "Ada"})));
    }

    #[tokio::test]
    async fn test_cookie_tier_ignored_without_opt_in() {
        let client = offline_client();
        client.tiers().cookies.write().await.set(
            "/me",
            &CacheParams::new(),
            &json!(1),
            CookieTtl::Session.duration(),
        );

        let result: Result<Value> = client.get_cached("/me", CacheOptions::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_reports_both_tiers() {
        let client = offline_client();
        let none = CacheParams::new();
        let ttl = Duration::from_secs(60);
        {
            let mut memory = client.tiers().memory.write().await;
            memory.set("/jobs", &none, json!(1), ttl);
            memory.set("/jobs/1", &none, json!(2), ttl);
            memory.set("/articles", &none, json!(3), ttl);
        }
        client
            .tiers()
            .cookies
            .write()
            .await
            .set("/jobs", &none, &json!(1), ttl);

        let report = client.invalidate_cache("/jobs").await;
        assert_eq!(report, InvalidationReport { memory: 2, cookies: 1 });

        let stats = client.cache_stats().await;
        assert_eq!(stats.memory.total, 1);
        assert_eq!(stats.cookies.total, 0);
    }

    #[tokio::test]
    async fn test_clear_cache_is_idempotent() {
        let client = offline_client();
        client.set_user_preference("theme", "dark").await;

        client.clear_cache().await;
        client.clear_cache().await;

        let stats = client.cache_stats().await;
        assert_eq!(stats.total.entries, 0);
        assert_eq!(client.get_user_preference::<String>("theme").await, None);
    }

    #[tokio::test]
    async fn test_preference_and_session_helpers() {
        let client = offline_client();

        assert!(client.set_user_preference("layout", &json!({"cols": 2})).await);
        assert!(client.set_session_data("step", &3).await);

        assert_eq!(
            client.get_user_preference::<Value>("layout").await,
            Some(json!({"cols": 2}))
        );
        assert_eq!(client.get_session_data::<u32>("step").await, Some(3));
        assert!(!client.set_session_data("huge", &"x".repeat(MAX_COOKIE_SIZE)).await);
    }
}
