//! Cookie Cache Module
//!
//! Cookie-backed cache tier. Each entry is one cookie named
//! `<prefix><cache key>` whose value is the URL-encoded JSON of
//! `{data, createdAt, expiresAt}`.
//!
//! Every failure in this tier (oversized payload, store error, undecodable
//! cookie) degrades to "not cached": writes return `false`, reads return
//! `None`, and nothing propagates to the caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    current_timestamp_ms, generate_key, CacheEntry, CacheParams, CookieStats, CookieTtl,
};
use crate::storage::{Cookie, CookieStore};

/// Key prefix for the long-lived preference view
pub const PREFERENCE_PREFIX: &str = "pref_";

/// Key prefix for the short-lived session view
pub const SESSION_PREFIX: &str = "session_";

/// Lifetime of session-view values
const SESSION_DATA_TTL: Duration = Duration::from_secs(60 * 60);

/// What a stored cookie turned out to hold.
enum Decoded {
    Valid(CacheEntry<Value>),
    Expired,
    Corrupt,
}

// == Cookie Cache ==
/// Cookie tier over any [`CookieStore`].
#[derive(Debug)]
pub struct CookieCache<S> {
    store: S,
    prefix: String,
}

impl<S: CookieStore> CookieCache<S> {
    // == Constructor ==
    pub fn new(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn cookie_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Cache keys of every cookie in this namespace.
    pub fn keys(&self) -> Vec<String> {
        self.store
            .names()
            .into_iter()
            .filter_map(|name| name.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    fn decode(&self, key: &str) -> Option<Decoded> {
        let raw = self.store.get(&self.cookie_name(key))?;

        let json = match urlencoding::decode(&raw) {
            Ok(json) => json,
            Err(e) => {
                warn!("Cache cookie '{}' is not valid URL encoding: {}", key, e);
                return Some(Decoded::Corrupt);
            }
        };

        match serde_json::from_str::<CacheEntry<Value>>(&json) {
            Ok(entry) if entry.is_expired_at(current_timestamp_ms()) => Some(Decoded::Expired),
            Ok(entry) => Some(Decoded::Valid(entry)),
            Err(e) => {
                warn!("Cache cookie '{}' could not be decoded: {}", key, e);
                Some(Decoded::Corrupt)
            }
        }
    }

    // == Get ==
    /// Returns the data cached for `url` + `params` if still valid.
    pub fn get<T: DeserializeOwned>(&mut self, url: &str, params: &CacheParams) -> Option<T> {
        self.get_key(&generate_key(url, params))
    }

    /// Looks up by a precomputed cache key.
    ///
    /// The in-payload `expiresAt` is checked even when the store still holds
    /// the cookie; an expired payload deletes the cookie.
    pub fn get_key<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let entry = match self.decode(key)? {
            Decoded::Valid(entry) => entry,
            Decoded::Expired => {
                debug!("Cache cookie '{}' expired, deleting", key);
                self.delete_key(key);
                return None;
            }
            Decoded::Corrupt => return None,
        };

        match serde_json::from_value(entry.data) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Cache cookie '{}' holds an unexpected shape: {}", key, e);
                None
            }
        }
    }

    // == Set ==
    /// Stores `data` for `url` + `params`. Returns `false` when it was not cached.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        url: &str,
        params: &CacheParams,
        data: &T,
        ttl: Duration,
    ) -> bool {
        self.set_key(&generate_key(url, params), data, ttl)
    }

    /// Stores under a precomputed cache key.
    pub fn set_key<T: Serialize + ?Sized>(&mut self, key: &str, data: &T, ttl: Duration) -> bool {
        let entry = CacheEntry::new(data, ttl);
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!("Cache value for '{}' could not be serialized: {}", key, e);
                return false;
            }
        };

        let value = urlencoding::encode(&json).into_owned();
        let limit = self.store.max_value_size();
        if value.len() > limit {
            warn!(
                "Cache value for '{}' is {} bytes, over the {} byte cookie limit; not cached",
                key,
                value.len(),
                limit
            );
            return false;
        }

        let expires = i64::try_from(entry.expires_at)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let cookie = Cookie::new(self.cookie_name(key), value, expires);
        match self.store.set(cookie) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache cookie '{}' was not stored: {}", key, e);
                false
            }
        }
    }

    // == Delete ==
    pub fn delete(&mut self, url: &str, params: &CacheParams) -> bool {
        self.delete_key(&generate_key(url, params))
    }

    pub fn delete_key(&mut self, key: &str) -> bool {
        let name = self.cookie_name(key);
        self.store.remove(&name)
    }

    /// Removes every cache cookie whose key contains `pattern`.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        self.keys()
            .into_iter()
            .filter(|key| key.contains(pattern))
            .filter(|key| self.delete_key(key))
            .count()
    }

    // == Clear ==
    /// Removes every cookie in this namespace. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        self.keys()
            .into_iter()
            .filter(|key| self.delete_key(key))
            .count()
    }

    // == Cleanup ==
    /// Removes expired and undecodable cookies. Returns how many were removed.
    ///
    /// Cookies whose store-level expiry has passed are invisible to lookups,
    /// so the store purges those itself.
    pub fn cleanup(&mut self) -> usize {
        let purged = self.store.purge_expired();

        let stale: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|key| !matches!(self.decode(key), Some(Decoded::Valid(_))))
            .collect();

        purged + stale.iter().filter(|key| self.delete_key(key)).count()
    }

    // == Stats ==
    /// Scans the namespace. Undecodable cookies count as expired.
    pub fn stats(&self) -> CookieStats {
        let mut stats = CookieStats::default();

        for key in self.keys() {
            let name = self.cookie_name(&key);
            stats.total += 1;
            stats.total_bytes += self.store.get(&name).map_or(0, |v| v.len());
            match self.decode(&key) {
                Some(Decoded::Valid(_)) => stats.valid += 1,
                _ => stats.expired += 1,
            }
        }

        stats
    }

    // == Preferences ==
    /// Stores a user preference for [`CookieTtl::Persistent`].
    pub fn set_preference<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        self.set_key(
            &format!("{}{}", PREFERENCE_PREFIX, key),
            value,
            CookieTtl::Persistent.duration(),
        )
    }

    pub fn get_preference<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.get_key(&format!("{}{}", PREFERENCE_PREFIX, key))
    }

    // == Session Data ==
    /// Stores a session value for one hour.
    pub fn set_session_data<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        self.set_key(&format!("{}{}", SESSION_PREFIX, key), value, SESSION_DATA_TTL)
    }

    pub fn get_session_data<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.get_key(&format!("{}{}", SESSION_PREFIX, key))
    }
}
