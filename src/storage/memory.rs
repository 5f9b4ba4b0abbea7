//! In-process cookie jar.

use std::collections::HashMap;

use chrono::Utc;

use super::{Cookie, CookieStore};
use crate::error::StoreError;

/// Browser-like cookie jar held in memory.
///
/// Cookies past their `expires` are hidden from reads the way a browser
/// purges them, and physically dropped by [`CookieStore::purge_expired`].
#[derive(Debug, Clone)]
pub struct MemoryCookieStore {
    cookies: HashMap<String, Cookie>,
    max_value_size: usize,
}

impl MemoryCookieStore {
    pub fn new(max_value_size: usize) -> Self {
        Self {
            cookies: HashMap::new(),
            max_value_size,
        }
    }

    pub(crate) fn from_cookies(cookies: Vec<Cookie>, max_value_size: usize) -> Self {
        let mut store = Self::new(max_value_size);
        for cookie in cookies {
            store.cookies.insert(cookie.name.clone(), cookie);
        }
        store.purge_expired();
        store
    }

    pub(crate) fn cookies(&self) -> Vec<&Cookie> {
        self.cookies.values().collect()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        self.cookies
            .get(name)
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(|cookie| cookie.value.clone())
    }

    fn set(&mut self, cookie: Cookie) -> Result<(), StoreError> {
        if cookie.value.len() > self.max_value_size {
            return Err(StoreError::TooLarge {
                size: cookie.value.len(),
                limit: self.max_value_size,
            });
        }
        self.cookies.insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> bool {
        self.cookies.remove(name).is_some()
    }

    fn names(&self) -> Vec<String> {
        let now = Utc::now();
        self.cookies
            .values()
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(|cookie| cookie.name.clone())
            .collect()
    }

    fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.cookies.len();
        self.cookies.retain(|_, cookie| !cookie.is_expired_at(now));
        before - self.cookies.len()
    }
}
