//! Persistent key-value storage for the cookie tier.
//!
//! The cookie cache only needs small per-key string storage with built-in
//! expiry and an explicit size limit. [`CookieStore`] captures that contract
//! so the same cache logic runs against an in-process jar or a file on disk.

mod file;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use file::FileCookieStore;
pub use memory::MemoryCookieStore;

// == Cookie ==
/// A single stored cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    /// URL-encoded value as written by the cache
    pub value: String,
    /// Store-level expiry; the store stops returning the cookie afterwards
    pub expires: DateTime<Utc>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }
}

// == Cookie Store ==
/// Small persistent string storage with per-entry expiry.
pub trait CookieStore: Send + Sync {
    /// Value of a live cookie, `None` when absent or past its expiry.
    fn get(&self, name: &str) -> Option<String>;

    /// Writes or replaces a cookie.
    ///
    /// Fails with [`StoreError::TooLarge`] when the value exceeds
    /// [`max_value_size`](Self::max_value_size); nothing is written then.
    fn set(&mut self, cookie: Cookie) -> Result<(), StoreError>;

    /// Deletes a cookie. Returns whether it existed.
    fn remove(&mut self, name: &str) -> bool;

    /// Names of all live cookies.
    fn names(&self) -> Vec<String>;

    /// Largest value the store accepts, in bytes.
    fn max_value_size(&self) -> usize;

    /// Physically drops cookies past their expiry. Returns how many went.
    fn purge_expired(&mut self) -> usize;
}

impl<S: CookieStore + ?Sized> CookieStore for Box<S> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&mut self, cookie: Cookie) -> Result<(), StoreError> {
        (**self).set(cookie)
    }

    fn remove(&mut self, name: &str) -> bool {
        (**self).remove(name)
    }

    fn names(&self) -> Vec<String> {
        (**self).names()
    }

    fn max_value_size(&self) -> usize {
        (**self).max_value_size()
    }

    fn purge_expired(&mut self) -> usize {
        (**self).purge_expired()
    }
}
