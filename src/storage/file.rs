//! Cookie jar persisted to a JSON file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{Cookie, CookieStore, MemoryCookieStore};
use crate::error::StoreError;

/// Cookie jar that survives process restarts.
///
/// Every mutation rewrites the whole file. Write failures are logged and the
/// in-memory view stays authoritative for the rest of the process.
#[derive(Debug)]
pub struct FileCookieStore {
    inner: MemoryCookieStore,
    path: PathBuf,
}

impl FileCookieStore {
    /// Opens the jar at `path`, starting empty when the file does not exist.
    pub fn open(path: impl AsRef<Path>, max_value_size: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let cookies: Vec<Cookie> = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: MemoryCookieStore::from_cookies(cookies, max_value_size),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&self.inner.cookies())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist cookie jar to {}: {}", self.path.display(), e);
        }
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.inner.get(name)
    }

    fn set(&mut self, cookie: Cookie) -> Result<(), StoreError> {
        self.inner.set(cookie)?;
        self.persist_or_warn();
        Ok(())
    }

    fn remove(&mut self, name: &str) -> bool {
        let removed = self.inner.remove(name);
        if removed {
            self.persist_or_warn();
        }
        removed
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }

    fn max_value_size(&self) -> usize {
        self.inner.max_value_size()
    }

    fn purge_expired(&mut self) -> usize {
        let purged = self.inner.purge_expired();
        if purged > 0 {
            self.persist_or_warn();
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileCookieStore::open(dir.path().join("cookies.json"), 4000).unwrap();
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_cookies_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let expires = Utc::now() + Duration::hours(1);

        {
            let mut store = FileCookieStore::open(&path, 4000).unwrap();
            store.set(Cookie::new("a", "1", expires)).unwrap();
            store.set(Cookie::new("b", "2", expires)).unwrap();
            store.remove("b");
        }

        let store = FileCookieStore::open(&path, 4000).unwrap();
        assert_eq!(store.get("a"), Some("1".to_string()));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_expired_cookies_dropped_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        {
            let mut store = FileCookieStore::open(&path, 4000).unwrap();
            store
                .set(Cookie::new("old", "x", Utc::now() - Duration::seconds(5)))
                .unwrap();
        }

        let store = FileCookieStore::open(&path, 4000).unwrap();
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_purge_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let mut store = FileCookieStore::open(&path, 4000).unwrap();

        store
            .set(Cookie::new("short", "x", Utc::now() + Duration::milliseconds(30)))
            .unwrap();
        store
            .set(Cookie::new("long", "y", Utc::now() + Duration::hours(1)))
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(60));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.purge_expired(), 0);

        let on_disk: Vec<Cookie> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].name, "long");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, b"not json").unwrap();

        let result = FileCookieStore::open(&path, 4000);
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
