//! Auth token storage.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

/// Where the bearer token lives between requests.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;

    /// Replaces the token; `None` clears it.
    fn set(&self, token: Option<String>);
}

// == Memory Token Store ==
/// Token held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, token: Option<String>) {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }
}

// == File Token Store ==
/// Token persisted to a file so it survives restarts.
///
/// The file holds the raw token; clearing the token deletes the file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: MemoryTokenStore,
}

impl FileTokenStore {
    /// Opens the store, loading any token already on disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = MemoryTokenStore::new();

        match fs::read_to_string(&path) {
            Ok(token) if !token.trim().is_empty() => cached.set(Some(token.trim().to_string())),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read auth token from {}: {}", path.display(), e),
        }

        Self { path, cached }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.get()
    }

    fn set(&self, token: Option<String>) {
        let result = match &token {
            Some(token) => fs::write(&self.path, token),
            None => match fs::remove_file(&self.path) {
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            warn!("Failed to persist auth token to {}: {}", self.path.display(), e);
        }

        self.cached.set(token);
    }
}
