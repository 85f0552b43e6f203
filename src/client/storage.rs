use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::RwLock,
};
use tracing::warn;

/// Key the auth flow stores the bearer token under.
pub const TOKEN_KEY: &str = "token";

/// Persistent client-side key/value storage, read-only from the API client's side.
pub trait TokenStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// Storage backed by a JSON object on disk (`{"token": "..."}`).
///
/// The file is re-read on every lookup, so a token written by another process
/// is picked up by the next request.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Option<Map<String, Value>> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(path = %self.path.display(), "client storage is not a JSON object");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse client storage");
                None
            }
        }
    }
}

impl TokenStore for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.read_map()?.remove(key)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// In-process storage, written by the surrounding auth flow.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.into(), value.into());
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.write() {
            items.remove(key);
        }
    }
}

impl TokenStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }
}
