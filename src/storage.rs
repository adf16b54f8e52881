//! Write-through key-value storage standing in for the browser's local
//! storage: string keys, string values, one JSON file on disk.
//!
//! Load errors degrade to an empty store; write errors are logged and
//! otherwise ignored (best-effort). Callers never see a storage error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Key holding the JSON-serialized learner profile.
pub const PROFILE_KEY: &str = "sql_arena_profile";

/// Key holding the cached theory text for one topic.
pub fn theory_key(topic_id: &str) -> String {
    format!("sql_arena_theory_{topic_id}")
}

#[derive(Clone)]
pub struct KvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    path: Option<PathBuf>,
}

impl KvStore {
    /// Open a file-backed store. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<HashMap<String, String>>(&s) {
                Ok(map) => {
                    info!(target: "sql_arena", path = %path.display(), keys = map.len(), "Loaded storage file");
                    map
                }
                Err(e) => {
                    warn!(target: "sql_arena", path = %path.display(), error = %e, "Storage file unreadable; starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            entries: Arc::new(RwLock::new(entries)),
            path: Some(path),
        }
    }

    /// Purely in-memory store (used by tests).
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            path: None,
        }
    }

    /// File-backed store at ARENA_STORAGE_PATH, default `./data/sql_arena.json`.
    pub fn from_env() -> Self {
        let path = std::env::var("ARENA_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/sql_arena.json"));
        Self::open(path)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        self.persist(&entries);
    }

    /// Rewrite the whole file. Best-effort: failures are logged, not raised.
    fn persist(&self, entries: &HashMap<String, String>) {
        let Some(path) = &self.path else { return };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!(target: "sql_arena", path = %path.display(), error = %e, "Failed to create storage directory");
                return;
            }
        }
        match serde_json::to_string_pretty(entries) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    error!(target: "sql_arena", path = %path.display(), error = %e, "Failed to write storage file");
                }
            }
            Err(e) => error!(target: "sql_arena", error = %e, "Failed to serialize storage map"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn set_get_remove_in_memory() {
        let store = KvStore::in_memory();
        assert_eq!(store.get("k").await, None);
        store.set("k", "v").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        store.remove("k").await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn file_backed_store_round_trips() {
        let path = std::env::temp_dir().join(format!("sql_arena_test_{}.json", Uuid::new_v4()));

        let store = KvStore::open(path.clone());
        store.set(PROFILE_KEY, "{\"name\":\"Ada\"}").await;
        store.set(&theory_key("subqueries"), "# Subqueries").await;

        let reopened = KvStore::open(path.clone());
        assert_eq!(reopened.get(PROFILE_KEY).await.as_deref(), Some("{\"name\":\"Ada\"}"));
        assert_eq!(reopened.get(&theory_key("subqueries")).await.as_deref(), Some("# Subqueries"));

        reopened.remove(PROFILE_KEY).await;
        let reopened_again = KvStore::open(path.clone());
        assert_eq!(reopened_again.get(PROFILE_KEY).await, None);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn theory_keys_follow_the_documented_pattern() {
        assert_eq!(theory_key("window_functions"), "sql_arena_theory_window_functions");
    }
}
