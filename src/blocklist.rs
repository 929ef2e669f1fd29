//! Read-only block-list of titles the caller never wants rated.
//!
//! The list is edited elsewhere (a settings UI writes it to the shared
//! [`KeyValueStore`] under [`BLOCKLIST_STORE_KEY`]); the engine only loads
//! it, reloads it on request, and answers membership queries.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::cache::KeyValueStore;

/// Store key under which the block-list is persisted.
pub const BLOCKLIST_STORE_KEY: &str = "blacklist";

/// Case-insensitive substring block-list.
pub struct Blocklist {
    entries: RwLock<Vec<String>>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl Blocklist {
    /// A fixed list with no backing store; `reload` is a no-op.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: RwLock::new(normalize(entries.into_iter().map(Into::into).collect())),
            store: None,
        }
    }

    /// Load the list persisted in `store`. Read failures leave it empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let list = Self {
            entries: RwLock::new(Vec::new()),
            store: Some(store),
        };
        list.reload().await;
        list
    }

    /// Re-read the persisted list. On failure the previous list is kept.
    pub async fn reload(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let entries = match store.get(BLOCKLIST_STORE_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<String>>(&blob) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "corrupt block-list, keeping previous entries");
                    return;
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read block-list, keeping previous entries");
                return;
            }
        };
        let entries = normalize(entries);
        debug!(entries = entries.len(), "loaded block-list");
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }

    /// Whether any entry occurs in `title`, ignoring case.
    pub fn contains(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| title.contains(entry.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::from_entries(Vec::<String>::new())
    }
}

/// Lowercase, trim, and drop blank entries (a blank entry would match
/// every title).
fn normalize(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
