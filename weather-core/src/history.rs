//! Recent searches: most-recent-first, unique ignoring case, at most five.

use tracing::{debug, warn};

use crate::{error::StoreError, store::KeyValueStore};

/// Key the history is stored under.
pub const HISTORY_KEY: &str = "weatherHistory";

pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from most-recent-first entries, enforcing the invariants.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::new();
        let mut collected: Vec<String> = entries.into_iter().collect();
        // Replay oldest first so the first entry ends up at the front.
        collected.reverse();
        for city in collected {
            history.record(&city);
        }
        history
    }

    /// Move `city` to the front, dropping any case-insensitive duplicate.
    pub fn record(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }

        let lowered = city.to_lowercase();
        self.entries.retain(|entry| entry.to_lowercase() != lowered);
        self.entries.insert(0, city.to_string());
        self.entries.truncate(MAX_ENTRIES);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keeps a [`SearchHistory`] in sync with a key/value store.
#[derive(Debug)]
pub struct HistoryManager {
    store: Box<dyn KeyValueStore>,
    history: SearchHistory,
}

impl HistoryManager {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            history: SearchHistory::new(),
        }
    }

    /// Read the persisted history. Absent or malformed data yields an empty history.
    pub fn load(&mut self) -> &SearchHistory {
        self.history = match self.store.get(HISTORY_KEY) {
            None => SearchHistory::new(),
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(entries) => SearchHistory::from_entries(entries),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable search history");
                    SearchHistory::new()
                }
            },
        };

        debug!(entries = self.history.len(), "Loaded search history");
        &self.history
    }

    /// Record `city` and persist the whole list.
    ///
    /// The in-memory history is updated even when persisting fails.
    pub fn record(&mut self, city: &str) -> Result<&SearchHistory, StoreError> {
        self.history.record(city);
        self.persist()?;
        Ok(&self.history)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.history = SearchHistory::new();
        self.persist()
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(self.history.entries())?;
        self.store.set(HISTORY_KEY, json)
    }
}
