//! Bounded, durable history of past generations.
//!
//! The store keeps a newest-first sequence capped at 50 entries. Every
//! mutation rewrites the whole backing file (replace-on-write), so durable
//! state always matches the in-memory sequence after each call. A missing
//! or corrupt file degrades to an empty history and logs; it never fails
//! the caller.

use std::path::PathBuf;
use std::sync::RwLock;

use tracing::{error, info, warn};

use crate::domain::HistoryItem;

/// Hard cap on stored generations; inserting beyond it evicts the oldest.
pub const MAX_ENTRIES: usize = 50;

/// Storage seam for the history list. Backed by a JSON file here; any
/// durable key-value store can stand in behind the same contract.
pub trait HistoryRepository: Send + Sync {
    /// Full snapshot, newest first.
    fn load(&self) -> Vec<HistoryItem>;
    /// Prepend a finished generation, truncate to the cap, persist the whole
    /// sequence. Returns the entry as stored (the id is bumped if two saves
    /// land on the same millisecond).
    fn save(&self, item: HistoryItem) -> HistoryItem;
    /// Remove the entry with this id, if present, and re-persist.
    fn delete(&self, id: &str);
    /// Lookup for reloading a past generation.
    fn get(&self, id: &str) -> Option<HistoryItem>;
}

pub struct JsonFileHistory {
    path: PathBuf,
    entries: RwLock<Vec<HistoryItem>>,
}

impl JsonFileHistory {
    /// Read the persisted sequence once; any failure yields an empty history.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Vec<HistoryItem>>(&s) {
                Ok(list) => {
                    info!(target: "history", path = %path.display(), count = list.len(), "Loaded history");
                    list
                }
                Err(e) => {
                    error!(target: "history", path = %path.display(), error = %e, "Corrupt history file; starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                error!(target: "history", path = %path.display(), error = %e, "Failed to read history file; starting empty");
                Vec::new()
            }
        };
        Self { path, entries: RwLock::new(entries) }
    }

    pub fn from_env() -> Self {
        let path = std::env::var("HISTORY_PATH").unwrap_or_else(|_| "./data/history.json".into());
        Self::open(PathBuf::from(path))
    }

    /// Replace-on-write flush of the full sequence. Write failures are
    /// logged and do not unwind the request; the in-memory list stays
    /// authoritative for this process.
    fn persist(&self, entries: &[HistoryItem]) {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    warn!(target: "history", dir = %dir.display(), error = %e, "Could not create history directory");
                }
            }
        }
        match serde_json::to_string(entries) {
            Ok(payload) => {
                if let Err(e) = std::fs::write(&self.path, payload) {
                    error!(target: "history", path = %self.path.display(), error = %e, "Failed to write history file");
                }
            }
            Err(e) => {
                error!(target: "history", error = %e, "Failed to serialize history");
            }
        }
    }
}

impl HistoryRepository for JsonFileHistory {
    fn load(&self) -> Vec<HistoryItem> {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, mut item: HistoryItem) -> HistoryItem {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Same-millisecond saves: bump until the time-derived id is unique.
        while entries.iter().any(|e| e.id == item.id) {
            item.id = (item.id.parse::<u64>().unwrap_or(item.timestamp) + 1).to_string();
        }
        entries.insert(0, item.clone());
        entries.truncate(MAX_ENTRIES);
        self.persist(&entries);
        info!(target: "history", id = %item.id, count = entries.len(), "Saved history entry");
        item
    }

    fn delete(&self, id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() != before {
            self.persist(&entries);
            info!(target: "history", %id, count = entries.len(), "Deleted history entry");
        } else {
            warn!(target: "history", %id, "Delete: id not found");
        }
    }

    fn get(&self, id: &str) -> Option<HistoryItem> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MathProblem, ProblemConfig};

    fn item(id: u64, text: &str) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            timestamp: id,
            original_text: text.to_string(),
            problems: vec![MathProblem { question: format!("q{}", id), solution: format!("s{}", id) }],
            config: ProblemConfig { level1: 1, level2: 0, level3: 0 },
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> JsonFileHistory {
        JsonFileHistory::open(dir.path().join("history.json"))
    }

    #[test]
    fn save_prepends_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(item(1, "a"));
        store.save(item(2, "b"));
        let all = store.load();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].original_text, "b");
        assert_eq!(all[1].original_text, "a");
    }

    #[test]
    fn cap_evicts_oldest_on_fifty_first_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for i in 1..=51 {
            store.save(item(i, &format!("t{}", i)));
        }
        let all = store.load();
        assert_eq!(all.len(), MAX_ENTRIES);
        assert_eq!(all[0].original_text, "t51");
        // the very first save is gone, the second oldest survives
        assert!(all.iter().all(|e| e.original_text != "t1"));
        assert_eq!(all[MAX_ENTRIES - 1].original_text, "t2");
    }

    #[test]
    fn delete_removes_exactly_one_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for i in 1..=3 {
            store.save(item(i, &format!("t{}", i)));
        }
        store.delete("2");
        let all = store.load();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "3");
        assert_eq!(all[1].id, "1");
        // deleting an unknown id is a no-op
        store.delete("42");
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn reopen_round_trips_exact_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let saved = {
            let store = JsonFileHistory::open(path.clone());
            store.save(item(7, "Giải ${2x+3=7}$"))
        };
        let store = JsonFileHistory::open(path);
        let got = store.get(&saved.id).unwrap();
        assert_eq!(got, saved);
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileHistory::open(path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn same_millisecond_ids_are_bumped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let a = store.save(item(5, "a"));
        let b = store.save(item(5, "b"));
        assert_eq!(a.id, "5");
        assert_eq!(b.id, "6");
        assert_eq!(store.load().len(), 2);
    }
}
