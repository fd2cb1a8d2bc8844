//! Process-wide path interning table
//!
//! Caches store small integers instead of path strings. Ids are assigned in
//! first-seen order and never reused, so a table that is persisted and
//! reloaded keeps every id valid.

use std::sync::atomic::{AtomicI32, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct PathTable {
    by_path: DashMap<String, i32>,
    by_id: DashMap<i32, String>,
    next_id: AtomicI32,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from persisted `(id, path)` pairs
    pub fn from_entries<I: IntoIterator<Item = (i32, String)>>(entries: I) -> Self {
        let table = Self::new();
        let mut max_id = -1;
        for (id, path) in entries {
            if id < 0 {
                continue;
            }
            max_id = max_id.max(id);
            table.by_id.insert(id, path.clone());
            table.by_path.insert(path, id);
        }
        table.next_id.store(max_id + 1, Ordering::SeqCst);
        table
    }

    /// Id for `path`, assigning a new one on first sight
    pub fn intern(&self, path: &str) -> i32 {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        match self.by_path.entry(path.to_string()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.by_id.insert(id, path.to_string());
                entry.insert(id);
                id
            }
        }
    }

    /// Id already assigned to `path`
    pub fn id_of(&self, path: &str) -> Option<i32> {
        self.by_path.get(path).map(|id| *id)
    }

    pub fn lookup(&self, id: i32) -> Option<String> {
        self.by_id.get(&id).map(|path| path.value().clone())
    }

    /// All `(id, path)` pairs sorted by id
    pub fn entries(&self) -> Vec<(i32, String)> {
        let mut entries: Vec<(i32, String)> = self
            .by_id
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
