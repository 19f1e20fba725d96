//! In-memory catalog used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anisync_api::traits::{
    AlternativeTitles, CatalogClient, CatalogEntry, EntryFields, ListEntry, ListStatus,
    RelationEdge, RelationKind, StatusCommand,
};

#[derive(Debug, thiserror::Error)]
#[error("fake transport failure for {0}")]
pub struct FakeError(pub String);

#[derive(Default)]
struct State {
    entries: HashMap<u64, CatalogEntry>,
    search_results: HashMap<String, Vec<u64>>,
    failing_ids: HashSet<u64>,
    fail_updates_after: Option<usize>,
    fetches: Vec<u64>,
    updates: Vec<(u64, StatusCommand)>,
}

/// Cloneable handle; clones share state so tests can inspect calls afterwards.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<State>>,
}

pub fn entry(id: u64, title: &str, english: Option<&str>, episodes: u32) -> CatalogEntry {
    CatalogEntry {
        id,
        title: title.into(),
        alternative_titles: AlternativeTitles {
            en: english.map(Into::into),
            ..Default::default()
        },
        num_episodes: episodes,
        relations: Some(Vec::new()),
        list_entry: None,
    }
}

pub fn edge(kind: RelationKind, target_id: u64) -> RelationEdge {
    RelationEdge { kind, target_id }
}

pub fn list(status: ListStatus, episodes_watched: u32) -> ListEntry {
    ListEntry {
        status,
        episodes_watched,
        is_rewatching: false,
        times_rewatched: 0,
        start_date: None,
        finish_date: None,
        score: None,
    }
}

impl FakeCatalog {
    pub fn with(entries: Vec<CatalogEntry>) -> Self {
        let fake = Self::default();
        for e in entries {
            fake.insert(e);
        }
        fake
    }

    pub fn insert(&self, entry: CatalogEntry) {
        self.state.lock().unwrap().entries.insert(entry.id, entry);
    }

    pub fn add_relation(&self, from: u64, kind: RelationKind, to: u64) {
        let mut state = self.state.lock().unwrap();
        let entry = state.entries.get_mut(&from).expect("relation source exists");
        entry.relations.get_or_insert_with(Vec::new).push(edge(kind, to));
    }

    pub fn set_list_entry(&self, id: u64, list_entry: Option<ListEntry>) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.get_mut(&id) {
            entry.list_entry = list_entry;
        }
    }

    pub fn set_search(&self, query: &str, ids: Vec<u64>) {
        self.state
            .lock()
            .unwrap()
            .search_results
            .insert(query.to_string(), ids);
    }

    pub fn fail_lookup(&self, id: u64) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    /// Let `n` updates succeed, then fail every later one.
    pub fn fail_updates_after(&self, n: usize) {
        self.state.lock().unwrap().fail_updates_after = Some(n);
    }

    pub fn fetches(&self) -> Vec<u64> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn updates(&self) -> Vec<(u64, StatusCommand)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn list_entry(&self, id: u64) -> Option<ListEntry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(&id)
            .and_then(|e| e.list_entry.clone())
    }

    fn project(entry: &CatalogEntry, fields: EntryFields) -> CatalogEntry {
        let mut out = entry.clone();
        if !fields.contains(EntryFields::RELATIONS) {
            out.relations = None;
        }
        if !fields.contains(EntryFields::LIST_STATUS) {
            out.list_entry = None;
        }
        out
    }
}

impl CatalogClient for FakeCatalog {
    type Error = FakeError;

    async fn search_by_title(
        &self,
        query: &str,
        fields: EntryFields,
    ) -> Result<Vec<CatalogEntry>, FakeError> {
        let state = self.state.lock().unwrap();
        let ids = state.search_results.get(query).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.entries.get(id))
            .map(|e| Self::project(e, fields))
            .collect())
    }

    async fn get_entry_detail(
        &self,
        entry_id: u64,
        fields: EntryFields,
    ) -> Result<Option<CatalogEntry>, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push(entry_id);
        if state.failing_ids.contains(&entry_id) {
            return Err(FakeError(format!("entry {entry_id}")));
        }
        Ok(state.entries.get(&entry_id).map(|e| Self::project(e, fields)))
    }

    async fn submit_status_update(
        &self,
        entry_id: u64,
        command: &StatusCommand,
    ) -> Result<ListEntry, FakeError> {
        let mut state = self.state.lock().unwrap();
        if state
            .fail_updates_after
            .is_some_and(|n| state.updates.len() >= n)
        {
            return Err(FakeError(format!("update {entry_id}")));
        }
        state.updates.push((entry_id, command.clone()));

        let today = chrono::Local::now().date_naive();
        let entry = state
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| FakeError(format!("update {entry_id}")))?;
        let mut updated = entry
            .list_entry
            .clone()
            .unwrap_or_else(|| list(command.status, 0));
        updated.status = command.status;
        if let Some(ep) = command.episodes_watched {
            updated.episodes_watched = ep;
        }
        if let Some(rewatching) = command.is_rewatching {
            updated.is_rewatching = rewatching;
        }
        if let Some(count) = command.times_rewatched {
            updated.times_rewatched = count;
        }
        if command.start_date_now {
            updated.start_date = Some(today);
        }
        if command.finish_date_now {
            updated.finish_date = Some(today);
        }
        entry.list_entry = Some(updated.clone());
        Ok(updated)
    }
}
