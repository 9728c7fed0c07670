//! The catalog store: single authority over the in-memory song collection,
//! its durable mirror, and a bounded undo history. UI layers only ever read
//! snapshots or request operations here; they never touch the collection
//! directly. Every mutating operation follows the same shape: snapshot the
//! current state into history, attempt the backend write, and only commit the
//! in-memory change once the write succeeded, so a backend failure never
//! loses or corrupts what the operator sees on screen.

mod history;

use thiserror::Error;

use crate::models::{seed_catalog, Song, SongPatch};
use crate::persist::CatalogBackend;

pub use history::{History, HISTORY_CAPACITY};

/// Failures the store reports to its callers. Expected failure modes are
/// returned, never thrown past the boundary; the UI turns them into footer
/// status messages while the operator's form input stays intact.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutating operation arrived before the initial [`CatalogStore::load`]
    /// finished. Writing before the load completes could clobber the backend
    /// with an empty collection, so the store refuses.
    #[error("catalog has not been loaded yet")]
    NotLoaded,
    /// Malformed import payload, rejected before any state was touched.
    #[error("invalid import payload: {0}")]
    Validation(String),
    /// The persistence backend failed; the in-memory collection is unchanged.
    #[error("persistence failed: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

/// Which source supplied the collection during [`CatalogStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The backend answered; the collection mirrors durable state.
    Backend,
    /// The backend failed; the built-in sample catalog was used so the
    /// application is never empty on first run.
    Seed,
}

/// Owns the canonical song collection and mediates all mutations against a
/// [`CatalogBackend`]. Construct once, load once, then pass by mutable
/// reference to whatever front end consumes it.
pub struct CatalogStore {
    backend: Box<dyn CatalogBackend>,
    songs: Vec<Song>,
    history: History,
    /// Weak playback selection: an id looked up on access, never an owned
    /// handle, so deleting the referenced record cannot dangle.
    selected_id: Option<String>,
    loaded: bool,
}

impl CatalogStore {
    pub fn new(backend: Box<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            songs: Vec::new(),
            history: History::new(),
            selected_id: None,
            loaded: false,
        }
    }

    /// Fetch the whole collection from the backend. Runs once at startup; a
    /// backend failure is recovered locally by falling back to the sample
    /// catalog rather than treated as fatal. Also opens the gate that the
    /// mutating operations check, so no write can race the initial load.
    pub fn load(&mut self) -> LoadSource {
        let source = match self.backend.fetch_all() {
            Ok(songs) => {
                self.songs = songs;
                LoadSource::Backend
            }
            Err(_) => {
                self.songs = seed_catalog();
                LoadSource::Seed
            }
        };
        self.loaded = true;
        source
    }

    /// Read-only view of the collection, newest first.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Pure lookup by identifier. No side effects, no history snapshot.
    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    /// Insert a caller-built record. On success the record is prepended so
    /// the collection stays in descending creation order. On backend failure
    /// the error is returned and the in-memory collection is unchanged.
    pub fn create(&mut self, song: Song) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        self.history.push(self.songs.clone());
        self.backend.insert(&song)?;
        self.songs.insert(0, song);
        Ok(())
    }

    /// Merge the supplied fields into the record matching `id`. A missing id
    /// is a silent no-op (the history snapshot is still taken). Because the
    /// playback selection is resolved by id on every access, it can never
    /// observe a stale record after an edit.
    pub fn update(&mut self, id: &str, patch: &SongPatch) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        self.history.push(self.songs.clone());
        self.backend.update_fields(id, patch)?;
        if let Some(song) = self.songs.iter_mut().find(|song| song.id == id) {
            patch.apply(song);
        }
        Ok(())
    }

    /// Remove the record matching `id`. Clears the playback selection when it
    /// referenced the deleted record. A missing id is a silent no-op.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        self.history.push(self.songs.clone());
        self.backend.delete_by_id(id)?;
        self.songs.retain(|song| song.id != id);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        Ok(())
    }

    /// Destructively replace the entire collection, durable and in-memory,
    /// with `songs`. A delete-all failure aborts with no state change. A
    /// failure partway through the bulk insert is surfaced to the caller but
    /// the in-memory replacement stands; no partial rollback is attempted,
    /// so the backend may hold fewer records than memory until the next
    /// successful mutation re-persists them.
    pub fn import_all(&mut self, songs: Vec<Song>) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        self.history.push(self.songs.clone());
        self.backend.delete_all()?;

        // Insert back-to-front so the backends' creation order matches the
        // sequence's newest-first convention.
        let mut first_failure = None;
        for song in songs.iter().rev() {
            if let Err(err) = self.backend.insert(song) {
                first_failure = Some(err);
                break;
            }
        }
        self.songs = songs;

        match first_failure {
            Some(err) => Err(StoreError::Persistence(err)),
            None => Ok(()),
        }
    }

    /// Roll the in-memory collection back to the most recent snapshot.
    /// Returns whether anything was undone. The rollback is local only: it
    /// is not replayed to the backend and is itself non-invertible (there is
    /// no redo), a deliberate session-safety-net scope.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.songs = snapshot;
                true
            }
            None => false,
        }
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Mark the song with `id` as now playing. No history or persistence
    /// impact. Selecting an id that is not in the collection simply yields an
    /// empty [`CatalogStore::selected`].
    pub fn select_for_playback(&mut self, id: &str) {
        self.selected_id = Some(id.to_string());
    }

    /// Close the now-playing view.
    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// The record currently selected for playback, re-resolved by id so the
    /// answer always reflects the live collection.
    pub fn selected(&self) -> Option<&Song> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }

    fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.loaded {
            Ok(())
        } else {
            Err(StoreError::NotLoaded)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::{anyhow, Result};

    use super::*;
    use crate::models::{seed_catalog, Song, SongPatch};
    use crate::persist::CatalogBackend;

    /// Shared state behind the fake backend so tests can inspect rows and
    /// flip failure injection after the store has taken ownership.
    #[derive(Default)]
    struct FakeState {
        rows: Vec<Song>,
        fail_reads: bool,
        fail_writes: bool,
        fail_after_inserts: Option<usize>,
        inserts_seen: usize,
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        state: Rc<RefCell<FakeState>>,
    }

    impl FakeBackend {
        fn seeded() -> Self {
            let backend = Self::default();
            backend.state.borrow_mut().rows = seed_catalog();
            backend
        }

        fn rows(&self) -> Vec<Song> {
            self.state.borrow().rows.clone()
        }
    }

    impl CatalogBackend for FakeBackend {
        fn fetch_all(&mut self) -> Result<Vec<Song>> {
            let state = self.state.borrow();
            if state.fail_reads {
                return Err(anyhow!("backend unreachable"));
            }
            Ok(state.rows.clone())
        }

        fn insert(&mut self, song: &Song) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_writes {
                return Err(anyhow!("insert refused"));
            }
            if let Some(limit) = state.fail_after_inserts {
                if state.inserts_seen >= limit {
                    return Err(anyhow!("insert refused mid-bulk"));
                }
            }
            state.inserts_seen += 1;
            state.rows.insert(0, song.clone());
            Ok(())
        }

        fn update_fields(&mut self, id: &str, patch: &SongPatch) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_writes {
                return Err(anyhow!("update refused"));
            }
            if let Some(row) = state.rows.iter_mut().find(|row| row.id == id) {
                patch.apply(row);
            }
            Ok(())
        }

        fn delete_by_id(&mut self, id: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_writes {
                return Err(anyhow!("delete refused"));
            }
            state.rows.retain(|row| row.id != id);
            Ok(())
        }

        fn delete_all(&mut self) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_writes {
                return Err(anyhow!("delete-all refused"));
            }
            state.rows.clear();
            Ok(())
        }
    }

    fn loaded_store() -> (CatalogStore, FakeBackend) {
        let backend = FakeBackend::seeded();
        let mut store = CatalogStore::new(Box::new(backend.clone()));
        assert_eq!(store.load(), LoadSource::Backend);
        (store, backend)
    }

    fn song(id: &str, title: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn load_falls_back_to_seed_when_backend_fails() {
        let backend = FakeBackend::default();
        backend.state.borrow_mut().fail_reads = true;
        let mut store = CatalogStore::new(Box::new(backend));

        assert_eq!(store.load(), LoadSource::Seed);
        assert_eq!(store.songs().len(), 2);
        assert_eq!(store.get("1").unwrap().title, "再愛一次");
    }

    #[test]
    fn mutations_are_refused_before_load() {
        let mut store = CatalogStore::new(Box::new(FakeBackend::seeded()));
        let err = store.create(song("3", "Early")).unwrap_err();
        assert!(matches!(err, StoreError::NotLoaded));
        assert!(store.songs().is_empty());
    }

    #[test]
    fn get_is_idempotent() {
        let (store, _) = loaded_store();
        let first = store.get("1").cloned();
        let second = store.get("1").cloned();
        assert_eq!(first, second);
    }

    #[test]
    fn create_prepends_newest_first() {
        let (mut store, backend) = loaded_store();
        store.create(song("3", "New Song")).unwrap();

        let ids: Vec<&str> = store.songs().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(backend.rows()[0].id, "3");
    }

    #[test]
    fn failed_create_leaves_memory_untouched() {
        let (mut store, backend) = loaded_store();
        backend.state.borrow_mut().fail_writes = true;

        let err = store.create(song("3", "Doomed")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(store.songs().len(), 2);
        assert!(store.get("3").is_none());
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let (mut store, backend) = loaded_store();
        let before = store.songs().to_vec();
        let patch = SongPatch {
            is_editor_pick: Some(true),
            ..SongPatch::default()
        };
        store.update("1", &patch).unwrap();

        let updated = store.get("1").unwrap();
        assert!(updated.is_editor_pick);
        assert_eq!(updated.title, "再愛一次");
        assert!(backend.rows().iter().any(|r| r.id == "1" && r.is_editor_pick));

        // Exactly one snapshot equal to the pre-update collection.
        assert_eq!(store.undo_depth(), 1);
        assert!(store.undo());
        assert_eq!(store.songs(), before.as_slice());
    }

    #[test]
    fn failed_update_leaves_memory_untouched() {
        let (mut store, backend) = loaded_store();
        backend.state.borrow_mut().fail_writes = true;

        let patch = SongPatch {
            is_editor_pick: Some(false),
            ..SongPatch::default()
        };
        let err = store.update("1", &patch).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(store.get("1").unwrap().is_editor_pick);
    }

    #[test]
    fn update_of_unknown_id_is_a_silent_no_op_that_still_snapshots() {
        let (mut store, _) = loaded_store();
        let before = store.songs().to_vec();
        let patch = SongPatch {
            title: Some("ghost".to_string()),
            ..SongPatch::default()
        };

        store.update("does-not-exist", &patch).unwrap();
        assert_eq!(store.songs(), before.as_slice());
        assert_eq!(store.undo_depth(), 1);
    }

    #[test]
    fn delete_clears_matching_selection() {
        let (mut store, _) = loaded_store();
        store.select_for_playback("2");
        assert_eq!(store.selected().unwrap().id, "2");

        store.delete("2").unwrap();
        assert!(store.selected().is_none());
        assert!(store.get("2").is_none());
    }

    #[test]
    fn delete_keeps_unrelated_selection() {
        let (mut store, _) = loaded_store();
        store.select_for_playback("1");
        store.delete("2").unwrap();
        assert_eq!(store.selected().unwrap().id, "1");
    }

    #[test]
    fn selection_observes_updates_immediately() {
        let (mut store, _) = loaded_store();
        store.select_for_playback("1");

        let patch = SongPatch {
            version_label: Some(Some("Live".to_string())),
            ..SongPatch::default()
        };
        store.update("1", &patch).unwrap();

        assert_eq!(
            store.selected().unwrap().version_label.as_deref(),
            Some("Live")
        );
    }

    #[test]
    fn import_replaces_the_whole_collection() {
        let (mut store, backend) = loaded_store();
        let replacement = vec![song("a", "甲"), song("b", "乙")];

        store.import_all(replacement).unwrap();
        assert_eq!(store.get("a").unwrap().title, "甲");
        assert!(store.get("1").is_none());
        assert!(store.get("2").is_none());
        assert_eq!(backend.rows().len(), 2);
    }

    #[test]
    fn import_aborts_cleanly_when_delete_all_fails() {
        let (mut store, backend) = loaded_store();
        backend.state.borrow_mut().fail_writes = true;

        let err = store.import_all(vec![song("a", "甲")]).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(store.songs().len(), 2);
        assert_eq!(backend.rows().len(), 2);
    }

    #[test]
    fn import_surfaces_mid_bulk_failure_but_commits_memory() {
        let (mut store, backend) = loaded_store();
        backend.state.borrow_mut().fail_after_inserts = Some(1);

        let err = store
            .import_all(vec![song("a", "甲"), song("b", "乙")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        // Memory holds the full replacement even though the backend only
        // accepted the first record.
        assert_eq!(store.songs().len(), 2);
        assert_eq!(backend.rows().len(), 1);
    }

    #[test]
    fn undo_restores_states_in_lifo_order() {
        let (mut store, _) = loaded_store();
        let s0 = store.songs().to_vec();
        store.create(song("3", "第三首")).unwrap();
        let s1 = store.songs().to_vec();
        store.create(song("4", "第四首")).unwrap();

        assert!(store.undo());
        assert_eq!(store.songs(), s1.as_slice());
        assert!(store.undo());
        assert_eq!(store.songs(), s0.as_slice());
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let (mut store, _) = loaded_store();
        let before = store.songs().to_vec();
        assert!(!store.undo());
        assert_eq!(store.songs(), before.as_slice());
    }

    #[test]
    fn undo_does_not_write_to_the_backend() {
        let (mut store, backend) = loaded_store();
        store.create(song("3", "暫存")).unwrap();
        assert!(store.undo());

        // In-memory rollback only: the backend still holds the record.
        assert!(store.get("3").is_none());
        assert!(backend.rows().iter().any(|r| r.id == "3"));
    }

    #[test]
    fn history_is_bounded_to_capacity() {
        let (mut store, _) = loaded_store();
        let patch = SongPatch {
            is_editor_pick: Some(true),
            ..SongPatch::default()
        };

        // One more mutation than the history holds.
        for _ in 0..HISTORY_CAPACITY + 1 {
            store.update("1", &patch).unwrap();
        }
        assert_eq!(store.undo_depth(), HISTORY_CAPACITY);

        let mut undos = 0;
        while store.undo() {
            undos += 1;
        }
        assert_eq!(undos, HISTORY_CAPACITY);
    }

    #[test]
    fn oldest_reachable_state_is_the_oldest_retained_snapshot() {
        let (mut store, _) = loaded_store();
        // First mutation's snapshot (the original two-song state) gets
        // evicted once capacity more mutations follow it.
        store.create(song("extra-0", "第零首")).unwrap();
        let oldest_retained = store.songs().to_vec();
        for i in 1..=HISTORY_CAPACITY {
            store.create(song(&format!("extra-{i}"), "填充")).unwrap();
        }

        while store.undo() {}
        assert_eq!(store.songs(), oldest_retained.as_slice());
    }
}
