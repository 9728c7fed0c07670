//! Flat-file JSON backend. The whole collection lives in a single array,
//! newest first, rewritten on every mutation. That makes each write O(n), but
//! the catalog is a few hundred records at most and the payoff is a file the
//! operator can open, diff, or back up by hand.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::{Song, SongPatch};
use crate::persist::CatalogBackend;

/// Backend persisting the catalog as one JSON array on disk.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// A missing file is surfaced as an error from `fetch_all`, which the
    /// store answers by seeding the sample catalog; the file then appears on
    /// the first successful write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_collection(&self) -> Result<Vec<Song>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read catalog file {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("catalog file {} is not valid JSON", self.path.display()))
    }

    fn write_collection(&self, songs: &[Song]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let text = serde_json::to_string_pretty(songs).context("failed to encode catalog")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write catalog file {}", self.path.display()))
    }

    /// Current contents, or an empty collection when the file does not exist
    /// yet. Write paths use this so the first insert works on a fresh setup.
    fn read_or_empty(&self) -> Result<Vec<Song>> {
        if self.path.exists() {
            self.read_collection()
        } else {
            Ok(Vec::new())
        }
    }
}

impl CatalogBackend for JsonFileBackend {
    fn fetch_all(&mut self) -> Result<Vec<Song>> {
        self.read_collection()
    }

    fn insert(&mut self, song: &Song) -> Result<()> {
        let mut songs = self.read_or_empty()?;
        if songs.iter().any(|existing| existing.id == song.id) {
            anyhow::bail!("a song with id {} already exists", song.id);
        }
        songs.insert(0, song.clone());
        self.write_collection(&songs)
    }

    fn update_fields(&mut self, id: &str, patch: &SongPatch) -> Result<()> {
        let mut songs = self.read_or_empty()?;
        if let Some(song) = songs.iter_mut().find(|song| song.id == id) {
            patch.apply(song);
            self.write_collection(&songs)?;
        }
        Ok(())
    }

    fn delete_by_id(&mut self, id: &str) -> Result<()> {
        let mut songs = self.read_or_empty()?;
        songs.retain(|song| song.id != id);
        self.write_collection(&songs)
    }

    fn delete_all(&mut self) -> Result<()> {
        self.write_collection(&[])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::models::seed_catalog;

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Each test gets its own file so they can run in parallel.
    fn scratch_backend() -> (JsonFileBackend, PathBuf) {
        let unique = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "song-catalog-test-{}-{unique}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        (JsonFileBackend::new(path.clone()), path)
    }

    fn song(id: &str, title: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn fetch_fails_until_first_write() {
        let (mut backend, path) = scratch_backend();
        assert!(backend.fetch_all().is_err());

        backend.insert(&song("1", "第一首")).unwrap();
        assert_eq!(backend.fetch_all().unwrap().len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn insert_prepends_and_rejects_duplicates() {
        let (mut backend, path) = scratch_backend();
        backend.insert(&song("1", "舊")).unwrap();
        backend.insert(&song("2", "新")).unwrap();
        assert!(backend.insert(&song("1", "重複")).is_err());

        let ids: Vec<String> = backend
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn update_and_delete_round_trip_through_the_file() {
        let (mut backend, path) = scratch_backend();
        for song in seed_catalog().into_iter().rev() {
            backend.insert(&song).unwrap();
        }

        let patch = SongPatch {
            upc: Some(Some("198000000001".to_string())),
            ..SongPatch::default()
        };
        backend.update_fields("2", &patch).unwrap();
        backend.delete_by_id("1").unwrap();

        let songs = backend.fetch_all().unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "2");
        assert_eq!(songs[0].upc.as_deref(), Some("198000000001"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn delete_all_leaves_an_empty_array() {
        let (mut backend, path) = scratch_backend();
        backend.insert(&song("1", "唯一")).unwrap();
        backend.delete_all().unwrap();
        assert!(backend.fetch_all().unwrap().is_empty());
        let _ = fs::remove_file(path);
    }
}
