//! Embedded SQLite backend. Every method tries to encapsulate one query or
//! migration so the rest of the codebase can stay focused on catalog and UI
//! state management. Column names are the snake_case twins of the model's
//! camelCase wire names; the translation lives entirely in this file.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::models::{Song, SongPatch};
use crate::persist::CatalogBackend;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".song-catalog-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";

/// Backend over an embedded SQLite database, one row per song.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Ensure the database file exists under the user's home directory, run
    /// lazy migrations, and return a ready backend. Foreign keys are enabled
    /// on every open so the behavior matches between tests and production
    /// runs even though the current schema has a single table.
    pub fn open_default() -> Result<Self> {
        let db_path = db_path()?;

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
        Self::with_connection(conn)
    }

    /// Wrap an already-open connection. Lets tests run against an in-memory
    /// database with the exact schema production uses.
    pub fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("failed to enable foreign keys")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                version_label TEXT,
                cover_url TEXT,
                language TEXT,
                project_type TEXT,
                release_date TEXT,
                is_editor_pick INTEGER NOT NULL DEFAULT 0,
                isrc TEXT,
                upc TEXT,
                spotify_id TEXT,
                music_brainz_artist_id TEXT,
                youtube_url TEXT,
                musixmatch_url TEXT,
                youtube_music_url TEXT,
                spotify_link TEXT,
                apple_music_link TEXT,
                lyrics TEXT,
                description TEXT,
                credits TEXT,
                created_at INTEGER NOT NULL
            )",
            [],
        )
        .context("failed to create songs table")?;

        Ok(Self { conn })
    }
}

/// Milliseconds since the Unix epoch, used as the creation-order key.
fn now_millis() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?;
    Ok(elapsed.as_millis() as i64)
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// Turn a patch into `(column, value)` pairs for a dynamic UPDATE. This is
/// the storage-facing half of the naming translation: each model field maps
/// to exactly one snake_case column, and an inner `None` becomes SQL NULL so
/// a patch can clear a field.
fn assignments(patch: &SongPatch) -> Vec<(&'static str, Value)> {
    fn text(value: &Option<String>) -> Value {
        match value {
            Some(text) => Value::Text(text.clone()),
            None => Value::Null,
        }
    }

    let mut out = Vec::new();
    if let Some(title) = &patch.title {
        out.push(("title", Value::Text(title.clone())));
    }
    if let Some(value) = &patch.version_label {
        out.push(("version_label", text(value)));
    }
    if let Some(value) = &patch.cover_url {
        out.push(("cover_url", text(value)));
    }
    if let Some(value) = &patch.language {
        out.push(("language", text(value)));
    }
    if let Some(value) = &patch.project_type {
        out.push(("project_type", text(value)));
    }
    if let Some(value) = &patch.release_date {
        out.push(("release_date", text(value)));
    }
    if let Some(value) = patch.is_editor_pick {
        out.push(("is_editor_pick", Value::Integer(value as i64)));
    }
    if let Some(value) = &patch.isrc {
        out.push(("isrc", text(value)));
    }
    if let Some(value) = &patch.upc {
        out.push(("upc", text(value)));
    }
    if let Some(value) = &patch.spotify_id {
        out.push(("spotify_id", text(value)));
    }
    if let Some(value) = &patch.music_brainz_artist_id {
        out.push(("music_brainz_artist_id", text(value)));
    }
    if let Some(value) = &patch.youtube_url {
        out.push(("youtube_url", text(value)));
    }
    if let Some(value) = &patch.musixmatch_url {
        out.push(("musixmatch_url", text(value)));
    }
    if let Some(value) = &patch.youtube_music_url {
        out.push(("youtube_music_url", text(value)));
    }
    if let Some(value) = &patch.spotify_link {
        out.push(("spotify_link", text(value)));
    }
    if let Some(value) = &patch.apple_music_link {
        out.push(("apple_music_link", text(value)));
    }
    if let Some(value) = &patch.lyrics {
        out.push(("lyrics", text(value)));
    }
    if let Some(value) = &patch.description {
        out.push(("description", text(value)));
    }
    if let Some(value) = &patch.credits {
        out.push(("credits", text(value)));
    }
    out
}

impl CatalogBackend for SqliteBackend {
    /// Retrieve every song, newest creation first. The rowid tiebreak keeps
    /// records written in the same millisecond (a bulk import) in the order
    /// they were inserted last-to-first, which matches the import sequence.
    fn fetch_all(&mut self) -> Result<Vec<Song>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, version_label, cover_url, language, project_type,
                        release_date, is_editor_pick, isrc, upc, spotify_id,
                        music_brainz_artist_id, youtube_url, musixmatch_url,
                        youtube_music_url, spotify_link, apple_music_link,
                        lyrics, description, credits
                 FROM songs
                 ORDER BY created_at DESC, rowid DESC",
            )
            .context("failed to prepare songs query")?;

        let songs = stmt
            .query_map([], |row| {
                Ok(Song {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    version_label: row.get(2)?,
                    cover_url: row.get(3)?,
                    language: row.get(4)?,
                    project_type: row.get(5)?,
                    release_date: row.get(6)?,
                    is_editor_pick: row.get(7)?,
                    isrc: row.get(8)?,
                    upc: row.get(9)?,
                    spotify_id: row.get(10)?,
                    music_brainz_artist_id: row.get(11)?,
                    youtube_url: row.get(12)?,
                    musixmatch_url: row.get(13)?,
                    youtube_music_url: row.get(14)?,
                    spotify_link: row.get(15)?,
                    apple_music_link: row.get(16)?,
                    lyrics: row.get(17)?,
                    description: row.get(18)?,
                    credits: row.get(19)?,
                })
            })
            .context("failed to iterate songs")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect songs")?;

        Ok(songs)
    }

    fn insert(&mut self, song: &Song) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO songs (
                    id, title, version_label, cover_url, language, project_type,
                    release_date, is_editor_pick, isrc, upc, spotify_id,
                    music_brainz_artist_id, youtube_url, musixmatch_url,
                    youtube_music_url, spotify_link, apple_music_link,
                    lyrics, description, credits, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                          ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                params![
                    song.id,
                    song.title,
                    song.version_label,
                    song.cover_url,
                    song.language,
                    song.project_type,
                    song.release_date,
                    song.is_editor_pick,
                    song.isrc,
                    song.upc,
                    song.spotify_id,
                    song.music_brainz_artist_id,
                    song.youtube_url,
                    song.musixmatch_url,
                    song.youtube_music_url,
                    song.spotify_link,
                    song.apple_music_link,
                    song.lyrics,
                    song.description,
                    song.credits,
                    now_millis()?,
                ],
            )
            .context("failed to insert song")?;
        Ok(())
    }

    /// Build a dynamic UPDATE from the supplied fields only. Touching zero
    /// rows is deliberately not an error: the store treats updates against a
    /// vanished id as a silent no-op.
    fn update_fields(&mut self, id: &str, patch: &SongPatch) -> Result<()> {
        let assignments = assignments(patch);
        if assignments.is_empty() {
            return Ok(());
        }

        let set_clauses: Vec<String> = assignments
            .iter()
            .enumerate()
            .map(|(idx, (column, _))| format!("{column} = ?{}", idx + 1))
            .collect();
        let sql = format!(
            "UPDATE songs SET {} WHERE id = ?{}",
            set_clauses.join(", "),
            assignments.len() + 1
        );

        let mut values: Vec<Value> = assignments.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Text(id.to_string()));

        self.conn
            .execute(&sql, params_from_iter(values))
            .context("failed to update song fields")?;
        Ok(())
    }

    fn delete_by_id(&mut self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM songs WHERE id = ?1", params![id])
            .context("failed to delete song")?;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM songs", [])
            .context("failed to clear songs table")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_catalog;

    fn backend() -> SqliteBackend {
        SqliteBackend::with_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn song(id: &str, title: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn round_trips_every_field() {
        let mut backend = backend();
        let original = seed_catalog().remove(0);
        backend.insert(&original).unwrap();

        let fetched = backend.fetch_all().unwrap().remove(0);
        assert_eq!(fetched, original);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut backend = backend();
        backend.insert(&song("1", "first")).unwrap();
        assert!(backend.insert(&song("1", "again")).is_err());
    }

    #[test]
    fn fetch_orders_newest_creation_first() {
        let mut backend = backend();
        backend.insert(&song("old", "舊")).unwrap();
        backend.insert(&song("new", "新")).unwrap();

        let ids: Vec<String> = backend
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn update_touches_only_patched_columns() {
        let mut backend = backend();
        backend.insert(&seed_catalog().remove(0)).unwrap();

        let patch = SongPatch {
            is_editor_pick: Some(false),
            upc: Some(Some("198000000001".to_string())),
            lyrics: Some(None),
            ..SongPatch::default()
        };
        backend.update_fields("1", &patch).unwrap();

        let row = backend.fetch_all().unwrap().remove(0);
        assert!(!row.is_editor_pick);
        assert_eq!(row.upc.as_deref(), Some("198000000001"));
        assert_eq!(row.lyrics, None);
        assert_eq!(row.title, "再愛一次");
    }

    #[test]
    fn update_of_missing_id_is_not_an_error() {
        let mut backend = backend();
        let patch = SongPatch {
            title: Some("ghost".to_string()),
            ..SongPatch::default()
        };
        assert!(backend.update_fields("missing", &patch).is_ok());
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut backend = backend();
        backend.insert(&song("1", "原樣")).unwrap();
        backend.update_fields("1", &SongPatch::default()).unwrap();
        assert_eq!(backend.fetch_all().unwrap()[0].title, "原樣");
    }

    #[test]
    fn delete_all_empties_the_table() {
        let mut backend = backend();
        for song in seed_catalog() {
            backend.insert(&song).unwrap();
        }
        backend.delete_all().unwrap();
        assert!(backend.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn every_patch_field_maps_to_a_column() {
        // The naming translation is a pure mapping; a patch touching every
        // field must produce one assignment per field.
        let patch = SongPatch {
            title: Some("t".to_string()),
            version_label: Some(None),
            cover_url: Some(None),
            language: Some(None),
            project_type: Some(None),
            release_date: Some(None),
            is_editor_pick: Some(true),
            isrc: Some(None),
            upc: Some(None),
            spotify_id: Some(None),
            music_brainz_artist_id: Some(None),
            youtube_url: Some(None),
            musixmatch_url: Some(None),
            youtube_music_url: Some(None),
            spotify_link: Some(None),
            apple_music_link: Some(None),
            lyrics: Some(None),
            description: Some(None),
            credits: Some(None),
        };

        let pairs = assignments(&patch);
        assert_eq!(pairs.len(), 19);
        // Spot-check the camelCase-to-snake_case translation.
        assert!(pairs.iter().any(|(col, _)| *col == "music_brainz_artist_id"));
        assert!(pairs.iter().any(|(col, _)| *col == "is_editor_pick"));
    }
}
