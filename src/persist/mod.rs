//! Persistence backends for the catalog store. The store talks to durable
//! storage exclusively through [`CatalogBackend`], so swapping the embedded
//! SQLite database for the flat JSON file (or a future remote table) never
//! touches the store's transactional behavior.

mod json_file;
mod sqlite;

use anyhow::Result;

use crate::models::{Song, SongPatch};

pub use json_file::JsonFileBackend;
pub use sqlite::SqliteBackend;

/// The narrow interface the store depends on. Five operations, field-level
/// partial updates required; anything beyond that (ordering keys, naming
/// conventions, file layout) is the backend's own concern.
pub trait CatalogBackend {
    /// Every stored record, in descending creation order when the backend
    /// can order, otherwise in stored order.
    fn fetch_all(&mut self) -> Result<Vec<Song>>;

    /// Insert semantics: a record whose `id` already exists is an error.
    fn insert(&mut self, song: &Song) -> Result<()>;

    /// Persist only the fields the patch carries. A missing `id` is not an
    /// error; zero records are touched.
    fn update_fields(&mut self, id: &str, patch: &SongPatch) -> Result<()>;

    /// Remove one record. A missing `id` is not an error.
    fn delete_by_id(&mut self, id: &str) -> Result<()>;

    /// Remove every record. Used only by the destructive import.
    fn delete_all(&mut self) -> Result<()>;
}
