//! Core library surface for the song catalog manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the undo-capable [`catalog::CatalogStore`], the persistence
//! backends it delegates to, and the Ratatui front end.
pub mod backup;
pub mod catalog;
pub mod models;
pub mod persist;
pub mod ui;

/// The store at the heart of the application, plus its error type.
pub use catalog::{CatalogStore, LoadSource, StoreError};

/// The primary domain types that other layers manipulate.
pub use models::{Song, SongPatch};

/// The persistence seam and the shipped backends.
pub use persist::{CatalogBackend, JsonFileBackend, SqliteBackend};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
