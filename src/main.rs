//! Binary entry point that glues the SQLite-backed catalog store to the TUI.
//! The bootstrapping pipeline: open the embedded database, hydrate the store
//! (falling back to the built-in sample catalog on first run), and drive the
//! Ratatui event loop until the user exits.
use song_catalog_manager::{run_app, App, CatalogStore, LoadSource, SqliteBackend};

/// Initialize persistence, load the catalog, and launch the Ratatui event
/// loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable home directory) to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let backend = SqliteBackend::open_default()?;
    let mut store = CatalogStore::new(Box::new(backend));
    let source = store.load();

    let mut app = App::new(store);
    if let LoadSource::Seed = source {
        app = app.with_startup_notice("No saved catalog found; loaded the sample catalog.");
    }

    run_app(&mut app)
}
