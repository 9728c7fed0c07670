//! Whole-catalog JSON import and export. Exports are pretty-printed with the
//! catalog's camelCase wire names so they stay interchangeable with backups
//! made by earlier versions of the tooling. Imports are validated before any
//! state is touched: a payload whose top level is not an array is rejected
//! outright, because replacing the collection with garbage is the one mistake
//! undo cannot fully protect against once it ages out of the history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde_json::Value;

use crate::catalog::StoreError;
use crate::models::Song;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".song-catalog-manager";
/// Fixed file name for catalog exports, also where import looks first.
const EXPORT_FILE_NAME: &str = "catalog-export.json";

/// Resolve the fixed export/import path inside the user's home.
pub fn default_transfer_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(EXPORT_FILE_NAME))
}

/// Write the collection to `path` as a pretty-printed JSON array.
pub fn export_catalog(songs: &[Song], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create export directory")?;
    }
    let text = serde_json::to_string_pretty(songs).context("failed to encode catalog")?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Read and validate an import file. Returns the decoded collection ready for
/// `CatalogStore::import_all`, or a [`StoreError::Validation`] if the payload
/// is not a JSON array of song records. A missing file is an expected
/// first-use condition (nothing has been exported yet), so it gets its own
/// plain-language message instead of a raw I/O error. Nothing is mutated
/// here; the caller decides whether to go through with the destructive
/// replace.
pub fn read_import(path: &Path) -> Result<Vec<Song>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::Persistence(anyhow!(
                "no export file found at {}; export the catalog first",
                path.display()
            )));
        }
        Err(err) => {
            return Err(StoreError::Persistence(
                anyhow::Error::new(err)
                    .context(format!("failed to read {}", path.display())),
            ));
        }
    };
    parse_import(&text)
}

/// Validate and decode an import payload.
pub fn parse_import(text: &str) -> Result<Vec<Song>, StoreError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| StoreError::Validation(format!("not valid JSON: {err}")))?;

    if !value.is_array() {
        return Err(StoreError::Validation(
            "expected a JSON array of songs".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|err| StoreError::Validation(format!("not a song collection: {err}")))
}
