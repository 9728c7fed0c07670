//! Screen state containers. Each screen owns a cloned snapshot of whatever
//! catalog data it displays; the app refreshes those snapshots from the store
//! after every mutation, so screens never reach into the store themselves
//! while drawing.

use crate::models::Song;

/// The main catalog list: every song, filterable by a free-text search and an
/// editor-pick toggle, with a clamped selection index.
pub(crate) struct CatalogScreen {
    pub(crate) songs: Vec<Song>,
    pub(crate) filtered_songs: Vec<Song>,
    pub(crate) filter: Option<String>,
    pub(crate) show_only_picks: bool,
    pub(crate) selected: usize,
}

impl CatalogScreen {
    pub(crate) fn new(songs: Vec<Song>) -> Self {
        let mut screen = Self {
            filtered_songs: Vec::new(),
            songs,
            filter: None,
            show_only_picks: false,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    /// Search matches title, ISRC, or UPC, the identifiers the operator
    /// actually pastes in when chasing a distribution question.
    pub(crate) fn apply_filter(&mut self) {
        let base: Vec<Song> = if let Some(query) = &self.filter {
            let query = query.trim().to_lowercase();
            if query.is_empty() {
                self.songs.clone()
            } else {
                self.songs
                    .iter()
                    .filter(|song| {
                        song.title.to_lowercase().contains(&query)
                            || matches_optional(&song.isrc, &query)
                            || matches_optional(&song.upc, &query)
                    })
                    .cloned()
                    .collect()
            }
        } else {
            self.songs.clone()
        };

        if self.show_only_picks {
            self.filtered_songs = base.into_iter().filter(|s| s.is_editor_pick).collect();
        } else {
            self.filtered_songs = base;
        }

        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn toggle_show_picks(&mut self) -> bool {
        self.show_only_picks = !self.show_only_picks;
        self.apply_filter();
        self.show_only_picks
    }

    pub(crate) fn current_song(&self) -> Option<&Song> {
        self.filtered_songs.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.filtered_songs.is_empty() {
            return;
        }
        let len = self.filtered_songs.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.filtered_songs.is_empty() {
            self.selected = self.filtered_songs.len() - 1;
        }
    }

    /// Replace the snapshot after a store mutation, keeping filter and
    /// selection as stable as the new data allows.
    pub(crate) fn set_songs(&mut self, songs: Vec<Song>) {
        self.songs = songs;
        self.apply_filter();
    }

    fn ensure_in_bounds(&mut self) {
        if self.filtered_songs.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered_songs.len() {
            self.selected = self.filtered_songs.len() - 1;
        }
    }
}

/// Read-only detail view of one record. Holds the id (not the record) so the
/// drawing code re-resolves against the live collection; if the record was
/// removed underneath us the app falls back to the catalog screen.
pub(crate) struct DetailScreen {
    pub(crate) song_id: String,
    pub(crate) scroll: u16,
}

impl DetailScreen {
    pub(crate) fn new(song_id: String) -> Self {
        Self { song_id, scroll: 0 }
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let new = self.scroll as i32 + delta;
        self.scroll = new.max(0).min(u16::MAX as i32) as u16;
    }
}

fn matches_optional(value: &Option<String>, query: &str) -> bool {
    value
        .as_deref()
        .map(|v| v.to_lowercase().contains(query))
        .unwrap_or(false)
}
