//! Modal form state for creating and editing songs, plus the confirmation
//! dialog payloads. The song form covers many more fields than fit a
//! hand-written match per field, so the values live in an index-addressed
//! array and the field metadata in one table; focus handling, rendering, and
//! diffing all walk that table.

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Song, SongPatch, LANGUAGES, PROJECT_TYPES};

/// Editable fields, in the order they appear in the modal. `Title` must stay
/// first: it is the only required field and the form opens focused on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SongField {
    Title,
    VersionLabel,
    Language,
    ProjectType,
    ReleaseDate,
    Isrc,
    Upc,
    SpotifyId,
    SpotifyLink,
    YoutubeUrl,
    YoutubeMusicUrl,
    AppleMusicLink,
    MusixmatchUrl,
    CoverUrl,
    Lyrics,
    Credits,
    Description,
}

/// Display metadata per field: label shown in the modal, whether a blank
/// value is acceptable, and the well-known values (if any) that ↑/↓ cycle
/// through instead of typing.
struct FieldSpec {
    field: SongField,
    label: &'static str,
    required: bool,
    choices: Option<&'static [&'static str]>,
}

const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: SongField::Title,
        label: "Title",
        required: true,
        choices: None,
    },
    FieldSpec {
        field: SongField::VersionLabel,
        label: "Version",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Language,
        label: "Language",
        required: false,
        choices: Some(LANGUAGES),
    },
    FieldSpec {
        field: SongField::ProjectType,
        label: "Project",
        required: false,
        choices: Some(PROJECT_TYPES),
    },
    FieldSpec {
        field: SongField::ReleaseDate,
        label: "Released",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Isrc,
        label: "ISRC",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Upc,
        label: "UPC",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::SpotifyId,
        label: "Spotify ID",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::SpotifyLink,
        label: "Spotify URL",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::YoutubeUrl,
        label: "YouTube URL",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::YoutubeMusicUrl,
        label: "YT Music",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::AppleMusicLink,
        label: "Apple Music",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::MusixmatchUrl,
        label: "Musixmatch",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::CoverUrl,
        label: "Cover URL",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Lyrics,
        label: "Lyrics",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Credits,
        label: "Credits",
        required: false,
        choices: None,
    },
    FieldSpec {
        field: SongField::Description,
        label: "Description",
        required: false,
        choices: None,
    },
];

/// Form state for song creation/editing. When editing, `original` keeps the
/// record as it was so saving produces a patch of only the changed fields.
pub(crate) struct SongForm {
    values: Vec<String>,
    active: usize,
    pub(crate) error: Option<String>,
    original: Option<Song>,
}

impl Default for SongForm {
    fn default() -> Self {
        Self {
            values: vec![String::new(); FIELD_SPECS.len()],
            active: 0,
            error: None,
            original: None,
        }
    }
}

impl SongForm {
    /// Populate the form from an existing song when entering edit mode.
    pub(crate) fn from_song(song: &Song) -> Self {
        let mut form = Self::default();
        for (idx, spec) in FIELD_SPECS.iter().enumerate() {
            form.values[idx] = field_value(song, spec.field);
        }
        form.original = Some(song.clone());
        form
    }

    /// Number of input rows the modal needs.
    pub(crate) fn field_count() -> usize {
        FIELD_SPECS.len()
    }

    /// Cycle focus forward through the fields.
    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % FIELD_SPECS.len();
    }

    /// Cycle focus backward through the fields.
    pub(crate) fn prev_field(&mut self) {
        self.active = (self.active + FIELD_SPECS.len() - 1) % FIELD_SPECS.len();
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.values[self.active].push(ch);
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        self.values[self.active].pop();
    }

    /// Step through the active field's well-known values, when it has any.
    /// A blank field starts at the first (or last) choice; a free-text value
    /// that is not in the list restarts the cycle. Returns whether the field
    /// offers choices at all, so the caller can ignore ↑/↓ elsewhere.
    pub(crate) fn cycle_choice(&mut self, step: isize) -> bool {
        let choices = match FIELD_SPECS[self.active].choices {
            Some(choices) if !choices.is_empty() => choices,
            _ => return false,
        };

        let len = choices.len() as isize;
        let current = choices
            .iter()
            .position(|choice| *choice == self.values[self.active]);
        let next = match current {
            Some(idx) => (idx as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.values[self.active] = choices[next as usize].to_string();
        true
    }

    /// Build a brand new record from the form. The id is supplied by the
    /// caller because assignment policy (timestamps today) belongs to the
    /// app, not to form state.
    pub(crate) fn parse_new(&self, id: String) -> Result<Song> {
        let title = self.required_title()?;
        let mut song = Song {
            id,
            title,
            ..Song::default()
        };
        for (idx, spec) in FIELD_SPECS.iter().enumerate() {
            if spec.field == SongField::Title {
                continue;
            }
            set_field(&mut song, spec.field, trimmed_option(&self.values[idx]));
        }
        Ok(song)
    }

    /// Diff the form against the record it was opened with, producing a patch
    /// that carries only the fields the operator actually changed. Clearing
    /// a previously-set field becomes an explicit clear in the patch.
    pub(crate) fn parse_patch(&self) -> Result<SongPatch> {
        let original = self
            .original
            .as_ref()
            .ok_or_else(|| anyhow!("form was not opened for editing"))?;
        let title = self.required_title()?;

        let mut patch = SongPatch::default();
        if title != original.title {
            patch.title = Some(title);
        }
        for (idx, spec) in FIELD_SPECS.iter().enumerate() {
            if spec.field == SongField::Title {
                continue;
            }
            let new_value = trimmed_option(&self.values[idx]);
            if new_value != optional_of(original, spec.field) {
                set_patch_field(&mut patch, spec.field, new_value);
            }
        }
        Ok(patch)
    }

    fn required_title(&self) -> Result<String> {
        let title = self.values[0].trim();
        if title.is_empty() {
            return Err(anyhow!("Song title is required."));
        }
        Ok(title.to_string())
    }

    /// Render one styled line per field for the modal.
    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        FIELD_SPECS
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let value = &self.values[idx];
                let is_active = idx == self.active;

                let display = if value.is_empty() {
                    if spec.required {
                        "<required>".to_string()
                    } else {
                        "<optional>".to_string()
                    }
                } else {
                    value.clone()
                };

                let style = if is_active {
                    Style::default().fg(Color::Yellow)
                } else if value.is_empty() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };

                Line::from(vec![
                    Span::raw(format!("{:<12}", format!("{}:", spec.label))),
                    Span::styled(display, style),
                ])
            })
            .collect()
    }

    /// Cursor position within the modal's inner area: the active row, offset
    /// past the fixed-width label and the value typed so far.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let x = 12 + self.values[self.active].chars().count() as u16;
        (x, self.active as u16)
    }
}

/// Current value of one editable field, flattened to a display string.
fn field_value(song: &Song, field: SongField) -> String {
    match field {
        SongField::Title => song.title.clone(),
        _ => optional_of(song, field).unwrap_or_default(),
    }
}

fn optional_of(song: &Song, field: SongField) -> Option<String> {
    match field {
        SongField::Title => Some(song.title.clone()),
        SongField::VersionLabel => song.version_label.clone(),
        SongField::Language => song.language.clone(),
        SongField::ProjectType => song.project_type.clone(),
        SongField::ReleaseDate => song.release_date.clone(),
        SongField::Isrc => song.isrc.clone(),
        SongField::Upc => song.upc.clone(),
        SongField::SpotifyId => song.spotify_id.clone(),
        SongField::SpotifyLink => song.spotify_link.clone(),
        SongField::YoutubeUrl => song.youtube_url.clone(),
        SongField::YoutubeMusicUrl => song.youtube_music_url.clone(),
        SongField::AppleMusicLink => song.apple_music_link.clone(),
        SongField::MusixmatchUrl => song.musixmatch_url.clone(),
        SongField::CoverUrl => song.cover_url.clone(),
        SongField::Lyrics => song.lyrics.clone(),
        SongField::Credits => song.credits.clone(),
        SongField::Description => song.description.clone(),
    }
}

fn set_field(song: &mut Song, field: SongField, value: Option<String>) {
    match field {
        SongField::Title => song.title = value.unwrap_or_default(),
        SongField::VersionLabel => song.version_label = value,
        SongField::Language => song.language = value,
        SongField::ProjectType => song.project_type = value,
        SongField::ReleaseDate => song.release_date = value,
        SongField::Isrc => song.isrc = value,
        SongField::Upc => song.upc = value,
        SongField::SpotifyId => song.spotify_id = value,
        SongField::SpotifyLink => song.spotify_link = value,
        SongField::YoutubeUrl => song.youtube_url = value,
        SongField::YoutubeMusicUrl => song.youtube_music_url = value,
        SongField::AppleMusicLink => song.apple_music_link = value,
        SongField::MusixmatchUrl => song.musixmatch_url = value,
        SongField::CoverUrl => song.cover_url = value,
        SongField::Lyrics => song.lyrics = value,
        SongField::Credits => song.credits = value,
        SongField::Description => song.description = value,
    }
}

fn set_patch_field(patch: &mut SongPatch, field: SongField, value: Option<String>) {
    match field {
        SongField::Title => patch.title = value,
        SongField::VersionLabel => patch.version_label = Some(value),
        SongField::Language => patch.language = Some(value),
        SongField::ProjectType => patch.project_type = Some(value),
        SongField::ReleaseDate => patch.release_date = Some(value),
        SongField::Isrc => patch.isrc = Some(value),
        SongField::Upc => patch.upc = Some(value),
        SongField::SpotifyId => patch.spotify_id = Some(value),
        SongField::SpotifyLink => patch.spotify_link = Some(value),
        SongField::YoutubeUrl => patch.youtube_url = Some(value),
        SongField::YoutubeMusicUrl => patch.youtube_music_url = Some(value),
        SongField::AppleMusicLink => patch.apple_music_link = Some(value),
        SongField::MusixmatchUrl => patch.musixmatch_url = Some(value),
        SongField::CoverUrl => patch.cover_url = Some(value),
        SongField::Lyrics => patch.lyrics = Some(value),
        SongField::Credits => patch.credits = Some(value),
        SongField::Description => patch.description = Some(value),
    }
}

fn trimmed_option(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// State for confirming permanent song deletion.
pub(crate) struct ConfirmDelete {
    pub(crate) song: Song,
}

/// State for confirming a destructive catalog import. The payload is already
/// read and validated; confirming hands it to the store.
pub(crate) struct ConfirmImport {
    pub(crate) songs: Vec<Song>,
}
