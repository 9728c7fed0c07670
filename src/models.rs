//! Domain models shared between the catalog store, the persistence backends,
//! and the TUI. The intent is that these types stay light-weight data holders
//! so other layers can focus on presentation and persistence logic. Keeping
//! the commentary here means later refactors can reconstruct the assumptions
//! even if other context is lost.

use serde::{Deserialize, Serialize};

/// Language labels the song form cycles through with ↑/↓. These mirror the
/// catalog's existing data, so keeping them as plain strings (instead of an
/// enum) lets imported records carry values we never anticipated.
pub const LANGUAGES: &[&str] = &[
    "華語",
    "台語",
    "日語",
    "韓語",
    "英語",
    "泰語",
    "義大利語",
    "法語",
    "純音樂",
];

/// Project classifications the song form cycles through with ↑/↓.
pub const PROJECT_TYPES: &[&str] = &["獨立發行", "泡麵聲學院"];

/// A single song's metadata entry. Only `id` and `title` are guaranteed to be
/// present; every other field is optional and the rest of the crate must
/// tolerate its absence. Serialized with camelCase names so exported JSON
/// matches the shape the catalog has always used externally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Song {
    /// Opaque unique identifier, assigned at creation time and never changed.
    pub id: String,
    /// Display title. The form layer refuses to save an empty title; the
    /// store itself does not validate it.
    pub title: String,
    /// Version qualifier such as "Acoustic Ver." or "Remix".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,
    /// Cover art URL. Stored as raw text, never fetched by this crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Lyric language, normally one of [`LANGUAGES`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Release project classification, normally one of [`PROJECT_TYPES`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    /// Release date kept as free text (the catalog predates any strict date
    /// handling and imported data is not guaranteed to parse).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Whether the song is featured on the home page.
    pub is_editor_pick: bool,
    /// International Standard Recording Code, uniqueness not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    /// Universal Product Code of the release the song belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    /// Spotify track id, used for the embedded now-playing view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<String>,
    /// MusicBrainz artist id associated with the recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_brainz_artist_id: Option<String>,
    /// Lyric video / MV link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musixmatch_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_music_url: Option<String>,
    /// Direct Spotify link (distinct from the embed id above).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apple_music_link: Option<String>,
    /// Full lyrics, arbitrary length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Free-text description shown on the detail screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Production credits (producer, arranger, and so on).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
}

impl Song {
    /// Compose a `Title (Version)` string that gracefully omits the
    /// parenthetical when no version label is set. List rows, the detail
    /// header, and status messages all rely on this ready-to-use formatting.
    pub fn display_title(&self) -> String {
        match self.version_label.as_deref().map(str::trim) {
            Some(version) if !version.is_empty() => format!("{} ({})", self.title, version),
            _ => self.title.clone(),
        }
    }

    /// The most useful external link for this song, preferred in the order
    /// the catalog's operator actually reaches for them.
    pub fn primary_link(&self) -> Option<&str> {
        self.spotify_link
            .as_deref()
            .or(self.youtube_url.as_deref())
            .or(self.apple_music_link.as_deref())
            .or(self.youtube_music_url.as_deref())
            .or(self.musixmatch_url.as_deref())
            .filter(|link| !link.trim().is_empty())
    }

    /// Names of the fields the completeness check considers required for a
    /// fully catalogued release. Mirrors the checklist the operator works
    /// through before a distribution submission.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.isrc) {
            missing.push("ISRC");
        }
        if is_blank(&self.lyrics) {
            missing.push("歌詞");
        }
        if is_blank(&self.spotify_link) && is_blank(&self.spotify_id) {
            missing.push("Spotify");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Partial-field merge for [`Song`]. Each `Some` value replaces the matching
/// field; `None` leaves it untouched. Built by the edit form, consumed by
/// both the store (in-memory merge) and the backends (field-level update).
#[derive(Debug, Clone, Default)]
pub struct SongPatch {
    pub title: Option<String>,
    pub version_label: Option<Option<String>>,
    pub cover_url: Option<Option<String>>,
    pub language: Option<Option<String>>,
    pub project_type: Option<Option<String>>,
    pub release_date: Option<Option<String>>,
    pub is_editor_pick: Option<bool>,
    pub isrc: Option<Option<String>>,
    pub upc: Option<Option<String>>,
    pub spotify_id: Option<Option<String>>,
    pub music_brainz_artist_id: Option<Option<String>>,
    pub youtube_url: Option<Option<String>>,
    pub musixmatch_url: Option<Option<String>>,
    pub youtube_music_url: Option<Option<String>>,
    pub spotify_link: Option<Option<String>>,
    pub apple_music_link: Option<Option<String>>,
    pub lyrics: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub credits: Option<Option<String>>,
}

impl SongPatch {
    /// Merge the supplied fields into `song`, leaving everything else alone.
    /// The double-`Option` layout lets a patch distinguish "do not touch"
    /// (outer `None`) from "clear this field" (inner `None`).
    pub fn apply(&self, song: &mut Song) {
        if let Some(title) = &self.title {
            song.title = title.clone();
        }
        if let Some(value) = &self.version_label {
            song.version_label = value.clone();
        }
        if let Some(value) = &self.cover_url {
            song.cover_url = value.clone();
        }
        if let Some(value) = &self.language {
            song.language = value.clone();
        }
        if let Some(value) = &self.project_type {
            song.project_type = value.clone();
        }
        if let Some(value) = &self.release_date {
            song.release_date = value.clone();
        }
        if let Some(value) = self.is_editor_pick {
            song.is_editor_pick = value;
        }
        if let Some(value) = &self.isrc {
            song.isrc = value.clone();
        }
        if let Some(value) = &self.upc {
            song.upc = value.clone();
        }
        if let Some(value) = &self.spotify_id {
            song.spotify_id = value.clone();
        }
        if let Some(value) = &self.music_brainz_artist_id {
            song.music_brainz_artist_id = value.clone();
        }
        if let Some(value) = &self.youtube_url {
            song.youtube_url = value.clone();
        }
        if let Some(value) = &self.musixmatch_url {
            song.musixmatch_url = value.clone();
        }
        if let Some(value) = &self.youtube_music_url {
            song.youtube_music_url = value.clone();
        }
        if let Some(value) = &self.spotify_link {
            song.spotify_link = value.clone();
        }
        if let Some(value) = &self.apple_music_link {
            song.apple_music_link = value.clone();
        }
        if let Some(value) = &self.lyrics {
            song.lyrics = value.clone();
        }
        if let Some(value) = &self.description {
            song.description = value.clone();
        }
        if let Some(value) = &self.credits {
            song.credits = value.clone();
        }
    }

    /// Whether the patch touches anything at all. Saving an unchanged form
    /// still goes through the normal update path, but callers may want to
    /// word their status message differently.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.version_label.is_none()
            && self.cover_url.is_none()
            && self.language.is_none()
            && self.project_type.is_none()
            && self.release_date.is_none()
            && self.is_editor_pick.is_none()
            && self.isrc.is_none()
            && self.upc.is_none()
            && self.spotify_id.is_none()
            && self.music_brainz_artist_id.is_none()
            && self.youtube_url.is_none()
            && self.musixmatch_url.is_none()
            && self.youtube_music_url.is_none()
            && self.spotify_link.is_none()
            && self.apple_music_link.is_none()
            && self.lyrics.is_none()
            && self.description.is_none()
            && self.credits.is_none()
    }
}

/// Built-in sample catalog used when the backend cannot supply data on first
/// run, so the application never opens onto an empty screen.
pub fn seed_catalog() -> Vec<Song> {
    vec![
        Song {
            id: "1".to_string(),
            title: "再愛一次".to_string(),
            version_label: Some("Original".to_string()),
            cover_url: Some("https://picsum.photos/id/26/400/400".to_string()),
            language: Some("華語".to_string()),
            project_type: Some("獨立發行".to_string()),
            release_date: Some("2023-10-15".to_string()),
            is_editor_pick: true,
            isrc: Some("TW-A01-23-00001".to_string()),
            spotify_id: Some("4uLU6hMCjMI75M1A2tKZBC".to_string()),
            lyrics: Some("走在 熟悉的街角\n回憶 像是海浪拍打...".to_string()),
            description: Some("一首關於失去與重逢的抒情搖滾。".to_string()),
            youtube_url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
            musixmatch_url: Some("https://www.musixmatch.com/artist/Willwi".to_string()),
            youtube_music_url: Some("https://music.youtube.com/channel/WillwiID".to_string()),
            ..Song::default()
        },
        Song {
            id: "2".to_string(),
            title: "泡麵之歌".to_string(),
            cover_url: Some("https://picsum.photos/id/192/400/400".to_string()),
            language: Some("日語".to_string()),
            project_type: Some("泡麵聲學院".to_string()),
            release_date: Some("2024-01-20".to_string()),
            is_editor_pick: false,
            isrc: Some("TW-A01-24-00002".to_string()),
            description: Some("深夜肚子餓時的即興創作。".to_string()),
            ..Song::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_omits_blank_version() {
        let mut song = Song {
            id: "x".to_string(),
            title: "Demo".to_string(),
            ..Song::default()
        };
        assert_eq!(song.display_title(), "Demo");

        song.version_label = Some("  ".to_string());
        assert_eq!(song.display_title(), "Demo");

        song.version_label = Some("Remix".to_string());
        assert_eq!(song.display_title(), "Demo (Remix)");
    }

    #[test]
    fn missing_fields_accepts_either_spotify_field() {
        let mut song = seed_catalog().remove(1);
        assert_eq!(song.missing_fields(), vec!["歌詞", "Spotify"]);

        song.spotify_link = Some("https://open.spotify.com/track/abc".to_string());
        assert_eq!(song.missing_fields(), vec!["歌詞"]);
    }

    #[test]
    fn patch_apply_distinguishes_untouched_from_cleared() {
        let mut song = seed_catalog().remove(0);
        let patch = SongPatch {
            is_editor_pick: Some(false),
            lyrics: Some(None),
            ..SongPatch::default()
        };
        patch.apply(&mut song);

        assert!(!song.is_editor_pick);
        assert_eq!(song.lyrics, None);
        // Fields outside the patch keep their values.
        assert_eq!(song.title, "再愛一次");
        assert_eq!(song.isrc.as_deref(), Some("TW-A01-23-00001"));
    }

    #[test]
    fn songs_serialize_with_camel_case_names() {
        let song = seed_catalog().remove(0);
        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["isEditorPick"], serde_json::Value::Bool(true));
        assert_eq!(json["releaseDate"], "2023-10-15");
        // Absent optional fields are omitted entirely.
        assert!(json.get("upc").is_none());
    }

    #[test]
    fn songs_deserialize_with_missing_optional_fields() {
        let song: Song = serde_json::from_str(r#"{"id":"9","title":"最小"}"#).unwrap();
        assert_eq!(song.id, "9");
        assert!(!song.is_editor_pick);
        assert_eq!(song.language, None);
    }
}
