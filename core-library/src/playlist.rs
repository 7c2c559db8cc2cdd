//! # Playlist Resolution
//!
//! Turns tag, category and radio-station queries into ordered, playable
//! tracks.
//!
//! Tracks are never stored. Each query reads the matching documents that
//! carry an audio reference and derives one [`Track`] per distinct audio URL:
//!
//! - `url` is the audio base URL joined with the root-relative audio path
//! - `title` is the decoded file name without its audio extension
//! - `artwork_url` is `<artwork base>/<encoded title>.png` when an artwork
//!   base is configured
//!
//! Order follows the document ordering (pinned first, newest first). When two
//! documents point at the same audio file, the first one wins.

use crate::error::{LibraryError, Result};
use crate::models::{Category, Document};
use crate::repositories::PostRepository;
use core_runtime::config::RadioStation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

const AUDIO_EXTENSIONS: [&str; 5] = [".mp3", ".wav", ".ogg", ".m4a", ".flac"];

/// A playable item derived from a document's audio reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// File path of the document this track came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            artwork_url: None,
            source_path: None,
        }
    }
}

/// Human-readable title for an audio path.
///
/// # Examples
///
/// ```
/// use core_library::playlist::track_title;
///
/// assert_eq!(track_title("/audio/My%20Song.MP3"), "My Song");
/// assert_eq!(track_title("/audio/take.five.flac"), "take.five");
/// ```
pub fn track_title(audio_path: &str) -> String {
    let base = audio_path
        .rsplit('/')
        .next()
        .unwrap_or(audio_path);

    let decoded = urlencoding::decode(base)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| base.to_string());

    let lower = decoded.to_ascii_lowercase();
    let stripped = AUDIO_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &decoded[..decoded.len() - ext.len()])
        .unwrap_or(decoded.as_str());

    stripped.trim().to_string()
}

/// Join a base URL and a root-relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Artwork image URL for a track title.
pub fn artwork_url(artwork_base: &str, title: &str) -> String {
    format!(
        "{}/{}.png",
        artwork_base.trim_end_matches('/'),
        urlencoding::encode(title.trim())
    )
}

/// Resolves tags and radio stations into tracks.
#[derive(Clone)]
pub struct PlaylistResolver {
    posts: Arc<dyn PostRepository>,
    audio_base_url: String,
    artwork_base_url: Option<String>,
    stations: Vec<RadioStation>,
}

impl PlaylistResolver {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        audio_base_url: impl Into<String>,
        stations: Vec<RadioStation>,
    ) -> Self {
        Self {
            posts,
            audio_base_url: audio_base_url.into(),
            artwork_base_url: None,
            stations,
        }
    }

    pub fn with_artwork_base_url(mut self, url: impl Into<String>) -> Self {
        self.artwork_base_url = Some(url.into());
        self
    }

    pub fn radio_stations(&self) -> &[RadioStation] {
        &self.stations
    }

    /// Tracks for every document tagged exactly `tag`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank tag; database errors otherwise.
    #[instrument(skip(self))]
    pub async fn resolve_by_tag(&self, tag: &str) -> Result<Vec<Track>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(LibraryError::invalid("tag", "tag cannot be empty"));
        }

        let documents = self.posts.find_with_audio_by_tag(tag).await?;
        Ok(self.tracks_for_documents(&documents))
    }

    /// Tracks for every audio document in `category`, optionally narrowed to
    /// those tagged exactly `tag` (a genre within the category).
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `tag` is given but blank.
    #[instrument(skip(self))]
    pub async fn resolve_by_category(
        &self,
        category: Category,
        tag: Option<&str>,
    ) -> Result<Vec<Track>> {
        let tag = match tag.map(str::trim) {
            Some("") => return Err(LibraryError::invalid("tag", "tag cannot be empty")),
            other => other,
        };

        let documents = self.posts.find_with_audio_by_category(category, tag).await?;
        Ok(self.tracks_for_documents(&documents))
    }

    /// Tracks for a configured radio station.
    ///
    /// # Errors
    ///
    /// `NotFound` when no station has this id.
    pub async fn resolve_radio_station(&self, station_id: &str) -> Result<Vec<Track>> {
        let station = self
            .stations
            .iter()
            .find(|station| station.id == station_id)
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "radio station".to_string(),
                id: station_id.to_string(),
            })?;

        self.resolve_by_tag(&station.tag).await
    }

    /// Track for an ad hoc root-relative audio path.
    pub fn track_for_audio_file(&self, audio_file: &str) -> Track {
        let title = track_title(audio_file);
        Track {
            url: join_url(&self.audio_base_url, audio_file),
            artwork_url: self
                .artwork_base_url
                .as_deref()
                .map(|base| artwork_url(base, &title)),
            title,
            source_path: None,
        }
    }

    fn tracks_for_documents(&self, documents: &[Document]) -> Vec<Track> {
        let mut seen = HashSet::new();
        let tracks: Vec<Track> = documents
            .iter()
            .filter_map(|document| self.track_for_document(document))
            .filter(|track| seen.insert(track.url.clone()))
            .collect();

        debug!(
            documents = documents.len(),
            tracks = tracks.len(),
            "Playlist resolved"
        );
        tracks
    }

    fn track_for_document(&self, document: &Document) -> Option<Track> {
        let audio_file = document.audio_file.as_deref()?;
        let mut track = self.track_for_audio_file(audio_file);
        track.source_path = Some(document.file_path.clone());
        Some(track)
    }
}
