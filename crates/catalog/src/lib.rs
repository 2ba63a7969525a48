//! Clients for the song directory and playlist services.
//!
//! Every call is a single attempt. Mutations answer with a
//! `{"success": bool, "message": ...}` envelope; reads answer with the
//! resource or an `{"error": ...}` body.

mod http;

pub use http::HttpCatalog;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use songbook_core::{NewPlaylist, NewSong, Playlist, PlaylistId, PlaylistSummary, Song, SongId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("You must be logged in")]
    NotAuthenticated,
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[async_trait]
pub trait SongDirectory: Send + Sync {
    /// A blank or absent search term lists every song.
    async fn list_songs(&self, search: Option<&str>) -> Result<Vec<Song>>;
    async fn add_song(&self, song: &NewSong) -> Result<String>;
    async fn delete_song(&self, id: SongId) -> Result<String>;
    /// Checks that the song's audio resource can actually be streamed.
    async fn probe_audio(&self, id: SongId) -> Result<()>;
}

#[async_trait]
pub trait PlaylistService: Send + Sync {
    async fn list_playlists(&self, user: UserId) -> Result<Vec<PlaylistSummary>>;
    async fn playlist(&self, user: UserId, id: PlaylistId) -> Result<Playlist>;
    async fn create_playlist(&self, user: UserId, playlist: &NewPlaylist) -> Result<String>;
    async fn update_playlist(
        &self,
        user: UserId,
        id: PlaylistId,
        playlist: &NewPlaylist,
    ) -> Result<String>;
    async fn delete_playlist(&self, user: UserId, id: PlaylistId) -> Result<String>;
    async fn add_song_to_playlist(
        &self,
        user: UserId,
        playlist: PlaylistId,
        song: SongId,
    ) -> Result<String>;
    async fn remove_song_from_playlist(
        &self,
        user: UserId,
        playlist: PlaylistId,
        song: SongId,
    ) -> Result<String>;
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn server_error(status: u16, body: &str) -> CatalogError {
    let snippet: String = body.chars().take(100).collect();
    CatalogError::Status {
        status,
        message: format!("Server error: {snippet}"),
    }
}

pub(crate) fn read_envelope(status: u16, body: &str, fallback: &str) -> Result<String> {
    let Ok(envelope) = serde_json::from_str::<Envelope>(body) else {
        return Err(server_error(status, body));
    };
    let message = envelope.message.unwrap_or_else(|| fallback.to_string());
    match (is_success(status), envelope.success) {
        (true, true) => Ok(message),
        (true, false) => Err(CatalogError::Rejected(message)),
        (false, _) => Err(CatalogError::Status { status, message }),
    }
}

pub(crate) fn read_resource<T: DeserializeOwned>(
    status: u16,
    body: &str,
    fallback: &str,
) -> Result<T> {
    if is_success(status) {
        return Ok(serde_json::from_str(body)?);
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| format!("{fallback}: {}", b.error))
        .unwrap_or_else(|_| fallback.to_string());
    Err(CatalogError::Status { status, message })
}

/// The audio endpoint answers JSON only when there is nothing to stream.
pub(crate) fn read_probe(status: u16, content_type: Option<&str>, body: &str) -> Result<()> {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if is_success(status) && !is_json {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("audio endpoint answered {status}"));
    Err(CatalogError::Status { status, message })
}
