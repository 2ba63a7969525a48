use crate::{
    read_envelope, read_probe, read_resource, PlaylistService, Result, SongDirectory,
};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use songbook_core::{
    urls, AppConfig, NewPlaylist, NewSong, Playlist, PlaylistId, PlaylistSummary, Song, SongId,
    UserId,
};
use std::time::Duration;
use tracing::debug;

const USER_HEADER: &str = "X-User-Id";

/// REST client for both services, sharing one connection pool.
#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    api_base_url: String,
}

impl HttpCatalog {
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into(),
        })
    }

    pub fn from_app_config(cfg: &AppConfig) -> Result<Self> {
        Self::new(
            cfg.api_base_url.clone(),
            Duration::from_millis(cfg.http.request_timeout_ms),
        )
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "catalog read");
        read_resource(status, &body, fallback)
    }

    async fn mutate(&self, request: RequestBuilder, fallback: &str) -> Result<String> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "catalog write");
        read_envelope(status, &body, fallback)
    }

    fn as_user(&self, request: RequestBuilder, user: UserId) -> RequestBuilder {
        request.header(USER_HEADER, user.to_string())
    }
}

#[async_trait]
impl SongDirectory for HttpCatalog {
    async fn list_songs(&self, search: Option<&str>) -> Result<Vec<Song>> {
        let url = urls::songs_url(&self.api_base_url, search);
        let searching = search.is_some_and(|s| !s.trim().is_empty());
        let fallback = if searching {
            "Search failed"
        } else {
            "Failed to load songs"
        };
        debug!(%url, "listing songs");
        self.fetch(self.client.get(url), fallback).await
    }

    async fn add_song(&self, song: &NewSong) -> Result<String> {
        let url = urls::songs_url(&self.api_base_url, None);
        self.mutate(self.client.post(url).json(song), "Failed to add song")
            .await
    }

    async fn delete_song(&self, id: SongId) -> Result<String> {
        let url = urls::song_url(&self.api_base_url, id);
        self.mutate(self.client.delete(url), "Failed to delete song")
            .await
    }

    async fn probe_audio(&self, id: SongId) -> Result<()> {
        let url = urls::audio_stream_url(&self.api_base_url, id);
        let response = self.client.get(url).header(RANGE, "bytes=0-0").send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        debug!(song_id = %id, status, ?content_type, "audio probe");
        read_probe(status, content_type.as_deref(), &body)
    }
}

#[async_trait]
impl PlaylistService for HttpCatalog {
    async fn list_playlists(&self, user: UserId) -> Result<Vec<PlaylistSummary>> {
        let url = urls::playlists_url(&self.api_base_url);
        let request = self.as_user(self.client.get(url), user);
        self.fetch(request, "Failed to load playlists").await
    }

    async fn playlist(&self, user: UserId, id: PlaylistId) -> Result<Playlist> {
        let url = urls::playlist_url(&self.api_base_url, id);
        let request = self.as_user(self.client.get(url), user);
        self.fetch(request, "Failed to load playlist").await
    }

    async fn create_playlist(&self, user: UserId, playlist: &NewPlaylist) -> Result<String> {
        let url = urls::playlists_url(&self.api_base_url);
        let request = self.as_user(self.client.post(url).json(playlist), user);
        self.mutate(request, "Failed to create playlist").await
    }

    async fn update_playlist(
        &self,
        user: UserId,
        id: PlaylistId,
        playlist: &NewPlaylist,
    ) -> Result<String> {
        let url = urls::playlist_url(&self.api_base_url, id);
        let request = self.as_user(self.client.put(url).json(playlist), user);
        self.mutate(request, "Failed to update playlist").await
    }

    async fn delete_playlist(&self, user: UserId, id: PlaylistId) -> Result<String> {
        let url = urls::playlist_url(&self.api_base_url, id);
        let request = self.as_user(self.client.delete(url), user);
        self.mutate(request, "Failed to delete playlist").await
    }

    async fn add_song_to_playlist(
        &self,
        user: UserId,
        playlist: PlaylistId,
        song: SongId,
    ) -> Result<String> {
        let url = urls::playlist_url(&self.api_base_url, playlist);
        let body = serde_json::json!({ "songId": song });
        let request = self.as_user(self.client.post(url).json(&body), user);
        self.mutate(request, "Failed to add song").await
    }

    async fn remove_song_from_playlist(
        &self,
        user: UserId,
        playlist: PlaylistId,
        song: SongId,
    ) -> Result<String> {
        let url = urls::playlist_song_url(&self.api_base_url, playlist, song);
        let request = self.as_user(self.client.delete(url), user);
        self.mutate(request, "Failed to remove song").await
    }
}
