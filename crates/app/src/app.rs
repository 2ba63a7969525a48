use crate::audio::SimulatedOutput;
use crate::repl::ReplCommand;
use crate::terminal::TerminalRenderer;
use songbook_catalog::{CatalogError, PlaylistService, SongDirectory};
use songbook_core::{NewPlaylist, NewSong, PlaylistId, Song, SongId, UserId};
use songbook_engine::{
    route, AudioCommand, Command, Effect, LoadToken, Notice, PlaybackController, Renderer,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The song list last shown to the user; `play` picks from it.
#[derive(Default)]
struct ListView {
    songs: Vec<Song>,
    origin: Option<PlaylistId>,
}

pub struct App<C, W: Write> {
    catalog: Arc<C>,
    user: Option<UserId>,
    controller: PlaybackController,
    renderer: TerminalRenderer<W>,
    audio: SimulatedOutput,
    view: ListView,
    events: mpsc::UnboundedSender<Command>,
}

impl<C, W> App<C, W>
where
    C: SongDirectory + PlaylistService + 'static,
    W: Write,
{
    pub fn new(
        catalog: Arc<C>,
        user: Option<UserId>,
        controller: PlaybackController,
        renderer: TerminalRenderer<W>,
        events: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            catalog,
            user,
            controller,
            renderer,
            audio: SimulatedOutput::new(),
            view: ListView::default(),
            events,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn renderer_mut(&mut self) -> &mut TerminalRenderer<W> {
        &mut self.renderer
    }

    #[cfg(test)]
    pub fn into_renderer(self) -> TerminalRenderer<W> {
        self.renderer
    }

    /// Feeds one command to the controller and delivers the effects. Every
    /// audio load is probed in the background; a failed probe comes back
    /// through the event channel tagged with that load's token.
    pub fn apply(&mut self, command: Command) {
        let effects = self.controller.dispatch(command);
        for effect in &effects {
            if let Effect::Audio(AudioCommand::Load { token, .. }) = effect {
                if let Some(song) = self.controller.session().current() {
                    self.spawn_probe(*token, song.id);
                }
            }
        }
        route(&effects, &mut self.renderer, &mut self.audio);
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Some(event) = self.audio.advance(dt) {
            self.apply(event);
        }
    }

    pub async fn handle(&mut self, command: ReplCommand) -> Flow {
        match command {
            ReplCommand::Songs => self.load_songs(None).await,
            ReplCommand::Search { term } => {
                let term = term.join(" ");
                self.load_songs(Some(term.as_str())).await;
            }
            ReplCommand::Play { id } => self.apply(Command::PlaySong {
                id,
                songs: self.view.songs.clone(),
                origin: self.view.origin,
            }),
            ReplCommand::Next => self.apply(Command::Advance),
            ReplCommand::Prev => self.apply(Command::Retreat),
            ReplCommand::Toggle => self.apply(Command::TogglePlayback),
            ReplCommand::Seek { percent } => self.apply(Command::Seek { percent }),
            ReplCommand::Stop => self.apply(Command::Reset),
            ReplCommand::Status => self.renderer.show_status(),
            ReplCommand::AddSong {
                title,
                artist,
                album,
                duration,
            } => self.add_song(&title, &artist, &album, &duration).await,
            ReplCommand::DeleteSong { id } => {
                match self.catalog.delete_song(id).await {
                    Ok(message) => {
                        self.renderer.notify(&Notice::success(message));
                        self.load_songs(None).await;
                    }
                    Err(err) => self.report("delete song", err),
                }
            }
            ReplCommand::Playlists => self.load_playlists().await,
            ReplCommand::Open { id } => self.open_playlist(id).await,
            ReplCommand::Create { name, description } => {
                self.save_playlist(None, &name, description.as_deref()).await
            }
            ReplCommand::Rename {
                id,
                name,
                description,
            } => {
                self.save_playlist(Some(id), &name, description.as_deref())
                    .await
            }
            ReplCommand::Delete { id } => {
                let result = match self.require_user() {
                    Ok(user) => self.catalog.delete_playlist(user, id).await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(_) => {
                        self.renderer.notify(&Notice::success("Playlist deleted!"));
                        self.load_playlists().await;
                    }
                    Err(err) => self.report("delete playlist", err),
                }
            }
            ReplCommand::AddTo { playlist, song } => {
                let result = match self.require_user() {
                    Ok(user) => self.catalog.add_song_to_playlist(user, playlist, song).await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(_) => self
                        .renderer
                        .notify(&Notice::success("Song added to playlist!")),
                    Err(err) => self.report("add song to playlist", err),
                }
            }
            ReplCommand::RemoveFrom { playlist, song } => {
                let result = match self.require_user() {
                    Ok(user) => {
                        self.catalog
                            .remove_song_from_playlist(user, playlist, song)
                            .await
                    }
                    Err(err) => Err(err),
                };
                match result {
                    Ok(message) => self.renderer.notify(&Notice::success(message)),
                    Err(err) => self.report("remove song from playlist", err),
                }
            }
            ReplCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn load_songs(&mut self, search: Option<&str>) {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        match self.catalog.list_songs(search).await {
            Ok(songs) => {
                let heading = match search {
                    Some(term) => format!("Results for \"{term}\""),
                    None => "Songs".to_string(),
                };
                self.renderer.show_songs(&heading, &songs);
                self.view = ListView {
                    songs,
                    origin: None,
                };
            }
            Err(err) => self.report("load songs", err),
        }
    }

    async fn add_song(&mut self, title: &str, artist: &str, album: &str, duration: &str) {
        let song = match NewSong::parse(title, artist, album, duration) {
            Ok(song) => song,
            Err(err) => {
                self.renderer.notify(&Notice::error(err.to_string()));
                return;
            }
        };
        match self.catalog.add_song(&song).await {
            Ok(_) => {
                self.renderer
                    .notify(&Notice::success("Song added successfully!"));
                self.load_songs(None).await;
            }
            Err(err) => self.report("add song", err),
        }
    }

    async fn load_playlists(&mut self) {
        let result = match self.require_user() {
            Ok(user) => self.catalog.list_playlists(user).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(playlists) => self.renderer.show_playlists(&playlists),
            Err(err) => self.report("load playlists", err),
        }
    }

    async fn open_playlist(&mut self, id: PlaylistId) {
        let result = match self.require_user() {
            Ok(user) => self.catalog.playlist(user, id).await,
            Err(err) => Err(err),
        };
        let playlist = match result {
            Ok(playlist) => playlist,
            Err(err) => {
                self.report("open playlist", err);
                return;
            }
        };

        if playlist.songs.is_empty() {
            self.renderer.show_empty_playlist(&playlist.name);
        } else {
            self.renderer.show_songs(&playlist.name, &playlist.songs);
        }
        self.view = ListView {
            songs: playlist.songs.clone(),
            origin: Some(id),
        };
        self.apply(Command::LoadPlaylist {
            id,
            songs: playlist.songs,
        });
    }

    async fn save_playlist(&mut self, id: Option<PlaylistId>, name: &str, description: Option<&str>) {
        let playlist = match NewPlaylist::parse(name, description) {
            Ok(playlist) => playlist,
            Err(err) => {
                self.renderer.notify(&Notice::error(err.to_string()));
                return;
            }
        };
        let user = match self.require_user() {
            Ok(user) => user,
            Err(err) => {
                self.report("save playlist", err);
                return;
            }
        };
        let result = match id {
            Some(id) => self.catalog.update_playlist(user, id, &playlist).await,
            None => self
                .catalog
                .create_playlist(user, &playlist)
                .await
                .map(|_| "Playlist created successfully!".to_string()),
        };
        match result {
            Ok(message) => {
                self.renderer.notify(&Notice::success(message));
                self.load_playlists().await;
            }
            Err(err) => self.report("save playlist", err),
        }
    }

    fn require_user(&self) -> Result<UserId, CatalogError> {
        self.user.ok_or(CatalogError::NotAuthenticated)
    }

    fn report(&mut self, action: &str, err: CatalogError) {
        warn!(action, error = %err, "catalog request failed");
        self.renderer.notify(&Notice::error(err.to_string()));
    }

    fn spawn_probe(&self, token: LoadToken, song: SongId) {
        let catalog = Arc::clone(&self.catalog);
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = catalog.probe_audio(song).await {
                let _ = events.send(Command::AudioFailed {
                    token,
                    reason: err.to_string(),
                });
            }
        });
    }
}
