mod controller;
mod session;

pub use controller::{EngineConfig, PlaybackController};
pub use session::Session;

use songbook_core::{PlaylistId, Song, SongId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Song not found")]
    NotFound(SongId),
    #[error("No song selected")]
    NoSelection,
    #[error("Could not play audio. File may not exist or format not supported. ({0})")]
    PlaybackUnavailable(String),
}

/// Identifies one `Load` issued to the audio output. Events carrying an
/// older token belong to a superseded load and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    PlaySong {
        id: SongId,
        songs: Vec<Song>,
        origin: Option<PlaylistId>,
    },
    LoadPlaylist {
        id: PlaylistId,
        songs: Vec<Song>,
    },
    Advance,
    Retreat,
    Seek {
        percent: f64,
    },
    TogglePlayback,
    AudioProgress {
        token: LoadToken,
        elapsed: Duration,
    },
    AudioEnded {
        token: LoadToken,
    },
    AudioFailed {
        token: LoadToken,
        reason: String,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Load {
        token: LoadToken,
        url: String,
        duration_hint: Duration,
    },
    Play,
    Pause,
    Seek {
        position: Duration,
    },
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub total: Duration,
    pub playable: bool,
    pub position: usize,
    pub of: usize,
    pub playlist_id: Option<PlaylistId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    NowPlaying(NowPlaying),
    Progress { elapsed: Duration, total: Duration },
    PlayState { playing: bool },
    EmptySession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Audio(AudioCommand),
    Render(RenderUpdate),
    Notice(Notice),
}

pub trait Renderer {
    fn render(&mut self, update: &RenderUpdate);
    fn notify(&mut self, notice: &Notice);
}

pub trait AudioOutput {
    fn apply(&mut self, command: &AudioCommand);
}

/// Delivers a batch of effects in order.
pub fn route<R, A>(effects: &[Effect], renderer: &mut R, audio: &mut A)
where
    R: Renderer + ?Sized,
    A: AudioOutput + ?Sized,
{
    for effect in effects {
        match effect {
            Effect::Audio(cmd) => audio.apply(cmd),
            Effect::Render(update) => renderer.render(update),
            Effect::Notice(notice) => renderer.notify(notice),
        }
    }
}
