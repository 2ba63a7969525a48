pub mod config;
pub mod format;
pub mod model;
pub mod urls;

pub use config::{AppConfig, ConfigError, HttpConfig, PlayerConfig};
pub use model::{
    NewPlaylist, NewSong, Playlist, PlaylistId, PlaylistSummary, Song, SongId, UserId,
    ValidationError,
};
