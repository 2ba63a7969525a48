use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

id_type!(SongId);
id_type!(PlaylistId);
id_type!(UserId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub audio_file_path: Option<String>,
}

impl Song {
    /// A song without an audio resource plays in demo mode.
    pub fn is_playable(&self) -> bool {
        self.audio_file_path
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_seconds))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub song_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub song_count: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub songs: Vec<Song>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Song>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Song>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Duration must be a positive number")]
    InvalidDuration,
    #[error("Playlist name is required")]
    MissingPlaylistName,
}

/// Body of `POST /api/songs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub title: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration_seconds: u32,
}

impl NewSong {
    /// Builds a song from raw form input. Every field is trimmed and required.
    pub fn parse(
        title: &str,
        artist_name: &str,
        album_name: &str,
        duration: &str,
    ) -> Result<Self, ValidationError> {
        let (title, artist_name, album_name, duration) = (
            title.trim(),
            artist_name.trim(),
            album_name.trim(),
            duration.trim(),
        );
        if [title, artist_name, album_name, duration]
            .iter()
            .any(|f| f.is_empty())
        {
            return Err(ValidationError::MissingFields);
        }

        let duration_seconds = match duration.parse::<u32>() {
            Ok(secs) if secs > 0 => secs,
            _ => return Err(ValidationError::InvalidDuration),
        };

        Ok(Self {
            title: title.to_string(),
            artist_name: artist_name.to_string(),
            album_name: album_name.to_string(),
            duration_seconds,
        })
    }
}

/// Body of playlist create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPlaylist {
    pub fn parse(name: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingPlaylistName);
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPlaylist, NewSong, Playlist, PlaylistSummary, Song, SongId, ValidationError};

    #[test]
    fn decodes_server_song_shape() {
        let raw = r#"{"id":4,"title":"Blue","artistName":"Joni Mitchell","albumName":"Blue","durationSeconds":183,"audioFilePath":null}"#;
        let song: Song = serde_json::from_str(raw).unwrap();

        assert_eq!(song.id, SongId(4));
        assert_eq!(song.artist_name, "Joni Mitchell");
        assert!(!song.is_playable());
        assert_eq!(song.duration().as_secs(), 183);
    }

    #[test]
    fn blank_audio_path_is_demo_mode() {
        let raw = r#"{"id":1,"title":"t","artistName":"a","albumName":"b","durationSeconds":1,"audioFilePath":"  "}"#;
        let song: Song = serde_json::from_str(raw).unwrap();
        assert!(!song.is_playable());

        let raw = r#"{"id":1,"title":"t","artistName":"a","albumName":"b","durationSeconds":1,"audioFilePath":"/srv/a.mp3"}"#;
        let song: Song = serde_json::from_str(raw).unwrap();
        assert!(song.is_playable());
    }

    #[test]
    fn playlist_tolerates_null_songs_and_timestamps() {
        let raw = r#"{"id":7,"name":"Road","description":null,"createdAt":1700000000000,"updatedAt":null,"songCount":0,"songs":null}"#;
        let playlist: Playlist = serde_json::from_str(raw).unwrap();
        assert!(playlist.songs.is_empty());

        let summary: PlaylistSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.name, "Road");
        assert_eq!(summary.description, None);
    }

    #[test]
    fn new_song_requires_every_field() {
        assert_eq!(
            NewSong::parse("Title", "  ", "Album", "120"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            NewSong::parse("Title", "Artist", "Album", "0"),
            Err(ValidationError::InvalidDuration)
        );
        assert_eq!(
            NewSong::parse("Title", "Artist", "Album", "abc"),
            Err(ValidationError::InvalidDuration)
        );

        let song = NewSong::parse(" Title ", "Artist", "Album", " 95 ").unwrap();
        assert_eq!(song.title, "Title");
        assert_eq!(song.duration_seconds, 95);

        let body = serde_json::to_value(&song).unwrap();
        assert_eq!(body["artistName"], "Artist");
        assert_eq!(body["durationSeconds"], 95);
    }

    #[test]
    fn new_playlist_drops_blank_description() {
        assert_eq!(
            NewPlaylist::parse("   ", None),
            Err(ValidationError::MissingPlaylistName)
        );

        let playlist = NewPlaylist::parse("Focus", Some("  ")).unwrap();
        assert_eq!(playlist.description, None);
        let body = serde_json::to_string(&playlist).unwrap();
        assert_eq!(body, r#"{"name":"Focus"}"#);
    }

    #[test]
    fn ids_parse_from_cli_text() {
        assert_eq!(" 12 ".parse::<SongId>(), Ok(SongId(12)));
        assert!("x".parse::<SongId>().is_err());
    }
}
