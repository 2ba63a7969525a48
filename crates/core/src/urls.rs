use crate::model::{PlaylistId, SongId};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

fn base(api_base: &str) -> &str {
    api_base.trim_end_matches('/')
}

pub fn songs_url(api_base: &str, search: Option<&str>) -> String {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let encoded = utf8_percent_encode(term, NON_ALPHANUMERIC).to_string();
            format!("{}/api/songs?search={encoded}", base(api_base))
        }
        None => format!("{}/api/songs", base(api_base)),
    }
}

pub fn song_url(api_base: &str, id: SongId) -> String {
    format!("{}/api/songs/{id}", base(api_base))
}

pub fn playlists_url(api_base: &str) -> String {
    format!("{}/api/playlists", base(api_base))
}

pub fn playlist_url(api_base: &str, id: PlaylistId) -> String {
    format!("{}/api/playlists/{id}", base(api_base))
}

pub fn playlist_song_url(api_base: &str, playlist: PlaylistId, song: SongId) -> String {
    format!("{}/api/playlists/{playlist}/{song}", base(api_base))
}

pub fn audio_stream_url(api_base: &str, id: SongId) -> String {
    format!("{}/api/audio?id={id}", base(api_base))
}
