use songbook_core::{PlaylistId, Song, SongId};

/// The song list currently in context for playback.
///
/// A non-empty session always has a current index. Mutation goes through
/// [`crate::PlaybackController`]; everything else only reads.
#[derive(Debug, Clone, Default)]
pub struct Session {
    songs: Vec<Song>,
    index: Option<usize>,
    playlist_id: Option<PlaylistId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Set when the songs came from an opened playlist.
    pub fn playlist_id(&self) -> Option<PlaylistId> {
        self.playlist_id
    }

    pub fn current(&self) -> Option<&Song> {
        self.index.and_then(|i| self.songs.get(i))
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn position_of(&self, id: SongId) -> Option<usize> {
        self.songs.iter().position(|s| s.id == id)
    }

    pub(crate) fn next_index(&self) -> Option<usize> {
        let n = self.songs.len();
        if n == 0 {
            return None;
        }
        Some(self.index.map_or(0, |i| (i + 1) % n))
    }

    pub(crate) fn prev_index(&self) -> Option<usize> {
        let n = self.songs.len();
        if n == 0 {
            return None;
        }
        Some(self.index.map_or(0, |i| (i + n - 1) % n))
    }

    pub(crate) fn replace(
        &mut self,
        songs: Vec<Song>,
        index: Option<usize>,
        playlist_id: Option<PlaylistId>,
    ) {
        debug_assert!(match index {
            Some(i) => i < songs.len(),
            None => songs.is_empty(),
        });
        self.songs = songs;
        self.index = index;
        self.playlist_id = playlist_id;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        debug_assert!(index < self.songs.len());
        self.index = Some(index);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
