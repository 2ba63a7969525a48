use songbook_core::format::{format_clock, format_duration, song_count_label};
use songbook_core::{PlaylistSummary, Song};
use songbook_engine::{Notice, NoticeKind, NowPlaying, RenderUpdate, Renderer};
use std::io::Write;
use std::time::Duration;

const BAR_WIDTH: usize = 30;

/// Line-oriented renderer. Progress ticks only update the stored state;
/// `status` prints it.
pub struct TerminalRenderer<W: Write> {
    out: W,
    now_playing: Option<NowPlaying>,
    elapsed: Duration,
    playing: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            now_playing: None,
            elapsed: Duration::ZERO,
            playing: false,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn show_songs(&mut self, heading: &str, songs: &[Song]) {
        let _ = writeln!(self.out, "{heading} ({})", song_count_label(songs.len()));
        if songs.is_empty() {
            let _ = writeln!(self.out, "  No songs found. Add your first song to get started!");
            return;
        }
        for song in songs {
            let _ = writeln!(
                self.out,
                "  #{:<4} {} - {} [{}] {}{}",
                song.id,
                song.title,
                song.artist_name,
                song.album_name,
                format_duration(song.duration_seconds),
                if song.is_playable() { "" } else { " (demo)" },
            );
        }
    }

    pub fn show_empty_playlist(&mut self, name: &str) {
        let _ = writeln!(self.out, "{name}: this playlist is empty");
    }

    pub fn show_playlists(&mut self, playlists: &[PlaylistSummary]) {
        if playlists.is_empty() {
            let _ = writeln!(self.out, "No playlists yet. Create your first playlist!");
            return;
        }
        for playlist in playlists {
            let _ = write!(
                self.out,
                "  #{:<4} {} ({})",
                playlist.id,
                playlist.name,
                song_count_label(playlist.song_count as usize)
            );
            match &playlist.description {
                Some(desc) => {
                    let _ = writeln!(self.out, " - {desc}");
                }
                None => {
                    let _ = writeln!(self.out);
                }
            }
        }
    }

    pub fn show_status(&mut self) {
        let Some(np) = &self.now_playing else {
            let _ = writeln!(self.out, "Nothing playing");
            return;
        };
        let filled = if np.total.is_zero() {
            0
        } else {
            let ratio = self.elapsed.as_secs_f64() / np.total.as_secs_f64();
            ((ratio * BAR_WIDTH as f64) as usize).min(BAR_WIDTH)
        };
        let _ = writeln!(
            self.out,
            "{} {} - {} ({}/{})",
            if self.playing { "▶" } else { "⏸" },
            np.title,
            np.artist,
            np.position + 1,
            np.of,
        );
        let _ = writeln!(
            self.out,
            "  {} [{}{}] {}",
            format_clock(self.elapsed),
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            format_clock(np.total),
        );
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, update: &RenderUpdate) {
        match update {
            RenderUpdate::NowPlaying(np) => {
                let origin = np
                    .playlist_id
                    .map(|id| format!(" from playlist #{id}"))
                    .unwrap_or_default();
                let _ = writeln!(
                    self.out,
                    "Now playing: {} - {} [{}] {}{}",
                    np.title,
                    np.artist,
                    np.album,
                    format_clock(np.total),
                    origin,
                );
                self.now_playing = Some(np.clone());
            }
            RenderUpdate::Progress { elapsed, .. } => {
                self.elapsed = *elapsed;
            }
            RenderUpdate::PlayState { playing } => {
                if self.playing != *playing && self.now_playing.is_some() {
                    let _ = writeln!(self.out, "{}", if *playing { "Playing" } else { "Paused" });
                }
                self.playing = *playing;
            }
            RenderUpdate::EmptySession => {
                self.now_playing = None;
                self.elapsed = Duration::ZERO;
                let _ = writeln!(self.out, "Nothing to play");
            }
        }
    }

    fn notify(&mut self, notice: &Notice) {
        let tag = match notice.kind {
            NoticeKind::Info => "info",
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
        };
        let _ = writeln!(self.out, "[{tag}] {}", notice.message);
    }
}
