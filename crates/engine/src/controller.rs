use crate::session::Session;
use crate::{
    AudioCommand, Command, Effect, LoadToken, Notice, NowPlaying, PlaybackError, RenderUpdate,
};
use songbook_core::{urls, AppConfig, PlaylistId, Song, SongId};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_base_url: String,
    pub auto_advance: bool,
}

impl EngineConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            api_base_url: cfg.api_base_url.clone(),
            auto_advance: cfg.player.auto_advance,
        }
    }
}

/// Owns the playback session and turns user and audio events into effects
/// for the renderer and the audio output.
pub struct PlaybackController {
    cfg: EngineConfig,
    session: Session,
    is_playing: bool,
    elapsed: Duration,
    last_token: LoadToken,
    active_load: Option<LoadToken>,
}

impl PlaybackController {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            session: Session::new(),
            is_playing: false,
            elapsed: Duration::ZERO,
            last_token: LoadToken(0),
            active_load: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Token of the load the audio output is expected to be working on.
    pub fn active_load(&self) -> Option<LoadToken> {
        self.active_load
    }

    /// Applies one command. Failures come back as error notices; the
    /// session is left as it was.
    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        let result = match command {
            Command::PlaySong { id, songs, origin } => self.select_and_play(id, songs, origin),
            Command::LoadPlaylist { id, songs } => Ok(self.load_playlist_as_session(songs, id)),
            Command::Advance => Ok(self.advance()),
            Command::Retreat => Ok(self.retreat()),
            Command::Seek { percent } => Ok(self.seek_to(percent)),
            Command::TogglePlayback => self.toggle_playback(),
            Command::AudioProgress { token, elapsed } => Ok(self.on_audio_progress(token, elapsed)),
            Command::AudioEnded { token } => Ok(self.on_audio_ended(token)),
            Command::AudioFailed { token, reason } => Ok(self.on_audio_failed(token, reason)),
            Command::Reset => Ok(self.reset()),
        };

        match result {
            Ok(effects) => effects,
            Err(err) => {
                warn!(error = %err, "playback command rejected");
                vec![Effect::Notice(Notice::error(err.to_string()))]
            }
        }
    }

    pub fn select_and_play(
        &mut self,
        id: SongId,
        songs: Vec<Song>,
        origin: Option<PlaylistId>,
    ) -> Result<Vec<Effect>, PlaybackError> {
        let index = songs
            .iter()
            .position(|s| s.id == id)
            .ok_or(PlaybackError::NotFound(id))?;
        self.session.replace(songs, Some(index), origin);
        Ok(self.start_current())
    }

    pub fn advance(&mut self) -> Vec<Effect> {
        match self.session.next_index() {
            Some(index) => {
                self.session.set_index(index);
                self.start_current()
            }
            None => Vec::new(),
        }
    }

    pub fn retreat(&mut self) -> Vec<Effect> {
        match self.session.prev_index() {
            Some(index) => {
                self.session.set_index(index);
                self.start_current()
            }
            None => Vec::new(),
        }
    }

    /// `percent` is clamped to `[0, 100]`; non-finite input is ignored.
    pub fn seek_to(&mut self, percent: f64) -> Vec<Effect> {
        if !percent.is_finite() {
            return Vec::new();
        }
        let Some(total) = self.session.current().map(Song::duration) else {
            return Vec::new();
        };
        if total.is_zero() {
            return Vec::new();
        }

        let position = total.mul_f64(percent.clamp(0.0, 100.0) / 100.0);
        self.elapsed = position;
        debug!(position_ms = position.as_millis() as u64, "seek");

        let mut effects = Vec::with_capacity(2);
        if self.active_load.is_some() {
            effects.push(Effect::Audio(AudioCommand::Seek { position }));
        }
        effects.push(Effect::Render(RenderUpdate::Progress {
            elapsed: position,
            total,
        }));
        effects
    }

    /// Resuming a playable song whose load was dropped (after an audio
    /// failure) loads it again under a fresh token, at the same position.
    pub fn toggle_playback(&mut self) -> Result<Vec<Effect>, PlaybackError> {
        let Some(song) = self.session.current().cloned() else {
            return Err(PlaybackError::NoSelection);
        };
        self.is_playing = !self.is_playing;

        let mut effects = Vec::with_capacity(4);
        if self.is_playing && self.active_load.is_none() && song.is_playable() {
            debug!(song_id = %song.id, "reloading audio");
            effects.push(self.load(&song));
            if !self.elapsed.is_zero() {
                effects.push(Effect::Audio(AudioCommand::Seek {
                    position: self.elapsed,
                }));
            }
            effects.push(Effect::Audio(AudioCommand::Play));
        } else if self.active_load.is_some() {
            effects.push(Effect::Audio(if self.is_playing {
                AudioCommand::Play
            } else {
                AudioCommand::Pause
            }));
        }
        effects.push(Effect::Render(RenderUpdate::PlayState {
            playing: self.is_playing,
        }));
        Ok(effects)
    }

    pub fn load_playlist_as_session(
        &mut self,
        songs: Vec<Song>,
        playlist_id: PlaylistId,
    ) -> Vec<Effect> {
        let index = if songs.is_empty() { None } else { Some(0) };
        self.session.replace(songs, index, Some(playlist_id));
        info!(playlist_id = %playlist_id, songs = self.session.len(), "playlist loaded");
        self.start_current()
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        self.session.clear();
        self.stop()
    }

    fn on_audio_progress(&mut self, token: LoadToken, elapsed: Duration) -> Vec<Effect> {
        if !self.is_active(token) {
            return Vec::new();
        }
        let Some(total) = self.session.current().map(Song::duration) else {
            return Vec::new();
        };
        self.elapsed = elapsed.min(total);
        vec![Effect::Render(RenderUpdate::Progress {
            elapsed: self.elapsed,
            total,
        })]
    }

    fn on_audio_ended(&mut self, token: LoadToken) -> Vec<Effect> {
        if !self.is_active(token) {
            return Vec::new();
        }
        if self.cfg.auto_advance {
            return self.advance();
        }
        let total = self
            .session
            .current()
            .map(Song::duration)
            .unwrap_or_default();
        self.is_playing = false;
        self.elapsed = Duration::ZERO;
        vec![
            Effect::Audio(AudioCommand::Seek {
                position: Duration::ZERO,
            }),
            Effect::Render(RenderUpdate::Progress {
                elapsed: Duration::ZERO,
                total,
            }),
            Effect::Render(RenderUpdate::PlayState { playing: false }),
        ]
    }

    fn on_audio_failed(&mut self, token: LoadToken, reason: String) -> Vec<Effect> {
        if !self.is_active(token) {
            return Vec::new();
        }
        let err = PlaybackError::PlaybackUnavailable(reason);
        warn!(error = %err, "audio output failed");
        self.is_playing = false;
        self.active_load = None;
        vec![
            Effect::Audio(AudioCommand::Stop),
            Effect::Render(RenderUpdate::PlayState { playing: false }),
            Effect::Notice(Notice::error(err.to_string())),
        ]
    }

    fn is_active(&self, token: LoadToken) -> bool {
        let active = self.active_load == Some(token);
        if !active {
            debug!(?token, active = ?self.active_load, "dropping event from superseded load");
        }
        active
    }

    fn start_current(&mut self) -> Vec<Effect> {
        let Some(song) = self.session.current().cloned() else {
            return self.stop();
        };

        self.elapsed = Duration::ZERO;
        self.is_playing = true;
        let playable = song.is_playable();
        let total = song.duration();

        let mut effects = Vec::with_capacity(5);
        if playable {
            effects.push(self.load(&song));
            effects.push(Effect::Audio(AudioCommand::Play));
        } else {
            self.active_load = None;
            effects.push(Effect::Audio(AudioCommand::Stop));
            effects.push(Effect::Notice(Notice::info(format!(
                "Playing: {} (Demo mode - no audio file)",
                song.title
            ))));
        }

        info!(song_id = %song.id, title = %song.title, playable, "now playing");

        effects.push(Effect::Render(RenderUpdate::NowPlaying(NowPlaying {
            song_id: song.id,
            title: song.title,
            artist: song.artist_name,
            album: song.album_name,
            total,
            playable,
            position: self.session.index().unwrap_or_default(),
            of: self.session.len(),
            playlist_id: self.session.playlist_id(),
        })));
        effects.push(Effect::Render(RenderUpdate::Progress {
            elapsed: Duration::ZERO,
            total,
        }));
        effects.push(Effect::Render(RenderUpdate::PlayState { playing: true }));
        effects
    }

    fn load(&mut self, song: &Song) -> Effect {
        self.last_token = self.last_token.next();
        self.active_load = Some(self.last_token);
        Effect::Audio(AudioCommand::Load {
            token: self.last_token,
            url: urls::audio_stream_url(&self.cfg.api_base_url, song.id),
            duration_hint: song.duration(),
        })
    }

    fn stop(&mut self) -> Vec<Effect> {
        self.is_playing = false;
        self.elapsed = Duration::ZERO;
        self.active_load = None;
        vec![
            Effect::Audio(AudioCommand::Stop),
            Effect::Render(RenderUpdate::EmptySession),
            Effect::Render(RenderUpdate::PlayState { playing: false }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, PlaybackController};
    use crate::{AudioCommand, Command, Effect, LoadToken, NoticeKind, PlaybackError, RenderUpdate};
    use songbook_core::{PlaylistId, Song, SongId};
    use std::time::Duration;

    fn cfg() -> EngineConfig {
        EngineConfig {
            api_base_url: "http://music.test".to_string(),
            auto_advance: true,
        }
    }

    fn song(id: i64, secs: u32, audio: bool) -> Song {
        Song {
            id: SongId(id),
            title: format!("Song {id}"),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            duration_seconds: secs,
            audio_file_path: audio.then(|| format!("/music/{id}.mp3")),
        }
    }

    fn demo_then_audio() -> Vec<Song> {
        vec![song(1, 120, false), song(2, 200, true)]
    }

    fn load_token(effects: &[Effect]) -> Option<LoadToken> {
        effects.iter().find_map(|e| match e {
            Effect::Audio(AudioCommand::Load { token, .. }) => Some(*token),
            _ => None,
        })
    }

    fn now_playing_title(effects: &[Effect]) -> Option<String> {
        effects.iter().find_map(|e| match e {
            Effect::Render(RenderUpdate::NowPlaying(np)) => Some(np.title.clone()),
            _ => None,
        })
    }

    #[test]
    fn demo_song_then_audio_song_then_wrap() {
        let mut ctl = PlaybackController::new(cfg());

        let effects = ctl.select_and_play(SongId(1), demo_then_audio(), None).unwrap();
        assert_eq!(ctl.session().index(), Some(0));
        assert!(effects.contains(&Effect::Audio(AudioCommand::Stop)));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notice(n) if n.kind == NoticeKind::Info && n.message.contains("Demo mode")
        )));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Render(RenderUpdate::NowPlaying(np)) if !np.playable && np.title == "Song 1"
        )));

        let effects = ctl.advance();
        assert_eq!(ctl.session().index(), Some(1));
        match &effects[0] {
            Effect::Audio(AudioCommand::Load { url, duration_hint, .. }) => {
                assert_eq!(url, "http://music.test/api/audio?id=2");
                assert_eq!(*duration_hint, Duration::from_secs(200));
            }
            other => panic!("expected load, got {other:?}"),
        }
        assert_eq!(effects[1], Effect::Audio(AudioCommand::Play));

        let effects = ctl.advance();
        assert_eq!(ctl.session().index(), Some(0));
        assert_eq!(now_playing_title(&effects).as_deref(), Some("Song 1"));
    }

    #[test]
    fn advance_and_retreat_are_inverse() {
        let songs: Vec<Song> = (1..=4).map(|i| song(i, 60, true)).collect();
        for start in 1..=4 {
            let mut ctl = PlaybackController::new(cfg());
            ctl.select_and_play(SongId(start), songs.clone(), None).unwrap();
            let before = ctl.session().index();

            ctl.advance();
            ctl.retreat();
            assert_eq!(ctl.session().index(), before);

            ctl.retreat();
            ctl.advance();
            assert_eq!(ctl.session().index(), before);
        }
    }

    #[test]
    fn retreat_from_first_wraps_to_last() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(1), demo_then_audio(), None).unwrap();
        ctl.retreat();
        assert_eq!(ctl.session().index(), Some(1));
    }

    #[test]
    fn unknown_song_leaves_session_untouched() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.load_playlist_as_session(demo_then_audio(), PlaylistId(7));
        ctl.advance();

        let err = ctl
            .select_and_play(SongId(99), vec![song(5, 30, true)], None)
            .unwrap_err();
        assert_eq!(err, PlaybackError::NotFound(SongId(99)));
        assert_eq!(ctl.session().index(), Some(1));
        assert_eq!(ctl.session().len(), 2);
        assert_eq!(ctl.session().playlist_id(), Some(PlaylistId(7)));

        let effects = ctl.dispatch(Command::PlaySong {
            id: SongId(99),
            songs: Vec::new(),
            origin: None,
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notice(n)] if n.kind == NoticeKind::Error && n.message == "Song not found"
        ));
        assert_eq!(ctl.session().index(), Some(1));
    }

    #[test]
    fn empty_session_navigation_is_silent() {
        let mut ctl = PlaybackController::new(cfg());
        assert!(ctl.advance().is_empty());
        assert!(ctl.retreat().is_empty());
        assert!(ctl.dispatch(Command::Advance).is_empty());
        assert_eq!(ctl.session().index(), None);
    }

    #[test]
    fn seek_half_of_two_hundred_seconds() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap();

        let effects = ctl.seek_to(50.0);
        assert_eq!(
            effects[0],
            Effect::Audio(AudioCommand::Seek {
                position: Duration::from_secs(100)
            })
        );
        assert_eq!(ctl.elapsed(), Duration::from_secs(100));

        let effects = ctl.seek_to(250.0);
        assert_eq!(
            effects[0],
            Effect::Audio(AudioCommand::Seek {
                position: Duration::from_secs(200)
            })
        );
        assert!(ctl.seek_to(f64::NAN).is_empty());
    }

    #[test]
    fn seek_without_song_is_noop() {
        let mut ctl = PlaybackController::new(cfg());
        assert!(ctl.seek_to(50.0).is_empty());
    }

    #[test]
    fn seek_in_demo_mode_moves_clock_only() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(1), demo_then_audio(), None).unwrap();
        let effects = ctl.seek_to(25.0);
        assert_eq!(
            effects,
            vec![Effect::Render(RenderUpdate::Progress {
                elapsed: Duration::from_secs(30),
                total: Duration::from_secs(120),
            })]
        );
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap();
        assert!(ctl.is_playing());

        let first = ctl.toggle_playback().unwrap();
        assert_eq!(first[0], Effect::Audio(AudioCommand::Pause));
        let second = ctl.toggle_playback().unwrap();
        assert_eq!(second[0], Effect::Audio(AudioCommand::Play));
        assert!(ctl.is_playing());
    }

    #[test]
    fn toggle_without_selection_reports() {
        let mut ctl = PlaybackController::new(cfg());
        assert_eq!(ctl.toggle_playback(), Err(PlaybackError::NoSelection));

        let effects = ctl.dispatch(Command::TogglePlayback);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notice(n)] if n.message == "No song selected"
        ));
        assert!(!ctl.is_playing());
    }

    #[test]
    fn empty_playlist_shows_empty_state() {
        let mut ctl = PlaybackController::new(cfg());
        let effects = ctl.load_playlist_as_session(Vec::new(), PlaylistId(7));

        assert!(ctl.session().is_empty());
        assert_eq!(ctl.session().index(), None);
        assert!(!ctl.is_playing());
        assert!(effects.contains(&Effect::Render(RenderUpdate::EmptySession)));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notice(_))));
    }

    #[test]
    fn opened_playlist_autoplays_first_and_marks_origin() {
        let mut ctl = PlaybackController::new(cfg());
        let effects = ctl.load_playlist_as_session(demo_then_audio(), PlaylistId(7));

        assert_eq!(ctl.session().index(), Some(0));
        assert_eq!(ctl.session().playlist_id(), Some(PlaylistId(7)));
        assert_eq!(now_playing_title(&effects).as_deref(), Some("Song 1"));

        ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap();
        assert_eq!(ctl.session().playlist_id(), None);
    }

    #[test]
    fn stale_audio_events_are_dropped() {
        let songs: Vec<Song> = (1..=3).map(|i| song(i, 100, true)).collect();
        let mut ctl = PlaybackController::new(cfg());

        let first = load_token(&ctl.select_and_play(SongId(1), songs.clone(), None).unwrap())
            .unwrap();
        let second = load_token(&ctl.select_and_play(SongId(3), songs, None).unwrap()).unwrap();
        assert!(second > first);

        assert!(ctl
            .dispatch(Command::AudioFailed {
                token: first,
                reason: "404".to_string()
            })
            .is_empty());
        assert!(ctl.dispatch(Command::AudioEnded { token: first }).is_empty());
        assert!(ctl.is_playing());
        assert_eq!(ctl.session().index(), Some(2));

        let effects = ctl.dispatch(Command::AudioProgress {
            token: second,
            elapsed: Duration::from_secs(40),
        });
        assert_eq!(
            effects,
            vec![Effect::Render(RenderUpdate::Progress {
                elapsed: Duration::from_secs(40),
                total: Duration::from_secs(100),
            })]
        );
    }

    #[test]
    fn audio_failure_keeps_session() {
        let mut ctl = PlaybackController::new(cfg());
        let effects = ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap();
        let token = load_token(&effects).unwrap();

        let effects = ctl.dispatch(Command::AudioFailed {
            token,
            reason: "decode error".to_string(),
        });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notice(n) if n.kind == NoticeKind::Error && n.message.contains("decode error")
        )));
        assert!(!ctl.is_playing());
        assert_eq!(ctl.active_load(), None);
        assert_eq!(ctl.session().index(), Some(1));
        assert_eq!(ctl.session().len(), 2);
    }

    #[test]
    fn resume_after_failure_loads_again() {
        let mut ctl = PlaybackController::new(cfg());
        let first = load_token(&ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap())
            .unwrap();
        ctl.seek_to(50.0);
        ctl.dispatch(Command::AudioFailed {
            token: first,
            reason: "missing".to_string(),
        });

        let effects = ctl.toggle_playback().unwrap();
        let second = load_token(&effects).unwrap();
        assert!(second > first);
        assert_eq!(ctl.active_load(), Some(second));
        assert!(effects.contains(&Effect::Audio(AudioCommand::Seek {
            position: Duration::from_secs(100)
        })));
        assert!(effects.contains(&Effect::Audio(AudioCommand::Play)));
        assert!(ctl.is_playing());

        let effects = ctl.dispatch(Command::AudioFailed {
            token: second,
            reason: "missing".to_string(),
        });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notice(n) if n.kind == NoticeKind::Error
        )));
        assert!(!ctl.is_playing());
    }

    #[test]
    fn toggle_in_demo_mode_never_loads() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(1), demo_then_audio(), None).unwrap();
        ctl.toggle_playback().unwrap();
        let effects = ctl.toggle_playback().unwrap();
        assert_eq!(
            effects,
            vec![Effect::Render(RenderUpdate::PlayState { playing: true })]
        );
    }

    #[test]
    fn track_end_advances_when_enabled() {
        let mut ctl = PlaybackController::new(cfg());
        let token = load_token(&ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap())
            .unwrap();
        let effects = ctl.dispatch(Command::AudioEnded { token });
        assert_eq!(ctl.session().index(), Some(0));
        assert_eq!(now_playing_title(&effects).as_deref(), Some("Song 1"));

        let mut ctl = PlaybackController::new(EngineConfig {
            auto_advance: false,
            ..cfg()
        });
        let token = load_token(&ctl.select_and_play(SongId(2), demo_then_audio(), None).unwrap())
            .unwrap();
        let effects = ctl.dispatch(Command::AudioEnded { token });
        assert_eq!(ctl.session().index(), Some(1));
        assert!(!ctl.is_playing());
        assert_eq!(ctl.elapsed(), Duration::ZERO);
        assert_eq!(
            effects[0],
            Effect::Audio(AudioCommand::Seek {
                position: Duration::ZERO
            })
        );
    }

    #[test]
    fn reset_empties_session() {
        let mut ctl = PlaybackController::new(cfg());
        ctl.select_and_play(SongId(2), demo_then_audio(), Some(PlaylistId(1)))
            .unwrap();
        let effects = ctl.dispatch(Command::Reset);

        assert!(ctl.session().is_empty());
        assert_eq!(ctl.session().playlist_id(), None);
        assert_eq!(ctl.active_load(), None);
        assert_eq!(effects[0], Effect::Audio(AudioCommand::Stop));
    }
}
