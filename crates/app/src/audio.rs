use songbook_engine::{AudioCommand, AudioOutput, Command, LoadToken};
use std::time::Duration;
use tracing::debug;

struct Loaded {
    token: LoadToken,
    position: Duration,
    total: Duration,
}

/// Stand-in audio device: keeps a clock for the loaded resource and reports
/// progress and end-of-track as it is ticked. No sound is produced.
#[derive(Default)]
pub struct SimulatedOutput {
    loaded: Option<Loaded>,
    playing: bool,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[cfg(test)]
    pub fn position(&self) -> Option<Duration> {
        self.loaded.as_ref().map(|l| l.position)
    }

    /// Moves the clock forward and returns the event the controller should
    /// see, if any.
    pub fn advance(&mut self, dt: Duration) -> Option<Command> {
        if !self.playing {
            return None;
        }
        let loaded = self.loaded.as_mut()?;
        loaded.position = (loaded.position + dt).min(loaded.total);
        if loaded.position >= loaded.total {
            self.playing = false;
            return Some(Command::AudioEnded {
                token: loaded.token,
            });
        }
        Some(Command::AudioProgress {
            token: loaded.token,
            elapsed: loaded.position,
        })
    }
}

impl AudioOutput for SimulatedOutput {
    fn apply(&mut self, command: &AudioCommand) {
        match command {
            AudioCommand::Load {
                token,
                url,
                duration_hint,
            } => {
                debug!(%url, ?token, "loading audio");
                self.loaded = Some(Loaded {
                    token: *token,
                    position: Duration::ZERO,
                    total: *duration_hint,
                });
                self.playing = false;
            }
            AudioCommand::Play => self.playing = self.loaded.is_some(),
            AudioCommand::Pause => self.playing = false,
            AudioCommand::Seek { position } => {
                if let Some(loaded) = self.loaded.as_mut() {
                    loaded.position = (*position).min(loaded.total);
                }
            }
            AudioCommand::Stop => {
                self.loaded = None;
                self.playing = false;
            }
        }
    }
}
