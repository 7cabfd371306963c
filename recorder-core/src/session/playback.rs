use crate::models::artifact::AudioArtifact;
use crate::models::error::RecorderError;
use crate::traits::player::{PlaybackBackend, Player};

/// A player bound to one artifact.
pub struct PlaybackSession<P: Player> {
    player: P,
    artifact: AudioArtifact,
}

impl<P: Player> PlaybackSession<P> {
    /// Decode `artifact` and park the playhead at the start.
    pub fn open<B>(backend: &B, artifact: &AudioArtifact) -> Result<Self, RecorderError>
    where
        B: PlaybackBackend<Player = P>,
    {
        if !artifact.path.exists() {
            return Err(RecorderError::PlaybackUnavailable(format!(
                "{} does not exist",
                artifact.path.display()
            )));
        }
        let player = backend.open(artifact.path())?;
        log::debug!("Opened player for {}", artifact.path.display());
        Ok(Self {
            player,
            artifact: artifact.clone(),
        })
    }

    pub fn artifact(&self) -> &AudioArtifact {
        &self.artifact
    }

    /// Play from the current position.
    ///
    /// With `crop_start`, a playhead before it or at end of media is moved
    /// to `crop_start` first, so a preview never starts before the range.
    pub fn start(&mut self, crop_start: Option<f64>) -> Result<(), RecorderError> {
        match crop_start {
            Some(left) if self.player.is_finished() || self.player.current_time() < left => {
                self.player.seek(left);
            }
            None if self.player.is_finished() => self.player.seek(0.0),
            _ => {}
        }
        self.player.play()
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// Returns whether the player is now playing.
    pub fn toggle_play_pause(&mut self, crop_start: Option<f64>) -> Result<bool, RecorderError> {
        if self.player.is_playing() {
            self.pause();
        } else {
            self.start(crop_start)?;
        }
        Ok(self.player.is_playing())
    }

    pub fn seek(&mut self, secs: f64) {
        self.player.seek(secs);
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    pub fn position(&self) -> f64 {
        self.player.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.player.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn is_finished(&self) -> bool {
        self.player.is_finished()
    }

    pub fn power_db(&self) -> f32 {
        self.player.average_power_db()
    }
}
