use std::path::Path;

use crate::models::error::RecorderError;

/// Opens players for finished takes.
pub trait PlaybackBackend {
    type Player: Player;

    /// Decode `path` for playback. A missing or undecodable file maps to
    /// `RecorderError::PlaybackUnavailable`.
    fn open(&self, path: &Path) -> Result<Self::Player, RecorderError>;
}

/// An open playback handle. Dropping it releases the output device.
pub trait Player {
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    /// Move the playhead, clamped to `[0, duration]`.
    fn seek(&mut self, secs: f64);

    fn play(&mut self) -> Result<(), RecorderError>;

    fn pause(&mut self);

    /// Pause and rewind to the start.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// True once the playhead reached the end of the media.
    fn is_finished(&self) -> bool;

    /// Instantaneous average power in dBFS at the playhead.
    fn average_power_db(&self) -> f32;
}
