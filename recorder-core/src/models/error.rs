use thiserror::Error;

/// Errors surfaced by the recorder.
///
/// None of these are fatal: the coordinator reports them to the delegate and
/// returns to an actionable state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecorderError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("playback unavailable: {0}")]
    PlaybackUnavailable(String),

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("crop range of {length:.2}s is shorter than the {minimum:.1}s minimum")]
    InvalidRange { length: f64, minimum: f64 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration invalid: {0}")]
    Configuration(String),
}

impl RecorderError {
    /// Whether retrying the same operation can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExportFailed(_) | Self::Storage(_))
    }
}
