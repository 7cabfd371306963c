use crate::models::artifact::AudioArtifact;
use crate::models::controls::ControlState;
use crate::models::crop::{CropRange, CropTint};
use crate::models::error::RecorderError;
use crate::models::meter::MeterSample;
use crate::models::mode::{Mode, Surface};
use crate::models::trim::TrimOutcome;

/// Crop handle feedback pushed to the waveform surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropFeedback {
    pub range: CropRange,
    pub commit_enabled: bool,
    pub tint: CropTint,
    /// Playhead preview position as a fraction of the take, `left / duration`.
    pub preview_fraction: f64,
}

/// Outward notifications for rendering collaborators.
///
/// All methods run on the coordinating thread, inside the call that caused
/// them. Every method has an empty default so hosts implement only what
/// they render.
pub trait RecorderDelegate: Send + Sync {
    fn on_mode_changed(&self, _mode: Mode) {}

    /// Called once per metering tick.
    fn on_meter(&self, _sample: &MeterSample) {}

    fn on_surface_changed(&self, _surface: Surface, _artifact: Option<&AudioArtifact>) {}

    fn on_controls_changed(&self, _controls: &ControlState) {}

    fn on_crop_changed(&self, _feedback: &CropFeedback) {}

    /// The current take was replaced (new recording or successful trim).
    fn on_artifact_changed(&self, _artifact: &AudioArtifact) {}

    fn on_trim_finished(&self, _outcome: &TrimOutcome) {}

    fn on_error(&self, _error: &RecorderError) {}
}
