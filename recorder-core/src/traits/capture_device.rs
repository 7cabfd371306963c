use std::path::Path;

use crate::models::config::CaptureConfig;
use crate::models::error::RecorderError;

/// Opens recording devices.
///
/// Implemented by:
/// - `CpalCaptureBackend` (recorder-cpal)
/// - scripted devices in tests
pub trait CaptureBackend {
    type Device: CaptureDevice;

    /// Whether a capture device can be opened right now.
    fn is_available(&self) -> bool;

    /// Open a device that will encode into `path` with the fixed `config`.
    ///
    /// Device or permission failures map to `RecorderError::CaptureUnavailable`.
    fn open(&self, path: &Path, config: &CaptureConfig) -> Result<Self::Device, RecorderError>;
}

/// An open recording handle. Dropping it releases the device.
pub trait CaptureDevice {
    /// Begin or resume writing samples.
    fn record(&mut self) -> Result<(), RecorderError>;

    /// Stop writing samples without closing the file.
    fn pause(&mut self);

    /// Finalize the file and return the recorded duration in seconds.
    fn stop(&mut self) -> Result<f64, RecorderError>;

    /// Seconds of audio recorded so far (paused time excluded).
    fn current_time(&self) -> f64;

    /// Instantaneous average power in dBFS.
    fn average_power_db(&self) -> f32;
}
