use crate::models::artifact::{AudioArtifact, TakeKind};
use crate::models::config::CaptureConfig;
use crate::models::error::RecorderError;
use crate::storage::slot::SingleSlot;
use crate::traits::capture_device::{CaptureBackend, CaptureDevice};

#[derive(Debug, Clone, PartialEq)]
enum CaptureState {
    Running,
    Paused,
    Stopped(AudioArtifact),
}

/// One take being written into the original-take slot.
///
/// ```text
/// start ──> Running <──pause_or_resume──> Paused
///              └──────── stop ──────────────┴──> Stopped(artifact)
/// ```
pub struct CaptureSession<D: CaptureDevice> {
    device: D,
    slot: SingleSlot,
    max_duration: Option<f64>,
    state: CaptureState,
}

impl<D: CaptureDevice> CaptureSession<D> {
    /// Delete the previous original take, open the device and start recording.
    pub fn start<B>(backend: &B, slot: &SingleSlot, config: &CaptureConfig) -> Result<Self, RecorderError>
    where
        B: CaptureBackend<Device = D>,
    {
        if !backend.is_available() {
            return Err(RecorderError::CaptureUnavailable("no capture device available".into()));
        }

        match slot.clear() {
            Ok(true) => log::debug!("Removed previous take at {}", slot.path().display()),
            Ok(false) => {}
            Err(e) => log::warn!("Could not remove previous take: {}", e),
        }

        let mut device = backend.open(slot.path(), config).map_err(|e| discard(slot, e))?;
        if let Err(e) = device.record() {
            drop(device);
            return Err(discard(slot, e));
        }
        log::info!("Recording into {}", slot.path().display());

        Ok(Self {
            device,
            slot: slot.clone(),
            max_duration: config.max_duration(),
            state: CaptureState::Running,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state == CaptureState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == CaptureState::Paused
    }

    pub fn pause(&mut self) {
        if self.state == CaptureState::Running {
            self.device.pause();
            self.state = CaptureState::Paused;
        }
    }

    pub fn resume(&mut self) -> Result<(), RecorderError> {
        if self.state == CaptureState::Paused {
            self.device.record()?;
            self.state = CaptureState::Running;
        }
        Ok(())
    }

    /// Flip between running and paused. Returns whether the take is now running.
    pub fn pause_or_resume(&mut self) -> Result<bool, RecorderError> {
        match self.state {
            CaptureState::Running => self.pause(),
            CaptureState::Paused => self.resume()?,
            CaptureState::Stopped(_) => {}
        }
        Ok(self.is_running())
    }

    /// Finalize the take. Calling it again returns the same artifact.
    pub fn stop(&mut self) -> Result<AudioArtifact, RecorderError> {
        if let CaptureState::Stopped(artifact) = &self.state {
            return Ok(artifact.clone());
        }
        let duration = self.device.stop()?;
        let artifact = AudioArtifact::new(self.slot.path(), duration, TakeKind::Original);
        log::info!("Finalized {:.2}s take at {}", duration, artifact.path.display());
        self.state = CaptureState::Stopped(artifact.clone());
        Ok(artifact)
    }

    /// Seconds recorded so far.
    pub fn elapsed(&self) -> f64 {
        match &self.state {
            CaptureState::Stopped(artifact) => artifact.duration_secs,
            _ => self.device.current_time(),
        }
    }

    /// Seconds left before the limit, if one is set.
    pub fn remaining(&self) -> Option<f64> {
        self.max_duration.map(|max| (max - self.elapsed()).max(0.0))
    }

    pub fn max_duration(&self) -> Option<f64> {
        self.max_duration
    }

    pub fn limit_reached(&self) -> bool {
        self.max_duration.is_some_and(|max| self.elapsed() >= max)
    }

    pub fn power_db(&self) -> f32 {
        self.device.average_power_db()
    }
}

/// Remove whatever a failed start left in the slot and pass the error on.
fn discard(slot: &SingleSlot, err: RecorderError) -> RecorderError {
    if let Err(e) = slot.clear() {
        log::warn!("Could not remove failed take: {}", e);
    }
    err
}
