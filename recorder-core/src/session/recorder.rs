use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::machine::{self, Effect, Event, Guards, MachineState};
use crate::models::artifact::{AudioArtifact, TakeKind};
use crate::models::config::RecorderConfig;
use crate::models::controls::{ControlInputs, ControlState};
use crate::models::crop::CropRange;
use crate::models::error::RecorderError;
use crate::models::mode::Mode;
use crate::models::trim::TrimOutcome;
use crate::processing::wav::WavTrimEncoder;
use crate::session::capture::CaptureSession;
use crate::session::crop::CropRangeManager;
use crate::session::metering::{self, MeteringLoop, TickToken};
use crate::session::playback::PlaybackSession;
use crate::session::ticker::TickCallback;
use crate::session::trim::{TrimPipeline, WakeCallback};
use crate::storage::metadata;
use crate::storage::slot::SingleSlot;
use crate::traits::capture_device::CaptureBackend;
use crate::traits::delegate::RecorderDelegate;
use crate::traits::player::PlaybackBackend;
use crate::traits::trim_encoder::TrimEncoder;

/// Records, plays back and trims a single take.
///
/// Owns the mode machine and executes its effects: the capture and
/// playback sessions, the metering loop, the crop range and the trim
/// pipeline all live here and are only touched from the thread that calls
/// into the recorder.
///
/// ```text
/// user op ──> Event ──> machine::transition ──> [Effect] ──> sessions / delegate
///                ^                                  │
///                └──────── follow-up events ────────┘
/// ```
pub struct SoundRecorder<C: CaptureBackend, P: PlaybackBackend> {
    config: RecorderConfig,
    guards: Guards,
    state: MachineState,
    capture_backend: C,
    playback_backend: P,
    capture: Option<CaptureSession<C::Device>>,
    playback: Option<PlaybackSession<P::Player>>,
    metering: MeteringLoop,
    crop: Option<CropRangeManager>,
    trim: TrimPipeline,
    original_slot: SingleSlot,
    artifact: Option<AudioArtifact>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    controls: ControlState,
    queue: VecDeque<Event>,
    delivered: Option<PathBuf>,
}

impl<C: CaptureBackend, P: PlaybackBackend> SoundRecorder<C, P> {
    pub fn new(config: RecorderConfig, capture_backend: C, playback_backend: P) -> Result<Self, RecorderError> {
        config.validate()?;

        let original_slot = SingleSlot::new(config.original_take_path());
        let trimmed_slot = SingleSlot::new(config.trimmed_take_path());
        let guards = Guards {
            allow_cropping: config.allow_cropping,
        };
        let mut recorder = Self {
            guards,
            state: MachineState::default(),
            capture_backend,
            playback_backend,
            capture: None,
            playback: None,
            metering: MeteringLoop::new(config.tick_period()),
            crop: None,
            trim: TrimPipeline::new(Arc::new(WavTrimEncoder::new()), trimmed_slot),
            original_slot,
            artifact: None,
            delegate: None,
            controls: ControlState::default(),
            queue: VecDeque::new(),
            delivered: None,
            config,
        };
        recorder.controls = recorder.derive_controls();
        Ok(recorder)
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        delegate.on_mode_changed(self.state.mode);
        delegate.on_controls_changed(&self.controls);
        self.delegate = Some(delegate);
    }

    /// Replace the WAV exporter, e.g. with a lossy encoder.
    pub fn set_trim_encoder(&mut self, encoder: Arc<dyn TrimEncoder>) {
        self.trim.set_encoder(encoder);
    }

    /// Deliver ticks from a background thread. The host forwards each token
    /// to `on_tick` on the recorder's thread.
    pub fn set_tick_callback(&mut self, callback: TickCallback) {
        self.metering.set_tick_callback(callback);
    }

    /// Called from the export worker once a job finishes. The host then
    /// calls `poll_trim` on the recorder's thread.
    pub fn set_trim_wake(&mut self, wake: WakeCallback) {
        self.trim.set_wake_callback(wake);
    }

    // --- User operations ---

    pub fn toggle_record(&mut self) {
        self.dispatch(Event::ToggleRecord);
    }

    pub fn stop_record(&mut self) {
        self.dispatch(Event::StopRecord);
    }

    pub fn toggle_play(&mut self) {
        self.dispatch(Event::TogglePlay);
    }

    pub fn enter_crop(&mut self) {
        self.dispatch(Event::EnterCrop);
    }

    pub fn exit_crop(&mut self) {
        self.dispatch(Event::ExitCrop);
    }

    /// Move the left crop handle to normalized position `p`. An open preview
    /// that now sits before the crop start jumps forward to it.
    pub fn drag_left(&mut self, p: f64) {
        if let Some(crop) = &mut self.crop {
            let feedback = crop.drag_left(p);
            if let Some(playback) = &mut self.playback {
                let left = feedback.range.left();
                if playback.position() < left {
                    playback.seek(left);
                }
            }
            self.emit(|d| d.on_crop_changed(&feedback));
            self.refresh_controls();
        }
    }

    /// Move the right crop handle to normalized position `p`.
    pub fn drag_right(&mut self, p: f64) {
        if let Some(crop) = &mut self.crop {
            let feedback = crop.drag_right(p);
            self.emit(|d| d.on_crop_changed(&feedback));
            self.refresh_controls();
        }
    }

    pub fn commit_trim(&mut self) {
        if let Some(range) = self.crop_range() {
            self.dispatch(Event::CommitTrim(range));
        }
    }

    /// Hand the current take back to the host and shut down.
    ///
    /// Returns `None` while recording, while a trim runs, or with no take.
    pub fn finish(&mut self) -> Option<PathBuf> {
        self.dispatch(Event::Confirm);
        self.delivered.take()
    }

    /// Shut down and delete both takes.
    pub fn cancel(&mut self) {
        self.dispatch(Event::Cancel);
    }

    pub fn teardown(&mut self) {
        self.dispatch(Event::Teardown);
    }

    // --- Periodic work ---

    /// Run one metering tick with the current token, if the loop is live.
    pub fn tick(&mut self) {
        if let Some(token) = self.metering.token() {
            self.on_tick(token);
        }
    }

    pub fn on_tick(&mut self, token: TickToken) {
        if !self.metering.accept(token) {
            return;
        }
        match self.state.mode {
            Mode::Recording => {
                let Some(capture) = &self.capture else { return };
                if capture.limit_reached() {
                    self.dispatch(Event::MaxDurationReached);
                    return;
                }
                let sample = metering::recording_sample(capture.power_db(), capture.elapsed(), capture.max_duration());
                self.emit(|d| d.on_meter(&sample));
            }
            Mode::Playing => {
                let Some(playback) = &self.playback else { return };
                if playback.is_finished() {
                    self.dispatch(Event::PlaybackEnded);
                    return;
                }
                let sample = metering::playback_sample(playback.power_db(), playback.position());
                self.emit(|d| d.on_meter(&sample));
            }
            Mode::Idling | Mode::Cropping => {}
        }
    }

    /// Report end of media for a running player. Needed for the crop
    /// preview, which is not metered.
    pub fn poll_playback(&mut self) {
        let finished = self.playback.as_ref().is_some_and(|p| p.is_finished());
        if finished && self.state.playback == machine::SessionActivity::Active {
            self.dispatch(Event::PlaybackEnded);
        }
    }

    /// Apply a finished trim job, if any.
    pub fn poll_trim(&mut self) {
        while let Some(completion) = self.trim.poll() {
            self.emit(|d| d.on_trim_finished(&completion.outcome));
            let event = match completion.outcome {
                TrimOutcome::Succeeded(artifact) => {
                    self.record_metadata(&artifact, Some(completion.range));
                    Event::TrimSucceeded(artifact)
                }
                TrimOutcome::Failed(reason) => {
                    let err = RecorderError::ExportFailed(reason.clone());
                    self.emit(|d| d.on_error(&err));
                    Event::TrimFailed(reason)
                }
                TrimOutcome::Cancelled => Event::TrimCancelled,
            };
            self.dispatch(event);
        }
    }

    // --- Queries ---

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn machine_state(&self) -> MachineState {
        self.state
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn current_artifact(&self) -> Option<&AudioArtifact> {
        self.artifact.as_ref()
    }

    pub fn crop_range(&self) -> Option<CropRange> {
        self.crop.as_ref().map(|c| c.range())
    }

    pub fn commit_enabled(&self) -> bool {
        self.controls.commit
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    pub fn is_trim_running(&self) -> bool {
        self.trim.is_running()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.torn_down
    }

    /// Playhead of the open player, if any.
    pub fn playback_position(&self) -> Option<f64> {
        self.playback.as_ref().map(|p| p.position())
    }

    // --- Effect execution ---

    /// Run `event` and every follow-up it causes, one transition at a time.
    fn dispatch(&mut self, event: Event) {
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            let from = self.state;
            let transition = machine::transition(&from, event, &self.guards);
            self.state = transition.state;
            if from.mode != self.state.mode {
                log::info!("Mode {:?} -> {:?}", from.mode, self.state.mode);
            }
            for effect in transition.effects {
                self.execute(effect);
            }
            self.refresh_controls();
        }
    }

    fn execute(&mut self, effect: Effect) {
        log::debug!("Effect {:?}", effect);
        match effect {
            Effect::OpenCapture => {
                let started = CaptureSession::start(&self.capture_backend, &self.original_slot, &self.config.capture);
                let event = match started {
                    Ok(session) => {
                        self.capture = Some(session);
                        Event::CaptureOpened
                    }
                    Err(e) => {
                        log::error!("Failed to start capture: {}", e);
                        Event::CaptureFailed(e)
                    }
                };
                // Starting clears the original slot, which may hold the current take.
                if let Some(lost) = self.lost_take_event() {
                    self.queue.push_back(lost);
                }
                self.queue.push_back(event);
            }
            Effect::PauseCapture => {
                if let Some(capture) = &mut self.capture {
                    capture.pause();
                }
            }
            Effect::ResumeCapture => {
                if let Some(capture) = &mut self.capture {
                    if let Err(e) = capture.resume() {
                        log::error!("Failed to resume capture: {}", e);
                        self.queue.push_back(Event::CaptureFailed(e));
                        self.discard_failed_take();
                    }
                }
            }
            Effect::FinalizeCapture => {
                if let Some(capture) = &mut self.capture {
                    match capture.stop() {
                        Ok(artifact) => {
                            self.record_metadata(&artifact, None);
                            self.queue.push_back(Event::CaptureFinalized(artifact));
                        }
                        Err(e) => {
                            log::error!("Failed to finalize capture: {}", e);
                            self.queue.push_back(Event::CaptureFailed(e));
                            self.discard_failed_take();
                        }
                    }
                }
            }
            Effect::ReleaseCapture => {
                self.capture = None;
            }
            Effect::OpenPlayback => {
                let opened = match &self.artifact {
                    Some(artifact) => PlaybackSession::open(&self.playback_backend, artifact),
                    None => Err(RecorderError::PlaybackUnavailable("no take to play".into())),
                };
                match opened {
                    Ok(session) => {
                        self.playback = Some(session);
                        self.queue.push_back(Event::PlaybackOpened);
                    }
                    Err(e) => self.queue.push_back(Event::PlaybackFailed(e)),
                }
            }
            Effect::PausePlayback => {
                if let Some(playback) = &mut self.playback {
                    playback.pause();
                }
            }
            Effect::ResumePlayback { from_crop_start } => {
                let crop_start = if from_crop_start {
                    self.crop_range().map(|r| r.left())
                } else {
                    None
                };
                if let Some(playback) = &mut self.playback {
                    if let Err(e) = playback.start(crop_start) {
                        self.queue.push_back(Event::PlaybackFailed(e));
                    }
                }
            }
            Effect::ReleasePlayback => {
                if let Some(mut playback) = self.playback.take() {
                    playback.stop();
                }
            }
            Effect::StartMetering => {
                self.metering.arm();
            }
            Effect::StopMetering => self.metering.invalidate(),
            Effect::ResetCropRange => {
                let duration = self.artifact.as_ref().map_or(0.0, |a| a.duration_secs);
                let crop = self.crop.get_or_insert_with(|| CropRangeManager::new(duration));
                crop.reset(duration);
                let feedback = crop.feedback();
                self.emit(|d| d.on_crop_changed(&feedback));
            }
            Effect::DiscardCropRange => self.crop = None,
            Effect::LaunchTrim(range) => {
                let launched = match &self.artifact {
                    Some(source) => self.trim.launch(source, range),
                    None => Err(RecorderError::ExportFailed("no take to trim".into())),
                };
                if let Err(e) = launched {
                    self.emit(|d| d.on_error(&e));
                    self.queue.push_back(Event::TrimFailed(e.to_string()));
                }
            }
            Effect::CancelTrim => {
                if self.trim.cancel() {
                    self.emit(|d| d.on_trim_finished(&TrimOutcome::Cancelled));
                }
            }
            Effect::AdoptArtifact(artifact) => {
                log::info!(
                    "Current take is {} ({:.2}s)",
                    artifact.path.display(),
                    artifact.duration_secs
                );
                self.emit(|d| d.on_artifact_changed(&artifact));
                self.artifact = Some(artifact);
            }
            Effect::DropArtifact => {
                if let Some(artifact) = self.artifact.take() {
                    log::info!("Dropped missing take {}", artifact.path.display());
                }
            }
            Effect::ShowSurface(surface) => {
                if let Some(delegate) = &self.delegate {
                    delegate.on_surface_changed(surface, self.artifact.as_ref());
                }
            }
            Effect::NotifyMode(mode) => self.emit(|d| d.on_mode_changed(mode)),
            Effect::ReportError(e) => {
                log::warn!("{}", e);
                self.emit(|d| d.on_error(&e));
            }
            Effect::DeliverArtifact => {
                self.delivered = self.artifact.as_ref().map(|a| a.path.clone());
            }
            Effect::DiscardTakes => {
                for slot in [&self.original_slot, self.trim.slot()] {
                    if let Err(e) = slot.clear() {
                        log::warn!("Could not discard {}: {}", slot.path().display(), e);
                    }
                }
                self.artifact = None;
            }
        }
    }

    /// Remove a half-written original take.
    fn discard_failed_take(&mut self) {
        if let Err(e) = self.original_slot.clear() {
            log::warn!("Could not remove failed take: {}", e);
        }
        if let Some(event) = self.lost_take_event() {
            self.queue.push_back(event);
        }
    }

    /// Follow-up for a current take whose file is gone, or is being
    /// overwritten by an open capture. Falls back to the trimmed take when it
    /// is still on disk.
    fn lost_take_event(&self) -> Option<Event> {
        let artifact = self.artifact.as_ref()?;
        let overwritten = self.capture.is_some() && artifact.path == self.original_slot.path();
        if artifact.path.exists() && !overwritten {
            return None;
        }
        log::info!("Current take {} is no longer available", artifact.path.display());

        let slot = self.trim.slot();
        let fallback = if slot.exists() && slot.path() != artifact.path {
            match metadata::read_metadata(slot.path()) {
                Ok(meta) => Some(AudioArtifact::new(slot.path(), meta.duration_secs, TakeKind::Trimmed)),
                Err(e) => {
                    log::warn!("Trimmed take has no usable metadata: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Some(Event::TakeLost(fallback))
    }

    fn record_metadata(&self, artifact: &AudioArtifact, source_range: Option<CropRange>) {
        if let Err(e) = metadata::record_take(artifact, &self.config.capture, source_range) {
            log::warn!("Could not write metadata for {}: {}", artifact.path.display(), e);
        }
    }

    fn derive_controls(&self) -> ControlState {
        ControlState::derive(ControlInputs {
            mode: self.state.mode,
            has_artifact: self.state.has_artifact,
            trim_running: self.state.trim_running,
            allow_cropping: self.config.allow_cropping,
            range_committable: self.crop.as_ref().is_some_and(|c| c.commit_enabled()),
        })
    }

    fn refresh_controls(&mut self) {
        let controls = self.derive_controls();
        if controls != self.controls {
            self.controls = controls;
            self.emit(|d| d.on_controls_changed(&controls));
        }
    }

    fn emit(&self, f: impl FnOnce(&dyn RecorderDelegate)) {
        if let Some(delegate) = &self.delegate {
            f(delegate.as_ref());
        }
    }
}

impl<C: CaptureBackend, P: PlaybackBackend> Drop for SoundRecorder<C, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
