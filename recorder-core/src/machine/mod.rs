//! The recorder's mode state machine as a pure function.
//!
//! `transition` never touches a device or the filesystem. It returns the
//! next [`MachineState`] plus the [`Effect`]s the coordinator must run, in
//! order. Effects that can fail report back through follow-up [`Event`]s
//! (`CaptureOpened`, `CaptureFailed`, `PlaybackFailed`, `TrimSucceeded`, ...).

use serde::{Deserialize, Serialize};

use crate::models::artifact::AudioArtifact;
use crate::models::crop::{CropRange, MIN_CROP_SECONDS};
use crate::models::error::RecorderError;
use crate::models::mode::{Mode, Surface};

/// Whether a capture or playback session exists, and if so whether it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionActivity {
    #[default]
    Absent,
    Active,
    Paused,
}

impl SessionActivity {
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MachineState {
    pub mode: Mode,
    pub capture: SessionActivity,
    pub playback: SessionActivity,
    pub has_artifact: bool,
    pub trim_running: bool,
    /// Set by teardown, confirm and cancel. Every later event is ignored.
    pub torn_down: bool,
}

/// Host configuration the transitions depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guards {
    pub allow_cropping: bool,
}

impl Default for Guards {
    fn default() -> Self {
        Self { allow_cropping: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ToggleRecord,
    StopRecord,
    MaxDurationReached,
    CaptureOpened,
    CaptureFinalized(AudioArtifact),
    CaptureFailed(RecorderError),
    /// The current take's file is gone. Carries the take to fall back to.
    TakeLost(Option<AudioArtifact>),
    TogglePlay,
    PlaybackOpened,
    PlaybackEnded,
    PlaybackFailed(RecorderError),
    EnterCrop,
    ExitCrop,
    CommitTrim(CropRange),
    TrimSucceeded(AudioArtifact),
    TrimFailed(String),
    TrimCancelled,
    Confirm,
    Cancel,
    Teardown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenCapture,
    PauseCapture,
    ResumeCapture,
    FinalizeCapture,
    ReleaseCapture,
    OpenPlayback,
    PausePlayback,
    /// Start or resume the player. In Cropping the player first seeks to the
    /// crop start if it sits before it or at end of media.
    ResumePlayback { from_crop_start: bool },
    ReleasePlayback,
    StartMetering,
    StopMetering,
    ResetCropRange,
    DiscardCropRange,
    LaunchTrim(CropRange),
    CancelTrim,
    AdoptArtifact(AudioArtifact),
    DropArtifact,
    ShowSurface(Surface),
    NotifyMode(Mode),
    ReportError(RecorderError),
    DeliverArtifact,
    DiscardTakes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: MachineState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &MachineState) -> Self {
        Self {
            state: *state,
            effects: Vec::new(),
        }
    }

    pub fn is_noop(&self, from: &MachineState) -> bool {
        self.effects.is_empty() && self.state == *from
    }
}

pub fn transition(state: &MachineState, event: Event, guards: &Guards) -> Transition {
    if state.torn_down {
        return Transition::unchanged(state);
    }

    let mut next = *state;
    let mut effects = Vec::new();

    match event {
        Event::Teardown => {
            release_all(state, &mut next, &mut effects);
        }
        Event::Cancel => {
            release_all(state, &mut next, &mut effects);
            effects.push(Effect::DiscardTakes);
        }
        Event::Confirm => {
            if state.has_artifact && !state.trim_running && state.mode != Mode::Recording {
                release_all(state, &mut next, &mut effects);
                effects.push(Effect::DeliverArtifact);
            }
        }
        Event::CaptureFinalized(artifact) => {
            effects.push(Effect::AdoptArtifact(artifact));
            next.has_artifact = true;
        }
        Event::TakeLost(fallback) if matches!(state.mode, Mode::Idling | Mode::Recording) => match fallback {
            Some(artifact) => {
                effects.push(Effect::AdoptArtifact(artifact));
                next.has_artifact = true;
            }
            None => {
                effects.push(Effect::DropArtifact);
                next.has_artifact = false;
            }
        },
        event => match state.mode {
            Mode::Idling => on_idling(state, event, guards, &mut next, &mut effects),
            Mode::Recording => on_recording(state, event, &mut next, &mut effects),
            Mode::Playing => on_playing(state, event, guards, &mut next, &mut effects),
            Mode::Cropping => on_cropping(state, event, &mut next, &mut effects),
        },
    }

    if next.mode != state.mode && !next.torn_down {
        effects.push(Effect::NotifyMode(next.mode));
        if let Some(surface) = Surface::for_mode(next.mode) {
            effects.push(Effect::ShowSurface(surface));
        }
    }

    Transition { state: next, effects }
}

/// Invalidate the timer first, then release every session.
fn release_all(state: &MachineState, next: &mut MachineState, effects: &mut Vec<Effect>) {
    effects.push(Effect::StopMetering);
    if state.trim_running {
        effects.push(Effect::CancelTrim);
    }
    if state.capture.is_present() {
        effects.push(Effect::ReleaseCapture);
    }
    if state.playback.is_present() {
        effects.push(Effect::ReleasePlayback);
    }
    if state.mode == Mode::Cropping {
        effects.push(Effect::DiscardCropRange);
    }
    *next = MachineState {
        mode: Mode::Idling,
        capture: SessionActivity::Absent,
        playback: SessionActivity::Absent,
        has_artifact: state.has_artifact,
        trim_running: false,
        torn_down: true,
    };
}

fn on_idling(
    state: &MachineState,
    event: Event,
    guards: &Guards,
    next: &mut MachineState,
    effects: &mut Vec<Effect>,
) {
    match event {
        Event::ToggleRecord if !state.capture.is_present() => {
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
                next.playback = SessionActivity::Absent;
            }
            effects.push(Effect::OpenCapture);
        }
        Event::CaptureOpened => {
            next.capture = SessionActivity::Active;
            next.mode = Mode::Recording;
            effects.push(Effect::StartMetering);
        }
        Event::CaptureFailed(err) => {
            if state.capture.is_present() {
                effects.push(Effect::ReleaseCapture);
                next.capture = SessionActivity::Absent;
            }
            effects.push(Effect::ReportError(err));
        }
        Event::TogglePlay if state.has_artifact => {
            if state.capture.is_present() {
                effects.push(Effect::ReleaseCapture);
                next.capture = SessionActivity::Absent;
            }
            effects.push(Effect::OpenPlayback);
        }
        Event::PlaybackOpened => {
            next.playback = SessionActivity::Active;
            next.mode = Mode::Playing;
            effects.push(Effect::ResumePlayback { from_crop_start: false });
            effects.push(Effect::StartMetering);
        }
        Event::PlaybackFailed(err) => {
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
                next.playback = SessionActivity::Absent;
            }
            effects.push(Effect::ReportError(err));
        }
        Event::EnterCrop if guards.allow_cropping && state.has_artifact => {
            enter_cropping(state, next, effects);
        }
        _ => {}
    }
}

fn on_recording(state: &MachineState, event: Event, next: &mut MachineState, effects: &mut Vec<Effect>) {
    match event {
        Event::ToggleRecord => match state.capture {
            SessionActivity::Active => {
                effects.push(Effect::StopMetering);
                effects.push(Effect::PauseCapture);
                next.capture = SessionActivity::Paused;
            }
            SessionActivity::Paused => {
                effects.push(Effect::ResumeCapture);
                effects.push(Effect::StartMetering);
                next.capture = SessionActivity::Active;
            }
            SessionActivity::Absent => {}
        },
        Event::StopRecord | Event::MaxDurationReached => {
            effects.push(Effect::StopMetering);
            effects.push(Effect::FinalizeCapture);
            effects.push(Effect::ReleaseCapture);
            next.capture = SessionActivity::Absent;
            next.mode = Mode::Idling;
        }
        Event::CaptureFailed(err) => {
            effects.push(Effect::StopMetering);
            effects.push(Effect::ReleaseCapture);
            effects.push(Effect::ReportError(err));
            next.capture = SessionActivity::Absent;
            next.mode = Mode::Idling;
        }
        _ => {}
    }
}

fn on_playing(
    state: &MachineState,
    event: Event,
    guards: &Guards,
    next: &mut MachineState,
    effects: &mut Vec<Effect>,
) {
    match event {
        Event::TogglePlay => match state.playback {
            SessionActivity::Active => {
                effects.push(Effect::StopMetering);
                effects.push(Effect::PausePlayback);
                next.playback = SessionActivity::Paused;
            }
            SessionActivity::Paused => {
                effects.push(Effect::ResumePlayback { from_crop_start: false });
                effects.push(Effect::StartMetering);
                next.playback = SessionActivity::Active;
            }
            SessionActivity::Absent => effects.push(Effect::OpenPlayback),
        },
        Event::PlaybackOpened if !state.playback.is_present() => {
            next.playback = SessionActivity::Active;
            effects.push(Effect::ResumePlayback { from_crop_start: false });
            effects.push(Effect::StartMetering);
        }
        Event::PlaybackEnded => {
            effects.push(Effect::StopMetering);
            effects.push(Effect::ReleasePlayback);
            next.playback = SessionActivity::Absent;
            next.mode = Mode::Idling;
        }
        Event::PlaybackFailed(err) => {
            effects.push(Effect::StopMetering);
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
            }
            effects.push(Effect::ReportError(err));
            next.playback = SessionActivity::Absent;
            next.mode = Mode::Idling;
        }
        Event::EnterCrop if guards.allow_cropping && state.has_artifact => {
            enter_cropping(state, next, effects);
        }
        _ => {}
    }
}

fn enter_cropping(state: &MachineState, next: &mut MachineState, effects: &mut Vec<Effect>) {
    effects.push(Effect::StopMetering);
    if state.capture.is_present() {
        effects.push(Effect::ReleaseCapture);
    }
    if state.playback.is_present() {
        effects.push(Effect::ReleasePlayback);
    }
    effects.push(Effect::ResetCropRange);
    next.capture = SessionActivity::Absent;
    next.playback = SessionActivity::Absent;
    next.mode = Mode::Cropping;
}

fn on_cropping(state: &MachineState, event: Event, next: &mut MachineState, effects: &mut Vec<Effect>) {
    match event {
        Event::TogglePlay if !state.trim_running => match state.playback {
            SessionActivity::Absent => effects.push(Effect::OpenPlayback),
            SessionActivity::Active => {
                effects.push(Effect::PausePlayback);
                next.playback = SessionActivity::Paused;
            }
            SessionActivity::Paused => {
                effects.push(Effect::ResumePlayback { from_crop_start: true });
                next.playback = SessionActivity::Active;
            }
        },
        Event::PlaybackOpened if !state.playback.is_present() => {
            effects.push(Effect::ResumePlayback { from_crop_start: true });
            next.playback = SessionActivity::Active;
        }
        // The preview keeps its session at end of media.
        Event::PlaybackEnded if state.playback == SessionActivity::Active => {
            next.playback = SessionActivity::Paused;
        }
        Event::PlaybackFailed(err) => {
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
            }
            effects.push(Effect::ReportError(err));
            next.playback = SessionActivity::Absent;
        }
        Event::EnterCrop if state.trim_running => {
            effects.push(Effect::CancelTrim);
            next.trim_running = false;
        }
        Event::ExitCrop => {
            if state.trim_running {
                effects.push(Effect::CancelTrim);
            }
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
            }
            effects.push(Effect::DiscardCropRange);
            next.trim_running = false;
            next.playback = SessionActivity::Absent;
            next.mode = Mode::Idling;
        }
        Event::CommitTrim(range) if !state.trim_running => {
            if !range.is_committable() {
                effects.push(Effect::ReportError(RecorderError::InvalidRange {
                    length: range.length(),
                    minimum: MIN_CROP_SECONDS,
                }));
                return;
            }
            if state.playback == SessionActivity::Active {
                effects.push(Effect::PausePlayback);
                next.playback = SessionActivity::Paused;
            }
            effects.push(Effect::LaunchTrim(range));
            next.trim_running = true;
        }
        Event::TrimSucceeded(artifact) if state.trim_running => {
            // The player may hold the file the export just replaced.
            if state.playback.is_present() {
                effects.push(Effect::ReleasePlayback);
            }
            effects.push(Effect::AdoptArtifact(artifact));
            effects.push(Effect::ResetCropRange);
            effects.push(Effect::ShowSurface(Surface::Waveform));
            next.playback = SessionActivity::Absent;
            next.has_artifact = true;
            next.trim_running = false;
        }
        Event::TrimFailed(_) | Event::TrimCancelled if state.trim_running => {
            next.trim_running = false;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};
    use std::path::PathBuf;

    fn artifact(duration: f64) -> AudioArtifact {
        AudioArtifact::new(PathBuf::from("/takes/original-take.wav"), duration, crate::models::artifact::TakeKind::Original)
    }

    fn trimmed(duration: f64) -> AudioArtifact {
        AudioArtifact::new(PathBuf::from("/takes/trimmed-take.wav"), duration, crate::models::artifact::TakeKind::Trimmed)
    }

    /// Run `event` and every follow-up a well-behaved backend would produce.
    fn drive(state: &MachineState, event: Event) -> (MachineState, Vec<Effect>) {
        let guards = Guards::default();
        let mut queue = VecDeque::from([event]);
        let mut state = *state;
        let mut all = Vec::new();
        while let Some(event) = queue.pop_front() {
            let t = transition(&state, event, &guards);
            for effect in &t.effects {
                match effect {
                    Effect::OpenCapture => queue.push_back(Event::CaptureOpened),
                    Effect::OpenPlayback => queue.push_back(Event::PlaybackOpened),
                    Effect::FinalizeCapture => queue.push_back(Event::CaptureFinalized(artifact(20.0))),
                    _ => {}
                }
            }
            all.extend(t.effects);
            state = t.state;
        }
        (state, all)
    }

    fn alphabet() -> Vec<Event> {
        vec![
            Event::ToggleRecord,
            Event::StopRecord,
            Event::MaxDurationReached,
            Event::CaptureFailed(RecorderError::CaptureUnavailable("mic".into())),
            Event::TogglePlay,
            Event::PlaybackEnded,
            Event::PlaybackFailed(RecorderError::PlaybackUnavailable("gone".into())),
            Event::EnterCrop,
            Event::ExitCrop,
            Event::CommitTrim(CropRange::new(5.0, 20.0)),
            Event::CommitTrim(CropRange::new(18.5, 20.0)),
            Event::TrimSucceeded(trimmed(15.0)),
            Event::TrimFailed("disk full".into()),
            Event::TrimCancelled,
            Event::TakeLost(None),
            Event::TakeLost(Some(trimmed(15.0))),
        ]
    }

    #[test]
    fn capture_and_playback_never_overlap() {
        let mut seen = HashSet::new();
        let mut frontier = VecDeque::from([MachineState::default()]);
        seen.insert(MachineState::default());

        while let Some(state) = frontier.pop_front() {
            for event in alphabet() {
                let (next, _) = drive(&state, event);
                assert!(
                    !(next.capture.is_present() && next.playback.is_present()),
                    "both sessions live in {:?}",
                    next
                );
                match next.mode {
                    Mode::Idling => assert!(!next.capture.is_present()),
                    Mode::Recording => assert!(next.capture.is_present()),
                    Mode::Playing => assert!(next.playback.is_present()),
                    Mode::Cropping => assert!(next.has_artifact && !next.capture.is_present()),
                }
                if next.trim_running {
                    assert_eq!(next.mode, Mode::Cropping);
                }
                if seen.insert(next) {
                    frontier.push_back(next);
                }
            }
        }
        assert!(seen.iter().any(|s| s.mode == Mode::Cropping && s.trim_running));
    }

    #[test]
    fn toggle_record_opens_capture_before_entering_recording() {
        let t = transition(&MachineState::default(), Event::ToggleRecord, &Guards::default());
        assert_eq!(t.state.mode, Mode::Idling);
        assert_eq!(t.effects, vec![Effect::OpenCapture]);

        let t = transition(&t.state, Event::CaptureOpened, &Guards::default());
        assert_eq!(t.state.mode, Mode::Recording);
        assert_eq!(
            t.effects,
            vec![
                Effect::StartMetering,
                Effect::NotifyMode(Mode::Recording),
                Effect::ShowSurface(Surface::LiveLevel),
            ]
        );
    }

    #[test]
    fn capture_failure_leaves_idling_untouched() {
        let err = RecorderError::CaptureUnavailable("denied".into());
        let t = transition(&MachineState::default(), Event::CaptureFailed(err.clone()), &Guards::default());
        assert_eq!(t.state, MachineState::default());
        assert_eq!(t.effects, vec![Effect::ReportError(err)]);
    }

    #[test]
    fn pause_and_resume_recording_stay_in_mode() {
        let (recording, _) = drive(&MachineState::default(), Event::ToggleRecord);
        let paused = transition(&recording, Event::ToggleRecord, &Guards::default());
        assert_eq!(paused.state.mode, Mode::Recording);
        assert_eq!(paused.state.capture, SessionActivity::Paused);
        assert_eq!(paused.effects, vec![Effect::StopMetering, Effect::PauseCapture]);

        let resumed = transition(&paused.state, Event::ToggleRecord, &Guards::default());
        assert_eq!(resumed.state.capture, SessionActivity::Active);
        assert_eq!(resumed.effects, vec![Effect::ResumeCapture, Effect::StartMetering]);
    }

    #[test]
    fn stop_finalizes_then_adopts() {
        let (recording, _) = drive(&MachineState::default(), Event::ToggleRecord);
        let (idle, effects) = drive(&recording, Event::StopRecord);
        assert_eq!(idle.mode, Mode::Idling);
        assert!(idle.has_artifact);
        let stop = effects.iter().position(|e| *e == Effect::StopMetering).unwrap();
        let finalize = effects.iter().position(|e| *e == Effect::FinalizeCapture).unwrap();
        let adopt = effects
            .iter()
            .position(|e| matches!(e, Effect::AdoptArtifact(_)))
            .unwrap();
        assert!(stop < finalize && finalize < adopt);
    }

    #[test]
    fn same_mode_events_have_no_entry_actions() {
        let (recording, _) = drive(&MachineState::default(), Event::ToggleRecord);
        let (idle, _) = drive(&recording, Event::StopRecord);
        let (cropping, _) = drive(&idle, Event::EnterCrop);
        assert_eq!(cropping.mode, Mode::Cropping);

        let again = transition(&cropping, Event::EnterCrop, &Guards::default());
        assert!(again.is_noop(&cropping));
    }

    #[test]
    fn enter_crop_is_guarded() {
        let t = transition(&MachineState::default(), Event::EnterCrop, &Guards::default());
        assert!(t.is_noop(&MachineState::default()));

        let with_take = MachineState {
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&with_take, Event::EnterCrop, &Guards { allow_cropping: false });
        assert!(t.is_noop(&with_take));
    }

    #[test]
    fn short_range_is_rejected_locally() {
        let cropping = MachineState {
            mode: Mode::Cropping,
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&cropping, Event::CommitTrim(CropRange::new(18.5, 20.0)), &Guards::default());
        assert!(!t.state.trim_running);
        assert!(matches!(
            t.effects.as_slice(),
            [Effect::ReportError(RecorderError::InvalidRange { .. })]
        ));
    }

    #[test]
    fn second_commit_while_running_is_ignored() {
        let cropping = MachineState {
            mode: Mode::Cropping,
            has_artifact: true,
            ..Default::default()
        };
        let range = CropRange::new(5.0, 20.0);
        let first = transition(&cropping, Event::CommitTrim(range), &Guards::default());
        assert_eq!(first.effects, vec![Effect::LaunchTrim(range)]);

        let second = transition(&first.state, Event::CommitTrim(range), &Guards::default());
        assert!(second.is_noop(&first.state));
    }

    #[test]
    fn trim_success_adopts_and_refreshes() {
        let running = MachineState {
            mode: Mode::Cropping,
            playback: SessionActivity::Paused,
            has_artifact: true,
            trim_running: true,
            ..Default::default()
        };
        let t = transition(&running, Event::TrimSucceeded(trimmed(15.0)), &Guards::default());
        assert_eq!(t.state.mode, Mode::Cropping);
        assert!(!t.state.trim_running);
        assert_eq!(
            t.effects,
            vec![
                Effect::ReleasePlayback,
                Effect::AdoptArtifact(trimmed(15.0)),
                Effect::ResetCropRange,
                Effect::ShowSurface(Surface::Waveform),
            ]
        );
    }

    #[test]
    fn stale_trim_completion_is_ignored() {
        let cropping = MachineState {
            mode: Mode::Cropping,
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&cropping, Event::TrimSucceeded(trimmed(3.0)), &Guards::default());
        assert!(t.is_noop(&cropping));
    }

    #[test]
    fn leaving_crop_cancels_running_trim() {
        let running = MachineState {
            mode: Mode::Cropping,
            playback: SessionActivity::Paused,
            has_artifact: true,
            trim_running: true,
            ..Default::default()
        };
        let t = transition(&running, Event::ExitCrop, &Guards::default());
        assert_eq!(t.state.mode, Mode::Idling);
        assert_eq!(
            t.effects,
            vec![
                Effect::CancelTrim,
                Effect::ReleasePlayback,
                Effect::DiscardCropRange,
                Effect::NotifyMode(Mode::Idling),
            ]
        );

        let reentered = transition(&running, Event::EnterCrop, &Guards::default());
        assert_eq!(reentered.effects, vec![Effect::CancelTrim]);
        assert_eq!(reentered.state.mode, Mode::Cropping);
    }

    #[test]
    fn playback_end_keeps_preview_session() {
        let previewing = MachineState {
            mode: Mode::Cropping,
            playback: SessionActivity::Active,
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&previewing, Event::PlaybackEnded, &Guards::default());
        assert_eq!(t.state.playback, SessionActivity::Paused);
        assert!(t.effects.is_empty());

        let resumed = transition(&t.state, Event::TogglePlay, &Guards::default());
        assert_eq!(resumed.effects, vec![Effect::ResumePlayback { from_crop_start: true }]);
    }

    #[test]
    fn playback_end_outside_crop_returns_to_idle() {
        let playing = MachineState {
            mode: Mode::Playing,
            playback: SessionActivity::Active,
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&playing, Event::PlaybackEnded, &Guards::default());
        assert_eq!(t.state.mode, Mode::Idling);
        assert_eq!(t.state.playback, SessionActivity::Absent);
        assert_eq!(t.effects[..2], [Effect::StopMetering, Effect::ReleasePlayback]);
    }

    #[test]
    fn teardown_releases_everything_and_ignores_later_events() {
        let (recording, _) = drive(&MachineState::default(), Event::ToggleRecord);
        let t = transition(&recording, Event::Teardown, &Guards::default());
        assert!(t.state.torn_down);
        assert_eq!(t.effects, vec![Effect::StopMetering, Effect::ReleaseCapture]);

        for event in alphabet() {
            assert!(transition(&t.state, event, &Guards::default()).is_noop(&t.state));
        }
    }

    #[test]
    fn confirm_requires_artifact_and_idle_pipeline() {
        let running = MachineState {
            mode: Mode::Cropping,
            has_artifact: true,
            trim_running: true,
            ..Default::default()
        };
        assert!(transition(&running, Event::Confirm, &Guards::default()).is_noop(&running));

        let idle = MachineState {
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&idle, Event::Confirm, &Guards::default());
        assert!(t.state.torn_down);
        assert_eq!(t.effects.last(), Some(&Effect::DeliverArtifact));
    }

    #[test]
    fn lost_take_disables_take_controls() {
        let idle = MachineState {
            has_artifact: true,
            ..Default::default()
        };
        let t = transition(&idle, Event::TakeLost(None), &Guards::default());
        assert_eq!(t.effects, vec![Effect::DropArtifact]);
        assert!(!t.state.has_artifact);
        assert!(transition(&t.state, Event::TogglePlay, &Guards::default()).is_noop(&t.state));
        assert!(transition(&t.state, Event::Confirm, &Guards::default()).is_noop(&t.state));

        let t = transition(&idle, Event::TakeLost(Some(trimmed(15.0))), &Guards::default());
        assert_eq!(t.effects, vec![Effect::AdoptArtifact(trimmed(15.0))]);
        assert!(t.state.has_artifact);
    }

    #[test]
    fn lost_take_is_ignored_while_the_take_is_open() {
        let cropping = MachineState {
            mode: Mode::Cropping,
            has_artifact: true,
            ..Default::default()
        };
        assert!(transition(&cropping, Event::TakeLost(None), &Guards::default()).is_noop(&cropping));
    }

    #[test]
    fn cancel_discards_takes() {
        let t = transition(&MachineState::default(), Event::Cancel, &Guards::default());
        assert!(t.state.torn_down);
        assert_eq!(t.effects, vec![Effect::StopMetering, Effect::DiscardTakes]);
    }
}
