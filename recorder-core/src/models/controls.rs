use serde::{Deserialize, Serialize};

use super::mode::Mode;

/// Enablement of each user control, derived from the machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    /// Start/pause/resume a take.
    pub record: bool,
    /// Finish the running take.
    pub stop: bool,
    /// Play/pause the current take or the crop preview.
    pub play: bool,
    /// Enter Cropping mode.
    pub crop: bool,
    /// Export the selected range.
    pub commit: bool,
    /// Hand the current take back to the host.
    pub done: bool,
}

/// Inputs the control derivation needs beyond the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlInputs {
    pub mode: Mode,
    pub has_artifact: bool,
    pub trim_running: bool,
    pub allow_cropping: bool,
    pub range_committable: bool,
}

impl ControlState {
    pub fn derive(inputs: ControlInputs) -> Self {
        let ControlInputs {
            mode,
            has_artifact,
            trim_running,
            allow_cropping,
            range_committable,
        } = inputs;

        Self {
            record: matches!(mode, Mode::Idling | Mode::Recording),
            stop: mode == Mode::Recording,
            play: has_artifact && mode != Mode::Recording && !trim_running,
            crop: allow_cropping && has_artifact && matches!(mode, Mode::Idling | Mode::Playing),
            commit: mode == Mode::Cropping && range_committable && !trim_running,
            done: has_artifact && mode != Mode::Recording && !trim_running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(mode: Mode) -> ControlInputs {
        ControlInputs {
            mode,
            has_artifact: true,
            trim_running: false,
            allow_cropping: true,
            range_committable: true,
        }
    }

    #[test]
    fn fresh_recorder_only_allows_recording() {
        let controls = ControlState::derive(ControlInputs {
            has_artifact: false,
            ..inputs(Mode::Idling)
        });
        assert_eq!(
            controls,
            ControlState {
                record: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn recording_disables_everything_but_record_and_stop() {
        let controls = ControlState::derive(inputs(Mode::Recording));
        assert!(controls.record && controls.stop);
        assert!(!controls.play && !controls.crop && !controls.done && !controls.commit);
    }

    #[test]
    fn running_trim_locks_commit_play_and_done() {
        let controls = ControlState::derive(ControlInputs {
            trim_running: true,
            ..inputs(Mode::Cropping)
        });
        assert!(!controls.commit && !controls.play && !controls.done);
    }

    #[test]
    fn cropping_disallowed_hides_crop() {
        let controls = ControlState::derive(ControlInputs {
            allow_cropping: false,
            ..inputs(Mode::Idling)
        });
        assert!(!controls.crop);
        assert!(controls.play && controls.done);
    }
}
