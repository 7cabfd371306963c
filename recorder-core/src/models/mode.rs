use serde::{Deserialize, Serialize};

/// Top-level operating mode. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idling,
    Recording,
    Playing,
    Cropping,
}

impl Mode {
    /// Modes whose live session is sampled by the metering loop.
    pub fn is_metered(&self) -> bool {
        matches!(self, Self::Recording | Self::Playing)
    }
}

/// Rendering surface the display collaborator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Animated level display fed by meter samples.
    LiveLevel,
    /// Static waveform of the current artifact, with crop handles.
    Waveform,
}

impl Surface {
    /// Surface shown on entry to `mode`, if the mode switches surfaces at all.
    pub fn for_mode(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Recording | Mode::Playing => Some(Self::LiveLevel),
            Mode::Cropping => Some(Self::Waveform),
            Mode::Idling => None,
        }
    }
}
