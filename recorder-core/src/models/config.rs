use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Codec family used for both takes.
///
/// Takes default to `.wav` rather than an AAC container: the bundled
/// `WavTrimEncoder` and the cpal backend only read and write PCM. `AacLc`
/// needs both a capture backend and a `TrimEncoder` that produce MPEG-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    /// Linear 16-bit PCM in a RIFF/WAV container.
    #[default]
    Pcm16,
    /// AAC-LC in an MPEG-4 container. Requires a host-supplied backend.
    AacLc,
}

impl AudioCodec {
    /// File extension used for the single-slot take files.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Pcm16 => "wav",
            Self::AacLc => "m4a",
        }
    }
}

/// Encoder quality hint forwarded to lossy encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Fixed encode settings for a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Channel count (default: 2).
    pub channels: u16,

    /// Container and codec of both takes (default: 16-bit PCM `.wav`).
    pub codec: AudioCodec,

    pub quality: EncoderQuality,

    /// Recording limit in seconds. 0 counts up without limit, anything
    /// above counts down and stops the take at the limit.
    pub max_duration_secs: f64,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::Configuration("sample rate must be positive".into()));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(RecorderError::Configuration(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if !self.max_duration_secs.is_finite() || self.max_duration_secs < 0.0 {
            return Err(RecorderError::Configuration(format!(
                "max duration must be a non-negative number of seconds, got {}",
                self.max_duration_secs
            )));
        }
        Ok(())
    }

    /// The recording limit, if one is set.
    pub fn max_duration(&self) -> Option<f64> {
        (self.max_duration_secs > 0.0).then_some(self.max_duration_secs)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            codec: AudioCodec::default(),
            quality: EncoderQuality::default(),
            max_duration_secs: 0.0,
        }
    }
}

/// Host-facing configuration for a recorder instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Application-private directory holding the single-slot takes.
    pub storage_root: PathBuf,

    /// Whether Cropping mode is reachable at all.
    pub allow_cropping: bool,

    /// Metering tick period in milliseconds (default: 10).
    pub tick_period_ms: u64,

    /// Base name of the original take slot, without extension.
    pub original_take_name: String,

    /// Base name of the trimmed take slot, without extension.
    pub trimmed_take_name: String,

    pub capture: CaptureConfig,
}

impl RecorderConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Default::default()
        }
    }

    pub fn with_max_duration(mut self, secs: f64) -> Self {
        self.capture.max_duration_secs = secs;
        self
    }

    pub fn with_cropping(mut self, allow: bool) -> Self {
        self.allow_cropping = allow;
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = period.as_millis() as u64;
        self
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.tick_period_ms == 0 {
            return Err(RecorderError::Configuration("tick period must be positive".into()));
        }
        if self.original_take_name.is_empty() || self.trimmed_take_name.is_empty() {
            return Err(RecorderError::Configuration("take names must not be empty".into()));
        }
        if self.original_take_name == self.trimmed_take_name {
            return Err(RecorderError::Configuration(
                "original and trimmed takes must use different names".into(),
            ));
        }
        self.capture.validate()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn original_take_path(&self) -> PathBuf {
        self.slot_path(&self.original_take_name)
    }

    pub fn trimmed_take_path(&self) -> PathBuf {
        self.slot_path(&self.trimmed_take_name)
    }

    fn slot_path(&self, name: &str) -> PathBuf {
        self.storage_root
            .join(format!("{}.{}", name, self.capture.codec.file_extension()))
    }

    pub fn from_json_str(json: &str) -> Result<Self, RecorderError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RecorderError::Configuration(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RecorderError> {
        let json = fs::read_to_string(path)
            .map_err(|e| RecorderError::Configuration(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            allow_cropping: true,
            tick_period_ms: 10,
            original_take_name: "original-take".into(),
            trimmed_take_name: "trimmed-take".into(),
            capture: CaptureConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_encode_settings() {
        let config = RecorderConfig::default();
        assert_eq!(config.capture.sample_rate, 44_100);
        assert_eq!(config.capture.channels, 2);
        assert_eq!(config.capture.quality, EncoderQuality::Medium);
        assert_eq!(config.capture.codec, AudioCodec::Pcm16);
        assert_eq!(config.capture.codec.file_extension(), "wav");
        assert_eq!(config.capture.max_duration(), None);
        assert_eq!(config.tick_period(), Duration::from_millis(10));
        assert!(config.allow_cropping);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn slot_paths_live_under_storage_root() {
        let config = RecorderConfig::new("/data/app");
        assert_eq!(config.original_take_path(), PathBuf::from("/data/app/original-take.wav"));
        assert_eq!(config.trimmed_take_path(), PathBuf::from("/data/app/trimmed-take.wav"));
    }

    #[test]
    fn aac_codec_changes_extension() {
        let mut config = RecorderConfig::new("/data/app");
        config.capture.codec = AudioCodec::AacLc;
        assert_eq!(config.original_take_path(), PathBuf::from("/data/app/original-take.m4a"));
    }

    #[test]
    fn rejects_negative_max_duration() {
        let config = RecorderConfig::default().with_max_duration(-1.0);
        assert!(matches!(config.validate(), Err(RecorderError::Configuration(_))));
    }

    #[test]
    fn rejects_identical_slot_names() {
        let mut config = RecorderConfig::default();
        config.trimmed_take_name = config.original_take_name.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let config = RecorderConfig::from_json_str(
            r#"{ "storage_root": "/tmp/takes", "allow_cropping": false, "capture": { "max_duration_secs": 30 } }"#,
        )
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/tmp/takes"));
        assert!(!config.allow_cropping);
        assert_eq!(config.capture.max_duration(), Some(30.0));
        assert_eq!(config.capture.sample_rate, 44_100);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        assert!(matches!(
            RecorderConfig::from_json_str("{ not json"),
            Err(RecorderError::Configuration(_))
        ));
    }
}
