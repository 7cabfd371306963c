//! # recorder-cpal
//!
//! cpal device backend for recorder-core, plus the `take-recorder` host.
//!
//! Provides:
//! - `CpalCaptureBackend` - default input device, written to 16-bit WAV with `hound`
//! - `CpalPlaybackBackend` - decoded WAV played through the default output device
//! - `cli` - argument parsing, logging setup and the stdin command set
//!
//! ## Usage
//! ```ignore
//! use recorder_core::{RecorderConfig, SoundRecorder};
//! use recorder_cpal::{CpalCaptureBackend, CpalPlaybackBackend};
//!
//! let config = RecorderConfig::new("/tmp/takes").with_max_duration(30.0);
//! let mut recorder = SoundRecorder::new(config, CpalCaptureBackend::new(), CpalPlaybackBackend::new())?;
//! recorder.toggle_record();
//! ```

pub mod capture;
pub mod cli;
pub mod playback;

pub use capture::{CpalCaptureBackend, CpalCaptureDevice};
pub use playback::{CpalPlaybackBackend, CpalPlayer};
