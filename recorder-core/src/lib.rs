//! # recorder-core
//!
//! Platform-agnostic core of the take recorder.
//!
//! Records a single take, plays it back, and exports a cropped sub-range
//! into a second single-slot file. Device backends (cpal, test scripts)
//! implement the `CaptureBackend` and `PlaybackBackend` traits and plug into
//! the generic `SoundRecorder`.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── machine/      ← pure mode state machine: transition(state, event) -> effects
//! ├── traits/       ← CaptureBackend, PlaybackBackend, TrimEncoder, RecorderDelegate
//! ├── models/       ← RecorderError, Mode, RecorderConfig, CropRange, AudioArtifact, etc.
//! ├── processing/   ← level math, WAV decode and range export
//! ├── session/      ← capture, playback, metering, crop, trim pipeline, SoundRecorder
//! └── storage/      ← single-slot files, JSON metadata sidecars
//! ```

pub mod machine;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use machine::{transition, Effect, Event, Guards, MachineState, SessionActivity, Transition};
pub use models::artifact::{ArtifactMetadata, AudioArtifact, TakeKind};
pub use models::config::{AudioCodec, CaptureConfig, EncoderQuality, RecorderConfig};
pub use models::controls::ControlState;
pub use models::crop::{CropRange, CropTint, MIN_CROP_SECONDS};
pub use models::error::RecorderError;
pub use models::meter::{format_clock, ClockDirection, MeterSample};
pub use models::mode::{Mode, Surface};
pub use models::trim::{TrimCompletion, TrimJob, TrimOutcome, TrimStatus};
pub use processing::wav::{DecodedAudio, WavTrimEncoder};
pub use session::crop::CropRangeManager;
pub use session::metering::{MeteringLoop, TickToken};
pub use session::recorder::SoundRecorder;
pub use session::ticker::TickCallback;
pub use session::trim::{TrimPipeline, WakeCallback};
pub use storage::slot::SingleSlot;
pub use traits::capture_device::{CaptureBackend, CaptureDevice};
pub use traits::delegate::{CropFeedback, RecorderDelegate};
pub use traits::player::{PlaybackBackend, Player};
pub use traits::trim_encoder::TrimEncoder;
