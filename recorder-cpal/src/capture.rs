//! Microphone capture through cpal.
//!
//! The input callback converts whatever the device delivers to f32, remaps
//! it to the configured channel count and appends 16-bit PCM to the take.
//! Levels are measured in the same callback.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Host, Sample, SizedSample};
use hound::{WavSpec, WavWriter};
use parking_lot::Mutex;

use recorder_core::models::config::{AudioCodec, CaptureConfig};
use recorder_core::models::error::RecorderError;
use recorder_core::processing::levels;
use recorder_core::traits::capture_device::{CaptureBackend, CaptureDevice};

type TakeWriter = WavWriter<BufWriter<File>>;

/// State shared between the input callback and the device handle.
struct CaptureShared {
    writer: Option<TakeWriter>,
    recording: bool,
    frames: u64,
    power_db: f32,
    /// First write error. Nothing is written or counted after it.
    failure: Option<String>,
}

impl CaptureShared {
    /// Hand over the writer for finalizing, or the write error that cut the take short.
    fn close(&mut self) -> Result<Option<TakeWriter>, RecorderError> {
        self.recording = false;
        let writer = self.writer.take();
        match &self.failure {
            Some(reason) => Err(RecorderError::CaptureUnavailable(format!(
                "take stopped after a write error: {}",
                reason
            ))),
            None => Ok(writer),
        }
    }
}

pub struct CpalCaptureBackend {
    host: Host,
}

impl CpalCaptureBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for CpalCaptureBackend {
    type Device = CpalCaptureDevice;

    fn is_available(&self) -> bool {
        self.host.default_input_device().is_some()
    }

    fn open(&self, path: &Path, config: &CaptureConfig) -> Result<CpalCaptureDevice, RecorderError> {
        if config.codec != AudioCodec::Pcm16 {
            return Err(RecorderError::CaptureUnavailable(format!(
                "codec {:?} is not supported by the cpal backend",
                config.codec
            )));
        }

        let device = self
            .host
            .default_input_device()
            .ok_or_else(|| RecorderError::CaptureUnavailable("no input device available".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| RecorderError::CaptureUnavailable(format!("no input config: {}", e)))?;

        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.config();
        let device_rate = stream_config.sample_rate.0;
        let input_channels = stream_config.channels as usize;

        if device_rate != config.sample_rate {
            log::warn!(
                "Input device runs at {} Hz, recording at device rate instead of {} Hz",
                device_rate,
                config.sample_rate
            );
        }
        log::info!(
            "Recording from {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_else(|_| "unknown device".into()),
            device_rate,
            input_channels,
            sample_format
        );

        let spec = WavSpec {
            channels: config.channels,
            sample_rate: device_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)
            .map_err(|e| RecorderError::CaptureUnavailable(format!("failed to create {}: {}", path.display(), e)))?;

        let shared = Arc::new(Mutex::new(CaptureShared {
            writer: Some(writer),
            recording: false,
            frames: 0,
            power_db: levels::SILENCE_DB,
            failure: None,
        }));

        let output_channels = config.channels as usize;
        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_input::<f32>(&device, &stream_config, input_channels, output_channels, &shared)
            }
            cpal::SampleFormat::I16 => {
                build_input::<i16>(&device, &stream_config, input_channels, output_channels, &shared)
            }
            cpal::SampleFormat::U16 => {
                build_input::<u16>(&device, &stream_config, input_channels, output_channels, &shared)
            }
            other => {
                return Err(RecorderError::CaptureUnavailable(format!(
                    "sample format not supported: {:?}",
                    other
                )))
            }
        }?;

        Ok(CpalCaptureDevice {
            stream,
            shared,
            sample_rate: device_rate,
            final_duration: None,
        })
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    input_channels: usize,
    output_channels: usize,
    shared: &Arc<Mutex<CaptureShared>>,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let shared = Arc::clone(shared);
    let err_fn = |err| log::error!("Input stream error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data.iter().map(|s| s.to_sample::<f32>()).collect();
                write_input(&samples, input_channels, output_channels, &shared);
            },
            err_fn,
            None,
        )
        .map_err(|e| RecorderError::CaptureUnavailable(format!("failed to build input stream: {}", e)))
}

fn write_input(samples: &[f32], input_channels: usize, output_channels: usize, shared: &Mutex<CaptureShared>) {
    let mut state = shared.lock();
    if !state.recording || state.failure.is_some() {
        return;
    }

    let input_channels = input_channels.max(1);
    let mut frames = 0u64;
    let mut sum_sq = 0.0f32;
    let mut failure = None;

    if let Some(writer) = state.writer.as_mut() {
        'frames: for frame in samples.chunks_exact(input_channels) {
            let mono = frame.iter().sum::<f32>() / input_channels as f32;
            for ch in 0..output_channels {
                let value = match (input_channels, output_channels) {
                    (_, 1) => mono,
                    (1, _) => frame[0],
                    _ => frame[ch.min(input_channels - 1)],
                };
                if let Err(e) = writer.write_sample(to_pcm16(value)) {
                    failure = Some(e.to_string());
                    break 'frames;
                }
            }
            sum_sq += mono * mono;
            frames += 1;
        }
    }

    state.frames += frames;
    if frames > 0 {
        state.power_db = levels::power_db((sum_sq / frames as f32).sqrt());
    }
    if let Some(reason) = failure {
        log::error!("Failed to write audio data: {}", reason);
        state.recording = false;
        state.failure = Some(reason);
    }
}

fn to_pcm16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// An open input stream writing into one take.
pub struct CpalCaptureDevice {
    stream: cpal::Stream,
    shared: Arc<Mutex<CaptureShared>>,
    sample_rate: u32,
    final_duration: Option<f64>,
}

impl CpalCaptureDevice {
    fn duration(&self) -> f64 {
        self.shared.lock().frames as f64 / self.sample_rate as f64
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn record(&mut self) -> Result<(), RecorderError> {
        {
            let mut state = self.shared.lock();
            if let Some(reason) = &state.failure {
                return Err(RecorderError::CaptureUnavailable(format!("take is unusable: {}", reason)));
            }
            state.recording = true;
        }
        self.stream
            .play()
            .map_err(|e| RecorderError::CaptureUnavailable(format!("failed to start input stream: {}", e)))
    }

    fn pause(&mut self) {
        {
            let mut state = self.shared.lock();
            state.recording = false;
            state.power_db = levels::SILENCE_DB;
        }
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause input stream: {}", e);
        }
    }

    fn stop(&mut self) -> Result<f64, RecorderError> {
        if let Some(duration) = self.final_duration {
            return Ok(duration);
        }
        self.pause();

        let writer = self.shared.lock().close()?;
        if let Some(writer) = writer {
            writer
                .finalize()
                .map_err(|e| RecorderError::Storage(format!("failed to finalize take: {}", e)))?;
        }
        let duration = self.duration();
        self.final_duration = Some(duration);
        Ok(duration)
    }

    fn current_time(&self) -> f64 {
        self.final_duration.unwrap_or_else(|| self.duration())
    }

    fn average_power_db(&self) -> f32 {
        self.shared.lock().power_db
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        if self.final_duration.is_none() {
            if let Err(e) = self.stop() {
                log::error!("Failed to finalize take on release: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(channels: u16, path: &Path) -> Mutex<CaptureShared> {
        let spec = WavSpec {
            channels,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        Mutex::new(CaptureShared {
            writer: Some(WavWriter::create(path, spec).unwrap()),
            recording: true,
            frames: 0,
            power_db: levels::SILENCE_DB,
            failure: None,
        })
    }

    #[test]
    fn pcm_conversion_clamps() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), i16::MAX);
        assert_eq!(to_pcm16(4.0), i16::MAX);
        assert_eq!(to_pcm16(-4.0), -i16::MAX);
    }

    #[test]
    fn mono_input_is_duplicated_to_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let state = shared(2, &path);

        write_input(&[0.5, -0.5, 0.25], 1, 2, &state);
        assert_eq!(state.lock().frames, 3);
        assert!(state.lock().power_db > levels::SILENCE_DB);

        state.lock().writer.take().unwrap().finalize().unwrap();
        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0], samples[1]);
        assert_eq!(samples[2], -samples[0]);
    }

    #[test]
    fn stereo_input_is_averaged_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let state = shared(1, &path);

        write_input(&[1.0, 0.0, 0.5, 0.5], 2, 1, &state);
        state.lock().writer.take().unwrap().finalize().unwrap();

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples, vec![to_pcm16(0.5), to_pcm16(0.5)]);
    }

    #[test]
    fn write_error_ends_the_take() {
        let dir = tempfile::tempdir().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 1000,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let state = Mutex::new(CaptureShared {
            writer: Some(WavWriter::create(dir.path().join("take.wav"), spec).unwrap()),
            recording: true,
            frames: 0,
            power_db: levels::SILENCE_DB,
            failure: None,
        });

        // 0.5 does not fit in 8 bits, so the second frame fails.
        write_input(&[0.0, 0.5, 0.0], 1, 1, &state);
        {
            let s = state.lock();
            assert_eq!(s.frames, 1);
            assert!(s.failure.is_some());
            assert!(!s.recording);
        }

        state.lock().recording = true;
        write_input(&[0.0, 0.0], 1, 1, &state);
        assert_eq!(state.lock().frames, 1);

        assert!(matches!(state.lock().close(), Err(RecorderError::CaptureUnavailable(_))));
    }

    #[test]
    fn close_hands_over_a_healthy_writer() {
        let dir = tempfile::tempdir().unwrap();
        let state = shared(2, &dir.path().join("take.wav"));
        write_input(&[0.1, 0.1], 2, 2, &state);

        let writer = state.lock().close().unwrap();
        assert!(writer.is_some());
        assert!(!state.lock().recording);
        writer.unwrap().finalize().unwrap();
    }

    #[test]
    fn paused_input_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let state = shared(2, &dir.path().join("take.wav"));
        state.lock().recording = false;

        write_input(&[0.5, 0.5], 2, 2, &state);
        assert_eq!(state.lock().frames, 0);
    }
}
