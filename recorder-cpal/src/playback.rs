//! Take playback through cpal.
//!
//! The whole take is decoded up front with `DecodedAudio`; the output callback
//! walks a shared cursor over it. Rate differences between the take and the
//! device are handled by stepping the cursor at the ratio of the two rates.

use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Host, Sample, SizedSample};
use parking_lot::Mutex;

use recorder_core::models::error::RecorderError;
use recorder_core::processing::wav::DecodedAudio;
use recorder_core::traits::player::{PlaybackBackend, Player};

/// Frames averaged for one level reading (10 ms).
const LEVEL_WINDOW_SECS: f64 = 0.01;

struct PlayerShared {
    audio: DecodedAudio,
    /// Source frame position, fractional while resampling.
    cursor: f64,
    playing: bool,
}

impl PlayerShared {
    fn frame(&self) -> usize {
        (self.cursor as usize).min(self.audio.frame_count())
    }

    fn finished(&self) -> bool {
        self.frame() >= self.audio.frame_count()
    }

    /// Fill one interleaved output buffer and advance the cursor.
    fn render(&mut self, out: &mut [f32], out_channels: usize, step: f64) {
        let in_channels = self.audio.channels() as usize;
        let out_channels = out_channels.max(1);

        for frame in out.chunks_mut(out_channels) {
            if !self.playing || self.finished() {
                frame.fill(0.0);
                continue;
            }
            let start = self.frame() * in_channels;
            let source = &self.audio.samples()[start..start + in_channels];
            let mono = source.iter().sum::<f32>() / in_channels as f32;
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match (in_channels, out_channels) {
                    (1, _) => source[0],
                    (_, 1) => mono,
                    _ => source[ch.min(in_channels - 1)],
                };
            }
            self.cursor += step;
        }

        if self.finished() {
            self.playing = false;
        }
    }
}

pub struct CpalPlaybackBackend {
    host: Host,
}

impl CpalPlaybackBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalPlaybackBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackBackend for CpalPlaybackBackend {
    type Player = CpalPlayer;

    fn open(&self, path: &Path) -> Result<CpalPlayer, RecorderError> {
        let audio = DecodedAudio::open(path)?;

        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| RecorderError::PlaybackUnavailable("no output device available".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| RecorderError::PlaybackUnavailable(format!("no output config: {}", e)))?;

        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.config();
        let out_channels = stream_config.channels as usize;
        let step = audio.sample_rate() as f64 / stream_config.sample_rate.0 as f64;

        log::debug!(
            "Playing {} ({} Hz source, {} Hz device, {:?})",
            path.display(),
            audio.sample_rate(),
            stream_config.sample_rate.0,
            sample_format
        );

        let duration = audio.duration_secs();
        let sample_rate = audio.sample_rate();
        let shared = Arc::new(Mutex::new(PlayerShared {
            audio,
            cursor: 0.0,
            playing: false,
        }));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_output::<f32>(&device, &stream_config, out_channels, step, &shared),
            cpal::SampleFormat::I16 => build_output::<i16>(&device, &stream_config, out_channels, step, &shared),
            cpal::SampleFormat::U16 => build_output::<u16>(&device, &stream_config, out_channels, step, &shared),
            other => {
                return Err(RecorderError::PlaybackUnavailable(format!(
                    "sample format not supported: {:?}",
                    other
                )))
            }
        }?;

        Ok(CpalPlayer {
            stream,
            shared,
            duration,
            sample_rate,
        })
    }
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    out_channels: usize,
    step: f64,
    shared: &Arc<Mutex<PlayerShared>>,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample + FromSample<f32>,
{
    let shared = Arc::clone(shared);
    let err_fn = |err| log::error!("Output stream error: {}", err);
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                shared.lock().render(&mut scratch, out_channels, step);
                for (out, sample) in data.iter_mut().zip(&scratch) {
                    *out = T::from_sample(*sample);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| RecorderError::PlaybackUnavailable(format!("failed to build output stream: {}", e)))
}

/// An output stream bound to one decoded take.
pub struct CpalPlayer {
    stream: cpal::Stream,
    shared: Arc<Mutex<PlayerShared>>,
    duration: f64,
    sample_rate: u32,
}

impl Player for CpalPlayer {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.shared.lock().frame() as f64 / self.sample_rate as f64
    }

    fn seek(&mut self, secs: f64) {
        let mut state = self.shared.lock();
        state.cursor = state.audio.frame_at(secs) as f64;
    }

    fn play(&mut self) -> Result<(), RecorderError> {
        self.shared.lock().playing = true;
        self.stream
            .play()
            .map_err(|e| RecorderError::PlaybackUnavailable(format!("failed to start output stream: {}", e)))
    }

    fn pause(&mut self) {
        self.shared.lock().playing = false;
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause output stream: {}", e);
        }
    }

    fn stop(&mut self) {
        self.pause();
        self.shared.lock().cursor = 0.0;
    }

    fn is_playing(&self) -> bool {
        let state = self.shared.lock();
        state.playing && !state.finished()
    }

    fn is_finished(&self) -> bool {
        self.shared.lock().finished()
    }

    fn average_power_db(&self) -> f32 {
        let state = self.shared.lock();
        let window = (state.audio.sample_rate() as f64 * LEVEL_WINDOW_SECS).max(1.0) as usize;
        state.audio.power_db_at(state.frame(), window)
    }
}
