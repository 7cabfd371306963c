//! WAV decode and range export on top of `hound`.

use std::fs;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use hound::{SampleFormat, WavReader, WavWriter};

use crate::models::crop::CropRange;
use crate::models::error::RecorderError;
use crate::processing::levels;
use crate::traits::trim_encoder::TrimEncoder;

/// A fully decoded take, interleaved and normalized to `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Decode a WAV file. Missing or corrupt files are `PlaybackUnavailable`.
    pub fn open(path: &Path) -> Result<Self, RecorderError> {
        let reader = WavReader::open(path).map_err(|e| {
            RecorderError::PlaybackUnavailable(format!("failed to open {}: {}", path.display(), e))
        })?;
        let spec = reader.spec();

        let samples: Result<Vec<f32>, _> = match spec.sample_format {
            SampleFormat::Float => reader.into_samples::<f32>().collect(),
            SampleFormat::Int => {
                let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_value))
                    .collect()
            }
        };
        let samples = samples
            .map_err(|e| RecorderError::PlaybackUnavailable(format!("failed to decode samples: {}", e)))?;

        Ok(Self::new(samples, spec.sample_rate, spec.channels))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Frame index for a time, clamped to the end of the take.
    pub fn frame_at(&self, secs: f64) -> usize {
        let frame = (secs.max(0.0) * self.sample_rate as f64) as usize;
        frame.min(self.frame_count())
    }

    /// Average power in dBFS over `window_frames` starting at `frame`.
    pub fn power_db_at(&self, frame: usize, window_frames: usize) -> f32 {
        let channels = self.channels as usize;
        let start = frame.min(self.frame_count()) * channels;
        let end = (start + window_frames * channels).min(self.samples.len());
        let mono = downmix_to_mono(&self.samples[start..end], channels);
        levels::power_db(levels::rms_level(&mono))
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Exports a time window of a WAV take into a new WAV with the same spec.
#[derive(Debug, Clone)]
pub struct WavTrimEncoder {
    /// Frames copied between cancellation checks.
    chunk_frames: usize,
}

impl WavTrimEncoder {
    pub fn new() -> Self {
        Self { chunk_frames: 4096 }
    }

    pub fn with_chunk_frames(mut self, frames: usize) -> Self {
        self.chunk_frames = frames.max(1);
        self
    }
}

impl Default for WavTrimEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrimEncoder for WavTrimEncoder {
    fn export(
        &self,
        source: &Path,
        output: &Path,
        range: CropRange,
        cancel: &AtomicBool,
    ) -> Result<(), RecorderError> {
        let mut reader = WavReader::open(source)
            .map_err(|e| RecorderError::ExportFailed(format!("failed to open source: {}", e)))?;
        let spec = reader.spec();
        let rate = spec.sample_rate as f64;
        let total_frames = reader.duration() as u64;

        let start = ((range.left() * rate).round() as u64).min(total_frames);
        let end = ((range.right() * rate).round() as u64).min(total_frames);
        if end <= start {
            return Err(RecorderError::ExportFailed(format!(
                "range {:.2}..{:.2}s lies outside the {:.2}s source",
                range.left(),
                range.right(),
                total_frames as f64 / rate
            )));
        }

        reader
            .seek(start as u32)
            .map_err(|e| RecorderError::ExportFailed(format!("failed to seek source: {}", e)))?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::ExportFailed(format!("failed to create directory: {}", e)))?;
        }
        let mut writer = WavWriter::create(output, spec)
            .map_err(|e| RecorderError::ExportFailed(format!("failed to create output: {}", e)))?;

        let count = (end - start) as usize * spec.channels as usize;
        let chunk = self.chunk_frames * spec.channels as usize;
        match spec.sample_format {
            SampleFormat::Float => copy_samples::<f32, _, _>(&mut reader, &mut writer, count, chunk, cancel)?,
            SampleFormat::Int => copy_samples::<i32, _, _>(&mut reader, &mut writer, count, chunk, cancel)?,
        }

        writer
            .finalize()
            .map_err(|e| RecorderError::ExportFailed(format!("failed to finalize output: {}", e)))
    }
}

fn copy_samples<S, R, W>(
    reader: &mut WavReader<R>,
    writer: &mut WavWriter<W>,
    count: usize,
    chunk: usize,
    cancel: &AtomicBool,
) -> Result<(), RecorderError>
where
    S: hound::Sample,
    R: Read,
    W: Write + Seek,
{
    for (i, sample) in reader.samples::<S>().take(count).enumerate() {
        if i % chunk == 0 && cancel.load(Ordering::SeqCst) {
            return Err(RecorderError::ExportFailed("export cancelled".into()));
        }
        let sample = sample.map_err(|e| RecorderError::ExportFailed(format!("failed to read source: {}", e)))?;
        writer
            .write_sample(sample)
            .map_err(|e| RecorderError::ExportFailed(format!("failed to write sample: {}", e)))?;
    }
    Ok(())
}
