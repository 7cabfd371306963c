//! Signal level math shared by devices and the metering loop.

/// Floor reported for digital silence, in dBFS.
pub const SILENCE_DB: f32 = -160.0;

/// RMS level of normalized samples.
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute level of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

/// Convert a linear amplitude to dBFS, floored at `SILENCE_DB`.
pub fn power_db(amplitude: f32) -> f32 {
    if amplitude.is_nan() || amplitude <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * amplitude.log10()).max(SILENCE_DB)
}

/// Convert dBFS to a display level: `10^(dB / 20)` clamped to `[0, 1]`.
///
/// NaN maps to silence.
pub fn level_from_db(db: f32) -> f32 {
    if db.is_nan() {
        return 0.0;
    }
    10f32.powf(db / 20.0).clamp(0.0, 1.0)
}
