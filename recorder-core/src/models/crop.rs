use serde::{Deserialize, Serialize};

/// Shortest sub-range that may be exported, in seconds.
pub const MIN_CROP_SECONDS: f64 = 2.0;

/// Slack for handle arithmetic such as `(left + 2.0) - left`.
const LENGTH_EPSILON: f64 = 1e-9;

/// A `[left, right]` time window in seconds over the current take.
///
/// Construction normalizes the bounds so `0 <= left <= right` always holds;
/// the upper bound against the take duration is enforced by the crop manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRange {
    left: f64,
    right: f64,
}

impl CropRange {
    pub fn new(left: f64, right: f64) -> Self {
        let left = sanitize(left);
        let right = sanitize(right).max(left);
        Self { left, right }
    }

    /// The whole take.
    pub fn full(duration: f64) -> Self {
        Self::new(0.0, duration)
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn length(&self) -> f64 {
        self.right - self.left
    }

    /// Long enough to be committed for export.
    pub fn is_committable(&self) -> bool {
        self.length() >= MIN_CROP_SECONDS - LENGTH_EPSILON
    }

    /// Whether the range fits inside a take of `duration` seconds.
    pub fn fits(&self, duration: f64) -> bool {
        self.left >= 0.0 && self.left <= self.right && self.right <= duration
    }
}

fn sanitize(t: f64) -> f64 {
    if t.is_finite() {
        t.max(0.0)
    } else {
        0.0
    }
}

/// Tint of the crop boundary indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropTint {
    Enabled,
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_length_is_committable() {
        assert!(CropRange::new(18.0, 20.0).is_committable());
        assert!(!CropRange::new(18.5, 20.0).is_committable());
    }

    #[test]
    fn inverted_bounds_collapse() {
        let range = CropRange::new(5.0, 3.0);
        assert_eq!(range.left(), 5.0);
        assert_eq!(range.right(), 5.0);
        assert_eq!(range.length(), 0.0);
    }

    #[test]
    fn negative_and_nan_bounds_clamp_to_zero() {
        let range = CropRange::new(-1.0, f64::NAN);
        assert_eq!(range.left(), 0.0);
        assert_eq!(range.right(), 0.0);
    }

    #[test]
    fn fits_checks_duration() {
        assert!(CropRange::full(20.0).fits(20.0));
        assert!(!CropRange::new(0.0, 20.5).fits(20.0));
    }
}
