use crate::models::crop::{CropRange, CropTint, MIN_CROP_SECONDS};
use crate::traits::delegate::CropFeedback;

/// Maps crop handle drags onto a validated range over the current take.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRangeManager {
    duration: f64,
    range: CropRange,
}

impl CropRangeManager {
    /// Start with the whole take selected.
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            duration,
            range: CropRange::full(duration),
        }
    }

    pub fn reset(&mut self, duration: f64) {
        *self = Self::new(duration);
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn range(&self) -> CropRange {
        self.range
    }

    /// Normalized horizontal position for a pixel offset within `width`.
    pub fn fraction_at_pixel(x: f64, width: f64) -> f64 {
        if width <= 0.0 || !width.is_finite() {
            return 0.0;
        }
        clamp_unit(x / width)
    }

    /// Time under a normalized drag position.
    pub fn time_at(&self, position: f64) -> f64 {
        clamp_unit(position) * self.duration
    }

    /// Move the left handle, keeping it at least `MIN_CROP_SECONDS` before the right one.
    pub fn drag_left(&mut self, position: f64) -> CropFeedback {
        let upper = (self.range.right() - MIN_CROP_SECONDS).max(0.0);
        let left = self.time_at(position).clamp(0.0, upper);
        self.range = CropRange::new(left, self.range.right());
        self.feedback()
    }

    /// Move the right handle, keeping it at least `MIN_CROP_SECONDS` after the left one.
    pub fn drag_right(&mut self, position: f64) -> CropFeedback {
        let lower = (self.range.left() + MIN_CROP_SECONDS).min(self.duration);
        let right = self.time_at(position).clamp(lower, self.duration);
        self.range = CropRange::new(self.range.left(), right);
        self.feedback()
    }

    pub fn commit_enabled(&self) -> bool {
        self.range.is_committable() && self.range.fits(self.duration)
    }

    pub fn tint(&self) -> CropTint {
        if self.commit_enabled() {
            CropTint::Enabled
        } else {
            CropTint::Disabled
        }
    }

    /// Playhead preview position, `left / duration`.
    pub fn preview_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            self.range.left() / self.duration
        } else {
            0.0
        }
    }

    pub fn feedback(&self) -> CropFeedback {
        CropFeedback {
            range: self.range,
            commit_enabled: self.commit_enabled(),
            tint: self.tint(),
            preview_fraction: self.preview_fraction(),
        }
    }
}

fn clamp_unit(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn starts_with_full_range() {
        let crop = CropRangeManager::new(20.0);
        assert_eq!(crop.range(), CropRange::new(0.0, 20.0));
        assert!(crop.commit_enabled());
        assert_eq!(crop.preview_fraction(), 0.0);
    }

    #[test]
    fn left_drag_updates_range_and_preview() {
        let mut crop = CropRangeManager::new(20.0);
        let feedback = crop.drag_left(0.25);
        assert_eq!(feedback.range.left(), 5.0);
        assert_eq!(feedback.range.right(), 20.0);
        assert!(feedback.commit_enabled);
        assert_eq!(feedback.tint, CropTint::Enabled);
        assert_relative_eq!(feedback.preview_fraction, 0.25);
    }

    #[test]
    fn left_handle_stops_two_seconds_before_right() {
        let mut crop = CropRangeManager::new(20.0);
        crop.drag_left(1.0);
        assert_eq!(crop.range(), CropRange::new(18.0, 20.0));
        assert!(crop.commit_enabled());
    }

    #[test]
    fn right_handle_is_live() {
        let mut crop = CropRangeManager::new(20.0);
        crop.drag_right(0.5);
        assert_eq!(crop.range().right(), 10.0);

        crop.drag_left(0.2);
        crop.drag_right(0.0);
        assert_eq!(crop.range(), CropRange::new(4.0, 6.0));

        crop.drag_right(2.0);
        assert_eq!(crop.range().right(), 20.0);
    }

    #[test]
    fn short_take_disables_commit() {
        let mut crop = CropRangeManager::new(1.5);
        assert!(!crop.commit_enabled());
        assert_eq!(crop.tint(), CropTint::Disabled);

        crop.drag_left(0.5);
        assert_eq!(crop.range().left(), 0.0);
        crop.drag_right(0.1);
        assert_eq!(crop.range().right(), 1.5);
        assert!(crop.range().fits(1.5));
    }

    #[test]
    fn pixel_positions_are_normalized() {
        assert_eq!(CropRangeManager::fraction_at_pixel(150.0, 300.0), 0.5);
        assert_eq!(CropRangeManager::fraction_at_pixel(-20.0, 300.0), 0.0);
        assert_eq!(CropRangeManager::fraction_at_pixel(400.0, 300.0), 1.0);
        assert_eq!(CropRangeManager::fraction_at_pixel(10.0, 0.0), 0.0);
    }

    #[test]
    fn every_drag_keeps_range_invariant() {
        let mut crop = CropRangeManager::new(20.0);
        let positions = [0.0, 0.1, 0.33, 0.5, 0.9, 0.95, 1.0, -1.0, 2.0, f64::NAN];
        for &a in &positions {
            for &b in &positions {
                crop.drag_left(a);
                crop.drag_right(b);
                let r = crop.range();
                assert!(r.fits(20.0), "{:?}", r);
                assert!(r.is_committable(), "{:?}", r);
            }
        }
    }
}
