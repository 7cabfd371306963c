use serde::{Deserialize, Serialize};

/// Whether the time readout counts up from zero or down to the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockDirection {
    Elapsed,
    Remaining,
}

/// One tick's worth of outward feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterSample {
    /// Linear level in `[0, 1]`.
    pub level: f32,
    /// Elapsed or remaining seconds, per `direction`.
    pub time_secs: f64,
    pub direction: ClockDirection,
    /// Blink state of the time readout near the recording limit.
    pub warning: bool,
}

impl MeterSample {
    pub fn clock_label(&self) -> String {
        format_clock(self.time_secs)
    }
}

/// Render seconds as `MM:SS`, or `HH:MM:SS` once an hour has passed.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours == 0 {
        format!("{:02}:{:02}", minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(9.99), "00:09");
        assert_eq!(format_clock(75.2), "01:15");
    }

    #[test]
    fn hours_appear_only_when_non_zero() {
        assert_eq!(format_clock(3599.0), "59:59");
        assert_eq!(format_clock(3661.0), "01:01:01");
    }

    #[test]
    fn negative_time_reads_zero() {
        assert_eq!(format_clock(-0.4), "00:00");
    }
}
