use std::time::Duration;

use crate::models::meter::{ClockDirection, MeterSample};
use crate::processing::levels;
use crate::session::ticker::{TickCallback, Ticker};

/// Remaining seconds at or below which the countdown readout blinks.
pub const WARNING_WINDOW_SECS: f64 = 6.0;

/// Permission for one metering tick, stamped with the arming generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    generation: u64,
}

impl TickToken {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The periodic sampler's lifecycle.
///
/// Every `arm` and `invalidate` bumps the generation, so a token handed out
/// before a session was released can never be accepted afterwards.
pub struct MeteringLoop {
    period: Duration,
    generation: u64,
    live: bool,
    callback: Option<TickCallback>,
    ticker: Option<Ticker>,
}

impl MeteringLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            live: false,
            callback: None,
            ticker: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Drive ticks from a background thread instead of manual `tick` calls.
    /// Takes effect on the next `arm`.
    pub fn set_tick_callback(&mut self, callback: TickCallback) {
        self.callback = Some(callback);
    }

    pub fn arm(&mut self) -> TickToken {
        self.invalidate();
        self.generation += 1;
        self.live = true;
        let token = TickToken::new(self.generation);

        if let Some(callback) = &self.callback {
            match Ticker::spawn(token, self.period, callback.clone()) {
                Ok(ticker) => self.ticker = Some(ticker),
                Err(e) => log::error!("Failed to spawn metering ticker: {}", e),
            }
        }
        log::debug!("Metering armed (generation {})", self.generation);
        token
    }

    pub fn invalidate(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        if self.live {
            self.live = false;
            self.generation += 1;
            log::debug!("Metering invalidated");
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// The token for the current arming, if the loop is live.
    pub fn token(&self) -> Option<TickToken> {
        self.live.then_some(TickToken::new(self.generation))
    }

    pub fn accept(&self, token: TickToken) -> bool {
        self.live && token.generation == self.generation
    }
}

impl Drop for MeteringLoop {
    fn drop(&mut self) {
        self.invalidate();
    }
}

/// Sample for a running take. Counts down when a limit is set.
pub fn recording_sample(power_db: f32, elapsed: f64, max_duration: Option<f64>) -> MeterSample {
    let level = levels::level_from_db(power_db);
    match max_duration {
        Some(max) => {
            let remaining = (max - elapsed).max(0.0);
            MeterSample {
                level,
                time_secs: remaining,
                direction: ClockDirection::Remaining,
                warning: remaining <= WARNING_WINDOW_SECS && (remaining.floor() as u64) % 2 == 1,
            }
        }
        None => MeterSample {
            level,
            time_secs: elapsed,
            direction: ClockDirection::Elapsed,
            warning: false,
        },
    }
}

/// Sample for playback, counting up with the playhead.
pub fn playback_sample(power_db: f32, position: f64) -> MeterSample {
    MeterSample {
        level: levels::level_from_db(power_db),
        time_secs: position,
        direction: ClockDirection::Elapsed,
        warning: false,
    }
}
