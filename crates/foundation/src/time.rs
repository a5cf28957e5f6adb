use serde::{Deserialize, Serialize};

/// Playback time in dataset units (the timestamps stored in trip segments).
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackTime(pub f64);

impl PlaybackTime {
    pub const ZERO: PlaybackTime = PlaybackTime(0.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Closed playback interval `[start, end]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// The trail window ending at `now` and reaching `trail_length` units back.
    pub fn trailing(now: PlaybackTime, trail_length: f64) -> Self {
        Self {
            start: now.0 - trail_length.max(0.0),
            end: now.0,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}
