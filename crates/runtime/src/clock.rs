use std::fmt;
use std::str::FromStr;

use foundation::time::PlaybackTime;

/// Default number of playback units covered by one loop.
pub const DEFAULT_LOOP_LENGTH: f64 = 1800.0;
/// Default wall-clock duration of one loop.
pub const DEFAULT_LOOP_PERIOD_MS: u64 = 60_000;
/// Default accumulator step. At 60 frames per second this plays 30 units per
/// second, the same speed as the default loop.
pub const DEFAULT_SEC_PER_FRAME: f64 = 0.5;

/// Maps frame ticks to playback time.
pub trait PlaybackClock {
    /// Playback time for the frame observed at `now_ms`, given the time of the
    /// previous frame.
    fn tick(&self, previous: PlaybackTime, now_ms: u64) -> PlaybackTime;

    /// Playback time to restart from once the dataset reports its start time.
    ///
    /// `None` leaves the current time untouched.
    fn origin(&self, start_time: Option<f64>) -> Option<PlaybackTime>;
}

/// Wall-clock driven loop: every `loop_period_ms` the playback time sweeps
/// `[0, loop_length)` once.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoopingClock {
    loop_length: f64,
    loop_period_ms: u64,
}

impl LoopingClock {
    pub fn new(loop_length: f64, loop_period_ms: u64) -> Self {
        Self {
            loop_length,
            loop_period_ms: loop_period_ms.max(1),
        }
    }

    pub fn loop_length(&self) -> f64 {
        self.loop_length
    }

    pub fn loop_period_ms(&self) -> u64 {
        self.loop_period_ms
    }
}

impl Default for LoopingClock {
    fn default() -> Self {
        Self::new(DEFAULT_LOOP_LENGTH, DEFAULT_LOOP_PERIOD_MS)
    }
}

impl PlaybackClock for LoopingClock {
    fn tick(&self, _previous: PlaybackTime, now_ms: u64) -> PlaybackTime {
        let phase = (now_ms % self.loop_period_ms) as f64 / self.loop_period_ms as f64;
        PlaybackTime(phase * self.loop_length)
    }

    fn origin(&self, _start_time: Option<f64>) -> Option<PlaybackTime> {
        None
    }
}

/// Frame-counting clock: adds a fixed step per frame, starting from the
/// dataset's start time.
///
/// Never wraps. Playback speed follows the frame rate, so an irregular
/// cadence makes it drift relative to wall-clock time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AccumulatingClock {
    sec_per_frame: f64,
}

impl AccumulatingClock {
    pub fn new(sec_per_frame: f64) -> Self {
        Self { sec_per_frame }
    }

    pub fn sec_per_frame(&self) -> f64 {
        self.sec_per_frame
    }
}

impl Default for AccumulatingClock {
    fn default() -> Self {
        Self::new(DEFAULT_SEC_PER_FRAME)
    }
}

impl PlaybackClock for AccumulatingClock {
    fn tick(&self, previous: PlaybackTime, _now_ms: u64) -> PlaybackTime {
        PlaybackTime(previous.0 + self.sec_per_frame)
    }

    fn origin(&self, start_time: Option<f64>) -> Option<PlaybackTime> {
        start_time.map(PlaybackTime)
    }
}

/// The clock variant selected for a deployment. Only one is ever active.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClockKind {
    Looping(LoopingClock),
    Accumulating(AccumulatingClock),
}

impl Default for ClockKind {
    fn default() -> Self {
        ClockKind::Looping(LoopingClock::default())
    }
}

impl PlaybackClock for ClockKind {
    fn tick(&self, previous: PlaybackTime, now_ms: u64) -> PlaybackTime {
        match self {
            ClockKind::Looping(c) => c.tick(previous, now_ms),
            ClockKind::Accumulating(c) => c.tick(previous, now_ms),
        }
    }

    fn origin(&self, start_time: Option<f64>) -> Option<PlaybackTime> {
        match self {
            ClockKind::Looping(c) => c.origin(start_time),
            ClockKind::Accumulating(c) => c.origin(start_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClockKind(pub String);

impl fmt::Display for UnknownClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown clock kind {:?} (expected \"looping\" or \"accumulating\")",
            self.0
        )
    }
}

impl std::error::Error for UnknownClockKind {}

/// Parses the variant name; parameters take their defaults.
impl FromStr for ClockKind {
    type Err = UnknownClockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "looping" | "loop" => Ok(ClockKind::Looping(LoopingClock::default())),
            "accumulating" | "accumulate" => {
                Ok(ClockKind::Accumulating(AccumulatingClock::default()))
            }
            other => Err(UnknownClockKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AccumulatingClock, ClockKind, DEFAULT_LOOP_LENGTH, DEFAULT_LOOP_PERIOD_MS, LoopingClock,
        PlaybackClock,
    };
    use foundation::time::PlaybackTime;

    #[test]
    fn looping_output_stays_in_range() {
        let clock = LoopingClock::default();
        for now in [0u64, 1, 59_999, 60_000, 1_700_000_123_456, u64::MAX] {
            let t = clock.tick(PlaybackTime::ZERO, now).0;
            assert!(
                (0.0..DEFAULT_LOOP_LENGTH).contains(&t),
                "tick({now}) = {t} out of range"
            );
        }
    }

    #[test]
    fn looping_is_periodic() {
        let clock = LoopingClock::default();
        for now in [0u64, 17, 30_000, 1_700_000_000_321] {
            let a = clock.tick(PlaybackTime::ZERO, now);
            let b = clock.tick(PlaybackTime(999.0), now + DEFAULT_LOOP_PERIOD_MS);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn looping_maps_half_period_to_half_length() {
        let clock = LoopingClock::default();
        assert_eq!(clock.tick(PlaybackTime::ZERO, 30_000), PlaybackTime(900.0));
    }

    #[test]
    fn looping_ignores_start_time() {
        assert_eq!(LoopingClock::default().origin(Some(42.0)), None);
    }

    #[test]
    fn zero_period_is_clamped() {
        let clock = LoopingClock::new(10.0, 0);
        assert_eq!(clock.loop_period_ms(), 1);
        assert_eq!(clock.tick(PlaybackTime::ZERO, 12345), PlaybackTime(0.0));
    }

    #[test]
    fn accumulating_adds_one_step_per_tick() {
        let clock = AccumulatingClock::new(0.25);
        let start = clock.origin(Some(3600.0)).unwrap();
        let mut t = start;
        for i in 0..400u64 {
            t = clock.tick(t, i * 16);
        }
        assert_eq!(t, PlaybackTime(3600.0 + 400.0 * 0.25));
    }

    #[test]
    fn accumulating_origin_requires_start_time() {
        assert_eq!(AccumulatingClock::default().origin(None), None);
    }

    #[test]
    fn parses_clock_kind() {
        assert!(matches!("looping".parse(), Ok(ClockKind::Looping(_))));
        assert!(matches!(
            " Accumulating ".parse(),
            Ok(ClockKind::Accumulating(_))
        ));
        let err = "sundial".parse::<ClockKind>().unwrap_err();
        assert!(err.to_string().contains("sundial"));
    }
}
