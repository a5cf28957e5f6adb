use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use runtime::animation::DEFAULT_FRAME_CADENCE;
use runtime::clock::{AccumulatingClock, ClockKind, LoopingClock};
use streaming::loader::RetryPolicy;
use streaming::source::DataPaths;

use layers::compose::DEFAULT_TRAIL_LENGTH;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Headless trip trail playback: loads trips, stops and meta, then emits one scene per frame as JSON lines"
)]
pub struct Args {
    /// Asset directory or base URL serving the datasets [env: TRAILS_DATA, default: assets]
    #[arg(long)]
    pub data: Option<String>,

    /// Trips dataset path under the data root
    #[arg(long, default_value = "trips.json")]
    pub trips: String,

    /// Stops dataset path under the data root
    #[arg(long, default_value = "buses.json")]
    pub stops: String,

    /// Meta dataset path under the data root
    #[arg(long, default_value = "coord.json")]
    pub meta: String,

    /// Playback clock: "looping" or "accumulating" [env: TRAILS_CLOCK]
    #[arg(long)]
    pub clock: Option<String>,

    /// Playback units per loop (looping clock)
    #[arg(long)]
    pub loop_length: Option<f64>,

    /// Wall-clock milliseconds per loop (looping clock)
    #[arg(long)]
    pub loop_period_ms: Option<u64>,

    /// Playback units added per frame (accumulating clock)
    #[arg(long)]
    pub sec_per_frame: Option<f64>,

    /// Visible trail length in playback units [env: TRAILS_TRAIL_LENGTH]
    #[arg(long)]
    pub trail_length: Option<f64>,

    /// Milliseconds between frames [env: TRAILS_FRAME_MS]
    #[arg(long)]
    pub frame_ms: Option<u64>,

    /// Stop after this many frames; runs until Ctrl-C when unset [env: TRAILS_FRAMES]
    #[arg(long)]
    pub frames: Option<u64>,

    /// Emit every Nth frame (data arrivals are always emitted)
    #[arg(long, default_value_t = 1)]
    pub emit_every: u64,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Attempts per dataset, including the first
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Write scenes to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Resolved viewer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub data: String,
    pub paths: DataPaths,
    pub clock: ClockKind,
    pub trail_length: f64,
    pub frame_cadence: Duration,
    pub max_frames: Option<u64>,
    pub emit_every: u64,
    pub width: u32,
    pub height: u32,
    pub retry: RetryPolicy,
    pub out: Option<PathBuf>,
}

impl ViewerConfig {
    /// Command line first, then the environment, then defaults.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data = args
            .data
            .or_else(|| env("TRAILS_DATA"))
            .unwrap_or_else(|| "assets".to_string());

        let clock_name = args
            .clock
            .or_else(|| env("TRAILS_CLOCK"))
            .unwrap_or_else(|| "looping".to_string());
        let clock = match clock_name.parse::<ClockKind>() {
            Ok(ClockKind::Looping(default)) => ClockKind::Looping(LoopingClock::new(
                args.loop_length.unwrap_or(default.loop_length()),
                args.loop_period_ms.unwrap_or(default.loop_period_ms()),
            )),
            Ok(ClockKind::Accumulating(default)) => ClockKind::Accumulating(
                AccumulatingClock::new(args.sec_per_frame.unwrap_or(default.sec_per_frame())),
            ),
            Err(err) => {
                return Err(ConfigError {
                    key: "clock",
                    message: err.to_string(),
                });
            }
        };
        match clock {
            ClockKind::Looping(c) if !(c.loop_length().is_finite() && c.loop_length() > 0.0) => {
                return Err(ConfigError {
                    key: "loop_length",
                    message: format!("{} must be a positive number", c.loop_length()),
                });
            }
            ClockKind::Accumulating(c) if !c.sec_per_frame().is_finite() => {
                return Err(ConfigError {
                    key: "sec_per_frame",
                    message: format!("{} must be a finite number", c.sec_per_frame()),
                });
            }
            _ => {}
        }

        let trail_length = match args.trail_length {
            Some(v) => v,
            None => env_var_f64(&env, "TRAILS_TRAIL_LENGTH", DEFAULT_TRAIL_LENGTH)?,
        };
        if !(trail_length >= 0.0) {
            return Err(ConfigError {
                key: "trail_length",
                message: format!("{trail_length} must be a non-negative number"),
            });
        }

        let frame_ms = match args.frame_ms {
            Some(v) => v,
            None => env_var_u64(
                &env,
                "TRAILS_FRAME_MS",
                DEFAULT_FRAME_CADENCE.as_millis() as u64,
            )?,
        };
        let max_frames = match args.frames {
            Some(v) => Some(v),
            None => env_var_opt_u64(&env, "TRAILS_FRAMES")?,
        };

        Ok(Self {
            data,
            paths: DataPaths {
                trips: args.trips,
                stops: args.stops,
                meta: args.meta,
            },
            clock,
            trail_length,
            frame_cadence: Duration::from_millis(frame_ms.max(1)),
            max_frames,
            emit_every: args.emit_every.max(1),
            width: args.width,
            height: args.height,
            retry: RetryPolicy {
                max_attempts: args.attempts.max(1),
                ..RetryPolicy::default()
            },
            out: args.out,
        })
    }
}

fn env_var_f64(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: f64,
) -> Result<f64, ConfigError> {
    match env(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError {
            key,
            message: format!("{raw:?} is not a number"),
        }),
        None => Ok(default),
    }
}

fn env_var_u64(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    Ok(env_var_opt_u64(env, key)?.unwrap_or(default))
}

fn env_var_opt_u64(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match env(key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError {
            key,
            message: format!("{raw:?} is not an unsigned integer"),
        }),
        None => Ok(None),
    }
}
