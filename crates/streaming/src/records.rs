//! Wire records for the three datasets.
//!
//! - `trips.json`: `[{"vendor": 0, "segments": [[lng, lat, t], ...]}, ...]`
//! - `buses.json`: `[[lat, lng], ...]` or `[{"lat": .., "lng": ..}, ...]`
//! - `coord.json`: `{"lat": .., "lng": .., "start_time": ..}` (`start_time` optional)

use foundation::geo::{LatLng, LngLat};
use serde::{Deserialize, Serialize};

/// One timestamped sample along a trip, stored on the wire as `[lng, lat, t]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Segment {
    pub position: LngLat,
    pub timestamp: f64,
}

impl Segment {
    pub const fn new(lng: f64, lat: f64, timestamp: f64) -> Self {
        Self {
            position: LngLat::new(lng, lat),
            timestamp,
        }
    }
}

impl From<[f64; 3]> for Segment {
    fn from([lng, lat, timestamp]: [f64; 3]) -> Self {
        Segment::new(lng, lat, timestamp)
    }
}

impl From<Segment> for [f64; 3] {
    fn from(s: Segment) -> Self {
        [s.position.lng(), s.position.lat(), s.timestamp]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Operator id; 0 and 1 are the values the exporter writes.
    pub vendor: u32,
    pub segments: Vec<Segment>,
}

/// A bus stop location.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StopWire", into = "LatLng")]
pub struct Stop {
    pub position: LatLng,
}

impl Stop {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            position: LatLng::new(lat, lng),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StopWire {
    Object { lat: f64, lng: f64 },
    /// `(lat, lng)` pair, the order the exporter writes.
    Pair([f64; 2]),
}

impl From<StopWire> for Stop {
    fn from(w: StopWire) -> Self {
        match w {
            StopWire::Object { lat, lng } => Stop::new(lat, lng),
            StopWire::Pair([lat, lng]) => Stop::new(lat, lng),
        }
    }
}

impl From<Stop> for LatLng {
    fn from(s: Stop) -> Self {
        s.position
    }
}

/// One-time initialization record: map center and, for accumulating
/// playback, the time to start from.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
}

impl Meta {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}
