use foundation::geo::LngLat;
use foundation::time::{PlaybackTime, TimeWindow};
use serde::Serialize;
use streaming::records::{Segment, Trip};

use crate::layer::{Layer, LayerId};
use crate::symbology::{Rgb, TRIP_OPACITY, TRIP_STROKE_WIDTH, vendor_color};

pub const TRIPS_LAYER_ID: LayerId = LayerId("trips");

/// A point on a visible trail.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TrailVertex {
    pub position: LngLat,
    pub timestamp: f64,
    /// 1.0 at the head of the trail, falling linearly to 0.0 at its tail.
    pub fade: f64,
}

/// The visible part of one trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailPath {
    pub vendor: u32,
    pub color: Rgb,
    /// Empty when the trip has no samples inside the trail window.
    pub vertices: Vec<TrailVertex>,
}

/// Animated trip trails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripsLayer {
    id: LayerId,
    pub opacity: f32,
    pub stroke_width: f32,
    pub trail_length: f64,
    pub current_time: PlaybackTime,
    /// One path per trip, in dataset order.
    pub paths: Vec<TrailPath>,
}

impl TripsLayer {
    pub fn new(trips: &[Trip], current_time: PlaybackTime, trail_length: f64) -> Self {
        let window = TimeWindow::trailing(current_time, trail_length);
        let paths = trips
            .iter()
            .map(|trip| TrailPath {
                vendor: trip.vendor,
                color: vendor_color(trip.vendor),
                vertices: clip_trail(&trip.segments, window),
            })
            .collect();

        Self {
            id: TRIPS_LAYER_ID,
            opacity: TRIP_OPACITY,
            stroke_width: TRIP_STROKE_WIDTH,
            trail_length,
            current_time,
            paths,
        }
    }

    /// Paths with at least one visible vertex.
    pub fn visible_paths(&self) -> impl Iterator<Item = &TrailPath> {
        self.paths.iter().filter(|p| !p.vertices.is_empty())
    }
}

impl Layer for TripsLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

/// The part of `segments` inside `window`.
///
/// Samples inside the window are kept as they are. Where the path crosses a
/// window edge between two samples, a vertex is interpolated at the edge so
/// the trail starts and ends exactly on it. `segments` must be ordered by
/// timestamp.
pub fn clip_trail(segments: &[Segment], window: TimeWindow) -> Vec<TrailVertex> {
    let mut out: Vec<TrailVertex> = Vec::new();
    let head = window.end;
    let span = window.duration();
    let vertex = |position: LngLat, timestamp: f64| TrailVertex {
        position,
        timestamp,
        fade: if span > 0.0 {
            (1.0 - (head - timestamp) / span).clamp(0.0, 1.0)
        } else {
            1.0
        },
    };

    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            let prev = &segments[i - 1];
            for edge in [window.start, window.end] {
                if prev.timestamp < edge && seg.timestamp > edge {
                    let t = (edge - prev.timestamp) / (seg.timestamp - prev.timestamp);
                    out.push(vertex(prev.position.lerp(seg.position, t), edge));
                }
            }
        }
        if window.contains(seg.timestamp) {
            out.push(vertex(seg.position, seg.timestamp));
        }
    }

    // A zero-length window crossed between two samples yields the same
    // vertex twice.
    out.dedup_by(|a, b| a.timestamp == b.timestamp && a.position == b.position);
    out
}
