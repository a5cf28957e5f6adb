use foundation::time::PlaybackTime;
use scene::viewport::Viewport;
use serde::Serialize;
use streaming::records::{Stop, Trip};

use crate::layer::LayerSpec;
use crate::polygons::PolygonLayer;
use crate::trips::TripsLayer;

/// Default trail length in playback units.
pub const DEFAULT_TRAIL_LENGTH: f64 = 180.0;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub viewport: Viewport,
    pub time: PlaybackTime,
    pub layers: Vec<LayerSpec>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Builds the layer list for the current frame.
///
/// Nothing is drawn until both trips and stops are available: a missing
/// dataset yields a scene without layers rather than a partial one. When
/// present the order is trips first, then stop markers.
pub fn compose(
    viewport: &Viewport,
    trips: Option<&[Trip]>,
    stops: Option<&[Stop]>,
    time: PlaybackTime,
    trail_length: f64,
) -> Scene {
    let layers = match (trips, stops) {
        (Some(trips), Some(stops)) => vec![
            LayerSpec::Trips(TripsLayer::new(trips, time, trail_length)),
            LayerSpec::Polygons(PolygonLayer::stops(stops)),
        ],
        _ => Vec::new(),
    };

    Scene {
        viewport: *viewport,
        time,
        layers,
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TRAIL_LENGTH, compose};
    use crate::layer::{Layer, LayerSpec};
    use crate::symbology::{VENDOR_A_COLOR, VENDOR_B_COLOR};
    use foundation::time::PlaybackTime;
    use pretty_assertions::assert_eq;
    use scene::viewport::Viewport;
    use streaming::records::{Segment, Stop, Trip};

    fn trips() -> Vec<Trip> {
        vec![
            Trip {
                vendor: 0,
                segments: vec![Segment::new(-43.9, -19.8, 0.0), Segment::new(-43.8, -19.8, 60.0)],
            },
            Trip {
                vendor: 1,
                segments: vec![Segment::new(-43.9, -19.9, 30.0), Segment::new(-43.9, -19.7, 90.0)],
            },
        ]
    }

    fn stops() -> Vec<Stop> {
        vec![Stop::new(-19.8, -43.9)]
    }

    #[test]
    fn no_layers_without_trips() {
        let stops = stops();
        let scene = compose(
            &Viewport::DEFAULT,
            None,
            Some(stops.as_slice()),
            PlaybackTime(10.0),
            DEFAULT_TRAIL_LENGTH,
        );
        assert!(scene.is_empty());
        assert_eq!(scene.viewport, Viewport::DEFAULT);
    }

    #[test]
    fn no_layers_without_stops() {
        let trips = trips();
        let scene = compose(
            &Viewport::DEFAULT,
            Some(trips.as_slice()),
            None,
            PlaybackTime(10.0),
            DEFAULT_TRAIL_LENGTH,
        );
        assert!(scene.is_empty());
    }

    #[test]
    fn trips_then_stops() {
        let (trips, stops) = (trips(), stops());
        let scene = compose(
            &Viewport::DEFAULT,
            Some(trips.as_slice()),
            Some(stops.as_slice()),
            PlaybackTime(45.0),
            DEFAULT_TRAIL_LENGTH,
        );
        let ids: Vec<_> = scene.layers.iter().map(|l| l.id().0).collect();
        assert_eq!(ids, vec!["trips", "bus-stops"]);

        let LayerSpec::Trips(trail) = &scene.layers[0] else {
            panic!("first layer should be trips");
        };
        assert_eq!(trail.current_time, PlaybackTime(45.0));
        assert_eq!(trail.paths[0].color, VENDOR_A_COLOR);
        assert_eq!(trail.paths[1].color, VENDOR_B_COLOR);
    }

    #[test]
    fn scene_serializes_with_layer_kinds() {
        let (trips, stops) = (trips(), stops());
        let scene = compose(
            &Viewport::DEFAULT,
            Some(trips.as_slice()),
            Some(stops.as_slice()),
            PlaybackTime(45.0),
            DEFAULT_TRAIL_LENGTH,
        );
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["layers"][0]["kind"], "trips");
        assert_eq!(json["layers"][0]["trailLength"], 180.0);
        assert_eq!(json["layers"][1]["kind"], "polygons");
        assert_eq!(json["time"], 45.0);
    }
}
