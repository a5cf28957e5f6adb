use earcutr::earcut;
use foundation::geo::LngLat;
use serde::Serialize;
use streaming::records::Stop;

use crate::layer::{Layer, LayerId};
use crate::marker::{MarkerPolygon, marker};
use crate::symbology::{LightSettings, Rgba, STOP_ELEVATION, STOP_FILL_COLOR, STOP_OPACITY};

pub const STOPS_LAYER_ID: LayerId = LayerId("bus-stops");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrudedPolygon {
    pub vertices: Vec<LngLat>,
    /// Fill triangulation, three indices into `vertices` per triangle.
    pub fill_indices: Vec<usize>,
    pub fill_color: Rgba,
    pub elevation: f64,
}

/// Flat-colored extruded polygons, one per stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonLayer {
    id: LayerId,
    pub filled: bool,
    pub stroked: bool,
    pub extruded: bool,
    pub wireframe: bool,
    pub opacity: f32,
    pub light_settings: LightSettings,
    pub polygons: Vec<ExtrudedPolygon>,
}

impl PolygonLayer {
    /// Stop markers with the default radius. Stops whose marker has no area
    /// are left out.
    pub fn stops(stops: &[Stop]) -> Self {
        let polygons = stops
            .iter()
            .map(|s| marker(s.position, None))
            .filter_map(|m| extrude(&m, STOP_FILL_COLOR, STOP_ELEVATION))
            .collect();

        Self {
            id: STOPS_LAYER_ID,
            filled: true,
            stroked: false,
            extruded: true,
            wireframe: false,
            opacity: STOP_OPACITY,
            light_settings: LightSettings::new(),
            polygons,
        }
    }
}

impl Layer for PolygonLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

fn extrude(polygon: &MarkerPolygon, fill_color: Rgba, elevation: f64) -> Option<ExtrudedPolygon> {
    if polygon.is_degenerate() {
        return None;
    }
    let fill_indices = triangulate(polygon.vertices())?;
    Some(ExtrudedPolygon {
        vertices: polygon.vertices().to_vec(),
        fill_indices,
        fill_color,
        elevation,
    })
}

/// Ear-clipping triangulation of a simple ring. Coordinates are taken
/// relative to the first vertex and normalized, since markers are only a
/// few ten-thousandths of a degree wide.
fn triangulate(ring: &[LngLat]) -> Option<Vec<usize>> {
    let origin = ring.first()?;
    let mut coords = Vec::with_capacity(ring.len() * 2);
    for p in ring {
        coords.push(p.lng() - origin.lng());
        coords.push(p.lat() - origin.lat());
    }
    let extent = coords.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    if !(extent > 0.0) {
        return None;
    }
    for c in &mut coords {
        *c /= extent;
    }
    match earcut(&coords, &[], 2) {
        Ok(indices) if !indices.is_empty() => Some(indices),
        _ => None,
    }
}
