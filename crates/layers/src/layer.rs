use serde::Serialize;

use crate::polygons::PolygonLayer;
use crate::trips::TripsLayer;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LayerId(pub &'static str);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// One entry of the layer list handed to the renderer.
///
/// Per-item style is resolved here (colors, elevations, fades), so the
/// renderer receives plain data instead of accessor callbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerSpec {
    Trips(TripsLayer),
    Polygons(PolygonLayer),
}

impl Layer for LayerSpec {
    fn id(&self) -> LayerId {
        match self {
            LayerSpec::Trips(l) => l.id(),
            LayerSpec::Polygons(l) => l.id(),
        }
    }
}
