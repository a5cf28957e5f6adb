use foundation::geo::{LatLng, LngLat};
use serde::Serialize;

/// Half-width of a stop marker in degrees when none is given.
pub const DEFAULT_MARKER_RADIUS: f64 = 0.0001;

/// Axis-aligned square around a stop, as `[lng, lat]` vertices.
///
/// Vertex order: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MarkerPolygon(pub [LngLat; 4]);

impl MarkerPolygon {
    pub fn vertices(&self) -> &[LngLat; 4] {
        &self.0
    }

    /// Unsigned area in square degrees (shoelace).
    pub fn area(&self) -> f64 {
        let v = &self.0;
        let mut twice = 0.0;
        for i in 0..v.len() {
            let a = v[i];
            let b = v[(i + 1) % v.len()];
            twice += a.lng() * b.lat() - b.lng() * a.lat();
        }
        (twice / 2.0).abs()
    }

    /// True when the square has no area. Such markers are not drawn.
    pub fn is_degenerate(&self) -> bool {
        !(self.area() > 0.0)
    }
}

/// Square marker of half-width `radius` centered on `coordinate`.
///
/// `None` selects [`DEFAULT_MARKER_RADIUS`]. An explicit radius is never
/// replaced by the default: zero, negative or non-finite values collapse the
/// square onto the center, which the polygon layer skips.
pub fn marker(coordinate: LatLng, radius: Option<f64>) -> MarkerPolygon {
    let r = match radius {
        None => DEFAULT_MARKER_RADIUS,
        Some(r) if r > 0.0 && r.is_finite() => r,
        Some(_) => 0.0,
    };
    let LatLng { lat, lng } = coordinate;
    MarkerPolygon([
        LngLat::new(lng - r, lat + r),
        LngLat::new(lng + r, lat + r),
        LngLat::new(lng + r, lat - r),
        LngLat::new(lng - r, lat - r),
    ])
}
