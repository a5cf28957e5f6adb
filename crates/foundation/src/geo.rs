use serde::{Deserialize, Serialize};

/// Geographic position in degrees, latitude first.
///
/// Data files and the marker helper address points as `(lat, lng)`, while
/// renderer-facing geometry is `[lng, lat]`; see [`LngLat`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn to_lng_lat(self) -> LngLat {
        LngLat([self.lng, self.lat])
    }
}

/// Renderer-order position `[lng, lat]` in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LngLat(pub [f64; 2]);

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self([lng, lat])
    }

    pub fn lng(&self) -> f64 {
        self.0[0]
    }

    pub fn lat(&self) -> f64 {
        self.0[1]
    }

    /// Linear interpolation in degree space. Adequate for the short hops
    /// between consecutive trip samples.
    pub fn lerp(self, other: LngLat, t: f64) -> LngLat {
        LngLat([
            self.0[0] + (other.0[0] - self.0[0]) * t,
            self.0[1] + (other.0[1] - self.0[1]) * t,
        ])
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng::new(self.lat(), self.lng())
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LngLat};

    #[test]
    fn conversions_swap_axis_order() {
        let p = LatLng::new(40.0, -73.0);
        let q = p.to_lng_lat();
        assert_eq!(q.0, [-73.0, 40.0]);
        assert_eq!(q.to_lat_lng(), p);
    }

    #[test]
    fn lerp_midpoint() {
        let a = LngLat::new(0.0, 0.0);
        let b = LngLat::new(2.0, -4.0);
        assert_eq!(a.lerp(b, 0.5), LngLat::new(1.0, -2.0));
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(LatLng::new(-15.77, -48.07).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, f64::NAN).is_valid());
    }
}
