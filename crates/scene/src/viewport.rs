use foundation::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Camera parameters for the map and the overlay drawn on top of it.
///
/// Zoom is not clamped to `max_zoom` here; the renderer does that.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Initial camera (Brasília) used until the dataset reports its center.
    pub const DEFAULT: Viewport = Viewport {
        latitude: -15.7757867,
        longitude: -48.0785375,
        zoom: 13.0,
        max_zoom: 16.0,
        pitch: 45.0,
        bearing: 0.0,
        width: 500,
        height: 500,
    };

    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Field-wise override: every field set in `patch` wins, everything else
    /// is carried over.
    pub fn merge(&self, patch: &ViewportPatch) -> Viewport {
        Viewport {
            latitude: patch.latitude.unwrap_or(self.latitude),
            longitude: patch.longitude.unwrap_or(self.longitude),
            zoom: patch.zoom.unwrap_or(self.zoom),
            max_zoom: patch.max_zoom.unwrap_or(self.max_zoom),
            pitch: patch.pitch.unwrap_or(self.pitch),
            bearing: patch.bearing.unwrap_or(self.bearing),
            width: patch.width.unwrap_or(self.width),
            height: patch.height.unwrap_or(self.height),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Partial viewport update, as delivered by resize events, user interaction
/// and the dataset's meta record.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ViewportPatch {
    pub fn resize(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn center(center: LatLng) -> Self {
        Self {
            latitude: Some(center.lat),
            longitude: Some(center.lng),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A full viewport is also a patch that sets every field.
impl From<Viewport> for ViewportPatch {
    fn from(v: Viewport) -> Self {
        Self {
            latitude: Some(v.latitude),
            longitude: Some(v.longitude),
            zoom: Some(v.zoom),
            max_zoom: Some(v.max_zoom),
            pitch: Some(v.pitch),
            bearing: Some(v.bearing),
            width: Some(v.width),
            height: Some(v.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Viewport, ViewportPatch};
    use foundation::geo::LatLng;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_overrides_only_set_fields() {
        let patch = ViewportPatch {
            zoom: Some(15.5),
            ..ViewportPatch::default()
        };
        let merged = Viewport::DEFAULT.merge(&patch);
        assert_eq!(
            merged,
            Viewport {
                zoom: 15.5,
                ..Viewport::DEFAULT
            }
        );
    }

    #[test]
    fn empty_patch_is_identity() {
        let v = Viewport::DEFAULT.merge(&ViewportPatch::resize(1280, 720));
        assert!(ViewportPatch::default().is_empty());
        assert_eq!(v.merge(&ViewportPatch::default()), v);
    }

    #[test]
    fn resize_touches_only_dimensions() {
        let v = Viewport::DEFAULT.merge(&ViewportPatch::resize(1920, 1080));
        assert_eq!((v.width, v.height), (1920, 1080));
        assert_eq!(v.center(), Viewport::DEFAULT.center());
        assert_eq!(v.pitch, 45.0);
    }

    #[test]
    fn center_preserves_camera_and_size() {
        let sized = Viewport::DEFAULT.merge(&ViewportPatch::resize(800, 600));
        let v = sized.merge(&ViewportPatch::center(LatLng::new(-19.82, -43.94)));
        assert_eq!(
            v,
            Viewport {
                latitude: -19.82,
                longitude: -43.94,
                ..sized
            }
        );
    }

    #[test]
    fn full_viewport_patch_replaces_every_field() {
        let target = Viewport {
            latitude: 1.0,
            longitude: 2.0,
            zoom: 3.0,
            max_zoom: 4.0,
            pitch: 5.0,
            bearing: 6.0,
            width: 7,
            height: 8,
        };
        assert_eq!(Viewport::DEFAULT.merge(&target.into()), target);
    }

    #[test]
    fn patch_deserializes_from_partial_json() {
        let patch: ViewportPatch =
            serde_json::from_str(r#"{"zoom": 14, "maxZoom": 18, "bearing": 30}"#).unwrap();
        assert_eq!(
            patch,
            ViewportPatch {
                zoom: Some(14.0),
                max_zoom: Some(18.0),
                bearing: Some(30.0),
                ..ViewportPatch::default()
            }
        );
    }

    #[test]
    fn viewport_serializes_camel_case() {
        let json = serde_json::to_value(Viewport::DEFAULT).unwrap();
        assert_eq!(json["maxZoom"], 16.0);
        assert_eq!(json["width"], 500);
    }
}
