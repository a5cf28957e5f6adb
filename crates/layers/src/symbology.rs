use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rgba(pub [u8; 4]);

/// Trail color for vendor 0.
pub const VENDOR_A_COLOR: Rgb = Rgb([19, 219, 92]);
/// Trail color for every other vendor.
pub const VENDOR_B_COLOR: Rgb = Rgb([23, 184, 190]);

pub const TRIP_OPACITY: f32 = 0.3;
pub const TRIP_STROKE_WIDTH: f32 = 2.0;

pub const STOP_FILL_COLOR: Rgba = Rgba([44, 152, 234, 255]);
pub const STOP_ELEVATION: f64 = 100.0;
pub const STOP_OPACITY: f32 = 0.5;

/// Trail color by vendor. Vendors other than 0 and 1 share vendor 1's color.
pub fn vendor_color(vendor: u32) -> Rgb {
    match vendor {
        0 => VENDOR_A_COLOR,
        _ => VENDOR_B_COLOR,
    }
}

/// Lighting parameters for extruded layers, evaluated by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSettings {
    /// Two lights as `[lng, lat, altitude]` triples.
    pub lights_position: [f64; 6],
    pub ambient_ratio: f32,
    pub diffuse_ratio: f32,
    pub specular_ratio: f32,
    pub lights_strength: [f32; 4],
    pub number_of_lights: u32,
}

impl LightSettings {
    pub const fn new() -> Self {
        Self {
            lights_position: [-74.05, 40.7, 8000.0, -73.5, 41.0, 5000.0],
            ambient_ratio: 0.05,
            diffuse_ratio: 0.6,
            specular_ratio: 0.8,
            lights_strength: [2.0, 0.0, 0.0, 0.0],
            number_of_lights: 2,
        }
    }
}

impl Default for LightSettings {
    fn default() -> Self {
        Self::new()
    }
}
