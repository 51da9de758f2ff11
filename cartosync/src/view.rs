/// Code of the Web Mercator coordinate system.
pub const WEB_MERCATOR: &str = "EPSG:3857";
/// Code of the WGS84 geographic coordinate system.
pub const WGS84: &str = "EPSG:4326";
/// Coordinate systems every rendering engine knows without registration.
pub const BUILTIN_PROJECTIONS: [&str; 2] = [WEB_MERCATOR, WGS84];

// z-level 0 on the standard web tile scheme
const LEVEL_0_RESOLUTION: f64 = 156543.03392800014;

/// Position of the map: center point, zoom level and the coordinate system of the view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    center: [f64; 2],
    zoom: f64,
    projection_code: String,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 2.0,
            projection_code: WEB_MERCATOR.to_string(),
        }
    }
}

impl MapView {
    /// Creates a new view.
    pub fn new(center: [f64; 2], zoom: f64, projection_code: impl Into<String>) -> Self {
        Self {
            center,
            zoom,
            projection_code: projection_code.into(),
        }
    }

    /// Center of the view in the view coordinate system.
    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    /// Zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Code of the coordinate system of the view.
    pub fn projection_code(&self) -> &str {
        &self.projection_code
    }

    /// Size of one pixel in map units at the current zoom level.
    pub fn resolution(&self) -> f64 {
        LEVEL_0_RESOLUTION / 2f64.powf(self.zoom)
    }

    /// Returns a copy of the view with a different center.
    pub fn with_center(&self, center: [f64; 2]) -> Self {
        Self {
            center,
            ..self.clone()
        }
    }

    /// Returns a copy of the view with a different zoom level.
    pub fn with_zoom(&self, zoom: f64) -> Self {
        Self {
            zoom,
            ..self.clone()
        }
    }

    /// Returns a copy of the view in a different coordinate system.
    pub fn with_projection_code(&self, projection_code: impl Into<String>) -> Self {
        Self {
            projection_code: projection_code.into(),
            ..self.clone()
        }
    }
}
