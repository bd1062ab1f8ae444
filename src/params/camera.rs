//! Orbit camera configuration.

/// Orbit camera circling the spectrum ring
///
/// Angles follow the arc-rotate convention: `alpha` is the azimuth around
/// the Y axis, `beta` the polar angle measured from +Y.
#[derive(Debug, Clone)]
pub struct OrbitCameraParams {
    /// Initial azimuth (radians)
    pub alpha: f32,

    /// Polar angle (radians, π/4 = overhead at 45°)
    pub beta: f32,

    /// Distance from target (world units)
    pub radius: f32,

    /// Look-at point (world units, slightly above the ring floor)
    pub target: [f32; 3],

    /// Azimuth advance per frame with no bass (radians)
    pub base_rotation: f32,

    /// Azimuth advance added per unit bass level (radians per frame)
    pub rotation_bass_gain: f32,

    /// Closest zoom (world units)
    pub min_radius: f32,

    /// Farthest zoom (world units)
    pub max_radius: f32,

    /// Orbit per dragged pixel (radians)
    pub drag_sensitivity: f32,

    /// Radius change per wheel line (world units)
    pub zoom_per_line: f32,

    /// Trackpad pixels counted as one wheel line
    pub pixels_per_line: f32,
}

impl Default for OrbitCameraParams {
    fn default() -> Self {
        Self {
            alpha: -std::f32::consts::FRAC_PI_2,
            beta: std::f32::consts::FRAC_PI_4,
            radius: 25.0, // Far enough to see the full circle
            target: [0.0, 2.0, 0.0],
            base_rotation: 0.001,
            rotation_bass_gain: 0.002,
            min_radius: 5.0,
            max_radius: 100.0,
            drag_sensitivity: 0.001, // 1000 px per radian
            zoom_per_line: 1.0,
            pixels_per_line: 40.0,
        }
    }
}
