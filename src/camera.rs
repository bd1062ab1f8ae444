//! Orbit camera circling the spectrum ring, sped up by bass.
//!
//! The user can drag to orbit and scroll to zoom; the bass-driven azimuth
//! drift keeps running on top of whatever the user set.

use glam::{Mat4, Vec3};
use std::f32::consts::PI;

use crate::params::{OrbitCameraParams, RenderConfig};

/// Keeps the eye off the poles, where the look-at up vector degenerates
const BETA_MARGIN: f32 = 0.01;

/// Arc-rotate camera: user-set distance and elevation, advancing azimuth
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    alpha: f32,
    beta: f32,
    radius: f32,
    target: Vec3,
    base_rotation: f32,
    rotation_bass_gain: f32,
    min_radius: f32,
    max_radius: f32,
    drag_sensitivity: f32,
    zoom_per_line: f32,
    pixels_per_line: f32,
}

impl OrbitCamera {
    pub fn new(params: &OrbitCameraParams) -> Self {
        let min_radius = params.min_radius.min(params.max_radius);
        let max_radius = params.max_radius.max(params.min_radius);
        Self {
            alpha: params.alpha,
            beta: params.beta.clamp(BETA_MARGIN, PI - BETA_MARGIN),
            radius: params.radius.clamp(min_radius, max_radius),
            target: Vec3::from_array(params.target),
            base_rotation: params.base_rotation,
            rotation_bass_gain: params.rotation_bass_gain,
            min_radius,
            max_radius,
            drag_sensitivity: params.drag_sensitivity,
            zoom_per_line: params.zoom_per_line,
            pixels_per_line: params.pixels_per_line.max(1.0),
        }
    }

    /// Current azimuth (radians)
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current polar angle (radians from +Y)
    pub fn beta(&self) -> f32 {
        self.beta
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Orbit by the given angles; beta stays strictly inside (0, π)
    pub fn rotate(&mut self, delta_alpha: f32, delta_beta: f32) {
        self.alpha += delta_alpha;
        self.beta = (self.beta + delta_beta).clamp(BETA_MARGIN, PI - BETA_MARGIN);
    }

    /// Move toward (negative) or away from (positive) the target
    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius + delta).clamp(self.min_radius, self.max_radius);
    }

    /// Pointer drag in pixels: right turns the view left, down tilts it up
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.rotate(-dx * self.drag_sensitivity, -dy * self.drag_sensitivity);
    }

    /// Wheel scroll in lines; scrolling up zooms in
    pub fn scroll_lines(&mut self, lines: f32) {
        self.zoom(-lines * self.zoom_per_line);
    }

    /// Trackpad scroll in pixels
    pub fn scroll_pixels(&mut self, pixels: f32) {
        self.scroll_lines(pixels / self.pixels_per_line);
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Azimuth step for one frame at the given bass level
    pub fn rotation_step(&self, bass_level: f32) -> f32 {
        self.base_rotation + bass_level * self.rotation_bass_gain
    }

    /// Advance one frame; returns the step taken
    pub fn advance(&mut self, bass_level: f32) -> f32 {
        let step = self.rotation_step(bass_level);
        self.alpha += step;
        step
    }

    /// Eye position on the sphere around the target
    pub fn eye(&self) -> Vec3 {
        let (sin_a, cos_a) = self.alpha.sin_cos();
        let (sin_b, cos_b) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(cos_a * sin_b, cos_b, sin_a * sin_b)
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn create_view_proj_matrix(&self, render_config: &RenderConfig) -> (Mat4, Vec3) {
        let eye = self.eye();
        let view = Mat4::look_at_rh(eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_radians,
            render_config.aspect_ratio(),
            render_config.near_plane,
            render_config.far_plane,
        );

        (proj * view, eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_on_orbit_sphere() {
        let params = OrbitCameraParams::default();
        let mut camera = OrbitCamera::new(&params);

        for _ in 0..50 {
            camera.advance(1.0);
            let distance = camera.eye().distance(camera.target());
            assert!((distance - params.radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_eye_above_ring() {
        let camera = OrbitCamera::new(&OrbitCameraParams::default());
        let eye = camera.eye();

        // 45° elevation at radius 25 looking at y = 2
        assert!(eye.y > 8.0);
        assert!(Vec3::new(eye.x, 0.0, eye.z).length() > 8.0);
    }

    #[test]
    fn test_rotation_speeds_up_with_bass() {
        let mut camera = OrbitCamera::new(&OrbitCameraParams::default());
        let start = camera.alpha();

        assert!((camera.advance(0.0) - 0.001).abs() < 1e-7);
        assert!((camera.advance(1.0) - 0.003).abs() < 1e-7);
        assert!((camera.alpha() - start - 0.004).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_clamps_beta_off_the_poles() {
        let mut camera = OrbitCamera::new(&OrbitCameraParams::default());

        camera.rotate(0.0, -10.0);
        assert!(camera.beta() > 0.0);
        assert!(camera.eye().is_finite());

        camera.rotate(0.0, 10.0);
        assert!(camera.beta() < PI);
        assert!(camera.eye().is_finite());
    }

    #[test]
    fn test_zoom_clamps_radius() {
        let params = OrbitCameraParams::default();
        let mut camera = OrbitCamera::new(&params);

        camera.zoom(-1000.0);
        assert_eq!(camera.radius(), params.min_radius);
        assert!((camera.eye().distance(camera.target()) - params.min_radius).abs() < 1e-3);

        camera.zoom(1000.0);
        assert_eq!(camera.radius(), params.max_radius);
    }

    #[test]
    fn test_scroll_up_zooms_in() {
        let mut camera = OrbitCamera::new(&OrbitCameraParams::default());
        camera.scroll_lines(2.0);
        assert!((camera.radius() - 23.0).abs() < 1e-5);

        camera.scroll_pixels(-80.0);
        assert!((camera.radius() - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_bass_drift_adds_to_user_drag() {
        let mut camera = OrbitCamera::new(&OrbitCameraParams::default());
        let start = camera.alpha();

        // 500 px to the left is +0.5 rad at 1000 px per radian
        camera.drag(-500.0, 0.0);
        assert!((camera.alpha() - start - 0.5).abs() < 1e-6);

        camera.advance(0.5);
        assert!((camera.alpha() - start - 0.502).abs() < 1e-6);

        // Drag only moved the azimuth
        assert!((camera.beta() - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = OrbitCamera::new(&OrbitCameraParams::default());
        let (view_proj, eye) = camera.create_view_proj_matrix(&RenderConfig::default());

        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(eye.is_finite());

        // Target projects to the center of the screen
        let clip = view_proj * camera.target().extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
    }
}
