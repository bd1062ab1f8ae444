//! Rendering and window configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (radians)
    pub fov_radians: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Hemispheric light intensity
    pub light_intensity: f32,

    /// Diffuse albedo of the bars under the hemispheric light
    pub bar_albedo: f32,

    /// Glow blur radius (texels at half resolution)
    pub glow_radius: f32,

    /// Upper bound on simultaneously drawn bolts (sizes the dynamic buffer)
    pub max_drawn_bolts: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_radians: 0.8,
            near_plane: 0.1,
            far_plane: 500.0,
            light_intensity: 0.7,
            bar_albedo: 0.15,
            glow_radius: 6.0,
            max_drawn_bolts: 16,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}
