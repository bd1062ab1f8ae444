//! Spectrum ring and glow parameters.

/// Ring of emissive spectrum bars
#[derive(Debug, Clone)]
pub struct SpectrumRingParams {
    /// Number of bars (one per frequency bin)
    pub bar_count: usize,

    /// Ring radius (world units)
    pub radius: f32,

    /// Bar footprint width and depth (world units)
    pub bar_width: f32,

    /// Height added at full-scale magnitude (world units)
    pub height_scale: f32,

    /// Height of a silent bar (world units)
    pub min_height: f32,
}

impl Default for SpectrumRingParams {
    fn default() -> Self {
        Self {
            bar_count: 32,
            radius: 8.0,
            bar_width: 0.4,
            height_scale: 8.0,
            min_height: 0.5,
        }
    }
}

/// Glow post-effect mapping
#[derive(Debug, Clone)]
pub struct GlowParams {
    /// Intensity with no bass
    pub base_intensity: f32,

    /// Intensity added per unit bass level
    /// Formula: intensity = base_intensity + bass * bass_gain
    pub bass_gain: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            base_intensity: 0.5,
            bass_gain: 2.0,
        }
    }
}
