//! Lightning bolt trigger and geometry parameters.

use std::time::Duration;

/// Bass-driven lightning parameters
#[derive(Debug, Clone)]
pub struct LightningParams {
    /// Bass level that must be exceeded before bolts can spawn
    pub bass_threshold: f32,

    /// Cooldown between triggers at zero bass (milliseconds)
    /// Formula: cooldown = base_cooldown_ms / (1 + bass * cooldown_bass_gain)
    pub base_cooldown_ms: f32,

    /// How strongly bass shortens the cooldown (dimensionless)
    pub cooldown_bass_gain: f32,

    /// Bolts per trigger scale (count = floor(bass * this) + 1)
    pub bolts_per_bass: f32,

    /// Cap on bolts per trigger (full-scale bass would otherwise add one more)
    pub max_bolts_per_trigger: usize,

    /// Segments per bolt (points = segments + 1)
    pub segments: usize,

    /// Height of the bolt start points (world units)
    pub top_y: f32,

    /// Height of the bolt end points (world units)
    pub bottom_y: f32,

    /// Side length of the square the endpoints are scattered over (world units)
    pub endpoint_spread: f32,

    /// Half-extent of the random offset applied to interior points (x, y, z)
    pub jitter: [f32; 3],

    /// Ribbon width with no bass (world units)
    pub base_width: f32,

    /// Width added per unit bass level (world units)
    pub width_bass_gain: f32,

    /// Bolt color (linear RGB)
    pub color: [f32; 3],

    /// Bolt lifetime range, sampled uniformly per bolt
    pub min_lifetime: Duration,
    pub max_lifetime: Duration,
}

impl Default for LightningParams {
    fn default() -> Self {
        Self {
            bass_threshold: 0.05,
            base_cooldown_ms: 100.0,
            cooldown_bass_gain: 5.0,
            bolts_per_bass: 3.0,
            max_bolts_per_trigger: 3,
            segments: 15,
            top_y: 8.0,
            bottom_y: -2.0,
            endpoint_spread: 10.0,
            jitter: [1.0, 1.0, 0.25],
            base_width: 0.1,
            width_bass_gain: 0.3,
            color: [0.8, 0.9, 1.0], // Near-white blue
            min_lifetime: Duration::from_millis(100),
            max_lifetime: Duration::from_millis(200),
        }
    }
}
