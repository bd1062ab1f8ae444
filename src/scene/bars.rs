//! Ring of spectrum bars: fixed slots and hues, heights driven per frame.

use glam::{Mat4, Quat, Vec3};
use std::f32::consts::TAU;

use crate::audio::FrequencySnapshot;
use crate::params::SpectrumRingParams;

/// One bar of the ring
#[derive(Debug, Clone, PartialEq)]
pub struct BarState {
    /// Angular slot on the ring (radians)
    pub angle: f32,
    /// Center of the box; y tracks half the height so the base stays on the floor
    pub position: Vec3,
    /// Vertical scale of the unit-height box
    pub height: f32,
    /// Emissive color, assigned once
    pub color: [f32; 3],
}

impl BarState {
    /// Yaw that turns the bar to face the ring center
    pub fn rotation_y(&self) -> f32 {
        -self.angle
    }

    /// Model matrix for a unit box scaled to `width x height x width`
    pub fn model_matrix(&self, width: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(width, self.height, width),
            Quat::from_rotation_y(self.rotation_y()),
            self.position,
        )
    }
}

/// Rainbow hue for bar `index` of `count`: phase-shifted sines, period 1
pub fn bar_color(index: usize, count: usize) -> [f32; 3] {
    let hue = index as f32 / count as f32;
    [
        (hue * TAU).sin() * 0.5 + 0.5,
        ((hue + 0.33) * TAU).sin() * 0.5 + 0.5,
        ((hue + 0.66) * TAU).sin() * 0.5 + 0.5,
    ]
}

/// Bar height for a byte magnitude
/// Formula: height = magnitude / 255 * height_scale + min_height
pub fn bar_height(magnitude: u8, params: &SpectrumRingParams) -> f32 {
    (magnitude as f32 / 255.0) * params.height_scale + params.min_height
}

/// Fixed-size ring of bars
#[derive(Debug, Clone)]
pub struct SpectrumRing {
    bars: Vec<BarState>,
    params: SpectrumRingParams,
}

impl SpectrumRing {
    pub fn new(params: SpectrumRingParams) -> Self {
        let count = params.bar_count;
        let bars = (0..count)
            .map(|i| {
                let angle = (i as f32 / count as f32) * TAU;
                BarState {
                    angle,
                    position: Vec3::new(
                        angle.cos() * params.radius,
                        0.5,
                        angle.sin() * params.radius,
                    ),
                    height: 1.0,
                    color: bar_color(i, count),
                }
            })
            .collect();

        Self { bars, params }
    }

    pub fn bars(&self) -> &[BarState] {
        &self.bars
    }

    pub fn params(&self) -> &SpectrumRingParams {
        &self.params
    }

    /// Resize bars from a snapshot; bars beyond the snapshot keep their height
    pub fn apply(&mut self, snapshot: &FrequencySnapshot) {
        for (bar, &magnitude) in self.bars.iter_mut().zip(snapshot.bins()) {
            let height = bar_height(magnitude, &self.params);
            bar.height = height;
            bar.position.y = height / 2.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ring_layout() {
        let params = SpectrumRingParams::default();
        let ring = SpectrumRing::new(params.clone());
        assert_eq!(ring.bars().len(), 32);

        for (i, bar) in ring.bars().iter().enumerate() {
            let expected_angle = i as f32 * TAU / 32.0;
            assert!((bar.angle - expected_angle).abs() < 1e-6);

            let radial = Vec3::new(bar.position.x, 0.0, bar.position.z).length();
            assert!((radial - params.radius).abs() < 1e-4);
        }
    }

    #[test]
    fn test_colors_are_distinct_and_in_range() {
        let ring = SpectrumRing::new(SpectrumRingParams::default());
        for (i, a) in ring.bars().iter().enumerate() {
            assert!(a.color.iter().all(|c| (0.0..=1.0).contains(c)));
            for b in &ring.bars()[i + 1..] {
                assert_ne!(a.color, b.color);
            }
        }
    }

    #[test]
    fn test_first_bar_color() {
        let [r, g, b] = bar_color(0, 32);
        assert!((r - 0.5).abs() < 1e-6);
        assert!(g > 0.9);
        assert!(b < 0.5);
    }

    #[test]
    fn test_colors_do_not_follow_audio() {
        let mut ring = SpectrumRing::new(SpectrumRingParams::default());
        let before: Vec<_> = ring.bars().iter().map(|b| b.color).collect();
        ring.apply(&FrequencySnapshot::new(vec![255; 32]));
        let after: Vec<_> = ring.bars().iter().map(|b| b.color).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_short_snapshot_updates_prefix_only() {
        let mut ring = SpectrumRing::new(SpectrumRingParams::default());
        ring.apply(&FrequencySnapshot::new(vec![255; 4]));

        assert_eq!(ring.bars()[3].height, 8.5);
        assert_eq!(ring.bars()[4].height, 1.0);
        assert_eq!(ring.bars()[4].position.y, 0.5);
    }

    #[test]
    fn test_model_matrix_keeps_base_on_floor() {
        let mut ring = SpectrumRing::new(SpectrumRingParams::default());
        ring.apply(&FrequencySnapshot::new(vec![128; 32]));

        let bar = &ring.bars()[5];
        let bottom = bar.model_matrix(0.4).transform_point3(Vec3::new(0.0, -0.5, 0.0));
        assert!(bottom.y.abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_bar_height_bounds(bins in proptest::collection::vec(any::<u8>(), 32)) {
            let mut ring = SpectrumRing::new(SpectrumRingParams::default());
            ring.apply(&FrequencySnapshot::new(bins.clone()));

            for (bar, &magnitude) in ring.bars().iter().zip(&bins) {
                prop_assert!(bar.height >= 0.5 && bar.height <= 8.5);
                prop_assert_eq!(bar.position.y, bar.height / 2.0);
                prop_assert_eq!(bar.height, magnitude as f32 / 255.0 * 8.0 + 0.5);
            }
        }
    }
}
