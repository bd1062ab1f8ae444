//! Audio-reactive scene state: spectrum ring, lightning, glow and camera.
//!
//! Pure CPU state. The renderer reads it after each [`ReactiveScene::update`].

mod bars;
mod lightning;

pub use bars::{bar_color, bar_height, BarState, SpectrumRing};
pub use lightning::{
    bolt_count, bolt_width, cooldown_ms, generate_path, Bolt, BoltField, BoltId,
    LightningTrigger,
};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

use crate::audio::AudioFrame;
use crate::camera::OrbitCamera;
use crate::params::{GlowParams, LightningParams, OrbitCameraParams, SpectrumRingParams};

/// Glow intensity for a bass level
/// Formula: intensity = base_intensity + bass * bass_gain (unbounded above)
pub fn glow_intensity(bass_level: f32, params: &GlowParams) -> f32 {
    params.base_intensity + bass_level * params.bass_gain
}

/// Everything the scene is built from
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub ring: SpectrumRingParams,
    pub glow: GlowParams,
    pub lightning: LightningParams,
    pub camera: OrbitCameraParams,
    /// Fixed seed for reproducible lightning (random when None)
    pub seed: Option<u64>,
}

/// What one frame changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub glow_intensity: f32,
    /// Bolts created by a trigger this frame
    pub spawned: usize,
    /// Bolts removed because their lifetime ran out
    pub expired: usize,
    /// Bolts removed early by this frame's trigger
    pub cleared: usize,
    pub live_bolts: usize,
    pub camera_step: f32,
}

/// Scene driven once per display refresh by the latest audio frame
pub struct ReactiveScene {
    ring: SpectrumRing,
    glow: GlowParams,
    lightning: LightningParams,
    camera: OrbitCamera,
    bolts: BoltField,
    trigger: LightningTrigger,
    rng: StdRng,
    glow_intensity: f32,
    frames: u64,
}

impl ReactiveScene {
    pub fn new(config: SceneConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!(
            "Scene: {} bars on radius {}",
            config.ring.bar_count, config.ring.radius
        );

        Self {
            ring: SpectrumRing::new(config.ring),
            glow_intensity: config.glow.base_intensity,
            glow: config.glow,
            lightning: config.lightning,
            camera: OrbitCamera::new(&config.camera),
            bolts: BoltField::new(),
            trigger: LightningTrigger::new(),
            rng,
            frames: 0,
        }
    }

    /// Map one audio frame onto the scene
    pub fn update(&mut self, frame: &AudioFrame, now: Instant) -> FrameReport {
        let bass = frame.bass_level;

        if self.frames % 60 == 0 {
            debug!(
                "Render loop - bins: {} first: {} bass: {:.3}",
                frame.snapshot.len(),
                frame.snapshot.get(0).unwrap_or(0),
                bass
            );
        }
        self.frames += 1;

        let expired = self.bolts.expire(now);

        self.ring.apply(&frame.snapshot);

        self.glow_intensity = glow_intensity(bass, &self.glow);

        let mut cleared = 0;
        let mut spawned = 0;
        if self.trigger.should_fire(bass, now, &self.lightning) {
            self.trigger.record(now);
            cleared = self.bolts.clear();

            for _ in 0..bolt_count(bass, &self.lightning) {
                let bolt = Bolt::spawn(bass, now, &self.lightning, &mut self.rng);
                self.bolts.insert(bolt);
                spawned += 1;
            }
        }

        let camera_step = self.camera.advance(bass);

        FrameReport {
            glow_intensity: self.glow_intensity,
            spawned,
            expired,
            cleared,
            live_bolts: self.bolts.len(),
            camera_step,
        }
    }

    pub fn bars(&self) -> &[BarState] {
        self.ring.bars()
    }

    pub fn ring(&self) -> &SpectrumRing {
        &self.ring
    }

    pub fn bolts(&self) -> &BoltField {
        &self.bolts
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// User orbit and zoom input goes through here
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn glow_intensity(&self) -> f32 {
        self.glow_intensity
    }

    /// Dispose every live bolt; safe with none live and safe to repeat
    pub fn teardown(&mut self) -> usize {
        let disposed = self.bolts.clear();
        if disposed > 0 {
            debug!("Disposed {} bolt(s) on teardown", disposed);
        }
        disposed
    }
}
