//! Lightning bolts: trigger timing, path generation and the owning collection.
//!
//! Bolts never dispose themselves. Each carries a deadline, and the scene
//! removes it through [`BoltField::remove`], the only removal path, either
//! when the deadline passes or when a new trigger clears the field. Handles
//! are generation-tagged, so a handle to a bolt that is already gone
//! resolves to nothing instead of a newer bolt in the same slot.

use glam::Vec3;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::params::LightningParams;

/// Cooldown between triggers at a bass level (milliseconds)
/// Formula: cooldown = base_cooldown_ms / (1 + bass * cooldown_bass_gain)
pub fn cooldown_ms(bass_level: f32, params: &LightningParams) -> f32 {
    params.base_cooldown_ms / (1.0 + bass_level * params.cooldown_bass_gain)
}

/// Bolts spawned per trigger
/// Formula: count = min(floor(bass * bolts_per_bass) + 1, max_bolts_per_trigger)
pub fn bolt_count(bass_level: f32, params: &LightningParams) -> usize {
    let count = (bass_level * params.bolts_per_bass).floor().max(0.0) as usize + 1;
    count.min(params.max_bolts_per_trigger.max(1))
}

/// Ribbon width of a bolt spawned at a bass level
pub fn bolt_width(bass_level: f32, params: &LightningParams) -> f32 {
    params.base_width + bass_level * params.width_bass_gain
}

/// Jagged path from `start` to `end`
///
/// Returns `segments + 1` points. Endpoints are exact; interior points sit on
/// the straight line plus a uniform offset in `[-jitter, jitter]` per axis.
pub fn generate_path<R: Rng + ?Sized>(
    start: Vec3,
    end: Vec3,
    segments: usize,
    jitter: Vec3,
    rng: &mut R,
) -> Vec<Vec3> {
    let segments = segments.max(1);
    let direction = end - start;
    let mut points = Vec::with_capacity(segments + 1);

    points.push(start);
    for i in 1..segments {
        let t = i as f32 / segments as f32;
        let offset = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        ) * jitter;
        points.push(start + direction * t + offset);
    }
    points.push(end);

    points
}

/// A live bolt
#[derive(Debug, Clone, PartialEq)]
pub struct Bolt {
    pub path: Vec<Vec3>,
    pub width: f32,
    pub color: [f32; 3],
    pub spawned_at: Instant,
    pub expires_at: Instant,
}

impl Bolt {
    /// Spawn a bolt from a random top point to a random bottom point
    pub fn spawn<R: Rng + ?Sized>(
        bass_level: f32,
        now: Instant,
        params: &LightningParams,
        rng: &mut R,
    ) -> Self {
        let half = params.endpoint_spread / 2.0;
        let mut scatter = |y: f32| {
            Vec3::new(
                rng.random_range(-half..=half),
                y,
                rng.random_range(-half..=half),
            )
        };
        let start = scatter(params.top_y);
        let end = scatter(params.bottom_y);

        let path = generate_path(
            start,
            end,
            params.segments,
            Vec3::from_array(params.jitter),
            rng,
        );

        let lifetime = if params.max_lifetime > params.min_lifetime {
            rng.random_range(params.min_lifetime..params.max_lifetime)
        } else {
            params.min_lifetime
        };

        Self {
            path,
            width: bolt_width(bass_level, params),
            color: params.color,
            spawned_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.expires_at - self.spawned_at
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Generation-tagged handle to a bolt in a [`BoltField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoltId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    bolt: Option<Bolt>,
}

/// Owning collection of live bolts
#[derive(Debug, Default)]
pub struct BoltField {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl BoltField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bolt: Bolt) -> BoltId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.bolt = Some(bolt);
            return BoltId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            bolt: Some(bolt),
        });
        BoltId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: BoltId) -> Option<&Bolt> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.bolt.as_ref())
    }

    pub fn contains(&self, id: BoltId) -> bool {
        self.get(id).is_some()
    }

    /// Remove and release a bolt; a stale or repeated handle is a no-op
    pub fn remove(&mut self, id: BoltId) -> Option<Bolt> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let bolt = slot.bolt.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(bolt)
    }

    /// Handles of all live bolts
    pub fn ids(&self) -> Vec<BoltId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.bolt.is_some())
            .map(|(index, slot)| BoltId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bolt> {
        self.slots.iter().filter_map(|slot| slot.bolt.as_ref())
    }

    /// Remove bolts whose deadline has passed; returns how many
    pub fn expire(&mut self, now: Instant) -> usize {
        let expired: Vec<BoltId> = self
            .ids()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|bolt| bolt.is_expired(now)))
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.remove(id))
            .count()
    }

    /// Remove every live bolt; returns how many
    pub fn clear(&mut self) -> usize {
        self.ids()
            .into_iter()
            .filter_map(|id| self.remove(id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

/// Bass-dependent trigger with a shrinking cooldown
#[derive(Debug, Default, Clone)]
pub struct LightningTrigger {
    last_fired: Option<Instant>,
}

impl LightningTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a burst should fire now; the first eligible frame always fires
    pub fn should_fire(&self, bass_level: f32, now: Instant, params: &LightningParams) -> bool {
        if bass_level <= params.bass_threshold {
            return false;
        }
        match self.last_fired {
            None => true,
            Some(last) => {
                let elapsed_ms = now.saturating_duration_since(last).as_secs_f32() * 1000.0;
                elapsed_ms > cooldown_ms(bass_level, params)
            }
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn_at(now: Instant, seed: u64) -> Bolt {
        let mut rng = StdRng::seed_from_u64(seed);
        Bolt::spawn(0.5, now, &LightningParams::default(), &mut rng)
    }

    #[test]
    fn test_cooldown_anchor_points() {
        let params = LightningParams::default();
        assert!((cooldown_ms(0.05, &params) - 80.0).abs() < 1e-3);
        assert!((cooldown_ms(1.0, &params) - 16.6667).abs() < 1e-3);
        assert!((cooldown_ms(0.0, &params) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_bolt_count_bands() {
        let params = LightningParams::default();
        assert_eq!(bolt_count(0.0, &params), 1);
        assert_eq!(bolt_count(0.3, &params), 1);
        assert_eq!(bolt_count(0.34, &params), 2);
        assert_eq!(bolt_count(0.5, &params), 2);
        assert_eq!(bolt_count(0.66, &params), 2);
        assert_eq!(bolt_count(0.67, &params), 3);
        assert_eq!(bolt_count(0.99, &params), 3);
        assert_eq!(bolt_count(1.0, &params), 3);
    }

    #[test]
    fn test_path_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = Vec3::new(1.0, 8.0, -2.0);
        let end = Vec3::new(-3.0, -2.0, 4.0);
        let jitter = Vec3::new(1.0, 1.0, 0.25);
        let path = generate_path(start, end, 15, jitter, &mut rng);

        assert_eq!(path.len(), 16);
        assert_eq!(path[0], start);
        assert_eq!(path[15], end);

        for (i, point) in path.iter().enumerate().take(15).skip(1) {
            let base = start + (end - start) * (i as f32 / 15.0);
            let offset = (*point - base).abs();
            assert!(offset.x <= 1.0 + 1e-5);
            assert!(offset.y <= 1.0 + 1e-5);
            assert!(offset.z <= 0.25 + 1e-5);
        }
    }

    #[test]
    fn test_spawned_bolt_geometry() {
        let now = Instant::now();
        let bolt = spawn_at(now, 11);
        let params = LightningParams::default();

        assert_eq!(bolt.path.len(), params.segments + 1);
        let start = bolt.path[0];
        let end = bolt.path[params.segments];
        assert_eq!(start.y, 8.0);
        assert_eq!(end.y, -2.0);
        for p in [start, end] {
            assert!(p.x.abs() <= 5.0 && p.z.abs() <= 5.0);
        }

        assert!((bolt.width - 0.25).abs() < 1e-6);
        assert_eq!(bolt.color, [0.8, 0.9, 1.0]);
        assert!(bolt.lifetime() >= Duration::from_millis(100));
        assert!(bolt.lifetime() < Duration::from_millis(200));
    }

    #[test]
    fn test_field_remove_is_single_shot() {
        let now = Instant::now();
        let mut field = BoltField::new();
        let id = field.insert(spawn_at(now, 1));

        assert!(field.remove(id).is_some());
        assert!(field.remove(id).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn test_stale_handle_does_not_hit_reused_slot() {
        let now = Instant::now();
        let mut field = BoltField::new();
        let old = field.insert(spawn_at(now, 1));
        field.clear();

        let new = field.insert(spawn_at(now, 2));
        assert_ne!(old, new);
        assert!(field.remove(old).is_none());
        assert!(field.contains(new));
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_expire_removes_only_due_bolts() {
        let now = Instant::now();
        let mut field = BoltField::new();
        let bolt = spawn_at(now, 3);
        let deadline = bolt.expires_at;
        let id = field.insert(bolt);

        assert_eq!(field.expire(now), 0);
        assert_eq!(field.expire(deadline - Duration::from_millis(1)), 0);
        assert!(field.contains(id));

        assert_eq!(field.expire(deadline), 1);
        assert!(!field.contains(id));
        assert_eq!(field.expire(deadline + Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_trigger_first_eligible_frame_fires() {
        let params = LightningParams::default();
        let trigger = LightningTrigger::new();
        let now = Instant::now();

        assert!(!trigger.should_fire(0.05, now, &params));
        assert!(trigger.should_fire(0.06, now, &params));
    }

    #[test]
    fn test_trigger_respects_cooldown() {
        let params = LightningParams::default();
        let mut trigger = LightningTrigger::new();
        let start = Instant::now();
        trigger.record(start);

        // bass 1.0 -> ~16.7ms cooldown
        assert!(!trigger.should_fire(1.0, start + Duration::from_millis(16), &params));
        assert!(trigger.should_fire(1.0, start + Duration::from_millis(17), &params));

        // bass 0.2 -> 50ms cooldown
        assert!(!trigger.should_fire(0.2, start + Duration::from_millis(49), &params));
        assert!(trigger.should_fire(0.2, start + Duration::from_millis(51), &params));
    }

    proptest! {
        #[test]
        fn prop_cooldown_non_increasing(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let params = LightningParams::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(cooldown_ms(lo, &params) >= cooldown_ms(hi, &params));
        }

        #[test]
        fn prop_bolt_count_in_range(bass in 0.0f32..=1.0) {
            let params = LightningParams::default();
            let count = bolt_count(bass, &params);
            prop_assert!((1..=3).contains(&count));
            prop_assert_eq!(count, ((bass * 3.0).floor() as usize + 1).min(3));
        }

        #[test]
        fn prop_path_endpoints_exact(seed in any::<u64>(), segments in 1usize..40) {
            let mut rng = StdRng::seed_from_u64(seed);
            let start = Vec3::new(0.0, 8.0, 0.0);
            let end = Vec3::new(2.0, -2.0, -1.0);
            let path = generate_path(start, end, segments, Vec3::ONE, &mut rng);
            prop_assert_eq!(path.len(), segments + 1);
            prop_assert_eq!(path[0], start);
            prop_assert_eq!(*path.last().unwrap(), end);
        }
    }
}
