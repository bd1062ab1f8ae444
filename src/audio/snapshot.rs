//! Spectrum snapshots and the latest-value slot shared with the render loop.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Byte magnitudes for one analysis tick, one per frequency bin
///
/// Immutable once produced; the next tick replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// All-zero snapshot (no input yet)
    pub fn silent(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.bins.get(index).copied()
    }

    /// Mean of all bins normalized to [0, 1]
    pub fn overall_level(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.bins.iter().map(|&b| u32::from(b)).sum();
        sum as f32 / (self.bins.len() as f32 * 255.0)
    }
}

/// Mean of the first `bass_bins` magnitudes normalized to [0, 1]
///
/// Missing bins count as silence, so a short snapshot can only lower the level.
pub fn bass_level(snapshot: &FrequencySnapshot, bass_bins: usize) -> f32 {
    if bass_bins == 0 {
        return 0.0;
    }
    let sum: u32 = snapshot
        .bins()
        .iter()
        .take(bass_bins)
        .map(|&b| u32::from(b))
        .sum();
    sum as f32 / (bass_bins as f32 * 255.0)
}

/// Snapshot and bass level computed from the same raw samples
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    pub snapshot: FrequencySnapshot,
    pub bass_level: f32,
}

impl AudioFrame {
    pub fn from_snapshot(snapshot: FrequencySnapshot, bass_bins: usize) -> Self {
        let bass_level = bass_level(&snapshot, bass_bins);
        Self {
            snapshot,
            bass_level,
        }
    }

    pub fn silent(bin_count: usize) -> Self {
        Self {
            snapshot: FrequencySnapshot::silent(bin_count),
            bass_level: 0.0,
        }
    }
}

/// Write half of the latest-frame slot (exactly one per slot)
pub struct FramePublisher {
    slot: Arc<ArcSwap<AudioFrame>>,
}

/// Read half of the latest-frame slot (cheap to clone)
#[derive(Clone)]
pub struct FrameReader {
    slot: Arc<ArcSwap<AudioFrame>>,
}

/// Create a slot holding a silent frame of `bin_count` bins
pub fn frame_slot(bin_count: usize) -> (FramePublisher, FrameReader) {
    let slot = Arc::new(ArcSwap::from_pointee(AudioFrame::silent(bin_count)));
    (
        FramePublisher {
            slot: Arc::clone(&slot),
        },
        FrameReader { slot },
    )
}

impl FramePublisher {
    /// Replace the visible frame; readers see either the old or the new pair
    pub fn publish(&self, frame: AudioFrame) {
        self.slot.store(Arc::new(frame));
    }
}

impl FrameReader {
    /// Most recently published frame
    pub fn latest(&self) -> Arc<AudioFrame> {
        self.slot.load_full()
    }
}
