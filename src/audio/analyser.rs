//! Byte-magnitude spectrum analyser.
//!
//! Follows the browser analyser-node pipeline so bar heights read the same:
//! Blackman window, FFT, `1/N` magnitude scaling, exponential smoothing
//! across ticks, then a dB range mapped linearly onto `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::snapshot::FrequencySnapshot;
use crate::error::AudioError;
use crate::params::AnalyzerConfig;

/// Stateful analyser; smoothing carries over between calls
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl SpectrumAnalyser {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::InvalidConfig)?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| blackman_window(i, config.fft_size))
            .collect();

        Ok(Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); config.fft_size],
            smoothed: vec![0.0; config.bin_count()],
            smoothing: config.smoothing,
            min_db: config.min_db,
            max_db: config.max_db,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Analyse the most recent `fft_size` samples
    ///
    /// Fewer samples are treated as silence preceding them; extra leading
    /// samples are ignored.
    pub fn analyse(&mut self, samples: &[f32]) -> FrequencySnapshot {
        let n = self.fft_size();
        let recent = &samples[samples.len().saturating_sub(n)..];
        let pad = n - recent.len();

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / n as f32;
        let tau = self.smoothing;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }

        let range = self.max_db - self.min_db;
        let bins = self
            .smoothed
            .iter()
            .map(|&magnitude| {
                if magnitude <= 0.0 {
                    return 0;
                }
                let db = 20.0 * magnitude.log10();
                let scaled = 255.0 * (db - self.min_db) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();

        FrequencySnapshot::new(bins)
    }

    /// Forget smoothing history
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }
}

/// Blackman window (alpha = 0.16) over a periodic window of `size` samples
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_sine(bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window() {
        let size = 64;

        // Zero at the start, peak of 1 at the center
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyser = SpectrumAnalyser::new(&AnalyzerConfig::default()).unwrap();
        let snapshot = analyser.analyse(&[0.0; 64]);
        assert_eq!(snapshot.len(), 32);
        assert!(snapshot.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_in_its_bin() {
        let mut analyser = SpectrumAnalyser::new(&AnalyzerConfig::default()).unwrap();
        let snapshot = analyser.analyse(&bin_sine(4, 64, 1.0));

        assert_eq!(snapshot.get(4), Some(255));
        assert!(snapshot.get(20).unwrap() < 128);
    }

    #[test]
    fn test_smoothing_decays_over_ticks() {
        let mut analyser = SpectrumAnalyser::new(&AnalyzerConfig::default()).unwrap();
        analyser.analyse(&bin_sine(4, 64, 1.0));

        // One silent tick keeps most of the energy
        let after_one = analyser.analyse(&[0.0; 64]);
        assert!(after_one.get(4).unwrap() > 0);

        // Eventually decays to nothing
        let mut last = after_one;
        for _ in 0..200 {
            last = analyser.analyse(&[0.0; 64]);
        }
        assert_eq!(last.get(4), Some(0));
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyser = SpectrumAnalyser::new(&AnalyzerConfig::default()).unwrap();
        let snapshot = analyser.analyse(&[0.0; 10]);
        assert_eq!(snapshot.len(), 32);
        assert!(snapshot.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut analyser = SpectrumAnalyser::new(&AnalyzerConfig::default()).unwrap();
        analyser.analyse(&bin_sine(4, 64, 1.0));
        analyser.reset();
        let snapshot = analyser.analyse(&[0.0; 64]);
        assert!(snapshot.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = AnalyzerConfig {
            fft_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            SpectrumAnalyser::new(&config),
            Err(AudioError::InvalidConfig(_))
        ));
    }
}
