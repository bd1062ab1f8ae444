//! Microphone analysis configuration and constants.

use std::time::Duration;

/// Spectrum analyser configuration
///
/// Mirrors the contract of a browser analyser node: a short FFT window,
/// exponential smoothing between transforms and a fixed dB range mapped
/// onto byte magnitudes.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT window size in samples (must be power of 2, bins = fft_size / 2)
    pub fft_size: usize,

    /// Smoothing between successive transforms (0 = none, <1 = decay)
    pub smoothing: f32,

    /// Magnitude mapped to byte value 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte value 255 (dBFS)
    pub max_db: f32,

    /// Number of low bins averaged into the bass level
    pub bass_bins: usize,

    /// Sampling loop rate (Hz), matched to the display refresh
    pub refresh_hz: f32,

    /// Ticks between periodic level log lines
    pub log_every_ticks: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 64, // 32 frequency bins
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
            bass_bins: 8,
            refresh_hz: 60.0,
            log_every_ticks: 100,
        }
    }
}

/// Slowest accepted sampling rate (Hz)
pub const MIN_REFRESH_HZ: f32 = 1.0;

impl AnalyzerConfig {
    /// Number of frequency bins produced per tick
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Interval between sampling ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.refresh_hz))
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(format!(
                "FFT size must be a power of 2, got {}",
                self.fft_size
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!(
                "Smoothing must be in [0, 1), got {}",
                self.smoothing
            ));
        }
        if self.min_db >= self.max_db {
            return Err(format!(
                "min_db ({}) must be below max_db ({})",
                self.min_db, self.max_db
            ));
        }
        if self.bass_bins == 0 || self.bass_bins > self.bin_count() {
            return Err(format!(
                "Bass bins must be in 1..={}, got {}",
                self.bin_count(),
                self.bass_bins
            ));
        }
        if !self.refresh_hz.is_finite() || self.refresh_hz < MIN_REFRESH_HZ {
            return Err(format!(
                "Refresh rate must be at least {} Hz, got {}",
                MIN_REFRESH_HZ, self.refresh_hz
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 32);
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        let config = AnalyzerConfig {
            fft_size: 48,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_too_many_bass_bins() {
        let config = AnalyzerConfig {
            bass_bins: 33,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_tracks_refresh_rate() {
        let config = AnalyzerConfig {
            refresh_hz: 10.0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval().as_millis(), 100);
    }

    #[test]
    fn test_rejects_unusable_refresh_rates() {
        for refresh_hz in [0.0, -5.0, 1e-20, 0.5, f32::NAN, f32::INFINITY] {
            let config = AnalyzerConfig {
                refresh_hz,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{}", refresh_hz);
        }

        let slowest = AnalyzerConfig {
            refresh_hz: MIN_REFRESH_HZ,
            ..Default::default()
        };
        assert!(slowest.validate().is_ok());
        assert_eq!(slowest.tick_interval().as_secs(), 1);
    }
}
