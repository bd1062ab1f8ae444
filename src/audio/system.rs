//! Audio analyzer: microphone capture feeding a periodic spectrum snapshot.

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::analyser::SpectrumAnalyser;
use super::capture::{CaptureBackend, CaptureStream, SampleSink};
use super::snapshot::{frame_slot, AudioFrame, FramePublisher, FrameReader};
use crate::error::AudioError;
use crate::params::AnalyzerConfig;

/// One analysis step: latest samples in, published frame out
pub struct SamplingLoop {
    analyser: SpectrumAnalyser,
    samples: SampleSink,
    publisher: FramePublisher,
    scratch: Vec<f32>,
    bass_bins: usize,
    ticks: u64,
    log_every_ticks: u64,
}

impl SamplingLoop {
    pub fn new(
        config: &AnalyzerConfig,
        samples: SampleSink,
        publisher: FramePublisher,
    ) -> Result<Self, AudioError> {
        let analyser = SpectrumAnalyser::new(config)?;
        Ok(Self {
            scratch: Vec::with_capacity(analyser.fft_size()),
            analyser,
            samples,
            publisher,
            bass_bins: config.bass_bins,
            ticks: 0,
            log_every_ticks: config.log_every_ticks.max(1),
        })
    }

    /// Analyse the buffered samples and publish a fresh frame
    pub fn tick(&mut self) -> AudioFrame {
        self.samples.lock().copy_into(&mut self.scratch);
        let snapshot = self.analyser.analyse(&self.scratch);
        let frame = AudioFrame::from_snapshot(snapshot, self.bass_bins);

        if self.ticks % self.log_every_ticks == 0 {
            debug!(
                "Audio levels - bass: {:.3} total: {:.3}",
                frame.bass_level,
                frame.snapshot.overall_level()
            );
        }
        self.ticks += 1;

        self.publisher.publish(frame.clone());
        frame
    }
}

/// Live microphone analyzer exposing the latest (snapshot, bass level) pair
///
/// Idle until [`AudioAnalyzer::start`] succeeds; while idle the published
/// frame is silent.
pub struct AudioAnalyzer {
    config: AnalyzerConfig,
    reader: FrameReader,
    /// Taken by the sampling thread on start
    publisher: Option<FramePublisher>,
    samples: SampleSink,
    stream: Option<Box<dyn CaptureStream>>,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AudioAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let (publisher, reader) = frame_slot(config.bin_count());
        let samples = SampleSink::new(config.fft_size);
        Self {
            config,
            reader,
            publisher: Some(publisher),
            samples,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Acquire the input device and start sampling
    ///
    /// Failure is logged and leaves the analyzer idle for the session.
    /// Returns whether sampling is running.
    pub fn start(&mut self, backend: &dyn CaptureBackend) -> bool {
        if self.is_running() {
            warn!("Audio analyzer already running");
            return true;
        }
        match self.try_start(backend) {
            Ok(()) => {
                info!("Audio analyzer started");
                true
            }
            Err(e) => {
                error!("Error accessing microphone: {}", e);
                false
            }
        }
    }

    fn try_start(&mut self, backend: &dyn CaptureBackend) -> Result<(), AudioError> {
        let Some(publisher) = self.publisher.take() else {
            return Err(AudioError::InvalidConfig(
                "analyzer was already stopped".to_string(),
            ));
        };

        let mut sampling = SamplingLoop::new(&self.config, self.samples.clone(), publisher)?;
        self.stream = Some(backend.open(self.samples.clone())?);

        let interval = self.config.tick_interval();
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        self.worker = Some(thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                sampling.tick();
                thread::sleep(interval);
            }
        }));

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle for consumers of the latest frame
    pub fn reader(&self) -> FrameReader {
        self.reader.clone()
    }

    pub fn latest(&self) -> Arc<AudioFrame> {
        self.reader.latest()
    }

    /// Halt sampling, stop the input stream and release analysis state
    ///
    /// Safe to call repeatedly and when start never succeeded.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Audio sampling thread panicked");
            }
        }

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Audio input stopped");
        }

        self.publisher = None;
        self.samples.lock().clear();
    }
}

impl Drop for AudioAnalyzer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    struct DeniedBackend;

    impl CaptureBackend for DeniedBackend {
        fn open(&self, _sink: SampleSink) -> Result<Box<dyn CaptureStream>, AudioError> {
            Err(AudioError::NoInputDevice)
        }
    }

    struct CountingStream(Arc<AtomicUsize>);

    impl CaptureStream for CountingStream {
        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Fills the sink with a low sine once, like a steady bass tone
    struct ToneBackend {
        stops: Arc<AtomicUsize>,
    }

    impl CaptureBackend for ToneBackend {
        fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, AudioError> {
            let tone: Vec<f32> = (0..64)
                .map(|i| (2.0 * PI * 2.0 * i as f32 / 64.0).sin())
                .collect();
            sink.lock().extend(tone);
            Ok(Box::new(CountingStream(Arc::clone(&self.stops))))
        }
    }

    fn fast_config() -> AnalyzerConfig {
        AnalyzerConfig {
            refresh_hz: 500.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_denied_device_stays_idle() {
        let mut analyzer = AudioAnalyzer::new(AnalyzerConfig::default());
        assert!(!analyzer.start(&DeniedBackend));
        assert!(!analyzer.is_running());

        let frame = analyzer.latest();
        assert_eq!(frame.snapshot.len(), 32);
        assert!(frame.snapshot.bins().iter().all(|&b| b == 0));
        assert_eq!(frame.bass_level, 0.0);

        // Cleanup is safe after a failed start, twice
        analyzer.stop();
        analyzer.stop();
    }

    #[test]
    fn test_sampling_publishes_frames() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut analyzer = AudioAnalyzer::new(fast_config());
        assert!(analyzer.start(&ToneBackend {
            stops: Arc::clone(&stops)
        }));

        let reader = analyzer.reader();
        let deadline = Instant::now() + Duration::from_secs(2);
        while reader.latest().bass_level == 0.0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let frame = reader.latest();
        assert!(frame.bass_level > 0.0);
        assert_eq!(frame.snapshot.get(2), Some(255));

        analyzer.stop();
        assert!(!analyzer.is_running());
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // Second stop does not touch the released stream again
        analyzer.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_stream() {
        let stops = Arc::new(AtomicUsize::new(0));
        {
            let mut analyzer = AudioAnalyzer::new(fast_config());
            assert!(analyzer.start(&ToneBackend {
                stops: Arc::clone(&stops)
            }));
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tick_computes_bass_from_same_snapshot() {
        let (publisher, reader) = frame_slot(32);
        let sink = SampleSink::new(64);
        let mut sampling = SamplingLoop::new(&AnalyzerConfig::default(), sink, publisher).unwrap();

        let frame = sampling.tick();
        assert_eq!(*reader.latest(), frame);
        assert_eq!(frame.bass_level, 0.0);
    }
}
