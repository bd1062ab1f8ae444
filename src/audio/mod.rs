//! Live microphone analysis.
//!
//! A cpal input stream feeds a sample buffer; a sampling thread turns the
//! most recent window into a byte spectrum plus bass level and publishes it
//! to a latest-value slot read by the render loop.

mod analyser;
mod capture;
mod snapshot;
mod system;

// Re-export public types
pub use analyser::{blackman_window, SpectrumAnalyser};
pub use capture::{CaptureBackend, CaptureStream, CpalBackend, SampleBuffer, SampleSink};
pub use snapshot::{
    bass_level, frame_slot, AudioFrame, FramePublisher, FrameReader, FrequencySnapshot,
};
pub use system::{AudioAnalyzer, SamplingLoop};
