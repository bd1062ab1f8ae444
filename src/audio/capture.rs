//! Microphone capture: device acquisition and the sample hand-off buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample};
use log::{error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::AudioError;

/// Ring of the most recent mono samples
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append samples, dropping the oldest beyond capacity
    pub fn extend(&mut self, samples: impl IntoIterator<Item = f32>) {
        for sample in samples {
            if self.samples.len() == self.capacity {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    /// Copy the buffered samples (oldest first) into `out`
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Shared handle the capture callback writes into
#[derive(Clone, Debug)]
pub struct SampleSink {
    buffer: Arc<Mutex<SampleBuffer>>,
}

impl SampleSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(SampleBuffer::new(capacity))),
        }
    }

    /// Lock the buffer; a panic on another thread never poisons the audio path
    pub fn lock(&self) -> MutexGuard<'_, SampleBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Downmix interleaved frames to mono and append them
    pub fn push_interleaved<T: Copy>(&self, data: &[T], channels: usize, to_f32: fn(T) -> f32) {
        let channels = channels.max(1);
        let mono = data
            .chunks_exact(channels)
            .map(|frame| frame.iter().map(|&s| to_f32(s)).sum::<f32>() / channels as f32);
        self.lock().extend(mono);
    }
}

/// A live input stream; stopping releases the device
pub trait CaptureStream {
    fn stop(&mut self);
}

/// Source of live input streams
///
/// Opening is where device access is granted or refused.
pub trait CaptureBackend {
    fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, AudioError>;
}

/// Default input device through cpal
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CaptureBackend for CpalBackend {
    fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::InputConfig(e.to_string()))?;

        info!(
            "Audio input: {} @ {}Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        let config: cpal::StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, sink, |s| s)?,
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, sink, |s| s as f32 / i16::MAX as f32)?
            }
            SampleFormat::U16 => build_stream::<u16>(&device, &config, sink, |s| {
                (s as f32 - 32768.0) / 32768.0
            })?,
            other => return Err(AudioError::UnsupportedFormat(other.to_string())),
        };

        stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;

        Ok(Box::new(CpalStream {
            stream: Some(stream),
        }))
    }
}

fn build_stream<T: SizedSample + 'static>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: SampleSink,
    to_f32: fn(T) -> f32,
) -> Result<cpal::Stream, AudioError> {
    let channels = config.channels as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                sink.push_interleaved(data, channels, to_f32);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

/// Running cpal input stream (kept alive until stopped)
struct CpalStream {
    stream: Option<cpal::Stream>,
}

impl CaptureStream for CpalStream {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause input stream: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_keeps_most_recent() {
        let mut buffer = SampleBuffer::new(4);
        buffer.extend([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut out = Vec::new();
        buffer.copy_into(&mut out);
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let sink = SampleSink::new(8);
        sink.push_interleaved(&[1.0f32, 0.0, 0.5, 0.5], 2, |s| s);

        let mut out = Vec::new();
        sink.lock().copy_into(&mut out);
        assert_eq!(out, vec![0.5, 0.5]);
    }

    #[test]
    fn test_downmix_converts_integer_samples() {
        let sink = SampleSink::new(8);
        sink.push_interleaved(&[i16::MAX, 0i16], 1, |s| s as f32 / i16::MAX as f32);

        let mut out = Vec::new();
        sink.lock().copy_into(&mut out);
        assert_eq!(out, vec![1.0, 0.0]);
    }

    #[test]
    fn test_partial_frames_are_dropped() {
        let sink = SampleSink::new(8);
        sink.push_interleaved(&[1.0f32, 1.0, 1.0], 2, |s| s);
        assert_eq!(sink.lock().len(), 1);
    }
}
