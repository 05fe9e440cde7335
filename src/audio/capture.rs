//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] is the narrow interface the recognition loop depends on:
//! one call returns either one spoken phrase or a timeout.  [`CpalCapture`]
//! implements it by opening an input stream per attempt, streaming raw
//! buffers over an mpsc channel and running them through an [`Endpointer`].

use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::convert::{downmix, resample};
use super::endpoint::{Endpoint, Endpointer};
use super::SEGMENT_SAMPLE_RATE;
use crate::config::CaptureConfig;

// ---------------------------------------------------------------------------
// AudioSegment / CaptureOutcome
// ---------------------------------------------------------------------------

/// One captured phrase: 16 kHz mono `f32` PCM in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: SEGMENT_SAMPLE_RATE,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Result of a single capture attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Segment(AudioSegment),
    /// Nobody spoke before the timeout.  Not an error.
    Timeout,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while opening or reading the input device.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio stream closed unexpectedly")]
    StreamClosed,
}

// ---------------------------------------------------------------------------
// AudioCapture trait
// ---------------------------------------------------------------------------

/// Source of spoken phrases for the recognition loop.
///
/// The capture device is owned by the recognition loop's thread, so
/// implementations need to be `Send` but never `Sync`.
pub trait AudioCapture: Send {
    /// Verify the device is usable.  Called once on the controlling thread
    /// before any loop starts; an error here aborts startup.
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Block until one phrase has been captured or `timeout` elapses without
    /// speech.
    fn capture_segment(&mut self, timeout: Duration) -> Result<CaptureOutcome, CaptureError>;
}

// ---------------------------------------------------------------------------
// CpalCapture
// ---------------------------------------------------------------------------

/// Microphone capture built on `cpal`.
///
/// Only the device *name* is remembered between attempts; the device and
/// stream are re-acquired for every phrase so nothing platform-specific has
/// to cross threads.
pub struct CpalCapture {
    config: CaptureConfig,
}

impl CpalCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    fn device(&self) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        match &self.config.device {
            None => host.default_input_device().ok_or(CaptureError::NoDevice),
            Some(wanted) => host
                .input_devices()?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(wanted.clone())),
        }
    }

    fn endpointer(&self, sample_rate: u32, timeout: Duration) -> Endpointer {
        Endpointer::new(
            sample_rate,
            self.config.energy_threshold,
            timeout,
            self.config.pause(),
            self.config.phrase_limit(),
        )
    }
}

impl AudioCapture for CpalCapture {
    fn open(&mut self) -> Result<(), CaptureError> {
        let device = self.device()?;
        let supported = device.default_input_config()?;
        log::info!(
            "capture: using {:?} ({} Hz, {} ch)",
            device.name().unwrap_or_else(|_| "unknown device".into()),
            supported.sample_rate().0,
            supported.channels()
        );
        Ok(())
    }

    fn capture_segment(&mut self, timeout: Duration) -> Result<CaptureOutcome, CaptureError> {
        let device = self.device()?;
        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let stream_config: cpal::StreamConfig = supported.into();

        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Receiver is dropped once the phrase is complete.
                let _ = tx.send(data.to_vec());
            },
            |err: cpal::StreamError| {
                log::error!("capture: cpal stream error: {err}");
            },
            None,
        )?;
        stream.play()?;

        let mut endpointer = self.endpointer(sample_rate, timeout);
        let phrase_limit = self.config.phrase_limit();
        let started = Instant::now();

        loop {
            // Wall-clock guard in case the device stops delivering buffers.
            let budget = match endpointer.state() {
                Endpoint::Waiting => timeout,
                _ => timeout + phrase_limit,
            };
            let Some(remaining) = budget.checked_sub(started.elapsed()) else {
                break;
            };

            match rx.recv_timeout(remaining) {
                Ok(chunk) => {
                    if endpointer.push(&downmix(&chunk, channels)).is_finished() {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return Err(CaptureError::StreamClosed),
            }
        }
        drop(stream);

        match endpointer.state() {
            Endpoint::Waiting | Endpoint::TimedOut => Ok(CaptureOutcome::Timeout),
            Endpoint::Speaking | Endpoint::Complete => {
                let speech = endpointer.into_speech();
                let samples = resample(&speech, sample_rate, SEGMENT_SAMPLE_RATE);
                log::debug!(
                    "capture: phrase of {:.2}s captured",
                    samples.len() as f32 / SEGMENT_SAMPLE_RATE as f32
                );
                Ok(CaptureOutcome::Segment(AudioSegment::new(samples)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
