//! Audio capture: microphone → mono 16 kHz speech segments.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → Vec<f32> (mpsc) → downmix
//!           → Endpointer (onset / pause / phrase limit) → resample → AudioSegment
//! ```
//!
//! The recognition loop only sees the [`AudioCapture`] trait; [`CpalCapture`]
//! is the production implementation.

pub mod capture;
pub mod convert;
pub mod endpoint;

pub use capture::{AudioCapture, AudioSegment, CaptureError, CaptureOutcome, CpalCapture};
pub use convert::{downmix, resample};
pub use endpoint::{Endpoint, Endpointer};

/// Sample rate every [`AudioSegment`] is delivered at.
pub const SEGMENT_SAMPLE_RATE: u32 = 16_000;
