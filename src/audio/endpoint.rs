//! Energy-based phrase endpointing.
//!
//! [`Endpointer`] decides where a spoken phrase starts and stops inside a
//! live stream of mono samples.  Audio is cut into 30 ms frames; a frame is
//! *voiced* when its RMS amplitude exceeds the threshold.
//!
//! ```text
//! Waiting ──voiced frame──▶ Speaking ──pause / phrase limit──▶ Complete
//!    └──────── no voice within timeout ─────────────────────▶ TimedOut
//! ```
//!
//! Time is measured in samples, not wall-clock, so the state machine is
//! deterministic and testable without a microphone.

use std::time::Duration;

/// Where the endpointer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// No speech heard yet.
    Waiting,
    /// Speech has started and is still going.
    Speaking,
    /// The phrase ended (trailing pause or phrase limit).
    Complete,
    /// No speech began within the onset timeout.
    TimedOut,
}

impl Endpoint {
    pub fn is_finished(self) -> bool {
        matches!(self, Endpoint::Complete | Endpoint::TimedOut)
    }
}

pub struct Endpointer {
    threshold: f32,
    frame_len: usize,
    onset_limit: usize,
    pause_limit: usize,
    phrase_limit: usize,
    pending: Vec<f32>,
    waited: usize,
    trailing_silence: usize,
    speech: Vec<f32>,
    state: Endpoint,
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

impl Endpointer {
    /// * `threshold`: RMS amplitude separating speech from silence.
    /// * `onset_timeout`: how long to wait for speech to begin.
    /// * `pause`: trailing silence that ends a phrase.
    /// * `phrase_limit`: hard cap on phrase length.
    pub fn new(
        sample_rate: u32,
        threshold: f32,
        onset_timeout: Duration,
        pause: Duration,
        phrase_limit: Duration,
    ) -> Self {
        let frame_len = (sample_rate as usize * 30 / 1_000).max(1);
        Self {
            threshold,
            frame_len,
            onset_limit: samples_for(onset_timeout, sample_rate).max(frame_len),
            pause_limit: samples_for(pause, sample_rate).max(frame_len),
            phrase_limit: samples_for(phrase_limit, sample_rate).max(frame_len),
            pending: Vec::new(),
            waited: 0,
            trailing_silence: 0,
            speech: Vec::new(),
            state: Endpoint::Waiting,
        }
    }

    pub fn state(&self) -> Endpoint {
        self.state
    }

    /// Feed the next block of mono samples and return the updated state.
    ///
    /// Once finished, further input is ignored.
    pub fn push(&mut self, samples: &[f32]) -> Endpoint {
        if self.state.is_finished() {
            return self.state;
        }

        self.pending.extend_from_slice(samples);
        let mut consumed = 0;

        while self.pending.len() - consumed >= self.frame_len && !self.state.is_finished() {
            let frame = &self.pending[consumed..consumed + self.frame_len];
            let voiced = rms(frame) > self.threshold;

            match self.state {
                Endpoint::Waiting if voiced => {
                    self.speech.extend_from_slice(frame);
                    self.state = Endpoint::Speaking;
                }
                Endpoint::Waiting => {
                    self.waited += self.frame_len;
                    if self.waited >= self.onset_limit {
                        self.state = Endpoint::TimedOut;
                    }
                }
                Endpoint::Speaking => {
                    self.speech.extend_from_slice(frame);
                    if voiced {
                        self.trailing_silence = 0;
                    } else {
                        self.trailing_silence += self.frame_len;
                    }
                    if self.trailing_silence >= self.pause_limit
                        || self.speech.len() >= self.phrase_limit
                    {
                        self.state = Endpoint::Complete;
                    }
                }
                Endpoint::Complete | Endpoint::TimedOut => {}
            }

            consumed += self.frame_len;
        }

        self.pending.drain(..consumed);
        self.state
    }

    /// Samples captured from speech onset up to the end of the phrase,
    /// with the trailing pause trimmed off.
    pub fn into_speech(mut self) -> Vec<f32> {
        let keep = self.speech.len().saturating_sub(self.trailing_silence);
        self.speech.truncate(keep);
        self.speech
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
