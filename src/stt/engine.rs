//! Speech recognizer trait and the whisper-backed implementation.
//!
//! [`SpeechRecognizer`] is object-safe and `Send` so the recognition loop's
//! thread can own a `Box<dyn SpeechRecognizer>`.

use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::AudioSegment;
use crate::stt::transcribe::{clean_transcript, TranscribeParams};

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Text recovered from one audio segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    /// Language reported by the recognizer, when it knows.
    pub language: Option<String>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// The segment held no intelligible speech.
    #[error("no speech detected")]
    NoSpeech,

    /// The recognizer failed on this segment; the next one may succeed.
    #[error("recognition service error: {0}")]
    Service(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

pub trait SpeechRecognizer: Send {
    /// Convert `segment` to text.
    ///
    /// Implementations return [`RecognitionError::NoSpeech`] rather than an
    /// empty transcript when nothing was understood.
    fn transcribe(&mut self, segment: &AudioSegment) -> Result<Transcript, RecognitionError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

/// 0.25 s at 16 kHz; anything shorter is a click, not a word.
const MIN_AUDIO_SAMPLES: usize = 4_000;
/// Whisper decodes 30 s windows.
const MAX_AUDIO_SAMPLES: usize = 480_000;

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Local speech recognition with a whisper GGML model.
pub struct WhisperRecognizer {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl WhisperRecognizer {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`RecognitionError::ModelNotFound`]: `model_path` does not exist.
    /// - [`RecognitionError::ContextInit`]: whisper-rs failed to load it.
    pub fn load(
        model_path: impl AsRef<Path>,
        params: TranscribeParams,
    ) -> Result<Self, RecognitionError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(RecognitionError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            RecognitionError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(params.use_gpu);
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| RecognitionError::ContextInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }

    fn full_params(&self) -> FullParams<'_, '_> {
        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        let lang = if self.params.detects_language() {
            None
        } else {
            Some(self.params.language.as_str())
        };
        fp.set_language(lang);
        fp.set_n_threads(self.params.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_special(false);
        fp.set_suppress_blank(true);
        fp
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&mut self, segment: &AudioSegment) -> Result<Transcript, RecognitionError> {
        if segment.samples.len() < MIN_AUDIO_SAMPLES {
            return Err(RecognitionError::NoSpeech);
        }
        let audio = &segment.samples[..segment.samples.len().min(MAX_AUDIO_SAMPLES)];

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        let started = Instant::now();
        state
            .full(self.full_params(), audio)
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        let mut pieces = Vec::with_capacity(n_segments.max(0) as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| RecognitionError::Service(format!("segment {i}: {e}")))?;
            pieces.push(text);
        }

        let text = clean_transcript(pieces.iter().map(String::as_str));
        log::debug!(
            "stt: {} segment(s) in {} ms",
            n_segments,
            started.elapsed().as_millis()
        );

        if text.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }

        let language = if self.params.detects_language() {
            state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(str::to_string)
        } else {
            Some(self.params.language.clone())
        };

        Ok(Transcript { text, language })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
