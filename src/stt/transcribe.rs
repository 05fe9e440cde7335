//! Transcription parameters and transcript post-processing.

use crate::config::SttConfig;

/// Parameters for a whisper inference run.
///
/// ```
/// use voice_assistant::stt::TranscribeParams;
///
/// let params = TranscribeParams {
///     language: "auto".into(),
///     ..TranscribeParams::default()
/// };
/// assert!(params.detects_language());
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 language code (e.g. `"en"`), or `"auto"` to let whisper
    /// identify the language.
    pub language: String,

    /// Number of CPU threads handed to whisper.
    pub n_threads: i32,

    pub use_gpu: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            n_threads: optimal_threads(),
            use_gpu: false,
        }
    }
}

impl TranscribeParams {
    pub fn from_config(config: &SttConfig) -> Self {
        Self {
            language: config.language.clone(),
            use_gpu: config.use_gpu,
            ..Self::default()
        }
    }

    pub fn detects_language(&self) -> bool {
        self.language == "auto"
    }
}

/// Number of CPU threads to use for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

/// Join whisper segments and strip non-speech annotations such as
/// `[BLANK_AUDIO]` or `(wind blowing)`.
///
/// ```
/// use voice_assistant::stt::clean_transcript;
///
/// assert_eq!(clean_transcript(["[BLANK_AUDIO]"]), "");
/// assert_eq!(clean_transcript([" Search", " the moon. "]), "Search the moon.");
/// ```
pub fn clean_transcript<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_annotation(s))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_annotation(segment: &str) -> bool {
    (segment.starts_with('[') && segment.ends_with(']'))
        || (segment.starts_with('(') && segment.ends_with(')'))
}
