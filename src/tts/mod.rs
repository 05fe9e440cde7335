//! Speech synthesis.
//!
//! [`SpeechSynthesizer`] is the interface the speech output loop drives, one
//! phrase at a time.  The synthesizer is owned by that loop's thread and is
//! never called concurrently.

pub mod process;

pub use process::ProcessSynthesizer;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The engine cannot be used at all (missing program, no audio output).
    #[error("speech synthesizer unavailable: {0}")]
    Unavailable(String),

    /// This phrase could not be spoken; later phrases may still work.
    #[error("speech synthesis failed: {0}")]
    Failed(String),
}

pub trait SpeechSynthesizer: Send {
    /// Check the engine is usable.  Called once before the output loop
    /// starts; an error here aborts startup.
    fn open(&mut self) -> Result<(), SynthesisError> {
        Ok(())
    }

    /// Speak `text`, blocking until playback has finished.
    ///
    /// `language` is a locale tag such as `"de"`; `None` means the engine's
    /// default voice.
    fn speak(&mut self, text: &str, language: Option<&str>) -> Result<(), SynthesisError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};
