//! Response translation.
//!
//! When the speaker used a language other than the assistant's own, every
//! phrase is passed through a [`Translator`] before it is queued for speech.
//! Callers treat failures as "speak the original text".

pub mod api;

pub use api::ApiTranslator;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(String),

    #[error("translation request timed out")]
    Timeout,

    #[error("failed to parse translation response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else if e.is_decode() {
            TranslateError::Parse(e.to_string())
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

/// Shared by the command processor and the lifecycle controller, hence
/// `Sync`.
pub trait Translator: Send + Sync {
    /// Translate `text` into the language tagged `target`.
    fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Translator>) {}
};
