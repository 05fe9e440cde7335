//! Hands-free voice assistant: listen, recognize, look things up, speak.
//!
//! Collaborators live in their own modules behind small traits
//! ([`audio::AudioCapture`], [`stt::SpeechRecognizer`],
//! [`tts::SpeechSynthesizer`], [`knowledge::KnowledgeLookup`],
//! [`translate::Translator`], [`present::Presenter`]); [`pipeline`] wires
//! them into the two-thread listen/speak core.

pub mod audio;
pub mod config;
pub mod knowledge;
pub mod pipeline;
pub mod present;
pub mod stt;
pub mod translate;
pub mod tts;
