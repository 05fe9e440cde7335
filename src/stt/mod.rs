//! Speech recognition.
//!
//! [`SpeechRecognizer`] is the interface the recognition loop calls once per
//! captured phrase.  [`WhisperRecognizer`] is the production implementation
//! backed by a local GGML whisper model.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_assistant::audio::AudioSegment;
//! use voice_assistant::stt::{SpeechRecognizer, TranscribeParams, WhisperRecognizer};
//!
//! let mut recognizer = WhisperRecognizer::load("models/ggml-base.en.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! let segment = AudioSegment::new(vec![0.0; 16_000]); // 1 s of silence
//! match recognizer.transcribe(&segment) {
//!     Ok(transcript) => println!("{}", transcript.text),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{RecognitionError, SpeechRecognizer, Transcript, WhisperRecognizer};
pub use transcribe::{clean_transcript, TranscribeParams};
