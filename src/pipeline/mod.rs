//! The assistant's concurrency core.
//!
//! Two long-lived threads share a speech queue and a processing flag:
//!
//! ```text
//!  listener thread                                 speaker thread
//!  ───────────────                                 ──────────────
//!  AudioCapture ─▶ SpeechRecognizer                SpeechQueue ─▶ SpeechSynthesizer
//!        │                                              ▲
//!        ▼ Utterance                                    │ OutputPhrase
//!  Dispatcher ─▶ CommandGrammar ─▶ CommandProcessor ─▶ Announcer
//!                                        │
//!                     KnowledgeLookup ◀──┘   ProcessingState (shared)
//! ```
//!
//! Commands run synchronously on the listener thread, one at a time.  The
//! speaker drains the queue independently, so listening resumes while a
//! reply is still being spoken.  [`Assistant`] owns both threads and the
//! [`ShutdownSignal`] that ends them.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voice_assistant::audio::CpalCapture;
//! use voice_assistant::config::AssistantConfig;
//! use voice_assistant::knowledge::WikipediaLookup;
//! use voice_assistant::pipeline::{Assistant, AssistantParts};
//! use voice_assistant::present::ConsolePresenter;
//! use voice_assistant::stt::{TranscribeParams, WhisperRecognizer};
//! use voice_assistant::tts::ProcessSynthesizer;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = AssistantConfig::default();
//! let parts = AssistantParts {
//!     capture: Box::new(CpalCapture::new(config.capture.clone())),
//!     recognizer: Box::new(WhisperRecognizer::load(
//!         "ggml-base.en.bin",
//!         TranscribeParams::from_config(&config.stt),
//!     )?),
//!     synthesizer: Box::new(ProcessSynthesizer::new(config.tts.clone())),
//!     lookup: Box::new(WikipediaLookup::from_config(&config.lookup)),
//!     translator: None,
//!     presenter: Arc::new(ConsolePresenter),
//! };
//!
//! let mut assistant = Assistant::start(parts, &config)?;
//! assistant.wait_for_shutdown();
//! assistant.stop();
//! # Ok(())
//! # }
//! ```

pub mod announce;
pub mod controller;
pub mod dispatcher;
pub mod grammar;
pub mod listener;
pub mod processor;
pub mod queue;
pub mod speaker;
pub mod state;
pub mod worker;

#[cfg(test)]
pub(crate) mod fakes;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use announce::Announcer;
pub use controller::{Assistant, AssistantHandle, AssistantParts, StartupError};
pub use dispatcher::Dispatcher;
pub use grammar::{Command, CommandGrammar};
pub use listener::{Cycle, RecognitionLoop, Utterance};
pub use processor::CommandProcessor;
pub use queue::{OutputPhrase, SpeechQueue};
pub use speaker::SpeechOutputLoop;
pub use state::{CommandOutcome, ProcessingState, ShutdownSignal, StopSignal};
pub use worker::Worker;
