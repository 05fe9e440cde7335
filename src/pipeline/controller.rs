//! Lifecycle of the whole assistant.
//!
//! [`Assistant::start`] verifies both devices, then spawns the speech output
//! loop and the recognition loop.  Either everything starts or nothing does.
//! From then on the assistant runs until somebody requests shutdown: the
//! `exit` voice command, [`Assistant::stop`], or dropping the handle.  A
//! loop that dies on its own (a panicking collaborator) also requests
//! shutdown, so [`Assistant::wait_for_shutdown`] never outlives a dead loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::announce::Announcer;
use super::dispatcher::Dispatcher;
use super::grammar::CommandGrammar;
use super::listener::RecognitionLoop;
use super::processor::{CommandProcessor, CANCELLED};
use super::queue::SpeechQueue;
use super::speaker::SpeechOutputLoop;
use super::state::{ProcessingState, ShutdownSignal, StopSignal};
use super::worker::Worker;
use crate::audio::{AudioCapture, CaptureError};
use crate::config::AssistantConfig;
use crate::knowledge::KnowledgeLookup;
use crate::present::Presenter;
use crate::stt::SpeechRecognizer;
use crate::translate::Translator;
use crate::tts::{SpeechSynthesizer, SynthesisError};

pub(crate) const GREETING: &str = "Listening started. How can I help you?";
pub(crate) const FAREWELL: &str = "Listening stopped.";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("audio capture unavailable: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// The external collaborators the assistant is assembled from.
pub struct AssistantParts {
    pub capture: Box<dyn AudioCapture>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub lookup: Box<dyn KnowledgeLookup>,
    /// `None` disables reply translation.
    pub translator: Option<Arc<dyn Translator>>,
    pub presenter: Arc<dyn Presenter>,
}

/// Cloneable remote control for a running [`Assistant`].
#[derive(Debug, Clone)]
pub struct AssistantHandle {
    state: ProcessingState,
    announcer: Announcer,
    shutdown: ShutdownSignal,
}

impl AssistantHandle {
    /// Abandon the running lookup, if any, and say so.
    ///
    /// A lookup already in progress still runs to completion, but its
    /// result is never spoken.
    pub fn cancel_processing(&self) {
        if self.state.cancel() {
            log::info!("assistant: processing cancelled");
        }
        self.announcer.say(CANCELLED, None);
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_active()
    }
}

/// A running assistant.  Dropping it stops both loops.
pub struct Assistant {
    listener: Worker,
    speaker: Worker,
    handle: AssistantHandle,
    presenter: Arc<dyn Presenter>,
    stopped: bool,
}

impl Assistant {
    pub fn start(parts: AssistantParts, config: &AssistantConfig) -> Result<Self, StartupError> {
        let AssistantParts {
            mut capture,
            recognizer,
            mut synthesizer,
            lookup,
            translator,
            presenter,
        } = parts;

        capture.open()?;
        synthesizer.open()?;

        let queue = SpeechQueue::new();
        let state = ProcessingState::new();
        let listen_stop = StopSignal::new();
        let speak_stop = StopSignal::new();
        let shutdown = ShutdownSignal::new(
            vec![listen_stop.clone(), speak_stop.clone()],
            queue.clone(),
        );

        let announcer = Announcer::new(queue.clone(), Arc::clone(&presenter))
            .with_translator(translator, config.translate.base_language.clone());
        let processor = CommandProcessor::new(
            announcer.clone(),
            state.clone(),
            lookup,
            shutdown.clone(),
        )
        .with_max_candidates(config.lookup.max_candidates);
        let mut dispatcher = Dispatcher::new(
            CommandGrammar::from_config(&config.grammar),
            processor,
            Arc::clone(&presenter),
        );

        let speaker = SpeechOutputLoop::new(synthesizer, queue, config.output.poll_interval())
            .spawn_supervised(speak_stop, shutdown.clone())
            .map_err(|source| StartupError::Spawn {
                name: "speaker",
                source,
            })?;

        // Queued before the listener exists so it is always the first reply.
        announcer.say(GREETING, None);

        // On failure `speaker` is dropped here, which stops and joins it.
        let listener = RecognitionLoop::new(capture, recognizer, config.capture.timeout())
            .with_retry_delay(config.capture.retry_delay())
            .spawn_supervised(listen_stop, shutdown.clone(), move |utterance| {
                dispatcher.dispatch(utterance);
            })
            .map_err(|source| StartupError::Spawn {
                name: "listener",
                source,
            })?;

        log::info!("assistant: started");

        Ok(Self {
            listener,
            speaker,
            handle: AssistantHandle {
                state,
                announcer,
                shutdown,
            },
            presenter,
            stopped: false,
        })
    }

    pub fn handle(&self) -> AssistantHandle {
        self.handle.clone()
    }

    /// See [`AssistantHandle::cancel_processing`].
    pub fn cancel_processing(&self) {
        self.handle.cancel_processing();
    }

    pub fn is_processing(&self) -> bool {
        self.handle.is_processing()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_running()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaker.is_running()
    }

    /// Handle for requesting shutdown from elsewhere, e.g. a signal handler.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.handle.shutdown.clone()
    }

    pub fn request_shutdown(&self) {
        self.handle.request_shutdown();
    }

    /// Block until shutdown has been requested.
    pub fn wait_for_shutdown(&self) {
        self.handle.shutdown.wait();
    }

    /// Returns whether shutdown was requested within `timeout`.
    pub fn wait_for_shutdown_timeout(&self, timeout: Duration) -> bool {
        self.handle.shutdown.wait_timeout(timeout)
    }

    /// Stop both loops and wait for them to finish.
    ///
    /// The listener finishes its current capture (and command, if one is
    /// running) first; the speaker finishes its current phrase and drops
    /// the rest.  Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.handle.request_shutdown();
        self.speaker.join();
        self.listener.join();

        self.presenter.present(&format!("Assistant: {FAREWELL}"));
        log::info!("assistant: stopped");
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
