//! FIFO of phrases waiting to be spoken.
//!
//! Producers (the command processor, the controller) push without blocking;
//! the single consumer (the speech output loop) waits with a bounded timeout
//! so it can notice stop requests.  Once [`SpeechQueue::close`]d the queue
//! rejects new phrases and wakes the consumer immediately.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Text to speak, optionally tagged with its language so the synthesizer
/// can pick a matching voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPhrase {
    pub text: String,
    pub language: Option<String>,
}

impl OutputPhrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

#[derive(Default)]
struct QueueState {
    phrases: VecDeque<OutputPhrase>,
    closed: bool,
}

#[derive(Default)]
struct QueueInner {
    state: Mutex<QueueState>,
    available: Condvar,
}

/// Unbounded multi-producer, single-consumer phrase queue.
#[derive(Clone, Default)]
pub struct SpeechQueue {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for SpeechQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SpeechQueue")
            .field("len", &state.phrases.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A panicking producer cannot leave the deque half-updated.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `phrase`.  Returns `false` (and drops the phrase) once the
    /// queue is closed.
    pub fn push(&self, phrase: OutputPhrase) -> bool {
        let mut state = self.lock();
        if state.closed {
            log::debug!("queue: closed, dropping {:?}", phrase.text);
            return false;
        }
        state.phrases.push_back(phrase);
        drop(state);
        self.inner.available.notify_one();
        true
    }

    /// Take the oldest phrase, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout, or straight away if the queue is closed
    /// and empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<OutputPhrase> {
        let state = self.lock();
        let (mut state, _) = self
            .inner
            .available
            .wait_timeout_while(state, timeout, |s| s.phrases.is_empty() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        state.phrases.pop_front()
    }

    /// Discard everything still queued and return how many phrases went.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let dropped = state.phrases.len();
        state.phrases.clear();
        dropped
    }

    /// Refuse further phrases and wake a waiting consumer.
    pub fn close(&self) {
        self.lock().closed = true;
        self.inner.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the queued phrases, oldest first.
    pub fn snapshot(&self) -> Vec<OutputPhrase> {
        self.lock().phrases.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
