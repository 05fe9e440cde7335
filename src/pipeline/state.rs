//! Shared flags that coordinate the assistant's threads.
//!
//! * [`ProcessingState`]: "a lookup may still publish its result".  Set by
//!   the command processor when a lookup starts, cleared on completion or by
//!   a cancellation from any thread.
//! * [`StopSignal`]: per-loop cooperative stop request, polled at each loop
//!   boundary.
//! * [`ShutdownSignal`]: full shutdown: stops every loop, closes the speech
//!   queue and wakes anyone waiting for the assistant to finish.
//!
//! All three are cheap to clone (`Arc` inside) and safe to share.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use super::queue::SpeechQueue;

// ---------------------------------------------------------------------------
// ProcessingState
// ---------------------------------------------------------------------------

/// Readers must tolerate the flag flipping between a check and the action
/// that follows it; the worst case is one late phrase, never corruption.
#[derive(Debug, Clone, Default)]
pub struct ProcessingState {
    active: Arc<AtomicBool>,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a command as running.
    pub fn begin(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// `true` while the running command may still publish output.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the running command as finished normally.
    pub fn finish(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Tell the running command to abandon its output.
    ///
    /// Returns whether a command was actually in flight.
    pub fn cancel(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

// ---------------------------------------------------------------------------
// CommandOutcome
// ---------------------------------------------------------------------------

/// How a single command invocation ended.
///
/// ```text
/// Idle ──▶ Running ──▶ Completed | Cancelled | Failed
/// ```
/// `Exit` is the terminal command's outcome: shutdown has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    Cancelled,
    Failed,
    Exit,
}

impl CommandOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CommandOutcome::Completed => "completed",
            CommandOutcome::Cancelled => "cancelled",
            CommandOutcome::Failed => "failed",
            CommandOutcome::Exit => "exit",
        }
    }
}

// ---------------------------------------------------------------------------
// StopSignal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// ShutdownSignal
// ---------------------------------------------------------------------------

struct ShutdownInner {
    requested: Mutex<bool>,
    changed: Condvar,
    loops: Vec<StopSignal>,
    queue: SpeechQueue,
}

/// Handle that any thread may use to end the whole assistant.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<ShutdownInner>,
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("requested", &self.is_requested())
            .finish_non_exhaustive()
    }
}

impl ShutdownSignal {
    pub fn new(loops: Vec<StopSignal>, queue: SpeechQueue) -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                requested: Mutex::new(false),
                changed: Condvar::new(),
                loops,
                queue,
            }),
        }
    }

    /// Stop every loop and refuse further output.  Idempotent; never blocks
    /// on the loops themselves.
    pub fn request(&self) {
        // Loops see their stop flag before the queue refuses output, so the
        // speaker never starts a phrase it pops during the handover.
        for stop in &self.inner.loops {
            stop.request();
        }
        self.inner.queue.close();

        let mut requested = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*requested {
            log::info!("shutdown: requested");
            *requested = true;
        }
        self.inner.changed.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        *self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until [`request`](Self::request) has been called.
    pub fn wait(&self) {
        let guard = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .inner
            .changed
            .wait_while(guard, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.  Returns
    /// whether shutdown was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::OutputPhrase;

    #[test]
    fn processing_state_starts_idle() {
        assert!(!ProcessingState::new().is_active());
    }

    #[test]
    fn cancel_reports_whether_work_was_in_flight() {
        let state = ProcessingState::new();
        assert!(!state.cancel());

        state.begin();
        let reader = state.clone();
        assert!(reader.is_active());
        assert!(state.cancel());
        assert!(!reader.is_active());
    }

    #[test]
    fn finish_clears_flag() {
        let state = ProcessingState::new();
        state.begin();
        state.finish();
        assert!(!state.is_active());
    }

    #[test]
    fn shutdown_stops_loops_and_closes_queue() {
        let a = StopSignal::new();
        let b = StopSignal::new();
        let queue = SpeechQueue::new();
        let shutdown = ShutdownSignal::new(vec![a.clone(), b.clone()], queue.clone());

        assert!(!shutdown.is_requested());
        shutdown.request();

        assert!(shutdown.is_requested());
        assert!(a.is_requested() && b.is_requested());
        assert!(queue.is_closed());
        assert!(!queue.push(OutputPhrase::new("too late")));
    }

    #[test]
    fn loops_are_stopped_before_queue_closes() {
        let stop = StopSignal::new();
        let queue = SpeechQueue::new();
        let shutdown = ShutdownSignal::new(vec![stop.clone()], queue.clone());

        let watcher = {
            let (stop, queue) = (stop.clone(), queue.clone());
            std::thread::spawn(move || {
                while !queue.is_closed() {
                    std::thread::yield_now();
                }
                stop.is_requested()
            })
        };

        shutdown.request();
        assert!(watcher.join().unwrap());
    }

    #[test]
    fn wait_returns_after_request_from_other_thread() {
        let shutdown = ShutdownSignal::new(Vec::new(), SpeechQueue::new());
        let remote = shutdown.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request();
        });

        assert!(shutdown.wait_timeout(Duration::from_secs(5)));
        shutdown.wait();
        handle.join().unwrap();
    }

    #[test]
    fn wait_timeout_expires_without_request() {
        let shutdown = ShutdownSignal::new(Vec::new(), SpeechQueue::new());
        assert!(!shutdown.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn signals_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessingState>();
        assert_send_sync::<StopSignal>();
        assert_send_sync::<ShutdownSignal>();
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(CommandOutcome::Completed.label(), "completed");
        assert_eq!(CommandOutcome::Cancelled.label(), "cancelled");
        assert_eq!(CommandOutcome::Failed.label(), "failed");
        assert_eq!(CommandOutcome::Exit.label(), "exit");
    }
}
