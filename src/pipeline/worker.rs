//! Named OS thread with a cooperative stop flag.
//!
//! Both assistant loops run on a [`Worker`].  Stopping is two-phase: the
//! controller first requests every loop to stop, then joins them, so one
//! slow loop never delays the others from seeing the request.
//!
//! A supervised worker also watches for its loop ending on its own, through
//! a panic or an early return, and then requests a full shutdown so the rest
//! of the assistant does not keep running without it.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use super::state::{ShutdownSignal, StopSignal};

/// Handle to a running loop thread.
///
/// Dropping a `Worker` requests a stop and joins the thread.
pub struct Worker {
    name: String,
    stop: StopSignal,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Runs when the body exits, panics included.
struct ExitGuard {
    name: String,
    stop: StopSignal,
    running: Arc<AtomicBool>,
    supervisor: Option<ShutdownSignal>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(shutdown) = &self.supervisor else {
            return;
        };
        if self.stop.is_requested() {
            return;
        }
        if thread::panicking() {
            log::error!("{}: loop panicked; shutting down", self.name);
        } else {
            log::error!("{}: loop ended without a stop request; shutting down", self.name);
        }
        shutdown.request();
    }
}

impl Worker {
    /// Spawn `body` on a thread called `name`.  `body` receives a clone of
    /// `stop` and is expected to return soon after it is requested.
    pub fn spawn<F>(name: &str, stop: StopSignal, body: F) -> io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        Self::start(name, stop, None, body)
    }

    /// Like [`spawn`](Self::spawn), but if `body` ends before `stop` was
    /// requested, `shutdown` is requested on its behalf.
    pub fn spawn_supervised<F>(
        name: &str,
        stop: StopSignal,
        shutdown: ShutdownSignal,
        body: F,
    ) -> io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        Self::start(name, stop, Some(shutdown), body)
    }

    fn start<F>(
        name: &str,
        stop: StopSignal,
        supervisor: Option<ShutdownSignal>,
        body: F,
    ) -> io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let guard = ExitGuard {
            name: name.to_string(),
            stop: stop.clone(),
            running: Arc::clone(&running),
            supervisor,
        };
        let thread_stop = stop.clone();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _guard = guard;
                body(thread_stop);
            })?;

        log::debug!("{name}: thread spawned");
        Ok(Self {
            name: name.to_string(),
            stop,
            running,
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` until the loop body has returned.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the loop to stop at its next boundary.  Does not wait.
    pub fn request_stop(&self) {
        self.stop.request();
    }

    /// Wait for the loop to return.  A no-op when already joined, or when
    /// called from the worker's own thread.
    pub fn join(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Joining ourselves would deadlock; the body is already unwinding.
            return;
        }
        if handle.join().is_err() {
            log::error!("{}: thread panicked", self.name);
        } else {
            log::debug!("{}: thread joined", self.name);
        }
    }

    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::SpeechQueue;
    use std::time::Duration;

    fn spin_until_stopped(stop: StopSignal) {
        while !stop.is_requested() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn stop_ends_loop_and_clears_running() {
        let mut worker = Worker::spawn("test-spin", StopSignal::new(), spin_until_stopped).unwrap();
        assert_eq!(worker.name(), "test-spin");
        assert!(worker.is_running());

        worker.stop();
        assert!(!worker.is_running());
    }

    #[test]
    fn external_stop_signal_reaches_loop() {
        let stop = StopSignal::new();
        let mut worker = Worker::spawn("test-external", stop.clone(), spin_until_stopped).unwrap();

        stop.request();
        worker.join();
        assert!(!worker.is_running());
    }

    #[test]
    fn running_clears_when_body_returns_on_its_own() {
        let mut worker = Worker::spawn("test-short", StopSignal::new(), |_| {}).unwrap();
        worker.join();
        assert!(!worker.is_running());
        // Second join is harmless.
        worker.join();
    }

    #[test]
    fn panicking_body_is_reported_not_propagated() {
        let mut worker = Worker::spawn("test-panic", StopSignal::new(), |_| panic!("boom")).unwrap();
        worker.join();
        assert!(!worker.is_running());
    }

    #[test]
    fn supervised_panic_requests_shutdown() {
        let shutdown = ShutdownSignal::new(Vec::new(), SpeechQueue::new());
        let mut worker = Worker::spawn_supervised(
            "test-supervised-panic",
            StopSignal::new(),
            shutdown.clone(),
            |_| panic!("collaborator blew up"),
        )
        .unwrap();

        assert!(shutdown.wait_timeout(Duration::from_secs(5)));
        worker.join();
        assert!(!worker.is_running());
    }

    #[test]
    fn supervised_early_return_requests_shutdown() {
        let shutdown = ShutdownSignal::new(Vec::new(), SpeechQueue::new());
        let mut worker = Worker::spawn_supervised(
            "test-supervised-return",
            StopSignal::new(),
            shutdown.clone(),
            |_| {},
        )
        .unwrap();

        worker.join();
        assert!(shutdown.is_requested());
    }

    #[test]
    fn supervised_stop_does_not_request_shutdown() {
        let shutdown = ShutdownSignal::new(Vec::new(), SpeechQueue::new());
        let mut worker = Worker::spawn_supervised(
            "test-supervised-stop",
            StopSignal::new(),
            shutdown.clone(),
            spin_until_stopped,
        )
        .unwrap();

        worker.stop();
        assert!(!shutdown.is_requested());
    }

    #[test]
    fn thread_carries_its_name() {
        let (tx, rx) = std::sync::mpsc::channel();
        let _worker = Worker::spawn("test-named", StopSignal::new(), move |_| {
            let _ = tx.send(thread::current().name().map(str::to_string));
        })
        .unwrap();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("test-named"));
    }
}
