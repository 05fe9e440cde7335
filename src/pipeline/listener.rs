//! Recognition loop: microphone → recognizer → utterance handler.
//!
//! Each cycle is one bounded capture attempt followed, if a phrase was
//! captured, by one recognition call.  Every failure is local to its cycle;
//! the loop itself only ends when its stop flag is raised.
//!
//! The utterance handler runs synchronously on the loop's thread, so the
//! next capture does not begin until the previous command has been handled.

use std::io;
use std::thread;
use std::time::{Duration, SystemTime};

use super::state::{ShutdownSignal, StopSignal};
use super::worker::Worker;
use crate::audio::{AudioCapture, CaptureOutcome};
use crate::stt::{RecognitionError, SpeechRecognizer};

/// One recognized phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Never empty.
    pub text: String,
    pub recognized_at: SystemTime,
    /// Language the recognizer reported, if any.
    pub language: Option<String>,
}

/// What a single listening cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    Heard(Utterance),
    Timeout,
    NoSpeech,
    RecognitionFailed,
    CaptureFailed,
}

pub struct RecognitionLoop {
    capture: Box<dyn AudioCapture>,
    recognizer: Box<dyn SpeechRecognizer>,
    timeout: Duration,
    retry_delay: Duration,
}

impl RecognitionLoop {
    pub fn new(
        capture: Box<dyn AudioCapture>,
        recognizer: Box<dyn SpeechRecognizer>,
        timeout: Duration,
    ) -> Self {
        Self {
            capture,
            recognizer,
            timeout,
            retry_delay: Duration::from_millis(100),
        }
    }

    /// Pause after a capture device error before trying again.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Run one capture attempt and, if speech was captured, one recognition.
    pub fn cycle(&mut self) -> Cycle {
        let segment = match self.capture.capture_segment(self.timeout) {
            Ok(CaptureOutcome::Segment(segment)) => segment,
            Ok(CaptureOutcome::Timeout) => {
                log::debug!("listener: no speech within {:?}", self.timeout);
                return Cycle::Timeout;
            }
            Err(e) => {
                log::warn!("listener: capture failed: {e}");
                return Cycle::CaptureFailed;
            }
        };

        match self.recognizer.transcribe(&segment) {
            Ok(transcript) => {
                let text = transcript.text.trim();
                if text.is_empty() {
                    log::info!("listener: could not understand audio");
                    return Cycle::NoSpeech;
                }
                log::info!("listener: heard {text:?}");
                Cycle::Heard(Utterance {
                    text: text.to_string(),
                    recognized_at: SystemTime::now(),
                    language: transcript.language,
                })
            }
            Err(RecognitionError::NoSpeech) => {
                log::info!("listener: could not understand audio");
                Cycle::NoSpeech
            }
            Err(e) => {
                log::warn!("listener: recognition failed: {e}");
                Cycle::RecognitionFailed
            }
        }
    }

    /// Cycle until `stop` is requested, handing each utterance to
    /// `on_utterance`.  Stop is checked between cycles, never mid-capture.
    pub fn run<F>(mut self, stop: &StopSignal, mut on_utterance: F)
    where
        F: FnMut(Utterance),
    {
        log::info!("listener: started");
        while !stop.is_requested() {
            match self.cycle() {
                Cycle::Heard(utterance) => on_utterance(utterance),
                Cycle::CaptureFailed => thread::sleep(self.retry_delay),
                Cycle::Timeout | Cycle::NoSpeech | Cycle::RecognitionFailed => {}
            }
        }
        log::info!("listener: stopped");
    }

    pub fn spawn<F>(self, stop: StopSignal, on_utterance: F) -> io::Result<Worker>
    where
        F: FnMut(Utterance) + Send + 'static,
    {
        Worker::spawn("listener", stop, move |stop| self.run(&stop, on_utterance))
    }

    /// [`spawn`](Self::spawn), requesting `shutdown` if the loop dies on its
    /// own.
    pub fn spawn_supervised<F>(
        self,
        stop: StopSignal,
        shutdown: ShutdownSignal,
        on_utterance: F,
    ) -> io::Result<Worker>
    where
        F: FnMut(Utterance) + Send + 'static,
    {
        Worker::spawn_supervised("listener", stop, shutdown, move |stop| {
            self.run(&stop, on_utterance)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fakes::{scripted, wait_until, ScriptProbe, Step, WAIT_LIMIT};
    use std::sync::mpsc;

    fn recognition_loop(steps: Vec<Step>) -> (RecognitionLoop, ScriptProbe) {
        let (capture, recognizer, probe) = scripted(steps);
        let lp = RecognitionLoop::new(
            Box::new(capture),
            Box::new(recognizer),
            Duration::from_millis(50),
        )
        .with_retry_delay(Duration::from_millis(1));
        (lp, probe)
    }

    #[test]
    fn cycle_reports_each_kind_of_attempt() {
        let (mut lp, probe) = recognition_loop(vec![
            Step::Silence,
            Step::Mumble,
            Step::ServiceFault,
            Step::DeviceFault,
            Step::SayIn("search moon", "en"),
        ]);

        assert_eq!(lp.cycle(), Cycle::Timeout);
        assert_eq!(lp.cycle(), Cycle::NoSpeech);
        assert_eq!(lp.cycle(), Cycle::RecognitionFailed);
        assert_eq!(lp.cycle(), Cycle::CaptureFailed);
        match lp.cycle() {
            Cycle::Heard(u) => {
                assert_eq!(u.text, "search moon");
                assert_eq!(u.language.as_deref(), Some("en"));
            }
            other => panic!("expected an utterance, got {other:?}"),
        }

        assert_eq!(probe.captures(), 5);
        // Silence and the device fault never reach the recognizer.
        assert_eq!(probe.transcriptions(), 3);
    }

    #[test]
    fn whitespace_transcript_counts_as_no_speech() {
        let (mut lp, _) = recognition_loop(vec![Step::Say("   ")]);
        assert_eq!(lp.cycle(), Cycle::NoSpeech);
    }

    #[test]
    fn heard_text_is_trimmed() {
        let (mut lp, _) = recognition_loop(vec![Step::Say("  hello there ")]);
        assert!(matches!(lp.cycle(), Cycle::Heard(u) if u.text == "hello there"));
    }

    #[test]
    fn failures_do_not_stop_the_loop() {
        let (lp, probe) = recognition_loop(vec![
            Step::Mumble,
            Step::DeviceFault,
            Step::ServiceFault,
            Step::Silence,
            Step::Say("search mars"),
        ]);
        let (tx, rx) = mpsc::channel();
        let mut worker = lp
            .spawn(StopSignal::new(), move |u: Utterance| {
                let _ = tx.send(u.text);
            })
            .unwrap();

        let heard = rx.recv_timeout(WAIT_LIMIT).unwrap();
        assert_eq!(heard, "search mars");
        assert!(worker.is_running());
        worker.stop();

        assert_eq!(probe.remaining(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_speech_produces_no_utterance_and_keeps_listening() {
        let (lp, probe) = recognition_loop(vec![Step::Mumble, Step::Mumble]);
        let (tx, rx) = mpsc::channel::<Utterance>();
        let mut worker = lp
            .spawn(StopSignal::new(), move |u| {
                let _ = tx.send(u);
            })
            .unwrap();

        // Both mumbles consumed plus at least one further attempt.
        wait_until("capture retried", || probe.captures() >= 3);
        worker.stop();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_ends_loop_between_cycles() {
        let (lp, probe) = recognition_loop(Vec::new());
        let stop = StopSignal::new();
        let mut worker = lp.spawn(stop.clone(), |_| {}).unwrap();

        wait_until("first capture", || probe.captures() > 0);
        stop.request();
        worker.join();

        let after_stop = probe.captures();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(probe.captures(), after_stop);
    }
}
