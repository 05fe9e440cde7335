//! Scripted collaborators for exercising the loops without hardware or
//! network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{AudioCapture, AudioSegment, CaptureError, CaptureOutcome};
use crate::knowledge::{KnowledgeLookup, LookupError, LookupOutcome};
use crate::pipeline::queue::OutputPhrase;
use crate::stt::{RecognitionError, SpeechRecognizer, Transcript};
use crate::translate::{TranslateError, Translator};
use crate::tts::{SpeechSynthesizer, SynthesisError};

pub(crate) const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Poll `cond` until it holds, panicking after [`WAIT_LIMIT`].
pub(crate) fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT_LIMIT;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

// ---------------------------------------------------------------------------
// Capture + recognition
// ---------------------------------------------------------------------------

/// One scripted listening attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Say(&'static str),
    SayIn(&'static str, &'static str),
    /// Nobody spoke before the timeout.
    Silence,
    /// Audio was captured but held no words.
    Mumble,
    ServiceFault,
    DeviceFault,
}

#[derive(Default)]
struct Script {
    steps: Mutex<VecDeque<Step>>,
    pending: Mutex<Option<Result<Transcript, RecognitionError>>>,
    captures: AtomicUsize,
    transcriptions: AtomicUsize,
}

pub(crate) struct ScriptedCapture(Arc<Script>);
pub(crate) struct ScriptedRecognizer(Arc<Script>);

#[derive(Clone)]
pub(crate) struct ScriptProbe(Arc<Script>);

impl ScriptProbe {
    pub(crate) fn captures(&self) -> usize {
        self.0.captures.load(Ordering::SeqCst)
    }

    pub(crate) fn transcriptions(&self) -> usize {
        self.0.transcriptions.load(Ordering::SeqCst)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.0.steps.lock().unwrap().len()
    }
}

pub(crate) fn scripted(
    steps: impl IntoIterator<Item = Step>,
) -> (ScriptedCapture, ScriptedRecognizer, ScriptProbe) {
    let script = Arc::new(Script {
        steps: Mutex::new(steps.into_iter().collect()),
        ..Script::default()
    });
    (
        ScriptedCapture(Arc::clone(&script)),
        ScriptedRecognizer(Arc::clone(&script)),
        ScriptProbe(script),
    )
}

impl AudioCapture for ScriptedCapture {
    fn capture_segment(&mut self, _timeout: Duration) -> Result<CaptureOutcome, CaptureError> {
        self.0.captures.fetch_add(1, Ordering::SeqCst);
        let step = self.0.steps.lock().unwrap().pop_front();

        let transcript = match step {
            None | Some(Step::Silence) => {
                thread::sleep(Duration::from_millis(2));
                return Ok(CaptureOutcome::Timeout);
            }
            Some(Step::DeviceFault) => return Err(CaptureError::StreamClosed),
            Some(Step::Say(text)) => Ok(Transcript::new(text)),
            Some(Step::SayIn(text, lang)) => Ok(Transcript::new(text).with_language(lang)),
            Some(Step::Mumble) => Err(RecognitionError::NoSpeech),
            Some(Step::ServiceFault) => Err(RecognitionError::Service("scripted fault".into())),
        };
        *self.0.pending.lock().unwrap() = Some(transcript);
        Ok(CaptureOutcome::Segment(AudioSegment::new(vec![0.0; 8_000])))
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn transcribe(&mut self, _segment: &AudioSegment) -> Result<Transcript, RecognitionError> {
        self.0.transcriptions.fetch_add(1, Ordering::SeqCst);
        self.0
            .pending
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(RecognitionError::NoSpeech))
    }
}

pub(crate) struct BrokenCapture;

impl AudioCapture for BrokenCapture {
    fn open(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::NoDevice)
    }

    fn capture_segment(&mut self, _: Duration) -> Result<CaptureOutcome, CaptureError> {
        Err(CaptureError::NoDevice)
    }
}

/// Opens fine, then panics on the first capture.
pub(crate) struct PanickingCapture;

impl AudioCapture for PanickingCapture {
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn capture_segment(&mut self, _: Duration) -> Result<CaptureOutcome, CaptureError> {
        panic!("microphone driver crashed")
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Everything a [`RecordingSynth`] finished speaking.
#[derive(Clone, Default)]
pub(crate) struct SpokenLog(Arc<Mutex<Vec<OutputPhrase>>>);

impl SpokenLog {
    pub(crate) fn phrases(&self) -> Vec<OutputPhrase> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.phrases().into_iter().map(|p| p.text).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Test-side handle for a gated synthesizer: observe each phrase as it
/// starts, then release it.
pub(crate) struct SynthGate {
    pub(crate) started: Receiver<String>,
    pub(crate) release: Sender<()>,
}

pub(crate) struct RecordingSynth {
    spoken: SpokenLog,
    gate: Option<(Sender<String>, Receiver<()>)>,
    fail_on: Option<&'static str>,
}

impl RecordingSynth {
    pub(crate) fn new() -> (Self, SpokenLog) {
        let spoken = SpokenLog::default();
        let synth = Self {
            spoken: spoken.clone(),
            gate: None,
            fail_on: None,
        };
        (synth, spoken)
    }

    /// Each `speak` blocks until the test sends on [`SynthGate::release`].
    pub(crate) fn gated() -> (Self, SpokenLog, SynthGate) {
        let (mut synth, spoken) = Self::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        synth.gate = Some((started_tx, release_rx));
        let gate = SynthGate {
            started: started_rx,
            release: release_tx,
        };
        (synth, spoken, gate)
    }

    pub(crate) fn failing_on(mut self, text: &'static str) -> Self {
        self.fail_on = Some(text);
        self
    }
}

impl SpeechSynthesizer for RecordingSynth {
    fn speak(&mut self, text: &str, language: Option<&str>) -> Result<(), SynthesisError> {
        if let Some((started, release)) = &self.gate {
            let _ = started.send(text.to_string());
            let _ = release.recv_timeout(WAIT_LIMIT);
        }
        if self.fail_on == Some(text) {
            return Err(SynthesisError::Failed("scripted failure".into()));
        }
        self.spoken.0.lock().unwrap().push(
            OutputPhrase::new(text).with_language(language.map(str::to_string)),
        );
        Ok(())
    }
}

pub(crate) struct BrokenSynth;

impl SpeechSynthesizer for BrokenSynth {
    fn open(&mut self) -> Result<(), SynthesisError> {
        Err(SynthesisError::Unavailable("no speech engine".into()))
    }

    fn speak(&mut self, _: &str, _: Option<&str>) -> Result<(), SynthesisError> {
        Err(SynthesisError::Unavailable("no speech engine".into()))
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Test-side handle for a gated lookup.
pub(crate) struct LookupGate {
    pub(crate) started: Receiver<String>,
    pub(crate) release: Sender<()>,
}

pub(crate) struct FakeLookup {
    response: Result<LookupOutcome, &'static str>,
    queries: Arc<Mutex<Vec<String>>>,
    gate: Option<(Sender<String>, Receiver<()>)>,
}

impl FakeLookup {
    pub(crate) fn answering(outcome: LookupOutcome) -> Self {
        Self {
            response: Ok(outcome),
            queries: Arc::default(),
            gate: None,
        }
    }

    /// Every query fails with [`LookupError::Transient`].
    pub(crate) fn failing(reason: &'static str) -> Self {
        Self {
            response: Err(reason),
            queries: Arc::default(),
            gate: None,
        }
    }

    pub(crate) fn gated(mut self) -> (Self, LookupGate) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.gate = Some((started_tx, release_rx));
        let gate = LookupGate {
            started: started_rx,
            release: release_tx,
        };
        (self, gate)
    }

    pub(crate) fn queries(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queries)
    }
}

impl KnowledgeLookup for FakeLookup {
    fn summarize(&mut self, query: &str) -> Result<LookupOutcome, LookupError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some((started, release)) = &self.gate {
            let _ = started.send(query.to_string());
            let _ = release.recv_timeout(WAIT_LIMIT);
        }
        self.response
            .clone()
            .map_err(|reason| LookupError::Transient(reason.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Marks text with the target language: `"[de] hello"`.
pub(crate) struct TaggingTranslator;

impl Translator for TaggingTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        Ok(format!("[{target}] {text}"))
    }
}

pub(crate) struct BrokenTranslator;

impl Translator for BrokenTranslator {
    fn translate(&self, _: &str, _: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Timeout)
    }
}
