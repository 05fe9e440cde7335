//! Speech output loop.
//!
//! Drains the [`SpeechQueue`] one phrase at a time into the synthesizer.
//! A phrase that has started is always allowed to finish; once stop is
//! requested no new phrase starts and whatever is still queued is dropped.

use std::io;
use std::time::Duration;

use super::queue::SpeechQueue;
use super::state::{ShutdownSignal, StopSignal};
use super::worker::Worker;
use crate::tts::SpeechSynthesizer;

pub struct SpeechOutputLoop {
    synthesizer: Box<dyn SpeechSynthesizer>,
    queue: SpeechQueue,
    poll: Duration,
}

impl SpeechOutputLoop {
    /// `poll` bounds how long the loop waits on an empty queue before it
    /// re-checks the stop flag.
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, queue: SpeechQueue, poll: Duration) -> Self {
        Self {
            synthesizer,
            queue,
            poll,
        }
    }

    pub fn run(mut self, stop: &StopSignal) {
        log::info!("speaker: started");
        let mut spoken = 0usize;

        while !stop.is_requested() {
            let Some(phrase) = self.queue.pop_timeout(self.poll) else {
                continue;
            };
            if stop.is_requested() {
                log::debug!("speaker: stop requested, not starting {:?}", phrase.text);
                break;
            }

            log::debug!("speaker: speaking {:?}", phrase.text);
            match self
                .synthesizer
                .speak(&phrase.text, phrase.language.as_deref())
            {
                Ok(()) => spoken += 1,
                Err(e) => log::warn!("speaker: dropping phrase {:?}: {e}", phrase.text),
            }
        }

        let abandoned = self.queue.clear();
        if abandoned > 0 {
            log::info!("speaker: discarded {abandoned} queued phrase(s)");
        }
        log::info!("speaker: stopped after {spoken} phrase(s)");
    }

    pub fn spawn(self, stop: StopSignal) -> io::Result<Worker> {
        Worker::spawn("speaker", stop, move |stop| self.run(&stop))
    }

    pub fn spawn_supervised(
        self,
        stop: StopSignal,
        shutdown: ShutdownSignal,
    ) -> io::Result<Worker> {
        Worker::spawn_supervised("speaker", stop, shutdown, move |stop| self.run(&stop))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
