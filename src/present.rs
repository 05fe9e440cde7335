//! User-facing transcript of the conversation.
//!
//! Every heard utterance and every assistant reply is shown as one line
//! (`"You: …"`, `"Assistant: …"`).  Presentation is fire-and-forget: a
//! presenter never fails and never blocks the caller for long.

use std::io::Write;
#[cfg(test)]
use std::sync::{Mutex, PoisonError};

pub trait Presenter: Send + Sync {
    fn present(&self, line: &str);
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Presenter>) {}
};

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn present(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the assistant down with it.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Keeps every presented line in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPresenter {
    lines: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingPresenter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
impl Presenter for RecordingPresenter {
    fn present(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}
