//! Executes classified commands.
//!
//! The processor owns the knowledge lookup and runs on the recognition
//! thread.  Its output goes through the [`Announcer`]; its only other side
//! effects are the shared [`ProcessingState`] and, for `exit`, the
//! [`ShutdownSignal`].
//!
//! # Cancellation
//!
//! A lookup call cannot be interrupted.  Instead the processor re-reads the
//! processing state once the lookup returns: if someone cancelled in the
//! meantime, the result is dropped without a word.

use super::announce::Announcer;
use super::grammar::Command;
use super::state::{CommandOutcome, ProcessingState, ShutdownSignal};
use crate::knowledge::{KnowledgeLookup, LookupOutcome};

pub(crate) const CANCELLED: &str = "Processing stopped.";
pub(crate) const HELP: &str = "I'm sorry, I didn't understand that command. \
     You can say 'search' followed by a topic, or 'exit' to close the program.";
pub(crate) const EMPTY_QUERY: &str = "Please say 'search' followed by a topic.";

fn acknowledgement(query: &str) -> String {
    format!("Searching for {query}")
}

fn not_found(query: &str) -> String {
    format!("Sorry, I couldn't find any information about '{query}'.")
}

fn unavailable(query: &str) -> String {
    format!("Sorry, I couldn't search for '{query}' right now. Please try again later.")
}

fn ambiguous(query: &str, candidates: &[String], max: usize) -> String {
    let shown: Vec<&str> = candidates.iter().take(max).map(String::as_str).collect();
    if shown.is_empty() {
        return format!("There are multiple results for '{query}'. Please be more specific.");
    }
    format!(
        "There are multiple results for '{query}'. Possible matches: {}. Please be more specific.",
        shown.join(", ")
    )
}

pub struct CommandProcessor {
    announcer: Announcer,
    state: ProcessingState,
    lookup: Box<dyn KnowledgeLookup>,
    shutdown: ShutdownSignal,
    max_candidates: usize,
}

impl CommandProcessor {
    pub fn new(
        announcer: Announcer,
        state: ProcessingState,
        lookup: Box<dyn KnowledgeLookup>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            announcer,
            state,
            lookup,
            shutdown,
            max_candidates: 5,
        }
    }

    /// How many disambiguation candidates to read out.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Run `command`.  `language` is the language the command was spoken
    /// in; replies are adapted to it.
    pub fn execute(&mut self, command: Command, language: Option<&str>) -> CommandOutcome {
        match command {
            Command::Exit => {
                log::info!("processor: exit requested");
                self.state.cancel();
                self.shutdown.request();
                CommandOutcome::Exit
            }
            Command::Cancel => {
                if self.state.cancel() {
                    log::info!("processor: cancelled running command");
                }
                self.announcer.say(CANCELLED, language);
                CommandOutcome::Completed
            }
            Command::Lookup { query } => self.lookup(&query, language),
            Command::Unrecognized => {
                self.announcer.say(HELP, language);
                CommandOutcome::Completed
            }
        }
    }

    fn lookup(&mut self, query: &str, language: Option<&str>) -> CommandOutcome {
        if query.is_empty() {
            self.announcer.say(EMPTY_QUERY, language);
            return CommandOutcome::Completed;
        }

        self.state.begin();
        self.announcer.say(&acknowledgement(query), language);

        let result = self.lookup.summarize(query);

        if !self.state.is_active() {
            log::info!("processor: lookup for {query:?} cancelled, dropping result");
            return CommandOutcome::Cancelled;
        }

        let (reply, outcome) = match result {
            Ok(LookupOutcome::Summary(text)) => (text, CommandOutcome::Completed),
            Ok(LookupOutcome::Ambiguous(candidates)) => {
                log::info!(
                    "processor: {query:?} is ambiguous ({} candidates)",
                    candidates.len()
                );
                (
                    ambiguous(query, &candidates, self.max_candidates),
                    CommandOutcome::Completed,
                )
            }
            Ok(LookupOutcome::NotFound) => (not_found(query), CommandOutcome::Completed),
            Err(e) => {
                log::warn!("processor: lookup for {query:?} failed: {e}");
                (unavailable(query), CommandOutcome::Failed)
            }
        };

        self.announcer.say(&reply, language);
        self.state.finish();
        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
