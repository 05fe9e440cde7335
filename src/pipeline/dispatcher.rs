//! Hands each utterance from the recognition loop to the processor.

use std::sync::Arc;

use super::grammar::{Command, CommandGrammar};
use super::listener::Utterance;
use super::processor::CommandProcessor;
use super::state::CommandOutcome;
use crate::present::Presenter;

pub struct Dispatcher {
    grammar: CommandGrammar,
    processor: CommandProcessor,
    presenter: Arc<dyn Presenter>,
}

impl Dispatcher {
    pub fn new(
        grammar: CommandGrammar,
        processor: CommandProcessor,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            grammar,
            processor,
            presenter,
        }
    }

    /// Show, classify and execute one utterance.  Runs to completion before
    /// returning, so utterances are handled strictly in arrival order.
    pub fn dispatch(&mut self, utterance: Utterance) -> CommandOutcome {
        self.presenter.present(&format!("You: {}", utterance.text));

        let command = self.grammar.classify(&utterance.text);
        if command == Command::Unrecognized {
            log::info!("dispatch: unrecognized {:?}", utterance.text);
        } else {
            log::debug!("dispatch: {:?} → {command:?}", utterance.text);
        }

        let outcome = self
            .processor
            .execute(command, utterance.language.as_deref());
        log::debug!("dispatch: command {}", outcome.label());
        outcome
    }
}
