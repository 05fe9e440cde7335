//! Knowledge lookup.
//!
//! [`KnowledgeLookup`] turns a spoken query into a short spoken answer.
//! Ambiguity and "no such page" are ordinary outcomes, not errors; only
//! transport-level trouble is reported as [`LookupError`].

pub mod wikipedia;

pub use wikipedia::{first_sentences, WikipediaLookup};

use thiserror::Error;

/// What a lookup found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// A short summary ready to be spoken.
    Summary(String),
    /// The query matches several topics; candidates in relevance order.
    Ambiguous(Vec<String>),
    NotFound,
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// The service could not be reached or answered with a server error.
    #[error("lookup service unavailable: {0}")]
    Transient(String),

    #[error("unexpected lookup response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LookupError::Parse(e.to_string())
        } else {
            LookupError::Transient(e.to_string())
        }
    }
}

/// Synchronous lookup, called on the recognition loop's thread.
pub trait KnowledgeLookup: Send {
    fn summarize(&mut self, query: &str) -> Result<LookupOutcome, LookupError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn KnowledgeLookup>) {}
};
