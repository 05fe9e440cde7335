//! Keyword grammar that turns an utterance into a [`Command`].
//!
//! Matching is case-insensitive and whole-word: `"stop"` matches
//! "please stop" but not "stopwatch".  A keyword may span several words
//! ("look up").  When an utterance contains keywords of more than one
//! kind, the first kind in this order wins:
//!
//! 1. exit
//! 2. lookup
//! 3. cancel
//!
//! For a lookup, the query is the utterance with every lookup keyword
//! removed, lowercased and re-joined with single spaces.

use crate::config::GrammarConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Lookup { query: String },
    Cancel,
    Unrecognized,
}

/// Lowercased words of `text`, split on anything but letters, digits and
/// apostrophes.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Keyword(Vec<String>);

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let words = words(raw);
        (!words.is_empty()).then_some(Self(words))
    }

    fn matches_at(&self, tokens: &[String], at: usize) -> bool {
        tokens
            .get(at..at + self.0.len())
            .is_some_and(|window| window == self.0.as_slice())
    }

    fn occurs_in(&self, tokens: &[String]) -> bool {
        (0..tokens.len()).any(|i| self.matches_at(tokens, i))
    }
}

#[derive(Debug, Clone)]
pub struct CommandGrammar {
    exit: Vec<Keyword>,
    lookup: Vec<Keyword>,
    cancel: Vec<Keyword>,
}

impl Default for CommandGrammar {
    fn default() -> Self {
        Self::from_config(&GrammarConfig::default())
    }
}

impl CommandGrammar {
    /// Blank keywords are ignored.
    pub fn from_config(config: &GrammarConfig) -> Self {
        let parse = |list: &[String]| list.iter().filter_map(|k| Keyword::parse(k)).collect();
        Self {
            exit: parse(&config.exit_keywords),
            lookup: parse(&config.lookup_keywords),
            cancel: parse(&config.cancel_keywords),
        }
    }

    pub fn classify(&self, text: &str) -> Command {
        let tokens = words(text);
        let any = |set: &[Keyword]| set.iter().any(|k| k.occurs_in(&tokens));

        if any(&self.exit) {
            Command::Exit
        } else if any(&self.lookup) {
            Command::Lookup {
                query: self.strip_lookup_keywords(&tokens),
            }
        } else if any(&self.cancel) {
            Command::Cancel
        } else {
            Command::Unrecognized
        }
    }

    fn strip_lookup_keywords(&self, tokens: &[String]) -> String {
        let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match self.lookup.iter().find(|k| k.matches_at(tokens, i)) {
                Some(keyword) => i += keyword.0.len(),
                None => {
                    kept.push(&tokens[i]);
                    i += 1;
                }
            }
        }
        kept.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
