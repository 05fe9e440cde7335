//! Wikipedia-backed [`KnowledgeLookup`].
//!
//! Two requests per query:
//!
//! 1. `GET /w/api.php?action=opensearch`: best-matching page titles.
//! 2. `GET /api/rest_v1/page/summary/{title}`: lead extract of the best
//!    title, or a `disambiguation` marker.
//!
//! All connection details come from [`LookupConfig`].

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{KnowledgeLookup, LookupError, LookupOutcome};
use crate::config::LookupConfig;

const SEARCH_LIMIT: &str = "10";

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    extract: String,
}

pub struct WikipediaLookup {
    client: Client,
    config: LookupConfig,
}

impl WikipediaLookup {
    /// Build a lookup client from config.  A default client is used if the
    /// configured builder is rejected.
    pub fn from_config(config: &LookupConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn search_titles(&self, query: &str) -> Result<Vec<String>, LookupError> {
        let url = format!("{}/w/api.php", self.config.base_url.trim_end_matches('/'));
        let json: serde_json::Value = self
            .client
            .get(url)
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", SEARCH_LIMIT),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        parse_opensearch(&json)
    }

    fn page_summary(&self, title: &str) -> Result<Option<PageSummary>, LookupError> {
        let mut url =
            Url::parse(&self.config.base_url).map_err(|e| LookupError::Parse(e.to_string()))?;
        let path_title = title.replace(' ', "_");
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| LookupError::Parse("base_url cannot hold a path".into()))?;
            segments.pop_if_empty().extend([
                "api",
                "rest_v1",
                "page",
                "summary",
                path_title.as_str(),
            ]);
        }

        let response = self.client.get(url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json()?))
    }
}

impl KnowledgeLookup for WikipediaLookup {
    fn summarize(&mut self, query: &str) -> Result<LookupOutcome, LookupError> {
        let titles = self.search_titles(query)?;
        let Some(best) = titles.first() else {
            log::debug!("lookup: no titles for {query:?}");
            return Ok(LookupOutcome::NotFound);
        };

        log::debug!("lookup: {query:?} → {best:?}");
        Ok(match self.page_summary(best)? {
            Some(page) => interpret(page, &titles, self.config.sentences),
            None => LookupOutcome::NotFound,
        })
    }
}

/// Titles from an opensearch response: `[query, [titles], [descriptions], [urls]]`.
fn parse_opensearch(json: &serde_json::Value) -> Result<Vec<String>, LookupError> {
    let titles = json
        .get(1)
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| LookupError::Parse("opensearch response has no title list".into()))?;

    Ok(titles
        .iter()
        .filter_map(serde_json::Value::as_str)
        .map(str::to_string)
        .collect())
}

fn interpret(page: PageSummary, titles: &[String], sentences: usize) -> LookupOutcome {
    if page.kind == "disambiguation" {
        let candidates: Vec<String> = titles
            .iter()
            .skip(1)
            .filter(|t| !t.ends_with("(disambiguation)"))
            .cloned()
            .collect();
        return LookupOutcome::Ambiguous(candidates);
    }

    let extract = page.extract.trim();
    if extract.is_empty() {
        return LookupOutcome::NotFound;
    }
    LookupOutcome::Summary(first_sentences(extract, sentences))
}

/// The first `n` sentences of `text`.  A sentence ends at `.`, `!` or `?`
/// followed by whitespace or the end of the text.
///
/// ```
/// use voice_assistant::knowledge::first_sentences;
///
/// let text = "The Moon orbits Earth. It is 3.5 billion years old. It has no air.";
/// assert_eq!(
///     first_sentences(text, 2),
///     "The Moon orbits Earth. It is 3.5 billion years old."
/// );
/// ```
pub fn first_sentences(text: &str, n: usize) -> String {
    let text = text.trim();
    if n == 0 {
        return String::new();
    }

    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if at_boundary {
            seen += 1;
            if seen == n {
                return text[..i + c.len_utf8()].to_string();
            }
        }
    }
    text.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
