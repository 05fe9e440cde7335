//! LibreTranslate-compatible HTTP translator.
//!
//! `POST {base_url}/translate` with `{q, source: "auto", target, format,
//! api_key?}`; the answer carries `translatedText`.  The API key is sent only
//! when it is configured and non-empty.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{TranslateError, Translator};
use crate::config::TranslateConfig;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

pub struct ApiTranslator {
    client: Client,
    config: TranslateConfig,
}

impl ApiTranslator {
    pub fn from_config(config: &TranslateConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request<'a>(&'a self, text: &'a str, target: &'a str) -> TranslateRequest<'a> {
        TranslateRequest {
            q: text,
            source: "auto",
            target,
            format: "text",
            api_key: self.config.api_key.as_deref().filter(|k| !k.is_empty()),
        }
    }
}

impl Translator for ApiTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let url = format!("{}/translate", self.config.base_url.trim_end_matches('/'));

        let response: TranslateResponse = self
            .client
            .post(url)
            .json(&self.request(text, target))
            .send()?
            .error_for_status()?
            .json()?;

        let translated = response.translated_text.trim();
        if translated.is_empty() {
            return Err(TranslateError::Parse("empty translation".into()));
        }
        Ok(translated.to_string())
    }
}
