//! Producer side of the speech queue.
//!
//! [`Announcer`] is what everything else uses to say something: it
//! localizes the phrase into the listener's language when a translator is
//! configured, shows it to the user and enqueues it for the speaker.

use std::sync::Arc;

use super::queue::{OutputPhrase, SpeechQueue};
use crate::present::Presenter;
use crate::translate::Translator;

#[derive(Clone)]
pub struct Announcer {
    queue: SpeechQueue,
    presenter: Arc<dyn Presenter>,
    translator: Option<Arc<dyn Translator>>,
    base_language: String,
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("queue", &self.queue)
            .field("translates", &self.translator.is_some())
            .field("base_language", &self.base_language)
            .finish()
    }
}

/// Compare primary language subtags: `"en-US"` and `"EN"` are the same.
fn same_language(a: &str, b: &str) -> bool {
    let primary = |tag: &str| tag.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
    primary(a) == primary(b)
}

impl Announcer {
    pub fn new(queue: SpeechQueue, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            queue,
            presenter,
            translator: None,
            base_language: "en".into(),
        }
    }

    /// Translate phrases from `base_language` into the utterance's language
    /// whenever the two differ.
    pub fn with_translator(
        mut self,
        translator: Option<Arc<dyn Translator>>,
        base_language: impl Into<String>,
    ) -> Self {
        self.translator = translator;
        self.base_language = base_language.into();
        self
    }

    /// Enqueue `text`, adapted to `language` if possible, and present it.
    ///
    /// Returns `false` when the queue has been closed; the phrase is then
    /// neither spoken nor shown.
    pub fn say(&self, text: &str, language: Option<&str>) -> bool {
        let phrase = self.localize(text, language);
        let line = format!("Assistant: {}", phrase.text);
        if !self.queue.push(phrase) {
            log::debug!("announce: queue closed, dropping {line:?}");
            return false;
        }
        self.presenter.present(&line);
        true
    }

    /// The phrase is only tagged with a language it is actually written in,
    /// so the synthesizer never reads English text with a foreign voice.
    fn localize(&self, text: &str, language: Option<&str>) -> OutputPhrase {
        let Some(target) = language else {
            return OutputPhrase::new(text);
        };
        if same_language(target, &self.base_language) {
            return OutputPhrase::new(text).with_language(Some(target.to_string()));
        }
        let Some(translator) = &self.translator else {
            return OutputPhrase::new(text);
        };

        match translator.translate(text, target) {
            Ok(translated) if !translated.trim().is_empty() => {
                OutputPhrase::new(translated).with_language(Some(target.to_string()))
            }
            Ok(_) => {
                log::warn!("announce: empty translation into {target}, using original");
                OutputPhrase::new(text)
            }
            Err(e) => {
                log::warn!("announce: translation into {target} failed: {e}");
                OutputPhrase::new(text)
            }
        }
    }

    pub fn queue(&self) -> &SpeechQueue {
        &self.queue
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fakes::{BrokenTranslator, TaggingTranslator};
    use crate::present::RecordingPresenter;

    fn announcer(translator: Option<Arc<dyn Translator>>) -> (Announcer, Arc<RecordingPresenter>) {
        let presenter = Arc::new(RecordingPresenter::new());
        let announcer = Announcer::new(SpeechQueue::new(), presenter.clone())
            .with_translator(translator, "en");
        (announcer, presenter)
    }

    #[test]
    fn say_presents_and_enqueues() {
        let (announcer, presenter) = announcer(None);
        assert!(announcer.say("Hello", None));

        assert_eq!(presenter.lines(), ["Assistant: Hello"]);
        assert_eq!(announcer.queue().snapshot(), [OutputPhrase::new("Hello")]);
    }

    #[test]
    fn closed_queue_refuses_phrase_without_showing_it() {
        let (announcer, presenter) = announcer(None);
        announcer.queue().close();
        assert!(!announcer.say("Hello", None));
        assert!(announcer.queue().is_empty());
        assert!(presenter.lines().is_empty());
    }

    #[test]
    fn foreign_utterance_gets_translated_reply() {
        let (announcer, presenter) = announcer(Some(Arc::new(TaggingTranslator)));
        announcer.say("Processing stopped.", Some("de"));

        let queued = announcer.queue().snapshot();
        assert_eq!(queued[0].text, "[de] Processing stopped.");
        assert_eq!(queued[0].language.as_deref(), Some("de"));
        assert_eq!(presenter.lines(), ["Assistant: [de] Processing stopped."]);
    }

    #[test]
    fn base_language_is_not_translated() {
        let (announcer, _) = announcer(Some(Arc::new(TaggingTranslator)));
        announcer.say("Hello", Some("en-GB"));

        let queued = announcer.queue().snapshot();
        assert_eq!(queued[0].text, "Hello");
        assert_eq!(queued[0].language.as_deref(), Some("en-GB"));
    }

    #[test]
    fn failed_translation_falls_back_untagged() {
        let (announcer, _) = announcer(Some(Arc::new(BrokenTranslator)));
        announcer.say("Hello", Some("fr"));
        assert_eq!(announcer.queue().snapshot(), [OutputPhrase::new("Hello")]);
    }

    #[test]
    fn without_translator_foreign_tag_is_dropped() {
        let (announcer, _) = announcer(None);
        announcer.say("Hello", Some("fr"));
        assert_eq!(announcer.queue().snapshot(), [OutputPhrase::new("Hello")]);
    }

    #[test]
    fn language_comparison_uses_primary_subtag() {
        assert!(same_language("en", "EN"));
        assert!(same_language("en-US", "en_GB"));
        assert!(!same_language("de", "en"));
    }
}
