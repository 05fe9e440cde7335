//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the loop
//! threads by value.  Every section is `#[serde(default)]`, so a settings
//! file only needs the keys it wants to change.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and segment endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds to wait for speech to begin before a capture attempt gives up
    /// (a timeout is not an error; the loop simply tries again).
    pub timeout_secs: f32,
    /// Maximum length of a single spoken phrase in seconds.
    pub phrase_limit_secs: f32,
    /// Seconds of trailing silence that end a phrase.
    pub pause_secs: f32,
    /// RMS amplitude above which a frame counts as speech.
    pub energy_threshold: f32,
    /// Input device name; `None` means the system default.
    pub device: Option<String>,
    /// Delay before retrying after the capture device itself failed.
    pub retry_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5.0,
            phrase_limit_secs: 5.0,
            pause_secs: 0.8,
            energy_threshold: 0.01,
            device: None,
            retry_delay_ms: 100,
        }
    }
}

/// Longest wait any capture setting may ask for.
const MAX_CAPTURE_SECS: f32 = 3_600.0;

/// Negative, NaN and out-of-range values from a hand-edited file must not
/// panic inside `Duration`.
fn capture_secs(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.clamp(0.0, MAX_CAPTURE_SECS)).unwrap_or(Duration::ZERO)
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        capture_secs(self.timeout_secs)
    }

    pub fn phrase_limit(&self) -> Duration {
        capture_secs(self.phrase_limit_secs)
    }

    pub fn pause(&self) -> Duration {
        capture_secs(self.pause_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the whisper speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// GGML model name (e.g. `"base.en"`), resolved under the models dir.
    pub model: String,
    /// Spoken language as an ISO-639-1 code, or `"auto"` for whisper's
    /// built-in language identification.
    pub language: String,
    /// Attempt GPU-accelerated inference when available.
    pub use_gpu: bool,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "base.en".into(),
            language: "en".into(),
            use_gpu: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the external text-to-speech program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Program invoked once per phrase; must accept espeak-style flags.
    pub program: String,
    /// Voice used when a phrase carries no language tag.
    pub voice: String,
    /// Speaking rate.
    pub words_per_minute: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            voice: "en".into(),
            words_per_minute: 175,
        }
    }
}

// ---------------------------------------------------------------------------
// LookupConfig
// ---------------------------------------------------------------------------

/// Settings for the Wikipedia knowledge lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Wiki root, e.g. `https://en.wikipedia.org`.
    pub base_url: String,
    /// Number of sentences kept from a page summary.
    pub sentences: usize,
    /// Maximum number of disambiguation candidates read back to the user.
    pub max_candidates: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Wikimedia asks API clients to identify themselves.
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".into(),
            sentences: 2,
            max_candidates: 5,
            timeout_secs: 10,
            user_agent: concat!("voice-assistant/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TranslateConfig
// ---------------------------------------------------------------------------

/// Settings for translating responses into the speaker's language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Whether responses are translated at all.
    pub enabled: bool,
    /// Root of a LibreTranslate-compatible server.
    pub base_url: String,
    /// API key; `None` for self-hosted servers.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Language the assistant's own phrases are written in.
    pub base_language: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:5000".into(),
            api_key: None,
            timeout_secs: 10,
            base_language: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GrammarConfig
// ---------------------------------------------------------------------------

/// Keyword table used to classify utterances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub exit_keywords: Vec<String>,
    /// Verbs that start a lookup; they are stripped to form the query.
    pub lookup_keywords: Vec<String>,
    pub cancel_keywords: Vec<String>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            exit_keywords: vec!["exit".into()],
            lookup_keywords: vec!["search".into(), "lookup".into()],
            cancel_keywords: vec!["stop".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Speech output loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How long the output loop waits on an empty queue before re-checking
    /// its stop flag.
    pub poll_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { poll_ms: 1_000 }
    }
}

impl OutputConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// AssistantConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_assistant::config::AssistantConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AssistantConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub capture: CaptureConfig,
    pub stt: SttConfig,
    pub tts: TtsConfig,
    pub lookup: LookupConfig,
    pub translate: TranslateConfig,
    pub grammar: GrammarConfig,
    pub output: OutputConfig,
}

impl AssistantConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AssistantConfig::default())` when the file does not exist
    /// yet, so callers never need to special-case a first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AssistantConfig::load_from(&path).expect("should not error");

        assert_eq!(config.stt.model, "base.en");
        assert_eq!(config.lookup.max_candidates, 5);
        assert_eq!(config.output.poll_ms, 1_000);
    }

    #[test]
    fn out_of_range_capture_durations_are_clamped() {
        let cfg: AssistantConfig = toml::from_str(
            "[capture]\ntimeout_secs = inf\nphrase_limit_secs = -2.0\npause_secs = nan\n",
        )
        .expect("valid toml");

        assert_eq!(cfg.capture.timeout(), Duration::from_secs(3_600));
        assert_eq!(cfg.capture.phrase_limit(), Duration::ZERO);
        assert_eq!(cfg.capture.pause(), Duration::ZERO);
    }

    #[test]
    fn default_values() {
        let cfg = AssistantConfig::default();

        assert_eq!(cfg.capture.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.capture.retry_delay(), Duration::from_millis(100));
        assert_eq!(cfg.stt.language, "en");
        assert_eq!(cfg.tts.program, "espeak-ng");
        assert_eq!(cfg.lookup.base_url, "https://en.wikipedia.org");
        assert_eq!(cfg.lookup.sentences, 2);
        assert!(!cfg.translate.enabled);
        assert_eq!(cfg.grammar.lookup_keywords, vec!["search", "lookup"]);
        assert_eq!(cfg.grammar.exit_keywords, vec!["exit"]);
        assert_eq!(cfg.grammar.cancel_keywords, vec!["stop"]);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AssistantConfig::default();
        cfg.capture.device = Some("USB Mic".into());
        cfg.stt.language = "auto".into();
        cfg.translate.enabled = true;
        cfg.translate.api_key = Some("key".into());
        cfg.grammar.lookup_keywords.push("define".into());
        cfg.output.poll_ms = 250;

        cfg.save_to(&path).expect("save");
        let loaded = AssistantConfig::load_from(&path).expect("load");

        assert_eq!(loaded.capture.device.as_deref(), Some("USB Mic"));
        assert_eq!(loaded.stt.language, "auto");
        assert!(loaded.translate.enabled);
        assert_eq!(loaded.translate.api_key.as_deref(), Some("key"));
        assert_eq!(
            loaded.grammar.lookup_keywords,
            vec!["search", "lookup", "define"]
        );
        assert_eq!(loaded.output.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[tts]\nvoice = \"de\"\n").expect("write");

        let loaded = AssistantConfig::load_from(&path).expect("load");

        assert_eq!(loaded.tts.voice, "de");
        assert_eq!(loaded.tts.program, "espeak-ng");
        assert_eq!(loaded.lookup.sentences, 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[capture\ntimeout_secs = ").expect("write");

        assert!(AssistantConfig::load_from(&path).is_err());
    }
}
