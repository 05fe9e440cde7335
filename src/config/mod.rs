//! Configuration module for the voice assistant.
//!
//! Provides `AssistantConfig` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `AssistantConfig::load` / `AssistantConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AssistantConfig, CaptureConfig, GrammarConfig, LookupConfig, OutputConfig, SttConfig,
    TranslateConfig, TtsConfig,
};
