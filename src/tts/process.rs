//! Text-to-speech through an external espeak-compatible program.
//!
//! Each phrase runs the program to completion (`espeak-ng -v <voice> -s
//! <wpm> <text>`), so [`SpeechSynthesizer::speak`] returns only once the
//! audio has been played.

use std::io::ErrorKind;
use std::process::{Command, Stdio};

use super::{SpeechSynthesizer, SynthesisError};
use crate::config::TtsConfig;

#[derive(Debug, Clone)]
pub struct ProcessSynthesizer {
    config: TtsConfig,
}

impl ProcessSynthesizer {
    pub fn new(config: TtsConfig) -> Self {
        Self { config }
    }

    /// Arguments for one invocation, excluding the program name.
    fn args(&self, text: &str, language: Option<&str>) -> Vec<String> {
        let voice = language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.config.voice);
        vec![
            "-v".into(),
            voice.to_string(),
            "-s".into(),
            self.config.words_per_minute.to_string(),
            // A leading dash would be parsed as an option.
            text.trim().trim_start_matches('-').to_string(),
        ]
    }
}

impl SpeechSynthesizer for ProcessSynthesizer {
    fn open(&mut self) -> Result<(), SynthesisError> {
        let probe = Command::new(&self.config.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match probe {
            Ok(_) => {
                log::info!("tts: using {}", self.config.program);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SynthesisError::Unavailable(
                format!("{} is not installed", self.config.program),
            )),
            Err(e) => Err(SynthesisError::Unavailable(e.to_string())),
        }
    }

    fn speak(&mut self, text: &str, language: Option<&str>) -> Result<(), SynthesisError> {
        let status = Command::new(&self.config.program)
            .args(self.args(text, language))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| SynthesisError::Failed(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(SynthesisError::Failed(format!(
                "{} exited with {status}",
                self.config.program
            )))
        }
    }
}
