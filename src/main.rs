//! Application entry point for the voice assistant.
//!
//! # Startup sequence
//!
//! 1. Parse the command line and initialise logging.
//! 2. Load [`AssistantConfig`] (defaults on first run) and apply CLI
//!    overrides.
//! 3. Build the collaborators: microphone, whisper model, speech engine,
//!    Wikipedia lookup, optional translator.
//! 4. [`Assistant::start`] spawns both loops.
//! 5. Accept `stop` / `exit` on stdin and Ctrl-C as extra controls.
//! 6. Block until shutdown is requested, then stop the loops.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use voice_assistant::{
    audio::CpalCapture,
    config::{AppPaths, AssistantConfig},
    knowledge::WikipediaLookup,
    pipeline::{Assistant, AssistantHandle, AssistantParts},
    present::ConsolePresenter,
    stt::{TranscribeParams, WhisperRecognizer},
    translate::{ApiTranslator, Translator},
    tts::ProcessSynthesizer,
};

/// Hands-free assistant: say "search <topic>", "stop" or "exit".
#[derive(Parser)]
#[command(name = "voice-assistant", version, about)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Whisper model name (e.g. "base.en") or path to a GGML file
    #[arg(short, long)]
    model: Option<String>,

    /// Recognition language code, or "auto" to detect it per utterance
    #[arg(short, long)]
    language: Option<String>,

    /// Translate replies into the language they were asked in
    #[arg(long)]
    translate: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the effective settings to the settings file and exit
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn settings_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppPaths::new().settings_file)
    }

    fn apply(&self, config: &mut AssistantConfig) {
        if let Some(model) = &self.model {
            config.stt.model = model.clone();
        }
        if let Some(language) = &self.language {
            config.stt.language = language.clone();
        }
        if self.translate {
            config.translate.enabled = true;
        }
    }
}

/// `model` is either a file on disk or a name resolved in the models dir.
fn model_path(model: &str) -> PathBuf {
    let as_path = Path::new(model);
    if as_path.is_file() {
        as_path.to_path_buf()
    } else {
        AppPaths::new().model_file(model)
    }
}

/// Read console commands until stdin closes.
fn spawn_console_controls(handle: AssistantHandle) -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.trim().to_lowercase().as_str() {
                    "" => {}
                    "stop" => handle.cancel_processing(),
                    "exit" | "quit" => {
                        handle.request_shutdown();
                        break;
                    }
                    other => log::info!("console: unknown command {other:?} (stop, exit)"),
                }
            }
            log::debug!("console: input closed");
        })
        .context("spawning console thread")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logging
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // 2. Configuration
    let settings_file = cli.settings_file();
    let mut config = AssistantConfig::load_from(&settings_file).unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e:#}); using defaults");
        AssistantConfig::default()
    });
    cli.apply(&mut config);

    if cli.write_config {
        config.save_to(&settings_file)?;
        println!("{}", settings_file.display());
        return Ok(());
    }

    // 3. Collaborators
    let model = model_path(&config.stt.model);
    let recognizer = WhisperRecognizer::load(&model, TranscribeParams::from_config(&config.stt))
        .with_context(|| format!("loading whisper model {}", model.display()))?;
    log::info!("Whisper model loaded: {}", model.display());

    let translator: Option<Arc<dyn Translator>> = if config.translate.enabled {
        log::info!("Translating replies via {}", config.translate.base_url);
        Some(Arc::new(ApiTranslator::from_config(&config.translate)))
    } else {
        None
    };

    let parts = AssistantParts {
        capture: Box::new(CpalCapture::new(config.capture.clone())),
        recognizer: Box::new(recognizer),
        synthesizer: Box::new(ProcessSynthesizer::new(config.tts.clone())),
        lookup: Box::new(WikipediaLookup::from_config(&config.lookup)),
        translator,
        presenter: Arc::new(ConsolePresenter),
    };

    // 4. Start
    let mut assistant = Assistant::start(parts, &config).context("starting assistant")?;

    // 5. Extra controls
    spawn_console_controls(assistant.handle())?;
    let signal = assistant.shutdown_signal();
    ctrlc::set_handler(move || signal.request()).context("installing Ctrl-C handler")?;

    // 6. Run until asked to stop
    assistant.wait_for_shutdown();
    assistant.stop();
    Ok(())
}
