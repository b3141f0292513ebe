//! Terminal implementations of the speech and confirmation collaborators.

use std::io::{self, BufRead, Write};
use std::process::Stdio;

use lingoflow_config::SpeechConfig;
use lingoflow_core::{Confirmer, Speaker};
use tracing::{debug, warn};

/// Speaks by spawning an external program, e.g. `espeak-ng -v {lang} {text}`
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `None` when speech is disabled or no program is configured
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let program = config.command.as_deref()?.trim();
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program, config.args.clone()))
    }

    /// Arguments with `{text}` and `{lang}` filled in
    pub fn render_args(&self, text: &str, lang: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{lang}", lang).replace("{text}", text))
            .collect()
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str, lang: &str) {
        let args = self.render_args(text, lang);
        debug!(program = %self.program, ?args, "speaking");
        let spawned = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            warn!("Failed to start speech program '{}': {}", self.program, e);
        }
    }
}

/// Asks on stderr and reads the answer from stdin
#[derive(Debug, Default)]
pub struct PromptConfirmer;

impl Confirmer for PromptConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
