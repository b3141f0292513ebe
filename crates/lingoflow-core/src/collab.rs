//! Collaborator seams the core calls out to but does not implement.

use tracing::debug;

/// Fire-and-forget speech output
pub trait Speaker: Send + Sync {
    /// Speak `text` in `lang` (a BCP-47 tag such as `zh-CN`)
    fn speak(&self, text: &str, lang: &str);
}

/// Speaker that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn speak(&self, text: &str, lang: &str) {
        debug!("speech disabled, skipping [{}] {}", lang, text);
    }
}

/// Confirmation gate for destructive actions
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with a fixed reply
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl AutoConfirm {
    pub fn yes() -> Self {
        Self(true)
    }

    pub fn no() -> Self {
        Self(false)
    }
}

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
