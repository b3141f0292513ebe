use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use lingoflow_config::{AuthSettings, Config, DrillConfig, ProviderSettings};
use lingoflow_core::{AutoConfirm, Confirmer, Session, Term};
use lingoflow_drill::DrillTiming;
use lingoflow_llm::{build_provider, AuthConfig, LLMProvider, ProviderConfig};
use lingoflow_session::{JsonFileStore, JsonFileStoreConfig, MemoryStore, SessionManager, SessionStore};
use tracing::info;

use crate::collab::PromptConfirmer;

/// Everything a command needs: loaded config, session manager, confirmer
pub struct App {
    pub config: Config,
    pub sessions: SessionManager,
    confirmer: Box<dyn Confirmer>,
}

impl App {
    /// With `ephemeral`, notebooks are read from disk but changes stay in memory
    pub async fn load(
        config: Config,
        assume_yes: bool,
        ephemeral: bool,
    ) -> anyhow::Result<Self> {
        let store_config = JsonFileStoreConfig::new(&config.storage.path)
            .with_storage_key(&config.storage.key);
        let file_store = JsonFileStore::new(store_config)
            .await
            .context("failed to open session store")?;

        let store: Arc<dyn SessionStore> = if ephemeral {
            let existing = file_store.load().await?;
            info!("Ephemeral run, {} notebooks loaded into memory", existing.len());
            Arc::new(MemoryStore::with_sessions(&existing)?)
        } else {
            Arc::new(file_store)
        };
        let sessions = SessionManager::init(store).await?;

        let confirmer: Box<dyn Confirmer> = if assume_yes {
            Box::new(AutoConfirm::yes())
        } else {
            Box::new(PromptConfirmer)
        };

        Ok(Self {
            config,
            sessions,
            confirmer,
        })
    }

    pub fn confirmer(&self) -> &dyn Confirmer {
        self.confirmer.as_ref()
    }

    /// Resolve a session id or unique prefix and mark it active
    pub fn open(&self, id: &str) -> anyhow::Result<Session> {
        let session = self.sessions.resolve(id)?;
        Ok(self.sessions.open(&session.id)?)
    }

    /// Provider for the configured default
    pub fn provider(&self) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let name = &self.config.llm.default_provider;
        let settings = self
            .config
            .default_provider()
            .ok_or_else(|| anyhow!("provider '{}' is not configured", name))?;
        if !settings.enabled {
            return Err(anyhow!("provider '{}' is disabled", name));
        }
        Ok(build_provider(provider_config(name, settings)?)?)
    }

    pub fn drill_timing(&self) -> DrillTiming {
        drill_timing(&self.config.drill, &self.config.speech.lang)
    }
}

/// Translate stored provider settings into a client config
pub fn provider_config(name: &str, settings: &ProviderSettings) -> anyhow::Result<ProviderConfig> {
    let mut config = ProviderConfig::new(name, &settings.base_url);
    if let Some(model) = &settings.model {
        config = config.with_model(model);
    }
    if let Some(secs) = settings.timeout_seconds {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    for (key, value) in settings.headers.iter().flatten() {
        config = config.with_header(key, value);
    }

    config = match &settings.auth {
        AuthSettings::ApiKey { env } => config.with_api_key(
            settings
                .auth
                .get_api_key()
                .ok_or_else(|| anyhow!("environment variable {} is not set", env))?,
        ),
        AuthSettings::Bearer { env } => config.with_bearer_token(
            settings
                .auth
                .get_bearer_token()
                .ok_or_else(|| anyhow!("environment variable {} is not set", env))?,
        ),
        AuthSettings::None => {
            config.auth = AuthConfig::None;
            config
        }
    };
    Ok(config)
}

pub fn drill_timing(config: &DrillConfig, lang: &str) -> DrillTiming {
    let mut timing = DrillTiming::default()
        .with_countdown(config.countdown_from, Duration::from_millis(config.countdown_step_ms))
        .with_card_duration(Duration::from_millis(config.card_duration_ms))
        .with_reveal_hold(Duration::from_millis(config.reveal_hold_ms))
        .with_speech_lang(lang);
    timing.frame_interval = Duration::from_millis(config.frame_interval_ms);
    timing
}

/// Find a term by id or unique id prefix
pub fn resolve_term<'a>(session: &'a Session, prefix: &str) -> anyhow::Result<&'a Term> {
    let prefix = prefix.trim();
    if let Some(term) = session.term(prefix) {
        return Ok(term);
    }
    let matches: Vec<&Term> = session
        .terms
        .iter()
        .filter(|t| !prefix.is_empty() && t.id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [single] => Ok(single),
        [] => Err(anyhow!("no term matches '{}'", prefix)),
        many => Err(anyhow!("'{}' matches {} terms", prefix, many.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingoflow_config::LlmConfig;

    #[test]
    fn test_provider_config_reads_key_from_env() {
        std::env::set_var("LINGOFLOW_CLI_TEST_KEY", "secret");
        let mut settings = LlmConfig::default().providers["gemini"].clone();
        settings.auth = AuthSettings::ApiKey {
            env: "LINGOFLOW_CLI_TEST_KEY".into(),
        };
        settings.timeout_seconds = Some(30);

        let config = provider_config("gemini", &settings).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(matches!(config.auth, AuthConfig::ApiKey { ref key, .. } if key == "secret"));
    }

    #[test]
    fn test_provider_config_missing_env() {
        let mut settings = LlmConfig::default().providers["gemini"].clone();
        settings.auth = AuthSettings::ApiKey {
            env: "LINGOFLOW_CLI_UNSET_KEY".into(),
        };
        let err = provider_config("gemini", &settings).unwrap_err();
        assert!(err.to_string().contains("LINGOFLOW_CLI_UNSET_KEY"));
    }

    #[test]
    fn test_drill_timing_from_config() {
        let mut config = DrillConfig::default();
        config.card_duration_ms = 2500;
        config.frame_interval_ms = 40;
        let timing = drill_timing(&config, "zh-TW");
        assert_eq!(timing.card_duration, Duration::from_millis(2500));
        assert_eq!(timing.frame_interval, Duration::from_millis(40));
        assert_eq!(timing.speech_lang, "zh-TW");
        assert_eq!(timing.countdown_from, 3);
    }

    #[tokio::test]
    async fn test_ephemeral_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.path = dir.path().to_string_lossy().into_owned();
        let file = dir.path().join("lingoflow_sessions.json");

        let app = App::load(config.clone(), true, true).await.unwrap();
        app.sessions.create("Scratch", vec![], vec![]).await.unwrap();
        assert!(!file.exists());

        let app = App::load(config, true, false).await.unwrap();
        assert!(app.sessions.is_empty());
        app.sessions.create("Kept", vec![], vec![]).await.unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_resolve_term_by_prefix() {
        let mut session = Session::new("t", vec![], vec![]);
        let mut a = Term::new("a", "甲", "d");
        a.id = "abc-1".into();
        let mut b = Term::new("b", "乙", "d");
        b.id = "abd-2".into();
        session.terms = vec![a, b];

        assert_eq!(resolve_term(&session, "abc").unwrap().english, "a");
        assert!(resolve_term(&session, "ab").is_err());
        assert!(resolve_term(&session, "zz").is_err());
    }
}
