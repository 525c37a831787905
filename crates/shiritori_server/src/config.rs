//! Server configuration.
//!
//! Game and opponent settings come from an optional TOML file. API keys are
//! only ever read from the environment.

use crate::llm_client::{LlmClient, LlmConfig, LlmProvider};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use shiritori::{FallbackDictionary, MAX_TURNS, OpponentMoveProvider, Referee};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding the Gemini model.
pub const GEMINI_MODEL_VAR: &str = "GEMINI_MODEL";

/// Top-level server configuration.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Player moves allowed per game.
    #[serde(default = "default_max_turns")]
    #[getter(copy)]
    max_turns: u32,

    /// Generative opponent settings.
    #[serde(default)]
    opponent: OpponentConfig,

    /// TOML file replacing the built-in fallback dictionary.
    #[serde(default)]
    fallback_dictionary: Option<PathBuf>,
}

/// Generative opponent settings.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct OpponentConfig {
    /// Provider to call; unset means fallback only, unless a Gemini key is present.
    #[serde(default)]
    provider: Option<LlmProvider>,

    /// Model name; unset means the provider's default.
    #[serde(default)]
    model: Option<String>,

    /// Maximum tokens per reply.
    #[serde(default = "default_max_tokens")]
    #[getter(copy)]
    max_tokens: u32,

    /// Seconds allowed for one call.
    #[serde(default = "default_timeout_secs")]
    #[getter(copy)]
    timeout_secs: u64,
}

fn default_max_turns() -> u32 {
    MAX_TURNS
}

fn default_max_tokens() -> u32 {
    32
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            opponent: OpponentConfig::default(),
            fallback_dictionary: None,
        }
    }
}

impl ServerConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!(max_turns = config.max_turns, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolves the LLM configuration from the process environment.
    pub fn llm_config(&self) -> Option<LlmConfig> {
        self.llm_config_with(|var| std::env::var(var).ok())
    }

    /// Resolves the LLM configuration using `env` for variable lookup.
    ///
    /// Returns `None` when the opponent should run on the fallback
    /// dictionary alone.
    #[instrument(skip(self, env), fields(provider = ?self.opponent.provider))]
    pub fn llm_config_with<F>(&self, env: F) -> Option<LlmConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| env(var).filter(|v| !v.trim().is_empty());

        let provider = match self.opponent.provider {
            Some(provider) => provider,
            None if lookup(LlmProvider::Gemini.api_key_var()).is_some() => {
                debug!("Gemini key found, selecting Gemini");
                LlmProvider::Gemini
            }
            None => {
                info!("No opponent provider configured");
                return None;
            }
        };

        let Some(api_key) = lookup(provider.api_key_var()) else {
            warn!(
                provider = %provider,
                var = provider.api_key_var(),
                "API key not set, running on fallback dictionary only"
            );
            return None;
        };

        let model = match (&self.opponent.model, provider) {
            (Some(model), _) => model.clone(),
            (None, LlmProvider::Gemini) => lookup(GEMINI_MODEL_VAR)
                .unwrap_or_else(|| provider.default_model().to_string()),
            (None, _) => provider.default_model().to_string(),
        };

        Some(LlmConfig::new(
            provider,
            api_key,
            model,
            self.opponent.max_tokens,
        ))
    }

    /// Loads the fallback dictionary, built-in unless a file is configured.
    #[instrument(skip(self))]
    pub fn fallback(&self) -> Result<FallbackDictionary, ConfigError> {
        match &self.fallback_dictionary {
            Some(path) => FallbackDictionary::from_file(path).map_err(|e| {
                ConfigError::new(format!("Failed to load fallback dictionary: {}", e))
            }),
            None => Ok(FallbackDictionary::builtin()),
        }
    }

    /// Builds a referee from an already resolved LLM configuration.
    #[instrument(skip(self, llm))]
    pub fn referee_with(&self, llm: Option<LlmConfig>) -> Result<Referee, ConfigError> {
        let mut provider = OpponentMoveProvider::new(Arc::new(self.fallback()?))
            .with_timeout(Duration::from_secs(self.opponent.timeout_secs));
        if let Some(llm) = llm {
            provider = provider.with_primary(Arc::new(LlmClient::new(llm)));
        }
        Ok(Referee::new(provider).with_max_turns(self.max_turns))
    }

    /// Builds the referee described by this configuration and the environment.
    pub fn referee(&self) -> Result<Referee, ConfigError> {
        self.referee_with(self.llm_config())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_turns(), 20);
        assert_eq!(config.opponent().provider(), &None);
        assert_eq!(config.opponent().max_tokens(), 32);
        assert_eq!(config.opponent().timeout_secs(), 10);
        assert!(config.fallback_dictionary().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ServerConfig::from_toml_str(
            r#"
            max_turns = 5
            fallback_dictionary = "words.toml"

            [opponent]
            provider = "anthropic"
            model = "claude-3-5-sonnet-latest"
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.max_turns(), 5);
        assert_eq!(config.opponent().provider(), &Some(LlmProvider::Anthropic));
        assert_eq!(config.opponent().max_tokens(), 32);
        assert_eq!(config.opponent().timeout_secs(), 3);
        assert_eq!(
            config.fallback_dictionary().as_deref(),
            Some(Path::new("words.toml"))
        );
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = ServerConfig::from_toml_str("[opponent]\nprovider = \"cohere\"").unwrap_err();
        assert!(err.message.contains("Failed to parse config"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.max_turns(), 20);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_turns = 7").unwrap();
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.max_turns(), 7);
    }

    #[test]
    fn test_no_provider_no_keys_is_fallback_only() {
        let config = ServerConfig::default();
        assert!(config.llm_config_with(env(&[("OPENAI_API_KEY", "sk")])).is_none());
    }

    #[test]
    fn test_gemini_key_selects_gemini() {
        let config = ServerConfig::default();
        let llm = config
            .llm_config_with(env(&[("GEMINI_API_KEY", "g-key")]))
            .expect("gemini config");
        assert_eq!(llm.provider(), LlmProvider::Gemini);
        assert_eq!(llm.model(), "gemini-1.5-flash");
        assert_eq!(llm.api_key(), "g-key");

        let llm = config
            .llm_config_with(env(&[
                ("GEMINI_API_KEY", "g-key"),
                ("GEMINI_MODEL", "gemini-2.0-flash"),
            ]))
            .expect("gemini config");
        assert_eq!(llm.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_configured_provider_without_key_is_fallback_only() {
        let config = ServerConfig::from_toml_str("[opponent]\nprovider = \"openai\"").unwrap();
        assert!(config.llm_config_with(env(&[("GEMINI_API_KEY", "g")])).is_none());

        let llm = config
            .llm_config_with(env(&[("OPENAI_API_KEY", "sk")]))
            .expect("openai config");
        assert_eq!(llm.model(), "gpt-4o-mini");
        assert_eq!(llm.max_tokens(), 32);
    }

    #[test]
    fn test_referee_without_llm() {
        let config = ServerConfig::from_toml_str("max_turns = 4").unwrap();
        let referee = config.referee_with(None).unwrap();
        assert_eq!(referee.max_turns(), 4);
        assert!(!referee.provider().has_primary());
        assert_eq!(referee.provider().fallback().len(), 44);
    }

    #[test]
    fn test_missing_dictionary_file_is_error() {
        let config = ServerConfig::from_toml_str(
            "fallback_dictionary = \"/nonexistent/words.toml\"",
        )
        .unwrap();
        let err = config.referee_with(None).unwrap_err();
        assert!(err.message.contains("fallback dictionary"));
    }
}
