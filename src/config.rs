use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::summarize::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_MODEL, SummaryOptions};
use crate::youtube::LanguagePolicy;

/// Environment variable holding the Gemini credential
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MIN_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bind: Option<String>,
    pub languages: Option<Vec<String>>,
    pub language_fallback: Option<bool>,
    pub model: Option<String>,
    pub max_words: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub gemini_endpoint: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

/// Values given on the command line; these win over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub languages: Vec<String>,
    pub no_language_fallback: bool,
    pub model: Option<String>,
}

/// Credential that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Immutable process-wide settings, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: ApiKey,
    pub bind: String,
    pub language: LanguagePolicy,
    pub model: String,
    pub defaults: SummaryOptions,
    pub timeout: Duration,
    pub gemini_endpoint: String,
}

impl Settings {
    /// Resolve settings, reading the credential from the process environment
    pub fn from_env(config: Config, overrides: Overrides) -> std::result::Result<Self, Error> {
        Self::resolve(config, overrides, std::env::var(API_KEY_VAR).ok())
    }

    pub fn resolve(
        config: Config,
        overrides: Overrides,
        api_key: Option<String>,
    ) -> std::result::Result<Self, Error> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::MissingConfiguration(format!("{API_KEY_VAR} environment variable not set")))?;

        let preferred = if !overrides.languages.is_empty() {
            overrides.languages
        } else {
            config.languages.unwrap_or_else(|| LanguagePolicy::default().preferred)
        };
        let allow_fallback = !overrides.no_language_fallback && config.language_fallback.unwrap_or(true);

        let defaults = SummaryOptions::new(
            config.max_words.unwrap_or(SummaryOptions::default().max_words),
            config.temperature.unwrap_or(SummaryOptions::default().temperature),
        );

        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs < MIN_TIMEOUT_SECS {
            warn!("timeout_secs = {timeout_secs} is too small, using {MIN_TIMEOUT_SECS}s");
        }
        let timeout_secs = timeout_secs.max(MIN_TIMEOUT_SECS);

        Ok(Settings {
            api_key: ApiKey::new(api_key),
            bind: overrides
                .bind
                .or(config.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            language: LanguagePolicy {
                preferred,
                allow_fallback,
            },
            model: overrides
                .model
                .or(config.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            defaults,
            timeout: Duration::from_secs(timeout_secs),
            gemini_endpoint: config
                .gemini_endpoint
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
bind = "0.0.0.0:8080"
languages = ["de", "en"]
language_fallback = false
model = "gemini-1.5-flash"
max_words = 400
temperature = 0.7
timeout_secs = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.languages, Some(vec!["de".to_string(), "en".to_string()]));
        assert_eq!(config.language_fallback, Some(false));
        assert_eq!(config.model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(config.max_words, Some(400));
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.bind.is_none());
        assert!(config.languages.is_none());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Settings::resolve(Config::default(), Overrides::default(), None).unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration(_)));

        let err = Settings::resolve(Config::default(), Overrides::default(), Some("  ".into())).unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration(_)));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(Config::default(), Overrides::default(), Some("key".into())).unwrap();
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.language.preferred, vec!["en".to_string()]);
        assert!(settings.language.allow_fallback);
        assert_eq!(settings.defaults, SummaryOptions::default());
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_overrides_win_over_config() {
        let config = Config {
            bind: Some("0.0.0.0:1".into()),
            languages: Some(vec!["fr".into()]),
            model: Some("gemini-pro".into()),
            ..Config::default()
        };
        let overrides = Overrides {
            bind: Some("127.0.0.1:9000".into()),
            languages: vec!["es".into()],
            no_language_fallback: true,
            model: None,
        };
        let settings = Settings::resolve(config, overrides, Some("key".into())).unwrap();
        assert_eq!(settings.bind, "127.0.0.1:9000");
        assert_eq!(settings.language.preferred, vec!["es".to_string()]);
        assert!(!settings.language.allow_fallback);
        assert_eq!(settings.model, "gemini-pro");
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        let settings = Settings::resolve(config, Overrides::default(), Some("key".into())).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(MIN_TIMEOUT_SECS));
    }

    #[test]
    fn test_api_key_redacted() {
        let key = ApiKey::new("secret-value");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.expose(), "secret-value");
    }
}
