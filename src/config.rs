//! Application configuration
//!
//! Connect-form defaults, language model access, and chat behavior, loaded
//! from `~/.config/dbdialog/config.toml`. Every field has a default, so a
//! missing or partial file is never an error. The API key may live in the
//! `[llm]` section or in the `GROQ_API_KEY` environment variable; it is the
//! only secret and is never written back by `save()` unless it was already
//! present in the loaded config.

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Defaults offered by the interactive connection form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MySQL host
    pub host: String,
    /// MySQL port, kept as text because it is form input
    pub port: String,
    /// MySQL username
    pub user: String,
    /// Database name
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "3306".to_string(),
            user: "root".to_string(),
            database: "mysql".to_string(),
        }
    }
}

/// Language model access and generation parameters
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Groq API key (can also use GROQ_API_KEY env var)
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Base URL of the OpenAI-compatible completions API
    pub base_url: String,

    /// Temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Extra attempts for transient failures, beyond the first try
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            temperature: 0.0, // Deterministic for SQL generation
            max_tokens: 1024,
            timeout_seconds: 60,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Get the API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("GROQ_API_KEY").ok())
    }
}

/// Chat behavior
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum number of conversation turns rendered into prompt context.
    /// The stored session is never truncated; this only bounds the view the
    /// model sees.
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_window: 40 }
    }
}

/// Top-level configuration
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load the configuration file, falling back to defaults when it is
    /// missing or unreadable. A missing file is created with the defaults so
    /// users have something to edit.
    pub fn load() -> Self {
        let Some(config_path) = get_config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse {}: {e}. Using defaults.",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Err(e) = config.save() {
                    debug!("Could not write default config: {e}");
                }
                config
            }
            Err(e) => {
                warn!(
                    "Failed to read {}: {e}. Using defaults.",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        if let Some(config_path) = get_config_path() {
            ensure_config_dir(&config_path)?;

            let toml = toml::to_string(self)
                .map_err(|e| io::Error::other(format!("Serialization error: {e}")))?;

            let mut file = File::create(&config_path)?;
            file.write_all(toml.as_bytes())?;
        }
        Ok(())
    }

    /// Validate generation and chat parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.model.is_empty() {
            return Err("llm.model must not be empty".to_string());
        }
        if self.llm.base_url.is_empty() {
            return Err("llm.base_url must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err("llm.temperature must be between 0.0 and 1.0".to_string());
        }
        if self.llm.max_tokens == 0 {
            return Err("llm.max_tokens must be greater than 0".to_string());
        }
        if self.llm.timeout_seconds == 0 {
            return Err("llm.timeout_seconds must be greater than 0".to_string());
        }
        if self.chat.history_window == 0 {
            return Err("chat.history_window must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn get_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join("dbdialog").join("config.toml"))
}

fn ensure_config_dir(config_path: &Path) -> io::Result<()> {
    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_defaults_match_documented_connect_form() {
        let config = Config::default();
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, "3306");
        assert_eq!(config.database.user, "root");
        assert_eq!(config.database.database, "mysql");
    }

    #[rstest]
    fn test_defaults_pin_deterministic_generation() {
        let config = Config::default();
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.chat.history_window, 40);
    }

    #[rstest]
    fn test_configured_api_key_wins_over_environment() {
        let config = LlmConfig {
            api_key: Some("config-key".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key(), Some("config-key".to_string()));
    }

    #[rstest]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[rstest]
    #[case::temperature(|c: &mut Config| c.llm.temperature = 2.0)]
    #[case::max_tokens(|c: &mut Config| c.llm.max_tokens = 0)]
    #[case::timeout(|c: &mut Config| c.llm.timeout_seconds = 0)]
    #[case::history_window(|c: &mut Config| c.chat.history_window = 0)]
    #[case::model(|c: &mut Config| c.llm.model = String::new())]
    #[case::base_url(|c: &mut Config| c.llm.base_url = String::new())]
    fn test_out_of_range_values_fail_validation(#[case] break_config: fn(&mut Config)) {
        let mut config = Config::default();
        break_config(&mut config);
        assert!(config.validate().is_err());
    }

    #[rstest]
    fn test_toml_round_trip_preserves_values() {
        let mut config = Config::default();
        config.database.host = "db.internal".to_string();
        config.llm.max_retries = 5;
        config.chat.history_window = 12;

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[rstest]
    fn test_partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [database]
            host = "example.com"

            [llm]
            model = "llama-3.3-70b-versatile"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.database.host, "example.com");
        assert_eq!(parsed.database.port, "3306");
        assert_eq!(parsed.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(parsed.llm.temperature, 0.0);
        assert_eq!(parsed.chat.history_window, 40);
    }
}
