//! Configuration management for polirag.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `polirag.toml` file
//! 3. User config `~/.config/polirag/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::parser::OutputParser;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration.
    pub llm: LLMConfig,

    /// Chain assembly configuration.
    pub chain: ChainConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./polirag.toml` (project local)
    /// 2. `~/.config/polirag/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored and the configured value is kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // LLM overrides
        if let Some(provider) = lookup("POLIRAG_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("POLIRAG_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = lookup("POLIRAG_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(key) = lookup("POLIRAG_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(n) = lookup("POLIRAG_LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = n;
        }
        if let Some(t) = lookup("POLIRAG_LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = t;
        }

        // Chain overrides
        if let Some(k) = lookup("POLIRAG_K").and_then(|v| v.parse().ok()) {
            self.chain.k = k;
        }
        if let Some(language) = lookup("POLIRAG_LANGUAGE") {
            self.chain.language = language;
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Provider name: "openai", "anthropic", "ollama", or "openai-compatible".
    pub provider: String,

    /// Model name (provider-specific).
    pub model: Option<String>,

    /// Base URL for API (for openai-compatible providers).
    pub base_url: Option<String>,

    /// API key (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum tokens for response.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// API version (for Anthropic).
    pub api_version: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_LLM_PROVIDER.to_string(),
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            api_version: Some(DEFAULT_ANTHROPIC_API_VERSION.to_string()),
        }
    }
}

impl LLMConfig {
    /// Get the model name, falling back to provider defaults.
    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider.as_str() {
            "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL.to_string(),
            "ollama" => DEFAULT_OLLAMA_MODEL.to_string(),
            _ => DEFAULT_OPENAI_MODEL.to_string(),
        })
    }
}

/// Chain assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Output parser mode: "json" or "str".
    pub output_parser: String,

    /// Documents retrieved from each database.
    pub k: usize,

    /// Language the answer is written in.
    pub language: String,

    /// Single-retriever chain: also return question and context.
    pub verbose: bool,

    /// Balanced chain: also return joined context and per-party documents.
    pub return_context: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            output_parser: DEFAULT_OUTPUT_PARSER.to_string(),
            k: DEFAULT_K,
            language: DEFAULT_LANGUAGE.to_string(),
            verbose: false,
            return_context: false,
        }
    }
}

impl ChainConfig {
    /// Resolve the configured parser mode.
    pub fn parser(&self) -> Result<OutputParser, ConfigError> {
        self.output_parser
            .parse()
            .map_err(|e: crate::chain::ChainError| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, DEFAULT_LLM_PROVIDER);
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.chain.k, DEFAULT_K);
        assert_eq!(config.chain.language, "Deutsch");
        assert_eq!(config.llm.model_or_default(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_config_to_toml() {
        let mut config = Config::default();
        config.llm.api_key = Some("secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[chain]"));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("POLIRAG_LLM_PROVIDER", "ollama"),
            ("POLIRAG_LLM_TEMPERATURE", "0.7"),
            ("POLIRAG_K", "not-a-number"),
            ("POLIRAG_LANGUAGE", "Englisch"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.provider, "ollama");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.chain.k, DEFAULT_K);
        assert_eq!(config.chain.language, "Englisch");
    }

    #[test]
    fn test_invalid_parser_mode() {
        let config = ChainConfig {
            output_parser: "yaml".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.parser(), Err(ConfigError::Invalid(_))));
    }
}
