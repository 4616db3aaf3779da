use tracing::info;

use super::{ClaudeClient, LLMError, OpenAIClient, LLM};
use crate::config::{
    LLMConfig, DEFAULT_ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, DEFAULT_TEMPERATURE,
};

/// LLM Provider configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI-compatible endpoint (default, most universal)
    OpenAI {
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    },
    /// Anthropic Claude
    Anthropic {
        api_key: Option<String>,
        model: Option<String>,
        api_version: Option<String>,
    },
    /// Local Ollama instance
    Ollama {
        base_url: Option<String>,
        model: String,
    },
}

impl Default for Provider {
    fn default() -> Self {
        Provider::OpenAI {
            base_url: None,
            api_key: None,
            model: None,
        }
    }
}

impl Provider {
    /// Creates a provider from LLMConfig.
    ///
    /// Unknown provider names are rejected, as in [`Provider::detect`].
    pub fn from_config(config: &LLMConfig) -> Result<Self, LLMError> {
        let provider = match config.provider.to_lowercase().as_str() {
            "anthropic" | "claude" => Provider::Anthropic {
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                api_version: config.api_version.clone(),
            },
            "ollama" => Provider::Ollama {
                base_url: config.base_url.clone(),
                model: config
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            },
            "openai" | "openai-compatible" => Provider::OpenAI {
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
            },
            other => return Err(LLMError::UnknownProvider(other.to_string())),
        };
        Ok(provider)
    }

    /// Creates an LLM client with the default sampling settings
    /// (`max_tokens = 2000`, `temperature = 0.0`).
    pub fn build(self) -> Result<Box<dyn LLM>, LLMError> {
        self.build_with(DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
    }

    /// Creates an LLM client with explicit sampling settings.
    pub fn build_with(self, max_tokens: u32, temperature: f32) -> Result<Box<dyn LLM>, LLMError> {
        match self {
            Provider::OpenAI {
                base_url,
                api_key,
                model,
            } => {
                let base = base_url
                    .or_else(|| std::env::var("POLIRAG_LLM_BASE_URL").ok())
                    .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

                let key = api_key
                    .or_else(|| std::env::var("POLIRAG_LLM_API_KEY").ok())
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .unwrap_or_default();

                let mdl = model
                    .or_else(|| std::env::var("POLIRAG_LLM_MODEL").ok())
                    .or_else(|| std::env::var("OPENAI_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

                info!(provider = "openai", model = %mdl, "Using LLM");
                Ok(Box::new(
                    OpenAIClient::new(base, key, mdl)
                        .with_max_tokens(max_tokens)
                        .with_temperature(temperature),
                ))
            }

            Provider::Anthropic {
                api_key,
                model,
                api_version,
            } => {
                let key = api_key
                    .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                    .ok_or(LLMError::MissingApiKey)?;

                let mdl = model
                    .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());

                info!(provider = "anthropic", model = %mdl, "Using LLM");
                let mut client = ClaudeClient::new(key)
                    .with_model(mdl)
                    .with_max_tokens(max_tokens)
                    .with_temperature(temperature);
                if let Some(version) = api_version {
                    client = client.with_api_version(version);
                }
                Ok(Box::new(client))
            }

            Provider::Ollama { base_url, model } => {
                let base = base_url
                    .or_else(|| {
                        std::env::var("OLLAMA_HOST")
                            .ok()
                            .map(|h| format!("{}/v1", h.trim_end_matches('/')))
                    })
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

                info!(provider = "ollama", model = %model, "Using LLM");
                Ok(Box::new(
                    OpenAIClient::new(base, "", model)
                        .with_max_tokens(max_tokens)
                        .with_temperature(temperature),
                ))
            }
        }
    }

    /// Builds the client described by an [`LLMConfig`], including its
    /// sampling settings.
    pub fn build_from_config(config: &LLMConfig) -> Result<Box<dyn LLM>, LLMError> {
        Self::from_config(config)?.build_with(config.max_tokens, config.temperature)
    }

    /// Auto-detect provider from environment variables.
    ///
    /// Detection order:
    /// 1. POLIRAG_LLM_PROVIDER explicitly set
    /// 2. POLIRAG_LLM_BASE_URL set → OpenAI-compatible
    /// 3. ANTHROPIC_API_KEY set → Anthropic
    /// 4. OPENAI_API_KEY set → OpenAI
    /// 5. OLLAMA_HOST set → Ollama
    /// 6. Default to OpenAI-compatible
    pub fn from_env() -> Result<Box<dyn LLM>, LLMError> {
        Self::detect(|key| std::env::var(key).ok())?.build()
    }

    /// Picks a provider from an arbitrary key lookup, following the
    /// [`Provider::from_env`] detection order.
    pub fn detect<F>(lookup: F) -> Result<Self, LLMError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ollama_model = || {
            lookup("POLIRAG_LLM_MODEL")
                .or_else(|| lookup("OLLAMA_MODEL"))
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string())
        };

        if let Some(provider) = lookup("POLIRAG_LLM_PROVIDER") {
            return match provider.to_lowercase().as_str() {
                "openai" | "openai-compatible" => Ok(Provider::default()),
                "anthropic" | "claude" => Ok(Provider::Anthropic {
                    api_key: None,
                    model: None,
                    api_version: None,
                }),
                "ollama" => Ok(Provider::Ollama {
                    base_url: None,
                    model: ollama_model(),
                }),
                other => Err(LLMError::UnknownProvider(other.to_string())),
            };
        }

        if lookup("POLIRAG_LLM_BASE_URL").is_some() {
            return Ok(Provider::default());
        }

        if lookup("ANTHROPIC_API_KEY").is_some() {
            return Ok(Provider::Anthropic {
                api_key: None,
                model: None,
                api_version: None,
            });
        }

        if lookup("OPENAI_API_KEY").is_some() {
            return Ok(Provider::default());
        }

        if lookup("OLLAMA_HOST").is_some() {
            return Ok(Provider::Ollama {
                base_url: None,
                model: ollama_model(),
            });
        }

        Ok(Provider::default())
    }
}
