use polirag_core::config::DEFAULT_OLLAMA_MODEL;
use polirag_core::{ClaudeClient, LLMConfig, LLMError, OpenAIClient, Provider};

// Claude client tests
mod claude {
    use super::*;

    #[test]
    fn test_client_builders() {
        let _client = ClaudeClient::new("test-key")
            .with_model("claude-3-opus")
            .with_max_tokens(2000)
            .with_temperature(0.0)
            .with_api_url("https://proxy.example.com/v1/messages")
            .with_api_version("2023-06-01");
    }

    #[test]
    fn test_from_env_missing() {
        std::env::remove_var("ANTHROPIC_API_KEY");
        let result = ClaudeClient::from_env();
        assert!(matches!(result, Err(LLMError::MissingApiKey)));
    }
}

// OpenAI client tests
mod openai {
    use super::*;

    #[test]
    fn test_client_creation() {
        let _client = OpenAIClient::new("https://api.example.com/v1", "test-key", "gpt-3.5-turbo")
            .with_max_tokens(2000)
            .with_temperature(0.0);
    }

    #[test]
    fn test_ollama_client() {
        let _client = OpenAIClient::ollama("llama3");
    }
}

// Provider tests
mod provider {
    use super::*;

    #[test]
    fn test_ollama_provider_build() {
        let provider = Provider::Ollama {
            base_url: None,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        };
        assert!(provider.build().is_ok());
    }

    #[test]
    fn test_anthropic_with_explicit_key_builds() {
        let provider = Provider::Anthropic {
            api_key: Some("test".to_string()),
            model: None,
            api_version: Some("2023-06-01".to_string()),
        };
        assert!(provider.build_with(1000, 0.5).is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = LLMConfig {
            provider: "ollama".to_string(),
            model: Some("codellama".to_string()),
            ..Default::default()
        };

        let provider = Provider::from_config(&config).unwrap();
        assert!(matches!(provider, Provider::Ollama { model, .. } if model == "codellama"));
        assert!(Provider::build_from_config(&config).is_ok());
    }

    #[test]
    fn test_from_config_openai_compatible() {
        let config = LLMConfig {
            provider: "openai-compatible".to_string(),
            base_url: Some("http://localhost:8000/v1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Provider::from_config(&config).unwrap(),
            Provider::OpenAI { base_url: Some(_), .. }
        ));
    }

    #[test]
    fn test_from_config_rejects_unknown_provider() {
        let config = LLMConfig {
            provider: "vllm".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Provider::from_config(&config),
            Err(LLMError::UnknownProvider(name)) if name == "vllm"
        ));
        assert!(matches!(
            Provider::build_from_config(&config),
            Err(LLMError::UnknownProvider(_))
        ));
    }
}
