//! Default values for polirag configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default LLM provider.
pub const DEFAULT_LLM_PROVIDER: &str = "openai";

/// Default max tokens for LLM responses.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

// OpenAI defaults
/// Default OpenAI API URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

// Anthropic defaults
/// Default Anthropic API URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
/// Default Anthropic API version.
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Ollama defaults
/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

// ============================================================================
// Chain Defaults
// ============================================================================

/// Default output parser mode ("json" or "str").
pub const DEFAULT_OUTPUT_PARSER: &str = "json";

/// Default number of documents retrieved from each database.
pub const DEFAULT_K: usize = 5;

/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "Deutsch";

// ============================================================================
// Config file locations
// ============================================================================

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "polirag.toml";

/// Directory name under the user config dir.
pub const USER_CONFIG_DIR: &str = "polirag";

/// User config file name.
pub const USER_CONFIG_FILE: &str = "config.toml";
