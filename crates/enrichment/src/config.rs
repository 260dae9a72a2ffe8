use crate::error::{EnrichmentError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Which connection list ends up in the graph when enrichment succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Connections synthesized from schema and resolvers
    #[default]
    Static,
    /// Connections proposed by the oracle
    External,
}

/// Remote text-generation APIs the oracle can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI-compatible chat completions
    OpenAi,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" | "openai-compatible" => Ok(Provider::OpenAi),
            other => Err(EnrichmentError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Provider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }

    pub fn default_api_key_env(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Configuration for the optional enrichment pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub enabled: bool,

    /// `anthropic` or `openai`; resolved when the client is built
    pub provider: String,

    /// Provider default when unset
    pub model: Option<String>,

    /// Environment variable holding the API key; provider default when unset
    pub api_key_env: Option<String>,

    pub base_url: Option<String>,

    /// No timeout when unset
    pub timeout_secs: Option<u64>,

    pub max_tokens: u32,

    pub connections: ConnectionMode,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            api_key_env: None,
            base_url: None,
            timeout_secs: None,
            max_tokens: 4096,
            connections: ConnectionMode::Static,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(EnrichmentError::invalid_config("max_tokens must be > 0"));
        }

        if self.timeout_secs == Some(0) {
            return Err(EnrichmentError::invalid_config(
                "timeout_secs must be > 0 when set",
            ));
        }

        if let Some(url) = self.base_url.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(EnrichmentError::invalid_config(format!(
                    "base_url '{url}' must be an http(s) URL"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_disabled_and_valid() {
        let config = EnrichmentConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.connections, ConnectionMode::Static);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn provider_names() {
        assert_eq!(Provider::parse("Anthropic").unwrap(), Provider::Anthropic);
        assert_eq!(Provider::parse("openai").unwrap(), Provider::OpenAi);
        assert!(matches!(
            Provider::parse("cohere"),
            Err(EnrichmentError::UnsupportedProvider(name)) if name == "cohere"
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = EnrichmentConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EnrichmentConfig {
            base_url: Some("api.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn connection_mode_uses_lowercase_names() {
        let mode: ConnectionMode = serde_json::from_str("\"external\"").unwrap();
        assert_eq!(mode, ConnectionMode::External);
    }
}
