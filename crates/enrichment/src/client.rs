use crate::config::{EnrichmentConfig, Provider};
use crate::error::{EnrichmentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Remote text generation: one prompt in, one completion out.
#[async_trait]
pub trait EnrichmentOracle: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Oracle backed by an Anthropic or OpenAI-compatible HTTP API.
///
/// Each call is a single request; failures are reported, never retried.
pub struct HttpOracle {
    client: Client,
    provider: Provider,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl HttpOracle {
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        config.validate()?;
        let provider = Provider::parse(&config.provider)?;

        let key_env = config
            .api_key_env
            .clone()
            .unwrap_or_else(|| provider.default_api_key_env().to_string());
        let api_key = std::env::var(&key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EnrichmentError::unavailable(format!("{key_env} is not set")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| EnrichmentError::unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete_anthropic(&self, system: &str, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            system,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::unavailable(format!(
                "Anthropic API error ({status}): {body}"
            )));
        }

        let body: AnthropicResponse = response.json().await?;
        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        non_empty(text)
    }

    async fn complete_openai(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionsRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::unavailable(format!(
                "Chat completions API error ({status}): {body}"
            )));
        }

        let body: ChatCompletionsResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        non_empty(text)
    }
}

#[async_trait]
impl EnrichmentOracle for HttpOracle {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        log::debug!(
            "Requesting enrichment from {:?} model {} ({} prompt bytes)",
            self.provider,
            self.model,
            prompt.len()
        );
        match self.provider {
            Provider::Anthropic => self.complete_anthropic(system, prompt).await,
            Provider::OpenAi => self.complete_openai(system, prompt).await,
        }
    }
}

fn non_empty(text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(EnrichmentError::unavailable("empty completion"))
    } else {
        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
