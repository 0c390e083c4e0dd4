use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;
use crate::TextGenerator;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::agent_api::ChatMessage;
use shared::settings::ModelProvider;

/// Clients are built once and reused for every prompt; a provider that
/// could not be built keeps the reason so each attempt reports it.
pub struct ProviderRouter {
    preference: Vec<String>,
    gemini: Result<GeminiClient, String>,
    local: Result<OllamaClient, String>,
}

impl ProviderRouter {
    pub fn new(config: ModelProvider) -> Self {
        Self {
            gemini: GeminiClient::from_settings(&config).map_err(|e| e.to_string()),
            local: OllamaClient::from_settings(&config).map_err(|e| e.to_string()),
            preference: config.provider_preference,
        }
    }

    /// Returns the name of the first preferred provider.
    pub fn active_provider(&self) -> Option<&str> {
        self.preference.first().map(|s| s.as_str())
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let mut last_error = None;

        // Try providers in order of preference, falling back on failure
        for provider in self.preference.iter() {
            let result = match provider.as_str() {
                "gemini" => match &self.gemini {
                    Ok(client) => client.chat(messages.clone()).await,
                    Err(e) => Err(anyhow!("{}", e)),
                },
                "local" => match &self.local {
                    Ok(client) => client.chat(messages.clone()).await,
                    Err(e) => Err(anyhow!("{}", e)),
                },
                _ => Err(anyhow!("Unknown provider: {}", provider)),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(provider = %provider, error = %e, "provider failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("No providers configured")))
    }
}

#[async_trait]
impl TextGenerator for ProviderRouter {
    fn name(&self) -> &str {
        self.active_provider().unwrap_or("none")
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }
}
