use crate::TextGenerator;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::settings::ModelProvider;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Local model served by Ollama
pub struct OllamaClient {
    http: Client,
    base: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn from_settings(config: &ModelProvider) -> Result<Self> {
        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .pool_max_idle_per_host(2)
                .build()?,
            base: config.local_base_url.trim_end_matches('/').to_string(),
            model: config.local_model.clone(),
            temperature: config.temperature,
        })
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let conversation: Vec<OllamaMessage> = messages
            .into_iter()
            .map(|m| OllamaMessage {
                role: m.role,
                content: m.content,
            })
            .collect();
        let url = format!("{}/api/chat", self.base);
        let req = OllamaChatRequest {
            model: &self.model,
            messages: conversation,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };
        let resp = self.http.post(url).json(&req).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("ollama error: {}", resp.status()));
        }
        let body: OllamaChatResponse = resp.json().await?;
        Ok(body.message.content)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }
}
