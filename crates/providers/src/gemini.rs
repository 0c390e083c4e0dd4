use crate::{truncate_body, TextGenerator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::settings::ModelProvider;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

pub struct GeminiClient {
    http: Client,
    auth_token: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn from_settings(config: &ModelProvider) -> Result<Self> {
        let auth_token = config
            .gemini_auth
            .key()
            .ok_or_else(|| anyhow!("No Gemini authentication configured"))?
            .to_string();

        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()?,
            auth_token,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> GeminiRequest {
        let mut system_instruction = None;
        let mut contents: Vec<GeminiContent> = Vec::new();
        for m in messages {
            if m.role == "system" {
                system_instruction = Some(GeminiContent {
                    role: "system".to_string(),
                    parts: vec![GeminiPart { text: m.content }],
                });
            } else {
                // Gemini expects roles: "user" | "model".
                let role = match m.role.as_str() {
                    "assistant" => "model",
                    other => other,
                };
                contents.push(GeminiContent {
                    role: role.to_string(),
                    parts: vec![GeminiPart { text: m.content }],
                });
            }
        }
        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let req = self.build_request(messages);
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.auth_token)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if body.trim().is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            return Err(anyhow!(
                "gemini error: {}\n{}",
                status,
                truncate_body(&body, 800)
            ));
        }
        let body: GeminiResponse = resp.json().await?;
        Ok(first_candidate_text(body))
    }
}

/// Concatenated text parts of the first candidate
fn first_candidate_text(body: GeminiResponse) -> String {
    body.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt)]).await
    }
}
