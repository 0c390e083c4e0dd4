//! Web search through the Serper Google Search API.

use crate::{truncate_body, WebSearch};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::search_types::SearchResult;
use shared::settings::SearchSettings;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

// Serper sends many more fields (position, sitelinks, date); only these are kept.
#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

pub struct SerperClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SerperClient {
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .build()?,
            api_key: settings
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Serper API key not configured"))?;

        let url = format!("{}/search", self.base_url);
        let payload = SerperRequest {
            q: query,
            num: max_results,
        };
        let resp = self
            .http
            .post(url)
            .header("X-API-KEY", api_key)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "serper error: {} - {}",
                status,
                truncate_body(&body, 300)
            ));
        }

        let body = resp.text().await?;
        parse_organic(&body, max_results)
    }
}

/// Decode a Serper response body into at most `max_results` hits
pub fn parse_organic(body: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let response: SerperResponse = serde_json::from_str(body)?;
    Ok(response
        .organic
        .into_iter()
        .take(max_results)
        .map(|item| SearchResult {
            title: item.title.unwrap_or_default(),
            snippet: item.snippet.unwrap_or_default(),
            link: item.link.unwrap_or_default(),
        })
        .collect())
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        if max_results == 0 {
            return Vec::new();
        }
        match self.try_search(query, max_results).await {
            Ok(results) => {
                tracing::debug!(query, count = results.len(), "search completed");
                results
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "search failed, continuing without results");
                Vec::new()
            }
        }
    }
}
