//! Outbound collaborators of the strategy pipeline: text generation and web search.
//!
//! Credentials always arrive through the settings objects handed to the
//! constructors; no client reads process environment on its own.

pub mod gemini;
pub mod ollama;
pub mod router;
pub mod serper;

use anyhow::Result;
use async_trait::async_trait;
use shared::search_types::SearchResult;

/// A hosted or local language model that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Single-shot completion of `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Keyword web search.
///
/// Never fails: transport, auth, or decoding problems yield an empty list.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult>;
}

/// Shorten an error body for inclusion in messages
pub(crate) fn truncate_body(body: &str, limit: usize) -> String {
    let body = body.trim();
    if body.chars().count() > limit {
        let head: String = body.chars().take(limit).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}
