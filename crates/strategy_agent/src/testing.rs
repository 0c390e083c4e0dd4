//! Scripted search and generation stubs for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use providers::{TextGenerator, WebSearch};
use services::ReportStore;
use shared::search_types::SearchResult;
use shared::settings::PipelineSettings;

use crate::stages::StageContext;

pub fn context<'a>(
    search: &'a StubSearch,
    generator: &'a StubGenerator,
    store: &'a ReportStore,
    settings: &'a PipelineSettings,
) -> StageContext<'a> {
    StageContext {
        search,
        generator,
        store,
        settings,
        max_results: 5,
    }
}

pub fn hits(prefix: &str, count: usize) -> Vec<SearchResult> {
    (1..=count)
        .map(|i| SearchResult {
            title: format!("{} result {}", prefix, i),
            snippet: format!("About {} #{}", prefix, i),
            link: format!("https://{}.example.com/{}", prefix, i),
        })
        .collect()
}

/// Answers queries containing a registered needle; everything else gets nothing
#[derive(Default)]
pub struct StubSearch {
    responses: Vec<(String, Vec<SearchResult>)>,
    pub queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, results: Vec<SearchResult>) -> Self {
        self.responses.push((needle.to_string(), results));
        self
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        self.queries.lock().push(query.to_string());
        self.responses
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, results)| results.iter().take(max_results).cloned().collect())
            .unwrap_or_default()
    }
}

/// Replies by prompt needle, falling back to a default reply
pub struct StubGenerator {
    replies: Vec<(String, Result<String, String>)>,
    default: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn constant(reply: &str) -> Self {
        Self {
            replies: Vec::new(),
            default: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            replies: Vec::new(),
            default: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.replies.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str, error: &str) -> Self {
        self.replies.push((needle.to_string(), Err(error.to_string())));
        self
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default);
        reply.clone().map_err(|e| anyhow!(e))
    }
}
