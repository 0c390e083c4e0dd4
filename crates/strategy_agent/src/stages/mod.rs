//! The seven pipeline stages.
//!
//! Each stage reads the accumulated [`PipelineState`] and returns a partial
//! update. Stages never abort: failed searches give them less context, and
//! failed or unusable generations are replaced by the stage's fallback value.

pub mod competitors;
pub mod evaluate;
pub mod final_report;
pub mod research;
pub mod resources;
pub mod trends;
pub mod use_cases;

use crate::normalizer::{self, Normalized};
use providers::{TextGenerator, WebSearch};
use serde_json::Value;
use services::ReportStore;
use shared::outcome::{StageError, StageKind, StageOutcome};
use shared::search_types::SearchResult;
use shared::settings::PipelineSettings;
use shared::state::{PipelineState, StateUpdate};

/// Collaborators available to a stage
pub struct StageContext<'a> {
    pub search: &'a dyn WebSearch,
    pub generator: &'a dyn TextGenerator,
    pub store: &'a ReportStore,
    pub settings: &'a PipelineSettings,
    /// Results requested per search
    pub max_results: usize,
}

/// What a stage hands back to the driver
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub update: StateUpdate,
    pub outcome: StageOutcome,
    pub warnings: Vec<String>,
    /// Links of the search results the stage consumed
    pub citations: Vec<String>,
}

impl StageOutput {
    pub fn new(update: StateUpdate, outcome: StageOutcome) -> Self {
        Self {
            update,
            outcome,
            warnings: Vec::new(),
            citations: Vec::new(),
        }
    }

    pub fn with_citations(mut self, citations: Vec<String>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub async fn run_stage(
    stage: StageKind,
    state: &PipelineState,
    ctx: &StageContext<'_>,
) -> StageOutput {
    match stage {
        StageKind::Research => research::run(state, ctx).await,
        StageKind::Competitors => competitors::run(state, ctx).await,
        StageKind::Trends => trends::run(state, ctx).await,
        StageKind::UseCases => use_cases::run(state, ctx).await,
        StageKind::Resources => resources::run(state, ctx).await,
        StageKind::Evaluate => evaluate::run(state, ctx).await,
        StageKind::FinalReport => final_report::run(state, ctx).await,
    }
}

/// Run a search and note an empty answer as a warning
pub(crate) async fn search(
    ctx: &StageContext<'_>,
    query: &str,
    warnings: &mut Vec<String>,
) -> Vec<SearchResult> {
    tracing::debug!(query, "searching");
    let results = ctx.search.search(query, ctx.max_results).await;
    if results.is_empty() {
        warnings.push(format!("search returned no results for \"{}\"", query));
    }
    results
}

pub(crate) fn links(results: &[SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.link.clone()).collect()
}

/// Call the model, turning a provider error into a [`StageError`]
pub(crate) async fn generate(
    ctx: &StageContext<'_>,
    stage: StageKind,
    prompt: &str,
) -> Result<String, StageError> {
    tracing::debug!(stage = stage.id(), prompt_chars = prompt.len(), "generating");
    ctx.generator.generate(prompt).await.map_err(|e| {
        tracing::warn!(
            stage = stage.id(),
            provider = ctx.generator.name(),
            error = %e,
            "generation failed, using fallback"
        );
        StageError::Generation(format!("{:#}", e))
    })
}

/// Generate and decode a JSON reply.
///
/// `Err` carries the outcome to report when nothing usable came back: a
/// failed call, an unparseable reply, or a decoded but empty value.
pub(crate) async fn ask_structured(
    ctx: &StageContext<'_>,
    stage: StageKind,
    prompt: &str,
) -> Result<Value, StageOutcome> {
    let text = generate(ctx, stage, prompt).await?;
    match normalizer::parse_structured(&text) {
        Normalized::Decoded(value) if normalizer::is_empty_value(&value) => {
            Err(StageOutcome::fallback("model returned an empty answer"))
        }
        Normalized::Decoded(value) => Ok(value),
        Normalized::Invalid { error } => {
            tracing::warn!(stage = stage.id(), error = %error, "unparseable model reply");
            Err(StageOutcome::fallback(format!(
                "unparseable model reply: {}",
                error
            )))
        }
    }
}

/// Industry to build queries from, never blank
pub(crate) fn industry_or_default(state: &PipelineState) -> &str {
    let industry = state.industry.trim();
    if industry.is_empty() {
        research::FALLBACK_INDUSTRY
    } else {
        industry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubGenerator, StubSearch};

    #[tokio::test]
    async fn test_ask_structured_distinguishes_failures() {
        let search = StubSearch::new();
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();

        let cases = [
            (StubGenerator::constant("[1]"), "derived"),
            (StubGenerator::constant("{}"), "fallback"),
            (StubGenerator::constant("no json here"), "fallback"),
            (StubGenerator::failing("503"), "failed"),
        ];
        for (generator, expected) in cases {
            let ctx = StageContext {
                search: &search,
                generator: &generator,
                store: &store,
                settings: &settings,
                max_results: 5,
            };
            let label = match ask_structured(&ctx, StageKind::Trends, "prompt").await {
                Ok(_) => "derived",
                Err(outcome) => outcome.label(),
            };
            assert_eq!(label, expected);
        }
    }

    #[test]
    fn test_industry_or_default() {
        let mut state = PipelineState::new("Acme");
        assert_eq!(industry_or_default(&state), "Technology");
        state.industry = " Retail ".into();
        assert_eq!(industry_or_default(&state), "Retail");
    }
}
