//! AI/ML trends for the company's industry.

use super::{ask_structured, industry_or_default, links, search, StageContext, StageOutput};
use crate::normalizer::items;
use crate::prompts;
use chrono::{Datelike, Utc};
use shared::outcome::{StageKind, StageOutcome};
use shared::state::{IndustryTrend, PipelineState, StateUpdate};

pub const FALLBACK_TRENDS: [&str; 3] = ["AI automation", "Predictive analytics", "Personalization"];

pub fn fallback_trends() -> Vec<IndustryTrend> {
    FALLBACK_TRENDS.iter().map(|t| IndustryTrend::from(*t)).collect()
}

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let industry = industry_or_default(state);
    let mut warnings = Vec::new();

    let query = format!(
        "{} AI ML automation trends {} market analysis",
        industry,
        Utc::now().year()
    );
    let results = search(ctx, &query, &mut warnings).await;
    let citations = links(&results);

    let prompt = prompts::trends_prompt(industry, &results);
    let (trends, outcome) = match ask_structured(ctx, StageKind::Trends, &prompt).await {
        Ok(value) => {
            let trends: Vec<IndustryTrend> = items(value, &["trends", "industry_trends"])
                .into_iter()
                .filter_map(IndustryTrend::from_value)
                .collect();
            if trends.is_empty() {
                (fallback_trends(), StageOutcome::fallback("reply contained no trends"))
            } else {
                (trends, StageOutcome::Derived)
            }
        }
        Err(outcome) => (fallback_trends(), outcome),
    };

    let update = StateUpdate {
        industry_trends: Some(trends),
        citations: Some(citations.clone()),
        ..Default::default()
    }
    .with_message("Trends identified");

    StageOutput::new(update, outcome)
        .with_citations(citations)
        .with_warnings(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, hits, StubGenerator, StubSearch};
    use services::ReportStore;
    use shared::settings::PipelineSettings;

    fn state_in(industry: &str) -> PipelineState {
        let mut state = PipelineState::new("Acme");
        state.industry = industry.into();
        state
    }

    #[tokio::test]
    async fn test_mixed_trend_items() {
        let search = StubSearch::new().on("Retail AI ML", hits("trend", 3));
        let generator = StubGenerator::constant(
            r#"{"trends": ["Visual search", {"trend": "Dynamic pricing", "citation": "https://x"}, null]}"#,
        );
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&state_in("Retail"), &ctx).await;

        let trends = output.update.industry_trends.unwrap();
        let labels: Vec<String> = trends.iter().map(IndustryTrend::label).collect();
        assert_eq!(labels, vec!["Visual search", "Dynamic pricing"]);
        assert!(output.outcome.is_derived());
        assert_eq!(output.update.citations.unwrap().len(), 3);
        assert!(search.queries.lock()[0].starts_with("Retail AI ML automation trends"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_gives_canned_trends() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant("Here are some trends: robots, more robots.");
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&state_in("Retail"), &ctx).await;

        assert_eq!(output.update.industry_trends, Some(fallback_trends()));
        assert!(output.outcome.is_fallback());
    }

    #[tokio::test]
    async fn test_blank_industry_queries_default() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant("[]");
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&state_in(""), &ctx).await;

        assert!(search.queries.lock()[0].starts_with("Technology AI ML"));
        assert_eq!(output.update.industry_trends, Some(fallback_trends()));
    }
}
