//! Competitor list taken straight from search results; no model call.

use super::{links, search, StageContext, StageOutput};
use shared::outcome::StageOutcome;
use shared::state::{Competitor, PipelineState, StateUpdate};

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let company = state.company.as_str();
    let mut warnings = Vec::new();

    let query = format!("{} competitors annual reports", company);
    let results = search(ctx, &query, &mut warnings).await;

    let competitors: Vec<Competitor> = results
        .iter()
        .map(|r| Competitor {
            name: r.title.clone(),
            report: r.link.clone(),
        })
        .collect();

    let outcome = if competitors.is_empty() {
        StageOutcome::fallback("no competitor results")
    } else {
        StageOutcome::Derived
    };

    let update = StateUpdate {
        competitors: Some(competitors),
        ..Default::default()
    }
    .with_message(format!("Competitors identified for {}", company));

    StageOutput::new(update, outcome)
        .with_citations(links(&results))
        .with_warnings(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, hits, StubGenerator, StubSearch};
    use services::ReportStore;
    use shared::settings::PipelineSettings;

    #[tokio::test]
    async fn test_maps_results_without_model_call() {
        let search = StubSearch::new().on("competitors annual reports", hits("rival", 2));
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&PipelineState::new("Tesla"), &ctx).await;

        let competitors = output.update.competitors.unwrap();
        assert_eq!(competitors.len(), 2);
        assert_eq!(competitors[0].name, "rival result 1");
        assert_eq!(competitors[1].report, "https://rival.example.com/2");
        assert!(output.outcome.is_derived());
        assert!(output.update.citations.is_none());
        assert_eq!(generator.prompt_count(), 0);
        assert_eq!(
            search.queries.lock().as_slice(),
            ["Tesla competitors annual reports"]
        );
    }

    #[tokio::test]
    async fn test_empty_search_gives_empty_list() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&PipelineState::new("Tesla"), &ctx).await;

        assert_eq!(output.update.competitors, Some(vec![]));
        assert!(output.outcome.is_fallback());
    }
}
