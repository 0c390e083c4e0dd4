//! Candidate AI/ML use cases for the company.

use super::{ask_structured, industry_or_default, links, search, StageContext, StageOutput};
use crate::normalizer::items;
use crate::prompts;
use serde_json::Value;
use shared::outcome::{StageKind, StageOutcome};
use shared::state::{PipelineState, StateUpdate, UseCase};

/// Canned use case substituted when the model gives nothing usable
pub fn fallback_use_cases() -> Vec<UseCase> {
    vec![UseCase {
        title: "Predictive Maintenance".into(),
        description: "Use sensor and operational data to predict equipment failures before they happen."
            .into(),
        impact: "Reduces unplanned downtime and maintenance costs".into(),
        feasibility: "High".into(),
        required_tech: vec![
            "Machine Learning".into(),
            "IoT Sensors".into(),
            "Time-Series Analytics".into(),
        ],
        timeline: "6-12 months".into(),
        roi: "High".into(),
        priority_score: None,
    }]
}

/// Decode use-case records, skipping items that are not objects or carry no title
fn decode_use_cases(value: Value) -> Vec<UseCase> {
    items(value, &["use_cases", "useCases"])
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<UseCase>(item).ok())
        .filter(|uc| !uc.title.trim().is_empty())
        .collect()
}

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let company = state.company.as_str();
    let industry = industry_or_default(state);
    let mut warnings = Vec::new();

    let query = format!("{} {} AI ML use cases", company, industry);
    let results = search(ctx, &query, &mut warnings).await;
    let citations = links(&results);

    let prompt = prompts::use_cases_prompt(company, industry, &results);
    let (use_cases, outcome) = match ask_structured(ctx, StageKind::UseCases, &prompt).await {
        Ok(value) => {
            let use_cases = decode_use_cases(value);
            if use_cases.is_empty() {
                (
                    fallback_use_cases(),
                    StageOutcome::fallback("reply contained no use cases"),
                )
            } else {
                (use_cases, StageOutcome::Derived)
            }
        }
        Err(outcome) => (fallback_use_cases(), outcome),
    };

    let update = StateUpdate {
        use_cases: Some(use_cases),
        citations: Some(citations.clone()),
        ..Default::default()
    }
    .with_message("Use cases ready");

    StageOutput::new(update, outcome)
        .with_citations(citations)
        .with_warnings(warnings)
}
