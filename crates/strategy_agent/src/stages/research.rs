//! Company profile: industry, key offerings, strategic focus.

use super::{ask_structured, links, search, StageContext, StageOutput};
use crate::normalizer::string_list;
use crate::prompts;
use serde_json::Value;
use shared::outcome::{StageKind, StageOutcome};
use shared::state::{PipelineState, StateUpdate};

pub const FALLBACK_INDUSTRY: &str = "Technology";
pub const FALLBACK_OFFERING: &str = "Unknown";
pub const FALLBACK_FOCUS: &str = "Innovation";

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let company = state.company.as_str();
    let mut warnings = Vec::new();

    let query = format!(
        "{} industry business model products services strategic focus",
        company
    );
    let results = search(ctx, &query, &mut warnings).await;
    let citations = links(&results);

    let prompt = prompts::research_prompt(company, &results);
    let (data, mut outcome) = match ask_structured(ctx, StageKind::Research, &prompt).await {
        Ok(value) => (value, StageOutcome::Derived),
        Err(outcome) => (Value::Null, outcome),
    };

    let industry = data
        .get("industry")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let key_offerings = data
        .get("key_offerings")
        .map(string_list)
        .filter(|list| !list.is_empty());
    let strategic_focus = data
        .get("strategic_focus")
        .map(string_list)
        .filter(|list| !list.is_empty());

    if outcome.is_derived() {
        let missing: Vec<&str> = [
            ("industry", industry.is_none()),
            ("key_offerings", key_offerings.is_none()),
            ("strategic_focus", strategic_focus.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| *field)
        .collect();
        if !missing.is_empty() {
            outcome = StageOutcome::fallback(format!("reply missing {}", missing.join(", ")));
        }
    }

    let update = StateUpdate {
        industry: Some(industry.unwrap_or_else(|| FALLBACK_INDUSTRY.to_string())),
        key_offerings: Some(key_offerings.unwrap_or_else(|| vec![FALLBACK_OFFERING.to_string()])),
        strategic_focus: Some(strategic_focus.unwrap_or_else(|| vec![FALLBACK_FOCUS.to_string()])),
        citations: Some(citations.clone()),
        ..Default::default()
    }
    .with_message(format!("Research completed for {}", company));

    StageOutput::new(update, outcome)
        .with_citations(citations)
        .with_warnings(warnings)
}
