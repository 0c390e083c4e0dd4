//! Priority scoring of the collected use cases.

use super::{ask_structured, StageContext, StageOutput};
use crate::normalizer::items;
use crate::prompts;
use serde_json::Value;
use shared::outcome::{StageKind, StageOutcome};
use shared::settings::ScoringStrategy;
use shared::state::{PipelineState, StateUpdate, UseCase, MAX_PRIORITY_SCORE};
use std::collections::HashMap;

/// `min(10, 2 * |required_tech| + chars(impact) / 5)`
pub fn heuristic_score(use_case: &UseCase) -> u8 {
    let tech = use_case.required_tech.len().saturating_mul(2);
    let impact = use_case.impact.chars().count() / 5;
    tech.saturating_add(impact)
        .min(usize::from(MAX_PRIORITY_SCORE)) as u8
}

fn score_heuristically(use_cases: &[UseCase]) -> Vec<UseCase> {
    use_cases
        .iter()
        .cloned()
        .map(|mut uc| {
            uc.priority_score = Some(heuristic_score(&uc));
            uc
        })
        .collect()
}

/// Scored items from the reply, untitled ones included
fn decode_scored(value: Value) -> Vec<UseCase> {
    items(value, &["use_cases", "useCases", "scores"])
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<UseCase>(item).ok())
        .collect()
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Pair model scores with the collected use cases.
///
/// Items are matched by title, ignoring case and surrounding whitespace.
/// Position is used only when the reply carries no titles at all. Unknown,
/// blank or repeated titles leave nothing trustworthy to assign.
fn assign_scores(
    use_cases: &[UseCase],
    scored: Vec<UseCase>,
) -> Result<Vec<UseCase>, StageOutcome> {
    if scored.len() != use_cases.len() {
        return Err(StageOutcome::fallback(format!(
            "model scored {} of {} use cases",
            scored.len(),
            use_cases.len()
        )));
    }

    let scores: Vec<Option<u8>> = if scored.iter().all(|uc| uc.title.trim().is_empty()) {
        scored.iter().map(|uc| uc.priority_score).collect()
    } else {
        let mut by_title: HashMap<String, Option<u8>> = HashMap::new();
        for item in &scored {
            let key = title_key(&item.title);
            if key.is_empty() {
                return Err(StageOutcome::fallback("model reply mixes titled and untitled scores"));
            }
            if by_title.insert(key, item.priority_score).is_some() {
                return Err(StageOutcome::fallback(format!(
                    "model scored \"{}\" more than once",
                    item.title.trim()
                )));
            }
        }

        let mut scores = Vec::with_capacity(use_cases.len());
        for uc in use_cases {
            match by_title.remove(&title_key(&uc.title)) {
                Some(score) => scores.push(score),
                None => {
                    return Err(StageOutcome::fallback(format!(
                        "model reply does not score \"{}\"",
                        uc.title
                    )))
                }
            }
        }
        scores
    };

    use_cases
        .iter()
        .zip(scores)
        .map(|(original, score)| match score {
            Some(score) => {
                let mut uc = original.clone();
                uc.priority_score = Some(score);
                Ok(uc)
            }
            None => Err(StageOutcome::fallback(format!(
                "no score for \"{}\"",
                original.title
            ))),
        })
        .collect()
}

/// Ask the model for scores; only the scores are taken from its reply.
async fn score_with_model(
    use_cases: &[UseCase],
    ctx: &StageContext<'_>,
) -> Result<Vec<UseCase>, StageOutcome> {
    let prompt = prompts::scoring_prompt(use_cases);
    let value = ask_structured(ctx, StageKind::Evaluate, &prompt).await?;
    assign_scores(use_cases, decode_scored(value))
}

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let (use_cases, outcome) = match ctx.settings.scoring_strategy {
        ScoringStrategy::Heuristic => (score_heuristically(&state.use_cases), StageOutcome::Derived),
        ScoringStrategy::Model if state.use_cases.is_empty() => {
            (Vec::new(), StageOutcome::Derived)
        }
        ScoringStrategy::Model => match score_with_model(&state.use_cases, ctx).await {
            Ok(scored) => (scored, StageOutcome::Derived),
            Err(outcome) => (state.use_cases.clone(), outcome),
        },
    };

    let update = StateUpdate {
        use_cases: Some(use_cases),
        ..Default::default()
    }
    .with_message("Use cases prioritized");

    StageOutput::new(update, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::use_cases::fallback_use_cases;
    use crate::testing::{context, StubGenerator, StubSearch};
    use services::ReportStore;
    use shared::settings::PipelineSettings;

    fn use_case(title: &str, tech: usize, impact: &str) -> UseCase {
        UseCase {
            title: title.into(),
            impact: impact.into(),
            required_tech: (0..tech).map(|i| format!("tech{}", i)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_heuristic_score() {
        assert_eq!(heuristic_score(&use_case("a", 0, "")), 0);
        assert_eq!(heuristic_score(&use_case("b", 1, "1234567890")), 4);
        assert_eq!(heuristic_score(&use_case("c", 2, "abcd")), 4);
        assert_eq!(heuristic_score(&use_case("d", 3, &"x".repeat(200))), 10);
        // canned record: 3 techs and a 48-char impact
        assert_eq!(heuristic_score(&fallback_use_cases()[0]), 10);
    }

    #[test]
    fn test_heuristic_score_is_bounded() {
        for tech in 0..8 {
            for len in (0..120).step_by(7) {
                let score = heuristic_score(&use_case("x", tech, &"é".repeat(len)));
                assert!(score <= MAX_PRIORITY_SCORE);
            }
        }
    }

    #[tokio::test]
    async fn test_heuristic_stage_scores_every_use_case() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new("unused");
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let mut state = PipelineState::new("Acme");
        state.use_cases = vec![use_case("a", 1, "12345"), use_case("b", 0, "")];
        let output = run(&state, &ctx).await;

        let scores: Vec<Option<u8>> = output
            .update
            .use_cases
            .unwrap()
            .iter()
            .map(|uc| uc.priority_score)
            .collect();
        assert_eq!(scores, vec![Some(3), Some(0)]);
        assert_eq!(generator.prompt_count(), 0);
        assert_eq!(output.update.messages, vec!["Use cases prioritized"]);
    }

    #[tokio::test]
    async fn test_model_scores_keep_original_fields() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant(
            r#"[{"title": " A ", "priority_score": 9}, {"title": "b", "priority_score": 12.2}]"#,
        );
        let store = ReportStore::new("unused");
        let settings = PipelineSettings {
            scoring_strategy: ScoringStrategy::Model,
            ..Default::default()
        };
        let ctx = context(&search, &generator, &store, &settings);

        let mut state = PipelineState::new("Acme");
        state.use_cases = vec![use_case("a", 1, "x"), use_case("b", 0, "")];
        let output = run(&state, &ctx).await;

        let scored = output.update.use_cases.unwrap();
        assert_eq!(scored[0].title, "a");
        assert_eq!(scored[0].priority_score, Some(9));
        assert_eq!(scored[1].priority_score, Some(10));
        assert!(output.outcome.is_derived());
    }

    #[tokio::test]
    async fn test_model_scoring_falls_back_to_unmodified_list() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant(r#"[{"title": "a", "priority_score": 5}]"#);
        let store = ReportStore::new("unused");
        let settings = PipelineSettings {
            scoring_strategy: ScoringStrategy::Model,
            ..Default::default()
        };
        let ctx = context(&search, &generator, &store, &settings);

        let mut state = PipelineState::new("Acme");
        state.use_cases = vec![use_case("a", 1, "x"), use_case("b", 0, "")];
        let output = run(&state, &ctx).await;

        assert_eq!(output.update.use_cases, Some(state.use_cases.clone()));
        assert!(output.outcome.is_fallback());
    }

    fn titled(title: &str, score: u8) -> UseCase {
        UseCase {
            title: title.into(),
            priority_score: Some(score),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_model_scores_follow_titles_not_order() {
        let search = StubSearch::new();
        let generator = StubGenerator::constant(
            r#"[{"title": "Churn", "priority_score": 2}, {"title": "Fraud", "priority_score": 9}]"#,
        );
        let store = ReportStore::new("unused");
        let settings = PipelineSettings {
            scoring_strategy: ScoringStrategy::Model,
            ..Default::default()
        };
        let ctx = context(&search, &generator, &store, &settings);

        let mut state = PipelineState::new("Acme");
        state.use_cases = vec![use_case("Fraud", 1, "x"), use_case("Churn", 0, "")];
        let output = run(&state, &ctx).await;

        let scored: Vec<(String, Option<u8>)> = output
            .update
            .use_cases
            .unwrap()
            .into_iter()
            .map(|uc| (uc.title, uc.priority_score))
            .collect();
        assert_eq!(
            scored,
            vec![("Fraud".to_string(), Some(9)), ("Churn".to_string(), Some(2))]
        );
        assert!(output.outcome.is_derived());
    }

    #[test]
    fn test_untitled_scores_pair_by_position() {
        let originals = vec![use_case("a", 0, ""), use_case("b", 0, "")];
        let scored = assign_scores(&originals, vec![titled("", 4), titled(" ", 6)]).unwrap();
        assert_eq!(scored[0].priority_score, Some(4));
        assert_eq!(scored[1].priority_score, Some(6));
    }

    #[test]
    fn test_unknown_or_repeated_titles_are_rejected() {
        let originals = vec![use_case("a", 0, ""), use_case("b", 0, "")];

        let unknown = assign_scores(&originals, vec![titled("a", 4), titled("renamed", 6)]);
        let repeated = assign_scores(&originals, vec![titled("a", 4), titled("A", 6)]);
        let mixed = assign_scores(&originals, vec![titled("a", 4), titled("", 6)]);

        assert!(unknown.unwrap_err().is_fallback());
        assert!(repeated.unwrap_err().is_fallback());
        assert!(mixed.unwrap_err().is_fallback());
    }
}
