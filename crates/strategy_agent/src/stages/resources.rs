//! Datasets for the industry, also written to the company's resources file.

use super::{ask_structured, industry_or_default, links, search, StageContext, StageOutput};
use crate::normalizer::items;
use crate::prompts;
use serde_json::Value;
use shared::outcome::{StageError, StageKind, StageOutcome};
use shared::search_types::SearchResult;
use shared::settings::DatasetStrategy;
use shared::state::{Dataset, PipelineState, StateUpdate};

const UNKNOWN: &str = "Unknown";

pub fn fallback_datasets() -> Vec<Dataset> {
    vec![Dataset {
        name: "Kaggle Datasets".into(),
        url: "https://www.kaggle.com/datasets".into(),
        license: "Various".into(),
        relevance: "Medium".into(),
    }]
}

fn from_search_results(results: &[SearchResult]) -> Vec<Dataset> {
    results
        .iter()
        .map(|r| Dataset {
            name: r.title.clone(),
            url: r.link.clone(),
            license: UNKNOWN.into(),
            relevance: "High".into(),
        })
        .collect()
}

pub(crate) fn decode_datasets(value: Value) -> Vec<Dataset> {
    items(value, &["datasets", "resources"])
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<Dataset>(item).ok())
        .filter(|ds| !ds.name.trim().is_empty())
        .map(|mut ds| {
            if ds.license.trim().is_empty() {
                ds.license = UNKNOWN.into();
            }
            if ds.relevance.trim().is_empty() {
                ds.relevance = UNKNOWN.into();
            }
            ds
        })
        .collect()
}

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let company = state.company.as_str();
    let industry = industry_or_default(state);
    let mut warnings = Vec::new();

    let query = format!(
        "{} AI ML datasets site:kaggle.com OR site:huggingface.co",
        industry
    );
    let results = search(ctx, &query, &mut warnings).await;
    let citations = links(&results);

    let (datasets, mut outcome) = match ctx.settings.dataset_strategy {
        DatasetStrategy::SearchResults => {
            let datasets = from_search_results(&results);
            if datasets.is_empty() {
                (fallback_datasets(), StageOutcome::fallback("no dataset results"))
            } else {
                (datasets, StageOutcome::Derived)
            }
        }
        DatasetStrategy::ModelExtracted => {
            let prompt = prompts::datasets_prompt(industry, &results);
            match ask_structured(ctx, StageKind::Resources, &prompt).await {
                Ok(value) => {
                    let datasets = decode_datasets(value);
                    if datasets.is_empty() {
                        (
                            fallback_datasets(),
                            StageOutcome::fallback("reply contained no datasets"),
                        )
                    } else {
                        (datasets, StageOutcome::Derived)
                    }
                }
                Err(outcome) => (fallback_datasets(), outcome),
            }
        }
    };

    match ctx.store.write_resources(company, &datasets) {
        Ok(path) => tracing::info!(path = %path.display(), count = datasets.len(), "resources written"),
        Err(e) => {
            tracing::warn!(error = %e, "could not write resources file");
            outcome = StageError::Export {
                path: ctx.store.resources_path(company),
                message: format!("{:#}", e),
            }
            .into();
        }
    }

    let update = StateUpdate {
        datasets: Some(datasets),
        citations: Some(citations.clone()),
        ..Default::default()
    }
    .with_message("Resources collected");

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
    use std::fs;

    fn retail() -> PipelineState {
        let mut state = PipelineState::new("Acme Corp");
        state.industry = "Retail".into();
        state
    }

    #[tokio::test]
    async fn test_search_results_become_datasets_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let search = StubSearch::new().on("site:kaggle.com", hits("kaggle", 2));
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new(dir.path());
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&retail(), &ctx).await;

        let datasets = output.update.datasets.unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].license, "Unknown");
        assert_eq!(datasets[0].relevance, "High");
        assert!(output.outcome.is_derived());
        assert_eq!(generator.prompt_count(), 0);

        let written = fs::read_to_string(store.resources_path("Acme Corp")).unwrap();
        assert_eq!(
            written,
            "- [kaggle result 1](https://kaggle.example.com/1) | Unknown | High\n\
             - [kaggle result 2](https://kaggle.example.com/2) | Unknown | High\n"
        );
    }

    #[tokio::test]
    async fn test_model_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let search = StubSearch::new().on("site:kaggle.com", hits("hf", 3));
        let generator = StubGenerator::constant(
            r#"[{"name": "Retail Sales", "url": "https://hf.example.com/1", "relevance": "High"}, {"url": "nameless"}]"#,
        );
        let store = ReportStore::new(dir.path());
        let settings = PipelineSettings {
            dataset_strategy: DatasetStrategy::ModelExtracted,
            ..Default::default()
        };
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&retail(), &ctx).await;

        let datasets = output.update.datasets.unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].license, "Unknown");
        assert!(generator.prompts.lock()[0].contains("https://hf.example.com/2"));
    }

    #[test]
    fn test_decode_keeps_items_carrying_both_key_spellings() {
        let datasets = decode_datasets(serde_json::json!([
            {"name": "Retail Sales", "title": "Retail Sales 2023", "url": "https://hf.example.com/1"},
            {"name": "Footfall", "url": "https://hf.example.com/2", "link": "https://mirror.example.com/2"}
        ]));

        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].name, "Retail Sales");
        assert_eq!(datasets[1].name, "Footfall");
        assert_eq!(datasets[1].url, "https://hf.example.com/2");
    }

    #[tokio::test]
    async fn test_empty_search_writes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let search = StubSearch::new();
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new(dir.path());
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&retail(), &ctx).await;

        assert_eq!(output.update.datasets, Some(fallback_datasets()));
        assert!(output.outcome.is_fallback());
        assert!(store.resources_path("Acme Corp").exists());
    }

    #[tokio::test]
    async fn test_unwritable_output_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let search = StubSearch::new().on("site:kaggle.com", hits("kaggle", 1));
        let generator = StubGenerator::constant("unused");
        let store = ReportStore::new(&blocker);
        let settings = PipelineSettings::default();
        let ctx = context(&search, &generator, &store, &settings);

        let output = run(&retail(), &ctx).await;

        assert!(matches!(
            output.outcome,
            StageOutcome::Failed {
                error: StageError::Export { .. }
            }
        ));
        assert_eq!(output.update.datasets.unwrap().len(), 1);
    }
}
