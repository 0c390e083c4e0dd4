//! Strategy Agent - company AI-strategy reports from search and LLM stages
//!
//! This crate provides:
//! - The fixed seven-stage pipeline (research → competitors → trends →
//!   use cases → resources → evaluate → final report)
//! - Best-effort normalization of model replies into structured data
//! - Explicit per-stage outcomes separating derived data from fallbacks

pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{Pipeline, PipelineRun, StageProgress};

use anyhow::{bail, Result};
use providers::router::ProviderRouter;
use providers::serper::SerperClient;
use shared::settings::AppSettings;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A finished run together with where its report was written
#[derive(Debug, Clone)]
pub struct StrategyReport {
    pub run: PipelineRun,
    pub report_path: PathBuf,
}

/// Agent host wiring the configured providers into the pipeline
pub struct StrategyAgent {
    pipeline: Pipeline,
}

impl StrategyAgent {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let search = SerperClient::from_settings(&settings.search)?;
        if !search.is_configured() {
            tracing::warn!("no search API key configured; stages will run without search context");
        }
        let generator = ProviderRouter::new(settings.model.clone());

        let pipeline = Pipeline::new(
            Arc::new(search),
            Arc::new(generator),
            settings.pipeline.clone(),
        )
        .with_max_results(settings.search.max_results);
        Ok(Self { pipeline })
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run the full pipeline for `company` and write the final report
    pub async fn generate_report(
        &self,
        company: &str,
        progress: Option<UnboundedSender<StageProgress>>,
    ) -> Result<StrategyReport> {
        if company.trim().is_empty() {
            bail!("company name is required");
        }
        let run = self.pipeline.run_with_progress(company, progress).await;
        let report_path = self
            .pipeline
            .store()
            .write_report(&run.state.company, &run.state.final_report)?;
        tracing::info!(path = %report_path.display(), "report written");
        Ok(StrategyReport { run, report_path })
    }
}
