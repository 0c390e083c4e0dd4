//! Sequential driver for the seven stages.

use crate::stages::{self, StageContext};
use chrono::Utc;
use providers::{TextGenerator, WebSearch};
use services::ReportStore;
use shared::outcome::{StageKind, StageOutcome, StageReport};
use shared::settings::PipelineSettings;
use shared::state::PipelineState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;
use uuid::Uuid;

/// Emitted after each stage so callers can show intermediate results
#[derive(Debug, Clone)]
pub struct StageProgress {
    pub report: StageReport,
    /// State after the stage's update was applied
    pub state: PipelineState,
}

/// Everything one pipeline invocation produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub state: PipelineState,
    /// One entry per stage, in execution order
    pub reports: Vec<StageReport>,
}

impl PipelineRun {
    pub fn report(&self, stage: StageKind) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage == stage)
    }

    /// True when no stage had to substitute a default
    pub fn fully_derived(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_derived())
    }
}

pub struct Pipeline {
    search: Arc<dyn WebSearch>,
    generator: Arc<dyn TextGenerator>,
    store: ReportStore,
    settings: PipelineSettings,
    max_results: usize,
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn WebSearch>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            generator,
            store: ReportStore::new(settings.output_dir.clone()),
            settings,
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, company: &str) -> PipelineRun {
        self.run_with_progress(company, None).await
    }

    /// Run every stage in order, threading state forward. Never exits early.
    pub async fn run_with_progress(
        &self,
        company: &str,
        progress: Option<UnboundedSender<StageProgress>>,
    ) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let mut state = PipelineState::new(company.trim());
        let mut reports = Vec::with_capacity(StageKind::ALL.len());
        let ctx = StageContext {
            search: self.search.as_ref(),
            generator: self.generator.as_ref(),
            store: &self.store,
            settings: &self.settings,
            max_results: self.max_results,
        };

        tracing::info!(%run_id, company = %state.company, "starting strategy pipeline");

        for stage in StageKind::ALL {
            let span = tracing::info_span!("stage", %run_id, stage = stage.id());
            let started_at = Utc::now();
            let start = Instant::now();

            let output = stages::run_stage(stage, &state, &ctx)
                .instrument(span.clone())
                .await;

            let message = output.update.messages.last().cloned().unwrap_or_default();
            state.apply(output.update);

            let report = StageReport {
                stage,
                outcome: output.outcome,
                message,
                warnings: output.warnings,
                citations: output.citations,
                started_at,
                duration_ms: start.elapsed().as_millis() as u64,
            };

            span.in_scope(|| match &report.outcome {
                StageOutcome::Derived => {
                    tracing::info!(duration_ms = report.duration_ms, "{}", report.message)
                }
                StageOutcome::Fallback { reason } => {
                    tracing::warn!(%reason, "{} (fallback data)", report.message)
                }
                StageOutcome::Failed { error } => {
                    tracing::warn!(%error, "{} (collaborator failed)", report.message)
                }
            });

            if let Some(tx) = &progress {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(StageProgress {
                    report: report.clone(),
                    state: state.clone(),
                });
            }
            reports.push(report);
        }

        tracing::info!(%run_id, "strategy pipeline finished");
        PipelineRun {
            run_id,
            state,
            reports,
        }
    }
}
