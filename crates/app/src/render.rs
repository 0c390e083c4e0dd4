//! Terminal rendering of stage results as they complete.

use services::report_store::render_resources;
use shared::outcome::{StageKind, StageOutcome};
use std::fmt;
use strategy_agent::{StageProgress, StrategyReport};
use tokio::sync::mpsc::UnboundedReceiver;

/// Print each stage until the pipeline drops its sender
pub async fn render_progress(mut rx: UnboundedReceiver<StageProgress>) {
    while let Some(progress) = rx.recv().await {
        println!("{}", render_stage(&progress));
    }
}

pub fn render_stage(progress: &StageProgress) -> String {
    StageView(progress).to_string().trim_end().to_string() + "\n"
}

struct StageView<'a>(&'a StageProgress);

impl fmt::Display for StageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.0.report;
        let state = &self.0.state;

        writeln!(f, "── Step: {} ──", report.stage.display_name())?;
        writeln!(f, "{}", report.message)?;
        match &report.outcome {
            StageOutcome::Derived => writeln!(f, "Status: derived")?,
            StageOutcome::Fallback { reason } => writeln!(f, "Status: fallback ({})", reason)?,
            StageOutcome::Failed { error } => writeln!(f, "Status: failed ({})", error)?,
        }
        for warning in &report.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        writeln!(f)?;

        match report.stage {
            StageKind::Research => {
                writeln!(f, "Industry: {}", state.industry)?;
                writeln!(f, "Key Offerings: {}", state.key_offerings.join(", "))?;
                writeln!(f, "Strategic Focus: {}", state.strategic_focus.join(", "))?;
                for link in &report.citations {
                    writeln!(f, "- [{}]({})", link, link)?;
                }
            }
            StageKind::Competitors => {
                for c in &state.competitors {
                    writeln!(f, "- {}: [{}]({})", c.name, c.report, c.report)?;
                }
            }
            StageKind::Trends => {
                writeln!(f, "Industry Trends:")?;
                for trend in &state.industry_trends {
                    writeln!(f, "- {}", trend.label())?;
                }
            }
            StageKind::UseCases => {
                let json = serde_json::to_string_pretty(&state.use_cases)
                    .unwrap_or_else(|_| "[]".to_string());
                writeln!(f, "{}", json)?;
            }
            StageKind::Resources => {
                f.write_str(&render_resources(&state.datasets))?;
            }
            StageKind::Evaluate => {
                for uc in &state.use_cases {
                    let score = uc
                        .priority_score
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".into());
                    writeln!(f, "{} - Priority: {}", uc.title, score)?;
                }
            }
            StageKind::FinalReport => {
                writeln!(f, "{}", state.final_report)?;
            }
        }
        Ok(())
    }
}

pub fn render_summary(report: &StrategyReport) -> String {
    let reports = &report.run.reports;
    let derived = reports.iter().filter(|r| r.outcome.is_derived()).count();
    let degraded: Vec<&str> = reports
        .iter()
        .filter(|r| !r.outcome.is_derived())
        .map(|r| r.stage.id())
        .collect();
    let detail = if degraded.is_empty() {
        String::new()
    } else {
        format!("; defaults used in: {}", degraded.join(", "))
    };
    format!(
        "Report saved to {} ({} of {} stages derived{})",
        report.report_path.display(),
        derived,
        reports.len(),
        detail
    )
}
