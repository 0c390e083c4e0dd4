//! The consolidated strategy report.

use super::{generate, StageContext, StageOutput};
use chrono::Utc;
use crate::prompts;
use shared::outcome::{StageKind, StageOutcome};
use shared::state::{PipelineState, StateUpdate};
use std::fmt;

/// Mermaid flowchart of the pipeline, appended to every report
pub const STAGE_DIAGRAM: &str = "graph TD
    A[Research] --> B[Competitors]
    B --> C[Trends]
    C --> D[Use Cases]
    D --> E[Resources]
    E --> F[Evaluator]
    F --> G[Final Report]";

pub fn with_stage_diagram(body: &str) -> String {
    format!("{}\n\n```mermaid\n{}\n```", body, STAGE_DIAGRAM)
}

/// Plain markdown report assembled from the collected state alone
pub fn render_fallback_report(state: &PipelineState) -> String {
    FallbackReport(state).to_string().trim_end().to_string()
}

struct FallbackReport<'a>(&'a PipelineState);

impl fmt::Display for FallbackReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "# AI Strategy Report: {}\n", state.company)?;
        writeln!(f, "Generated {}\n", Utc::now().format("%Y-%m-%d"))?;
        writeln!(
            f,
            "_The narrative could not be generated; the collected research is listed below._\n"
        )?;

        writeln!(f, "## Company Profile\n")?;
        writeln!(f, "- **Industry:** {}", state.industry)?;
        writeln!(f, "- **Key offerings:** {}", state.key_offerings.join(", "))?;
        writeln!(f, "- **Strategic focus:** {}\n", state.strategic_focus.join(", "))?;

        writeln!(f, "## Industry Trends\n")?;
        for trend in &state.industry_trends {
            writeln!(f, "- {}", trend.label())?;
        }

        if !state.competitors.is_empty() {
            writeln!(f, "\n## Competitors\n")?;
            for c in &state.competitors {
                writeln!(f, "- [{}]({})", c.name, c.report)?;
            }
        }

        writeln!(f, "\n## Prioritized Use Cases\n")?;
        for uc in &state.use_cases {
            match uc.priority_score {
                Some(score) => writeln!(f, "### {} (Priority: {})\n", uc.title, score)?,
                None => writeln!(f, "### {}\n", uc.title)?,
            }
            if !uc.description.is_empty() {
                writeln!(f, "{}\n", uc.description)?;
            }
            writeln!(f, "- **Impact:** {}", uc.impact)?;
            writeln!(f, "- **Feasibility:** {}", uc.feasibility)?;
            writeln!(f, "- **Required tech:** {}", uc.required_tech.join(", "))?;
            writeln!(f, "- **Timeline:** {}", uc.timeline)?;
            writeln!(f, "- **ROI:** {}\n", uc.roi)?;
        }

        writeln!(f, "## Datasets\n")?;
        for ds in &state.datasets {
            writeln!(f, "- [{}]({}) | {} | {}", ds.name, ds.url, ds.license, ds.relevance)?;
        }

        if !state.citations.is_empty() {
            writeln!(f, "\n## Sources\n")?;
            for link in &state.citations {
                writeln!(f, "- [{}]({})", link, link)?;
            }
        }
        Ok(())
    }
}

pub async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> StageOutput {
    let prompt = prompts::final_report_prompt(state);
    let (body, outcome) = match generate(ctx, StageKind::FinalReport, &prompt).await {
        Ok(text) if !text.trim().is_empty() => (text, StageOutcome::Derived),
        Ok(_) => (
            render_fallback_report(state),
            StageOutcome::fallback("model returned an empty report"),
        ),
        Err(error) => (render_fallback_report(state), error.into()),
    };

    let update = StateUpdate {
        final_report: Some(with_stage_diagram(&body)),
        ..Default::default()
    }
    .with_message("Final report complete");

    StageOutput::new(update, outcome)
}
