mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use shared::settings::{AppSettings, DatasetStrategy, ScoringStrategy};
use std::path::PathBuf;
use strategy_agent::StrategyAgent;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ai-strategy")]
#[command(about = "Research a company and draft an AI adoption strategy report")]
#[command(version)]
struct Cli {
    /// Company to research
    #[arg(default_value = "Tesla")]
    company: String,

    /// Settings file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the generated markdown files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// How use cases are prioritized
    #[arg(long, value_enum)]
    scoring: Option<ScoringArg>,

    /// Where dataset suggestions come from
    #[arg(long, value_enum)]
    datasets: Option<DatasetArg>,

    /// Open the finished report with the system viewer
    #[arg(long)]
    open: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScoringArg {
    Heuristic,
    Model,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DatasetArg {
    Search,
    Model,
}

impl Cli {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(dir) = &self.output_dir {
            settings.pipeline.output_dir = dir.clone();
        }
        if let Some(scoring) = self.scoring {
            settings.pipeline.scoring_strategy = match scoring {
                ScoringArg::Heuristic => ScoringStrategy::Heuristic,
                ScoringArg::Model => ScoringStrategy::Model,
            };
        }
        if let Some(datasets) = self.datasets {
            settings.pipeline.dataset_strategy = match datasets {
                DatasetArg::Search => DatasetStrategy::SearchResults,
                DatasetArg::Model => DatasetStrategy::ModelExtracted,
            };
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = utils::load_settings(cli.config.as_deref())?;
    utils::apply_env_overrides(&mut settings);
    cli.apply(&mut settings);

    let agent = StrategyAgent::new(&settings)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let (report, ()) = tokio::join!(
        agent.generate_report(&cli.company, Some(tx)),
        render::render_progress(rx)
    );
    let report = report?;

    println!("{}", render::render_summary(&report));

    if cli.open {
        if let Err(e) = open::that(&report.report_path) {
            tracing::warn!(error = %e, "could not open report");
        }
    }

    Ok(())
}
