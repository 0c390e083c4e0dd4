//! Stage identity and the explicit result of running a stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The fixed stages of the strategy pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Research,
    Competitors,
    Trends,
    UseCases,
    Resources,
    Evaluate,
    FinalReport,
}

impl StageKind {
    /// Execution order
    pub const ALL: [StageKind; 7] = [
        StageKind::Research,
        StageKind::Competitors,
        StageKind::Trends,
        StageKind::UseCases,
        StageKind::Resources,
        StageKind::Evaluate,
        StageKind::FinalReport,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StageKind::Research => "research",
            StageKind::Competitors => "competitors",
            StageKind::Trends => "trends",
            StageKind::UseCases => "usecases",
            StageKind::Resources => "resources",
            StageKind::Evaluate => "evaluate",
            StageKind::FinalReport => "final",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::Research => "Research",
            StageKind::Competitors => "Competitors",
            StageKind::Trends => "Trends",
            StageKind::UseCases => "Use Cases",
            StageKind::Resources => "Resources",
            StageKind::Evaluate => "Evaluator",
            StageKind::FinalReport => "Final Report",
        }
    }
}

/// A collaborator call that errored while a stage ran
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StageError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("could not write {path:?}: {message}")]
    Export { path: PathBuf, message: String },
}

/// How a stage arrived at the data it contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// Search and model produced usable data
    Derived,
    /// Collaborators answered but nothing usable came back; defaults substituted
    Fallback { reason: String },
    /// A collaborator call errored; defaults substituted
    Failed { error: StageError },
}

impl StageOutcome {
    pub fn fallback(reason: impl Into<String>) -> Self {
        StageOutcome::Fallback {
            reason: reason.into(),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, StageOutcome::Derived)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StageOutcome::Fallback { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }

    /// Short status label for display
    pub fn label(&self) -> &'static str {
        match self {
            StageOutcome::Derived => "derived",
            StageOutcome::Fallback { .. } => "fallback",
            StageOutcome::Failed { .. } => "failed",
        }
    }
}

impl From<StageError> for StageOutcome {
    fn from(error: StageError) -> Self {
        StageOutcome::Failed { error }
    }
}

/// Record of one stage execution within a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub outcome: StageOutcome,
    /// Status message the stage appended to the log
    pub message: String,
    pub warnings: Vec<String>,
    /// Links of the search results this stage consumed
    pub citations: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}
