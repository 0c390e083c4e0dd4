//! Pipeline state threaded through every stage, and the records it collects.
//!
//! Model output is loosely typed, so the record types decode leniently:
//! scalars of any kind land in string fields, lists may arrive as a single
//! comma-separated string, and unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Highest priority score a use case can carry
pub const MAX_PRIORITY_SCORE: u8 = 10;

/// A proposed AI/ML use case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UseCase {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub impact: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub feasibility: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub required_tech: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timeline: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub roi: String,
    /// Set by the evaluate stage
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority_score: Option<u8>,
}

/// A dataset or other learning resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDataset")]
pub struct Dataset {
    pub name: String,
    pub url: String,
    pub license: String,
    pub relevance: String,
}

/// Wire shape of a dataset; search-style `title`/`link` fill in for a blank
/// `name`/`url`
#[derive(Deserialize)]
struct RawDataset {
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    link: String,
    #[serde(default, deserialize_with = "lenient_string")]
    license: String,
    #[serde(default, deserialize_with = "lenient_string")]
    relevance: String,
}

fn first_filled(preferred: String, alternate: String) -> String {
    if preferred.trim().is_empty() {
        alternate
    } else {
        preferred
    }
}

impl From<RawDataset> for Dataset {
    fn from(raw: RawDataset) -> Self {
        Self {
            name: first_filled(raw.name, raw.title),
            url: first_filled(raw.url, raw.link),
            license: raw.license,
            relevance: raw.relevance,
        }
    }
}

/// A competitor with a link to its public report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub report: String,
}

/// An industry trend. Models answer with plain labels or with objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndustryTrend {
    Label(String),
    Detailed(Map<String, Value>),
}

impl IndustryTrend {
    /// Build a trend from one decoded item, skipping null and blank entries
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Self::Label(s.trim().to_string())),
            Value::Object(map) if map.is_empty() => None,
            Value::Object(map) => Some(Self::Detailed(map)),
            other => Some(Self::Label(other.to_string())),
        }
    }

    /// Human-readable name of the trend
    pub fn label(&self) -> String {
        match self {
            Self::Label(s) => s.clone(),
            Self::Detailed(map) => ["trend", "name", "title"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        }
    }
}

impl From<&str> for IndustryTrend {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

/// The single record accumulated across one report-generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub company: String,
    pub industry: String,
    pub key_offerings: Vec<String>,
    pub strategic_focus: Vec<String>,
    pub industry_trends: Vec<IndustryTrend>,
    pub use_cases: Vec<UseCase>,
    pub datasets: Vec<Dataset>,
    pub competitors: Vec<Competitor>,
    pub final_report: String,
    pub citations: Vec<String>,
    /// Append-only status log
    pub messages: Vec<String>,
}

impl PipelineState {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..Default::default()
        }
    }

    /// Merge a stage's partial update: set fields overwrite, messages append.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            industry,
            key_offerings,
            strategic_focus,
            industry_trends,
            use_cases,
            datasets,
            competitors,
            final_report,
            citations,
            mut messages,
        } = update;

        if let Some(v) = industry {
            self.industry = v;
        }
        if let Some(v) = key_offerings {
            self.key_offerings = v;
        }
        if let Some(v) = strategic_focus {
            self.strategic_focus = v;
        }
        if let Some(v) = industry_trends {
            self.industry_trends = v;
        }
        if let Some(v) = use_cases {
            self.use_cases = v;
        }
        if let Some(v) = datasets {
            self.datasets = v;
        }
        if let Some(v) = competitors {
            self.competitors = v;
        }
        if let Some(v) = final_report {
            self.final_report = v;
        }
        if let Some(v) = citations {
            self.citations = v;
        }
        self.messages.append(&mut messages);
    }

    /// Latest status message, if any stage has run
    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

/// Partial update returned by a stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub industry: Option<String>,
    pub key_offerings: Option<Vec<String>>,
    pub strategic_focus: Option<Vec<String>>,
    pub industry_trends: Option<Vec<IndustryTrend>>,
    pub use_cases: Option<Vec<UseCase>>,
    pub datasets: Option<Vec<Dataset>>,
    pub competitors: Option<Vec<Competitor>>,
    pub final_report: Option<String>,
    pub citations: Option<Vec<String>>,
    pub messages: Vec<String>,
}

impl StateUpdate {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(scalar_to_string).unwrap_or_default())
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| scalar_to_string(item).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Some(other) => vec![other.to_string()],
    };
    Ok(list)
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, f64::from(MAX_PRIORITY_SCORE)) as u8))
}
