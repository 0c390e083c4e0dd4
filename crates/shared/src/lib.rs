pub mod outcome;
pub mod state;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    impl ProviderAuth {
        pub fn with_key(key: impl Into<String>) -> Self {
            Self {
                api_key: Some(key.into()),
            }
        }

        /// A key that is present and not blank
        pub fn key(&self) -> Option<&str> {
            self.api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelProvider {
        pub provider_preference: Vec<String>, // e.g., ["gemini", "local"]
        pub gemini_model: String,             // e.g., "gemini-1.5-flash"
        pub gemini_auth: ProviderAuth,
        pub gemini_base_url: String,
        pub local_model: String, // e.g., "llama3.2:3b" for Ollama
        pub local_base_url: String,
        pub temperature: f32,
        pub request_timeout_secs: u64,
    }

    impl Default for ModelProvider {
        fn default() -> Self {
            Self {
                provider_preference: vec!["gemini".into(), "local".into()],
                gemini_model: "gemini-1.5-flash".into(),
                gemini_auth: ProviderAuth::default(),
                gemini_base_url: "https://generativelanguage.googleapis.com".into(),
                local_model: "llama3.2:3b".into(),
                local_base_url: "http://127.0.0.1:11434".into(),
                temperature: 0.7,
                request_timeout_secs: 45,
            }
        }
    }

    /// Web search provider settings (Serper)
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct SearchSettings {
        pub api_key: Option<String>,
        pub base_url: String,
        /// Results kept per query
        pub max_results: usize,
        pub request_timeout_secs: u64,
    }

    impl Default for SearchSettings {
        fn default() -> Self {
            Self {
                api_key: None,
                base_url: "https://google.serper.dev".into(),
                max_results: 5,
                request_timeout_secs: 30,
            }
        }
    }

    /// How the resources stage turns search hits into dataset records
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DatasetStrategy {
        /// Map each hit straight to a record
        #[default]
        SearchResults,
        /// Ask the model to pick datasets out of the raw hits
        ModelExtracted,
    }

    /// How the evaluate stage assigns priority scores
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ScoringStrategy {
        #[default]
        Heuristic,
        Model,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PipelineSettings {
        pub dataset_strategy: DatasetStrategy,
        pub scoring_strategy: ScoringStrategy,
        /// Directory receiving reports and resource lists
        pub output_dir: PathBuf,
    }

    impl Default for PipelineSettings {
        fn default() -> Self {
            Self {
                dataset_strategy: DatasetStrategy::default(),
                scoring_strategy: ScoringStrategy::default(),
                output_dir: PathBuf::from("reports"),
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub model: ModelProvider,
        #[serde(default)]
        pub search: SearchSettings,
        #[serde(default)]
        pub pipeline: PipelineSettings,
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".into(),
                content: content.into(),
            }
        }
    }
}

pub mod search_types {
    use serde::{Deserialize, Serialize};

    /// One web search hit. Only these three fields are consumed downstream.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SearchResult {
        #[serde(default)]
        pub title: String,
        #[serde(default)]
        pub snippet: String,
        #[serde(default)]
        pub link: String,
    }
}

#[cfg(test)]
mod tests {
    use super::settings::*;

    #[test]
    fn test_partial_settings_file_loads() {
        let json = r#"{
            "search": { "api_key": "abc" },
            "pipeline": { "scoring_strategy": "model" }
        }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.search.api_key.as_deref(), Some("abc"));
        assert_eq!(settings.search.max_results, 5);
        assert_eq!(settings.pipeline.scoring_strategy, ScoringStrategy::Model);
        assert_eq!(
            settings.pipeline.dataset_strategy,
            DatasetStrategy::SearchResults
        );
        assert_eq!(settings.model.gemini_model, "gemini-1.5-flash");
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        assert!(ProviderAuth::default().key().is_none());
        assert!(ProviderAuth::with_key("   ").key().is_none());
        assert_eq!(ProviderAuth::with_key(" k ").key(), Some("k"));
    }
}
