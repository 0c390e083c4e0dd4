use anyhow::{Context, Result};
use shared::settings::AppSettings;
use std::path::{Path, PathBuf};

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "AI Strategy", "AIStrategy")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Load settings from an explicit file, the platform config file, or defaults.
///
/// An explicit path must exist and parse; a broken platform file is logged
/// and ignored.
pub fn load_settings(explicit: Option<&Path>) -> Result<AppSettings> {
    if let Some(path) = explicit {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings in {}", path.display()));
    }

    if let Some(path) = config_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => return Ok(settings),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file")
                }
            }
        }
    }

    Ok(AppSettings::default())
}

/// Apply credential and endpoint overrides from the process environment
pub fn apply_env_overrides(settings: &mut AppSettings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

fn apply_overrides_from(settings: &mut AppSettings, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = lookup("GEMINI_API_KEY") {
        settings.model.gemini_auth.api_key = Some(key);
    }
    if let Some(key) = lookup("SERPER_API_KEY") {
        settings.search.api_key = Some(key);
    }
    if let Some(base) = lookup("OLLAMA_BASE_URL") {
        settings.model.local_base_url = base;
    }
}
