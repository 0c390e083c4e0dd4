//! Company-scoped report and resource files.
//!
//! Every path is derived from the company name so concurrent requests for
//! different companies never write the same file. Writes are staged in a
//! uniquely named temp file and renamed into place, so concurrent requests
//! for the same company replace the file whole and never interleave.

use anyhow::{Context, Result};
use shared::state::Dataset;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn report_path(&self, company: &str) -> PathBuf {
        self.root
            .join(format!("{}_ai_strategy_report.md", company_slug(company)))
    }

    pub fn resources_path(&self, company: &str) -> PathBuf {
        self.root
            .join(format!("{}_resources.md", company_slug(company)))
    }

    /// Write the dataset list, replacing any previous file for this company
    pub fn write_resources(&self, company: &str, datasets: &[Dataset]) -> Result<PathBuf> {
        let path = self.resources_path(company);
        self.write(&path, &render_resources(datasets))?;
        Ok(path)
    }

    /// Write the final report, replacing any previous file for this company
    pub fn write_report(&self, company: &str, report: &str) -> Result<PathBuf> {
        let path = self.report_path(company);
        self.write(&path, report)?;
        Ok(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating output directory {}", self.root.display()))?;
        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("staging {}", path.display()))?;
        staged
            .write_all(contents.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        staged
            .persist(path)
            .with_context(|| format!("replacing {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}

/// One markdown bullet per dataset: `- [name](url) | license | relevance`
pub fn render_resources(datasets: &[Dataset]) -> String {
    datasets
        .iter()
        .map(|ds| {
            format!(
                "- [{}]({}) | {} | {}\n",
                ds.name, ds.url, ds.license, ds.relevance
            )
        })
        .collect()
}

/// File-name-safe form of a company name
pub fn company_slug(company: &str) -> String {
    let mut slug = String::with_capacity(company.len());
    for c in company.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "company".to_string()
    } else {
        slug.to_string()
    }
}
