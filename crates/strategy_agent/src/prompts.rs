//! Prompt builders for the generating stages.

use shared::search_types::SearchResult;
use shared::state::{PipelineState, UseCase};

/// Numbered search results, one block per hit
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results were found.".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   URL: {}\n", i + 1, r.title, r.snippet, r.link))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn research_prompt(company: &str, results: &[SearchResult]) -> String {
    format!(
        r#"Analyze the search results about {company}. Extract:
1. Industry
2. Key offerings
3. Strategic focus areas

Respond with JSON only, using exactly these keys:
{{"industry": "...", "key_offerings": ["..."], "strategic_focus": ["..."], "citations": ["<url>"]}}

Search Results:
{results}"#,
        company = company,
        results = format_search_results(results),
    )
}

pub fn trends_prompt(industry: &str, results: &[SearchResult]) -> String {
    format!(
        r#"Based on the search results for AI/ML in the {industry} industry, return the top 5-7 trends.

Respond with a JSON array only. Each item is either a short trend name or an object
{{"trend": "...", "description": "...", "citation": "<url>"}}.

Search Results:
{results}"#,
        industry = industry,
        results = format_search_results(results),
    )
}

pub fn use_cases_prompt(company: &str, industry: &str, results: &[SearchResult]) -> String {
    format!(
        r#"Generate 3-5 AI/ML use cases for {company} in the {industry} industry.

Respond with a JSON array only. Each item has these keys:
title, description, impact, feasibility, required_tech (list of strings), timeline, roi
Include citations from the URLs below where relevant.

Search Results:
{results}"#,
        company = company,
        industry = industry,
        results = format_search_results(results),
    )
}

pub fn datasets_prompt(industry: &str, results: &[SearchResult]) -> String {
    format!(
        r#"From the search results below, list the datasets useful for AI/ML work in the {industry} industry.

Respond with a JSON array only. Each item has these keys:
name, url, license, relevance ("High" | "Medium" | "Low")
Use "Unknown" when the license is not stated.

Search Results:
{results}"#,
        industry = industry,
        results = format_search_results(results),
    )
}

pub fn scoring_prompt(use_cases: &[UseCase]) -> String {
    let listing = serde_json::to_string_pretty(use_cases).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Score each AI/ML use case below for priority on a 0-10 scale, weighing impact,
feasibility, timeline and ROI.

Return the same JSON array in the same order, keeping every title unchanged and adding an
integer "priority_score" to every item.
Respond with JSON only.

Use cases:
{listing}"#,
        listing = listing,
    )
}

/// Consolidated prompt over everything the pipeline collected
pub fn final_report_prompt(state: &PipelineState) -> String {
    let trends = state
        .industry_trends
        .iter()
        .map(|t| format!("- {}", t.label()))
        .collect::<Vec<_>>()
        .join("\n");
    let competitors = state
        .competitors
        .iter()
        .map(|c| format!("- {} ({})", c.name, c.report))
        .collect::<Vec<_>>()
        .join("\n");
    let use_cases = state
        .use_cases
        .iter()
        .map(|uc| {
            format!(
                "- {} (priority {}): {} | impact: {} | feasibility: {} | tech: {} | timeline: {} | ROI: {}",
                uc.title,
                uc.priority_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "n/a".into()),
                uc.description,
                uc.impact,
                uc.feasibility,
                uc.required_tech.join(", "),
                uc.timeline,
                uc.roi
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let datasets = state
        .datasets
        .iter()
        .map(|d| format!("- [{}]({}) | {} | {}", d.name, d.url, d.license, d.relevance))
        .collect::<Vec<_>>()
        .join("\n");
    let citations = state
        .citations
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Generate a full AI strategy proposal in markdown for {company} in the {industry} industry.
Include references, citations, competitors, and datasets as clickable links.

Key offerings: {offerings}
Strategic focus: {focus}

Industry trends:
{trends}

Competitors:
{competitors}

Prioritized use cases:
{use_cases}

Datasets:
{datasets}

Sources:
{citations}"#,
        company = state.company,
        industry = state.industry,
        offerings = state.key_offerings.join(", "),
        focus = state.strategic_focus.join(", "),
        trends = or_none(trends),
        competitors = or_none(competitors),
        use_cases = or_none(use_cases),
        datasets = or_none(datasets),
        citations = or_none(citations),
    )
}

fn or_none(section: String) -> String {
    if section.is_empty() {
        "- none".to_string()
    } else {
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::state::{Competitor, IndustryTrend};

    fn hit(n: usize) -> SearchResult {
        SearchResult {
            title: format!("Title {}", n),
            snippet: format!("Snippet {}", n),
            link: format!("https://example.com/{}", n),
        }
    }

    #[test]
    fn test_format_search_results() {
        let text = format_search_results(&[hit(1), hit(2)]);
        assert!(text.starts_with("1. Title 1\n   Snippet 1\n   URL: https://example.com/1"));
        assert!(text.contains("2. Title 2"));
        assert_eq!(format_search_results(&[]), "No search results were found.");
    }

    #[test]
    fn test_research_prompt_embeds_results() {
        let prompt = research_prompt("Tesla", &[hit(1)]);
        assert!(prompt.contains("about Tesla"));
        assert!(prompt.contains("https://example.com/1"));
        assert!(prompt.contains(r#""industry""#));
    }

    #[test]
    fn test_final_prompt_covers_state() {
        let mut state = PipelineState::new("Tesla");
        state.industry = "Automotive".into();
        state.key_offerings = vec!["EVs".into()];
        state.industry_trends = vec![IndustryTrend::from("Autonomy")];
        state.competitors = vec![Competitor {
            name: "BYD".into(),
            report: "https://byd.example".into(),
        }];

        let prompt = final_report_prompt(&state);
        assert!(prompt.contains("Tesla in the Automotive industry"));
        assert!(prompt.contains("Key offerings: EVs"));
        assert!(prompt.contains("- Autonomy"));
        assert!(prompt.contains("- BYD (https://byd.example)"));
        assert!(prompt.contains("Datasets:\n- none"));
    }
}
