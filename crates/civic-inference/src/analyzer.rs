//! Report analysis on top of a generation backend.
//!
//! Every operation here is advisory. Transport failures, empty replies and
//! unparseable output all degrade to neutral defaults instead of errors, so a
//! report can always be submitted without AI.

use civic_core::defaults::{AI_CONFIDENCE_EXTRACTED, AI_CONFIDENCE_STRUCTURED};
use civic_core::{GenerationBackend, Priority};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::parse::{extract_quoted_fields, non_empty_str, parse_object};

/// The civic categories a report can be filed under.
pub const ISSUE_CATEGORIES: [&str; 9] = [
    "Street Infrastructure",
    "Lighting",
    "Waste Management",
    "Water & Utilities",
    "Parks & Recreation",
    "Traffic & Transportation",
    "Public Property",
    "Sidewalks & Walkways",
    "Noise & Disturbances",
];

const MIN_TITLE_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 10;
const CONFIDENT_TITLE_CHARS: usize = 10;
const CONFIDENT_DESCRIPTION_CHARS: usize = 20;

/// How an [`AnalysisResult`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// The reply parsed as a JSON object.
    Structured,
    /// Fields were pattern-matched out of malformed JSON.
    Extracted,
    /// The endpoint could not be used; inputs echoed back.
    Fallback,
}

/// Suggested report fields.
///
/// `category` is empty when nothing was suggested. `title` and `description`
/// fall back to the submitted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: String,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub confidence: f32,
    pub source: AnalysisSource,
}

impl AnalysisResult {
    fn fallback(title: &str, description: &str) -> Self {
        Self {
            category: String::new(),
            priority: Priority::Medium,
            title: title.to_string(),
            description: description.to_string(),
            confidence: 0.0,
            source: AnalysisSource::Fallback,
        }
    }
}

/// Whether a title and description describe the same issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matches: bool,
    pub suggestions: Vec<String>,
}

impl MatchResult {
    pub fn matching() -> Self {
        Self {
            matches: true,
            suggestions: Vec::new(),
        }
    }
}

/// Suggests categories, priorities and wording for civic reports.
pub struct ReportAnalyzer<B> {
    backend: B,
}

impl<B: GenerationBackend> ReportAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Suggest category, priority and improved wording for a report.
    #[instrument(
        skip_all,
        fields(subsystem = "inference", component = "analyzer", op = "analyze_report", model = %self.backend.model_name())
    )]
    pub async fn analyze_report(
        &self,
        title: &str,
        description: &str,
        address: &str,
    ) -> AnalysisResult {
        let prompt = analysis_prompt(title, description, address);
        let reply = match self.backend.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Report analysis unavailable, using defaults");
                return AnalysisResult::fallback(title, description);
            }
        };
        let reply = if reply.trim().is_empty() { "{}" } else { reply.as_str() };

        let (fields, confidence, source) = match parse_object(reply) {
            Some(map) => (map, AI_CONFIDENCE_STRUCTURED, AnalysisSource::Structured),
            None => {
                debug!(response_len = reply.len(), "Reply is not JSON, extracting fields");
                (
                    extract_quoted_fields(reply),
                    AI_CONFIDENCE_EXTRACTED,
                    AnalysisSource::Extracted,
                )
            }
        };

        let result = AnalysisResult {
            category: non_empty_str(&fields, "category")
                .unwrap_or_default()
                .to_string(),
            priority: non_empty_str(&fields, "priority")
                .map(Priority::parse_lenient)
                .unwrap_or_default(),
            title: non_empty_str(&fields, "title").unwrap_or(title).to_string(),
            description: non_empty_str(&fields, "description")
                .unwrap_or(description)
                .to_string(),
            confidence,
            source,
        };
        debug!(
            category = %result.category,
            priority = %result.priority,
            confidence = result.confidence,
            "Report analyzed"
        );
        result
    }

    /// One of [`ISSUE_CATEGORIES`], or empty.
    #[instrument(skip_all, fields(subsystem = "inference", component = "analyzer", op = "suggest_category"))]
    pub async fn suggest_category(&self, title: &str, description: &str) -> String {
        match self.backend.generate(&category_prompt(title, description)).await {
            Ok(reply) => {
                let reply = reply.trim();
                ISSUE_CATEGORIES
                    .iter()
                    .find(|c| **c == reply)
                    .map(|c| c.to_string())
                    .unwrap_or_default()
            }
            Err(e) => {
                warn!(error = %e, "Category suggestion unavailable");
                String::new()
            }
        }
    }

    /// Suggested priority; `medium` when the reply is unusable.
    #[instrument(skip_all, fields(subsystem = "inference", component = "analyzer", op = "suggest_priority"))]
    pub async fn suggest_priority(&self, title: &str, description: &str) -> Priority {
        match self.backend.generate(&priority_prompt(title, description)).await {
            Ok(reply) => reply.trim().parse().unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Priority suggestion unavailable");
                Priority::Medium
            }
        }
    }

    /// Advisory coherence check between a title and its description.
    ///
    /// Obvious cases are decided locally. Otherwise the endpoint is asked and
    /// only an explicit `"matches": false` counts as a mismatch.
    #[instrument(skip_all, fields(subsystem = "inference", component = "analyzer", op = "check_match"))]
    pub async fn check_title_description_match(
        &self,
        title: &str,
        description: &str,
    ) -> MatchResult {
        let (title, description) = (title.trim(), description.trim());
        let (title_chars, description_chars) =
            (title.chars().count(), description.chars().count());

        if title_chars < MIN_TITLE_CHARS || description_chars < MIN_DESCRIPTION_CHARS {
            return MatchResult {
                matches: false,
                suggestions: vec![
                    format!("Title should be at least {} characters", MIN_TITLE_CHARS),
                    format!(
                        "Description should be at least {} characters",
                        MIN_DESCRIPTION_CHARS
                    ),
                ],
            };
        }

        if title_chars >= CONFIDENT_TITLE_CHARS
            && description_chars >= CONFIDENT_DESCRIPTION_CHARS
            && description.split_whitespace().count() > title.split_whitespace().count()
        {
            return MatchResult::matching();
        }

        let reply = match self.backend.generate(&match_prompt(title, description)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Match check unavailable, treating as match");
                return MatchResult::matching();
            }
        };
        let Some(map) = parse_object(&reply) else {
            debug!(response_len = reply.len(), "Unparseable match reply, treating as match");
            return MatchResult::matching();
        };

        MatchResult {
            matches: map.get("matches") != Some(&Value::Bool(false)),
            suggestions: map
                .get("suggestions")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn analysis_prompt(title: &str, description: &str, address: &str) -> String {
    format!(
        r#"Analyze the following civic issue report and suggest appropriate property values.

Title: {title}
Description: {description}
Location: {address}

Based on the content, provide:
1. The most appropriate category, chosen from: {categories}
2. The priority level (low, medium, high, critical)
3. An improved title, if needed
4. An improved description, if needed

Respond ONLY with JSON in exactly this structure:
{{"category": "category name", "priority": "priority level", "title": "improved title", "description": "improved description"}}

Leave any field you cannot determine as an empty string."#,
        categories = ISSUE_CATEGORIES.join(", "),
    )
}

fn category_prompt(title: &str, description: &str) -> String {
    let options: Vec<String> = ISSUE_CATEGORIES.iter().map(|c| format!("- {}", c)).collect();
    format!(
        "Suggest the most appropriate category for this civic issue.\n\n\
         Title: {title}\nDescription: {description}\n\n\
         Choose ONLY from these categories:\n{}\n\n\
         Respond with ONLY the category name, nothing else.",
        options.join("\n"),
    )
}

fn priority_prompt(title: &str, description: &str) -> String {
    format!(
        "Suggest the priority level for this civic issue.\n\n\
         Title: {title}\nDescription: {description}\n\n\
         Choose ONLY from these levels:\n\
         - low (minor inconvenience)\n\
         - medium (moderate issue)\n\
         - high (significant problem)\n\
         - critical (safety hazard)\n\n\
         Respond with ONLY the priority level, nothing else."
    )
}

fn match_prompt(title: &str, description: &str) -> String {
    format!(
        r#"Decide whether this title and description describe the same issue. Be lenient.

Title: {title}
Description: {description}

Respond ONLY with JSON: {{"matches": true/false, "suggestions": ["suggestion"]}}
If they are generally related, respond {{"matches": true, "suggestions": []}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_in_prompts() {
        let prompt = analysis_prompt("Broken lamp", "Lamp is out", "12.971600, 77.594600");
        assert!(prompt.contains("Sidewalks & Walkways"));
        assert!(prompt.contains("Location: 12.971600, 77.594600"));
        assert!(category_prompt("t", "d").contains("- Noise & Disturbances"));
    }

    #[test]
    fn test_fallback_echoes_inputs() {
        let result = AnalysisResult::fallback("Title", "Description");
        assert_eq!(result.category, "");
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(result.title, "Title");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.source, AnalysisSource::Fallback);
    }
}
