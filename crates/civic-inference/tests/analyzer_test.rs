//! Lenient parsing and heuristics of the report analyzer.

use civic_core::Priority;
use civic_inference::{AnalysisSource, MockGenerationBackend, ReportAnalyzer, ISSUE_CATEGORIES};

fn analyzer(backend: MockGenerationBackend) -> ReportAnalyzer<MockGenerationBackend> {
    ReportAnalyzer::new(backend)
}

#[tokio::test]
async fn test_json_reply_with_commentary() {
    let a = analyzer(MockGenerationBackend::new().with_reply(
        "Here is my analysis:\n{\"category\": \"Waste Management\", \"priority\": \"critical\", \"title\": \"\", \"description\": \"Garbage piling up near school\"}\nThanks!",
    ));

    let result = a.analyze_report("Trash", "Lots of trash", "").await;

    assert_eq!(result.category, "Waste Management");
    assert_eq!(result.priority, Priority::Critical);
    assert_eq!(result.title, "Trash");
    assert_eq!(result.description, "Garbage piling up near school");
    assert_eq!(result.confidence, 0.8);
    assert_eq!(result.source, AnalysisSource::Structured);
}

#[tokio::test]
async fn test_malformed_json_falls_back_to_field_extraction() {
    let a = analyzer(MockGenerationBackend::new().with_reply(
        "{\"category\": \"Parks & Recreation\", \"priority\": \"urgent\", \"title\": \"Swing broken\",",
    ));

    let result = a.analyze_report("swing", "The swing chain snapped", "").await;

    assert_eq!(result.category, "Parks & Recreation");
    assert_eq!(result.priority, Priority::Medium);
    assert_eq!(result.title, "Swing broken");
    assert_eq!(result.description, "The swing chain snapped");
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.source, AnalysisSource::Extracted);
}

#[tokio::test]
async fn test_backend_failure_returns_defaults() {
    let a = analyzer(MockGenerationBackend::new().with_failure("offline"));

    let result = a.analyze_report("Noise", "Loud music every night", "").await;

    assert_eq!(result.category, "");
    assert_eq!(result.priority, Priority::Medium);
    assert_eq!(result.title, "Noise");
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.source, AnalysisSource::Fallback);
}

#[tokio::test]
async fn test_empty_reply_is_structured_defaults() {
    let a = analyzer(MockGenerationBackend::new().with_reply("   "));
    let result = a.analyze_report("Leak", "Pipe leaking on corner", "").await;
    assert_eq!(result.source, AnalysisSource::Structured);
    assert_eq!(result.title, "Leak");
    assert_eq!(result.category, "");
}

#[tokio::test]
async fn test_suggest_category_only_accepts_known_categories() {
    let a = analyzer(
        MockGenerationBackend::new()
            .with_reply("  Lighting\n")
            .with_reply("Potholes")
            .with_failure("offline"),
    );

    assert_eq!(a.suggest_category("t", "d").await, "Lighting");
    assert_eq!(a.suggest_category("t", "d").await, "");
    assert_eq!(a.suggest_category("t", "d").await, "");
    assert!(ISSUE_CATEGORIES.contains(&"Lighting"));
}

#[tokio::test]
async fn test_suggest_priority_defaults_to_medium() {
    let a = analyzer(
        MockGenerationBackend::new()
            .with_reply("high")
            .with_reply("extremely urgent")
            .with_failure("offline"),
    );

    assert_eq!(a.suggest_priority("t", "d").await, Priority::High);
    assert_eq!(a.suggest_priority("t", "d").await, Priority::Medium);
    assert_eq!(a.suggest_priority("t", "d").await, Priority::Medium);
}

#[tokio::test]
async fn test_match_short_inputs_rejected_locally() {
    let backend = MockGenerationBackend::new();
    let a = analyzer(backend.clone());

    let result = a.check_title_description_match("Hole", "Big hole").await;

    assert!(!result.matches);
    assert_eq!(
        result.suggestions,
        vec![
            "Title should be at least 5 characters".to_string(),
            "Description should be at least 10 characters".to_string(),
        ]
    );
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_match_obvious_case_skips_endpoint() {
    let backend = MockGenerationBackend::new();
    let a = analyzer(backend.clone());

    let result = a
        .check_title_description_match(
            "Broken streetlight",
            "The streetlight outside house 42 has not worked for a week",
        )
        .await;

    assert!(result.matches);
    assert!(result.suggestions.is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_match_asks_endpoint_and_only_explicit_false_rejects() {
    let backend = MockGenerationBackend::new()
        .with_reply(r#"{"matches": false, "suggestions": ["Mention the pothole in the description"]}"#)
        .with_reply(r#"{"matches": "maybe"}"#)
        .with_reply("not json at all")
        .with_failure("offline");
    let a = analyzer(backend.clone());

    let title = "Pothole on Main";
    let description = "Water everywhere";

    let mismatch = a.check_title_description_match(title, description).await;
    assert!(!mismatch.matches);
    assert_eq!(
        mismatch.suggestions,
        vec!["Mention the pothole in the description".to_string()]
    );

    assert!(a.check_title_description_match(title, description).await.matches);
    assert!(a.check_title_description_match(title, description).await.matches);
    assert!(a.check_title_description_match(title, description).await.matches);
    assert_eq!(backend.call_count(), 4);
}
