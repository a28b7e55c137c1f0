//! End-to-end plan generation against a stage-routing fake provider.

use anyhow::{bail, Result};
use async_trait::async_trait;
use seek::config::Config;
use seek::error::{GenerationError, PlanError, Stage};
use seek::llm::client::{CompletionParams, LlmClient};
use seek::llm::generation::RetryPolicy;
use seek::llm::prompts;
use seek::pipeline::PlanOrchestrator;
use seek::profile::{LearningStyle, LooseInt, RawProfile};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers each stage with a fixed reply; unanswered stages fail at the transport level.
struct StageClient {
    replies: HashMap<Stage, String>,
    calls: Mutex<HashMap<Stage, usize>>,
    delay: Option<Duration>,
}

impl StageClient {
    fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            delay: None,
        }
    }

    fn reply(mut self, stage: Stage, body: Value) -> Self {
        self.replies.insert(stage, body.to_string());
        self
    }

    fn raw_reply(mut self, stage: Stage, body: &str) -> Self {
        self.replies.insert(stage, body.to_string());
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls_for(&self, stage: Stage) -> usize {
        self.calls.lock().unwrap().get(&stage).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

fn stage_of(prompt: &str) -> Option<Stage> {
    if prompt.starts_with(prompts::ROADMAP_MARKER) {
        Some(Stage::Roadmap)
    } else if prompt.starts_with(prompts::QUIZ_MARKER) {
        Some(Stage::Quiz)
    } else if prompt.starts_with(prompts::EXPLANATION_MARKER) {
        Some(Stage::Explanation)
    } else {
        None
    }
}

#[async_trait]
impl LlmClient for StageClient {
    async fn complete(&self, prompt: &str, _params: &CompletionParams) -> Result<String> {
        let Some(stage) = stage_of(prompt) else {
            bail!("unrecognized prompt");
        };
        *self.calls.lock().unwrap().entry(stage).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.replies.get(&stage) {
            Some(body) => Ok(body.clone()),
            None => bail!("HTTP 503: {} backend unavailable", stage),
        }
    }
}

fn roadmap_body() -> Value {
    json!({"lessons": [
        {"order": 1, "title": "Decimal place value", "description": "Tenths and hundredths on a grid", "duration": "10 minutes"},
        {"order": 2, "title": "Decimals as fractions", "description": "Shade 0.75 as 75 of 100 squares", "duration": "10 minutes"},
        {"order": 3, "title": "Simplify the fraction", "description": "Group squares to see 3/4", "duration": "12 minutes"},
        {"order": 4, "title": "Back again", "description": "Fractions to decimals by division", "duration": "15 minutes"}
    ]})
}

fn quiz_body() -> Value {
    json!({"questions": [
        {"prompt": "Which fraction equals 0.5?", "options": ["1/5", "1/2", "5/1", "2/5"], "correct_index": 1},
        {"prompt": "What is 0.25 in simplest form?", "options": ["25/10", "1/25", "1/4", "2/5"], "correct_index": 2},
        {"prompt": "Which decimal equals 3/4?", "options": ["0.34", "0.75", "0.43", "3.4"], "correct_index": 1}
    ]})
}

fn explanation_body(link: Option<&str>) -> Value {
    json!({
        "concept": "Decimals and fractions",
        "explanation": "Imagine a chocolate bar with ten squares. Eating three squares is 0.3 of the bar, or 3/10.",
        "resource_link": link
    })
}

fn happy_client(link: Option<&str>) -> StageClient {
    StageClient::new()
        .reply(Stage::Roadmap, roadmap_body())
        .reply(Stage::Quiz, quiz_body())
        .reply(Stage::Explanation, explanation_body(link))
}

fn sample_profile(style: &str) -> RawProfile {
    RawProfile {
        age: Some(LooseInt::Int(12)),
        grade_level: Some(LooseInt::Int(6)),
        learning_style: Some(style.to_string()),
        known_topics: vec!["fractions".to_string()].into(),
        struggles: vec!["decimals".to_string()].into(),
        goal: Some("Understand how fractions relate to decimals".to_string()),
    }
}

fn orchestrator(client: Arc<StageClient>) -> PlanOrchestrator {
    PlanOrchestrator::new(client, &Config::default()).with_retry_policy(RetryPolicy::immediate())
}

#[tokio::test]
async fn test_example_scenario_yields_valid_plan_with_link() {
    let client = Arc::new(happy_client(Some("https://www.khanacademy.org/math/decimals")));
    let plan = orchestrator(client.clone())
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap();

    assert_eq!(plan.profile().learning_style(), LearningStyle::Visual);
    let orders: Vec<u32> = plan.roadmap().lessons().iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4]);
    assert_eq!(plan.quiz().len(), 3);
    for q in plan.quiz().questions() {
        assert_eq!(q.options.len(), 4);
        assert!(q.correct_index < q.options.len());
    }
    assert_eq!(
        plan.explanation().resource_link.as_ref().map(|u| u.as_str()),
        Some("https://www.khanacademy.org/math/decimals")
    );
    assert_eq!(client.total_calls(), 3);
}

#[tokio::test]
async fn test_response_matches_wire_format() {
    let client = Arc::new(happy_client(Some("https://example.org/decimals")));
    let plan = orchestrator(client)
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap();
    let value = serde_json::to_value(plan.response()).unwrap();

    assert_eq!(value["roadmap"][0]["title"], "Decimal place value");
    assert_eq!(value["roadmap"][0]["duration"], "10 minutes");
    assert_eq!(value["quiz"][2]["correct_index"], 1);
    assert!(value["personalized_explanation"]
        .as_str()
        .unwrap()
        .starts_with("Imagine a chocolate bar"));
    assert_eq!(value["resource_link"], "https://example.org/decimals");
}

#[tokio::test]
async fn test_non_visual_plan_has_no_link() {
    for style in ["auditory", "kinesthetic", "read_write"] {
        let client = Arc::new(happy_client(None));
        let plan = orchestrator(client)
            .generate_plan(&sample_profile(style))
            .await
            .unwrap();
        assert!(plan.explanation().resource_link.is_none());
        let value = serde_json::to_value(plan.response()).unwrap();
        assert!(value["resource_link"].is_null());
    }
}

#[tokio::test]
async fn test_link_for_non_visual_learner_exhausts_schema_retries() {
    let client = Arc::new(happy_client(Some("https://example.org/unwanted")));
    let err = orchestrator(client.clone())
        .generate_plan(&sample_profile("auditory"))
        .await
        .unwrap_err();
    match err {
        PlanError::Aggregation(agg) => {
            assert_eq!(agg.failed_stages(), vec![Stage::Explanation]);
            assert!(matches!(
                agg.error_for(Stage::Explanation),
                Some(GenerationError::Schema(_))
            ));
        }
        other => panic!("expected aggregation error, got {:?}", other),
    }
    assert_eq!(client.calls_for(Stage::Explanation), 3);
}

#[tokio::test]
async fn test_quiz_failure_fails_whole_plan_and_names_quiz() {
    let client = Arc::new(
        StageClient::new()
            .reply(Stage::Roadmap, roadmap_body())
            .raw_reply(Stage::Quiz, "Here are some great questions for you!")
            .reply(Stage::Explanation, explanation_body(Some("https://example.org"))),
    );
    let err = orchestrator(client.clone())
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap_err();

    match err {
        PlanError::Aggregation(agg) => {
            assert_eq!(agg.failed_stages(), vec![Stage::Quiz]);
            match agg.error_for(Stage::Quiz) {
                Some(GenerationError::Schema(e)) => {
                    assert_eq!(e.schema, "quiz");
                    assert_eq!(e.attempts, 3);
                }
                other => panic!("expected quiz schema error, got {:?}", other),
            }
            assert!(agg.to_string().contains("quiz"));
        }
        other => panic!("expected aggregation error, got {:?}", other),
    }
    // The other stages ran to completion but nothing partial escaped
    assert_eq!(client.calls_for(Stage::Roadmap), 1);
    assert_eq!(client.calls_for(Stage::Explanation), 1);
}

#[tokio::test]
async fn test_multiple_stage_failures_all_reported() {
    let client = Arc::new(StageClient::new().reply(Stage::Quiz, quiz_body()));
    let err = orchestrator(client)
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap_err();
    match err {
        PlanError::Aggregation(agg) => {
            assert_eq!(
                agg.failed_stages(),
                vec![Stage::Roadmap, Stage::Explanation]
            );
            assert!(matches!(
                agg.error_for(Stage::Roadmap),
                Some(GenerationError::Invocation(_))
            ));
        }
        other => panic!("expected aggregation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_input_never_calls_provider() {
    let cases: Vec<(&str, RawProfile)> = vec![
        ("age", RawProfile {
            age: Some(LooseInt::Int(-3)),
            ..sample_profile("visual")
        }),
        ("grade_level", RawProfile {
            grade_level: Some(LooseInt::Text("sixth".to_string())),
            ..sample_profile("visual")
        }),
        ("learning_style", sample_profile("telepathic")),
        ("goal", RawProfile {
            goal: Some("   ".to_string()),
            ..sample_profile("visual")
        }),
    ];

    for (field, raw) in cases {
        let client = Arc::new(happy_client(Some("https://example.org")));
        let err = orchestrator(client.clone())
            .generate_plan(&raw)
            .await
            .unwrap_err();
        match err {
            PlanError::Validation(e) => assert_eq!(e.field, field),
            other => panic!("expected validation error for {}, got {:?}", field, other),
        }
        assert_eq!(client.total_calls(), 0, "provider called for bad {}", field);
    }
}

#[tokio::test]
async fn test_request_timeout_cancels_generation() {
    let client = Arc::new(happy_client(Some("https://example.org")).slow(Duration::from_secs(30)));
    let err = orchestrator(client)
        .with_timeout(Duration::from_millis(50))
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap_err();
    match err {
        PlanError::Timeout(after) => assert_eq!(after, Duration::from_millis(50)),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_configured_bounds_drive_validation() {
    let mut config = Config::default();
    config.generation.max_lessons = 3;
    let client = Arc::new(happy_client(Some("https://example.org")));
    let err = PlanOrchestrator::new(client, &config)
        .with_retry_policy(RetryPolicy::immediate())
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap_err();
    match err {
        PlanError::Aggregation(agg) => {
            assert_eq!(agg.failed_stages(), vec![Stage::Roadmap]);
            assert!(agg.to_string().contains("expected 3-3 lessons, got 4"));
        }
        other => panic!("expected aggregation error, got {:?}", other),
    }
}

/// Counts calls across all stages; used to check retries stay per-stage.
struct FlakyOnce {
    inner: StageClient,
    failures_left: AtomicUsize,
}

#[async_trait]
impl LlmClient for FlakyOnce {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 && prompt.starts_with(prompts::QUIZ_MARKER) {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            bail!("connection reset by peer");
        }
        self.inner.complete(prompt, params).await
    }
}

#[tokio::test]
async fn test_transient_stage_failure_recovers() {
    let client = Arc::new(FlakyOnce {
        inner: happy_client(Some("https://example.org")),
        failures_left: AtomicUsize::new(2),
    });
    let plan = PlanOrchestrator::new(client.clone(), &Config::default())
        .with_retry_policy(RetryPolicy::immediate())
        .generate_plan(&sample_profile("visual"))
        .await
        .unwrap();
    assert_eq!(plan.quiz().len(), 3);
    assert_eq!(client.inner.calls_for(Stage::Quiz), 1);
}
