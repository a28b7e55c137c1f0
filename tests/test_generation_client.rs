//! Retry behavior of the generation client against scripted providers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use seek::config::Config;
use seek::error::GenerationError;
use seek::llm::client::{CompletionParams, LlmClient};
use seek::llm::generation::{GenerationClient, RetryPolicy};
use seek::pipeline::roadmap::RoadmapSchema;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Step {
    Reply(String),
    Fail(&'static str),
}

/// Plays back `script` in order; once exhausted, repeats `fallback` forever.
struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<String>,
    calls: Mutex<Vec<(String, CompletionParams)>>,
}

impl ScriptedClient {
    fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn always(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), params.clone()));
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(cause)) => bail!("{}", cause),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => bail!("script exhausted"),
            },
        }
    }
}

fn valid_roadmap() -> String {
    json!({"lessons": [
        {"order": 1, "title": "Place value", "description": "Tenths and hundredths", "duration": "10 minutes"},
        {"order": 2, "title": "Decimals to fractions", "description": "Over powers of ten", "duration": "10 minutes"},
        {"order": 3, "title": "Simplify", "description": "Greatest common factor", "duration": "10 minutes"}
    ]})
    .to_string()
}

const SCHEMA: RoadmapSchema = RoadmapSchema {
    min_lessons: 3,
    max_lessons: 5,
};

fn generation_client(client: Arc<ScriptedClient>) -> GenerationClient {
    let config = Config::default();
    GenerationClient::new(client, &config.llm, &config.generation)
        .with_policy(RetryPolicy::immediate())
}

#[tokio::test]
async fn test_always_malformed_exhausts_exactly_max_attempts() {
    for max_attempts in 1..=4 {
        let client = ScriptedClient::always("I'm sorry, I can't produce JSON today.");
        let gen = generation_client(client.clone());

        let err = gen.generate("p", &SCHEMA, max_attempts).await.unwrap_err();
        match err {
            GenerationError::Schema(e) => {
                assert_eq!(e.attempts, max_attempts);
                assert_eq!(e.schema, "roadmap");
                assert!(e.last_payload.contains("can't produce JSON"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
        assert_eq!(client.call_count(), max_attempts);
    }
}

#[tokio::test]
async fn test_schema_failure_is_distinct_from_transport_failure() {
    let client = ScriptedClient::always(r#"{"lessons": []}"#);
    let err = generation_client(client)
        .generate("p", &SCHEMA, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Schema(_)));
}

#[tokio::test]
async fn test_transient_transport_failures_recover_without_schema_retry() {
    for max_attempts in 1..=4 {
        let mut script: Vec<Step> = (1..max_attempts)
            .map(|_| Step::Fail("connection reset"))
            .collect();
        script.push(Step::Reply(valid_roadmap()));
        let client = ScriptedClient::new(script);
        let gen = generation_client(client.clone());

        let roadmap = gen.generate("base prompt", &SCHEMA, max_attempts).await.unwrap();
        assert_eq!(roadmap.len(), 3);
        assert_eq!(client.call_count(), max_attempts);

        // Transport retries resend the same prompt; no correction block
        let calls = client.calls.lock().unwrap();
        assert!(calls.iter().all(|(prompt, _)| prompt == "base prompt"));
    }
}

#[tokio::test]
async fn test_transport_exhaustion_is_invocation_error() {
    let client = ScriptedClient::new(vec![
        Step::Fail("HTTP 401 unauthorized"),
        Step::Fail("HTTP 429 rate limited"),
        Step::Fail("HTTP 503 unavailable"),
    ]);
    let err = generation_client(client.clone())
        .generate("p", &SCHEMA, 3)
        .await
        .unwrap_err();
    match err {
        GenerationError::Invocation(e) => {
            assert_eq!(e.attempts, 3);
            assert!(e.last_cause.contains("503"));
        }
        other => panic!("expected invocation error, got {:?}", other),
    }
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_transport_counter_resets_per_schema_attempt() {
    // attempt 1: one transport failure then bad content; attempt 2: one failure then good content
    let client = ScriptedClient::new(vec![
        Step::Fail("timeout"),
        Step::Reply("[]".to_string()),
        Step::Fail("timeout"),
        Step::Reply(valid_roadmap()),
    ]);
    let roadmap = generation_client(client.clone())
        .generate("p", &SCHEMA, 2)
        .await
        .unwrap();
    assert_eq!(roadmap.len(), 3);
    assert_eq!(client.call_count(), 4);
}

#[tokio::test]
async fn test_fenced_response_accepted() {
    let fenced = format!("```json\n{}\n```", valid_roadmap());
    let client = ScriptedClient::new(vec![Step::Reply(fenced)]);
    let roadmap = generation_client(client)
        .generate("p", &SCHEMA, 1)
        .await
        .unwrap();
    assert_eq!(roadmap.lessons()[2].title, "Simplify");
}

#[tokio::test]
async fn test_params_carry_model_settings_and_system_prompt() {
    let client = ScriptedClient::new(vec![Step::Reply(valid_roadmap())]);
    let mut config = Config::default();
    config.llm.model = "gpt-4o-mini".to_string();
    config.llm.temperature = 0.3;
    config.llm.max_tokens = 1234;
    let gen = GenerationClient::new(client.clone(), &config.llm, &config.generation)
        .with_policy(RetryPolicy::immediate());
    gen.generate("p", &SCHEMA, 1).await.unwrap();

    let calls = client.calls.lock().unwrap();
    let params = &calls[0].1;
    assert_eq!(params.model, "gpt-4o-mini");
    assert!((params.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(params.max_tokens, 1234);
    assert!(params.json_response);
    assert!(params.system_prompt.as_deref().unwrap().contains("micro-lessons"));
}

#[tokio::test]
async fn test_backoff_sleeps_between_transport_retries() {
    let client = ScriptedClient::new(vec![
        Step::Fail("timeout"),
        Step::Fail("timeout"),
        Step::Reply(valid_roadmap()),
    ]);
    let config = Config::default();
    let gen = GenerationClient::new(client, &config.llm, &config.generation).with_policy(
        RetryPolicy {
            backoff_base: Duration::from_millis(20),
            backoff_max: Duration::from_millis(200),
            tighten_on_retry: true,
        },
    );

    let started = std::time::Instant::now();
    gen.generate("p", &SCHEMA, 3).await.unwrap();
    // 20ms after the first failure, 40ms after the second
    assert!(started.elapsed() >= Duration::from_millis(60));
}
