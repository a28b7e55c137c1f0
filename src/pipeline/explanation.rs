//! Explanation generation: a personalized narrative, plus a resource link for visual learners.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::schema::{decode, require_text, ResponseSchema, SchemaViolation};
use crate::error::GenerationError;
use crate::llm::generation::GenerationClient;
use crate::llm::prompts;
use crate::profile::{LearnerProfile, LearningStyle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub concept: String,
    pub narrative: String,
    #[serde(serialize_with = "serialize_link")]
    pub resource_link: Option<Url>,
}

fn serialize_link<S: serde::Serializer>(link: &Option<Url>, s: S) -> Result<S::Ok, S::Error> {
    match link {
        Some(url) => s.serialize_some(url.as_str()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Deserialize)]
struct WireExplanation {
    #[serde(default, alias = "target_concept")]
    concept: String,
    #[serde(default, alias = "personalized_explanation", alias = "narrative")]
    explanation: String,
    #[serde(default)]
    resource_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplanationSchema {
    pub learning_style: LearningStyle,
}

impl ResponseSchema for ExplanationSchema {
    type Output = Explanation;

    fn name(&self) -> &'static str {
        "explanation"
    }

    fn system_prompt(&self) -> Option<&'static str> {
        Some(prompts::EXPLANATION_SYSTEM)
    }

    fn validate(&self, value: Value) -> Result<Explanation, SchemaViolation> {
        if !value.is_object() {
            return Err(SchemaViolation::new(
                "expected a JSON object with concept, explanation and resource_link",
            ));
        }
        let wire: WireExplanation = decode(value, "explanation")?;

        let concept = require_text(&wire.concept, "concept")?;
        let narrative = require_text(&wire.explanation, "explanation")?;

        let link = wire
            .resource_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        let resource_link = match (self.learning_style.wants_resource_link(), link) {
            (true, Some(raw)) => Some(parse_link(raw)?),
            (true, None) => {
                return Err(SchemaViolation::new(
                    "resource_link is required for a visual learner",
                ))
            }
            (false, None) => None,
            (false, Some(_)) => {
                return Err(SchemaViolation::new(format!(
                    "resource_link must be null for a {} learner",
                    self.learning_style
                )))
            }
        };

        Ok(Explanation {
            concept,
            narrative,
            resource_link,
        })
    }
}

fn parse_link(raw: &str) -> Result<Url, SchemaViolation> {
    let url = Url::parse(raw)
        .map_err(|e| SchemaViolation::new(format!("resource_link '{}' is not a valid URL: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(SchemaViolation::new(format!(
            "resource_link '{}' must be an absolute http(s) URL",
            raw
        )));
    }
    Ok(url)
}

pub struct ExplanationGenerator<'a> {
    client: &'a GenerationClient,
    max_attempts: usize,
}

impl<'a> ExplanationGenerator<'a> {
    pub fn new(client: &'a GenerationClient, max_attempts: usize) -> Self {
        Self {
            client,
            max_attempts,
        }
    }

    pub async fn generate(&self, profile: &LearnerProfile) -> Result<Explanation, GenerationError> {
        info!(
            "Generating explanation for goal: {} (style: {})",
            profile.goal(),
            profile.learning_style()
        );
        let schema = ExplanationSchema {
            learning_style: profile.learning_style(),
        };
        let prompt = prompts::explanation_prompt(profile);
        self.client
            .generate(&prompt, &schema, self.max_attempts)
            .await
    }
}
