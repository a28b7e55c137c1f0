//! Plan orchestration: run the three generators concurrently and assemble the plan.
//!
//! A plan is all-or-nothing. If any stage fails, every failure is reported
//! together and nothing partial is returned.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::explanation::{Explanation, ExplanationGenerator};
use super::normalizer::normalize;
use super::quiz::{Quiz, QuizGenerator, QuizSchema};
use super::roadmap::{Roadmap, RoadmapGenerator, RoadmapSchema};
use crate::config::{Config, GenerationConfig};
use crate::error::{AggregationError, GenerationError, PlanError, Stage, StageFailure};
use crate::llm::client::LlmClient;
use crate::llm::generation::{GenerationClient, RetryPolicy};
use crate::profile::{LearnerProfile, RawProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningPlan {
    profile: LearnerProfile,
    roadmap: Roadmap,
    quiz: Quiz,
    explanation: Explanation,
}

impl LearningPlan {
    pub fn profile(&self) -> &LearnerProfile {
        &self.profile
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn explanation(&self) -> &Explanation {
        &self.explanation
    }

    /// Wire form returned to callers.
    pub fn response(&self) -> PlanResponse<'_> {
        PlanResponse {
            roadmap: &self.roadmap,
            quiz: &self.quiz,
            personalized_explanation: &self.explanation.narrative,
            resource_link: self.explanation.resource_link.as_ref().map(|u| u.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse<'a> {
    pub roadmap: &'a Roadmap,
    pub quiz: &'a Quiz,
    pub personalized_explanation: &'a str,
    pub resource_link: Option<&'a str>,
}

pub struct PlanOrchestrator {
    client: GenerationClient,
    generation: GenerationConfig,
    timeout: Duration,
}

impl PlanOrchestrator {
    /// Build an orchestrator from settings already known to be valid.
    ///
    /// Settings that fail [`Config::validate`] trip a debug assertion; use
    /// [`PlanOrchestrator::try_new`] for settings from untrusted sources.
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid generation settings; use PlanOrchestrator::try_new"
        );
        Self {
            client: GenerationClient::new(client, &config.llm, &config.generation),
            generation: config.generation.clone(),
            timeout: config.generation.request_timeout(),
        }
    }

    /// Like [`PlanOrchestrator::new`], but rejects settings the pipeline cannot honor.
    pub fn try_new(client: Arc<dyn LlmClient>, config: &Config) -> Result<Self, PlanError> {
        config
            .validate()
            .map_err(|e| PlanError::Config(format!("{:#}", e)))?;
        Ok(Self::new(client, config))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.client = self.client.with_policy(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Normalize `raw` and generate a plan for it.
    ///
    /// Invalid input fails with [`PlanError::Validation`] before any provider call.
    pub async fn generate_plan(&self, raw: &RawProfile) -> Result<LearningPlan, PlanError> {
        let profile = normalize(raw)?;
        self.generate_for(profile).await
    }

    pub async fn generate_for(&self, profile: LearnerProfile) -> Result<LearningPlan, PlanError> {
        info!(
            "Generating learning plan (age {}, grade {}, style {})",
            profile.age(),
            profile.grade_level(),
            profile.learning_style()
        );

        let attempts = self.generation.max_attempts;
        let roadmap = RoadmapGenerator::new(
            &self.client,
            RoadmapSchema {
                min_lessons: self.generation.min_lessons,
                max_lessons: self.generation.max_lessons,
            },
            attempts,
        );
        let quiz = QuizGenerator::new(
            &self.client,
            QuizSchema {
                min_questions: self.generation.min_quiz_questions,
                max_questions: self.generation.max_quiz_questions,
                options_per_question: self.generation.options_per_question,
            },
            attempts,
        );
        let explanation = ExplanationGenerator::new(&self.client, attempts);

        let stages = async {
            tokio::join!(
                roadmap.generate(&profile),
                quiz.generate(&profile),
                explanation.generate(&profile),
            )
        };

        let (roadmap, quiz, explanation) = match tokio::time::timeout(self.timeout, stages).await {
            Ok(results) => results,
            Err(_) => {
                error!("Learning plan generation timed out after {:?}", self.timeout);
                return Err(PlanError::Timeout(self.timeout));
            }
        };

        let mut failures = Vec::new();
        let roadmap = collect(Stage::Roadmap, roadmap, &mut failures);
        let quiz = collect(Stage::Quiz, quiz, &mut failures);
        let explanation = collect(Stage::Explanation, explanation, &mut failures);

        match (roadmap, quiz, explanation) {
            (Some(roadmap), Some(quiz), Some(explanation)) => {
                info!(
                    "Learning plan ready: {} lessons, {} questions",
                    roadmap.len(),
                    quiz.len()
                );
                Ok(LearningPlan {
                    profile,
                    roadmap,
                    quiz,
                    explanation,
                })
            }
            _ => {
                let err = AggregationError { failures };
                error!("{}", err);
                Err(err.into())
            }
        }
    }
}

fn collect<T>(
    stage: Stage,
    result: Result<T, GenerationError>,
    failures: &mut Vec<StageFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            failures.push(StageFailure { stage, error });
            None
        }
    }
}
