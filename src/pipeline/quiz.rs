//! Quiz generation: multiple-choice questions with exactly one correct option each.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use super::schema::{decode, require_text, take_list, ResponseSchema, SchemaViolation};
use crate::error::GenerationError;
use crate::llm::generation::GenerationClient;
use crate::llm::prompts;
use crate::profile::LearnerProfile;
use crate::util::normalize_for_comparison;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// `None` only for a hand-built question whose index is out of range.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quiz(Vec<QuizQuestion>);

impl Quiz {
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    #[serde(default, alias = "question")]
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(alias = "correct_answer_index")]
    correct_index: Option<i64>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSchema {
    pub min_questions: usize,
    pub max_questions: usize,
    pub options_per_question: usize,
}

impl ResponseSchema for QuizSchema {
    type Output = Quiz;

    fn name(&self) -> &'static str {
        "quiz"
    }

    fn system_prompt(&self) -> Option<&'static str> {
        Some(prompts::QUIZ_SYSTEM)
    }

    fn validate(&self, value: Value) -> Result<Quiz, SchemaViolation> {
        let wire: Vec<WireQuestion> = decode(take_list(value, "questions")?, "questions")?;

        if wire.len() < self.min_questions || wire.len() > self.max_questions {
            return Err(SchemaViolation::new(format!(
                "expected {}-{} questions, got {}",
                self.min_questions,
                self.max_questions,
                wire.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(wire.len());
        for (i, q) in wire.into_iter().enumerate() {
            let at = format!("question {}", i + 1);
            let prompt = require_text(&q.prompt, &format!("{} text", at))?;

            if !seen.insert(normalize_for_comparison(&prompt)) {
                return Err(SchemaViolation::new(format!(
                    "{} duplicates an earlier question: \"{}\"",
                    at, prompt
                )));
            }

            if q.options.len() != self.options_per_question {
                return Err(SchemaViolation::new(format!(
                    "{} must have exactly {} options, got {}",
                    at,
                    self.options_per_question,
                    q.options.len()
                )));
            }
            let options = q
                .options
                .iter()
                .enumerate()
                .map(|(j, o)| require_text(o, &format!("{} option {}", at, j + 1)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut distinct = HashSet::new();
            for (j, option) in options.iter().enumerate() {
                if !distinct.insert(normalize_for_comparison(option)) {
                    return Err(SchemaViolation::new(format!(
                        "{} option {} repeats an earlier option: \"{}\"",
                        at,
                        j + 1,
                        option
                    )));
                }
            }

            let correct_index = match q.correct_index {
                Some(idx) if idx >= 0 && (idx as usize) < options.len() => idx as usize,
                Some(idx) => {
                    return Err(SchemaViolation::new(format!(
                        "{} correct_index {} is outside 0..{}",
                        at,
                        idx,
                        options.len()
                    )))
                }
                None => {
                    return Err(SchemaViolation::new(format!(
                        "{} must mark exactly one correct option via correct_index",
                        at
                    )))
                }
            };

            questions.push(QuizQuestion {
                prompt,
                options,
                correct_index,
                explanation: q
                    .explanation
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty()),
            });
        }

        Ok(Quiz(questions))
    }
}

pub struct QuizGenerator<'a> {
    client: &'a GenerationClient,
    schema: QuizSchema,
    max_attempts: usize,
}

impl<'a> QuizGenerator<'a> {
    pub fn new(client: &'a GenerationClient, schema: QuizSchema, max_attempts: usize) -> Self {
        Self {
            client,
            schema,
            max_attempts,
        }
    }

    pub async fn generate(&self, profile: &LearnerProfile) -> Result<Quiz, GenerationError> {
        info!("Generating quiz for goal: {}", profile.goal());
        let prompt = prompts::quiz_prompt(
            profile,
            self.schema.min_questions,
            self.schema.max_questions,
            self.schema.options_per_question,
        );
        let quiz = self
            .client
            .generate(&prompt, &self.schema, self.max_attempts)
            .await?;
        info!("Quiz ready with {} questions", quiz.len());
        Ok(quiz)
    }
}
